//! Runtime counters and span names.
//!
//! Counters are lock-free `AtomicU64`s incremented on the hot path and read
//! on export. Each [`ScoreCache`](crate::cache::ScoreCache) owns its own set,
//! so two sessions never mix their numbers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Atomic counters for high-frequency engine events.
#[derive(Debug)]
pub struct EngineCounters {
    /// Tier A (base score) cache hits.
    pub base_hits: AtomicU64,
    /// Tier A misses, i.e. base score computations.
    pub base_misses: AtomicU64,
    /// Tier B (agent × item) cache hits.
    pub score_hits: AtomicU64,
    /// Tier B misses, i.e. contextual score computations.
    pub score_misses: AtomicU64,
    /// Entries dropped by explicit invalidation.
    pub invalidations: AtomicU64,
    /// Selector evaluations.
    pub decisions: AtomicU64,
    /// Evaluations that proposed a switch.
    pub upgrades_accepted: AtomicU64,
    /// Tracker entries removed by cleanup sweeps.
    pub expired_entries: AtomicU64,
}

impl EngineCounters {
    /// Create a new set of zeroed counters.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            base_hits: AtomicU64::new(0),
            base_misses: AtomicU64::new(0),
            score_hits: AtomicU64::new(0),
            score_misses: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
            decisions: AtomicU64::new(0),
            upgrades_accepted: AtomicU64::new(0),
            expired_entries: AtomicU64::new(0),
        }
    }

    /// Increment a counter by one.
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot all counters for export.
    #[must_use]
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            base_hits: self.base_hits.load(Ordering::Relaxed),
            base_misses: self.base_misses.load(Ordering::Relaxed),
            score_hits: self.score_hits.load(Ordering::Relaxed),
            score_misses: self.score_misses.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            decisions: self.decisions.load(Ordering::Relaxed),
            upgrades_accepted: self.upgrades_accepted.load(Ordering::Relaxed),
            expired_entries: self.expired_entries.load(Ordering::Relaxed),
        }
    }
}

impl Default for EngineCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// A snapshot of counter values at a point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    /// Tier A hits.
    pub base_hits: u64,
    /// Tier A misses.
    pub base_misses: u64,
    /// Tier B hits.
    pub score_hits: u64,
    /// Tier B misses.
    pub score_misses: u64,
    /// Invalidated entries.
    pub invalidations: u64,
    /// Selector evaluations.
    pub decisions: u64,
    /// Accepted upgrades.
    pub upgrades_accepted: u64,
    /// Expired tracker entries.
    pub expired_entries: u64,
}

impl CounterSnapshot {
    /// Tier B hit ratio (0.0 when nothing was queried).
    #[must_use]
    pub fn score_hit_ratio(&self) -> f64 {
        let total = self.score_hits + self.score_misses;
        if total == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let ratio = self.score_hits as f64 / total as f64;
            ratio
        }
    }

    /// Format as Prometheus-compatible text.
    #[must_use]
    pub fn to_prometheus(&self) -> String {
        let rows = [
            ("arsenal_base_cache_hits_total", "Tier A cache hits", self.base_hits),
            ("arsenal_base_cache_misses_total", "Tier A cache misses", self.base_misses),
            ("arsenal_score_cache_hits_total", "Tier B cache hits", self.score_hits),
            ("arsenal_score_cache_misses_total", "Tier B cache misses", self.score_misses),
            ("arsenal_invalidations_total", "Cache entries invalidated", self.invalidations),
            ("arsenal_decisions_total", "Upgrade evaluations", self.decisions),
            ("arsenal_upgrades_accepted_total", "Upgrades proposed", self.upgrades_accepted),
            ("arsenal_expired_entries_total", "Tracker entries expired", self.expired_entries),
        ];
        let mut out = String::new();
        for (name, help, value) in rows {
            out.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"
            ));
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tracing Span Names
// ---------------------------------------------------------------------------

/// Span names used with `tracing::span!`.
pub mod spans {
    /// One selector evaluation.
    pub const SELECT_UPGRADE: &str = "arsenal::select";
    /// Tracker cleanup sweep.
    pub const CLEANUP: &str = "arsenal::cleanup";
    /// A host-driven scheduling pass over many agents.
    pub const UPGRADE_PASS: &str = "arsenal::pass";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_default_zero() {
        let snap = EngineCounters::new().snapshot();
        assert_eq!(snap, CounterSnapshot::default());
        assert!(snap.score_hit_ratio().abs() < f64::EPSILON);
    }

    #[test]
    fn hit_ratio() {
        let c = EngineCounters::new();
        EngineCounters::bump(&c.score_misses);
        for _ in 0..3 {
            EngineCounters::bump(&c.score_hits);
        }
        assert!((c.snapshot().score_hit_ratio() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn prometheus_format_valid() {
        let c = EngineCounters::new();
        c.decisions.fetch_add(42, Ordering::Relaxed);
        let prom = c.snapshot().to_prometheus();
        assert!(prom.contains("arsenal_decisions_total 42"));
        assert!(prom.contains("# TYPE"));
        assert!(prom.contains("# HELP"));
    }
}
