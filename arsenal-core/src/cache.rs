//! Two-tier score cache.
//!
//! ```text
//!  get_score(agent, item)
//!        │
//!        ▼
//!  ┌──────────────┐  hit: agent fp, item fp, config fp all equal
//!  │ Tier B       │──────────────────────────────────────────────▶ score
//!  │ agent × item │
//!  └──────┬───────┘
//!         │ miss
//!         ▼
//!  ┌──────────────┐  hit: item fp, config fp equal
//!  │ Tier A       │──────────┐
//!  │ item         │          │
//!  └──────┬───────┘          │
//!         │ miss             ▼
//!         └──▶ score_base ──▶ adjust_for_agent ──▶ store in B ──▶ score
//! ```
//!
//! A cached value is only served when every fingerprint it was computed
//! under still matches, so a host that forgets to invalidate gets a
//! recomputation rather than a stale score. Explicit invalidation is still
//! required to release memory: there is no eviction.

use std::collections::HashMap;

use tracing::{debug, trace};

use crate::metrics::{CounterSnapshot, EngineCounters};
use crate::scoring::{BaseScore, Scorer, WeaponScorer};
use crate::types::{AgentId, AgentProfile, Fingerprint, ItemId, ItemProfile};

#[derive(Debug, Clone)]
struct BaseEntry {
    item_fp: Fingerprint,
    config_fp: Fingerprint,
    score: BaseScore,
}

#[derive(Debug, Clone)]
struct ContextEntry {
    agent_fp: Fingerprint,
    item_fp: Fingerprint,
    config_fp: Fingerprint,
    score: f32,
}

/// Memoizes base scores per item and final scores per (agent, item).
///
/// Guarantees at most one computation per unique (agent, item) pair between
/// invalidations. Owned by exactly one session; identities are only unique
/// within a session.
#[derive(Debug)]
pub struct ScoreCache<S: Scorer = WeaponScorer> {
    scorer: S,
    config_fp: Fingerprint,
    base: HashMap<ItemId, BaseEntry>,
    contextual: HashMap<AgentId, HashMap<ItemId, ContextEntry>>,
    counters: EngineCounters,
}

impl Default for ScoreCache<WeaponScorer> {
    fn default() -> Self {
        Self::new(WeaponScorer::default())
    }
}

impl<S: Scorer> ScoreCache<S> {
    /// Create an empty cache computing through `scorer`.
    #[must_use]
    pub fn new(scorer: S) -> Self {
        let config_fp = scorer.fingerprint();
        Self {
            scorer,
            config_fp,
            base: HashMap::new(),
            contextual: HashMap::new(),
            counters: EngineCounters::new(),
        }
    }

    /// The scorer computing misses.
    #[must_use]
    pub fn scorer(&self) -> &S {
        &self.scorer
    }

    /// Swap the scorer (e.g. after a configuration change) and flush.
    pub fn replace_scorer(&mut self, scorer: S) {
        self.config_fp = scorer.fingerprint();
        self.scorer = scorer;
        self.invalidate_all();
    }

    /// Base score of `item`, from tier A when still valid.
    pub fn get_base_score(&mut self, item: &ItemProfile) -> BaseScore {
        let item_fp = item.fingerprint();
        if let Some(entry) = self.base.get(&item.id) {
            if entry.item_fp == item_fp && entry.config_fp == self.config_fp {
                EngineCounters::bump(&self.counters.base_hits);
                return entry.score;
            }
        }

        EngineCounters::bump(&self.counters.base_misses);
        let score = self.scorer.score_base(item);
        trace!(item = %item.id, def = %item.def, total = score.total(), "base score computed");
        self.base.insert(
            item.id,
            BaseEntry {
                item_fp,
                config_fp: self.config_fp,
                score,
            },
        );
        score
    }

    /// Final score of `item` for `agent`, from tier B when still valid.
    pub fn get_score(&mut self, agent: &AgentProfile, item: &ItemProfile) -> f32 {
        let agent_fp = agent.fingerprint();
        let item_fp = item.fingerprint();

        if let Some(entry) = self
            .contextual
            .get(&agent.id)
            .and_then(|per_agent| per_agent.get(&item.id))
        {
            if entry.agent_fp == agent_fp
                && entry.item_fp == item_fp
                && entry.config_fp == self.config_fp
            {
                EngineCounters::bump(&self.counters.score_hits);
                return entry.score;
            }
        }

        EngineCounters::bump(&self.counters.score_misses);
        let base = self.get_base_score(item);
        let score = self.scorer.adjust_for_agent(agent, item, &base);
        trace!(agent = %agent.id, item = %item.id, score, "contextual score computed");
        self.contextual.entry(agent.id).or_default().insert(
            item.id,
            ContextEntry {
                agent_fp,
                item_fp,
                config_fp: self.config_fp,
                score,
            },
        );
        score
    }

    /// Drop every entry referencing `item` from both tiers.
    ///
    /// Call when the item's quality or condition changes, or when it is
    /// destroyed. Returns the number of entries removed.
    pub fn invalidate_item(&mut self, item: ItemId) -> usize {
        let mut removed = usize::from(self.base.remove(&item).is_some());
        for per_agent in self.contextual.values_mut() {
            removed += usize::from(per_agent.remove(&item).is_some());
        }
        self.contextual.retain(|_, per_agent| !per_agent.is_empty());
        self.record_invalidation(removed);
        debug!(%item, removed, "item invalidated");
        removed
    }

    /// Drop every tier B entry of `agent`.
    ///
    /// Call when the agent's skills, traits or preferences change, or when
    /// it leaves the session. Returns the number of entries removed.
    pub fn invalidate_agent(&mut self, agent: AgentId) -> usize {
        let removed = self.contextual.remove(&agent).map_or(0, |m| m.len());
        self.record_invalidation(removed);
        debug!(%agent, removed, "agent invalidated");
        removed
    }

    /// Drop everything. Call on configuration change and world teardown.
    pub fn invalidate_all(&mut self) {
        let removed = self.base.len() + self.score_len();
        self.base.clear();
        self.contextual.clear();
        self.record_invalidation(removed);
        debug!(removed, "score cache flushed");
    }

    /// Number of tier A entries.
    #[must_use]
    pub fn base_len(&self) -> usize {
        self.base.len()
    }

    /// Number of tier B entries.
    #[must_use]
    pub fn score_len(&self) -> usize {
        self.contextual.values().map(HashMap::len).sum()
    }

    /// Whether both tiers are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.contextual.is_empty()
    }

    /// The counters owned by this cache.
    #[must_use]
    pub fn counters(&self) -> &EngineCounters {
        &self.counters
    }

    /// Snapshot of this cache's counters.
    #[must_use]
    pub fn stats(&self) -> CounterSnapshot {
        self.counters.snapshot()
    }

    fn record_invalidation(&self, removed: usize) {
        self.counters
            .invalidations
            .fetch_add(removed as u64, std::sync::atomic::Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{QualityTier, Skills};
    use std::cell::Cell;

    /// Scorer with fixed totals and call counters.
    struct CountingScorer {
        base_calls: Cell<u32>,
        adjust_calls: Cell<u32>,
    }

    impl CountingScorer {
        fn new() -> Self {
            Self {
                base_calls: Cell::new(0),
                adjust_calls: Cell::new(0),
            }
        }
    }

    impl Scorer for CountingScorer {
        fn fingerprint(&self) -> Fingerprint {
            Fingerprint(7)
        }

        fn score_base(&self, item: &ItemProfile) -> BaseScore {
            self.base_calls.set(self.base_calls.get() + 1);
            BaseScore::from_total(item.dps.unwrap_or(0.0))
        }

        fn adjust_for_agent(&self, agent: &AgentProfile, _item: &ItemProfile, base: &BaseScore) -> f32 {
            self.adjust_calls.set(self.adjust_calls.get() + 1);
            base.total() + f32::from(agent.skills.ranged)
        }
    }

    fn rifle() -> ItemProfile {
        ItemProfile::ranged(10, "Gun_Rifle", 50.0, 30.0)
    }

    fn agent() -> AgentProfile {
        AgentProfile::new(1, Skills::new(10, 2))
    }

    #[test]
    fn repeated_queries_compute_once() {
        let mut cache = ScoreCache::new(CountingScorer::new());
        let (a, item) = (agent(), rifle());
        let first = cache.get_score(&a, &item);
        for _ in 0..100 {
            assert!((cache.get_score(&a, &item) - first).abs() < f32::EPSILON);
        }
        assert_eq!(cache.scorer().adjust_calls.get(), 1);
        assert_eq!(cache.scorer().base_calls.get(), 1);
        assert_eq!(cache.stats().score_hits, 100);
        assert_eq!(cache.stats().score_misses, 1);
    }

    #[test]
    fn base_score_is_shared_between_agents() {
        let mut cache = ScoreCache::new(CountingScorer::new());
        let item = rifle();
        let a = agent();
        let b = AgentProfile::new(2, Skills::new(3, 3));
        cache.get_score(&a, &item);
        cache.get_score(&b, &item);
        assert_eq!(cache.scorer().base_calls.get(), 1);
        assert_eq!(cache.scorer().adjust_calls.get(), 2);
        assert_eq!(cache.score_len(), 2);
    }

    #[test]
    fn changed_skills_are_never_served_stale() {
        let mut cache = ScoreCache::new(CountingScorer::new());
        let item = rifle();
        let before = cache.get_score(&agent(), &item);
        let trained = AgentProfile::new(1, Skills::new(15, 2));
        let after = cache.get_score(&trained, &item);
        assert!(after > before);
        assert_eq!(cache.scorer().adjust_calls.get(), 2);
    }

    #[test]
    fn changed_quality_recomputes_both_tiers() {
        let mut cache = ScoreCache::new(CountingScorer::new());
        let a = agent();
        cache.get_score(&a, &rifle());
        cache.get_score(&a, &rifle().with_quality(QualityTier::Masterwork));
        assert_eq!(cache.scorer().base_calls.get(), 2);
        assert_eq!(cache.scorer().adjust_calls.get(), 2);
    }

    #[test]
    fn invalidate_item_clears_both_tiers() {
        let mut cache = ScoreCache::new(CountingScorer::new());
        let item = rifle();
        cache.get_score(&agent(), &item);
        cache.get_score(&AgentProfile::new(2, Skills::default()), &item);
        assert_eq!(cache.invalidate_item(item.id), 3);
        assert!(cache.is_empty());
        cache.get_score(&agent(), &item);
        assert_eq!(cache.scorer().base_calls.get(), 2);
    }

    #[test]
    fn invalidate_agent_keeps_base_scores() {
        let mut cache = ScoreCache::new(CountingScorer::new());
        let item = rifle();
        cache.get_score(&agent(), &item);
        assert_eq!(cache.invalidate_agent(AgentId(1)), 1);
        assert_eq!(cache.base_len(), 1);
        cache.get_score(&agent(), &item);
        assert_eq!(cache.scorer().base_calls.get(), 1);
        assert_eq!(cache.scorer().adjust_calls.get(), 2);
    }

    #[test]
    fn invalidate_all_flushes() {
        let mut cache: ScoreCache = ScoreCache::default();
        cache.get_score(&agent(), &rifle());
        cache.invalidate_all();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().invalidations, 2);
    }

    #[test]
    fn replacing_scorer_flushes() {
        let mut cache: ScoreCache = ScoreCache::default();
        cache.get_score(&agent(), &rifle());
        let mut config = crate::config::EngineConfig::default();
        config.scoring.dps_weight = 10.0;
        cache.replace_scorer(WeaponScorer::new(&config));
        assert!(cache.is_empty());
    }
}
