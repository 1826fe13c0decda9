//! Context-free item scoring.
//!
//! Every component is monotonic in its input. Missing or malformed numbers
//! (absent, negative, NaN, infinite) contribute nothing instead of failing.

use crate::config::{ArmorBreakpoint, ScoringConfig};
use crate::scoring::BaseScore;
use crate::types::{CombatClass, ItemProfile};

/// Compute the full base-score breakdown for an item.
#[must_use]
pub fn score_base(item: &ItemProfile, config: &ScoringConfig) -> BaseScore {
    let damage = damage_score(sanitize(item.dps), config);
    let range = match (item.class, item.range.filter(|r| r.is_finite() && *r >= 0.0)) {
        (CombatClass::Ranged, Some(r)) => range_score(r, config),
        _ => 0.0,
    };
    let burst = item.burst.map_or(0.0, |b| burst_score(b, config));
    let armor = armor_score(sanitize(item.armor_penetration), &config.armor_breakpoints);
    let quality = config.quality_points[item.quality.ordinal()];
    let mass = mass_penalty(sanitize(item.mass), config);

    let subtotal = damage + range + burst + armor + quality + mass;
    let condition_factor = condition_factor(item.condition, config.condition_floor);
    // Wear removes the same fraction of |subtotal| on both sides of zero.
    let conditioned = subtotal - (1.0 - condition_factor) * subtotal.abs();

    let total = if item.tags.any() {
        conditioned.min(config.situational_cap)
    } else {
        conditioned
    };

    BaseScore {
        damage,
        range,
        burst,
        armor,
        quality,
        mass,
        condition: conditioned - subtotal,
        situational_cap: total - conditioned,
        condition_factor,
        total: if total.is_finite() { total } else { 0.0 },
    }
}

/// Positive finite value or zero.
fn sanitize(value: Option<f32>) -> f32 {
    value.filter(|v| v.is_finite() && *v > 0.0).unwrap_or(0.0)
}

/// Linear up to the power-creep threshold, then logarithmic with an initial
/// slope of `dps_weight × dampening`.
///
/// The log tail is strictly concave, so equal DPS steps above the threshold
/// buy strictly less each time.
#[must_use]
pub fn damage_score(dps: f32, config: &ScoringConfig) -> f32 {
    let threshold = config.power_creep_threshold.max(0.0);
    if dps <= threshold {
        return dps * config.dps_weight;
    }
    let excess = dps - threshold;
    let scale = config.power_creep_scale;
    threshold * config.dps_weight
        + config.dps_weight * config.power_creep_dampening * scale * (excess / scale).ln_1p()
}

/// Penalty below the short-range cutoff plus an asymptotic reward.
#[must_use]
pub fn range_score(range: f32, config: &ScoringConfig) -> f32 {
    let shortfall = (config.short_range_cutoff - range).max(0.0);
    let penalty = shortfall * config.short_range_penalty_per_tile;
    let reward = config.range_bonus_max * (1.0 - (-range / config.range_scale).exp());
    reward - penalty
}

/// `k · ln(burst + 1)`.
#[must_use]
pub fn burst_score(burst: u32, config: &ScoringConfig) -> f32 {
    #[allow(clippy::cast_precision_loss)]
    let shots = burst as f32;
    config.burst_weight * shots.ln_1p()
}

/// Piecewise-linear interpolation over the breakpoints, with an implicit
/// `(0, 0)` origin and a flat tail past the last breakpoint.
#[must_use]
pub fn armor_score(penetration: f32, breakpoints: &[ArmorBreakpoint]) -> f32 {
    let mut previous = ArmorBreakpoint {
        penetration: 0.0,
        points: 0.0,
    };
    for bp in breakpoints {
        if penetration <= bp.penetration {
            let span = bp.penetration - previous.penetration;
            if span <= 0.0 {
                return bp.points;
            }
            let t = (penetration - previous.penetration) / span;
            return previous.points + (bp.points - previous.points) * t;
        }
        previous = *bp;
    }
    previous.points
}

/// Flat penalty per kilogram over the free allowance.
#[must_use]
pub fn mass_penalty(mass: f32, config: &ScoringConfig) -> f32 {
    -(mass - config.mass_free_kg).max(0.0) * config.mass_penalty_per_kg
}

/// `max(condition, floor)`; exactly zero only for a zero condition.
/// Missing or malformed condition counts as pristine.
#[must_use]
pub fn condition_factor(condition: Option<f32>, floor: f32) -> f32 {
    match condition {
        Some(c) if c.is_finite() && c == 0.0 => 0.0,
        Some(c) if c.is_finite() && c > 0.0 => c.min(1.0).max(floor),
        _ => 1.0,
    }
}
