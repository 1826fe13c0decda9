//! Agent-specific score adjustment.

use crate::config::AdjustmentConfig;
use crate::scoring::BaseScore;
use crate::types::{AgentProfile, AgentTraits, CombatClass, ItemProfile};

/// Combine a base score with the agent's skill fit, traits and type preference.
///
/// The result is always finite.
#[must_use]
pub fn adjust_for_agent(
    agent: &AgentProfile,
    item: &ItemProfile,
    base: &BaseScore,
    config: &AdjustmentConfig,
) -> f32 {
    let skill = skill_fit(agent, item.class, config);
    let traits = trait_adjustment(agent.traits, item, config);
    let multiplier = class_multiplier(agent.type_preference, item.class, config);

    let score = (base.total() + skill + traits) * multiplier;
    if score.is_finite() { score } else { 0.0 }
}

/// Exponential bonus for the matching skill minus the same curve for the
/// other class.
///
/// Symmetric by construction: swapping the two skill levels negates the term.
#[must_use]
pub fn skill_fit(agent: &AgentProfile, class: CombatClass, config: &AdjustmentConfig) -> f32 {
    let matching = agent.skills.for_class(class);
    let other = agent.skills.for_class(class.other());
    skill_curve(matching, config) - skill_curve(other, config)
}

/// `base_bonus · growth^(level − 1)`, level clamped to the configured maximum.
#[must_use]
pub fn skill_curve(level: u8, config: &AdjustmentConfig) -> f32 {
    let level = i32::from(level.min(config.max_skill_level));
    config.skill_base_bonus * config.skill_growth_rate.powi(level - 1)
}

/// Additive trait and role terms.
#[must_use]
pub fn trait_adjustment(traits: AgentTraits, item: &ItemProfile, config: &AdjustmentConfig) -> f32 {
    let mut adjustment = 0.0;

    if traits.brawler {
        adjustment += match item.class {
            CombatClass::Melee => config.brawler_melee_bonus,
            CombatClass::Ranged => -config.brawler_ranged_penalty,
        };
    }

    if traits.hunter {
        match item.class {
            CombatClass::Ranged => {
                let range = item.range.filter(|r| r.is_finite()).unwrap_or(0.0);
                if range >= config.hunter_min_range {
                    adjustment += config.hunter_long_range_bonus;
                }
            }
            CombatClass::Melee => adjustment -= config.hunter_melee_penalty,
        }
        if item.tags.explosive {
            adjustment -= config.hunter_explosive_penalty;
        }
    }

    adjustment
}

/// Linear multiplier derived from the −1 (melee) .. +1 (ranged) preference.
#[must_use]
pub fn class_multiplier(preference: f32, class: CombatClass, config: &AdjustmentConfig) -> f32 {
    let p = if preference.is_finite() {
        preference.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    match class {
        CombatClass::Ranged => 1.0 + p * config.preference_strength,
        CombatClass::Melee => 1.0 - p * config.preference_strength,
    }
}
