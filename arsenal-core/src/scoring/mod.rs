//! Weapon scoring: context-free base score + agent-specific adjustment.
//!
//! Score(agent, item) = (Base(item) + SkillFit + Traits) × ClassPreference
//!
//! Where:
//!   Base(item)      = (Damage + Range + Burst + Armor + Quality + Mass) × Condition,
//!                     capped for situational weapons
//!   SkillFit        = b·g^(matching−1) − b·g^(other−1)
//!   Traits          = additive brawler / hunter terms
//!   ClassPreference = 1 ± p·strength
//!
//! Both stages are pure functions of their snapshots. The [`Scorer`] trait is
//! the seam the cache computes through, so hosts (and tests) can substitute
//! their own scoring while keeping the caching and policy layers.

pub mod base;
pub mod context;

use serde::{Deserialize, Serialize};

use crate::config::{AdjustmentConfig, EngineConfig, ScoringConfig};
use crate::types::{AgentProfile, Fingerprint, ItemProfile};

/// Breakdown of a base score into its components.
///
/// `condition` and `situational_cap` are adjustments (usually ≤ 0) so that
/// the component sum matches [`BaseScore::total`] up to rounding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BaseScore {
    /// DPS contribution, dampened past the power-creep threshold.
    pub damage: f32,
    /// Range band contribution (ranged only).
    pub range: f32,
    /// Logarithmic burst contribution.
    pub burst: f32,
    /// Armor-penetration contribution.
    pub armor: f32,
    /// Quality step.
    pub quality: f32,
    /// Mass penalty.
    pub mass: f32,
    /// Change caused by the condition factor.
    pub condition: f32,
    /// Change caused by the situational ceiling.
    pub situational_cap: f32,
    /// The condition factor that was applied (0..1).
    pub condition_factor: f32,
    total: f32,
}

/// Names a [`BaseScore`] component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Component {
    /// [`BaseScore::damage`].
    Damage,
    /// [`BaseScore::range`].
    Range,
    /// [`BaseScore::burst`].
    Burst,
    /// [`BaseScore::armor`].
    Armor,
    /// [`BaseScore::quality`].
    Quality,
    /// [`BaseScore::mass`].
    Mass,
    /// [`BaseScore::condition`].
    Condition,
    /// [`BaseScore::situational_cap`].
    SituationalCap,
}

impl BaseScore {
    /// Build a breakdown with an explicit total.
    ///
    /// Used by custom [`Scorer`]s that do not decompose their score.
    #[must_use]
    pub fn from_total(total: f32) -> Self {
        Self {
            damage: total,
            condition_factor: 1.0,
            total,
            ..Self::default()
        }
    }

    /// The base score.
    #[must_use]
    pub fn total(&self) -> f32 {
        self.total
    }

    /// The component with the largest absolute contribution.
    #[must_use]
    pub fn dominant(&self) -> Component {
        let parts = [
            (Component::Damage, self.damage),
            (Component::Range, self.range),
            (Component::Burst, self.burst),
            (Component::Armor, self.armor),
            (Component::Quality, self.quality),
            (Component::Mass, self.mass),
            (Component::Condition, self.condition),
            (Component::SituationalCap, self.situational_cap),
        ];
        parts
            .into_iter()
            .fold((Component::Damage, f32::NEG_INFINITY), |best, (c, v)| {
                if v.abs() > best.1 { (c, v.abs()) } else { best }
            })
            .0
    }
}

/// Computes scores for the cache.
///
/// Implementations must be pure: equal inputs and an equal
/// [`Scorer::fingerprint`] must produce equal outputs.
pub trait Scorer {
    /// Identifies the scorer's configuration. Cached values computed under a
    /// different fingerprint are never served.
    fn fingerprint(&self) -> Fingerprint;

    /// Context-free desirability of an item.
    fn score_base(&self, item: &ItemProfile) -> BaseScore;

    /// Final score of `item` for `agent`, given its base score.
    fn adjust_for_agent(&self, agent: &AgentProfile, item: &ItemProfile, base: &BaseScore) -> f32;
}

/// The default scorer, driven by [`EngineConfig`] weights.
#[derive(Debug, Clone)]
pub struct WeaponScorer {
    scoring: ScoringConfig,
    adjustment: AdjustmentConfig,
    fingerprint: Fingerprint,
}

impl WeaponScorer {
    /// Create a scorer from the engine configuration.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            scoring: config.scoring.clone(),
            adjustment: config.adjustment.clone(),
            fingerprint: config.scoring_fingerprint(),
        }
    }

    /// The scoring weights.
    #[must_use]
    pub fn scoring(&self) -> &ScoringConfig {
        &self.scoring
    }

    /// The adjustment weights.
    #[must_use]
    pub fn adjustment(&self) -> &AdjustmentConfig {
        &self.adjustment
    }
}

impl Default for WeaponScorer {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Scorer for WeaponScorer {
    fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    fn score_base(&self, item: &ItemProfile) -> BaseScore {
        base::score_base(item, &self.scoring)
    }

    fn adjust_for_agent(&self, agent: &AgentProfile, item: &ItemProfile, base: &BaseScore) -> f32 {
        context::adjust_for_agent(agent, item, base, &self.adjustment)
    }
}
