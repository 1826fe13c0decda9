//! Configuration for the Arsenal engine.
//!
//! Maps directly to `arsenal.toml`. Every field has a default, so an empty
//! file is a valid configuration. The numeric constants are tuning, not
//! contracts: the scoring *shapes* (exponential skill term, logarithmic burst
//! term, tiered thresholds) are fixed in code, the magnitudes live here.

use serde::{Deserialize, Serialize};

use crate::error::{ArsenalError, Result};
use crate::types::{Fingerprint, FingerprintBuilder};

/// Top-level engine configuration, loadable from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// Context-free item scoring.
    #[serde(default)]
    pub scoring: ScoringConfig,
    /// Agent-specific adjustment.
    #[serde(default)]
    pub adjustment: AdjustmentConfig,
    /// Upgrade policy.
    #[serde(default)]
    pub policy: PolicyConfig,
    /// Cooldown and pending-marker durations.
    #[serde(default)]
    pub cooldown: CooldownConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML string and validate it.
    ///
    /// # Errors
    /// Returns `ArsenalError::Config` if the TOML is invalid, or
    /// `ArsenalError::InvalidConfig` if a value is out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ArsenalError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Check every section for values the engine cannot work with.
    ///
    /// # Errors
    /// Returns the first offending field as `ArsenalError::InvalidConfig`.
    pub fn validate(&self) -> Result<()> {
        self.scoring.validate()?;
        self.adjustment.validate()?;
        self.policy.validate()?;
        Ok(())
    }

    /// Fingerprint of everything that influences a score.
    ///
    /// Policy and cooldown settings are excluded: changing them never
    /// invalidates a cached score.
    #[must_use]
    pub fn scoring_fingerprint(&self) -> Fingerprint {
        let builder = Fingerprint::builder();
        let builder = self.scoring.feed(builder);
        self.adjustment.feed(builder).finish()
    }
}

fn invalid(field: &str, reason: impl Into<String>) -> ArsenalError {
    ArsenalError::InvalidConfig {
        field: field.to_string(),
        reason: reason.into(),
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Whether the engine makes decisions at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_level: "info".to_string(),
        }
    }
}

/// One armor-penetration breakpoint: at `penetration`, the component is
/// worth `points`. Values between breakpoints are interpolated linearly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArmorBreakpoint {
    /// Penetration fraction.
    pub penetration: f32,
    /// Component value at that fraction.
    pub points: f32,
}

/// Context-free item scoring weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Points per DPS below the power-creep threshold.
    #[serde(default = "default_dps_weight")]
    pub dps_weight: f32,
    /// DPS above which returns diminish.
    #[serde(default = "default_power_creep_threshold")]
    pub power_creep_threshold: f32,
    /// Weight of the first unit of excess DPS, relative to `dps_weight`.
    #[serde(default = "default_0_5")]
    pub power_creep_dampening: f32,
    /// DPS scale of the logarithmic compression past the threshold.
    #[serde(default = "default_power_creep_scale")]
    pub power_creep_scale: f32,
    /// Range below which ranged weapons are penalized.
    #[serde(default = "default_short_range_cutoff")]
    pub short_range_cutoff: f32,
    /// Penalty per tile short of the cutoff.
    #[serde(default = "default_short_range_penalty")]
    pub short_range_penalty_per_tile: f32,
    /// Asymptotic maximum of the range reward.
    #[serde(default = "default_range_bonus_max")]
    pub range_bonus_max: f32,
    /// Range at which the reward reaches ~63% of its maximum.
    #[serde(default = "default_range_scale")]
    pub range_scale: f32,
    /// `k` in `k * ln(burst + 1)`.
    #[serde(default = "default_burst_weight")]
    pub burst_weight: f32,
    /// Armor-penetration breakpoints, ascending.
    #[serde(default = "default_armor_breakpoints")]
    pub armor_breakpoints: Vec<ArmorBreakpoint>,
    /// Points per quality tier, Awful..Legendary.
    #[serde(default = "default_quality_points")]
    pub quality_points: [f32; 7],
    /// Mass carried without penalty.
    #[serde(default = "default_mass_free_kg")]
    pub mass_free_kg: f32,
    /// Penalty per kilogram above the free allowance.
    #[serde(default = "default_mass_penalty")]
    pub mass_penalty_per_kg: f32,
    /// Minimum condition factor for a damaged-but-intact item.
    #[serde(default = "default_condition_floor")]
    pub condition_floor: f32,
    /// Ceiling on the total of situational weapons.
    #[serde(default = "default_situational_cap")]
    pub situational_cap: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            dps_weight: default_dps_weight(),
            power_creep_threshold: default_power_creep_threshold(),
            power_creep_dampening: 0.5,
            power_creep_scale: default_power_creep_scale(),
            short_range_cutoff: default_short_range_cutoff(),
            short_range_penalty_per_tile: default_short_range_penalty(),
            range_bonus_max: default_range_bonus_max(),
            range_scale: default_range_scale(),
            burst_weight: default_burst_weight(),
            armor_breakpoints: default_armor_breakpoints(),
            quality_points: default_quality_points(),
            mass_free_kg: default_mass_free_kg(),
            mass_penalty_per_kg: default_mass_penalty(),
            condition_floor: default_condition_floor(),
            situational_cap: default_situational_cap(),
        }
    }
}

impl ScoringConfig {
    fn validate(&self) -> Result<()> {
        if !(self.power_creep_dampening > 0.0 && self.power_creep_dampening <= 1.0) {
            return Err(invalid("scoring.power_creep_dampening", "must be in (0, 1]"));
        }
        for (field, value) in [
            ("scoring.power_creep_scale", self.power_creep_scale),
            ("scoring.range_scale", self.range_scale),
            ("scoring.situational_cap", self.situational_cap),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(field, "must be positive"));
            }
        }
        for (field, value) in [
            ("scoring.dps_weight", self.dps_weight),
            ("scoring.burst_weight", self.burst_weight),
            ("scoring.range_bonus_max", self.range_bonus_max),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(field, "must be non-negative"));
            }
        }
        if !(self.condition_floor > 0.0 && self.condition_floor <= 1.0) {
            return Err(invalid("scoring.condition_floor", "must be in (0, 1]"));
        }
        if self.quality_points.windows(2).any(|w| w[1] < w[0]) {
            return Err(invalid("scoring.quality_points", "must be non-decreasing"));
        }
        if self
            .armor_breakpoints
            .windows(2)
            .any(|w| w[1].penetration <= w[0].penetration || w[1].points < w[0].points)
        {
            return Err(invalid(
                "scoring.armor_breakpoints",
                "penetration must ascend and points must not decrease",
            ));
        }
        Ok(())
    }

    fn feed(&self, builder: FingerprintBuilder) -> FingerprintBuilder {
        let mut builder = builder
            .with_f32(self.dps_weight)
            .with_f32(self.power_creep_threshold)
            .with_f32(self.power_creep_dampening)
            .with_f32(self.power_creep_scale)
            .with_f32(self.short_range_cutoff)
            .with_f32(self.short_range_penalty_per_tile)
            .with_f32(self.range_bonus_max)
            .with_f32(self.range_scale)
            .with_f32(self.burst_weight)
            .with_f32(self.mass_free_kg)
            .with_f32(self.mass_penalty_per_kg)
            .with_f32(self.condition_floor)
            .with_f32(self.situational_cap);
        for bp in &self.armor_breakpoints {
            builder = builder.with_f32(bp.penetration).with_f32(bp.points);
        }
        for points in self.quality_points {
            builder = builder.with_f32(points);
        }
        builder
    }
}

/// Agent-specific adjustment weights.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdjustmentConfig {
    /// Skill bonus at level 1.
    #[serde(default = "default_skill_base_bonus")]
    pub skill_base_bonus: f32,
    /// Per-level growth factor of the skill bonus.
    #[serde(default = "default_skill_growth")]
    pub skill_growth_rate: f32,
    /// Skill levels above this are clamped.
    #[serde(default = "default_max_skill")]
    pub max_skill_level: u8,
    /// Brawler bonus on melee weapons.
    #[serde(default = "default_brawler")]
    pub brawler_melee_bonus: f32,
    /// Brawler penalty on ranged weapons.
    #[serde(default = "default_brawler")]
    pub brawler_ranged_penalty: f32,
    /// Hunter bonus on long-range ranged weapons.
    #[serde(default = "default_hunter")]
    pub hunter_long_range_bonus: f32,
    /// Hunter penalty on melee weapons.
    #[serde(default = "default_hunter")]
    pub hunter_melee_penalty: f32,
    /// Hunter penalty on explosive weapons.
    #[serde(default = "default_hunter_explosive")]
    pub hunter_explosive_penalty: f32,
    /// Minimum range for the hunter bonus.
    #[serde(default = "default_hunter_min_range")]
    pub hunter_min_range: f32,
    /// How strongly the −1..+1 type preference scales a class.
    #[serde(default = "default_preference_strength")]
    pub preference_strength: f32,
}

impl Default for AdjustmentConfig {
    fn default() -> Self {
        Self {
            skill_base_bonus: default_skill_base_bonus(),
            skill_growth_rate: default_skill_growth(),
            max_skill_level: default_max_skill(),
            brawler_melee_bonus: default_brawler(),
            brawler_ranged_penalty: default_brawler(),
            hunter_long_range_bonus: default_hunter(),
            hunter_melee_penalty: default_hunter(),
            hunter_explosive_penalty: default_hunter_explosive(),
            hunter_min_range: default_hunter_min_range(),
            preference_strength: default_preference_strength(),
        }
    }
}

impl AdjustmentConfig {
    fn validate(&self) -> Result<()> {
        if self.skill_growth_rate <= 0.0 {
            return Err(invalid("adjustment.skill_growth_rate", "must be positive"));
        }
        if !(0.0..1.0).contains(&self.preference_strength) {
            return Err(invalid("adjustment.preference_strength", "must be in [0, 1)"));
        }
        Ok(())
    }

    fn feed(&self, builder: FingerprintBuilder) -> FingerprintBuilder {
        builder
            .with_f32(self.skill_base_bonus)
            .with_f32(self.skill_growth_rate)
            .with(&self.max_skill_level)
            .with_f32(self.brawler_melee_bonus)
            .with_f32(self.brawler_ranged_penalty)
            .with_f32(self.hunter_long_range_bonus)
            .with_f32(self.hunter_melee_penalty)
            .with_f32(self.hunter_explosive_penalty)
            .with_f32(self.hunter_min_range)
            .with_f32(self.preference_strength)
    }
}

/// Upgrade acceptance policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Let forced items be replaced by better instances of the same def.
    #[serde(default)]
    pub allow_forced_upgrades: bool,
    /// Treat bonded items as forced, auto-registering them.
    #[serde(default = "default_true")]
    pub respect_bonds: bool,
    /// Armed agents keep their weapon while a raid is active.
    #[serde(default = "default_true")]
    pub suppress_during_raid: bool,
    /// Allow picking up a second instance of a def the agent already carries.
    #[serde(default)]
    pub allow_duplicates: bool,
    /// Required ratio when idle or doing untracked work.
    #[serde(default = "default_baseline_threshold")]
    pub baseline_threshold: f32,
    /// Required ratio while doing critical / safety work.
    #[serde(default = "default_critical_threshold")]
    pub critical_threshold: f32,
    /// Required ratio while hauling, doctoring or rescuing.
    #[serde(default = "default_support_threshold")]
    pub support_threshold: f32,
    /// Required ratio during any other tracked work.
    #[serde(default = "default_baseline_threshold")]
    pub work_threshold: f32,
    /// Lower clamp for the agent's own threshold setting.
    #[serde(default = "default_min_user_threshold")]
    pub min_user_threshold: f32,
    /// Upper clamp for the agent's own threshold setting.
    #[serde(default = "default_max_user_threshold")]
    pub max_user_threshold: f32,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            allow_forced_upgrades: false,
            respect_bonds: true,
            suppress_during_raid: true,
            allow_duplicates: false,
            baseline_threshold: default_baseline_threshold(),
            critical_threshold: default_critical_threshold(),
            support_threshold: default_support_threshold(),
            work_threshold: default_baseline_threshold(),
            min_user_threshold: default_min_user_threshold(),
            max_user_threshold: default_max_user_threshold(),
        }
    }
}

impl PolicyConfig {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("policy.baseline_threshold", self.baseline_threshold),
            ("policy.critical_threshold", self.critical_threshold),
            ("policy.support_threshold", self.support_threshold),
            ("policy.work_threshold", self.work_threshold),
        ] {
            if !(value.is_finite() && value >= 1.0) {
                return Err(invalid(field, "must be a finite ratio >= 1.0"));
            }
        }
        if self.min_user_threshold > self.max_user_threshold {
            return Err(invalid(
                "policy.min_user_threshold",
                "must not exceed max_user_threshold",
            ));
        }
        Ok(())
    }
}

/// Durations (in ticks) for the tracker's time-boxed entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CooldownConfig {
    /// Cooldown after a generic voluntary drop.
    #[serde(default = "default_generic_drop_ticks")]
    pub generic_drop_ticks: u64,
    /// Cooldown after an item was replaced by an upgrade.
    #[serde(default = "default_upgrade_drop_ticks")]
    pub upgrade_drop_ticks: u64,
    /// How long a pending-upgrade claim lives without being fulfilled.
    #[serde(default = "default_pending_timeout_ticks")]
    pub pending_timeout_ticks: u64,
}

impl Default for CooldownConfig {
    fn default() -> Self {
        Self {
            generic_drop_ticks: default_generic_drop_ticks(),
            upgrade_drop_ticks: default_upgrade_drop_ticks(),
            pending_timeout_ticks: default_pending_timeout_ticks(),
        }
    }
}

// ---------------------------------------------------------------------------
// Serde default helpers
// ---------------------------------------------------------------------------

fn default_true() -> bool { true }
fn default_log_level() -> String { "info".to_string() }
fn default_0_5() -> f32 { 0.5 }
fn default_dps_weight() -> f32 { 4.0 }
fn default_power_creep_threshold() -> f32 { 20.0 }
fn default_power_creep_scale() -> f32 { 10.0 }
fn default_short_range_cutoff() -> f32 { 12.0 }
fn default_short_range_penalty() -> f32 { 2.0 }
fn default_range_bonus_max() -> f32 { 40.0 }
fn default_range_scale() -> f32 { 20.0 }
fn default_burst_weight() -> f32 { 8.0 }
fn default_armor_breakpoints() -> Vec<ArmorBreakpoint> {
    [(0.0, 0.0), (0.15, 8.0), (0.35, 20.0), (0.6, 30.0), (1.0, 36.0)]
        .into_iter()
        .map(|(penetration, points)| ArmorBreakpoint { penetration, points })
        .collect()
}
fn default_quality_points() -> [f32; 7] { [-15.0, -7.0, 0.0, 5.0, 10.0, 16.0, 25.0] }
fn default_mass_free_kg() -> f32 { 3.0 }
fn default_mass_penalty() -> f32 { 1.5 }
fn default_condition_floor() -> f32 { 0.2 }
fn default_situational_cap() -> f32 { 80.0 }
fn default_skill_base_bonus() -> f32 { 2.0 }
fn default_skill_growth() -> f32 { 1.15 }
fn default_max_skill() -> u8 { 20 }
fn default_brawler() -> f32 { 25.0 }
fn default_hunter() -> f32 { 15.0 }
fn default_hunter_explosive() -> f32 { 40.0 }
fn default_hunter_min_range() -> f32 { 25.0 }
fn default_preference_strength() -> f32 { 0.3 }
fn default_baseline_threshold() -> f32 { 1.10 }
fn default_critical_threshold() -> f32 { 1.20 }
fn default_support_threshold() -> f32 { 1.15 }
fn default_min_user_threshold() -> f32 { 1.05 }
fn default_max_user_threshold() -> f32 { 1.30 }
fn default_generic_drop_ticks() -> u64 { 300 }
fn default_upgrade_drop_ticks() -> u64 { 1200 }
fn default_pending_timeout_ticks() -> u64 { 600 }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_default() {
        let config = EngineConfig::from_toml("").expect("empty config parses");
        assert!(config.general.enabled);
        assert!((config.policy.critical_threshold - 1.20).abs() < f32::EPSILON);
        assert_eq!(config.cooldown.upgrade_drop_ticks, 1200);
        assert_eq!(config.cooldown.generic_drop_ticks, 300);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config = EngineConfig::from_toml(
            r"
            [policy]
            allow_forced_upgrades = true

            [scoring]
            situational_cap = 60.0
            ",
        )
        .expect("valid config");
        assert!(config.policy.allow_forced_upgrades);
        assert!(config.policy.respect_bonds);
        assert!((config.scoring.situational_cap - 60.0).abs() < f32::EPSILON);
        assert!((config.scoring.dps_weight - 4.0).abs() < f32::EPSILON);
    }

    #[test]
    fn rejects_threshold_below_one() {
        let err = EngineConfig::from_toml("[policy]\ncritical_threshold = 0.9\n")
            .expect_err("threshold < 1 must be rejected");
        assert!(matches!(err, ArsenalError::InvalidConfig { ref field, .. } if field == "policy.critical_threshold"));
    }

    #[test]
    fn rejects_decreasing_quality_table() {
        let mut config = EngineConfig::default();
        config.scoring.quality_points[3] = -100.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_nan_scales() {
        let mut config = EngineConfig::default();
        config.scoring.range_scale = f32::NAN;
        let err = config.validate().expect_err("NaN scale must be rejected");
        assert!(matches!(err, ArsenalError::InvalidConfig { ref field, .. } if field == "scoring.range_scale"));
    }

    #[test]
    fn rejects_negative_weights() {
        let err = EngineConfig::from_toml("[scoring]
dps_weight = -1.0
")
            .expect_err("negative weight must be rejected");
        assert!(matches!(err, ArsenalError::InvalidConfig { ref field, .. } if field == "scoring.dps_weight"));

        let mut config = EngineConfig::default();
        config.scoring.burst_weight = 0.0;
        assert!(config.validate().is_ok());
        config.scoring.range_bonus_max = -5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = EngineConfig::from_toml("[policy\n").expect_err("malformed");
        assert!(matches!(err, ArsenalError::Config(_)));
    }

    #[test]
    fn fingerprint_ignores_policy() {
        let base = EngineConfig::default();
        let mut policy_changed = base.clone();
        policy_changed.policy.allow_forced_upgrades = true;
        policy_changed.cooldown.generic_drop_ticks = 10;
        assert_eq!(base.scoring_fingerprint(), policy_changed.scoring_fingerprint());

        let mut scoring_changed = base.clone();
        scoring_changed.scoring.burst_weight = 9.0;
        assert_ne!(base.scoring_fingerprint(), scoring_changed.scoring_fingerprint());
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("arsenal.toml");
        std::fs::write(&path, "[cooldown]\npending_timeout_ticks = 90\n").expect("write");
        let config = EngineConfig::from_file(&path).expect("load");
        assert_eq!(config.cooldown.pending_timeout_ticks, 90);
    }
}
