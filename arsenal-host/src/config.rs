//! Host-side configuration: engine tuning plus scheduling cadence and logging.
//!
//! ```toml
//! [engine.general]
//! log_level = "debug"
//!
//! [engine.policy]
//! allow_forced_upgrades = true
//!
//! [schedule]
//! idle_interval_ticks = 30
//!
//! [logging]
//! json = false
//! ```

use arsenal_core::config::EngineConfig;
use arsenal_core::error::{ArsenalError, Result};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Complete host configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostConfig {
    /// Engine tuning, passed to every session.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Scheduler cadence.
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Log output format.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl HostConfig {
    /// Parse and validate a TOML string.
    ///
    /// # Errors
    /// Returns `ArsenalError::Config` on malformed TOML, or
    /// `ArsenalError::InvalidConfig` if a value is out of range.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| ArsenalError::Config(e.to_string()))?;
        config.engine.validate()?;
        config.schedule.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

/// How often the scheduler revisits agents, in ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Armed agents are re-evaluated this often.
    #[serde(default = "default_idle_interval")]
    pub idle_interval_ticks: u64,
    /// Unarmed agents are re-evaluated this often.
    #[serde(default = "default_unarmed_interval")]
    pub unarmed_interval_ticks: u64,
    /// Tracker sweep cadence.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_ticks: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            idle_interval_ticks: default_idle_interval(),
            unarmed_interval_ticks: default_unarmed_interval(),
            cleanup_interval_ticks: default_cleanup_interval(),
        }
    }
}

impl ScheduleConfig {
    fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("schedule.idle_interval_ticks", self.idle_interval_ticks),
            ("schedule.unarmed_interval_ticks", self.unarmed_interval_ticks),
            ("schedule.cleanup_interval_ticks", self.cleanup_interval_ticks),
        ] {
            if value == 0 {
                return Err(ArsenalError::InvalidConfig {
                    field: field.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Log output settings. The level comes from `engine.general.log_level`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_idle_interval() -> u64 { 30 }
fn default_unarmed_interval() -> u64 { 1 }
fn default_cleanup_interval() -> u64 { 250 }

/// Install a global `tracing` subscriber.
///
/// `RUST_LOG` overrides the configured level when set.
///
/// # Errors
/// Returns `ArsenalError::Config` if the level does not parse or a global
/// subscriber is already installed.
pub fn init_tracing(config: &HostConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.engine.general.log_level)
            .map_err(|e| ArsenalError::Config(format!("log_level: {e}")))?,
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    let installed = if config.logging.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| ArsenalError::Config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config = HostConfig::from_toml("").expect("empty config is valid");
        assert_eq!(config.schedule.idle_interval_ticks, 30);
        assert_eq!(config.schedule.unarmed_interval_ticks, 1);
        assert!(!config.logging.json);
        assert!(config.engine.general.enabled);
    }

    #[test]
    fn nested_engine_section_parses() {
        let toml = r#"
[engine.policy]
allow_forced_upgrades = true
critical_threshold = 1.25

[schedule]
idle_interval_ticks = 60
"#;
        let config = HostConfig::from_toml(toml).expect("valid config");
        assert!(config.engine.policy.allow_forced_upgrades);
        assert!((config.engine.policy.critical_threshold - 1.25).abs() < f32::EPSILON);
        assert_eq!(config.schedule.idle_interval_ticks, 60);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = HostConfig::from_toml("[schedule]\nunarmed_interval_ticks = 0\n").expect_err("zero interval");
        assert!(matches!(err, ArsenalError::InvalidConfig { .. }));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("host.toml");
        std::fs::write(&path, "[logging]\njson = true\n").expect("write");
        let config = HostConfig::from_file(&path).expect("load");
        assert!(config.logging.json);
    }
}
