//! # Arsenal Core Library
//!
//! Game-agnostic weapon suitability engine for game agents.
//!
//! Given an agent snapshot ([`AgentProfile`]) and candidate weapons
//! ([`ItemProfile`]), the engine answers one question per decision cycle:
//! *should this agent switch weapons, and to what?*
//!
//! - **Base scoring**: context-free desirability of an item (`scoring::base`)
//! - **Contextual adjustment**: skill fit, traits, type preference (`scoring::context`)
//! - **Score cache**: tier A (per item) and tier B (per agent × item) memoization
//! - **Upgrade policy**: forced / bonded locks, tiered thresholds, cooldowns
//! - **Tracker**: forced pins, dropped-item cooldowns, pending-upgrade claims
//!
//! ## Performance Contract
//!
//! The host queries every agent against every reachable item every few
//! ticks, so:
//! - A cached score lookup is a pair of hash-map probes.
//! - At most one score computation per (agent, item) pair between invalidations.
//! - Nothing in the decision path blocks or panics.

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod types;

pub use cache::ScoreCache;
pub use config::EngineConfig;
pub use error::ArsenalError;
pub use registry::Tracker;
pub use scoring::{BaseScore, Scorer, WeaponScorer};
pub use selection::{
    Activity, Decision, DecisionContext, ExternalPolicy, KeepReason, NoRestrictions, UpgradeSelector,
};
pub use session::{Session, SessionId};
pub use types::*;
