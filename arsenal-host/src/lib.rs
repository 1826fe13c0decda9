//! # arsenal-host: Host Integration for Arsenal
//!
//! This crate is the glue between a game's simulation loop and the
//! game-agnostic `arsenal-core` engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Host simulation              │
//! │  ┌───────────────────────────────────┐  │
//! │  │         arsenal-host              │  │
//! │  │  ┌─────────────┐ ┌─────────────┐  │  │
//! │  │  │  HostWorld  │ │  Scheduler  │  │  │
//! │  │  └──────┬──────┘ └──────┬──────┘  │  │
//! │  │         │  HostEvent    │         │  │
//! │  │         ▼               ▼         │  │
//! │  │    ┌─────────────────────────┐    │  │
//! │  │    │  arsenal-core Session   │    │  │
//! │  │    └─────────────────────────┘    │  │
//! │  └───────────────────────────────────┘  │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `adapter`: snapshot interface and handle ↔ id mapping
//! - `hooks`: world changes forwarded to the session
//! - `systems`: per-agent cadence, upgrade passes and sweeps
//! - `config`: host configuration and `tracing` subscriber setup
//! - `shared`: mutex-guarded session for multi-threaded hosts

#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod adapter;
pub mod config;
pub mod hooks;
pub mod shared;
pub mod systems;

pub use adapter::{HandleRegistry, HostWorld};
pub use arsenal_core::error::{ArsenalError, Result};
pub use config::{HostConfig, init_tracing};
pub use hooks::HostEvent;
pub use shared::SharedSession;
pub use systems::{PassReport, UpgradeOrder, UpgradeScheduler};
