//! Invalidation & cooldown tracker.
//!
//! Three session-owned registries gate the selector:
//!
//! - **Forced pins**: per agent, one pinned item instance plus a set of
//!   pinned defs. Only the user creates them, except bonded items which the
//!   selector may auto-register.
//! - **Drop cooldowns**: items an agent voluntarily dropped, suppressed
//!   until an expiry tick so they are not immediately picked up again.
//! - **Pending upgrades**: an agent's claim on an item it is walking to, so
//!   two agents do not race for the same weapon.
//!
//! Nothing here runs on a timer. The host calls [`Tracker::cleanup_expired`]
//! from its own loop.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CooldownConfig;
use crate::error::Result;
use crate::types::{AgentId, ItemDef, ItemId, ItemProfile, Tick};

/// Why an item went on cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DropReason {
    /// Dropped because an upgrade replaced it. Long cooldown.
    UpgradeReplacement,
    /// Any other voluntary drop. Short cooldown.
    Generic,
}

/// An active drop cooldown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    /// First tick at which the item is selectable again.
    pub expires_at: Tick,
    /// Why the item was dropped.
    pub reason: DropReason,
}

/// Pins for one agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForcedEntry {
    /// Pinned item instance.
    pub item: Option<ItemId>,
    /// Pinned defs.
    pub categories: BTreeSet<ItemDef>,
}

impl ForcedEntry {
    fn is_empty(&self) -> bool {
        self.item.is_none() && self.categories.is_empty()
    }
}

/// An agent's claim on a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingUpgrade {
    /// Claimed item.
    pub item: ItemId,
    /// Tick the claim was made.
    pub since: Tick,
}

/// Session-owned forced / cooldown / pending registries.
#[derive(Debug, Clone, Default)]
pub struct Tracker {
    forced: HashMap<AgentId, ForcedEntry>,
    cooldowns: HashMap<ItemId, Cooldown>,
    pending: HashMap<AgentId, PendingUpgrade>,
    config: CooldownConfig,
}

impl Tracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new(config: CooldownConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// The configured durations.
    #[must_use]
    pub fn config(&self) -> &CooldownConfig {
        &self.config
    }

    /// Replace the durations. Running cooldowns keep their expiry.
    pub fn set_config(&mut self, config: CooldownConfig) {
        self.config = config;
    }

    // -----------------------------------------------------------------------
    // Forced pins
    // -----------------------------------------------------------------------

    /// Pin `item` for `agent`, replacing any previous instance pin.
    pub fn set_forced(&mut self, agent: AgentId, item: ItemId) {
        self.forced.entry(agent).or_default().item = Some(item);
        debug!(%agent, %item, "item forced");
    }

    /// Remove every pin of `agent`.
    pub fn clear_forced(&mut self, agent: AgentId) {
        if self.forced.remove(&agent).is_some() {
            debug!(%agent, "forced pins cleared");
        }
    }

    /// Whether `item` is pinned for `agent`, by instance or by def.
    #[must_use]
    pub fn is_forced(&self, agent: AgentId, item: &ItemProfile) -> bool {
        self.forced
            .get(&agent)
            .is_some_and(|e| e.item == Some(item.id) || e.categories.contains(&item.def))
    }

    /// The pinned instance of `agent`, if any.
    #[must_use]
    pub fn forced_item(&self, agent: AgentId) -> Option<ItemId> {
        self.forced.get(&agent).and_then(|e| e.item)
    }

    /// Pin a def for `agent`.
    pub fn add_forced_category(&mut self, agent: AgentId, def: ItemDef) {
        debug!(%agent, %def, "category forced");
        self.forced.entry(agent).or_default().categories.insert(def);
    }

    /// Unpin a def for `agent`.
    pub fn remove_forced_category(&mut self, agent: AgentId, def: &ItemDef) {
        if let Some(entry) = self.forced.get_mut(&agent) {
            entry.categories.remove(def);
            if entry.is_empty() {
                self.forced.remove(&agent);
            }
        }
    }

    /// Whether `def` is pinned for `agent`.
    #[must_use]
    pub fn is_category_forced(&self, agent: AgentId, def: &ItemDef) -> bool {
        self.forced
            .get(&agent)
            .is_some_and(|e| e.categories.contains(def))
    }

    // -----------------------------------------------------------------------
    // Cooldowns
    // -----------------------------------------------------------------------

    /// Put `item` on cooldown for `duration` ticks from `now`.
    ///
    /// A longer running cooldown is never shortened.
    pub fn mark_dropped(&mut self, item: ItemId, now: Tick, duration: u64, reason: DropReason) {
        let expires_at = now.saturating_add(duration);
        let entry = self.cooldowns.entry(item).or_insert(Cooldown { expires_at, reason });
        if expires_at >= entry.expires_at {
            *entry = Cooldown { expires_at, reason };
        }
        debug!(%item, expires_at, ?reason, "item on cooldown");
    }

    /// Put `item` on cooldown for the configured duration of `reason`.
    pub fn mark_dropped_for(&mut self, item: ItemId, now: Tick, reason: DropReason) {
        let duration = match reason {
            DropReason::UpgradeReplacement => self.config.upgrade_drop_ticks,
            DropReason::Generic => self.config.generic_drop_ticks,
        };
        self.mark_dropped(item, now, duration, reason);
    }

    /// Whether `item` is still suppressed at `now`.
    ///
    /// Becomes false exactly at the expiry tick, whether or not a cleanup
    /// sweep has run yet.
    #[must_use]
    pub fn is_on_cooldown(&self, item: ItemId, now: Tick) -> bool {
        self.cooldowns.get(&item).is_some_and(|c| now < c.expires_at)
    }

    /// The cooldown entry of `item`, expired or not.
    #[must_use]
    pub fn cooldown(&self, item: ItemId) -> Option<Cooldown> {
        self.cooldowns.get(&item).copied()
    }

    // -----------------------------------------------------------------------
    // Pending upgrades
    // -----------------------------------------------------------------------

    /// Record that `agent` is on its way to equip `item`.
    pub fn mark_pending(&mut self, agent: AgentId, item: ItemId, now: Tick) {
        self.pending.insert(agent, PendingUpgrade { item, since: now });
    }

    /// Drop `agent`'s claim.
    pub fn clear_pending(&mut self, agent: AgentId) {
        self.pending.remove(&agent);
    }

    /// `agent`'s current claim.
    #[must_use]
    pub fn pending_for(&self, agent: AgentId) -> Option<PendingUpgrade> {
        self.pending.get(&agent).copied()
    }

    /// Whether some agent other than `agent` has claimed `item`.
    #[must_use]
    pub fn is_pending_for_other(&self, agent: AgentId, item: ItemId) -> bool {
        self.pending
            .iter()
            .any(|(owner, claim)| *owner != agent && claim.item == item)
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Purge expired cooldowns and stale pending claims.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self, now: Tick) -> usize {
        let before = self.cooldowns.len() + self.pending.len();
        self.cooldowns.retain(|_, c| now < c.expires_at);
        let timeout = self.config.pending_timeout_ticks;
        self.pending
            .retain(|_, p| now < p.since.saturating_add(timeout));
        let removed = before - (self.cooldowns.len() + self.pending.len());
        if removed > 0 {
            debug!(now, removed, "tracker entries expired");
        }
        removed
    }

    /// Forget an agent that left the session: pins and claims.
    pub fn forget_agent(&mut self, agent: AgentId) {
        self.forced.remove(&agent);
        self.pending.remove(&agent);
    }

    /// Forget a destroyed item: cooldown, claims and instance pins.
    /// Def pins are kept.
    pub fn forget_item(&mut self, item: ItemId) {
        self.cooldowns.remove(&item);
        self.pending.retain(|_, p| p.item != item);
        for entry in self.forced.values_mut() {
            if entry.item == Some(item) {
                entry.item = None;
            }
        }
        self.forced.retain(|_, e| !e.is_empty());
    }

    /// Drop everything except forced pins, which outlive map transitions.
    pub fn clear_transient(&mut self) {
        self.cooldowns.clear();
        self.pending.clear();
    }

    /// Number of live cooldown entries (expired ones included until swept).
    #[must_use]
    pub fn cooldown_count(&self) -> usize {
        self.cooldowns.len()
    }

    // -----------------------------------------------------------------------
    // Save / load
    // -----------------------------------------------------------------------

    /// Capture forced pins for the host's save file.
    #[must_use]
    pub fn snapshot(&self) -> ForcedSnapshot {
        let mut entries: Vec<ForcedSnapshotEntry> = self
            .forced
            .iter()
            .map(|(agent, e)| ForcedSnapshotEntry {
                agent: *agent,
                item: e.item,
                categories: e.categories.iter().cloned().collect(),
            })
            .collect();
        entries.sort_by_key(|e| e.agent);
        ForcedSnapshot { entries }
    }

    /// Replace forced pins with a saved snapshot.
    ///
    /// Instance pins are restored as-is; a host whose item ids changed across
    /// the load should pass `keep_item_pins = false` and rely on def pins.
    pub fn restore(&mut self, snapshot: ForcedSnapshot, keep_item_pins: bool) {
        self.forced.clear();
        for entry in snapshot.entries {
            let restored = ForcedEntry {
                item: entry.item.filter(|_| keep_item_pins),
                categories: entry.categories.into_iter().collect(),
            };
            if !restored.is_empty() {
                self.forced.insert(entry.agent, restored);
            }
        }
        debug!(agents = self.forced.len(), "forced pins restored");
    }
}

/// Serializable forced pins.
///
/// Def pins are the durable part; instance pins are best-effort.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedSnapshot {
    /// One entry per agent with pins.
    pub entries: Vec<ForcedSnapshotEntry>,
}

/// Pins of one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForcedSnapshotEntry {
    /// Agent.
    pub agent: AgentId,
    /// Pinned instance.
    #[serde(default)]
    pub item: Option<ItemId>,
    /// Pinned defs.
    #[serde(default)]
    pub categories: Vec<ItemDef>,
}

impl ForcedSnapshot {
    /// Encode as JSON.
    ///
    /// # Errors
    /// Returns `ArsenalError::Serialization` on encoder failure.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON.
    ///
    /// # Errors
    /// Returns `ArsenalError::Serialization` if the text is not a snapshot.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
