//! Invalidation and registry hooks.
//!
//! The host forwards world changes as [`HostEvent`]s. Each event maps to the
//! session call that keeps cached scores and tracker state honest; forgetting
//! to forward one costs a recomputation, never a wrong decision.

use arsenal_core::registry::DropReason;
use arsenal_core::scoring::Scorer;
use arsenal_core::session::Session;
use arsenal_core::types::{AgentId, ItemDef, ItemId};
use tracing::debug;

/// A world change the engine must hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Quality, condition or stats of an item changed.
    ItemChanged(ItemId),
    /// Skills, traits or weapon preference of an agent changed.
    AgentChanged(AgentId),
    /// An item was destroyed or left the world.
    ItemDestroyed(ItemId),
    /// An agent died or left the world.
    AgentRemoved(AgentId),
    /// An agent voluntarily dropped an item.
    ItemDropped {
        /// The dropped item.
        item: ItemId,
        /// Why it was dropped.
        reason: DropReason,
    },
    /// An agent finished equipping the upgrade it claimed.
    UpgradeEquipped {
        /// The agent.
        agent: AgentId,
        /// The item it now holds.
        item: ItemId,
        /// What it was holding before, if anything.
        replaced: Option<ItemId>,
    },
    /// An agent gave up on the upgrade it claimed.
    UpgradeAbandoned(AgentId),
    /// The player pinned an item instance to an agent.
    UserForced {
        /// The agent.
        agent: AgentId,
        /// The pinned item.
        item: ItemId,
    },
    /// The player pinned a weapon type to an agent.
    UserForcedDef {
        /// The agent.
        agent: AgentId,
        /// The pinned def.
        def: ItemDef,
    },
    /// The player removed an agent's pins.
    UserUnforced(AgentId),
    /// The world is being unloaded.
    WorldTeardown,
}

/// Apply one event to `session`.
pub fn apply<S: Scorer>(session: &mut Session<S>, event: HostEvent) {
    debug!(?event, "host event");
    match event {
        HostEvent::ItemChanged(item) => {
            session.invalidate_item(item);
        }
        HostEvent::AgentChanged(agent) => {
            session.invalidate_agent(agent);
        }
        HostEvent::ItemDestroyed(item) => session.item_destroyed(item),
        HostEvent::AgentRemoved(agent) => session.agent_removed(agent),
        HostEvent::ItemDropped { item, reason } => session.mark_dropped(item, reason),
        HostEvent::UpgradeEquipped {
            agent,
            item,
            replaced,
        } => session.complete_upgrade(agent, item, replaced),
        HostEvent::UpgradeAbandoned(agent) => session.abandon_upgrade(agent),
        HostEvent::UserForced { agent, item } => session.set_forced(agent, item),
        HostEvent::UserForcedDef { agent, def } => session.add_forced_category(agent, def),
        HostEvent::UserUnforced(agent) => session.clear_forced(agent),
        HostEvent::WorldTeardown => session.teardown(),
    }
}

/// Apply a batch of events in order.
pub fn apply_all<S: Scorer>(session: &mut Session<S>, events: impl IntoIterator<Item = HostEvent>) {
    for event in events {
        apply(session, event);
    }
}
