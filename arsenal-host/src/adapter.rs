//! Adapter module: maps between host handles and Arsenal identities.
//!
//! Hosts identify pawns and things with their own handle types (entity
//! indices, generational keys, save-file strings). Arsenal uses plain
//! session-local `AgentId` / `ItemId` numbers. This module provides:
//!
//! - [`HostWorld`]: the snapshot interface a host implements so the
//!   scheduler can pull profiles without knowing the host's internals.
//! - [`HandleRegistry`]: a bidirectional handle ↔ id map for hosts whose
//!   handles are not already small integers.

use std::collections::HashMap;
use std::hash::Hash;

use arsenal_core::selection::Activity;
use arsenal_core::types::{AgentId, AgentProfile, ItemId, ItemProfile};

// ---------------------------------------------------------------------------
// Snapshot interface
// ---------------------------------------------------------------------------

/// Read-only view of the host world, queried once per agent per pass.
///
/// Every method returns a snapshot; the engine never holds on to host state.
pub trait HostWorld {
    /// Agents that take part in weapon decisions.
    fn agents(&self) -> Vec<AgentId>;

    /// Snapshot of `agent`, or `None` if it no longer exists.
    fn agent_profile(&self, agent: AgentId) -> Option<AgentProfile>;

    /// The item `agent` currently wields.
    fn equipped_item(&self, agent: AgentId) -> Option<ItemProfile>;

    /// Items `agent` can reach, nearest first.
    fn reachable_items(&self, agent: AgentId) -> Vec<ItemProfile>;

    /// What `agent` is doing.
    fn activity(&self, _agent: AgentId) -> Activity {
        Activity::Idle
    }

    /// Whether hostiles are attacking `agent`'s map.
    fn raid_active(&self, _agent: AgentId) -> bool {
        false
    }
}

// ---------------------------------------------------------------------------
// Handle mapping
// ---------------------------------------------------------------------------

/// Bidirectional map between host handles and session-local ids.
///
/// Ids are allocated sequentially and never reused within a registry, so a
/// released handle cannot alias a live one.
#[derive(Debug, Clone)]
pub struct HandleRegistry<A, I> {
    agent_to_id: HashMap<A, AgentId>,
    id_to_agent: HashMap<AgentId, A>,
    item_to_id: HashMap<I, ItemId>,
    id_to_item: HashMap<ItemId, I>,
    next_agent: u64,
    next_item: u64,
}

impl<A, I> Default for HandleRegistry<A, I> {
    fn default() -> Self {
        Self {
            agent_to_id: HashMap::new(),
            id_to_agent: HashMap::new(),
            item_to_id: HashMap::new(),
            id_to_item: HashMap::new(),
            next_agent: 0,
            next_item: 0,
        }
    }
}

impl<A, I> HandleRegistry<A, I>
where
    A: Clone + Eq + Hash,
    I: Clone + Eq + Hash,
{
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or allocate the `AgentId` for a host agent handle.
    pub fn agent_id(&mut self, handle: &A) -> AgentId {
        if let Some(id) = self.agent_to_id.get(handle) {
            return *id;
        }
        let id = AgentId(self.next_agent);
        self.next_agent += 1;
        self.agent_to_id.insert(handle.clone(), id);
        self.id_to_agent.insert(id, handle.clone());
        id
    }

    /// Get or allocate the `ItemId` for a host item handle.
    pub fn item_id(&mut self, handle: &I) -> ItemId {
        if let Some(id) = self.item_to_id.get(handle) {
            return *id;
        }
        let id = ItemId(self.next_item);
        self.next_item += 1;
        self.item_to_id.insert(handle.clone(), id);
        self.id_to_item.insert(id, handle.clone());
        id
    }

    /// Host handle of `agent`.
    #[must_use]
    pub fn lookup_agent(&self, agent: AgentId) -> Option<&A> {
        self.id_to_agent.get(&agent)
    }

    /// Host handle of `item`.
    #[must_use]
    pub fn lookup_item(&self, item: ItemId) -> Option<&I> {
        self.id_to_item.get(&item)
    }

    /// Forget an agent handle, returning the id it had.
    pub fn release_agent(&mut self, handle: &A) -> Option<AgentId> {
        let id = self.agent_to_id.remove(handle)?;
        self.id_to_agent.remove(&id);
        Some(id)
    }

    /// Forget an item handle, returning the id it had.
    pub fn release_item(&mut self, handle: &I) -> Option<ItemId> {
        let id = self.item_to_id.remove(handle)?;
        self.id_to_item.remove(&id);
        Some(id)
    }

    /// Registered agents and items.
    #[must_use]
    pub fn count(&self) -> usize {
        self.agent_to_id.len() + self.item_to_id.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_handle_same_id() {
        let mut reg: HandleRegistry<String, (u32, u32)> = HandleRegistry::new();
        let a = reg.agent_id(&"Pawn_Colonist_17".to_string());
        let b = reg.agent_id(&"Pawn_Colonist_17".to_string());
        assert_eq!(a, b);
        let c = reg.agent_id(&"Pawn_Colonist_18".to_string());
        assert_ne!(a, c);
        assert_eq!(reg.lookup_agent(a).map(String::as_str), Some("Pawn_Colonist_17"));
    }

    #[test]
    fn released_ids_are_not_reused() {
        let mut reg: HandleRegistry<u32, (u32, u32)> = HandleRegistry::new();
        let first = reg.item_id(&(4, 1));
        assert_eq!(reg.release_item(&(4, 1)), Some(first));
        assert!(reg.lookup_item(first).is_none());
        let second = reg.item_id(&(4, 2));
        assert_ne!(first, second);
        assert_eq!(reg.count(), 1);
    }
}
