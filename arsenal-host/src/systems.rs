//! Upgrade scheduling for the host tick loop.
//!
//! The engine has no clock and no loop of its own. [`UpgradeScheduler`]
//! decides which agents are due, asks the session, claims the chosen items
//! and sweeps the tracker.
//!
//! ## Cadence (per agent):
//!
//! | Agent state | Default interval | Notes                      |
//! |-------------|------------------|----------------------------|
//! | Unarmed     | every tick       | arming is never deferred   |
//! | Armed       | every 30 ticks   | upgrades are opportunistic |
//! | Sweep       | every 250 ticks  | expired cooldowns / claims |

use std::collections::HashMap;

use arsenal_core::metrics::spans;
use arsenal_core::scoring::Scorer;
use arsenal_core::session::Session;
use arsenal_core::types::{AgentId, ItemId, ItemProfile, Tick};
use tracing::{Level, debug, span};

use crate::adapter::HostWorld;
use crate::config::ScheduleConfig;

/// An instruction for the host: walk over and equip `item`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeOrder {
    /// The agent to move.
    pub agent: AgentId,
    /// The item to equip. Already claimed for `agent`.
    pub item: ItemProfile,
    /// What the agent holds now.
    pub replacing: Option<ItemId>,
}

/// Summary of one [`UpgradeScheduler::tick`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PassReport {
    /// Agents evaluated this tick.
    pub evaluated: usize,
    /// Agents skipped because they were not due.
    pub skipped: usize,
    /// Tracker entries swept.
    pub expired: usize,
    /// Upgrades to carry out.
    pub orders: Vec<UpgradeOrder>,
}

/// Per-agent cadence bookkeeping.
#[derive(Debug, Clone)]
pub struct UpgradeScheduler {
    config: ScheduleConfig,
    last_checked: HashMap<AgentId, Tick>,
    last_sweep: Option<Tick>,
}

impl UpgradeScheduler {
    /// Create a scheduler with the given cadence.
    #[must_use]
    pub fn new(config: ScheduleConfig) -> Self {
        Self {
            config,
            last_checked: HashMap::new(),
            last_sweep: None,
        }
    }

    /// Whether `agent` should be evaluated at `now`.
    #[must_use]
    pub fn is_due(&self, agent: AgentId, armed: bool, now: Tick) -> bool {
        let interval = if armed {
            self.config.idle_interval_ticks
        } else {
            self.config.unarmed_interval_ticks
        };
        self.last_checked
            .get(&agent)
            .is_none_or(|last| now.saturating_sub(*last) >= interval)
    }

    /// Forget an agent's cadence, e.g. when it leaves the world.
    pub fn forget(&mut self, agent: AgentId) {
        self.last_checked.remove(&agent);
    }

    /// Run one host tick: set the session clock, sweep if due, evaluate
    /// every due agent and claim the chosen items.
    pub fn tick<S: Scorer, W: HostWorld>(
        &mut self,
        session: &mut Session<S>,
        world: &W,
        now: Tick,
    ) -> PassReport {
        let span = span!(Level::DEBUG, spans::UPGRADE_PASS, now);
        let _enter = span.enter();

        session.set_tick(now);
        let mut report = PassReport::default();

        if self
            .last_sweep
            .is_none_or(|last| now.saturating_sub(last) >= self.config.cleanup_interval_ticks)
        {
            report.expired = session.cleanup_expired();
            self.last_sweep = Some(now);
        }

        for agent_id in world.agents() {
            let Some(agent) = world.agent_profile(agent_id) else {
                self.forget(agent_id);
                continue;
            };
            if session.tracker().pending_for(agent_id).is_some() {
                report.skipped += 1;
                continue;
            }
            let current = world.equipped_item(agent_id);
            if !self.is_due(agent_id, current.is_some(), now) {
                report.skipped += 1;
                continue;
            }
            self.last_checked.insert(agent_id, now);
            report.evaluated += 1;

            let candidates = world.reachable_items(agent_id);
            let ctx = session.context(world.activity(agent_id), world.raid_active(agent_id));
            let decision = session.evaluate(&agent, current.as_ref(), &candidates, &ctx);
            if let Some(item) = decision.into_item() {
                session.begin_upgrade(agent_id, item.id);
                report.orders.push(UpgradeOrder {
                    agent: agent_id,
                    replacing: current.as_ref().map(|c| c.id),
                    item,
                });
            }
        }

        debug!(
            evaluated = report.evaluated,
            skipped = report.skipped,
            orders = report.orders.len(),
            "upgrade pass complete"
        );
        report
    }
}

impl Default for UpgradeScheduler {
    fn default() -> Self {
        Self::new(ScheduleConfig::default())
    }
}
