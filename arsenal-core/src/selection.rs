//! Candidate selection and upgrade acceptance.
//!
//! ```text
//!  current forced / bonded? ── upgrades disallowed ──▶ Keep(ForcedLocked)
//!          │
//!  raid active & armed? ──────────────────────────────▶ Keep(RaidSuppressed)
//!          │
//!  filter: same def if forced, cooldown, blacklist, reserved,
//!          claimed by another agent, duplicate def
//!          │
//!  best = argmax score (earliest candidate wins exact ties)
//!          │
//!  unarmed or junk current ── best > 0 ──────────────▶ Switch(best)
//!          │
//!  best / current >= threshold(activity) ────────────▶ Switch(best)
//!          │
//!          └─────────────────────────────────────────▶ Keep(BelowThreshold)
//! ```
//!
//! The candidate slice is expected in the host's reachability order
//! (nearest first); that order is the deterministic tie-break.

use std::fmt;

use tracing::{Level, debug, span};

use crate::cache::ScoreCache;
use crate::config::PolicyConfig;
use crate::metrics::{EngineCounters, spans};
use crate::registry::Tracker;
use crate::scoring::Scorer;
use crate::types::{AgentProfile, ItemId, ItemProfile, Score, Tick};

/// What the agent is currently doing, as classified by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    /// Idle, or doing work no tier tracks. Uses the baseline threshold.
    #[default]
    Idle,
    /// Firefighting, tending critical patients, defending.
    Critical,
    /// Hauling, doctoring, rescuing.
    Support,
    /// Any other tracked work.
    Work,
}

/// Per-call inputs that are not part of the agent snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionContext {
    /// Current tick.
    pub now: Tick,
    /// The agent's current activity.
    pub activity: Activity,
    /// Whether hostiles are attacking the agent's map.
    pub raid_active: bool,
}

impl DecisionContext {
    /// Idle context at `now`.
    #[must_use]
    pub fn at(now: Tick) -> Self {
        Self {
            now,
            ..Self::default()
        }
    }

    /// Set the activity.
    #[must_use]
    pub fn doing(mut self, activity: Activity) -> Self {
        self.activity = activity;
        self
    }

    /// Mark a raid as active.
    #[must_use]
    pub fn during_raid(mut self) -> Self {
        self.raid_active = true;
        self
    }
}

/// Narrow capability interface onto optional external systems
/// (inventory mods, reservation systems, outfit policies).
///
/// Every method defaults to "no restriction".
pub trait ExternalPolicy: Send {
    /// The item is reserved by some external system.
    fn is_reserved(&self, _item: &ItemProfile) -> bool {
        false
    }

    /// The agent is not allowed to use this item.
    fn is_blacklisted(&self, _agent: &AgentProfile, _item: &ItemProfile) -> bool {
        false
    }

    /// Maximum number of weapons the agent may carry.
    fn slot_limit(&self, _agent: &AgentProfile) -> Option<usize> {
        None
    }
}

/// The absent-collaborator default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRestrictions;

impl ExternalPolicy for NoRestrictions {}

/// Why the selector kept the current item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum KeepReason {
    /// The engine is disabled.
    Disabled,
    /// The current item is forced (or bonded) and upgrades are disallowed.
    ForcedLocked,
    /// A raid is active and the agent is already armed.
    RaidSuppressed,
    /// The unarmed agent is at its external slot limit.
    SlotLimitReached,
    /// No candidate survived filtering.
    NoCandidates,
    /// The best candidate does not score above zero.
    NoPositiveCandidate,
    /// The best candidate is not enough of an improvement.
    BelowThreshold {
        /// Best surviving candidate.
        best: ItemId,
        /// `score(best) / score(current)`.
        ratio: f32,
        /// Ratio that was required.
        required: f32,
    },
}

/// Outcome of one selector evaluation.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Keep what the agent has.
    Keep(KeepReason),
    /// Switch to `item`.
    Switch {
        /// The chosen candidate.
        item: ItemProfile,
        /// Its score for this agent.
        score: f32,
        /// Score of the current item, if armed.
        current_score: Option<f32>,
        /// The ratio that had to be met (1.0 when the test was bypassed).
        required: f32,
    },
}

impl Decision {
    /// The chosen item, if any.
    #[must_use]
    pub fn into_item(self) -> Option<ItemProfile> {
        match self {
            Self::Switch { item, .. } => Some(item),
            Self::Keep(_) => None,
        }
    }

    /// Whether the decision is a switch.
    #[must_use]
    pub fn is_switch(&self) -> bool {
        matches!(self, Self::Switch { .. })
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Switch { item, score, .. } => write!(f, "switch to {} ({}, {score:.1})", item.id, item.def),
            Self::Keep(reason) => write!(f, "keep ({reason:?})"),
        }
    }
}

/// Applies the upgrade policy on top of a score cache and a tracker.
pub struct UpgradeSelector {
    policy: PolicyConfig,
    enabled: bool,
    external: Box<dyn ExternalPolicy>,
}

impl fmt::Debug for UpgradeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpgradeSelector")
            .field("policy", &self.policy)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl Default for UpgradeSelector {
    fn default() -> Self {
        Self::new(PolicyConfig::default())
    }
}

impl UpgradeSelector {
    /// Create a selector with no external restrictions.
    #[must_use]
    pub fn new(policy: PolicyConfig) -> Self {
        Self {
            policy,
            enabled: true,
            external: Box::new(NoRestrictions),
        }
    }

    /// Consult `external` for reservations, blacklists and slot limits.
    #[must_use]
    pub fn with_external(mut self, external: Box<dyn ExternalPolicy>) -> Self {
        self.external = external;
        self
    }

    /// Turn decision-making on or off.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Replace the policy.
    pub fn set_policy(&mut self, policy: PolicyConfig) {
        self.policy = policy;
    }

    /// The active policy.
    #[must_use]
    pub fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Ratio a candidate must reach over the current item.
    ///
    /// Tracked activities use their tier. Idle agents use the baseline,
    /// raised to the agent's own (clamped) setting when that is stricter.
    #[must_use]
    pub fn required_threshold(&self, activity: Activity, agent: &AgentProfile) -> f32 {
        match activity {
            Activity::Critical => self.policy.critical_threshold,
            Activity::Support => self.policy.support_threshold,
            Activity::Work => self.policy.work_threshold,
            Activity::Idle => {
                let user = if agent.upgrade_threshold.is_finite() {
                    agent
                        .upgrade_threshold
                        .clamp(self.policy.min_user_threshold, self.policy.max_user_threshold)
                } else {
                    self.policy.min_user_threshold
                };
                self.policy.baseline_threshold.max(user)
            }
        }
    }

    /// Whether `item` is locked to `agent` (forced, or bonded with bonds respected).
    #[must_use]
    pub fn is_locked(&self, tracker: &Tracker, agent: &AgentProfile, item: &ItemProfile) -> bool {
        tracker.is_forced(agent.id, item) || (self.policy.respect_bonds && item.is_bonded_to(agent.id))
    }

    /// Decide whether `agent` should switch from `current` to one of `candidates`.
    pub fn select_upgrade<S: Scorer>(
        &self,
        cache: &mut ScoreCache<S>,
        tracker: &mut Tracker,
        agent: &AgentProfile,
        current: Option<&ItemProfile>,
        candidates: &[ItemProfile],
        ctx: &DecisionContext,
    ) -> Option<ItemProfile> {
        self.evaluate(cache, tracker, agent, current, candidates, ctx)
            .into_item()
    }

    /// Like [`select_upgrade`](Self::select_upgrade), but reports why.
    pub fn evaluate<S: Scorer>(
        &self,
        cache: &mut ScoreCache<S>,
        tracker: &mut Tracker,
        agent: &AgentProfile,
        current: Option<&ItemProfile>,
        candidates: &[ItemProfile],
        ctx: &DecisionContext,
    ) -> Decision {
        let span = span!(Level::DEBUG, spans::SELECT_UPGRADE, agent = %agent.id);
        let _enter = span.enter();

        EngineCounters::bump(&cache.counters().decisions);
        let decision = self.decide(cache, tracker, agent, current, candidates, ctx);
        if decision.is_switch() {
            EngineCounters::bump(&cache.counters().upgrades_accepted);
        }
        debug!(candidates = candidates.len(), %decision, "upgrade evaluated");
        decision
    }

    fn decide<S: Scorer>(
        &self,
        cache: &mut ScoreCache<S>,
        tracker: &mut Tracker,
        agent: &AgentProfile,
        current: Option<&ItemProfile>,
        candidates: &[ItemProfile],
        ctx: &DecisionContext,
    ) -> Decision {
        if !self.enabled {
            return Decision::Keep(KeepReason::Disabled);
        }

        let locked = current.filter(|c| self.is_locked(tracker, agent, c));
        if let Some(held) = locked {
            if self.policy.respect_bonds
                && held.is_bonded_to(agent.id)
                && tracker.forced_item(agent.id).is_none()
            {
                tracker.set_forced(agent.id, held.id);
            }
            if !self.policy.allow_forced_upgrades {
                return Decision::Keep(KeepReason::ForcedLocked);
            }
        }

        if ctx.raid_active && self.policy.suppress_during_raid && current.is_some() {
            return Decision::Keep(KeepReason::RaidSuppressed);
        }

        if current.is_none() {
            if let Some(limit) = self.external.slot_limit(agent) {
                if agent.carried.len() >= limit {
                    return Decision::Keep(KeepReason::SlotLimitReached);
                }
            }
        }

        let current_id = current.map(|c| c.id);
        let mut best: Option<(&ItemProfile, Score)> = None;
        for candidate in candidates {
            if !self.is_eligible(tracker, agent, current_id, locked, candidate, ctx.now) {
                continue;
            }
            let score = Score::new(cache.get_score(agent, candidate));
            // Strictly greater: the earliest (nearest) candidate keeps exact ties.
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((candidate, score));
            }
        }

        let Some((best_item, best_score)) = best else {
            return Decision::Keep(KeepReason::NoCandidates);
        };
        let best_score = best_score.value();

        let current_score = current.map(|c| cache.get_score(agent, c));

        match current_score {
            Some(cs) if cs.is_finite() && cs > 0.0 => {
                let required = self.required_threshold(ctx.activity, agent);
                let ratio = best_score / cs;
                if ratio >= required {
                    Decision::Switch {
                        item: best_item.clone(),
                        score: best_score,
                        current_score: Some(cs),
                        required,
                    }
                } else {
                    Decision::Keep(KeepReason::BelowThreshold {
                        best: best_item.id,
                        ratio,
                        required,
                    })
                }
            }
            // Unarmed, or holding something unscoreable: any positive candidate wins.
            _ if best_score > 0.0 => Decision::Switch {
                item: best_item.clone(),
                score: best_score,
                current_score,
                required: 1.0,
            },
            _ => Decision::Keep(KeepReason::NoPositiveCandidate),
        }
    }

    fn is_eligible(
        &self,
        tracker: &Tracker,
        agent: &AgentProfile,
        current: Option<ItemId>,
        locked: Option<&ItemProfile>,
        candidate: &ItemProfile,
        now: Tick,
    ) -> bool {
        if Some(candidate.id) == current {
            return false;
        }
        if let Some(held) = locked {
            if candidate.def != held.def {
                return false;
            }
        }
        if tracker.is_on_cooldown(candidate.id, now) && !tracker.is_forced(agent.id, candidate) {
            return false;
        }
        if self.external.is_reserved(candidate) || self.external.is_blacklisted(agent, candidate) {
            return false;
        }
        if tracker.is_pending_for_other(agent.id, candidate.id) {
            return false;
        }
        if let Some(owner) = candidate.bonded_to {
            if owner != agent.id {
                return false;
            }
        }
        self.policy.allow_duplicates || !agent.carries_def_besides(&candidate.def, current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::DropReason;
    use crate::scoring::BaseScore;
    use crate::types::{Fingerprint, ItemDef, Skills};

    /// Scores are the item's DPS, so tests can dial exact values.
    struct DpsScorer;

    impl Scorer for DpsScorer {
        fn fingerprint(&self) -> Fingerprint {
            Fingerprint(1)
        }
        fn score_base(&self, item: &ItemProfile) -> BaseScore {
            BaseScore::from_total(item.dps.unwrap_or(0.0))
        }
        fn adjust_for_agent(&self, _: &AgentProfile, _: &ItemProfile, base: &BaseScore) -> f32 {
            base.total()
        }
    }

    struct Fixture {
        cache: ScoreCache<DpsScorer>,
        tracker: Tracker,
        selector: UpgradeSelector,
    }

    impl Fixture {
        fn new() -> Self {
            Self::with_policy(PolicyConfig::default())
        }

        fn with_policy(policy: PolicyConfig) -> Self {
            Self {
                cache: ScoreCache::new(DpsScorer),
                tracker: Tracker::default(),
                selector: UpgradeSelector::new(policy),
            }
        }

        fn decide(
            &mut self,
            agent: &AgentProfile,
            current: Option<&ItemProfile>,
            candidates: &[ItemProfile],
            ctx: DecisionContext,
        ) -> Decision {
            self.selector
                .evaluate(&mut self.cache, &mut self.tracker, agent, current, candidates, &ctx)
        }
    }

    fn gun(id: u64, def: &str, score: f32) -> ItemProfile {
        ItemProfile::ranged(id, def, score, 30.0)
    }

    fn armed(current: &ItemProfile) -> AgentProfile {
        AgentProfile::new(1, Skills::new(10, 10)).equipping(current)
    }

    #[test]
    fn empty_candidates_keep() {
        let mut fx = Fixture::new();
        let current = gun(1, "Gun_Rifle", 100.0);
        let d = fx.decide(&armed(&current), Some(&current), &[], DecisionContext::at(0));
        assert_eq!(d, Decision::Keep(KeepReason::NoCandidates));
    }

    #[test]
    fn critical_job_needs_twenty_percent() {
        let mut fx = Fixture::new();
        let current = gun(1, "Gun_Rifle", 100.0);
        let agent = armed(&current);
        let ctx = DecisionContext::at(0).doing(Activity::Critical);

        let d = fx.decide(&agent, Some(&current), &[gun(2, "Gun_Lmg", 115.0)], ctx);
        assert!(matches!(d, Decision::Keep(KeepReason::BelowThreshold { .. })));

        let d = fx.decide(&agent, Some(&current), &[gun(3, "Gun_Lmg", 121.0)], ctx);
        assert!(d.is_switch());
    }

    #[test]
    fn support_job_needs_fifteen_percent() {
        let mut fx = Fixture::new();
        let current = gun(1, "Gun_Rifle", 100.0);
        let agent = armed(&current);
        let ctx = DecisionContext::at(0).doing(Activity::Support);
        assert!(!fx.decide(&agent, Some(&current), &[gun(2, "Gun_Lmg", 112.0)], ctx).is_switch());
        assert!(fx.decide(&agent, Some(&current), &[gun(3, "Gun_Lmg", 116.0)], ctx).is_switch());
    }

    #[test]
    fn idle_uses_baseline() {
        let mut fx = Fixture::new();
        let current = gun(1, "Gun_Rifle", 100.0);
        let agent = armed(&current);
        let ctx = DecisionContext::at(0);
        assert!(!fx.decide(&agent, Some(&current), &[gun(2, "Gun_Lmg", 109.0)], ctx).is_switch());
        assert!(fx.decide(&agent, Some(&current), &[gun(3, "Gun_Lmg", 111.0)], ctx).is_switch());
    }

    #[test]
    fn strict_user_threshold_raises_idle_floor() {
        let fx = Fixture::new();
        let mut agent = AgentProfile::new(1, Skills::default());
        agent.upgrade_threshold = 1.25;
        assert!((fx.selector.required_threshold(Activity::Idle, &agent) - 1.25).abs() < 1e-6);
        agent.upgrade_threshold = 9.0;
        assert!((fx.selector.required_threshold(Activity::Idle, &agent) - 1.30).abs() < 1e-6);
        agent.upgrade_threshold = 1.0;
        assert!((fx.selector.required_threshold(Activity::Idle, &agent) - 1.10).abs() < 1e-6);
        // Tracked work ignores the user setting.
        agent.upgrade_threshold = 1.30;
        assert!((fx.selector.required_threshold(Activity::Work, &agent) - 1.10).abs() < 1e-6);
    }

    #[test]
    fn unarmed_bypasses_threshold() {
        let mut fx = Fixture::new();
        let agent = AgentProfile::new(1, Skills::default());
        let d = fx.decide(&agent, None, &[gun(2, "Gun_Pistol", 0.5)], DecisionContext::at(0));
        assert_eq!(d.into_item().map(|i| i.id), Some(ItemId(2)));
    }

    #[test]
    fn unarmed_rejects_non_positive() {
        let mut fx = Fixture::new();
        let agent = AgentProfile::new(1, Skills::default());
        let d = fx.decide(&agent, None, &[gun(2, "Gun_Junk", 0.0)], DecisionContext::at(0));
        assert_eq!(d, Decision::Keep(KeepReason::NoPositiveCandidate));
    }

    #[test]
    fn junk_current_is_replaced_by_any_positive() {
        let mut fx = Fixture::new();
        let current = gun(1, "Gun_Broken", 0.0);
        let agent = armed(&current);
        let d = fx.decide(&agent, Some(&current), &[gun(2, "Gun_Pistol", 1.0)], DecisionContext::at(0));
        assert!(d.is_switch());
    }

    #[test]
    fn forced_lock_is_absolute() {
        let mut fx = Fixture::new();
        let current = gun(1, "Gun_Revolver", 10.0);
        let agent = armed(&current);
        fx.tracker.set_forced(agent.id, current.id);
        let d = fx.decide(&agent, Some(&current), &[gun(2, "Gun_Rifle", 10_000.0)], DecisionContext::at(0));
        assert_eq!(d, Decision::Keep(KeepReason::ForcedLocked));
    }

    #[test]
    fn forced_upgrade_stays_within_def() {
        let mut fx = Fixture::with_policy(PolicyConfig {
            allow_forced_upgrades: true,
            ..PolicyConfig::default()
        });
        let current = gun(1, "Gun_Revolver", 10.0);
        let agent = armed(&current);
        fx.tracker.set_forced(agent.id, current.id);
        let candidates = [gun(2, "Gun_Rifle", 10_000.0), gun(3, "Gun_Revolver", 20.0)];
        let d = fx.decide(&agent, Some(&current), &candidates, DecisionContext::at(0));
        assert_eq!(d.into_item().map(|i| i.id), Some(ItemId(3)));
    }

    #[test]
    fn bonded_item_is_locked_and_registered() {
        let mut fx = Fixture::new();
        let agent_id = crate::types::AgentId(1);
        let current = gun(1, "Gun_Persona", 10.0).bonded_to(agent_id);
        let agent = armed(&current);
        let d = fx.decide(&agent, Some(&current), &[gun(2, "Gun_Rifle", 500.0)], DecisionContext::at(0));
        assert_eq!(d, Decision::Keep(KeepReason::ForcedLocked));
        assert_eq!(fx.tracker.forced_item(agent_id), Some(ItemId(1)));
    }

    #[test]
    fn bond_does_not_replace_an_existing_pin() {
        let mut fx = Fixture::new();
        let agent_id = crate::types::AgentId(1);
        let current = gun(1, "Gun_Persona", 10.0).bonded_to(agent_id);
        let agent = armed(&current);
        fx.tracker.set_forced(agent_id, ItemId(7));
        let d = fx.decide(&agent, Some(&current), &[gun(2, "Gun_Rifle", 500.0)], DecisionContext::at(0));
        assert_eq!(d, Decision::Keep(KeepReason::ForcedLocked));
        assert_eq!(fx.tracker.forced_item(agent_id), Some(ItemId(7)));
    }

    #[test]
    fn bonds_ignored_when_disabled() {
        let mut fx = Fixture::with_policy(PolicyConfig {
            respect_bonds: false,
            ..PolicyConfig::default()
        });
        let current = gun(1, "Gun_Persona", 10.0).bonded_to(crate::types::AgentId(1));
        let agent = armed(&current);
        let d = fx.decide(&agent, Some(&current), &[gun(2, "Gun_Rifle", 500.0)], DecisionContext::at(0));
        assert!(d.is_switch());
    }

    #[test]
    fn cooldown_suppresses_until_expiry() {
        let mut fx = Fixture::new();
        let agent = AgentProfile::new(1, Skills::default());
        let dropped = gun(5, "Gun_Rifle", 50.0);
        fx.tracker.mark_dropped(dropped.id, 100, 300, DropReason::Generic);

        let before = fx.decide(&agent, None, std::slice::from_ref(&dropped), DecisionContext::at(399));
        assert_eq!(before, Decision::Keep(KeepReason::NoCandidates));

        let after = fx.decide(&agent, None, std::slice::from_ref(&dropped), DecisionContext::at(400));
        assert!(after.is_switch());
    }

    #[test]
    fn forced_beats_cooldown() {
        let mut fx = Fixture::new();
        let agent = AgentProfile::new(1, Skills::default());
        let pinned = gun(5, "Gun_Rifle", 50.0);
        fx.tracker.mark_dropped(pinned.id, 0, 300, DropReason::Generic);
        fx.tracker.add_forced_category(agent.id, ItemDef::new("Gun_Rifle"));
        let d = fx.decide(&agent, None, &[pinned], DecisionContext::at(10));
        assert!(d.is_switch());
    }

    #[test]
    fn exact_ties_prefer_earlier_candidate() {
        let mut fx = Fixture::new();
        let agent = AgentProfile::new(1, Skills::default());
        let candidates = [gun(7, "Gun_A", 40.0), gun(8, "Gun_B", 40.0), gun(9, "Gun_C", 39.0)];
        let d = fx.decide(&agent, None, &candidates, DecisionContext::at(0));
        assert_eq!(d.into_item().map(|i| i.id), Some(ItemId(7)));
    }

    #[test]
    fn raid_keeps_armed_agents_but_arms_unarmed() {
        let mut fx = Fixture::new();
        let current = gun(1, "Gun_Rifle", 10.0);
        let ctx = DecisionContext::at(0).during_raid();
        let d = fx.decide(&armed(&current), Some(&current), &[gun(2, "Gun_Lmg", 100.0)], ctx);
        assert_eq!(d, Decision::Keep(KeepReason::RaidSuppressed));

        let unarmed = AgentProfile::new(2, Skills::default());
        assert!(fx.decide(&unarmed, None, &[gun(3, "Gun_Lmg", 100.0)], ctx).is_switch());
    }

    #[test]
    fn duplicates_are_skipped() {
        let mut fx = Fixture::new();
        let current = gun(1, "Gun_Rifle", 10.0);
        let sidearm = gun(2, "Gun_Pistol", 5.0);
        let agent = armed(&current).equipping(&sidearm).equipping(&current);
        let d = fx.decide(&agent, Some(&current), &[gun(3, "Gun_Pistol", 100.0)], DecisionContext::at(0));
        assert_eq!(d, Decision::Keep(KeepReason::NoCandidates));
    }

    #[test]
    fn claims_of_other_agents_are_respected() {
        let mut fx = Fixture::new();
        let agent = AgentProfile::new(1, Skills::default());
        fx.tracker.mark_pending(crate::types::AgentId(2), ItemId(4), 0);
        let d = fx.decide(&agent, None, &[gun(4, "Gun_Rifle", 30.0)], DecisionContext::at(0));
        assert_eq!(d, Decision::Keep(KeepReason::NoCandidates));
    }

    #[test]
    fn bonded_to_someone_else_is_skipped() {
        let mut fx = Fixture::new();
        let agent = AgentProfile::new(1, Skills::default());
        let theirs = gun(4, "Gun_Persona", 300.0).bonded_to(crate::types::AgentId(2));
        let d = fx.decide(&agent, None, &[theirs], DecisionContext::at(0));
        assert_eq!(d, Decision::Keep(KeepReason::NoCandidates));
    }

    struct Strict;

    impl ExternalPolicy for Strict {
        fn is_reserved(&self, item: &ItemProfile) -> bool {
            item.id == ItemId(10)
        }
        fn slot_limit(&self, _agent: &AgentProfile) -> Option<usize> {
            Some(1)
        }
    }

    #[test]
    fn external_policy_is_consulted() {
        let mut fx = Fixture::new();
        fx.selector = UpgradeSelector::new(PolicyConfig::default()).with_external(Box::new(Strict));

        let agent = AgentProfile::new(1, Skills::default());
        let candidates = [gun(10, "Gun_Reserved", 90.0), gun(11, "Gun_Free", 20.0)];
        let d = fx.decide(&agent, None, &candidates, DecisionContext::at(0));
        assert_eq!(d.into_item().map(|i| i.id), Some(ItemId(11)));

        let mut full = AgentProfile::new(2, Skills::default());
        full.carried.push(crate::types::CarriedItem {
            id: ItemId(50),
            def: ItemDef::new("Weapon_Grenade"),
        });
        let d = fx.decide(&full, None, &candidates, DecisionContext::at(0));
        assert_eq!(d, Decision::Keep(KeepReason::SlotLimitReached));
    }

    #[test]
    fn disabled_selector_never_switches() {
        let mut fx = Fixture::new();
        fx.selector.set_enabled(false);
        let agent = AgentProfile::new(1, Skills::default());
        let d = fx.decide(&agent, None, &[gun(2, "Gun_Rifle", 50.0)], DecisionContext::at(0));
        assert_eq!(d, Decision::Keep(KeepReason::Disabled));
    }

    #[test]
    fn decisions_are_counted() {
        let mut fx = Fixture::new();
        let agent = AgentProfile::new(1, Skills::default());
        fx.decide(&agent, None, &[gun(2, "Gun_Rifle", 50.0)], DecisionContext::at(0));
        fx.decide(&agent, None, &[], DecisionContext::at(1));
        let stats = fx.cache.stats();
        assert_eq!(stats.decisions, 2);
        assert_eq!(stats.upgrades_accepted, 1);
    }
}
