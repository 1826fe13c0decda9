//! One world's engine state.
//!
//! A [`Session`] owns the score cache, the tracker and the selector for a
//! single world. Identities are only unique within a session, so a host with
//! several independent worlds creates one session per world and never shares
//! them.

use std::fmt;
use std::sync::atomic::Ordering;

use serde::{Deserialize, Serialize};
use tracing::{Level, debug, info, span};
use uuid::Uuid;

use crate::cache::ScoreCache;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::metrics::{CounterSnapshot, spans};
use crate::registry::{DropReason, ForcedSnapshot, Tracker};
use crate::scoring::{BaseScore, Scorer, WeaponScorer};
use crate::selection::{Activity, Decision, DecisionContext, ExternalPolicy, UpgradeSelector};
use crate::types::{AgentId, AgentProfile, ItemDef, ItemId, ItemProfile, Tick};

/// Unique identifier for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Cache, tracker and selector for one world, plus the current tick.
#[derive(Debug)]
pub struct Session<S: Scorer = WeaponScorer> {
    id: SessionId,
    config: EngineConfig,
    cache: ScoreCache<S>,
    tracker: Tracker,
    selector: UpgradeSelector,
    now: Tick,
}

impl Session<WeaponScorer> {
    /// Create a session scoring through [`WeaponScorer`].
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let scorer = WeaponScorer::new(&config);
        Self::with_scorer(config, scorer)
    }

    /// Apply a new configuration.
    ///
    /// Cached scores are flushed only when a scoring or adjustment weight
    /// changed. Forced pins, cooldowns and claims are kept.
    ///
    /// # Errors
    /// Returns `ArsenalError::InvalidConfig` and leaves the session untouched
    /// if `config` does not validate.
    pub fn reconfigure(&mut self, config: EngineConfig) -> Result<()> {
        config.validate()?;
        if config.scoring_fingerprint() != self.config.scoring_fingerprint() {
            self.cache.replace_scorer(WeaponScorer::new(&config));
        }
        self.apply_policy(config);
        info!(session = %self.id, "session reconfigured");
        Ok(())
    }
}

impl<S: Scorer> Session<S> {
    /// Create a session around a custom scorer.
    #[must_use]
    pub fn with_scorer(config: EngineConfig, scorer: S) -> Self {
        let mut selector = UpgradeSelector::new(config.policy.clone());
        selector.set_enabled(config.general.enabled);
        let session = Self {
            id: SessionId::new(),
            cache: ScoreCache::new(scorer),
            tracker: Tracker::new(config.cooldown.clone()),
            selector,
            config,
            now: 0,
        };
        debug!(session = %session.id, "session created");
        session
    }

    /// Consult `external` for reservations, blacklists and slot limits.
    #[must_use]
    pub fn with_external(mut self, external: Box<dyn ExternalPolicy>) -> Self {
        self.selector = self.selector.with_external(external);
        self
    }

    /// Session identity.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The current tick.
    #[must_use]
    pub fn now(&self) -> Tick {
        self.now
    }

    /// Set the current tick.
    pub fn set_tick(&mut self, now: Tick) {
        self.now = now;
    }

    /// Move the clock forward.
    pub fn advance(&mut self, ticks: u64) {
        self.now = self.now.saturating_add(ticks);
    }

    /// The score cache.
    #[must_use]
    pub fn cache(&self) -> &ScoreCache<S> {
        &self.cache
    }

    /// The tracker.
    #[must_use]
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Mutable access to the tracker.
    pub fn tracker_mut(&mut self) -> &mut Tracker {
        &mut self.tracker
    }

    /// The selector.
    #[must_use]
    pub fn selector(&self) -> &UpgradeSelector {
        &self.selector
    }

    /// Counter snapshot.
    #[must_use]
    pub fn stats(&self) -> CounterSnapshot {
        self.cache.stats()
    }

    // -----------------------------------------------------------------------
    // Scoring
    // -----------------------------------------------------------------------

    /// Cached base score of `item`.
    pub fn get_base_score(&mut self, item: &ItemProfile) -> BaseScore {
        self.cache.get_base_score(item)
    }

    /// Cached final score of `item` for `agent`.
    pub fn get_score(&mut self, agent: &AgentProfile, item: &ItemProfile) -> f32 {
        self.cache.get_score(agent, item)
    }

    // -----------------------------------------------------------------------
    // Decisions
    // -----------------------------------------------------------------------

    /// Decision context at the current tick.
    #[must_use]
    pub fn context(&self, activity: Activity, raid_active: bool) -> DecisionContext {
        DecisionContext {
            now: self.now,
            activity,
            raid_active,
        }
    }

    /// Evaluate `candidates` for `agent` and report why.
    pub fn evaluate(
        &mut self,
        agent: &AgentProfile,
        current: Option<&ItemProfile>,
        candidates: &[ItemProfile],
        ctx: &DecisionContext,
    ) -> Decision {
        self.selector
            .evaluate(&mut self.cache, &mut self.tracker, agent, current, candidates, ctx)
    }

    /// The item `agent` should switch to, if any.
    ///
    /// Always evaluates with `raid_active = false`. While a raid is on, call
    /// [`Session::evaluate`] with `self.context(activity, true)` so raid
    /// suppression applies.
    pub fn select_upgrade(
        &mut self,
        agent: &AgentProfile,
        current: Option<&ItemProfile>,
        candidates: &[ItemProfile],
        activity: Activity,
    ) -> Option<ItemProfile> {
        let ctx = self.context(activity, false);
        self.evaluate(agent, current, candidates, &ctx).into_item()
    }

    /// Record that `agent` is moving to pick up `item`.
    pub fn begin_upgrade(&mut self, agent: AgentId, item: ItemId) {
        self.tracker.mark_pending(agent, item, self.now);
    }

    /// Record that `agent` equipped `equipped` in place of `replaced`.
    ///
    /// The replaced item goes on the long cooldown and the claim is released.
    /// An instance pin on the replaced item moves to the new one.
    pub fn complete_upgrade(&mut self, agent: AgentId, equipped: ItemId, replaced: Option<ItemId>) {
        if let Some(old) = replaced {
            self.tracker
                .mark_dropped_for(old, self.now, DropReason::UpgradeReplacement);
            if self.tracker.forced_item(agent) == Some(old) {
                self.tracker.set_forced(agent, equipped);
                debug!(agent = %agent, from = %old, to = %equipped, "instance pin moved");
            }
        }
        self.tracker.clear_pending(agent);
    }

    /// Record that `agent` abandoned its pending upgrade.
    pub fn abandon_upgrade(&mut self, agent: AgentId) {
        self.tracker.clear_pending(agent);
    }

    // -----------------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------------

    /// Pin `item` for `agent`.
    pub fn set_forced(&mut self, agent: AgentId, item: ItemId) {
        self.tracker.set_forced(agent, item);
    }

    /// Remove all of `agent`'s pins.
    pub fn clear_forced(&mut self, agent: AgentId) {
        self.tracker.clear_forced(agent);
    }

    /// Pin every item of `def` for `agent`.
    pub fn add_forced_category(&mut self, agent: AgentId, def: ItemDef) {
        self.tracker.add_forced_category(agent, def);
    }

    /// Whether `item` is pinned for `agent`.
    #[must_use]
    pub fn is_forced(&self, agent: AgentId, item: &ItemProfile) -> bool {
        self.tracker.is_forced(agent, item)
    }

    /// Put `item` on cooldown starting now.
    pub fn mark_dropped(&mut self, item: ItemId, reason: DropReason) {
        self.tracker.mark_dropped_for(item, self.now, reason);
    }

    /// Whether `item` is on cooldown now.
    #[must_use]
    pub fn is_on_cooldown(&self, item: ItemId) -> bool {
        self.tracker.is_on_cooldown(item, self.now)
    }

    /// Sweep expired cooldowns and claims. Returns the number removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let span = span!(Level::DEBUG, spans::CLEANUP, session = %self.id);
        let _enter = span.enter();
        let removed = self.tracker.cleanup_expired(self.now);
        self.cache
            .counters()
            .expired_entries
            .fetch_add(removed as u64, Ordering::Relaxed);
        removed
    }

    /// Serialize forced pins for the host's save file.
    ///
    /// # Errors
    /// Returns `ArsenalError::Serialization` if encoding fails.
    pub fn save_forced(&self) -> Result<String> {
        self.tracker.snapshot().to_json()
    }

    /// Restore forced pins from [`save_forced`](Self::save_forced) output.
    ///
    /// # Errors
    /// Returns `ArsenalError::Serialization` if `json` is malformed; the
    /// current pins are kept in that case.
    pub fn load_forced(&mut self, json: &str, keep_item_pins: bool) -> Result<()> {
        let snapshot = ForcedSnapshot::from_json(json)?;
        self.tracker.restore(snapshot, keep_item_pins);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Invalidation
    // -----------------------------------------------------------------------

    /// The item's quality, condition or stats changed.
    pub fn invalidate_item(&mut self, item: ItemId) -> usize {
        self.cache.invalidate_item(item)
    }

    /// The agent's skills, traits or preferences changed.
    pub fn invalidate_agent(&mut self, agent: AgentId) -> usize {
        self.cache.invalidate_agent(agent)
    }

    /// The item no longer exists.
    pub fn item_destroyed(&mut self, item: ItemId) {
        self.cache.invalidate_item(item);
        self.tracker.forget_item(item);
    }

    /// The agent left the world.
    pub fn agent_removed(&mut self, agent: AgentId) {
        self.cache.invalidate_agent(agent);
        self.tracker.forget_agent(agent);
    }

    /// The world is being unloaded. Forced pins survive.
    pub fn teardown(&mut self) {
        self.cache.invalidate_all();
        self.tracker.clear_transient();
        info!(session = %self.id, "session torn down");
    }

    fn apply_policy(&mut self, config: EngineConfig) {
        self.selector.set_policy(config.policy.clone());
        self.selector.set_enabled(config.general.enabled);
        self.tracker.set_config(config.cooldown.clone());
        self.config = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::KeepReason;
    use crate::types::{QualityTier, Skills};

    fn rifle(id: u64) -> ItemProfile {
        ItemProfile::ranged(id, "Gun_Rifle", 12.0, 30.0)
    }

    fn marksman() -> AgentProfile {
        AgentProfile::new(1, Skills::new(12, 4))
    }

    #[test]
    fn sessions_are_isolated() {
        let mut a = Session::new(EngineConfig::default());
        let b = Session::new(EngineConfig::default());
        assert_ne!(a.id(), b.id());
        a.get_score(&marksman(), &rifle(1));
        assert_eq!(a.cache().score_len(), 1);
        assert!(b.cache().is_empty());
    }

    #[test]
    fn upgrade_lifecycle_sets_cooldown_and_releases_claim() {
        let mut s = Session::new(EngineConfig::default());
        let agent = marksman();
        s.set_tick(1_000);
        s.begin_upgrade(agent.id, ItemId(2));
        assert!(s.tracker().is_pending_for_other(AgentId(9), ItemId(2)));

        s.complete_upgrade(agent.id, ItemId(2), Some(ItemId(1)));
        assert!(s.tracker().pending_for(agent.id).is_none());
        assert!(s.is_on_cooldown(ItemId(1)));
        s.advance(1_200);
        assert!(!s.is_on_cooldown(ItemId(1)));
    }

    #[test]
    fn raids_need_an_explicit_context() {
        let mut s = Session::new(EngineConfig::default());
        let pistol = ItemProfile::ranged(1, "Gun_Autopistol", 5.0, 15.0);
        let agent = marksman().equipping(&pistol);
        let candidates = [rifle(2)];

        let ctx = s.context(Activity::Idle, true);
        assert_eq!(
            s.evaluate(&agent, Some(&pistol), &candidates, &ctx),
            Decision::Keep(KeepReason::RaidSuppressed)
        );
        assert!(s.select_upgrade(&agent, Some(&pistol), &candidates, Activity::Idle).is_some());
    }

    #[test]
    fn cleanup_is_counted() {
        let mut s = Session::new(EngineConfig::default());
        s.mark_dropped(ItemId(1), DropReason::Generic);
        s.advance(300);
        assert_eq!(s.cleanup_expired(), 1);
        assert_eq!(s.stats().expired_entries, 1);
        assert_eq!(s.tracker().cooldown_count(), 0);
    }

    #[test]
    fn teardown_keeps_forced_pins() {
        let mut s = Session::new(EngineConfig::default());
        let agent = marksman();
        s.get_score(&agent, &rifle(1));
        s.set_forced(agent.id, ItemId(1));
        s.mark_dropped(ItemId(3), DropReason::Generic);
        s.teardown();
        assert!(s.cache().is_empty());
        assert_eq!(s.tracker().cooldown_count(), 0);
        assert!(s.is_forced(agent.id, &rifle(1)));
    }

    #[test]
    fn destroyed_item_is_forgotten() {
        let mut s = Session::new(EngineConfig::default());
        let agent = marksman();
        s.get_score(&agent, &rifle(1));
        s.set_forced(agent.id, ItemId(1));
        s.item_destroyed(ItemId(1));
        assert!(s.cache().is_empty());
        assert!(!s.is_forced(agent.id, &rifle(1)));
    }

    #[test]
    fn reconfigure_flushes_only_on_weight_change() {
        let mut s = Session::new(EngineConfig::default());
        let agent = marksman();
        s.get_score(&agent, &rifle(1));

        let mut config = EngineConfig::default();
        config.policy.critical_threshold = 1.5;
        s.reconfigure(config.clone()).expect("valid config");
        assert_eq!(s.cache().score_len(), 1);

        config.scoring.dps_weight = 6.0;
        s.reconfigure(config).expect("valid config");
        assert!(s.cache().is_empty());
    }

    #[test]
    fn invalid_reconfigure_is_rejected() {
        let mut s = Session::new(EngineConfig::default());
        let mut config = EngineConfig::default();
        config.scoring.power_creep_scale = 0.0;
        assert!(s.reconfigure(config).is_err());
        assert!(s.config().scoring.power_creep_scale > 0.0);
    }

    #[test]
    fn disabled_engine_keeps_everything() {
        let mut config = EngineConfig::default();
        config.general.enabled = false;
        let mut s = Session::new(config);
        let unarmed = marksman();
        assert!(s.select_upgrade(&unarmed, None, &[rifle(1)], Activity::Idle).is_none());
    }

    #[test]
    fn forced_pins_round_trip_through_save() {
        let mut s = Session::new(EngineConfig::default());
        s.set_forced(AgentId(4), ItemId(8));
        s.add_forced_category(AgentId(4), ItemDef::new("Gun_Revolver"));
        let saved = s.save_forced().expect("serialize");

        let mut loaded = Session::new(EngineConfig::default());
        loaded.load_forced(&saved, false).expect("deserialize");
        let revolver = ItemProfile::ranged(99, "Gun_Revolver", 8.0, 20.0);
        assert!(loaded.is_forced(AgentId(4), &revolver));
        assert!(loaded.tracker().forced_item(AgentId(4)).is_none());
        assert!(loaded.load_forced("not json", true).is_err());
    }

    #[test]
    fn quality_change_is_picked_up_after_invalidation() {
        let mut s = Session::new(EngineConfig::default());
        let agent = marksman();
        let before = s.get_score(&agent, &rifle(1));
        s.invalidate_item(ItemId(1));
        let after = s.get_score(&agent, &rifle(1).with_quality(QualityTier::Legendary));
        assert!(after > before);
    }
}
