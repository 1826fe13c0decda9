//! Core type definitions for the Arsenal engine.
//!
//! Profiles are closed snapshots produced once at the host boundary. The
//! engine never inspects host types and never mutates a profile.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{DefaultHasher, Hash, Hasher};

// ---------------------------------------------------------------------------
// Identity Types
// ---------------------------------------------------------------------------

/// Session-unique identifier of an agent (the host's entity id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

/// Session-unique identifier of an item instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(pub u64);

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent#{}", self.0)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item#{}", self.0)
    }
}

/// The weapon type an item instance belongs to (e.g. `"Gun_AssaultRifle"`).
///
/// Defs are the durable unit of forcing: item instances may not survive a
/// save/load cycle with the same id, their def always does.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemDef(pub String);

impl ItemDef {
    /// Create a def from its name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The def name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Game time, measured in host ticks.
pub type Tick = u64;

// ---------------------------------------------------------------------------
// Fingerprints
// ---------------------------------------------------------------------------

/// A content hash used to prove a cached value is still valid.
///
/// Two snapshots with equal fingerprints are treated as identical for
/// scoring purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub u64);

impl Fingerprint {
    /// Start building a fingerprint.
    #[must_use]
    pub fn builder() -> FingerprintBuilder {
        FingerprintBuilder(DefaultHasher::new())
    }
}

/// Incremental fingerprint builder. Floats are hashed by bit pattern.
pub struct FingerprintBuilder(DefaultHasher);

impl FingerprintBuilder {
    /// Feed any hashable value.
    #[must_use]
    pub fn with<T: Hash + ?Sized>(mut self, value: &T) -> Self {
        value.hash(&mut self.0);
        self
    }

    /// Feed a float by its bit pattern.
    #[must_use]
    pub fn with_f32(mut self, value: f32) -> Self {
        value.to_bits().hash(&mut self.0);
        self
    }

    /// Feed an optional float.
    #[must_use]
    pub fn with_opt_f32(self, value: Option<f32>) -> Self {
        match value {
            Some(v) => self.with(&1u8).with_f32(v),
            None => self.with(&0u8),
        }
    }

    /// Finish.
    #[must_use]
    pub fn finish(self) -> Fingerprint {
        Fingerprint(self.0.finish())
    }
}

// ---------------------------------------------------------------------------
// Item Profile
// ---------------------------------------------------------------------------

/// Ranged or melee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CombatClass {
    /// Fires projectiles.
    Ranged,
    /// Used in close combat.
    Melee,
}

impl CombatClass {
    /// The opposite class.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::Ranged => Self::Melee,
            Self::Melee => Self::Ranged,
        }
    }
}

impl fmt::Display for CombatClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ranged => write!(f, "ranged"),
            Self::Melee => write!(f, "melee"),
        }
    }
}

/// Quality tier, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum QualityTier {
    /// Worst.
    Awful,
    /// Below average.
    Poor,
    /// Baseline.
    #[default]
    Normal,
    /// Above average.
    Good,
    /// Well above average.
    Excellent,
    /// Near best.
    Masterwork,
    /// Best.
    Legendary,
}

impl QualityTier {
    /// All tiers in ascending order.
    pub const ALL: [Self; 7] = [
        Self::Awful,
        Self::Poor,
        Self::Normal,
        Self::Good,
        Self::Excellent,
        Self::Masterwork,
        Self::Legendary,
    ];

    /// Zero-based ordinal (Awful = 0, Legendary = 6).
    #[must_use]
    pub fn ordinal(self) -> usize {
        self as usize
    }
}

/// Situational weapon kinds. Their value depends on circumstance rather than
/// raw combat effectiveness, so their base score is capped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SituationalTags {
    /// Area damage (grenades, launchers).
    pub explosive: bool,
    /// Stuns or incapacitates without killing.
    pub non_lethal: bool,
    /// Never hits (smoke, EMP decoys).
    pub forced_miss: bool,
}

impl SituationalTags {
    /// Whether any tag is set.
    #[must_use]
    pub fn any(self) -> bool {
        self.explosive || self.non_lethal || self.forced_miss
    }
}

/// Immutable snapshot of a candidate weapon.
///
/// Numeric fields are optional: host items without damage data still produce
/// a (low) score instead of failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemProfile {
    /// Instance identity.
    pub id: ItemId,
    /// Weapon type.
    pub def: ItemDef,
    /// Ranged or melee.
    pub class: CombatClass,
    /// Damage per second.
    pub dps: Option<f32>,
    /// Effective range in tiles. Ignored for melee.
    pub range: Option<f32>,
    /// Shots per burst.
    pub burst: Option<u32>,
    /// Armor penetration fraction (0..1, may exceed 1).
    pub armor_penetration: Option<f32>,
    /// Quality tier.
    pub quality: QualityTier,
    /// Hit-point fraction (0..1). `None` means pristine.
    pub condition: Option<f32>,
    /// Mass in kilograms.
    pub mass: Option<f32>,
    /// Situational kinds.
    pub tags: SituationalTags,
    /// Agent this item is exclusively bonded to, if any.
    pub bonded_to: Option<AgentId>,
}

impl ItemProfile {
    /// A ranged weapon with the given DPS and range; everything else default.
    #[must_use]
    pub fn ranged(id: u64, def: &str, dps: f32, range: f32) -> Self {
        Self {
            id: ItemId(id),
            def: ItemDef::new(def),
            class: CombatClass::Ranged,
            dps: Some(dps),
            range: Some(range),
            burst: Some(1),
            armor_penetration: None,
            quality: QualityTier::Normal,
            condition: None,
            mass: None,
            tags: SituationalTags::default(),
            bonded_to: None,
        }
    }

    /// A melee weapon with the given DPS; everything else default.
    #[must_use]
    pub fn melee(id: u64, def: &str, dps: f32) -> Self {
        Self {
            id: ItemId(id),
            def: ItemDef::new(def),
            class: CombatClass::Melee,
            dps: Some(dps),
            range: None,
            burst: None,
            armor_penetration: None,
            quality: QualityTier::Normal,
            condition: None,
            mass: None,
            tags: SituationalTags::default(),
            bonded_to: None,
        }
    }

    /// Set the quality tier.
    #[must_use]
    pub fn with_quality(mut self, quality: QualityTier) -> Self {
        self.quality = quality;
        self
    }

    /// Set the condition fraction.
    #[must_use]
    pub fn with_condition(mut self, condition: f32) -> Self {
        self.condition = Some(condition);
        self
    }

    /// Set the burst count.
    #[must_use]
    pub fn with_burst(mut self, burst: u32) -> Self {
        self.burst = Some(burst);
        self
    }

    /// Set armor penetration.
    #[must_use]
    pub fn with_armor_penetration(mut self, ap: f32) -> Self {
        self.armor_penetration = Some(ap);
        self
    }

    /// Set mass.
    #[must_use]
    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    /// Set situational tags.
    #[must_use]
    pub fn with_tags(mut self, tags: SituationalTags) -> Self {
        self.tags = tags;
        self
    }

    /// Bond the item to an agent.
    #[must_use]
    pub fn bonded_to(mut self, agent: AgentId) -> Self {
        self.bonded_to = Some(agent);
        self
    }

    /// Whether the item is bonded to `agent`.
    #[must_use]
    pub fn is_bonded_to(&self, agent: AgentId) -> bool {
        self.bonded_to == Some(agent)
    }

    /// Content fingerprint over every field that influences the score.
    ///
    /// Bonding is excluded: it gates policy, not desirability.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::builder()
            .with(&self.id)
            .with(&self.def)
            .with(&self.class)
            .with_opt_f32(self.dps)
            .with_opt_f32(self.range)
            .with(&self.burst)
            .with_opt_f32(self.armor_penetration)
            .with(&self.quality)
            .with_opt_f32(self.condition)
            .with_opt_f32(self.mass)
            .with(&self.tags)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Agent Profile
// ---------------------------------------------------------------------------

/// Combat skill levels (host scale, typically 0–20).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Skills {
    /// Shooting skill.
    pub ranged: u8,
    /// Melee skill.
    pub melee: u8,
}

impl Skills {
    /// Create a skill pair.
    #[must_use]
    pub fn new(ranged: u8, melee: u8) -> Self {
        Self { ranged, melee }
    }

    /// Skill level for a combat class.
    #[must_use]
    pub fn for_class(self, class: CombatClass) -> u8 {
        match class {
            CombatClass::Ranged => self.ranged,
            CombatClass::Melee => self.melee,
        }
    }
}

impl Default for Skills {
    fn default() -> Self {
        Self { ranged: 5, melee: 5 }
    }
}

/// Trait and role flags relevant to weapon choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AgentTraits {
    /// Prefers melee; dislikes ranged weapons.
    pub brawler: bool,
    /// Assigned to hunting; wants long-range guns, not explosives.
    pub hunter: bool,
}

/// Something the agent carries besides (or including) the equipped item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CarriedItem {
    /// Instance identity.
    pub id: ItemId,
    /// Weapon type.
    pub def: ItemDef,
}

/// Snapshot of the deciding agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentProfile {
    /// Identity.
    pub id: AgentId,
    /// Combat skills.
    pub skills: Skills,
    /// Trait and role flags.
    pub traits: AgentTraits,
    /// Currently equipped item.
    pub equipped: Option<ItemId>,
    /// Carried weapons (equipped item included when the host lists it).
    pub carried: Vec<CarriedItem>,
    /// −1.0 (melee) .. +1.0 (ranged) bias.
    pub type_preference: f32,
    /// User-configured minimum improvement ratio for idle upgrades.
    pub upgrade_threshold: f32,
}

impl AgentProfile {
    /// Default threshold multiplier applied when the user has not set one.
    pub const DEFAULT_UPGRADE_THRESHOLD: f32 = 1.05;

    /// A neutral agent with the given skills.
    #[must_use]
    pub fn new(id: u64, skills: Skills) -> Self {
        Self {
            id: AgentId(id),
            skills,
            traits: AgentTraits::default(),
            equipped: None,
            carried: Vec::new(),
            type_preference: 0.0,
            upgrade_threshold: Self::DEFAULT_UPGRADE_THRESHOLD,
        }
    }

    /// Set trait flags.
    #[must_use]
    pub fn with_traits(mut self, traits: AgentTraits) -> Self {
        self.traits = traits;
        self
    }

    /// Set the type preference (clamped to −1..+1).
    #[must_use]
    pub fn with_preference(mut self, preference: f32) -> Self {
        self.type_preference = if preference.is_finite() {
            preference.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        self
    }

    /// Equip an item (also recorded as carried).
    #[must_use]
    pub fn equipping(mut self, item: &ItemProfile) -> Self {
        self.equipped = Some(item.id);
        if !self.carried.iter().any(|c| c.id == item.id) {
            self.carried.push(CarriedItem {
                id: item.id,
                def: item.def.clone(),
            });
        }
        self
    }

    /// Whether the agent carries an item of `def` other than `except`.
    #[must_use]
    pub fn carries_def_besides(&self, def: &ItemDef, except: Option<ItemId>) -> bool {
        self.carried
            .iter()
            .any(|c| &c.def == def && Some(c.id) != except)
    }

    /// Fingerprint over everything that influences contextual scoring.
    ///
    /// Equipment and the upgrade threshold only gate policy and are excluded.
    #[must_use]
    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::builder()
            .with(&self.id)
            .with(&self.skills)
            .with(&self.traits)
            .with_f32(self.type_preference)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Score
// ---------------------------------------------------------------------------

/// Totally ordered score used to rank candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(pub OrderedFloat<f32>);

impl Score {
    /// Wrap a raw score; non-finite values collapse to zero.
    #[must_use]
    pub fn new(score: f32) -> Self {
        Self(OrderedFloat(if score.is_finite() { score } else { 0.0 }))
    }

    /// The raw value.
    #[must_use]
    pub fn value(self) -> f32 {
        self.0.into_inner()
    }
}
