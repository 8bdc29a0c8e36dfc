#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Moonlight Survival engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Moonlight Survival.";

/// Unique identifier assigned to a mob.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MobId(u32);

impl MobId {
    /// Creates a new mob identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a live attack instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AttackId(u32);

impl AttackId {
    /// Creates a new attack instance identifier with the provided value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an experience pickup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PickupId(u32);

impl PickupId {
    /// Creates a new pickup identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a registered spawn rule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpawnRuleId(u32);

impl SpawnRuleId {
    /// Creates a new spawn rule identifier with the provided value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of an entity expressed in world units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    x: f32,
    y: f32,
}

impl Position {
    /// Position at the world origin.
    pub const ORIGIN: Position = Position::new(0.0, 0.0);

    /// Creates a new position from world-unit coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal world coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical world coordinate.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }
}

/// Instantaneous velocity of an entity expressed in world units per second.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Velocity {
    dx: f32,
    dy: f32,
}

impl Velocity {
    /// Velocity of a stationary entity.
    pub const ZERO: Velocity = Velocity::new(0.0, 0.0);

    /// Creates a new velocity from per-axis components.
    #[must_use]
    pub const fn new(dx: f32, dy: f32) -> Self {
        Self { dx, dy }
    }

    /// Horizontal component in world units per second.
    #[must_use]
    pub const fn dx(&self) -> f32 {
        self.dx
    }

    /// Vertical component in world units per second.
    #[must_use]
    pub const fn dy(&self) -> f32 {
        self.dy
    }
}

/// Hit points carried by a damageable entity.
///
/// Health only ever decreases outside of entity construction; damage
/// saturates at zero rather than wrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Health(u32);

impl Health {
    /// Creates a health value with the provided number of hit points.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the remaining hit points.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the health remaining after absorbing `amount` damage.
    #[must_use]
    pub const fn damaged(self, amount: u32) -> Self {
        Self(self.0.saturating_sub(amount))
    }

    /// Reports whether no hit points remain.
    #[must_use]
    pub const fn is_depleted(&self) -> bool {
        self.0 == 0
    }
}

/// Collision footprint reported to the physics collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    width: f32,
    height: f32,
}

impl Footprint {
    /// Creates a footprint with the provided dimensions in world units.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Width of the footprint in world units.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.width
    }

    /// Height of the footprint in world units.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.height
    }
}

/// Mob archetypes available to spawn rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MobArchetype {
    /// Slow ground crawler fielded at the start of a session.
    Mole,
    /// Flying pest introduced by the early escalation steps.
    Bat,
    /// Faster pack hunter from the mid campaign.
    Wolf,
    /// Durable bruiser from the late campaign.
    Ogre,
    /// The campaign boss; defeating it wins the session.
    Lion,
}

impl MobArchetype {
    /// Base pursuit speed of the archetype in world units per second.
    #[must_use]
    pub const fn base_speed(self) -> f32 {
        match self {
            Self::Mole | Self::Bat | Self::Wolf | Self::Ogre => 50.0,
            Self::Lion => 60.0,
        }
    }

    /// Collision footprint registered with the physics collaborator.
    #[must_use]
    pub const fn footprint(self) -> Footprint {
        match self {
            Self::Mole => Footprint::new(24.0, 14.0),
            Self::Bat | Self::Wolf | Self::Ogre => Footprint::new(24.0, 32.0),
            Self::Lion => Footprint::new(40.0, 64.0),
        }
    }

    /// Reports whether the archetype follows the boss death sequence.
    #[must_use]
    pub const fn is_boss(self) -> bool {
        matches!(self, Self::Lion)
    }
}

/// Attack archetypes available to attack rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Short melee swipe emitted in front of the player.
    Slash,
    /// Projectile fired toward the closest mob.
    Bolt,
    /// Persistent damaging aura that follows the player.
    Field,
}

impl AttackKind {
    /// Damage-application category of the attack kind.
    #[must_use]
    pub const fn category(self) -> AttackCategory {
        match self {
            Self::Bolt => AttackCategory::Dynamic,
            Self::Slash | Self::Field => AttackCategory::Static,
        }
    }
}

/// Distinguishes single-impact attacks from continuous-contact attacks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackCategory {
    /// Consumed on the first overlap it damages; hits each mob at most once.
    Dynamic,
    /// Persists across frames; re-hits are gated by the per-mob grace window.
    Static,
}

/// Backgrounds the escalation policy can swap in for the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    /// Opening grassland backdrop.
    Meadow,
    /// Ruined-keep backdrop introduced mid campaign.
    Ruins,
    /// The boss's den, swapped in when the boss appears.
    Den,
}

/// Mode tag attached to a pause request for the session collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PauseKind {
    /// Player-initiated menu pause.
    Menu,
    /// Automatic pause while the level-up choice is presented.
    LevelUp,
}

/// Terminal result of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// The boss was defeated and the win sequence completed.
    Won,
    /// The player's health was exhausted.
    Lost,
}

/// Aggregated statistics handed to the end screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Total mobs killed during the session, boss included.
    pub kills: u32,
    /// Level reached by the player.
    pub level: u32,
    /// Unpaused play time accumulated by the session.
    pub elapsed: Duration,
}

/// Controls what happens to surplus experience when a threshold is crossed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OvershootPolicy {
    /// Surplus experience counts toward the next threshold.
    #[default]
    CarryOver,
    /// Surplus experience is discarded at each level-up.
    Discard,
}

/// Reasons a spawn or attack rule fails validation.
///
/// Rules are validated once, when they are registered, so malformed
/// configuration surfaces at authoring time rather than per hit.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum RuleError {
    /// Drop probability must lie within `[0.0, 1.0]`.
    #[error("drop rate {value} is outside [0.0, 1.0]")]
    DropRateOutOfRange {
        /// The rejected drop probability.
        value: f32,
    },
    /// Emission intervals must be strictly positive.
    #[error("emission interval must be positive")]
    ZeroInterval,
    /// Instance lifetimes must be strictly positive when present.
    #[error("attack lifetime must be positive")]
    ZeroLifetime,
    /// Visual/collision scale factors must be positive and finite.
    #[error("scale {value} must be positive and finite")]
    InvalidScale {
        /// The rejected scale factor.
        value: f32,
    },
}

/// Recipe for one recurring mob emission.
///
/// Exactly one spawn rule per archetype is expected to be active at a time;
/// the escalation policy retires the oldest rule before installing the next.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnRuleSpec {
    /// Archetype of the mobs the rule emits.
    pub archetype: MobArchetype,
    /// Health assigned to each emitted mob.
    pub health: Health,
    /// Probability in `[0.0, 1.0]` that a killed mob drops a pickup.
    pub drop_rate: f32,
    /// Delay between consecutive emissions.
    pub interval: Duration,
}

impl SpawnRuleSpec {
    /// Validates the rule's configuration values.
    pub fn validate(&self) -> Result<(), RuleError> {
        if !self.drop_rate.is_finite() || !(0.0..=1.0).contains(&self.drop_rate) {
            return Err(RuleError::DropRateOutOfRange {
                value: self.drop_rate,
            });
        }
        if self.interval.is_zero() {
            return Err(RuleError::ZeroInterval);
        }
        Ok(())
    }
}

/// Recipe for one attack rule.
///
/// Damage and scale are mutable after registration; the escalation policy
/// rewrites them in place without disturbing live instances or any per-mob
/// cooldown state.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttackRuleSpec {
    /// Attack archetype the rule governs.
    pub kind: AttackKind,
    /// Damage applied per landed hit.
    pub damage: u32,
    /// Visual/collision scale factor applied to instances.
    pub scale: f32,
    /// Delay between instance emissions; `None` creates one persistent
    /// instance at registration instead of a recurring emission.
    pub emission_interval: Option<Duration>,
    /// Lifetime of each emitted instance; `None` keeps instances alive until
    /// consumed or their rule is removed.
    pub lifetime: Option<Duration>,
}

impl AttackRuleSpec {
    /// Validates the rule's configuration values.
    pub fn validate(&self) -> Result<(), RuleError> {
        if self.scale <= 0.0 || !self.scale.is_finite() {
            return Err(RuleError::InvalidScale { value: self.scale });
        }
        if let Some(interval) = self.emission_interval {
            if interval.is_zero() {
                return Err(RuleError::ZeroInterval);
            }
        }
        if let Some(lifetime) = self.lifetime {
            if lifetime.is_zero() {
                return Err(RuleError::ZeroLifetime);
            }
        }
        Ok(())
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Updates the player's position as reported by the input collaborator.
    SetPlayerPosition {
        /// New player position in world units.
        position: Position,
    },
    /// Requests that the session pause with the provided mode tag.
    Pause {
        /// Reason for the pause, forwarded to the session collaborator.
        kind: PauseKind,
    },
    /// Requests that a paused session resume.
    Resume,
    /// Creates a single mob immediately at an explicit position.
    SpawnMob {
        /// Archetype of the mob to create.
        archetype: MobArchetype,
        /// Health assigned to the mob.
        health: Health,
        /// Drop probability carried by the mob.
        drop_rate: f32,
        /// Position the mob spawns at.
        position: Position,
    },
    /// Creates the boss mob once, near the player, without a recurring rule.
    SummonBoss {
        /// Archetype of the boss to create.
        archetype: MobArchetype,
        /// Health assigned to the boss.
        health: Health,
    },
    /// Registers a recurring spawn rule.
    ActivateSpawnRule {
        /// The rule to register.
        rule: SpawnRuleSpec,
    },
    /// Cancels and removes the earliest-registered active spawn rule.
    DeactivateOldestSpawnRule,
    /// Registers an attack rule, replacing any existing rule of its kind.
    AddAttackRule {
        /// The rule to register.
        rule: AttackRuleSpec,
    },
    /// Deregisters an attack rule and removes its live instances.
    RemoveAttackRule {
        /// Kind of the rule to remove.
        kind: AttackKind,
    },
    /// Rewrites the scale of an active attack rule in place.
    SetAttackScale {
        /// Kind of the rule to mutate.
        kind: AttackKind,
        /// New scale factor.
        scale: f32,
    },
    /// Rewrites the damage of an active attack rule in place.
    SetAttackDamage {
        /// Kind of the rule to mutate.
        kind: AttackKind,
        /// New per-hit damage.
        damage: u32,
    },
    /// Swaps the environment backdrop consumed by the renderer.
    SetEnvironment {
        /// Environment to activate.
        environment: Environment,
    },
    /// Reports a dynamic attack instance overlapping a mob.
    HitMobDynamic {
        /// The attack instance that struck.
        attack: AttackId,
        /// The mob that was struck.
        mob: MobId,
    },
    /// Reports a static attack kind overlapping a mob this frame.
    HitMobStatic {
        /// Kind of the static attack in contact.
        kind: AttackKind,
        /// The mob in contact.
        mob: MobId,
    },
    /// Reports a mob overlapping the player this frame.
    HitPlayer {
        /// Contact damage to apply, subject to the player's grace window.
        amount: u32,
    },
    /// Reports the player overlapping an experience pickup.
    CollectPickup {
        /// The pickup that was touched.
        pickup: PickupId,
    },
    /// Grants experience directly to the progression track.
    GainExperience {
        /// Experience points to add.
        amount: u32,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that the session paused.
    SessionPaused {
        /// Mode tag supplied with the pause request.
        kind: PauseKind,
    },
    /// Announces that the session resumed.
    SessionResumed,
    /// Confirms that a mob was created.
    MobSpawned {
        /// Identifier assigned to the mob.
        mob: MobId,
        /// Archetype of the mob.
        archetype: MobArchetype,
        /// Position the mob spawned at.
        position: Position,
    },
    /// Confirms that damage landed on a mob.
    MobDamaged {
        /// The mob that was damaged.
        mob: MobId,
        /// Hit points remaining after the hit.
        remaining: Health,
    },
    /// Confirms that a mob completed its death transition.
    MobKilled {
        /// The mob that died.
        mob: MobId,
        /// Archetype of the mob.
        archetype: MobArchetype,
        /// Session kill counter after this death.
        kills: u32,
    },
    /// Announces that the boss died and the win sequence started.
    BossDefeated {
        /// Identifier of the boss mob.
        mob: MobId,
    },
    /// Confirms that a killed mob dropped an experience pickup.
    PickupDropped {
        /// Identifier assigned to the pickup.
        pickup: PickupId,
        /// Position of the pickup.
        position: Position,
        /// Experience granted when collected.
        exp: u32,
    },
    /// Confirms that the player collected a pickup.
    PickupCollected {
        /// The pickup that was collected.
        pickup: PickupId,
        /// Experience granted by the pickup.
        exp: u32,
    },
    /// Confirms that contact damage landed on the player.
    PlayerDamaged {
        /// Hit points remaining after the hit.
        remaining: Health,
    },
    /// Reports progress toward the next level for the UI progress bar.
    ExperienceGained {
        /// Experience accumulated toward the next threshold.
        current: u32,
        /// Threshold required for the next level.
        threshold: u32,
    },
    /// Asks the session collaborator to pause before the level-up applies.
    PauseRequested {
        /// Mode tag to attach to the pause.
        kind: PauseKind,
    },
    /// Announces that the player crossed an experience threshold.
    LeveledUp {
        /// Level reached.
        level: u32,
    },
    /// Confirms that a spawn rule was registered.
    SpawnRuleActivated {
        /// Identifier assigned to the rule.
        rule: SpawnRuleId,
        /// Archetype the rule emits.
        archetype: MobArchetype,
    },
    /// Confirms that the earliest-registered spawn rule was retired.
    SpawnRuleRetired {
        /// Identifier of the retired rule.
        rule: SpawnRuleId,
    },
    /// Reports that a spawn rule or direct spawn failed validation.
    SpawnRuleRejected {
        /// Archetype of the rejected rule.
        archetype: MobArchetype,
        /// Specific validation failure.
        reason: RuleError,
    },
    /// Confirms that an attack rule was registered.
    AttackRuleAdded {
        /// Kind of the registered rule.
        kind: AttackKind,
    },
    /// Confirms that an attack rule was removed along with its instances.
    AttackRuleRemoved {
        /// Kind of the removed rule.
        kind: AttackKind,
    },
    /// Confirms that an attack rule's scale was rewritten in place.
    AttackRuleRescaled {
        /// Kind of the mutated rule.
        kind: AttackKind,
        /// New scale factor.
        scale: f32,
    },
    /// Confirms that an attack rule's damage was rewritten in place.
    AttackRuleRedamaged {
        /// Kind of the mutated rule.
        kind: AttackKind,
        /// New per-hit damage.
        damage: u32,
    },
    /// Reports that an attack rule failed validation.
    AttackRuleRejected {
        /// Kind of the rejected rule.
        kind: AttackKind,
        /// Specific validation failure.
        reason: RuleError,
    },
    /// Confirms that an attack instance was emitted.
    AttackEmitted {
        /// Identifier assigned to the instance.
        attack: AttackId,
        /// Kind of the instance.
        kind: AttackKind,
    },
    /// Confirms that an attack instance reached its lifetime and expired.
    AttackExpired {
        /// Identifier of the expired instance.
        attack: AttackId,
    },
    /// Confirms that a dynamic attack instance was consumed by a hit.
    AttackConsumed {
        /// Identifier of the consumed instance.
        attack: AttackId,
    },
    /// Announces that the environment backdrop changed.
    EnvironmentChanged {
        /// Environment that became active.
        environment: Environment,
    },
    /// Announces that the session reached a terminal state.
    SessionEnded {
        /// Whether the session was won or lost.
        outcome: SessionOutcome,
        /// Aggregated statistics for the end screen.
        summary: SessionSummary,
    },
}
