#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Moonlight Survival.
//!
//! The world owns every entity, the timer registry, the rule directories,
//! and the session phase. Adapters and systems mutate it exclusively through
//! [`apply`] and observe it through the [`query`] module. Collision
//! detection, rendering, and input live in excluded collaborators; they talk
//! to the world only in commands and events.

use std::time::Duration;

use glam::Vec2;
use moonlight_core::{
    Command, Environment, Event, Health, MobArchetype, MobId, PauseKind, PickupId, Position,
    RuleError, SessionOutcome, SessionSummary, WELCOME_BANNER,
};
use rand::Rng;
use rand_chacha::{rand_core::SeedableRng, ChaCha8Rng};

mod attacks;
mod combat;
mod progression;
mod spawning;
mod timers;

pub use progression::ProgressionConfig;

use attacks::AttackDirectory;
use progression::Progression;
use spawning::SpawnDirectory;
use timers::{Repeat, TimerAction, TimerOwner, TimerRegistry};

const DEFAULT_RNG_SEED: u64 = 0x6d6f_6f6e_6c31_7468;

const STEER_INTERVAL: Duration = Duration::from_millis(100);
pub(crate) const HIT_FLASH_DURATION: Duration = Duration::from_millis(1000);
pub(crate) const HIT_FLASH_ALPHA: f32 = 0.5;
pub(crate) const STATIC_GRACE_WINDOW: Duration = Duration::from_millis(800);
pub(crate) const PLAYER_GRACE_WINDOW: Duration = Duration::from_millis(1000);
const BOSS_FADE_INTERVAL: Duration = Duration::from_millis(30);
const BOSS_FADE_STEPS: u32 = 100;
const BOSS_FADE_DELTA: f32 = 0.01;
const WIN_TRANSITION_DELAY: Duration = Duration::from_millis(4000);
pub(crate) const SPAWN_RING_RADIUS: f32 = 420.0;

/// Construction parameters for a fresh session.
#[derive(Clone, Copy, Debug)]
pub struct SimulationConfig {
    /// Seed for the world's deterministic RNG (drop rolls, spawn angles).
    pub rng_seed: u64,
    /// Hit points the player starts with.
    pub player_health: Health,
    /// Experience granted by each dropped pickup.
    pub pickup_experience: u32,
    /// Experience/level tuning.
    pub progression: ProgressionConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            rng_seed: DEFAULT_RNG_SEED,
            player_health: Health::new(100),
            pickup_experience: 10,
            progression: ProgressionConfig::default(),
        }
    }
}

/// Session phase. `Ended` is terminal; the world ignores all further
/// commands once it is reached.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Phase {
    Playing,
    Paused(PauseKind),
    Ended {
        outcome: SessionOutcome,
        summary: SessionSummary,
    },
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct PlayerState {
    pub(crate) position: Vec2,
    pub(crate) health: Health,
    pub(crate) max_health: Health,
    pub(crate) guard: bool,
}

/// A mob, the boss included. The boss is distinguished only by its
/// archetype flag; after its defeat it stays in storage, not alive, while
/// the fade-out and win transition run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Mob {
    pub(crate) id: MobId,
    pub(crate) archetype: MobArchetype,
    pub(crate) position: Vec2,
    pub(crate) velocity: Vec2,
    pub(crate) speed: f32,
    pub(crate) health: Health,
    pub(crate) max_health: Health,
    pub(crate) drop_rate: f32,
    pub(crate) alive: bool,
    pub(crate) guard: bool,
    pub(crate) alpha: f32,
}

#[derive(Clone, Copy, Debug)]
struct Pickup {
    id: PickupId,
    position: Vec2,
    exp: u32,
}

/// Complete simulation state for one session.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    phase: Phase,
    environment: Environment,
    clock: Duration,
    tick_index: u64,
    player: PlayerState,
    mobs: Vec<Mob>,
    pickups: Vec<Pickup>,
    timers: TimerRegistry,
    attacks: AttackDirectory,
    spawns: SpawnDirectory,
    progression: Progression,
    kills: u32,
    next_mob: u32,
    next_pickup: u32,
    pickup_experience: u32,
    rng: ChaCha8Rng,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates a session with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(SimulationConfig::default())
    }

    /// Creates a session from an explicit configuration. Two sessions built
    /// from equal configurations and fed equal command streams produce equal
    /// event streams.
    #[must_use]
    pub fn with_config(config: SimulationConfig) -> Self {
        Self {
            banner: WELCOME_BANNER,
            phase: Phase::Playing,
            environment: Environment::Meadow,
            clock: Duration::ZERO,
            tick_index: 0,
            player: PlayerState {
                position: Vec2::ZERO,
                health: config.player_health,
                max_health: config.player_health,
                guard: true,
            },
            mobs: Vec::new(),
            pickups: Vec::new(),
            timers: TimerRegistry::new(),
            attacks: AttackDirectory::new(),
            spawns: SpawnDirectory::new(),
            progression: Progression::new(config.progression),
            kills: 0,
            next_mob: 0,
            next_pickup: 0,
            pickup_experience: config.pickup_experience,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
        }
    }

    pub(crate) fn mob_index(&self, mob: MobId) -> Option<usize> {
        self.mobs.iter().position(|entry| entry.id == mob)
    }

    pub(crate) fn summary(&self) -> SessionSummary {
        SessionSummary {
            kills: self.kills,
            level: self.progression.level(),
            elapsed: self.clock,
        }
    }

    /// Creates a mob and starts its steering loop.
    pub(crate) fn spawn_mob(
        &mut self,
        archetype: MobArchetype,
        health: Health,
        drop_rate: f32,
        position: Vec2,
        out: &mut Vec<Event>,
    ) -> MobId {
        let id = MobId::new(self.next_mob);
        self.next_mob += 1;
        self.mobs.push(Mob {
            id,
            archetype,
            position,
            velocity: Vec2::ZERO,
            speed: archetype.base_speed(),
            health,
            max_health: health,
            drop_rate,
            alive: true,
            guard: true,
            alpha: 1.0,
        });
        let _ = self.timers.schedule(
            STEER_INTERVAL,
            Repeat::Infinite,
            TimerOwner::Mob(id),
            TimerAction::SteerMob(id),
        );
        out.push(Event::MobSpawned {
            mob: id,
            archetype,
            position: position_of(position),
        });
        id
    }

    fn tick(&mut self, dt: Duration, out: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        self.clock += dt;
        out.push(Event::TimeAdvanced { dt });

        let mut fired = Vec::new();
        self.timers.advance(dt, &mut fired);
        for (handle, action) in fired {
            if matches!(self.phase, Phase::Ended { .. }) {
                break;
            }
            // An earlier action in this batch may have cancelled this one.
            if !self.timers.is_live(handle) {
                continue;
            }
            self.execute(action, out);
        }
        self.timers.sweep();

        if self.phase != Phase::Playing {
            return;
        }

        let dt_secs = dt.as_secs_f32();
        for mob in self.mobs.iter_mut().filter(|mob| mob.alive) {
            mob.position += mob.velocity * dt_secs;
        }

        // Deaths resolve once per tick, not per hit, so several hits landing
        // in one frame still trigger a single death transition.
        let dead: Vec<MobId> = self
            .mobs
            .iter()
            .filter(|mob| mob.alive && mob.health.is_depleted())
            .map(|mob| mob.id)
            .collect();
        for mob in dead {
            self.transition_death(mob, out);
        }
    }

    fn execute(&mut self, action: TimerAction, out: &mut Vec<Event>) {
        match action {
            TimerAction::SteerMob(mob) => {
                let target = self.player.position;
                if let Some(index) = self.mob_index(mob) {
                    let entry = &mut self.mobs[index];
                    if entry.alive {
                        let direction = (target - entry.position).normalize_or_zero();
                        entry.velocity = direction * entry.speed;
                    }
                }
            }
            TimerAction::ClearMobFlash(mob) => {
                if let Some(index) = self.mob_index(mob) {
                    if self.mobs[index].alive {
                        self.mobs[index].alpha = 1.0;
                    }
                }
            }
            TimerAction::RestoreMobGuard(mob) => {
                if let Some(index) = self.mob_index(mob) {
                    if self.mobs[index].alive {
                        self.mobs[index].guard = true;
                    }
                }
            }
            TimerAction::RestorePlayerGuard => {
                self.player.guard = true;
            }
            TimerAction::SpawnFromRule(rule) => {
                spawning::spawn_from_rule(self, rule, out);
            }
            TimerAction::EmitAttack(kind) => {
                attacks::emit(self, kind, out);
            }
            TimerAction::ExpireAttack(attack) => {
                attacks::expire(self, attack, out);
            }
            TimerAction::BossFadeStep(mob) => {
                if let Some(index) = self.mob_index(mob) {
                    let entry = &mut self.mobs[index];
                    entry.alpha = (entry.alpha - BOSS_FADE_DELTA).max(0.0);
                }
            }
            TimerAction::CompleteWin => {
                let summary = self.summary();
                self.phase = Phase::Ended {
                    outcome: SessionOutcome::Won,
                    summary,
                };
                out.push(Event::SessionEnded {
                    outcome: SessionOutcome::Won,
                    summary,
                });
            }
        }
    }

    /// Runs a mob's death transition exactly once.
    fn transition_death(&mut self, mob: MobId, out: &mut Vec<Event>) {
        let Some(index) = self.mob_index(mob) else {
            return;
        };
        if !self.mobs[index].alive {
            return;
        }

        let archetype = self.mobs[index].archetype;
        let position = self.mobs[index].position;
        let drop_rate = self.mobs[index].drop_rate;

        self.mobs[index].alive = false;
        self.mobs[index].velocity = Vec2::ZERO;
        self.timers.cancel_owner(TimerOwner::Mob(mob));
        self.kills = self.kills.saturating_add(1);

        let roll: f32 = self.rng.gen();
        if roll < drop_rate {
            let pickup = PickupId::new(self.next_pickup);
            self.next_pickup += 1;
            self.pickups.push(Pickup {
                id: pickup,
                position,
                exp: self.pickup_experience,
            });
            out.push(Event::PickupDropped {
                pickup,
                position: position_of(position),
                exp: self.pickup_experience,
            });
        }
        out.push(Event::MobKilled {
            mob,
            archetype,
            kills: self.kills,
        });

        if archetype.is_boss() {
            out.push(Event::BossDefeated { mob });
            attacks::remove_all(self, out);
            for other in self.mobs.iter_mut().filter(|other| other.alive) {
                other.speed = 0.0;
                other.velocity = Vec2::ZERO;
            }
            let _ = self.timers.schedule(
                BOSS_FADE_INTERVAL,
                Repeat::Finite(BOSS_FADE_STEPS),
                TimerOwner::Session,
                TimerAction::BossFadeStep(mob),
            );
            let _ = self.timers.schedule(
                WIN_TRANSITION_DELAY,
                Repeat::Once,
                TimerOwner::Session,
                TimerAction::CompleteWin,
            );
        } else {
            self.mobs.retain(|entry| entry.id != mob);
        }
    }

    fn collect_pickup(&mut self, pickup: PickupId, out: &mut Vec<Event>) {
        let Some(index) = self.pickups.iter().position(|entry| entry.id == pickup) else {
            return;
        };
        let collected = self.pickups.remove(index);
        out.push(Event::PickupCollected {
            pickup,
            exp: collected.exp,
        });
        self.gain_experience(collected.exp, out);
    }

    fn gain_experience(&mut self, amount: u32, out: &mut Vec<Event>) {
        let leveled = self.progression.gain(amount);
        out.push(Event::ExperienceGained {
            current: self.progression.experience(),
            threshold: self.progression.threshold(),
        });
        if let Some(level) = leveled {
            // The session collaborator answers the pause request before the
            // escalation system applies the level's directives.
            out.push(Event::PauseRequested {
                kind: PauseKind::LevelUp,
            });
            out.push(Event::LeveledUp { level });
        }
    }
}

pub(crate) fn position_of(position: Vec2) -> Position {
    Position::new(position.x, position.y)
}

fn vec_of(position: Position) -> Vec2 {
    Vec2::new(position.x(), position.y())
}

/// Applies a command to the world, appending resulting events.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    if matches!(world.phase, Phase::Ended { .. }) {
        return;
    }

    match command {
        Command::Tick { dt } => {
            if world.phase == Phase::Playing {
                world.tick(dt, out_events);
            }
        }
        Command::SetPlayerPosition { position } => {
            world.player.position = vec_of(position);
        }
        Command::Pause { kind } => {
            if world.phase == Phase::Playing {
                world.phase = Phase::Paused(kind);
                out_events.push(Event::SessionPaused { kind });
            }
        }
        Command::Resume => {
            if matches!(world.phase, Phase::Paused(_)) {
                world.phase = Phase::Playing;
                out_events.push(Event::SessionResumed);
            }
        }
        Command::SpawnMob {
            archetype,
            health,
            drop_rate,
            position,
        } => {
            if !drop_rate.is_finite() || !(0.0..=1.0).contains(&drop_rate) {
                out_events.push(Event::SpawnRuleRejected {
                    archetype,
                    reason: RuleError::DropRateOutOfRange { value: drop_rate },
                });
            } else {
                let _ = world.spawn_mob(archetype, health, drop_rate, vec_of(position), out_events);
            }
        }
        Command::SummonBoss { archetype, health } => {
            spawning::summon(world, archetype, health, out_events);
        }
        Command::ActivateSpawnRule { rule } => {
            spawning::activate(world, rule, out_events);
        }
        Command::DeactivateOldestSpawnRule => {
            spawning::deactivate_oldest(world, out_events);
        }
        Command::AddAttackRule { rule } => {
            attacks::add_rule(world, rule, out_events);
        }
        Command::RemoveAttackRule { kind } => {
            attacks::remove_rule(world, kind, out_events);
        }
        Command::SetAttackScale { kind, scale } => {
            attacks::set_scale(world, kind, scale, out_events);
        }
        Command::SetAttackDamage { kind, damage } => {
            attacks::set_damage(world, kind, damage, out_events);
        }
        Command::SetEnvironment { environment } => {
            world.environment = environment;
            out_events.push(Event::EnvironmentChanged { environment });
        }
        Command::HitMobDynamic { attack, mob } => {
            combat::dynamic_hit(world, attack, mob, out_events);
        }
        Command::HitMobStatic { kind, mob } => {
            combat::static_hit(world, kind, mob, out_events);
        }
        Command::HitPlayer { amount } => {
            combat::player_hit(world, amount, out_events);
        }
        Command::CollectPickup { pickup } => {
            world.collect_pickup(pickup, out_events);
        }
        Command::GainExperience { amount } => {
            world.gain_experience(amount, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use moonlight_core::{
        AttackCategory, AttackId, AttackKind, Environment, Footprint, Health, MobArchetype, MobId,
        PauseKind, PickupId, Position, SessionOutcome, SessionSummary, SpawnRuleId, Velocity,
    };

    use super::{position_of, Phase, World};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Reports the session's current phase.
    #[must_use]
    pub fn session_phase(world: &World) -> SessionPhase {
        match world.phase {
            Phase::Playing => SessionPhase::Playing,
            Phase::Paused(kind) => SessionPhase::Paused(kind),
            Phase::Ended { outcome, summary } => SessionPhase::Ended { outcome, summary },
        }
    }

    /// Reports the active environment backdrop.
    #[must_use]
    pub fn environment(world: &World) -> Environment {
        world.environment
    }

    /// Unpaused play time accumulated so far.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.clock
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Session kill counter, boss included.
    #[must_use]
    pub fn kills(world: &World) -> u32 {
        world.kills
    }

    /// Captures a read-only snapshot of the player.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        PlayerSnapshot {
            position: position_of(world.player.position),
            health: world.player.health,
            max_health: world.player.max_health,
            guard_ready: world.player.guard,
        }
    }

    /// Captures a read-only view of all mobs, boss included.
    #[must_use]
    pub fn mob_view(world: &World) -> MobView {
        let mut snapshots: Vec<MobSnapshot> = world
            .mobs
            .iter()
            .map(|mob| MobSnapshot {
                id: mob.id,
                archetype: mob.archetype,
                position: position_of(mob.position),
                velocity: Velocity::new(mob.velocity.x, mob.velocity.y),
                health: mob.health,
                max_health: mob.max_health,
                alive: mob.alive,
                guard_ready: mob.guard,
                alpha: mob.alpha,
                footprint: mob.archetype.footprint(),
                boss: mob.archetype.is_boss(),
            })
            .collect();
        snapshots.sort_by_key(|snapshot| snapshot.id);
        MobView { snapshots }
    }

    /// Enumerates uncollected pickups.
    #[must_use]
    pub fn pickups(world: &World) -> Vec<PickupSnapshot> {
        world
            .pickups
            .iter()
            .map(|pickup| PickupSnapshot {
                id: pickup.id,
                position: position_of(pickup.position),
                exp: pickup.exp,
            })
            .collect()
    }

    /// Enumerates active attack rules.
    #[must_use]
    pub fn attack_rules(world: &World) -> Vec<AttackRuleSnapshot> {
        world
            .attacks
            .rule_snapshot()
            .into_iter()
            .map(|rule| AttackRuleSnapshot {
                kind: rule.kind,
                category: rule.kind.category(),
                damage: rule.damage,
                scale: rule.scale,
            })
            .collect()
    }

    /// Enumerates live attack instances.
    #[must_use]
    pub fn attack_instances(world: &World) -> Vec<AttackInstanceSnapshot> {
        world
            .attacks
            .instance_snapshot()
            .into_iter()
            .map(|(id, kind)| AttackInstanceSnapshot { id, kind })
            .collect()
    }

    /// Enumerates active spawn rules in activation order.
    #[must_use]
    pub fn spawn_rules(world: &World) -> Vec<SpawnRuleSnapshot> {
        world
            .spawns
            .snapshot()
            .into_iter()
            .map(|(id, rule)| SpawnRuleSnapshot {
                id,
                archetype: rule.archetype,
                health: rule.health,
                drop_rate: rule.drop_rate,
                interval: rule.interval,
            })
            .collect()
    }

    /// Captures the experience/level track for the UI.
    #[must_use]
    pub fn progression(world: &World) -> ProgressionSnapshot {
        ProgressionSnapshot {
            experience: world.progression.experience(),
            threshold: world.progression.threshold(),
            level: world.progression.level(),
            fraction: world.progression.fraction(),
        }
    }

    /// Session phase as observed by adapters.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub enum SessionPhase {
        /// The simulation is running.
        Playing,
        /// The simulation is suspended.
        Paused(PauseKind),
        /// The session reached a terminal state.
        Ended {
            /// Whether the session was won or lost.
            outcome: SessionOutcome,
            /// Aggregated statistics for the end screen.
            summary: SessionSummary,
        },
    }

    /// Immutable representation of the player's state.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct PlayerSnapshot {
        /// Player position in world units.
        pub position: Position,
        /// Current hit points.
        pub health: Health,
        /// Hit points the player started with.
        pub max_health: Health,
        /// Whether the contact grace window is open.
        pub guard_ready: bool,
    }

    /// Read-only snapshot describing all mobs in the session.
    #[derive(Clone, Debug)]
    pub struct MobView {
        snapshots: Vec<MobSnapshot>,
    }

    impl MobView {
        /// Iterator over the captured mob snapshots in id order.
        pub fn iter(&self) -> impl Iterator<Item = &MobSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<MobSnapshot> {
            self.snapshots
        }
    }

    /// Immutable representation of a single mob's state.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct MobSnapshot {
        /// Unique identifier assigned to the mob.
        pub id: MobId,
        /// Archetype of the mob.
        pub archetype: MobArchetype,
        /// Position in world units.
        pub position: Position,
        /// Current velocity.
        pub velocity: Velocity,
        /// Current hit points.
        pub health: Health,
        /// Hit points the mob spawned with.
        pub max_health: Health,
        /// False once the death transition ran.
        pub alive: bool,
        /// Whether the static-hit grace window is open.
        pub guard_ready: bool,
        /// Render alpha directive (hit flash, boss fade).
        pub alpha: f32,
        /// Collision footprint for the physics collaborator.
        pub footprint: Footprint,
        /// Whether the mob is the boss.
        pub boss: bool,
    }

    /// Immutable representation of an uncollected pickup.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct PickupSnapshot {
        /// Unique identifier assigned to the pickup.
        pub id: PickupId,
        /// Position in world units.
        pub position: Position,
        /// Experience granted when collected.
        pub exp: u32,
    }

    /// Immutable representation of an active attack rule.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct AttackRuleSnapshot {
        /// Attack archetype the rule governs.
        pub kind: AttackKind,
        /// Whether instances move or are anchored.
        pub category: AttackCategory,
        /// Damage applied per landed hit.
        pub damage: u32,
        /// Visual/collision scale factor.
        pub scale: f32,
    }

    /// Immutable representation of a live attack instance.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct AttackInstanceSnapshot {
        /// Identifier of the instance.
        pub id: AttackId,
        /// Kind of the instance.
        pub kind: AttackKind,
    }

    /// Immutable representation of an active spawn rule.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct SpawnRuleSnapshot {
        /// Identifier assigned at activation.
        pub id: SpawnRuleId,
        /// Archetype the rule emits.
        pub archetype: MobArchetype,
        /// Health assigned to each emitted mob.
        pub health: Health,
        /// Drop probability carried by emitted mobs.
        pub drop_rate: f32,
        /// Delay between consecutive emissions.
        pub interval: Duration,
    }

    /// Immutable representation of the experience/level track.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct ProgressionSnapshot {
        /// Experience accumulated toward the next threshold.
        pub experience: u32,
        /// Threshold required for the next level.
        pub threshold: u32,
        /// Current level.
        pub level: u32,
        /// Progress fraction in `[0.0, 1.0]` for the UI bar.
        pub fraction: f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonlight_core::{AttackKind, AttackRuleSpec, SpawnRuleSpec};

    fn send(world: &mut World, command: Command) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, command, &mut events);
        events
    }

    fn tick(world: &mut World, millis: u64) -> Vec<Event> {
        send(
            world,
            Command::Tick {
                dt: Duration::from_millis(millis),
            },
        )
    }

    fn direct_spawn(world: &mut World, health: u32) -> MobId {
        let events = send(
            world,
            Command::SpawnMob {
                archetype: MobArchetype::Mole,
                health: Health::new(health),
                drop_rate: 0.0,
                position: Position::new(100.0, 0.0),
            },
        );
        match events.first() {
            Some(Event::MobSpawned { mob, .. }) => *mob,
            other => panic!("expected MobSpawned, got {other:?}"),
        }
    }

    fn bolt_rule() -> AttackRuleSpec {
        AttackRuleSpec {
            kind: AttackKind::Bolt,
            damage: 10,
            scale: 1.0,
            emission_interval: Some(Duration::from_millis(1000)),
            lifetime: Some(Duration::from_millis(3000)),
        }
    }

    fn field_rule(damage: u32) -> AttackRuleSpec {
        AttackRuleSpec {
            kind: AttackKind::Field,
            damage,
            scale: 2.0,
            emission_interval: None,
            lifetime: None,
        }
    }

    fn mole_rule(interval_ms: u64, drop_rate: f32) -> SpawnRuleSpec {
        SpawnRuleSpec {
            archetype: MobArchetype::Mole,
            health: Health::new(10),
            drop_rate,
            interval: Duration::from_millis(interval_ms),
        }
    }

    fn emitted_attack(events: &[Event]) -> Option<moonlight_core::AttackId> {
        events.iter().find_map(|event| match event {
            Event::AttackEmitted { attack, .. } => Some(*attack),
            _ => None,
        })
    }

    #[test]
    fn spawn_rule_emits_on_ring_at_each_interval() {
        let mut world = World::new();
        let events = send(
            &mut world,
            Command::ActivateSpawnRule {
                rule: mole_rule(1000, 0.0),
            },
        );
        assert!(matches!(
            events.as_slice(),
            [Event::SpawnRuleActivated { .. }]
        ));

        let events = tick(&mut world, 1000);
        let spawned: Vec<&Event> = events
            .iter()
            .filter(|event| matches!(event, Event::MobSpawned { .. }))
            .collect();
        assert_eq!(spawned.len(), 1);

        for snapshot in query::mob_view(&world).iter() {
            let distance = (snapshot.position.x().powi(2) + snapshot.position.y().powi(2)).sqrt();
            assert!(
                (distance - SPAWN_RING_RADIUS).abs() < 1.0,
                "mob placed at distance {distance}"
            );
            assert_eq!(snapshot.footprint, moonlight_core::Footprint::new(24.0, 14.0));
        }

        let events = tick(&mut world, 3000);
        let spawned = events
            .iter()
            .filter(|event| matches!(event, Event::MobSpawned { .. }))
            .count();
        assert_eq!(spawned, 3, "one emission per elapsed interval");
    }

    #[test]
    fn deactivating_oldest_leaves_exactly_one_active_rule() {
        let mut world = World::new();
        let _ = send(
            &mut world,
            Command::ActivateSpawnRule {
                rule: mole_rule(1000, 0.0),
            },
        );
        let _ = send(
            &mut world,
            Command::ActivateSpawnRule {
                rule: SpawnRuleSpec {
                    archetype: MobArchetype::Bat,
                    health: Health::new(20),
                    drop_rate: 0.0,
                    interval: Duration::from_millis(1000),
                },
            },
        );
        let events = send(&mut world, Command::DeactivateOldestSpawnRule);
        assert!(matches!(events.as_slice(), [Event::SpawnRuleRetired { .. }]));

        let rules = query::spawn_rules(&world);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].archetype, MobArchetype::Bat);

        let events = tick(&mut world, 1000);
        for event in &events {
            if let Event::MobSpawned { archetype, .. } = event {
                assert_eq!(*archetype, MobArchetype::Bat);
            }
        }
    }

    #[test]
    fn invalid_drop_rate_is_rejected_at_registration() {
        let mut world = World::new();
        let events = send(
            &mut world,
            Command::ActivateSpawnRule {
                rule: mole_rule(1000, 1.5),
            },
        );
        assert!(matches!(
            events.as_slice(),
            [Event::SpawnRuleRejected {
                reason: RuleError::DropRateOutOfRange { .. },
                ..
            }]
        ));
        assert!(query::spawn_rules(&world).is_empty());
    }

    #[test]
    fn dynamic_hit_consumes_instance_and_ignores_replays() {
        let mut world = World::new();
        let mob = direct_spawn(&mut world, 30);
        let _ = send(&mut world, Command::AddAttackRule { rule: bolt_rule() });

        let events = tick(&mut world, 1000);
        let attack = emitted_attack(&events).expect("bolt emitted");

        let events = send(&mut world, Command::HitMobDynamic { attack, mob });
        assert!(events.contains(&Event::AttackConsumed { attack }));
        assert!(events.contains(&Event::MobDamaged {
            mob,
            remaining: Health::new(20),
        }));

        // The same report arriving again this frame is stale.
        let events = send(&mut world, Command::HitMobDynamic { attack, mob });
        assert!(events.is_empty());
    }

    #[test]
    fn dynamic_hit_on_killing_frame_still_consumes_without_damage() {
        let mut world = World::new();
        let mob = direct_spawn(&mut world, 10);
        let _ = send(&mut world, Command::AddAttackRule { rule: bolt_rule() });

        let events = tick(&mut world, 2000);
        let hits: Vec<moonlight_core::AttackId> = events
            .iter()
            .filter_map(|event| match event {
                Event::AttackEmitted { attack, .. } => Some(*attack),
                _ => None,
            })
            .collect();
        assert_eq!(hits.len(), 2);

        // First hit depletes health; the mob stays in storage until the
        // next tick's death sweep.
        let events = send(
            &mut world,
            Command::HitMobDynamic {
                attack: hits[0],
                mob,
            },
        );
        assert!(events.contains(&Event::MobDamaged {
            mob,
            remaining: Health::new(0),
        }));

        // Second overlap the same frame consumes its instance but deals no
        // further damage.
        let events = send(
            &mut world,
            Command::HitMobDynamic {
                attack: hits[1],
                mob,
            },
        );
        assert!(events.contains(&Event::AttackConsumed { attack: hits[1] }));
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::MobDamaged { .. })));

        let events = tick(&mut world, 100);
        let kills: Vec<&Event> = events
            .iter()
            .filter(|event| matches!(event, Event::MobKilled { .. }))
            .collect();
        assert_eq!(kills.len(), 1, "death transition runs exactly once");
    }

    #[test]
    fn static_hits_respect_the_grace_window() {
        let mut world = World::new();
        let mob = direct_spawn(&mut world, 30);
        let _ = send(
            &mut world,
            Command::AddAttackRule {
                rule: field_rule(10),
            },
        );

        let events = send(
            &mut world,
            Command::HitMobStatic {
                kind: AttackKind::Field,
                mob,
            },
        );
        assert!(events.contains(&Event::MobDamaged {
            mob,
            remaining: Health::new(20),
        }));

        // Overlap reports keep arriving while the guard is down.
        let events = send(
            &mut world,
            Command::HitMobStatic {
                kind: AttackKind::Field,
                mob,
            },
        );
        assert!(events.is_empty());

        let _ = tick(&mut world, 800);
        let events = send(
            &mut world,
            Command::HitMobStatic {
                kind: AttackKind::Field,
                mob,
            },
        );
        assert!(events.contains(&Event::MobDamaged {
            mob,
            remaining: Health::new(10),
        }));
    }

    #[test]
    fn sustained_static_contact_is_bounded_by_the_grace_window() {
        let mut world = World::new();
        let mob = direct_spawn(&mut world, 100);
        let _ = send(
            &mut world,
            Command::AddAttackRule {
                rule: field_rule(5),
            },
        );

        // Two overlapping attackers of the same category report every frame
        // for two seconds. The window is tracked per mob, not per attacker,
        // so only one hit lands per 800 ms: at 0 ms, 800 ms, and 1600 ms.
        let mut landed = 0;
        for _ in 0..20 {
            for _ in 0..2 {
                let events = send(
                    &mut world,
                    Command::HitMobStatic {
                        kind: AttackKind::Field,
                        mob,
                    },
                );
                landed += events
                    .iter()
                    .filter(|event| matches!(event, Event::MobDamaged { .. }))
                    .count();
            }
            let _ = tick(&mut world, 100);
        }

        assert_eq!(landed, 3, "one hit per grace window over 2000 ms");
        let remaining = query::mob_view(&world)
            .iter()
            .find(|snapshot| snapshot.id == mob)
            .map(|snapshot| snapshot.health)
            .expect("mob present");
        assert_eq!(remaining, Health::new(85));
    }

    #[test]
    fn removing_an_attack_rule_drops_instances_and_stops_emissions() {
        let mut world = World::new();
        let _ = send(&mut world, Command::AddAttackRule { rule: bolt_rule() });
        let _ = tick(&mut world, 1000);
        assert_eq!(query::attack_instances(&world).len(), 1);

        let events = send(
            &mut world,
            Command::RemoveAttackRule {
                kind: AttackKind::Bolt,
            },
        );
        assert!(events.contains(&Event::AttackRuleRemoved {
            kind: AttackKind::Bolt,
        }));
        assert!(query::attack_instances(&world).is_empty());

        let events = tick(&mut world, 5000);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::AttackEmitted { .. })));
    }

    #[test]
    fn rescaling_a_rule_does_not_touch_live_instances() {
        let mut world = World::new();
        let _ = send(&mut world, Command::AddAttackRule { rule: bolt_rule() });
        let _ = tick(&mut world, 1000);
        let before = query::attack_instances(&world);

        let events = send(
            &mut world,
            Command::SetAttackScale {
                kind: AttackKind::Bolt,
                scale: 2.0,
            },
        );
        assert!(events.contains(&Event::AttackRuleRescaled {
            kind: AttackKind::Bolt,
            scale: 2.0,
        }));
        assert_eq!(query::attack_instances(&world), before);

        let events = send(
            &mut world,
            Command::SetAttackDamage {
                kind: AttackKind::Bolt,
                damage: 40,
            },
        );
        assert!(events.contains(&Event::AttackRuleRedamaged {
            kind: AttackKind::Bolt,
            damage: 40,
        }));
    }

    #[test]
    fn attack_instances_expire_at_their_lifetime() {
        let mut world = World::new();
        let _ = send(&mut world, Command::AddAttackRule { rule: bolt_rule() });
        let events = tick(&mut world, 1000);
        let attack = emitted_attack(&events).expect("bolt emitted");

        let events = tick(&mut world, 3000);
        assert!(events.contains(&Event::AttackExpired { attack }));
    }

    #[test]
    fn killed_mob_with_certain_drop_yields_a_pickup_and_experience() {
        let mut world = World::new();
        let events = send(
            &mut world,
            Command::SpawnMob {
                archetype: MobArchetype::Mole,
                health: Health::new(10),
                drop_rate: 1.0,
                position: Position::new(50.0, 0.0),
            },
        );
        let mob = match events.first() {
            Some(Event::MobSpawned { mob, .. }) => *mob,
            other => panic!("expected MobSpawned, got {other:?}"),
        };
        let _ = send(
            &mut world,
            Command::AddAttackRule {
                rule: field_rule(10),
            },
        );
        let _ = send(
            &mut world,
            Command::HitMobStatic {
                kind: AttackKind::Field,
                mob,
            },
        );

        let events = tick(&mut world, 100);
        let pickup = events
            .iter()
            .find_map(|event| match event {
                Event::PickupDropped { pickup, .. } => Some(*pickup),
                _ => None,
            })
            .expect("drop rate 1.0 always drops");
        assert!(events.contains(&Event::MobKilled {
            mob,
            archetype: MobArchetype::Mole,
            kills: 1,
        }));

        let events = send(&mut world, Command::CollectPickup { pickup });
        assert!(events.contains(&Event::PickupCollected { pickup, exp: 10 }));
        assert!(events.contains(&Event::ExperienceGained {
            current: 10,
            threshold: 50,
        }));
    }

    #[test]
    fn threshold_crossing_requests_pause_then_announces_level() {
        let mut world = World::new();
        let events = send(&mut world, Command::GainExperience { amount: 60 });
        let pause_at = events
            .iter()
            .position(|event| matches!(event, Event::PauseRequested { .. }))
            .expect("pause requested");
        let level_at = events
            .iter()
            .position(|event| matches!(event, Event::LeveledUp { level: 2 }))
            .expect("level announced");
        assert!(pause_at < level_at);
    }

    #[test]
    fn paused_sessions_advance_nothing() {
        let mut world = World::new();
        let mob = direct_spawn(&mut world, 30);
        let _ = tick(&mut world, 200);
        let elapsed = query::elapsed(&world);
        let position = query::mob_view(&world)
            .iter()
            .find(|snapshot| snapshot.id == mob)
            .map(|snapshot| snapshot.position)
            .expect("mob present");

        let events = send(
            &mut world,
            Command::Pause {
                kind: PauseKind::Menu,
            },
        );
        assert_eq!(
            events,
            vec![Event::SessionPaused {
                kind: PauseKind::Menu,
            }]
        );

        let events = tick(&mut world, 5000);
        assert!(events.is_empty(), "ticking while paused is a no-op");
        assert_eq!(query::elapsed(&world), elapsed);
        let frozen = query::mob_view(&world)
            .iter()
            .find(|snapshot| snapshot.id == mob)
            .map(|snapshot| snapshot.position)
            .expect("mob present");
        assert_eq!(frozen, position);

        let events = send(&mut world, Command::Resume);
        assert_eq!(events, vec![Event::SessionResumed]);
        let events = tick(&mut world, 100);
        assert!(events.contains(&Event::TimeAdvanced {
            dt: Duration::from_millis(100),
        }));
    }

    #[test]
    fn player_depletion_ends_the_session_as_a_loss() {
        let mut world = World::with_config(SimulationConfig {
            player_health: Health::new(10),
            ..SimulationConfig::default()
        });

        let events = send(&mut world, Command::HitPlayer { amount: 10 });
        assert!(events.contains(&Event::PlayerDamaged {
            remaining: Health::new(0),
        }));
        assert!(events.iter().any(|event| matches!(
            event,
            Event::SessionEnded {
                outcome: SessionOutcome::Lost,
                ..
            }
        )));

        // Terminal state: everything afterwards is ignored.
        assert!(tick(&mut world, 100).is_empty());
        assert!(send(&mut world, Command::GainExperience { amount: 50 }).is_empty());
    }

    #[test]
    fn player_grace_window_blocks_repeat_contact_damage() {
        let mut world = World::new();
        let events = send(&mut world, Command::HitPlayer { amount: 10 });
        assert_eq!(events.len(), 1);

        let events = send(&mut world, Command::HitPlayer { amount: 10 });
        assert!(events.is_empty());

        let _ = tick(&mut world, 1000);
        let events = send(&mut world, Command::HitPlayer { amount: 10 });
        assert!(events.contains(&Event::PlayerDamaged {
            remaining: Health::new(80),
        }));
    }

    #[test]
    fn boss_defeat_runs_the_full_win_sequence() {
        let mut world = World::new();
        let mob = direct_spawn(&mut world, 30);
        let _ = send(
            &mut world,
            Command::SummonBoss {
                archetype: MobArchetype::Lion,
                health: Health::new(10),
            },
        );
        let boss = query::mob_view(&world)
            .iter()
            .find(|snapshot| snapshot.boss)
            .map(|snapshot| snapshot.id)
            .expect("boss present");
        let _ = send(
            &mut world,
            Command::AddAttackRule {
                rule: field_rule(10),
            },
        );
        let _ = send(
            &mut world,
            Command::HitMobStatic {
                kind: AttackKind::Field,
                mob: boss,
            },
        );

        let events = tick(&mut world, 100);
        assert!(events.contains(&Event::BossDefeated { mob: boss }));
        assert!(events.contains(&Event::AttackRuleRemoved {
            kind: AttackKind::Field,
        }));

        // The boss stays in storage, no longer damageable; other mobs are
        // frozen in place.
        let view = query::mob_view(&world);
        let boss_snapshot = view
            .iter()
            .find(|snapshot| snapshot.id == boss)
            .expect("boss retained");
        assert!(!boss_snapshot.alive);
        let frozen = view
            .iter()
            .find(|snapshot| snapshot.id == mob)
            .expect("mob retained");
        assert_eq!(frozen.velocity, moonlight_core::Velocity::ZERO);

        let events = send(
            &mut world,
            Command::SpawnMob {
                archetype: MobArchetype::Mole,
                health: Health::new(10),
                drop_rate: 0.0,
                position: Position::ORIGIN,
            },
        );
        assert!(!events.is_empty(), "still playing until the win one-shot");

        let events = tick(&mut world, 4000);
        assert!(events.iter().any(|event| matches!(
            event,
            Event::SessionEnded {
                outcome: SessionOutcome::Won,
                ..
            }
        )));
        let view = query::mob_view(&world);
        let boss_snapshot = view
            .iter()
            .find(|snapshot| snapshot.id == boss)
            .expect("boss retained through the fade");
        assert!(boss_snapshot.alpha <= BOSS_FADE_DELTA + f32::EPSILON);

        assert!(tick(&mut world, 100).is_empty(), "won state is terminal");
    }

    #[test]
    fn boss_hits_do_not_flash() {
        let mut world = World::new();
        let _ = send(
            &mut world,
            Command::SummonBoss {
                archetype: MobArchetype::Lion,
                health: Health::new(200),
            },
        );
        let boss = query::mob_view(&world)
            .iter()
            .find(|snapshot| snapshot.boss)
            .map(|snapshot| snapshot.id)
            .expect("boss present");
        let _ = send(
            &mut world,
            Command::AddAttackRule {
                rule: field_rule(10),
            },
        );
        let events = send(
            &mut world,
            Command::HitMobStatic {
                kind: AttackKind::Field,
                mob: boss,
            },
        );
        assert!(events.contains(&Event::MobDamaged {
            mob: boss,
            remaining: Health::new(190),
        }));
        let alpha = query::mob_view(&world)
            .iter()
            .find(|snapshot| snapshot.id == boss)
            .map(|snapshot| snapshot.alpha)
            .expect("boss present");
        assert_eq!(alpha, 1.0);
    }

    #[test]
    fn mob_death_cancels_its_pending_timers() {
        let mut world = World::new();
        let mob = direct_spawn(&mut world, 10);
        let _ = send(
            &mut world,
            Command::AddAttackRule {
                rule: field_rule(10),
            },
        );
        let _ = send(
            &mut world,
            Command::HitMobStatic {
                kind: AttackKind::Field,
                mob,
            },
        );

        // Death sweeps the mob while its guard-restore and flash-clear
        // timers are still pending; no action may land afterwards.
        let events = tick(&mut world, 100);
        assert!(events
            .iter()
            .any(|event| matches!(event, Event::MobKilled { .. })));

        let events = tick(&mut world, 2000);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::MobDamaged { .. })));
        assert!(query::mob_view(&world)
            .iter()
            .all(|snapshot| snapshot.id != mob));
    }

    #[test]
    fn steering_tracks_the_moving_player() {
        let mut world = World::new();
        let mob = direct_spawn(&mut world, 30);
        let _ = tick(&mut world, 100);

        let toward_origin = query::mob_view(&world)
            .iter()
            .find(|snapshot| snapshot.id == mob)
            .map(|snapshot| snapshot.velocity)
            .expect("mob present");
        assert!(toward_origin.dx() < 0.0, "mob at +x heads toward origin");

        let _ = send(
            &mut world,
            Command::SetPlayerPosition {
                position: Position::new(1000.0, 0.0),
            },
        );
        let _ = tick(&mut world, 100);
        let toward_player = query::mob_view(&world)
            .iter()
            .find(|snapshot| snapshot.id == mob)
            .map(|snapshot| snapshot.velocity)
            .expect("mob present");
        assert!(toward_player.dx() > 0.0, "steering re-aims at the player");
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let script = |world: &mut World| {
            let mut log = Vec::new();
            apply(
                world,
                Command::ActivateSpawnRule {
                    rule: mole_rule(500, 0.9),
                },
                &mut log,
            );
            apply(
                world,
                Command::AddAttackRule {
                    rule: field_rule(10),
                },
                &mut log,
            );
            for _ in 0..40 {
                apply(
                    world,
                    Command::Tick {
                        dt: Duration::from_millis(100),
                    },
                    &mut log,
                );
                let mobs = query::mob_view(world).into_vec();
                for snapshot in mobs {
                    if snapshot.alive {
                        apply(
                            world,
                            Command::HitMobStatic {
                                kind: AttackKind::Field,
                                mob: snapshot.id,
                            },
                            &mut log,
                        );
                    }
                }
            }
            log
        };

        let mut first = World::with_config(SimulationConfig {
            rng_seed: 7,
            ..SimulationConfig::default()
        });
        let mut second = World::with_config(SimulationConfig {
            rng_seed: 7,
            ..SimulationConfig::default()
        });
        assert_eq!(script(&mut first), script(&mut second));
        assert_eq!(query::kills(&first), query::kills(&second));
        assert_eq!(query::tick_index(&first), 40);
        assert_eq!(query::tick_index(&first), query::tick_index(&second));
    }
}
