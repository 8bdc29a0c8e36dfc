#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that prepares a Moonlight Survival session.

use std::time::Duration;

use moonlight_core::{
    AttackKind, AttackRuleSpec, Command, Environment, Health, MobArchetype, Position,
    SpawnRuleSpec,
};
use moonlight_world::{query, World};

/// Produces the opening command batch and greeting data.
#[derive(Debug, Default)]
pub struct Bootstrap;

impl Bootstrap {
    /// Derives the banner that should be shown when the session starts.
    #[must_use]
    pub fn welcome_banner<'world>(&self, world: &'world World) -> &'world str {
        query::welcome_banner(world)
    }

    /// Emits the session's opening loadout: the meadow backdrop, the first
    /// spawn rule, the starting slash attack, and one mob already on screen
    /// so the player is never alone.
    pub fn opening_commands(&self, out: &mut Vec<Command>) {
        out.push(Command::SetEnvironment {
            environment: Environment::Meadow,
        });
        out.push(Command::ActivateSpawnRule {
            rule: SpawnRuleSpec {
                archetype: MobArchetype::Mole,
                health: Health::new(10),
                drop_rate: 0.9,
                interval: Duration::from_millis(1000),
            },
        });
        out.push(Command::AddAttackRule {
            rule: AttackRuleSpec {
                kind: AttackKind::Slash,
                damage: 10,
                scale: 2.3,
                emission_interval: Some(Duration::from_millis(1500)),
                lifetime: Some(Duration::from_millis(600)),
            },
        });
        out.push(Command::SpawnMob {
            archetype: MobArchetype::Mole,
            health: Health::new(10),
            drop_rate: 0.9,
            position: Position::ORIGIN,
        });
    }
}
