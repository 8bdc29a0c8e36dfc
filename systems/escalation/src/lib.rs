#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level-driven escalation system.
//!
//! Pure system that reacts to level-up announcements with a data-driven
//! directive table: each level maps to a list of difficulty directives that
//! translate one-to-one into world commands. The table is total over levels;
//! an unlisted level simply changes nothing. All types are serde-derived so
//! campaigns can live in configuration files instead of code.

use std::time::Duration;

use moonlight_core::{
    AttackKind, AttackRuleSpec, Command, Environment, Event, Health, MobArchetype, SpawnRuleSpec,
};
use serde::{Deserialize, Serialize};

/// One difficulty adjustment applied when a level is reached.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Directive {
    /// Retires the oldest active spawn rule and activates a new one.
    ReplaceSpawnRule {
        /// The replacement rule.
        rule: SpawnRuleSpec,
    },
    /// Registers a new attack rule.
    AddAttackRule {
        /// The rule to register.
        rule: AttackRuleSpec,
    },
    /// Deregisters an attack rule, with no replacement.
    RemoveAttackRule {
        /// Kind of the rule to remove.
        kind: AttackKind,
    },
    /// Rewrites an active attack rule's scale in place.
    RescaleAttack {
        /// Kind of the rule to mutate.
        kind: AttackKind,
        /// New scale factor.
        scale: f32,
    },
    /// Rewrites an active attack rule's damage in place.
    RedamageAttack {
        /// Kind of the rule to mutate.
        kind: AttackKind,
        /// New per-hit damage.
        damage: u32,
    },
    /// Swaps the environment backdrop.
    SetEnvironment {
        /// Environment to activate.
        environment: Environment,
    },
    /// Summons the boss, ending the regular escalation ladder.
    SummonBoss {
        /// Archetype of the boss.
        archetype: MobArchetype,
        /// Health assigned to the boss.
        health: Health,
    },
}

impl Directive {
    fn to_command(self) -> Vec<Command> {
        match self {
            Directive::ReplaceSpawnRule { rule } => {
                vec![
                    Command::DeactivateOldestSpawnRule,
                    Command::ActivateSpawnRule { rule },
                ]
            }
            Directive::AddAttackRule { rule } => vec![Command::AddAttackRule { rule }],
            Directive::RemoveAttackRule { kind } => vec![Command::RemoveAttackRule { kind }],
            Directive::RescaleAttack { kind, scale } => {
                vec![Command::SetAttackScale { kind, scale }]
            }
            Directive::RedamageAttack { kind, damage } => {
                vec![Command::SetAttackDamage { kind, damage }]
            }
            Directive::SetEnvironment { environment } => {
                vec![Command::SetEnvironment { environment }]
            }
            Directive::SummonBoss { archetype, health } => {
                vec![Command::SummonBoss { archetype, health }]
            }
        }
    }
}

/// Directives applied at one specific level.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelStep {
    /// Level that triggers the step.
    pub level: u32,
    /// Directives applied in order when the level is reached.
    pub directives: Vec<Directive>,
}

/// Level-indexed directive table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EscalationPolicy {
    steps: Vec<LevelStep>,
}

impl EscalationPolicy {
    /// Creates a policy from explicit level steps.
    #[must_use]
    pub fn new(steps: Vec<LevelStep>) -> Self {
        Self { steps }
    }

    /// Directives registered for the provided level, empty when unlisted.
    #[must_use]
    pub fn directives_for(&self, level: u32) -> &[Directive] {
        self.steps
            .iter()
            .find(|step| step.level == level)
            .map(|step| step.directives.as_slice())
            .unwrap_or(&[])
    }

    /// The built-in campaign: six escalation levels and the boss at seven.
    ///
    /// Level 5 removes the slash attack and adds nothing in its place; the
    /// campaign gets easier for one level before the bolt buff at six.
    #[must_use]
    pub fn default_campaign() -> Self {
        let second = Duration::from_millis(1000);
        Self::new(vec![
            LevelStep {
                level: 2,
                directives: vec![
                    Directive::ReplaceSpawnRule {
                        rule: SpawnRuleSpec {
                            archetype: MobArchetype::Bat,
                            health: Health::new(20),
                            drop_rate: 0.8,
                            interval: second,
                        },
                    },
                    Directive::AddAttackRule {
                        rule: AttackRuleSpec {
                            kind: AttackKind::Bolt,
                            damage: 10,
                            scale: 1.0,
                            emission_interval: Some(second),
                            lifetime: Some(Duration::from_millis(3000)),
                        },
                    },
                    Directive::RescaleAttack {
                        kind: AttackKind::Slash,
                        scale: 4.0,
                    },
                ],
            },
            LevelStep {
                level: 3,
                directives: vec![
                    Directive::ReplaceSpawnRule {
                        rule: SpawnRuleSpec {
                            archetype: MobArchetype::Wolf,
                            health: Health::new(30),
                            drop_rate: 0.7,
                            interval: second,
                        },
                    },
                    Directive::AddAttackRule {
                        rule: AttackRuleSpec {
                            kind: AttackKind::Field,
                            damage: 10,
                            scale: 2.0,
                            emission_interval: None,
                            lifetime: None,
                        },
                    },
                ],
            },
            LevelStep {
                level: 4,
                directives: vec![
                    Directive::ReplaceSpawnRule {
                        rule: SpawnRuleSpec {
                            archetype: MobArchetype::Ogre,
                            health: Health::new(40),
                            drop_rate: 0.7,
                            interval: second,
                        },
                    },
                    Directive::RescaleAttack {
                        kind: AttackKind::Field,
                        scale: 3.0,
                    },
                    Directive::SetEnvironment {
                        environment: Environment::Ruins,
                    },
                ],
            },
            LevelStep {
                level: 5,
                directives: vec![Directive::RemoveAttackRule {
                    kind: AttackKind::Slash,
                }],
            },
            LevelStep {
                level: 6,
                directives: vec![
                    Directive::RescaleAttack {
                        kind: AttackKind::Bolt,
                        scale: 2.0,
                    },
                    Directive::RedamageAttack {
                        kind: AttackKind::Bolt,
                        damage: 40,
                    },
                ],
            },
            LevelStep {
                level: 7,
                directives: vec![
                    Directive::SummonBoss {
                        archetype: MobArchetype::Lion,
                        health: Health::new(200),
                    },
                    Directive::SetEnvironment {
                        environment: Environment::Den,
                    },
                ],
            },
        ])
    }
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self::default_campaign()
    }
}

/// Pure system that turns level-up events into escalation commands.
#[derive(Clone, Debug)]
pub struct Escalation {
    policy: EscalationPolicy,
}

impl Escalation {
    /// Creates the system with an explicit policy table.
    #[must_use]
    pub fn new(policy: EscalationPolicy) -> Self {
        Self { policy }
    }

    /// Consumes world events and emits the directives of any level reached.
    pub fn handle(&self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            if let Event::LeveledUp { level } = event {
                for directive in self.policy.directives_for(*level) {
                    out.extend(directive.to_command());
                }
            }
        }
    }
}
