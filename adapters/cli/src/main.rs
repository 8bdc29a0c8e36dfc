#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Moonlight Survival session.
//!
//! The binary stands in for the excluded collaborators: it reports contact
//! overlaps whenever a mob comes within range of the player, collects every
//! dropped pickup, and answers level-up pause requests immediately. The
//! session is fully deterministic for a given seed and policy.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context;
use clap::Parser;
use moonlight_core::{AttackCategory, Command, Event};
use moonlight_system_bootstrap::Bootstrap;
use moonlight_system_escalation::{Escalation, EscalationPolicy};
use moonlight_world::{self as world, query, SimulationConfig, World};

const TICK: Duration = Duration::from_millis(100);
const CONTACT_RANGE: f32 = 100.0;
const CONTACT_DAMAGE: u32 = 5;

/// Runs a scripted survival session and prints its outcome.
#[derive(Debug, Parser)]
#[command(name = "moonlight", about = "Headless Moonlight Survival session")]
struct Args {
    /// Simulated session length in seconds.
    #[arg(long, default_value_t = 120)]
    seconds: u64,

    /// Seed for the session's deterministic RNG.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// TOML file holding a custom escalation policy table.
    #[arg(long)]
    policy: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let policy = match &args.policy {
        Some(path) => load_policy(path)?,
        None => EscalationPolicy::default_campaign(),
    };

    let mut world = World::with_config(SimulationConfig {
        rng_seed: args.seed,
        ..SimulationConfig::default()
    });
    let bootstrap = Bootstrap::default();
    let escalation = Escalation::new(policy);

    println!("{}", bootstrap.welcome_banner(&world));

    let mut pending = Vec::new();
    bootstrap.opening_commands(&mut pending);

    for _ in 0..args.seconds.saturating_mul(10) {
        let mut batch = std::mem::take(&mut pending);
        batch.extend(contact_reports(&world));
        batch.push(Command::Tick { dt: TICK });

        let mut events = Vec::new();
        for command in batch {
            world::apply(&mut world, command, &mut events);
        }

        react(&escalation, &events, &mut pending);
        announce(&events);

        if matches!(
            query::session_phase(&world),
            query::SessionPhase::Ended { .. }
        ) {
            break;
        }
    }

    println!("{}", summary_line(&world));
    Ok(())
}

fn load_policy(path: &Path) -> anyhow::Result<EscalationPolicy> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading policy file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing policy file {}", path.display()))
}

/// Answers pause requests and feeds events through the escalation system,
/// queueing the resulting commands for the next tick.
fn react(escalation: &Escalation, events: &[Event], pending: &mut Vec<Command>) {
    let paused = events
        .iter()
        .any(|event| matches!(event, Event::PauseRequested { .. }));
    for event in events {
        if let Event::PauseRequested { kind } = event {
            pending.push(Command::Pause { kind: *kind });
        }
    }
    escalation.handle(events, pending);
    if paused {
        pending.push(Command::Resume);
    }
}

/// Reports overlaps the way the physics collaborator would: mobs in contact
/// range take every active static attack and deal contact damage back.
fn contact_reports(world: &World) -> Vec<Command> {
    let mut commands = Vec::new();
    let player = query::player(world).position;
    let static_kinds: Vec<_> = query::attack_rules(world)
        .into_iter()
        .filter(|rule| rule.category == AttackCategory::Static)
        .map(|rule| rule.kind)
        .collect();

    for mob in query::mob_view(world).iter() {
        if !mob.alive {
            continue;
        }
        let dx = mob.position.x() - player.x();
        let dy = mob.position.y() - player.y();
        let reach = CONTACT_RANGE + mob.footprint.width() / 2.0;
        if dx.hypot(dy) <= reach {
            for kind in &static_kinds {
                commands.push(Command::HitMobStatic {
                    kind: *kind,
                    mob: mob.id,
                });
            }
            commands.push(Command::HitPlayer {
                amount: CONTACT_DAMAGE,
            });
        }
    }

    for pickup in query::pickups(world) {
        commands.push(Command::CollectPickup { pickup: pickup.id });
    }
    commands
}

fn announce(events: &[Event]) {
    for event in events {
        match event {
            Event::LeveledUp { level } => println!("reached level {level}"),
            Event::EnvironmentChanged { environment } => {
                println!("environment changed to {environment:?}");
            }
            Event::BossDefeated { .. } => println!("the boss falls"),
            Event::SessionEnded { outcome, summary } => {
                println!(
                    "session {outcome:?}: {} kills, level {}, {:.1}s played",
                    summary.kills,
                    summary.level,
                    summary.elapsed.as_secs_f64()
                );
            }
            _ => {}
        }
    }
}

/// Formats the closing status line for sessions that ran out of scripted
/// time while still playing.
fn summary_line(world: &World) -> String {
    match query::session_phase(world) {
        query::SessionPhase::Ended { .. } => "session over".to_owned(),
        _ => format!(
            "time is up: {} kills, level {}, {:.1}s played",
            query::kills(world),
            query::progression(world).level,
            query::elapsed(world).as_secs_f64()
        ),
    }
}
