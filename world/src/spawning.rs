//! Spawn rule registry and mob placement.
//!
//! Rules are kept in activation order so retiring "the oldest" rule is a
//! front removal. Each rule owns one recurring emission timer; the timer's
//! action looks the rule up again at fire time, so a retired rule's pending
//! fire lands on nothing.

use std::f32::consts::TAU;

use glam::Vec2;
use moonlight_core::{Event, Health, MobArchetype, SpawnRuleId, SpawnRuleSpec};
use rand::Rng;

use crate::timers::{Repeat, TimerAction, TimerHandle, TimerOwner};
use crate::{World, SPAWN_RING_RADIUS};

#[derive(Clone, Copy, Debug)]
struct SpawnEntry {
    id: SpawnRuleId,
    rule: SpawnRuleSpec,
    timer: TimerHandle,
}

/// Active spawn rules in activation order.
#[derive(Debug, Default)]
pub(crate) struct SpawnDirectory {
    entries: Vec<SpawnEntry>,
    next_id: u32,
}

impl SpawnDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> SpawnRuleId {
        let id = SpawnRuleId::new(self.next_id);
        self.next_id += 1;
        id
    }

    fn rule(&self, id: SpawnRuleId) -> Option<SpawnRuleSpec> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.rule)
    }

    pub(crate) fn snapshot(&self) -> Vec<(SpawnRuleId, SpawnRuleSpec)> {
        self.entries
            .iter()
            .map(|entry| (entry.id, entry.rule))
            .collect()
    }
}

/// Registers a spawn rule and starts its recurring emission timer.
pub(crate) fn activate(world: &mut World, rule: SpawnRuleSpec, out: &mut Vec<Event>) {
    if let Err(reason) = rule.validate() {
        out.push(Event::SpawnRuleRejected {
            archetype: rule.archetype,
            reason,
        });
        return;
    }

    let id = world.spawns.allocate_id();
    let timer = world.timers.schedule(
        rule.interval,
        Repeat::Infinite,
        TimerOwner::SpawnRule(id),
        TimerAction::SpawnFromRule(id),
    );
    world.spawns.entries.push(SpawnEntry { id, rule, timer });
    out.push(Event::SpawnRuleActivated {
        rule: id,
        archetype: rule.archetype,
    });
}

/// Cancels and removes the earliest-registered active rule, if any.
pub(crate) fn deactivate_oldest(world: &mut World, out: &mut Vec<Event>) {
    if world.spawns.entries.is_empty() {
        return;
    }
    let entry = world.spawns.entries.remove(0);
    world.timers.cancel(entry.timer);
    out.push(Event::SpawnRuleRetired { rule: entry.id });
}

/// Emits one mob from a rule's recurring timer. Stale fires for retired
/// rules are dropped.
pub(crate) fn spawn_from_rule(world: &mut World, id: SpawnRuleId, out: &mut Vec<Event>) {
    let Some(rule) = world.spawns.rule(id) else {
        return;
    };
    let position = ring_position(world);
    let _ = world.spawn_mob(rule.archetype, rule.health, rule.drop_rate, position, out);
}

/// Creates one boss mob immediately, with no recurring rule and no drop.
pub(crate) fn summon(
    world: &mut World,
    archetype: MobArchetype,
    health: Health,
    out: &mut Vec<Event>,
) {
    let position = ring_position(world);
    let _ = world.spawn_mob(archetype, health, 0.0, position, out);
}

/// Picks a point on the fixed-radius ring around the player's current
/// position, at an angle drawn from the world's seeded RNG.
fn ring_position(world: &mut World) -> Vec2 {
    let angle = world.rng.gen::<f32>() * TAU;
    world.player.position + Vec2::from_angle(angle) * SPAWN_RING_RADIUS
}
