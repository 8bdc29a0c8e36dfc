//! Attack rule registry and live attack instances.
//!
//! One rule per attack kind. Rules with an emission interval spawn
//! instances on a recurring timer; rules without one create a single
//! persistent instance at registration (auras stay up until the rule is
//! removed). Damage and scale mutate in place so escalation never disturbs
//! live instances or any per-mob cooldown state.

use moonlight_core::{AttackId, AttackKind, AttackRuleSpec, Event};

use crate::timers::{Repeat, TimerAction, TimerHandle, TimerOwner};
use crate::World;

#[derive(Clone, Copy, Debug)]
struct RuleEntry {
    rule: AttackRuleSpec,
    emission: Option<TimerHandle>,
}

#[derive(Clone, Copy, Debug)]
struct AttackInstance {
    id: AttackId,
    kind: AttackKind,
}

/// Registered attack rules plus their live instances.
#[derive(Debug, Default)]
pub(crate) struct AttackDirectory {
    rules: Vec<RuleEntry>,
    instances: Vec<AttackInstance>,
    next_instance: u32,
}

impl AttackDirectory {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn rule(&self, kind: AttackKind) -> Option<AttackRuleSpec> {
        self.rules
            .iter()
            .find(|entry| entry.rule.kind == kind)
            .map(|entry| entry.rule)
    }

    pub(crate) fn has_rule(&self, kind: AttackKind) -> bool {
        self.rule(kind).is_some()
    }

    pub(crate) fn damage_of(&self, kind: AttackKind) -> Option<u32> {
        self.rule(kind).map(|rule| rule.damage)
    }

    fn allocate_instance(&mut self) -> AttackId {
        let id = AttackId::new(self.next_instance);
        self.next_instance += 1;
        id
    }

    pub(crate) fn rule_snapshot(&self) -> Vec<AttackRuleSpec> {
        self.rules.iter().map(|entry| entry.rule).collect()
    }

    pub(crate) fn instance_snapshot(&self) -> Vec<(AttackId, AttackKind)> {
        self.instances
            .iter()
            .map(|instance| (instance.id, instance.kind))
            .collect()
    }
}

/// Registers an attack rule, replacing any existing rule of the same kind.
pub(crate) fn add_rule(world: &mut World, rule: AttackRuleSpec, out: &mut Vec<Event>) {
    if let Err(reason) = rule.validate() {
        out.push(Event::AttackRuleRejected {
            kind: rule.kind,
            reason,
        });
        return;
    }

    if world.attacks.has_rule(rule.kind) {
        remove_rule(world, rule.kind, out);
    }

    let emission = rule.emission_interval.map(|interval| {
        world.timers.schedule(
            interval,
            Repeat::Infinite,
            TimerOwner::AttackRule(rule.kind),
            TimerAction::EmitAttack(rule.kind),
        )
    });
    world.attacks.rules.push(RuleEntry { rule, emission });
    out.push(Event::AttackRuleAdded { kind: rule.kind });

    // Interval-less rules are persistent auras: one instance, up front.
    if rule.emission_interval.is_none() {
        emit(world, rule.kind, out);
    }
}

/// Deregisters a rule, cancelling its emission timer and removing every
/// live instance of its kind.
pub(crate) fn remove_rule(world: &mut World, kind: AttackKind, out: &mut Vec<Event>) {
    let Some(index) = world
        .attacks
        .rules
        .iter()
        .position(|entry| entry.rule.kind == kind)
    else {
        return;
    };

    let entry = world.attacks.rules.remove(index);
    if let Some(timer) = entry.emission {
        world.timers.cancel(timer);
    }

    let mut index = 0;
    while index < world.attacks.instances.len() {
        if world.attacks.instances[index].kind == kind {
            let instance = world.attacks.instances.remove(index);
            world
                .timers
                .cancel_owner(TimerOwner::AttackInstance(instance.id));
        } else {
            index += 1;
        }
    }

    out.push(Event::AttackRuleRemoved { kind });
}

/// Deregisters every active rule. Used by the boss death sequence.
pub(crate) fn remove_all(world: &mut World, out: &mut Vec<Event>) {
    while let Some(entry) = world.attacks.rules.first() {
        let kind = entry.rule.kind;
        remove_rule(world, kind, out);
    }
}

/// Emits one instance of a rule's attack. Stale fires for removed rules
/// are dropped.
pub(crate) fn emit(world: &mut World, kind: AttackKind, out: &mut Vec<Event>) {
    let Some(rule) = world.attacks.rule(kind) else {
        return;
    };

    let id = world.attacks.allocate_instance();
    world.attacks.instances.push(AttackInstance { id, kind });
    out.push(Event::AttackEmitted { attack: id, kind });

    if let Some(lifetime) = rule.lifetime {
        let _ = world.timers.schedule(
            lifetime,
            Repeat::Once,
            TimerOwner::AttackInstance(id),
            TimerAction::ExpireAttack(id),
        );
    }
}

/// Removes an instance whose lifetime elapsed.
pub(crate) fn expire(world: &mut World, attack: AttackId, out: &mut Vec<Event>) {
    if take_instance(world, attack).is_some() {
        out.push(Event::AttackExpired { attack });
    }
}

/// Consumes an instance on a landed hit, returning its kind. `None` means
/// the hit report was stale.
pub(crate) fn consume(world: &mut World, attack: AttackId) -> Option<AttackKind> {
    take_instance(world, attack)
}

fn take_instance(world: &mut World, attack: AttackId) -> Option<AttackKind> {
    let index = world
        .attacks
        .instances
        .iter()
        .position(|instance| instance.id == attack)?;
    let instance = world.attacks.instances.remove(index);
    world
        .timers
        .cancel_owner(TimerOwner::AttackInstance(attack));
    Some(instance.kind)
}

/// Rewrites a rule's scale in place. Unknown kinds are ignored.
pub(crate) fn set_scale(world: &mut World, kind: AttackKind, scale: f32, out: &mut Vec<Event>) {
    if scale <= 0.0 || !scale.is_finite() {
        out.push(Event::AttackRuleRejected {
            kind,
            reason: moonlight_core::RuleError::InvalidScale { value: scale },
        });
        return;
    }
    if let Some(entry) = world
        .attacks
        .rules
        .iter_mut()
        .find(|entry| entry.rule.kind == kind)
    {
        entry.rule.scale = scale;
        out.push(Event::AttackRuleRescaled { kind, scale });
    }
}

/// Rewrites a rule's damage in place. Unknown kinds are ignored.
pub(crate) fn set_damage(world: &mut World, kind: AttackKind, damage: u32, out: &mut Vec<Event>) {
    if let Some(entry) = world
        .attacks
        .rules
        .iter_mut()
        .find(|entry| entry.rule.kind == kind)
    {
        entry.rule.damage = damage;
        out.push(Event::AttackRuleRedamaged { kind, damage });
    }
}
