//! Damage resolution for collision reports.
//!
//! Collision detection lives in an excluded collaborator; this module only
//! decides whether a reported overlap deals damage. Deaths are not resolved
//! here. Hits mark health depleted and the per-tick sweep in the world's
//! tick runs each death transition exactly once.

use moonlight_core::{AttackCategory, AttackId, AttackKind, Event, MobId, SessionOutcome};

use crate::timers::{Repeat, TimerAction, TimerOwner};
use crate::{
    attacks, Phase, World, HIT_FLASH_ALPHA, HIT_FLASH_DURATION, PLAYER_GRACE_WINDOW,
    STATIC_GRACE_WINDOW,
};

/// Resolves a dynamic attack instance striking a mob.
///
/// The instance is consumed even when the mob is already dead, because the
/// projectile did land on something. A report naming a missing instance is
/// stale (expired or already consumed this frame) and is dropped whole.
pub(crate) fn dynamic_hit(world: &mut World, attack: AttackId, mob: MobId, out: &mut Vec<Event>) {
    let Some(kind) = attacks::consume(world, attack) else {
        return;
    };
    out.push(Event::AttackConsumed { attack });

    let Some(damage) = world.attacks.damage_of(kind) else {
        return;
    };
    apply_mob_damage(world, mob, damage, out);
}

/// Resolves a static attack overlapping a mob.
///
/// Static overlap reports arrive every frame the shapes intersect, so each
/// landed hit drops the mob's guard flag for a grace window during which
/// further static hits are no-ops. A report naming a removed rule is stale.
pub(crate) fn static_hit(world: &mut World, kind: AttackKind, mob: MobId, out: &mut Vec<Event>) {
    if kind.category() != AttackCategory::Static {
        return;
    }
    let Some(damage) = world.attacks.damage_of(kind) else {
        return;
    };

    let Some(index) = world.mob_index(mob) else {
        return;
    };
    if !world.mobs[index].alive || !world.mobs[index].guard {
        return;
    }

    world.mobs[index].guard = false;
    let _ = world.timers.schedule(
        STATIC_GRACE_WINDOW,
        Repeat::Once,
        TimerOwner::Mob(mob),
        TimerAction::RestoreMobGuard(mob),
    );
    apply_mob_damage(world, mob, damage, out);
}

/// Resolves mob contact damage against the player.
///
/// The player carries the same guard-flag cooldown as mobs under static
/// attacks. Depleting the player's health ends the session as a loss.
pub(crate) fn player_hit(world: &mut World, amount: u32, out: &mut Vec<Event>) {
    if !world.player.guard {
        return;
    }

    world.player.guard = false;
    let _ = world.timers.schedule(
        PLAYER_GRACE_WINDOW,
        Repeat::Once,
        TimerOwner::Player,
        TimerAction::RestorePlayerGuard,
    );

    world.player.health = world.player.health.damaged(amount);
    out.push(Event::PlayerDamaged {
        remaining: world.player.health,
    });

    if world.player.health.is_depleted() {
        let summary = world.summary();
        world.phase = Phase::Ended {
            outcome: SessionOutcome::Lost,
            summary,
        };
        out.push(Event::SessionEnded {
            outcome: SessionOutcome::Lost,
            summary,
        });
    }
}

/// Applies damage to a living mob and starts its hit flash.
///
/// The boss shares the damage path but never flashes; its alpha channel is
/// reserved for the defeat fade.
fn apply_mob_damage(world: &mut World, mob: MobId, damage: u32, out: &mut Vec<Event>) {
    let Some(index) = world.mob_index(mob) else {
        return;
    };
    // A depleted mob is waiting for the next tick's death sweep; further
    // hits land on it without effect.
    if !world.mobs[index].alive || world.mobs[index].health.is_depleted() {
        return;
    }

    world.mobs[index].health = world.mobs[index].health.damaged(damage);
    let remaining = world.mobs[index].health;

    if !world.mobs[index].archetype.is_boss() {
        world.mobs[index].alpha = HIT_FLASH_ALPHA;
        let _ = world.timers.schedule(
            HIT_FLASH_DURATION,
            Repeat::Once,
            TimerOwner::Mob(mob),
            TimerAction::ClearMobFlash(mob),
        );
    }

    out.push(Event::MobDamaged { mob, remaining });
}
