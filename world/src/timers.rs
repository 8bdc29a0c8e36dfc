//! Cancelable timed-action registry used by the authoritative world.
//!
//! Timers carry data actions instead of closures so that firing stays
//! deterministic and cancellation can be checked at execution time. Every
//! timer is tagged with its owner, letting an entity's destruction cancel all
//! of its pending behavior atomically.

use std::time::Duration;

use moonlight_core::{AttackId, AttackKind, MobId, SpawnRuleId};

/// Handle identifying a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct TimerHandle(u64);

/// Entity or subsystem that owns a timer and may bulk-cancel it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerOwner {
    Mob(MobId),
    Player,
    SpawnRule(SpawnRuleId),
    AttackRule(AttackKind),
    AttackInstance(AttackId),
    Session,
}

/// Deferred world mutation executed when a timer fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerAction {
    /// Re-aim a mob's velocity at the player's current position.
    SteerMob(MobId),
    /// Restore a mob's alpha after the hit-flash duration.
    ClearMobFlash(MobId),
    /// Re-open a mob's static-hit grace window.
    RestoreMobGuard(MobId),
    /// Re-open the player's contact grace window.
    RestorePlayerGuard,
    /// Emit one mob from a registered spawn rule.
    SpawnFromRule(SpawnRuleId),
    /// Emit one attack instance from a registered attack rule.
    EmitAttack(AttackKind),
    /// Expire an attack instance that reached its lifetime.
    ExpireAttack(AttackId),
    /// Advance the boss fade-out by one alpha step.
    BossFadeStep(MobId),
    /// Transition the session to its won terminal state.
    CompleteWin,
}

/// Repetition mode of a scheduled timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Repeat {
    Once,
    Finite(u32),
    Infinite,
}

/// Exhausted entries fired their final repetition but keep their collected
/// fires valid; cancelled entries suppress even already-collected fires.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TimerState {
    Active,
    Exhausted,
    Cancelled,
}

#[derive(Clone, Copy, Debug)]
struct TimerEntry {
    handle: TimerHandle,
    owner: TimerOwner,
    action: TimerAction,
    period: Duration,
    remaining: Duration,
    repeat: Repeat,
    state: TimerState,
}

/// Registry of scheduled timers advanced by the world's tick.
#[derive(Debug, Default)]
pub(crate) struct TimerRegistry {
    entries: Vec<TimerEntry>,
    next_handle: u64,
}

impl TimerRegistry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Schedules an action to fire after `delay`, repeating per `repeat`.
    ///
    /// Repeating timers reuse `delay` as their period. A zero-duration period
    /// on a repeating timer exhausts after its first fire rather than
    /// spinning forever.
    pub(crate) fn schedule(
        &mut self,
        delay: Duration,
        repeat: Repeat,
        owner: TimerOwner,
        action: TimerAction,
    ) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);
        self.entries.push(TimerEntry {
            handle,
            owner,
            action,
            period: delay,
            remaining: delay,
            repeat,
            state: TimerState::Active,
        });
        handle
    }

    /// Cancels a single timer. A cancelled timer never fires again, and any
    /// fire already collected in the current advance is suppressed by the
    /// [`TimerRegistry::is_live`] check.
    pub(crate) fn cancel(&mut self, handle: TimerHandle) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.handle == handle)
        {
            entry.state = TimerState::Cancelled;
        }
    }

    /// Cancels every timer tagged with the provided owner.
    pub(crate) fn cancel_owner(&mut self, owner: TimerOwner) {
        for entry in &mut self.entries {
            if entry.owner == owner {
                entry.state = TimerState::Cancelled;
            }
        }
    }

    /// Reports whether a collected fire for the handle may still execute.
    ///
    /// The world re-checks this before executing each fired action, so a fire
    /// collected earlier in the tick is suppressed when a previously executed
    /// action cancelled its timer. An exhausted timer's final fire remains
    /// valid.
    pub(crate) fn is_live(&self, handle: TimerHandle) -> bool {
        self.entries
            .iter()
            .any(|entry| entry.handle == handle && entry.state != TimerState::Cancelled)
    }

    /// Advances all timers by `dt`, collecting fired actions in registration
    /// order. A repeating timer fires once per elapsed period, so a large
    /// `dt` may fire the same timer several times.
    pub(crate) fn advance(&mut self, dt: Duration, fired: &mut Vec<(TimerHandle, TimerAction)>) {
        for entry in &mut self.entries {
            if entry.state != TimerState::Active {
                continue;
            }

            let mut budget = dt;
            while entry.state == TimerState::Active && budget >= entry.remaining {
                budget -= entry.remaining;
                fired.push((entry.handle, entry.action));

                match entry.repeat {
                    Repeat::Once => {
                        entry.state = TimerState::Exhausted;
                    }
                    Repeat::Finite(left) => {
                        if left <= 1 || entry.period.is_zero() {
                            entry.state = TimerState::Exhausted;
                        } else {
                            entry.repeat = Repeat::Finite(left - 1);
                            entry.remaining = entry.period;
                        }
                    }
                    Repeat::Infinite => {
                        if entry.period.is_zero() {
                            entry.state = TimerState::Exhausted;
                        } else {
                            entry.remaining = entry.period;
                        }
                    }
                }
            }

            if entry.state == TimerState::Active {
                entry.remaining -= budget;
            }
        }
    }

    /// Drops exhausted and cancelled entries. Called by the world after the
    /// fired batch has been executed, so liveness checks for the batch stay
    /// answerable until then.
    pub(crate) fn sweep(&mut self) {
        self.entries
            .retain(|entry| entry.state == TimerState::Active);
    }

    #[cfg(test)]
    pub(crate) fn pending(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.state == TimerState::Active)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn steer(id: u32) -> TimerAction {
        TimerAction::SteerMob(MobId::new(id))
    }

    #[test]
    fn one_shot_fires_once_and_stays_executable() {
        let mut timers = TimerRegistry::new();
        let handle = timers.schedule(
            Duration::from_millis(100),
            Repeat::Once,
            TimerOwner::Session,
            TimerAction::CompleteWin,
        );

        let mut fired = Vec::new();
        timers.advance(Duration::from_millis(99), &mut fired);
        assert!(fired.is_empty());

        timers.advance(Duration::from_millis(1), &mut fired);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, TimerAction::CompleteWin);
        assert!(
            timers.is_live(handle),
            "exhausted fire must remain executable until swept"
        );

        timers.sweep();
        fired.clear();
        timers.advance(Duration::from_secs(10), &mut fired);
        assert!(fired.is_empty());
        assert!(!timers.is_live(handle));
    }

    #[test]
    fn infinite_timer_fires_once_per_elapsed_period() {
        let mut timers = TimerRegistry::new();
        let _ = timers.schedule(
            Duration::from_millis(100),
            Repeat::Infinite,
            TimerOwner::Mob(MobId::new(1)),
            steer(1),
        );

        let mut fired = Vec::new();
        timers.advance(Duration::from_millis(350), &mut fired);
        assert_eq!(fired.len(), 3);

        fired.clear();
        timers.advance(Duration::from_millis(50), &mut fired);
        assert_eq!(fired.len(), 1, "residual 50ms completes the fourth period");
    }

    #[test]
    fn finite_timer_stops_after_configured_fires() {
        let mut timers = TimerRegistry::new();
        let _ = timers.schedule(
            Duration::from_millis(30),
            Repeat::Finite(100),
            TimerOwner::Session,
            TimerAction::BossFadeStep(MobId::new(9)),
        );

        let mut fired = Vec::new();
        timers.advance(Duration::from_secs(10), &mut fired);
        assert_eq!(fired.len(), 100);
        timers.sweep();
        assert_eq!(timers.pending(), 0);
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut timers = TimerRegistry::new();
        let handle = timers.schedule(
            Duration::from_millis(10),
            Repeat::Infinite,
            TimerOwner::Mob(MobId::new(2)),
            steer(2),
        );
        timers.cancel(handle);

        let mut fired = Vec::new();
        timers.advance(Duration::from_secs(1), &mut fired);
        assert!(fired.is_empty());
        assert!(!timers.is_live(handle));
    }

    #[test]
    fn owner_cancellation_is_atomic() {
        let mut timers = TimerRegistry::new();
        let owner = TimerOwner::Mob(MobId::new(3));
        let first = timers.schedule(Duration::from_millis(10), Repeat::Infinite, owner, steer(3));
        let second = timers.schedule(
            Duration::from_millis(20),
            Repeat::Once,
            owner,
            TimerAction::RestoreMobGuard(MobId::new(3)),
        );
        let other = timers.schedule(
            Duration::from_millis(10),
            Repeat::Infinite,
            TimerOwner::Mob(MobId::new(4)),
            steer(4),
        );

        timers.cancel_owner(owner);
        assert!(!timers.is_live(first));
        assert!(!timers.is_live(second));
        assert!(timers.is_live(other));

        let mut fired = Vec::new();
        timers.advance(Duration::from_millis(100), &mut fired);
        assert!(fired
            .iter()
            .all(|(_, action)| *action == TimerAction::SteerMob(MobId::new(4))));
    }

    #[test]
    fn cancellation_suppresses_already_collected_fire() {
        // Mirrors the world's execution loop: two actions fire in the same
        // advance, and executing the first cancels the second's timer.
        let mut timers = TimerRegistry::new();
        let first = timers.schedule(
            Duration::from_millis(10),
            Repeat::Once,
            TimerOwner::Session,
            TimerAction::CompleteWin,
        );
        let second = timers.schedule(
            Duration::from_millis(10),
            Repeat::Infinite,
            TimerOwner::Mob(MobId::new(5)),
            steer(5),
        );

        let mut fired = Vec::new();
        timers.advance(Duration::from_millis(10), &mut fired);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].0, first);
        assert!(timers.is_live(fired[0].0));

        timers.cancel(second);
        assert!(!timers.is_live(fired[1].0));
    }

    #[test]
    fn registration_order_is_preserved_within_one_advance() {
        let mut timers = TimerRegistry::new();
        let _ = timers.schedule(
            Duration::from_millis(10),
            Repeat::Once,
            TimerOwner::Session,
            steer(1),
        );
        let _ = timers.schedule(
            Duration::from_millis(5),
            Repeat::Once,
            TimerOwner::Session,
            steer(2),
        );

        let mut fired = Vec::new();
        timers.advance(Duration::from_millis(10), &mut fired);
        let actions: Vec<TimerAction> = fired.iter().map(|(_, action)| *action).collect();
        assert_eq!(actions, vec![steer(1), steer(2)]);
    }
}
