//! Experience and level bookkeeping for the authoritative world.

use moonlight_core::OvershootPolicy;

/// Tuning knobs for the experience/level track.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProgressionConfig {
    /// Experience required to reach level 2.
    pub initial_threshold: u32,
    /// Amount added to the threshold after each level-up.
    pub threshold_step: u32,
    /// What happens to surplus experience at a threshold crossing.
    pub overshoot: OvershootPolicy,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            initial_threshold: 50,
            threshold_step: 0,
            overshoot: OvershootPolicy::default(),
        }
    }
}

/// Mutable experience/level state.
///
/// The level increases by exactly one per threshold crossing, even when a
/// single gain overshoots the threshold by more than a full level's worth.
/// That is a documented simplification of the progression design, not an
/// accident to compensate for.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Progression {
    experience: u32,
    threshold: u32,
    level: u32,
    threshold_step: u32,
    overshoot: OvershootPolicy,
}

impl Progression {
    pub(crate) fn new(config: ProgressionConfig) -> Self {
        Self {
            experience: 0,
            threshold: config.initial_threshold,
            level: 1,
            threshold_step: config.threshold_step,
            overshoot: config.overshoot,
        }
    }

    /// Adds experience and returns the new level if a threshold was crossed.
    pub(crate) fn gain(&mut self, amount: u32) -> Option<u32> {
        self.experience = self.experience.saturating_add(amount);
        if self.experience < self.threshold {
            return None;
        }

        self.level += 1;
        match self.overshoot {
            OvershootPolicy::CarryOver => {
                self.experience -= self.threshold;
            }
            OvershootPolicy::Discard => {
                self.experience = 0;
            }
        }
        self.threshold = self.threshold.saturating_add(self.threshold_step);
        Some(self.level)
    }

    pub(crate) fn experience(&self) -> u32 {
        self.experience
    }

    pub(crate) fn threshold(&self) -> u32 {
        self.threshold
    }

    pub(crate) fn level(&self) -> u32 {
        self.level
    }

    /// Fraction of the current threshold reached, for the UI progress bar.
    pub(crate) fn fraction(&self) -> f32 {
        if self.threshold == 0 {
            return 1.0;
        }
        (self.experience as f32 / self.threshold as f32).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gains_exactly_one_level_per_crossing_even_on_large_overshoot() {
        let mut progression = Progression::new(ProgressionConfig::default());
        assert_eq!(progression.level(), 1);

        // 130 experience overshoots the 50-point threshold by more than
        // another full threshold, but only one level is gained.
        assert_eq!(progression.gain(130), Some(2));
        assert_eq!(progression.level(), 2);
    }

    #[test]
    fn carry_over_preserves_surplus_experience() {
        let mut progression = Progression::new(ProgressionConfig {
            initial_threshold: 50,
            threshold_step: 0,
            overshoot: OvershootPolicy::CarryOver,
        });

        assert_eq!(progression.gain(70), Some(2));
        assert_eq!(progression.experience(), 20);

        // The surplus counts toward the next crossing.
        assert_eq!(progression.gain(30), Some(3));
        assert_eq!(progression.experience(), 0);
    }

    #[test]
    fn discard_zeroes_surplus_experience() {
        let mut progression = Progression::new(ProgressionConfig {
            initial_threshold: 50,
            threshold_step: 0,
            overshoot: OvershootPolicy::Discard,
        });

        assert_eq!(progression.gain(70), Some(2));
        assert_eq!(progression.experience(), 0);
        assert_eq!(progression.gain(30), None);
    }

    #[test]
    fn threshold_grows_by_configured_step() {
        let mut progression = Progression::new(ProgressionConfig {
            initial_threshold: 50,
            threshold_step: 25,
            overshoot: OvershootPolicy::Discard,
        });

        assert_eq!(progression.gain(50), Some(2));
        assert_eq!(progression.threshold(), 75);
        assert_eq!(progression.gain(74), None);
        assert_eq!(progression.gain(1), Some(3));
        assert_eq!(progression.threshold(), 100);
    }

    #[test]
    fn fraction_tracks_progress_toward_threshold() {
        let mut progression = Progression::new(ProgressionConfig::default());
        assert_eq!(progression.fraction(), 0.0);
        assert_eq!(progression.gain(25), None);
        assert!((progression.fraction() - 0.5).abs() < f32::EPSILON);
    }
}
