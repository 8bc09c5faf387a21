//! # Screen Shake
//!
//! A shake is an intensity in pixels and a duration. The renderer animates
//! the viewport through [`keyframes`]; starting a new shake cancels the
//! running one.

use std::time::Duration;

use onara_core::{Point, Strength};
use rand::Rng;
use tracing::{debug, warn};

use crate::error::EffectResult;

/// Intensity and duration of one shake.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShakeProfile {
    /// Peak displacement in pixels.
    pub intensity: f32,
    /// Animation length.
    pub duration: Duration,
}

impl ShakeProfile {
    /// Builds a profile.
    #[must_use]
    pub const fn new(intensity: f32, duration_ms: u64) -> Self {
        Self {
            intensity,
            duration: Duration::from_millis(duration_ms),
        }
    }

    /// The preset for a strength; `Random` picks one of the five.
    pub fn for_strength<R: Rng + ?Sized>(strength: Strength, rng: &mut R) -> Self {
        match strength {
            Strength::Subtle => Self::new(2.0, 300),
            Strength::Short => Self::new(4.0, 400),
            Strength::Medium => Self::new(6.0, 500),
            Strength::Long => Self::new(8.0, 700),
            Strength::Explosive => Self::new(10.0, 800),
            Strength::Random => {
                let concrete = Strength::CONCRETE[rng.gen_range(0..Strength::CONCRETE.len())];
                Self::for_strength(concrete, rng)
            }
        }
    }
}

/// Viewport offsets at 0%, 10%, ..., 100% of the animation.
#[must_use]
pub fn keyframes(intensity: f32) -> [Point; 11] {
    let i = intensity;
    [
        Point::new(0.0, 0.0),
        Point::new(-i / 2.0, i / 2.0),
        Point::new(i, -i),
        Point::new(-i, 0.0),
        Point::new(i / 2.0, i),
        Point::new(-i / 2.0, -i / 2.0),
        Point::new(i / 3.0, i / 3.0),
        Point::new(-i / 3.0, i / 2.0),
        Point::new(i / 4.0, -i / 4.0),
        Point::new(-i / 4.0, 0.0),
        Point::new(0.0, 0.0),
    ]
}

/// The surface being shaken.
pub trait ShakeSink: Send {
    /// Starts animating through `frames` over `duration`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EffectError::TargetMissing`] when nothing can shake.
    fn start(&mut self, frames: &[Point; 11], duration: Duration) -> EffectResult<()>;

    /// Snaps back to rest, aborting any running animation.
    fn reset(&mut self);
}

/// Tracks the running shake so a new one cancels it.
#[derive(Debug, Default)]
pub struct Shaker {
    active_until: Option<Duration>,
}

impl Shaker {
    /// Creates an idle shaker.
    #[must_use]
    pub const fn new() -> Self {
        Self { active_until: None }
    }

    /// True if a shake started before `now` is still running.
    #[must_use]
    pub fn is_active(&self, now: Duration) -> bool {
        self.active_until.is_some_and(|end| now < end)
    }

    /// Starts a shake at `now` (time since session start).
    ///
    /// Returns `false` when skipped: intensity ≤ 0 or the sink failed.
    pub fn shake(&mut self, sink: &mut dyn ShakeSink, profile: ShakeProfile, now: Duration) -> bool {
        if profile.intensity <= 0.0 {
            debug!(intensity = profile.intensity, "shake skipped");
            return false;
        }
        if self.is_active(now) {
            debug!("cancelling running shake");
            sink.reset();
        }
        match sink.start(&keyframes(profile.intensity), profile.duration) {
            Ok(()) => {
                self.active_until = Some(now + profile.duration);
                true
            }
            Err(err) => {
                warn!(%err, "shake skipped");
                sink.reset();
                self.active_until = None;
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[derive(Default)]
    struct Counting {
        starts: usize,
        resets: usize,
    }

    impl ShakeSink for Counting {
        fn start(&mut self, _frames: &[Point; 11], _duration: Duration) -> EffectResult<()> {
            self.starts += 1;
            Ok(())
        }

        fn reset(&mut self) {
            self.resets += 1;
        }
    }

    #[test]
    fn test_presets() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let p = ShakeProfile::for_strength(Strength::Long, &mut rng);
        assert_eq!(p, ShakeProfile::new(8.0, 700));
        for _ in 0..20 {
            let p = ShakeProfile::for_strength(Strength::Random, &mut rng);
            assert!((2.0..=10.0).contains(&p.intensity));
        }
    }

    #[test]
    fn test_keyframes_start_and_end_at_rest() {
        let frames = keyframes(6.0);
        assert_eq!(frames[0], Point::new(0.0, 0.0));
        assert_eq!(frames[10], Point::new(0.0, 0.0));
        assert_eq!(frames[2], Point::new(6.0, -6.0));
    }

    #[test]
    fn test_zero_intensity_skips() {
        let mut sink = Counting::default();
        let mut shaker = Shaker::new();
        assert!(!shaker.shake(&mut sink, ShakeProfile::new(0.0, 500), Duration::ZERO));
        assert_eq!(sink.starts, 0);
    }

    #[test]
    fn test_new_shake_cancels_running() {
        let mut sink = Counting::default();
        let mut shaker = Shaker::new();
        let profile = ShakeProfile::new(6.0, 500);

        assert!(shaker.shake(&mut sink, profile, Duration::ZERO));
        assert!(shaker.shake(&mut sink, profile, Duration::from_millis(200)));
        assert_eq!(sink.resets, 1);

        // Finished shakes need no cancel
        assert!(shaker.shake(&mut sink, profile, Duration::from_secs(5)));
        assert_eq!(sink.resets, 1);
        assert_eq!(sink.starts, 3);
    }
}
