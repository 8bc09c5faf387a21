//! # Device Vibration
//!
//! Patterns alternate on and off durations in milliseconds, starting with
//! "on", the same shape the device vibration APIs take.

use onara_core::Strength;
use rand::Rng;
use tracing::{debug, warn};

use crate::error::EffectResult;

/// One pulse.
pub const SHORT: &[u32] = &[50];
/// Two pulses, the second longer.
pub const MEDIUM: &[u32] = &[30, 20, 80];
/// Three pulses.
pub const LONG: &[u32] = &[40, 30, 80, 30, 60];
/// Stutter then rumble.
pub const EXPLOSIVE: &[u32] = &[20, 10, 20, 10, 60, 80];
/// Two taps.
pub const SUBTLE: &[u32] = &[15, 10, 15];

/// Resolves a strength to its pattern; `Random` picks one of the five.
pub fn pattern_for<R: Rng + ?Sized>(strength: Strength, rng: &mut R) -> &'static [u32] {
    match strength {
        Strength::Subtle => SUBTLE,
        Strength::Short => SHORT,
        Strength::Medium => MEDIUM,
        Strength::Long => LONG,
        Strength::Explosive => EXPLOSIVE,
        Strength::Random => {
            let concrete = Strength::CONCRETE[rng.gen_range(0..Strength::CONCRETE.len())];
            pattern_for(concrete, rng)
        }
    }
}

/// Total length of a pattern.
#[must_use]
pub fn total_ms(pattern: &[u32]) -> u32 {
    pattern.iter().sum()
}

/// Vibration motor.
pub trait HapticSink: Send {
    /// Starts a pattern. Must not block.
    ///
    /// # Errors
    ///
    /// Returns [`crate::EffectError::VibrationUnsupported`] on devices
    /// without a motor.
    fn vibrate(&mut self, pattern: &[u32]) -> EffectResult<()>;
}

/// Vibrates with the pattern for `strength`, logging failures.
///
/// Returns the pattern that was started.
pub fn vibrate<R: Rng + ?Sized>(
    sink: &mut dyn HapticSink,
    strength: Strength,
    rng: &mut R,
) -> Option<&'static [u32]> {
    let pattern = pattern_for(strength, rng);
    match sink.vibrate(pattern) {
        Ok(()) => {
            debug!(?strength, ?pattern, "vibration started");
            Some(pattern)
        }
        Err(err) => {
            warn!(%err, "vibration skipped");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EffectError;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct NoMotor;

    impl HapticSink for NoMotor {
        fn vibrate(&mut self, _pattern: &[u32]) -> EffectResult<()> {
            Err(EffectError::VibrationUnsupported)
        }
    }

    #[test]
    fn test_named_patterns() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert_eq!(pattern_for(Strength::Medium, &mut rng), &[30, 20, 80]);
        assert_eq!(total_ms(pattern_for(Strength::Explosive, &mut rng)), 200);
    }

    #[test]
    fn test_random_is_a_named_pattern() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let all = [SHORT, MEDIUM, LONG, EXPLOSIVE, SUBTLE];
        for _ in 0..40 {
            let p = pattern_for(Strength::Random, &mut rng);
            assert!(all.contains(&p));
        }
    }

    #[test]
    fn test_unsupported_device_is_skipped() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        assert!(vibrate(&mut NoMotor, Strength::Short, &mut rng).is_none());
    }
}
