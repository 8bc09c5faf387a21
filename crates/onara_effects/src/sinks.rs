//! # Stock Sinks
//!
//! [`NullSink`] discards everything; [`Recorder`] logs every call into a
//! shared list so a headless run (or a test) can inspect what would have
//! played.

use std::sync::Arc;
use std::time::Duration;

use onara_core::Point;
use parking_lot::Mutex;

use crate::error::EffectResult;
use crate::shake::ShakeSink;
use crate::sound::SoundSink;
use crate::vibration::HapticSink;

/// Accepts and ignores every effect.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl SoundSink for NullSink {
    fn play(&mut self, _url: &str, _volume: f32) -> EffectResult<()> {
        Ok(())
    }
}

impl HapticSink for NullSink {
    fn vibrate(&mut self, _pattern: &[u32]) -> EffectResult<()> {
        Ok(())
    }
}

impl ShakeSink for NullSink {
    fn start(&mut self, _frames: &[Point; 11], _duration: Duration) -> EffectResult<()> {
        Ok(())
    }

    fn reset(&mut self) {}
}

/// One recorded effect call.
#[derive(Clone, Debug, PartialEq)]
pub enum EffectRecord {
    /// A clip started.
    Sound {
        /// Clip URL.
        url: String,
        /// Volume.
        volume: f32,
    },
    /// A vibration pattern started.
    Vibration(Vec<u32>),
    /// A shake started.
    Shake {
        /// Peak offset (frame 2 is `(i, -i)`).
        intensity: f32,
        /// Animation length.
        duration: Duration,
    },
    /// A running shake was cancelled.
    ShakeReset,
}

/// Records effect calls into a shared list. Clones share the list.
#[derive(Clone, Debug, Default)]
pub struct Recorder {
    log: Arc<Mutex<Vec<EffectRecord>>>,
}

impl Recorder {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copies out everything recorded so far.
    #[must_use]
    pub fn records(&self) -> Vec<EffectRecord> {
        self.log.lock().clone()
    }

    /// URLs of every clip played, in order.
    #[must_use]
    pub fn sounds(&self) -> Vec<String> {
        self.log
            .lock()
            .iter()
            .filter_map(|r| match r {
                EffectRecord::Sound { url, .. } => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    /// Drops all records.
    pub fn clear(&self) {
        self.log.lock().clear();
    }

    fn push(&self, record: EffectRecord) {
        self.log.lock().push(record);
    }
}

impl SoundSink for Recorder {
    fn play(&mut self, url: &str, volume: f32) -> EffectResult<()> {
        self.push(EffectRecord::Sound {
            url: url.to_string(),
            volume,
        });
        Ok(())
    }
}

impl HapticSink for Recorder {
    fn vibrate(&mut self, pattern: &[u32]) -> EffectResult<()> {
        self.push(EffectRecord::Vibration(pattern.to_vec()));
        Ok(())
    }
}

impl ShakeSink for Recorder {
    fn start(&mut self, frames: &[Point; 11], duration: Duration) -> EffectResult<()> {
        self.push(EffectRecord::Shake {
            intensity: frames[2].x,
            duration,
        });
        Ok(())
    }

    fn reset(&mut self) {
        self.push(EffectRecord::ShakeReset);
    }
}

/// The three output devices of a session.
pub struct EffectSinks {
    /// Audio.
    pub sound: Box<dyn SoundSink>,
    /// Vibration motor.
    pub haptic: Box<dyn HapticSink>,
    /// Shaken surface.
    pub shake: Box<dyn ShakeSink>,
}

impl EffectSinks {
    /// Sinks that discard everything.
    #[must_use]
    pub fn silent() -> Self {
        Self {
            sound: Box::new(NullSink),
            haptic: Box::new(NullSink),
            shake: Box::new(NullSink),
        }
    }

    /// All three sinks backed by one recorder.
    #[must_use]
    pub fn recording(recorder: &Recorder) -> Self {
        Self {
            sound: Box::new(recorder.clone()),
            haptic: Box::new(recorder.clone()),
            shake: Box::new(recorder.clone()),
        }
    }
}

impl std::fmt::Debug for EffectSinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectSinks").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shake::{ShakeProfile, Shaker};
    use crate::sound::play_with_fallback;

    #[test]
    fn test_recorder_clones_share_log() {
        let recorder = Recorder::new();
        let mut sinks = EffectSinks::recording(&recorder);

        play_with_fallback(sinks.sound.as_mut(), "/sounds/big1.mp3", 0.5);
        sinks.haptic.vibrate(&[50]).unwrap();
        let mut shaker = Shaker::new();
        shaker.shake(sinks.shake.as_mut(), ShakeProfile::new(4.0, 400), Duration::ZERO);

        assert_eq!(recorder.sounds(), vec!["/sounds/big1.mp3".to_string()]);
        assert_eq!(recorder.records().len(), 3);
        assert!(matches!(
            recorder.records()[2],
            EffectRecord::Shake { intensity, .. } if (intensity - 4.0).abs() < f32::EPSILON
        ));

        recorder.clear();
        assert!(recorder.records().is_empty());
    }
}
