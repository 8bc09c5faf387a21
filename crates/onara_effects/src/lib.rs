//! # ONARA Effects
//!
//! Everything a burst does besides particles: a sound clip, a vibration
//! pattern and a screen shake. The patterns are pure data; the devices sit
//! behind [`SoundSink`], [`HapticSink`] and [`ShakeSink`].
//!
//! Effects are fire-and-forget. Helpers like [`play_with_fallback`],
//! [`vibrate`] and [`Shaker::shake`] log failures with `tracing::warn!` and
//! return normally.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod shake;
pub mod sinks;
pub mod sound;
pub mod vibration;

pub use error::{EffectError, EffectResult};
pub use shake::{keyframes, ShakeProfile, ShakeSink, Shaker};
pub use sinks::{EffectRecord, EffectSinks, NullSink, Recorder};
pub use sound::{
    play_with_fallback, Genre, Sound, SoundId, SoundLibrary, SoundPolicy, SoundSettings,
    SoundSink, FALLBACK_URL, PLAYBACK_VOLUME, PREVIEW_VOLUME,
};
pub use vibration::{pattern_for, vibrate, HapticSink};
