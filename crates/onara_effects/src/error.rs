//! # Effect Error Types

use thiserror::Error;

/// Errors reported by effect sinks or the sound library.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EffectError {
    /// The audio backend refused to play a clip.
    #[error("playback rejected for {url}: {reason}")]
    PlaybackRejected {
        /// Clip that failed.
        url: String,
        /// Backend message.
        reason: String,
    },

    /// The device has no vibration motor (or refuses access).
    #[error("vibration unsupported on this device")]
    VibrationUnsupported,

    /// There is no surface to shake.
    #[error("shake target missing")]
    TargetMissing,

    /// A sound id did not name a library entry.
    #[error("unknown sound: {0:?}")]
    UnknownSound(String),
}

/// Result type for effect operations.
pub type EffectResult<T> = Result<T, EffectError>;
