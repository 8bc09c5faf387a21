//! # Core Error Types
//!
//! All errors that can occur while editing the model or planning a burst.

use thiserror::Error;

/// Errors that can occur in the core model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A color string was not of the form `#rrggbb`.
    #[error("invalid color: {0:?} (expected #rrggbb)")]
    InvalidColor(String),

    /// A coordinate was NaN or infinite.
    #[error("non-finite coordinate: ({x}, {y})")]
    NonFiniteCoordinate {
        /// Horizontal component.
        x: f32,
        /// Vertical component.
        y: f32,
    },

    /// A numeric setting was outside its allowed range.
    #[error("setting `{name}` = {value} outside {min}..={max}")]
    OutOfRange {
        /// Setting name.
        name: &'static str,
        /// Offending value.
        value: f32,
        /// Lower bound.
        min: f32,
        /// Upper bound.
        max: f32,
    },

    /// No spawn point with the given id exists.
    #[error("spawn point not found: {0}")]
    SpawnPointNotFound(u32),

    /// An unknown name was used where an enumerated value was expected.
    #[error("unknown {kind}: {value:?}")]
    UnknownVariant {
        /// What was being parsed.
        kind: &'static str,
        /// The text that did not match.
        value: String,
    },
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
