//! # Session Error Types

use std::path::PathBuf;

use onara_core::CoreError;
use thiserror::Error;

/// Errors surfaced by the session, configuration and runtime.
#[derive(Error, Debug)]
pub enum SessionError {
    /// A previous burst failed; call `reload()` first.
    #[error("session is faulted; reload to continue")]
    Faulted,

    /// Burst generation or a model edit failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The configuration file could not be read.
    #[error("cannot read config {path}: {source}")]
    ConfigIo {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration text is not valid TOML for this schema.
    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The runtime input channel closed.
    #[error("runtime input channel closed")]
    ChannelClosed,

    /// The tokio runtime could not be built or the driver task failed.
    #[error("runtime failure: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
