//! # ONARA
//!
//! Tap the screen, get smoke. This crate is the headless engine behind the
//! toy: it owns the application [`Session`], schedules staggered particle
//! bursts through the [`EmissionScheduler`], keeps the live particle set in
//! a self-cleaning [`ParticleStore`] and fires sound, vibration and screen
//! shake through sink traits.
//!
//! ## Architecture
//!
//! ```text
//! tap ─> Session ─> EmissionScheduler ─> onara_core::plan_burst
//!           │               │
//!           │               └─> BurstPlan ─> TimerQueue ─> ParticleStore
//!           └─> onara_effects (sound / vibration / shake)
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use onara::{OnaraConfig, Session};
//! use onara_effects::EffectSinks;
//!
//! let mut session = Session::new(OnaraConfig::default(), EffectSinks::silent());
//! session.start(Duration::ZERO)?;
//! session.tap(120.0, 300.0, Duration::from_secs(1))?;
//! session.advance(Duration::from_secs(5));
//! assert_eq!(session.particle_count(), 0);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod auto;
pub mod config;
pub mod error;
pub mod events;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod store;
pub mod timer;

// Re-export the lower crates
pub use onara_core as core;
pub use onara_effects as effects;

pub use auto::{AutoEmitter, AutoPosition, AutoSettings};
pub use config::OnaraConfig;
pub use error::{SessionError, SessionResult};
pub use events::{EventBus, EventReceiver, EventSender, SceneEvent};
pub use runtime::{RunReport, Runtime, RuntimeHandle};
pub use scheduler::{BurstGuard, Emission, EmissionScheduler, GUARD_RELEASE_DELAY, STALE_GUARD_AFTER};
pub use session::{BurstOutcome, IgnoreReason, Session, SessionStats, SharedSession, TAP_DEBOUNCE};
pub use store::{LiveParticle, ParticleStore, StoreStats};
pub use timer::TimerQueue;
