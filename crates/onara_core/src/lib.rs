//! # ONARA Core
//!
//! Data model and burst planner for the ONARA smoke toy.
//!
//! A tap becomes a *burst*: each chosen spawn point emits up to
//! [`MAX_PARTICLES_PER_POINT`] particles along the trajectories of the
//! current [`Pattern`]. This crate computes those trajectories and the
//! delays at which particles appear; it never sleeps or touches a clock.
//!
//! ## Architecture Rules
//!
//! 1. **Pure planning** - timers and lifetimes live in the `onara` crate
//! 2. **Caller-owned randomness** - every draw takes `&mut impl Rng`
//! 3. **Validated inputs** - non-finite coordinates never reach a particle
//!
//! ## Example
//!
//! ```rust,ignore
//! use onara_core::{plan_burst, BurstRequest, ColorSettings, EffectSettings, Point};
//!
//! let settings = EffectSettings::default();
//! let colors = ColorSettings::default();
//! let plan = plan_burst(&BurstRequest { tap, settings: &settings, colors: &colors,
//!     points: &firing, repeats: 1 }, &mut rng)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod color;
pub mod error;
pub mod geometry;
pub mod particle;
pub mod pattern;
pub mod settings;
pub mod spawn;

pub use color::{BlendMode, Color, ColorSettings, PALETTE};
pub use error::{CoreError, CoreResult};
pub use geometry::{Point, Viewport};
pub use particle::{Particle, ParticleId, ParticleKind, ParticleSpec};
pub use pattern::{
    plan_burst, plan_pop_puffs, BurstPlan, BurstRequest, PlannedParticle, RING_RADIUS,
};
pub use settings::{
    DisplaySettings, EffectOptions, EffectSettings, OutputMode, Outputs, Pattern, Strength,
    MAX_PARTICLES_PER_POINT,
};
pub use spawn::{SpawnMode, SpawnPoint, SpawnPointId, SpawnPointSet, SpawnSelector};
