//! # Particles
//!
//! A particle is created once and never mutated. It travels from its origin
//! to its target over its transition time, fading out, and is removed from
//! the store when its lifetime runs out.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::geometry::Point;
use crate::settings::EffectOptions;
use crate::spawn::SpawnPointId;

/// Unique particle identifier (monotonic per session).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticleId(pub u64);

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "particle-{}", self.0)
    }
}

/// Variant-specific rendering flags.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ParticleKind {
    /// Standard smoke puff; grows to 1.5x while fading.
    Smoke,
    /// Rising bubble; may pop into [`ParticleKind::PopPuff`]s.
    Bubble,
    /// Blurred cloud layer particle; scales to 1.8x.
    Cloud {
        /// Blur radius in pixels.
        blur: f32,
    },
    /// Short-lived yellow puff left behind by a popped bubble; scales to 2x.
    PopPuff,
}

impl ParticleKind {
    /// Scale factor reached at the end of the transition.
    #[must_use]
    pub const fn end_scale(self) -> f32 {
        match self {
            Self::Smoke | Self::Bubble => 1.5,
            Self::Cloud { .. } => 1.8,
            Self::PopPuff => 2.0,
        }
    }

    /// Blur radius in pixels.
    #[must_use]
    pub const fn blur(self) -> f32 {
        match self {
            Self::Smoke | Self::Bubble => 5.0,
            Self::Cloud { blur } => blur,
            Self::PopPuff => 8.0,
        }
    }
}

/// Everything about a particle except its id.
#[derive(Clone, Debug, PartialEq)]
pub struct ParticleSpec {
    /// Where it starts.
    pub origin: Point,
    /// Where it ends.
    pub target: Point,
    /// Diameter in pixels at creation.
    pub size: f32,
    /// Opacity at creation (fades to 0).
    pub opacity: f32,
    /// Time until removal from the store.
    pub lifetime: Duration,
    /// Time to travel from origin to target.
    pub transition: Duration,
    /// Rendering variant.
    pub kind: ParticleKind,
    /// Color at creation.
    pub start_color: Color,
    /// Color at the end of the transition.
    pub end_color: Color,
    /// Option flags of the burst that created it.
    pub options: EffectOptions,
    /// Spawn point that emitted it (`None` for pop puffs).
    pub spawn_point: Option<SpawnPointId>,
}

impl ParticleSpec {
    /// Attaches an id.
    #[must_use]
    pub fn into_particle(self, id: ParticleId) -> Particle {
        Particle { id, spec: self }
    }
}

/// A live particle.
#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    /// Identifier.
    pub id: ParticleId,
    /// Immutable description.
    pub spec: ParticleSpec,
}

impl Particle {
    /// Transition progress in 0..=1 after `elapsed` time alive.
    #[must_use]
    pub fn progress(&self, elapsed: Duration) -> f32 {
        let total = self.spec.transition.as_secs_f32();
        if total <= 0.0 {
            return 1.0;
        }
        (elapsed.as_secs_f32() / total).clamp(0.0, 1.0)
    }

    /// On-screen position after `elapsed` time alive (ease-out).
    #[must_use]
    pub fn position_at(&self, elapsed: Duration) -> Point {
        let t = self.progress(elapsed);
        let eased = 1.0 - (1.0 - t) * (1.0 - t);
        self.spec.origin.lerp(self.spec.target, eased)
    }

    /// Opacity after `elapsed` time alive (linear fade to zero).
    #[must_use]
    pub fn opacity_at(&self, elapsed: Duration) -> f32 {
        self.spec.opacity * (1.0 - self.progress(elapsed))
    }

    /// Diameter after `elapsed` time alive.
    #[must_use]
    pub fn size_at(&self, elapsed: Duration) -> f32 {
        let t = self.progress(elapsed);
        self.spec.size * (1.0 + (self.spec.kind.end_scale() - 1.0) * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn particle(kind: ParticleKind) -> Particle {
        ParticleSpec {
            origin: Point::new(0.0, 0.0),
            target: Point::new(100.0, 0.0),
            size: 40.0,
            opacity: 0.7,
            lifetime: Duration::from_secs(2),
            transition: Duration::from_secs(2),
            kind,
            start_color: Color::main_default(),
            end_color: Color::sub_default(),
            options: EffectOptions::default(),
            spawn_point: Some(1),
        }
        .into_particle(ParticleId(1))
    }

    #[test]
    fn test_position_endpoints() {
        let p = particle(ParticleKind::Smoke);
        assert_eq!(p.position_at(Duration::ZERO), Point::new(0.0, 0.0));
        assert_eq!(p.position_at(Duration::from_secs(5)), Point::new(100.0, 0.0));
    }

    #[test]
    fn test_ease_out_is_ahead_of_linear() {
        let p = particle(ParticleKind::Smoke);
        let mid = p.position_at(Duration::from_secs(1));
        assert!((mid.x - 75.0).abs() < 1e-3);
    }

    #[test]
    fn test_fade_and_growth() {
        let p = particle(ParticleKind::Cloud { blur: 10.0 });
        assert!((p.opacity_at(Duration::from_secs(1)) - 0.35).abs() < 1e-5);
        assert!((p.size_at(Duration::from_secs(2)) - 72.0).abs() < 1e-3);
        assert_eq!(p.spec.kind.blur(), 10.0);
    }

    #[test]
    fn test_display_id() {
        assert_eq!(ParticleId(42).to_string(), "particle-42");
    }
}
