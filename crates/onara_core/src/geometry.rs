//! Screen-space geometry.
//!
//! Coordinates are CSS-style pixels: origin top-left, `y` grows downward,
//! so an angle of `-PI/2` points straight up.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A point in screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels).
    pub x: f32,
    /// Vertical position (pixels, downward).
    pub y: f32,
}

impl Point {
    /// Creates a new point.
    #[inline]
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Returns true if both components are finite.
    #[inline]
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Returns the point unchanged, or an error if it is not finite.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NonFiniteCoordinate`] for NaN or infinite input.
    pub fn ensure_finite(self) -> CoreResult<Self> {
        if self.is_finite() {
            Ok(self)
        } else {
            Err(CoreError::NonFiniteCoordinate {
                x: self.x,
                y: self.y,
            })
        }
    }

    /// Returns the point `distance` away along `angle` (radians).
    #[inline]
    #[must_use]
    pub fn polar_offset(self, angle: f32, distance: f32) -> Self {
        Self::new(
            self.x + angle.cos() * distance,
            self.y + angle.sin() * distance,
        )
    }

    /// Euclidean distance to `other`.
    #[inline]
    #[must_use]
    pub fn distance_to(self, other: Self) -> f32 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// Angle (radians) of the vector from `self` to `other`.
    #[inline]
    #[must_use]
    pub fn angle_to(self, other: Self) -> f32 {
        (other.y - self.y).atan2(other.x - self.x)
    }

    /// Linear interpolation towards `other` (`t` in 0..=1).
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

/// The visible area that taps and spawn points live in.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
}

impl Viewport {
    /// Distance above the bottom edge of the default spawn point.
    pub const SPAWN_MARGIN: f32 = 100.0;

    /// Creates a viewport.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Checks that both sides are finite and positive.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OutOfRange`] naming the first bad side.
    pub fn validate(&self) -> CoreResult<()> {
        for (name, value) in [("viewport width", self.width), ("viewport height", self.height)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CoreError::OutOfRange {
                    name,
                    value,
                    min: f32::MIN_POSITIVE,
                    max: f32::MAX,
                });
            }
        }
        Ok(())
    }

    /// Center of the viewport.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.width / 2.0, self.height / 2.0)
    }

    /// Where the first (and any emergency) spawn point goes:
    /// horizontally centered, just above the bottom edge.
    #[must_use]
    pub fn default_spawn(&self) -> Point {
        Point::new(self.width / 2.0, self.height - Self::SPAWN_MARGIN)
    }

    /// A uniformly random point inside the viewport.
    pub fn random_point<R: Rng + ?Sized>(&self, rng: &mut R) -> Point {
        Point::new(
            rng.gen::<f32>() * self.width,
            rng.gen::<f32>() * self.height,
        )
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(390.0, 844.0)
    }
}
