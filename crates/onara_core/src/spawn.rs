//! # Spawn Points and Spawn Selection
//!
//! Spawn points are user-placed origins. Each burst fires from a subset of
//! the *active* points, chosen by the [`SpawnMode`]:
//!
//! | Mode | Points fired per burst |
//! |------|------------------------|
//! | [`SpawnMode::Simultaneous`] | every active point |
//! | [`SpawnMode::Sequential`] | one, round-robin via a persisted cursor |
//! | [`SpawnMode::Random`] | one, uniformly |
//! | [`SpawnMode::RandomMix`] | each with p = 0.5, at least one |

use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::Color;
use crate::error::{CoreError, CoreResult};
use crate::geometry::Point;

/// Spawn point identifier. Assigned from 1 upward, never reused.
pub type SpawnPointId = u32;

/// A user-placed particle origin.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Identifier.
    pub id: SpawnPointId,
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
    /// Start color of particles emitted here.
    pub color: Color,
    /// Inactive points never fire.
    pub active: bool,
}

impl SpawnPoint {
    /// Position as a [`Point`].
    #[inline]
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// The ordered collection of spawn points plus the id allocator.
#[derive(Clone, Debug, Default)]
pub struct SpawnPointSet {
    points: Vec<SpawnPoint>,
    next_id: SpawnPointId,
}

impl SpawnPointSet {
    /// Creates an empty set; the first id handed out is 1.
    #[must_use]
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            next_id: 1,
        }
    }

    /// Adds an active point and returns its id.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NonFiniteCoordinate`] if `at` is not finite.
    pub fn add(&mut self, at: Point, color: Color) -> CoreResult<SpawnPointId> {
        let at = at.ensure_finite()?;
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.points.push(SpawnPoint {
            id,
            x: at.x,
            y: at.y,
            color,
            active: true,
        });
        debug!(id, x = at.x, y = at.y, "spawn point added");
        Ok(id)
    }

    /// Moves a point (drag).
    ///
    /// # Errors
    ///
    /// Fails if `to` is not finite or no point has `id`.
    pub fn move_to(&mut self, id: SpawnPointId, to: Point) -> CoreResult<()> {
        let to = to.ensure_finite()?;
        let point = self.get_mut(id)?;
        point.x = to.x;
        point.y = to.y;
        Ok(())
    }

    /// Changes a point's color.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SpawnPointNotFound`] if no point has `id`.
    pub fn set_color(&mut self, id: SpawnPointId, color: Color) -> CoreResult<()> {
        self.get_mut(id)?.color = color;
        Ok(())
    }

    /// Enables or disables a point.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SpawnPointNotFound`] if no point has `id`.
    pub fn set_active(&mut self, id: SpawnPointId, active: bool) -> CoreResult<()> {
        self.get_mut(id)?.active = active;
        Ok(())
    }

    /// Enables or disables every point.
    pub fn set_all_active(&mut self, active: bool) {
        for point in &mut self.points {
            point.active = active;
        }
    }

    /// Removes a point.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SpawnPointNotFound`] if no point has `id`.
    pub fn remove(&mut self, id: SpawnPointId) -> CoreResult<SpawnPoint> {
        let index = self
            .points
            .iter()
            .position(|p| p.id == id)
            .ok_or(CoreError::SpawnPointNotFound(id))?;
        debug!(id, "spawn point removed");
        Ok(self.points.remove(index))
    }

    /// Removes every point. Ids keep counting upward.
    pub fn clear(&mut self) {
        self.points.clear();
        debug!("all spawn points removed");
    }

    /// Looks up a point.
    #[must_use]
    pub fn get(&self, id: SpawnPointId) -> Option<&SpawnPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    fn get_mut(&mut self, id: SpawnPointId) -> CoreResult<&mut SpawnPoint> {
        self.points
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(CoreError::SpawnPointNotFound(id))
    }

    /// All points in insertion order.
    #[must_use]
    pub fn all(&self) -> &[SpawnPoint] {
        &self.points
    }

    /// Active points in insertion order.
    pub fn active(&self) -> impl Iterator<Item = &SpawnPoint> {
        self.points.iter().filter(|p| p.active)
    }

    /// Number of points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// True if there are no points at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// How the firing points of a burst are chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SpawnMode {
    /// All active points.
    #[default]
    Simultaneous,
    /// One point per burst, in order, wrapping.
    Sequential,
    /// One uniformly random point.
    Random,
    /// Each point independently with probability 0.5, never none.
    #[serde(alias = "randomMix")]
    RandomMix,
}

impl FromStr for SpawnMode {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "simultaneous" => Ok(Self::Simultaneous),
            "sequential" => Ok(Self::Sequential),
            "random" => Ok(Self::Random),
            "random-mix" | "randomMix" => Ok(Self::RandomMix),
            other => Err(CoreError::UnknownVariant {
                kind: "spawn mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Picks firing points; owns the sequential cursor.
///
/// The cursor is the id of the point that fired last, so edits to the set
/// between bursts never skip or repeat a point.
#[derive(Clone, Debug, Default)]
pub struct SpawnSelector {
    last_fired: Option<SpawnPointId>,
}

impl SpawnSelector {
    /// Creates a selector that starts at the lowest id.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_fired: None }
    }

    /// Id of the point the sequential mode fired last.
    #[must_use]
    pub const fn last_fired(&self) -> Option<SpawnPointId> {
        self.last_fired
    }

    /// Chooses which of `active` fire this burst.
    ///
    /// Returns an empty vector only when `active` is empty.
    pub fn select<R: Rng + ?Sized>(
        &mut self,
        mode: SpawnMode,
        active: &[SpawnPoint],
        rng: &mut R,
    ) -> Vec<SpawnPoint> {
        if active.is_empty() {
            return Vec::new();
        }

        match mode {
            SpawnMode::Simultaneous => active.to_vec(),
            SpawnMode::Sequential => {
                // Ids only grow, so id order is stable across edits
                let after = |p: &&SpawnPoint| self.last_fired.map_or(true, |last| p.id > last);
                let next = active
                    .iter()
                    .filter(after)
                    .min_by_key(|p| p.id)
                    .or_else(|| active.iter().min_by_key(|p| p.id));
                match next {
                    Some(point) => {
                        self.last_fired = Some(point.id);
                        vec![point.clone()]
                    }
                    None => Vec::new(),
                }
            }
            SpawnMode::Random => vec![active[rng.gen_range(0..active.len())].clone()],
            SpawnMode::RandomMix => {
                let picked: Vec<SpawnPoint> = active
                    .iter()
                    .filter(|_| rng.gen_bool(0.5))
                    .cloned()
                    .collect();
                if picked.is_empty() {
                    vec![active[rng.gen_range(0..active.len())].clone()]
                } else {
                    picked
                }
            }
        }
    }
}
