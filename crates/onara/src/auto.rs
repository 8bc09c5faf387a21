//! # Auto Emitter
//!
//! Fires a burst every `interval_secs` without user input. Each tick goes
//! through the same scheduler path as a tap, so it respects the
//! re-entrancy guard, and reschedules itself.
//!
//! Ticks carry a generation number. Stopping or reconfiguring the emitter
//! bumps the generation, which turns already-queued ticks into no-ops.

use std::time::Duration;

use onara_core::{Point, Viewport};
use onara_effects::SoundPolicy;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Allowed interval range in seconds.
pub const INTERVAL_RANGE: (u32, u32) = (1, 30);

/// Where autonomous bursts aim.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutoPosition {
    /// Anywhere in the viewport.
    #[default]
    Random,
    /// The viewport center.
    Center,
}

/// Auto emitter preferences.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoSettings {
    /// Running or not.
    pub enabled: bool,
    /// Seconds between bursts (1..=30).
    pub interval_secs: u32,
    /// Burst target.
    pub position: AutoPosition,
    /// Clip selection for autonomous bursts.
    pub sound_policy: SoundPolicy,
}

impl AutoSettings {
    /// Interval as a duration.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.interval_secs))
    }

    /// Returns a copy with the interval in range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.interval_secs = self.interval_secs.clamp(INTERVAL_RANGE.0, INTERVAL_RANGE.1);
        self
    }
}

impl Default for AutoSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_secs: 5,
            position: AutoPosition::Random,
            sound_policy: SoundPolicy::Current,
        }
    }
}

/// Generation-tagged periodic trigger.
#[derive(Debug, Default)]
pub struct AutoEmitter {
    settings: AutoSettings,
    generation: u64,
    ticks: u64,
}

impl AutoEmitter {
    /// Creates a stopped emitter.
    #[must_use]
    pub fn new(settings: AutoSettings) -> Self {
        Self {
            settings: settings.clamped(),
            generation: 0,
            ticks: 0,
        }
    }

    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &AutoSettings {
        &self.settings
    }

    /// Replaces the settings and invalidates queued ticks.
    ///
    /// Returns the first tick `(due, generation)` if the emitter is enabled.
    pub fn configure(&mut self, settings: AutoSettings, now: Duration) -> Option<(Duration, u64)> {
        self.settings = settings.clamped();
        self.generation += 1;
        debug!(enabled = self.settings.enabled, interval = self.settings.interval_secs, "auto emitter configured");
        self.next_tick(now)
    }

    /// Schedules after `now` if enabled.
    #[must_use]
    pub fn next_tick(&self, now: Duration) -> Option<(Duration, u64)> {
        self.settings
            .enabled
            .then(|| (now + self.settings.interval(), self.generation))
    }

    /// True if a tick of `generation` should still fire.
    #[must_use]
    pub fn accepts(&self, generation: u64) -> bool {
        self.settings.enabled && generation == self.generation
    }

    /// Counts a fired tick and returns its burst target.
    pub fn fire<R: Rng + ?Sized>(&mut self, viewport: &Viewport, rng: &mut R) -> Point {
        self.ticks += 1;
        match self.settings.position {
            AutoPosition::Random => viewport.random_point(rng),
            AutoPosition::Center => viewport.center(),
        }
    }

    /// Ticks fired so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}
