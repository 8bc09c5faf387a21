//! # Effect, Display and Output Settings
//!
//! Settings are immutable snapshots: the scheduler copies the current
//! [`EffectSettings`] at the start of a burst and never looks back.
//!
//! Every numeric field has a documented range. [`EffectSettings::validate`]
//! rejects values outside it; [`EffectSettings::clamped`] pulls them in.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Hard cap on particles emitted per spawn point per burst.
pub const MAX_PARTICLES_PER_POINT: u32 = 15;

/// Trajectory rule for a burst.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pattern {
    /// Spray towards the tap position with a small jitter.
    #[default]
    Normal,
    /// Random directions, random distances.
    Explosion,
    /// Angle and radius grow with the particle index.
    Spiral,
    /// Upward cone.
    Fountain,
    /// Evenly spaced on a fixed-radius circle, all at once.
    Ring,
    /// Rising bubbles that may pop into small puffs.
    Bubble,
    /// Layered, blurred rings.
    Cloud,
}

impl Pattern {
    /// All patterns, in menu order.
    pub const ALL: [Self; 7] = [
        Self::Normal,
        Self::Explosion,
        Self::Spiral,
        Self::Fountain,
        Self::Ring,
        Self::Bubble,
        Self::Cloud,
    ];

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Explosion => "explosion",
            Self::Spiral => "spiral",
            Self::Fountain => "fountain",
            Self::Ring => "ring",
            Self::Bubble => "bubble",
            Self::Cloud => "cloud",
        }
    }

    /// Delay between consecutive particles of one spawn point, in ms.
    ///
    /// Cloud staggers by layer instead, see [`Pattern::CLOUD_LAYER_DELAY_MS`].
    #[must_use]
    pub const fn stagger_ms(self) -> u64 {
        match self {
            Self::Normal => 20,
            Self::Explosion => 30,
            Self::Spiral => 80,
            Self::Fountain => 60,
            Self::Bubble => 50,
            Self::Ring | Self::Cloud => 0,
        }
    }

    /// Delay between cloud layers, in ms.
    pub const CLOUD_LAYER_DELAY_MS: u64 = 120;
}

impl FromStr for Pattern {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| CoreError::UnknownVariant {
                kind: "pattern",
                value: s.to_string(),
            })
    }
}

/// Per-pattern option flags.
///
/// Only bubble and cloud interpret them; every particle carries a copy so
/// a renderer can use them too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectOptions {
    /// Denser clouds.
    pub fade: bool,
    /// Clouds rise, outer layers higher.
    pub gravity: bool,
    /// Heavier cloud blur.
    pub pulsate: bool,
    /// Bubbles pop; clouds get five layers instead of three.
    pub trail: bool,
}

impl Default for EffectOptions {
    fn default() -> Self {
        Self {
            fade: true,
            gravity: false,
            pulsate: false,
            trail: false,
        }
    }
}

/// Burst shape and timing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectSettings {
    /// Trajectory rule.
    pub pattern: Pattern,
    /// Requested particles per spawn point (capped at 15).
    pub count: u32,
    /// Base particle size in pixels (10..=150).
    pub size: f32,
    /// Travel speed multiplier (0.2..=3.0).
    pub speed: f32,
    /// Particle lifetime in seconds (0.5..=10.0).
    pub duration: f32,
    /// Gap between repeated bursts in ms (100..=1000).
    pub burst_interval_ms: u32,
    /// Stagger compression for repeated bursts (0.5..=3.0).
    pub burst_speed: f32,
    /// Option flags.
    pub options: EffectOptions,
}

impl EffectSettings {
    /// Allowed size range.
    pub const SIZE_RANGE: (f32, f32) = (10.0, 150.0);
    /// Allowed speed range.
    pub const SPEED_RANGE: (f32, f32) = (0.2, 3.0);
    /// Allowed duration range (seconds).
    pub const DURATION_RANGE: (f32, f32) = (0.5, 10.0);
    /// Allowed burst interval range (ms).
    pub const BURST_INTERVAL_RANGE: (u32, u32) = (100, 1000);
    /// Allowed burst speed range.
    pub const BURST_SPEED_RANGE: (f32, f32) = (0.5, 3.0);

    /// Particles actually emitted per spawn point: `min(count, 15)`.
    #[inline]
    #[must_use]
    pub fn effective_count(&self) -> u32 {
        self.count.min(MAX_PARTICLES_PER_POINT)
    }

    /// Particle lifetime.
    #[must_use]
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs_f32(self.duration)
    }

    /// Stagger delay for particle `index` of `pattern`, scaled by burst speed.
    #[must_use]
    pub fn stagger(&self, index: u32) -> Duration {
        let nanos = self.pattern.stagger_ms() * u64::from(index) * 1_000_000;
        Duration::from_nanos((nanos as f64 / f64::from(self.burst_speed)).round() as u64)
    }

    /// Checks every field against its range.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::OutOfRange`] for the first field that is out
    /// of range or not finite.
    pub fn validate(&self) -> CoreResult<()> {
        check("size", self.size, Self::SIZE_RANGE)?;
        check("speed", self.speed, Self::SPEED_RANGE)?;
        check("duration", self.duration, Self::DURATION_RANGE)?;
        check("burst_speed", self.burst_speed, Self::BURST_SPEED_RANGE)?;
        let (lo, hi) = Self::BURST_INTERVAL_RANGE;
        check(
            "burst_interval_ms",
            self.burst_interval_ms as f32,
            (lo as f32, hi as f32),
        )?;
        if self.count == 0 {
            return Err(CoreError::OutOfRange {
                name: "count",
                value: 0.0,
                min: 1.0,
                max: MAX_PARTICLES_PER_POINT as f32,
            });
        }
        Ok(())
    }

    /// Returns a copy with every field pulled into range.
    ///
    /// Non-finite values fall back to the default for that field.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        let d = Self::default();
        self.size = clamp_or(self.size, Self::SIZE_RANGE, d.size);
        self.speed = clamp_or(self.speed, Self::SPEED_RANGE, d.speed);
        self.duration = clamp_or(self.duration, Self::DURATION_RANGE, d.duration);
        self.burst_speed = clamp_or(self.burst_speed, Self::BURST_SPEED_RANGE, d.burst_speed);
        let (lo, hi) = Self::BURST_INTERVAL_RANGE;
        self.burst_interval_ms = self.burst_interval_ms.clamp(lo, hi);
        self.count = self.count.clamp(1, MAX_PARTICLES_PER_POINT);
        self
    }
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self {
            pattern: Pattern::Normal,
            count: 8,
            size: 50.0,
            speed: 1.0,
            duration: 3.0,
            burst_interval_ms: 400,
            burst_speed: 1.0,
            options: EffectOptions::default(),
        }
    }
}

fn check(name: &'static str, value: f32, (min, max): (f32, f32)) -> CoreResult<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(CoreError::OutOfRange {
            name,
            value,
            min,
            max,
        })
    }
}

fn clamp_or(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Which outputs a burst produces.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Sound, smoke and vibration.
    #[default]
    Full,
    /// Sound and vibration, no smoke.
    SoundOnly,
    /// Vibration only.
    VibrationOnly,
}

impl OutputMode {
    /// Whether particles are emitted.
    #[must_use]
    pub const fn smoke(self) -> bool {
        matches!(self, Self::Full)
    }

    /// Whether the sound plays.
    #[must_use]
    pub const fn sound(self) -> bool {
        matches!(self, Self::Full | Self::SoundOnly)
    }
}

/// Named strength preset shared by device vibration and screen shake.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    /// Barely there.
    Subtle,
    /// One short pulse.
    Short,
    /// The default.
    #[default]
    Medium,
    /// Long rumble.
    Long,
    /// Everything at once.
    Explosive,
    /// One of the above, picked per burst.
    Random,
}

impl Strength {
    /// The five concrete presets (everything but [`Strength::Random`]).
    pub const CONCRETE: [Self; 5] = [
        Self::Subtle,
        Self::Short,
        Self::Medium,
        Self::Long,
        Self::Explosive,
    ];
}

/// Toggles for the individual outputs, layered on top of [`OutputMode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    /// Emit particles.
    pub show_smoke: bool,
    /// Play the sound effect.
    pub play_sound: bool,
    /// Vibrate the device.
    pub vibration: bool,
    /// Shake the screen.
    pub screen_shake: bool,
    /// Device vibration preset.
    pub vibration_strength: Strength,
    /// Screen shake preset.
    pub shake_strength: Strength,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_smoke: true,
            play_sound: true,
            vibration: false,
            screen_shake: false,
            vibration_strength: Strength::Medium,
            shake_strength: Strength::Medium,
        }
    }
}

/// What one burst should actually do, after combining mode and toggles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outputs {
    /// Emit particles.
    pub smoke: bool,
    /// Play sound.
    pub sound: bool,
    /// Vibrate the device.
    pub vibration: bool,
    /// Shake the screen.
    pub shake: bool,
}

impl Outputs {
    /// Combines the output mode, the display toggles and the mute switch.
    ///
    /// Every mode keeps haptics; only smoke and sound are mode-gated.
    #[must_use]
    pub fn resolve(mode: OutputMode, display: &DisplaySettings, sound_on: bool) -> Self {
        Self {
            smoke: mode.smoke() && display.show_smoke,
            sound: mode.sound() && display.play_sound && sound_on,
            vibration: display.vibration,
            shake: display.screen_shake,
        }
    }
}
