//! # Configuration
//!
//! One TOML document configures a session. Every section is optional and
//! falls back to its defaults; numeric values are pulled into their
//! documented ranges on load.
//!
//! ```toml
//! seed = 42
//! output_mode = "full"
//! spawn_mode = "sequential"
//!
//! [viewport]
//! width = 390.0
//! height = 844.0
//!
//! [effect]
//! pattern = "ring"
//! count = 12
//!
//! [sound]
//! genre = "big"
//! random_in_genre = true
//! burst_counts = { big2 = 3 }
//!
//! [auto]
//! enabled = true
//! interval_secs = 5
//! ```

use std::path::Path;

use onara_core::{
    ColorSettings, DisplaySettings, EffectSettings, OutputMode, SpawnMode, Viewport,
};
use onara_effects::SoundSettings;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auto::AutoSettings;
use crate::error::{SessionError, SessionResult};
use crate::events::DEFAULT_CAPACITY;

/// Complete session configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnaraConfig {
    /// RNG seed. `None` seeds from the wall clock.
    pub seed: Option<u64>,
    /// Which outputs bursts produce.
    pub output_mode: OutputMode,
    /// How firing spawn points are chosen.
    pub spawn_mode: SpawnMode,
    /// Scene event channel capacity.
    pub event_capacity: usize,
    /// Screen size.
    pub viewport: Viewport,
    /// Burst shape and timing.
    pub effect: EffectSettings,
    /// Smoke colors.
    pub colors: ColorSettings,
    /// Output toggles.
    pub display: DisplaySettings,
    /// Sound preferences.
    pub sound: SoundSettings,
    /// Autonomous bursts.
    pub auto: AutoSettings,
}

impl Default for OnaraConfig {
    fn default() -> Self {
        Self {
            seed: None,
            output_mode: OutputMode::default(),
            spawn_mode: SpawnMode::default(),
            event_capacity: DEFAULT_CAPACITY,
            viewport: Viewport::default(),
            effect: EffectSettings::default(),
            colors: ColorSettings::default(),
            display: DisplaySettings::default(),
            sound: SoundSettings::default(),
            auto: AutoSettings::default(),
        }
    }
}

impl OnaraConfig {
    /// Parses a TOML document and clamps it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ConfigParse`] on malformed TOML or unknown
    /// enum values.
    pub fn from_toml_str(text: &str) -> SessionResult<Self> {
        let config: Self = toml::from_str(text)?;
        Ok(config.clamped())
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ConfigIo`] if the file cannot be read, or
    /// [`SessionError::ConfigParse`] if it is not valid.
    pub fn from_file(path: impl AsRef<Path>) -> SessionResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SessionError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "config loaded");
        Ok(config)
    }

    /// Serializes back to TOML.
    ///
    /// # Errors
    ///
    /// Fails only if a value cannot be represented in TOML.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Returns a copy with every value in range.
    #[must_use]
    pub fn clamped(mut self) -> Self {
        let effect = self.effect.clamped();
        if effect != self.effect {
            warn!(requested = ?self.effect, "effect settings clamped into range");
        }
        self.effect = effect;

        if let Err(err) = self.viewport.validate() {
            warn!(%err, "invalid viewport, using the default");
            self.viewport = Viewport::default();
        }

        self.auto = self.auto.clamped();
        for count in self.sound.burst_counts.values_mut() {
            *count = (*count).clamp(1, 5);
        }
        self.event_capacity = self.event_capacity.max(1);
        self
    }
}
