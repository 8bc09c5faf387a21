//! # Colors and Blend Modes
//!
//! Particles are drawn in a start color and fade towards an end color.
//! The start color comes from the spawn point; the end color is picked by
//! the [`BlendMode`].

use std::fmt;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A validated `#rrggbb` color.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(String);

impl Color {
    /// Parses a `#rrggbb` color (case-insensitive, stored lowercase).
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidColor`] if the text is not a 6-digit hex
    /// color with a leading `#`.
    pub fn parse(text: &str) -> CoreResult<Self> {
        let digits = text
            .strip_prefix('#')
            .filter(|d| d.len() == 6 && d.chars().all(|c| c.is_ascii_hexdigit()))
            .ok_or_else(|| CoreError::InvalidColor(text.to_string()))?;
        Ok(Self(format!("#{}", digits.to_ascii_lowercase())))
    }

    /// The color as `#rrggbb`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The color as `[r, g, b]` bytes.
    #[must_use]
    pub fn rgb(&self) -> [u8; 3] {
        let hex = &self.0[1..];
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).unwrap_or(0);
        [channel(0), channel(2), channel(4)]
    }

    /// Default smoke yellow.
    #[must_use]
    pub fn main_default() -> Self {
        Self("#ffeb3b".to_string())
    }

    /// Default accent orange.
    #[must_use]
    pub fn sub_default() -> Self {
        Self("#ff9800".to_string())
    }

    /// Bright yellow used for bubble pop puffs.
    #[must_use]
    pub fn pop_yellow() -> Self {
        Self("#ffff00".to_string())
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Color {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Color {
    type Error = CoreError;

    fn try_from(value: String) -> CoreResult<Self> {
        Self::parse(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.0
    }
}

/// The spawn-point color picker palette.
pub const PALETTE: [&str; 20] = [
    "#ff0000", "#ff4500", "#ffa500", "#ffff00", "#ffeb3b",
    "#00ff00", "#00fa9a", "#00ffff", "#00bfff", "#0000ff",
    "#8a2be2", "#9400d3", "#ff00ff", "#ff69b4", "#ff1493",
    "#ffffff", "#c0c0c0", "#808080", "#404040", "#000000",
];

/// How a particle's end color is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlendMode {
    /// Fade from the start color to the sub color.
    #[default]
    Gradient,
    /// End on the main or sub color, picked at random.
    Random,
    /// Keep the start color.
    Stripe,
    /// Same end color as gradient; the renderer pulses the transition.
    Pulse,
}

impl FromStr for BlendMode {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "gradient" => Ok(Self::Gradient),
            "random" => Ok(Self::Random),
            "stripe" => Ok(Self::Stripe),
            "pulse" => Ok(Self::Pulse),
            other => Err(CoreError::UnknownVariant {
                kind: "blend mode",
                value: other.to_string(),
            }),
        }
    }
}

/// Global smoke colors.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorSettings {
    /// Primary smoke color; new spawn points start with it.
    pub main_color: Color,
    /// Secondary color used by gradient, pulse and random blending.
    pub sub_color: Color,
    /// End-color rule.
    pub blend_mode: BlendMode,
}

impl ColorSettings {
    /// Resolves the end color of a particle that starts at `start`.
    pub fn end_color<R: Rng + ?Sized>(&self, start: &Color, rng: &mut R) -> Color {
        match self.blend_mode {
            BlendMode::Gradient | BlendMode::Pulse => self.sub_color.clone(),
            BlendMode::Random => {
                if rng.gen_bool(0.5) {
                    self.main_color.clone()
                } else {
                    self.sub_color.clone()
                }
            }
            BlendMode::Stripe => start.clone(),
        }
    }
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            main_color: Color::main_default(),
            sub_color: Color::sub_default(),
            blend_mode: BlendMode::Gradient,
        }
    }
}
