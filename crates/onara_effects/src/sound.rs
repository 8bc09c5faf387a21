//! # Sound Library
//!
//! Sounds are grouped into genres and addressed as `<genre><n>`, e.g.
//! `small3`, served from `/sounds/<id>.mp3`. Each sound carries a burst
//! count (1-5): how many times the burst repeats when it is the chosen clip.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EffectError, EffectResult};

/// Played when the chosen clip fails.
pub const FALLBACK_URL: &str = "/sounds/pop1.mp3";
/// Volume for burst playback.
pub const PLAYBACK_VOLUME: f32 = 0.5;
/// Volume for previews from the settings panel.
pub const PREVIEW_VOLUME: f32 = 0.3;
/// Allowed burst counts.
pub const BURST_COUNT_RANGE: (u32, u32) = (1, 5);

/// Sound genre.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    /// Light and quick.
    Small,
    /// The default.
    #[default]
    Medium,
    /// Loud.
    Big,
    /// Wet.
    Dirty,
    /// Silent but deadly.
    Sneaky,
}

impl Genre {
    /// All genres in menu order.
    pub const ALL: [Self; 5] = [
        Self::Small,
        Self::Medium,
        Self::Big,
        Self::Dirty,
        Self::Sneaky,
    ];

    /// Lowercase name, also the sound id prefix.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Small => "small",
            Self::Medium => "medium",
            Self::Big => "big",
            Self::Dirty => "dirty",
            Self::Sneaky => "sneaky",
        }
    }

    /// Number of clips in the genre.
    #[must_use]
    pub const fn clip_count(self) -> u8 {
        match self {
            Self::Small => 15,
            Self::Medium => 17,
            Self::Big => 10,
            Self::Dirty => 14,
            Self::Sneaky => 4,
        }
    }
}

/// Identifies one clip: genre plus 1-based index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SoundId {
    /// Genre.
    pub genre: Genre,
    /// 1-based index within the genre.
    pub index: u8,
}

impl SoundId {
    /// Builds an id, checking the index against the genre size.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::UnknownSound`] when `index` is 0 or past the
    /// end of the genre.
    pub fn new(genre: Genre, index: u8) -> EffectResult<Self> {
        if index == 0 || index > genre.clip_count() {
            return Err(EffectError::UnknownSound(format!("{}{index}", genre.name())));
        }
        Ok(Self { genre, index })
    }

    /// Asset URL.
    #[must_use]
    pub fn url(self) -> String {
        format!("/sounds/{self}.mp3")
    }
}

impl Default for SoundId {
    fn default() -> Self {
        Self {
            genre: Genre::Small,
            index: 1,
        }
    }
}

impl fmt::Display for SoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.genre.name(), self.index)
    }
}

impl FromStr for SoundId {
    type Err = EffectError;

    fn from_str(s: &str) -> EffectResult<Self> {
        let unknown = || EffectError::UnknownSound(s.to_string());
        let genre = Genre::ALL
            .into_iter()
            .find(|g| s.starts_with(g.name()))
            .ok_or_else(unknown)?;
        let index: u8 = s[genre.name().len()..].parse().map_err(|_| unknown())?;
        Self::new(genre, index)
    }
}

impl TryFrom<String> for SoundId {
    type Error = EffectError;

    fn try_from(value: String) -> EffectResult<Self> {
        value.parse()
    }
}

impl From<SoundId> for String {
    fn from(id: SoundId) -> Self {
        id.to_string()
    }
}

/// Which clip a burst plays.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SoundPolicy {
    /// The selected clip.
    #[default]
    Current,
    /// Any clip of the selected genre.
    GenreRandom,
    /// Any clip at all.
    AllRandom,
}

/// User sound preferences.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundSettings {
    /// Master switch.
    pub enabled: bool,
    /// Selected clip.
    pub selected: SoundId,
    /// Selected genre.
    pub genre: Genre,
    /// Pick a random clip of `genre` instead of `selected`.
    pub random_in_genre: bool,
    /// Burst counts that differ from 1, keyed by sound id.
    pub burst_counts: HashMap<SoundId, u32>,
}

impl SoundSettings {
    /// The policy taps use.
    #[must_use]
    pub const fn tap_policy(&self) -> SoundPolicy {
        if self.random_in_genre {
            SoundPolicy::GenreRandom
        } else {
            SoundPolicy::Current
        }
    }
}

impl Default for SoundSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            selected: SoundId::default(),
            genre: Genre::Medium,
            random_in_genre: false,
            burst_counts: HashMap::new(),
        }
    }
}

/// A catalogued clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sound {
    /// Identifier.
    pub id: SoundId,
    /// Burst repeats, 1-5.
    pub burst_count: u32,
}

/// Every known clip with its burst count.
#[derive(Clone, Debug)]
pub struct SoundLibrary {
    sounds: Vec<Sound>,
}

impl SoundLibrary {
    /// The full catalogue with every burst count at 1.
    #[must_use]
    pub fn new() -> Self {
        let sounds = Genre::ALL
            .into_iter()
            .flat_map(|genre| {
                (1..=genre.clip_count()).map(move |index| Sound {
                    id: SoundId { genre, index },
                    burst_count: 1,
                })
            })
            .collect();
        Self { sounds }
    }

    /// Catalogue with the burst counts from `settings` applied.
    #[must_use]
    pub fn with_settings(settings: &SoundSettings) -> Self {
        let mut library = Self::new();
        for (&id, &count) in &settings.burst_counts {
            library.set_burst_count(id, count);
        }
        library
    }

    /// Number of clips.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    /// True if the catalogue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// All clips of a genre.
    pub fn genre(&self, genre: Genre) -> impl Iterator<Item = &Sound> {
        self.sounds.iter().filter(move |s| s.id.genre == genre)
    }

    /// Looks up a clip.
    #[must_use]
    pub fn get(&self, id: SoundId) -> Option<&Sound> {
        self.sounds.iter().find(|s| s.id == id)
    }

    /// Burst count of a clip (1 for unknown ids).
    #[must_use]
    pub fn burst_count(&self, id: SoundId) -> u32 {
        self.get(id).map_or(1, |s| s.burst_count)
    }

    /// Sets a clip's burst count, clamped to 1-5. Returns the stored value.
    pub fn set_burst_count(&mut self, id: SoundId, count: u32) -> u32 {
        let count = count.clamp(BURST_COUNT_RANGE.0, BURST_COUNT_RANGE.1);
        if let Some(sound) = self.sounds.iter_mut().find(|s| s.id == id) {
            sound.burst_count = count;
        }
        count
    }

    /// Picks the clip for one burst.
    pub fn pick<R: Rng + ?Sized>(
        &self,
        settings: &SoundSettings,
        policy: SoundPolicy,
        rng: &mut R,
    ) -> Sound {
        let picked = match policy {
            SoundPolicy::Current => self.get(settings.selected).copied(),
            SoundPolicy::GenreRandom => {
                let clips: Vec<&Sound> = self.genre(settings.genre).collect();
                clips.choose(rng).map(|s| **s)
            }
            SoundPolicy::AllRandom => self.sounds.choose(rng).copied(),
        };
        picked.unwrap_or(Sound {
            id: settings.selected,
            burst_count: 1,
        })
    }
}

impl Default for SoundLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Audio output.
pub trait SoundSink: Send {
    /// Starts playing `url` at `volume` (0-1). Must not block.
    ///
    /// # Errors
    ///
    /// Returns [`EffectError::PlaybackRejected`] if the backend refuses.
    fn play(&mut self, url: &str, volume: f32) -> EffectResult<()>;
}

/// Plays `url`, retrying once with [`FALLBACK_URL`]. Never fails.
///
/// Returns the URL that actually started, if any.
pub fn play_with_fallback(sink: &mut dyn SoundSink, url: &str, volume: f32) -> Option<String> {
    match sink.play(url, volume) {
        Ok(()) => {
            debug!(url, volume, "sound started");
            Some(url.to_string())
        }
        Err(err) => {
            warn!(url, %err, "sound failed, trying fallback");
            match sink.play(FALLBACK_URL, volume) {
                Ok(()) => Some(FALLBACK_URL.to_string()),
                Err(err) => {
                    warn!(%err, "fallback sound failed");
                    None
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    struct Flaky {
        fail: usize,
        played: Vec<String>,
    }

    impl SoundSink for Flaky {
        fn play(&mut self, url: &str, _volume: f32) -> EffectResult<()> {
            if self.fail > 0 {
                self.fail -= 1;
                return Err(EffectError::PlaybackRejected {
                    url: url.to_string(),
                    reason: "busy".to_string(),
                });
            }
            self.played.push(url.to_string());
            Ok(())
        }
    }

    #[test]
    fn test_catalogue_sizes() {
        let library = SoundLibrary::new();
        assert_eq!(library.len(), 15 + 17 + 10 + 14 + 4);
        assert_eq!(library.genre(Genre::Sneaky).count(), 4);
    }

    #[test]
    fn test_sound_id_parse_and_url() {
        let id: SoundId = "dirty14".parse().unwrap();
        assert_eq!(id.genre, Genre::Dirty);
        assert_eq!(id.url(), "/sounds/dirty14.mp3");
        assert!("dirty15".parse::<SoundId>().is_err());
        assert!("sneaky0".parse::<SoundId>().is_err());
        assert!("loud1".parse::<SoundId>().is_err());
    }

    #[test]
    fn test_burst_count_is_clamped() {
        let mut library = SoundLibrary::new();
        let id = SoundId::default();
        assert_eq!(library.set_burst_count(id, 9), 5);
        assert_eq!(library.burst_count(id), 5);
        assert_eq!(library.set_burst_count(id, 0), 1);
    }

    #[test]
    fn test_pick_policies() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let library = SoundLibrary::new();
        let settings = SoundSettings {
            genre: Genre::Big,
            ..SoundSettings::default()
        };

        assert_eq!(
            library.pick(&settings, SoundPolicy::Current, &mut rng).id,
            settings.selected
        );
        for _ in 0..30 {
            let s = library.pick(&settings, SoundPolicy::GenreRandom, &mut rng);
            assert_eq!(s.id.genre, Genre::Big);
        }
    }

    #[test]
    fn test_settings_burst_counts_apply() {
        let mut settings = SoundSettings::default();
        settings.burst_counts.insert("big2".parse().unwrap(), 3);
        let library = SoundLibrary::with_settings(&settings);
        assert_eq!(library.burst_count("big2".parse().unwrap()), 3);
        assert_eq!(library.burst_count("big3".parse().unwrap()), 1);
    }

    #[test]
    fn test_fallback_on_failure() {
        let mut sink = Flaky {
            fail: 1,
            played: Vec::new(),
        };
        let started = play_with_fallback(&mut sink, "/sounds/big1.mp3", PLAYBACK_VOLUME);
        assert_eq!(started.as_deref(), Some(FALLBACK_URL));

        let mut sink = Flaky {
            fail: 2,
            played: Vec::new(),
        };
        assert!(play_with_fallback(&mut sink, "/sounds/big1.mp3", PLAYBACK_VOLUME).is_none());
        assert!(sink.played.is_empty());
    }
}
