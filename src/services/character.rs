use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Result, anyhow};
use rand::seq::SliceRandom;

use crate::clip::Clip;
use crate::types::Emotion;

pub const BUILTIN_CHARACTER: &str = "ann";

const POSITIVE_CLIPS: &[&str] = &["cheer-leader.gif", "dancing.gif", "yah.gif"];
const NEGATIVE_CLIPS: &[&str] = &["negative/angry.gif"];
const NEUTRAL_CLIPS: &[&str] = &["chilling.gif", "showcase.gif"];

pub fn default_clips_dir() -> PathBuf {
    PathBuf::from("assets").join("clips")
}

/// Path resolution and preloading for character clips. The display talks to
/// this seam only, so tests can substitute a stub.
pub trait VideoCharacterService: Send + Sync {
    /// Resolve the clip to show for a character and emotion. An absent
    /// emotion draws from the neutral pool. Selection within a pool is
    /// uniform-random.
    fn video_path(&self, character_id: &str, emotion: Option<Emotion>) -> Result<PathBuf>;

    /// Decode the clip fully, caching by path. The returned clip is shared;
    /// a second preload of the same path returns the identical one.
    fn preload(&self, path: &Path) -> Result<Arc<Clip>>;

    /// Every clip of every category for the character.
    fn available_videos(&self, character_id: &str) -> Vec<PathBuf>;
}

/// Ordered candidate clips per emotion category.
#[derive(Clone, Debug, Default)]
pub struct EmotionVideoMapping {
    pub positive: Vec<PathBuf>,
    pub negative: Vec<PathBuf>,
    pub neutral: Vec<PathBuf>,
}

impl EmotionVideoMapping {
    pub fn pool(&self, emotion: Emotion) -> &[PathBuf] {
        match emotion {
            Emotion::Positive => &self.positive,
            Emotion::Negative => &self.negative,
            Emotion::Neutral => &self.neutral,
        }
    }

    pub fn all(&self) -> Vec<PathBuf> {
        self.positive
            .iter()
            .chain(&self.negative)
            .chain(&self.neutral)
            .cloned()
            .collect()
    }
}

/// Production clip catalog backed by files in a pack directory.
pub struct VideoCatalog {
    characters: HashMap<String, EmotionVideoMapping>,
    cache: Mutex<HashMap<PathBuf, Arc<Clip>>>,
}

impl VideoCatalog {
    pub fn new() -> VideoCatalog {
        VideoCatalog {
            characters: HashMap::new(),
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Catalog with the built-in character wired to the shipped clip pack.
    pub fn with_builtin_characters(clips_dir: &Path) -> VideoCatalog {
        let mut catalog = VideoCatalog::new();
        catalog.insert_character(
            BUILTIN_CHARACTER,
            EmotionVideoMapping {
                positive: join_all(clips_dir, POSITIVE_CLIPS),
                negative: join_all(clips_dir, NEGATIVE_CLIPS),
                neutral: join_all(clips_dir, NEUTRAL_CLIPS),
            },
        );
        catalog
    }

    pub fn insert_character(&mut self, character_id: &str, mapping: EmotionVideoMapping) {
        self.characters.insert(character_id.to_string(), mapping);
    }

    fn mapping(&self, character_id: &str) -> Result<&EmotionVideoMapping> {
        self.characters
            .get(character_id)
            .ok_or_else(|| anyhow!("unknown character '{character_id}'"))
    }
}

impl Default for VideoCatalog {
    fn default() -> Self {
        VideoCatalog::new()
    }
}

impl VideoCharacterService for VideoCatalog {
    fn video_path(&self, character_id: &str, emotion: Option<Emotion>) -> Result<PathBuf> {
        let mapping = self.mapping(character_id)?;

        let mut pool = mapping.pool(emotion.unwrap_or(Emotion::Neutral));
        if pool.is_empty() {
            pool = &mapping.neutral;
        }

        pool.choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| anyhow!("character '{character_id}' has no clips"))
    }

    fn preload(&self, path: &Path) -> Result<Arc<Clip>> {
        {
            let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(clip) = cache.get(path) {
                return Ok(clip.clone());
            }
        }

        // Decode outside the lock; a racing preload of the same path keeps
        // whichever clip lands first.
        let clip = Arc::new(Clip::decode(path)?);

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(cache.entry(path.to_path_buf()).or_insert(clip).clone())
    }

    fn available_videos(&self, character_id: &str) -> Vec<PathBuf> {
        self.characters
            .get(character_id)
            .map(EmotionVideoMapping::all)
            .unwrap_or_default()
    }
}

fn join_all(dir: &Path, names: &[&str]) -> Vec<PathBuf> {
    names.iter().map(|name| dir.join(name)).collect()
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::time::Duration;

    use image::codecs::gif::GifEncoder;
    use image::{Delay, Frame as GifFrame, RgbaImage};

    use super::*;

    fn catalog() -> VideoCatalog {
        VideoCatalog::with_builtin_characters(Path::new("clips"))
    }

    #[test]
    fn positive_emotion_draws_from_the_positive_pool() {
        let catalog = catalog();
        let expected = join_all(Path::new("clips"), POSITIVE_CLIPS);

        for _ in 0..20 {
            let path = catalog
                .video_path(BUILTIN_CHARACTER, Some(Emotion::Positive))
                .unwrap();
            assert!(expected.contains(&path), "unexpected clip {path:?}");
        }
    }

    #[test]
    fn absent_emotion_falls_back_to_the_neutral_pool() {
        let catalog = catalog();
        let expected = join_all(Path::new("clips"), NEUTRAL_CLIPS);

        for _ in 0..20 {
            let path = catalog.video_path(BUILTIN_CHARACTER, None).unwrap();
            assert!(expected.contains(&path), "unexpected clip {path:?}");
        }
    }

    #[test]
    fn empty_pool_falls_back_to_neutral() {
        let mut catalog = VideoCatalog::new();
        catalog.insert_character(
            "mono",
            EmotionVideoMapping {
                neutral: vec![PathBuf::from("idle.gif")],
                ..EmotionVideoMapping::default()
            },
        );

        let path = catalog.video_path("mono", Some(Emotion::Negative)).unwrap();
        assert_eq!(path, PathBuf::from("idle.gif"));
    }

    #[test]
    fn unknown_character_errors_with_the_id() {
        let err = catalog().video_path("invalid", None).unwrap_err();
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn available_videos_spans_every_category() {
        let catalog = catalog();
        let videos = catalog.available_videos(BUILTIN_CHARACTER);
        assert_eq!(
            videos.len(),
            POSITIVE_CLIPS.len() + NEGATIVE_CLIPS.len() + NEUTRAL_CLIPS.len()
        );
        assert!(catalog.available_videos("nobody").is_empty());
    }

    #[test]
    fn preload_caches_by_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.gif");
        write_test_gif(&path);

        let catalog = VideoCatalog::new();
        let first = catalog.preload(&path).unwrap();
        let second = catalog.preload(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.frame_count(), 2);
        assert_eq!((first.width(), first.height()), (2, 2));
    }

    #[test]
    fn preload_of_a_missing_file_errors() {
        let catalog = VideoCatalog::new();
        assert!(catalog.preload(Path::new("no-such-clip.gif")).is_err());
    }

    fn write_test_gif(path: &Path) {
        let file = File::create(path).unwrap();
        let mut encoder = GifEncoder::new(file);
        for shade in [0u8, 255u8] {
            let image = RgbaImage::from_pixel(2, 2, image::Rgba([shade, shade, shade, 255]));
            let frame = GifFrame::from_parts(
                image,
                0,
                0,
                Delay::from_saturating_duration(Duration::from_millis(40)),
            );
            encoder.encode_frame(frame).unwrap();
        }
    }
}
