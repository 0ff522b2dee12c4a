use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct Frame {
    pub rgba: Vec<u8>,
    pub width: u32,
    pub height: u32,
    #[allow(dead_code)]
    pub timestamp: Instant,
}

/// Emotion category a character clip is indexed under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Emotion {
    Positive,
    Negative,
    Neutral,
}

impl Emotion {
    pub const ALL: [Emotion; 3] = [Emotion::Positive, Emotion::Neutral, Emotion::Negative];

    pub fn label(&self) -> &'static str {
        match self {
            Emotion::Positive => "positive",
            Emotion::Negative => "negative",
            Emotion::Neutral => "neutral",
        }
    }

    /// Button label shown in the emotion row.
    pub fn display_name(&self) -> &'static str {
        match self {
            Emotion::Positive => "Happy",
            Emotion::Negative => "Angry",
            Emotion::Neutral => "Neutral",
        }
    }

    pub fn from_label(label: &str) -> Option<Emotion> {
        match label.to_ascii_lowercase().as_str() {
            "positive" => Some(Emotion::Positive),
            "negative" => Some(Emotion::Negative),
            "neutral" => Some(Emotion::Neutral),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackQuality {
    High,
    Medium,
    Low,
}

impl PlaybackQuality {
    /// Tier by decoded frame area: above full HD is high, above 720p medium.
    pub fn from_dimensions(width: u32, height: u32) -> PlaybackQuality {
        let area = u64::from(width) * u64::from(height);
        if area > 1920 * 1080 {
            PlaybackQuality::High
        } else if area > 1280 * 720 {
            PlaybackQuality::Medium
        } else {
            PlaybackQuality::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PlaybackQuality::High => "high",
            PlaybackQuality::Medium => "medium",
            PlaybackQuality::Low => "low",
        }
    }
}

/// Emitted once per successful clip load.
#[derive(Clone, Debug)]
pub struct VideoMetrics {
    pub load_time: Duration,
    /// Decoded frame area in pixels.
    pub video_size: u64,
    pub playback_quality: PlaybackQuality,
}

/// Snapshot of the display component's playback condition. Mutated only by
/// the display in response to load/error/transition events.
#[derive(Clone, Debug, Default)]
pub struct VideoState {
    pub is_loading: bool,
    pub has_error: bool,
    pub error_message: String,
    pub current_video_path: Option<PathBuf>,
    pub is_transitioning: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_tiers_by_frame_area() {
        assert_eq!(
            PlaybackQuality::from_dimensions(2560, 1440),
            PlaybackQuality::High
        );
        assert_eq!(
            PlaybackQuality::from_dimensions(1920, 1080),
            PlaybackQuality::Medium
        );
        assert_eq!(
            PlaybackQuality::from_dimensions(1280, 720),
            PlaybackQuality::Low
        );
        assert_eq!(
            PlaybackQuality::from_dimensions(640, 480),
            PlaybackQuality::Low
        );
    }

    #[test]
    fn emotion_labels_round_trip() {
        for emotion in Emotion::ALL {
            assert_eq!(Emotion::from_label(emotion.label()), Some(emotion));
        }
        assert_eq!(Emotion::from_label("POSITIVE"), Some(Emotion::Positive));
        assert_eq!(Emotion::from_label("confused"), None);
    }
}
