use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const YOUTUBE_WATCH_URL: &str = "https://www.youtube.com/watch";
const YOUTUBE_CHANNEL_URL: &str = "https://www.youtube.com/channel";

/// A discovered content source together with how relevant it looked to the
/// discovery stage. Scores are in `0.0..=1.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub title: String,
    pub description: String,
    pub relevance: f64,
}

impl Channel {
    pub fn url(&self) -> String {
        format!("{YOUTUBE_CHANNEL_URL}/{}", self.id)
    }
}

/// One video to be downloaded, transcribed and summarized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoTask {
    pub channel_id: String,
    pub channel_title: String,
    pub video_id: String,
    pub title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub duration_secs: u64,
}

impl VideoTask {
    pub fn url(&self) -> String {
        format!("{YOUTUBE_WATCH_URL}?v={}", self.video_id)
    }

    /// Duration formatted as `H:MM:SS`, or `M:SS` for videos under an hour
    pub fn duration_label(&self) -> String {
        let hours = self.duration_secs / 3600;
        let minutes = (self.duration_secs % 3600) / 60;
        let seconds = self.duration_secs % 60;

        if hours > 0 {
            format!("{hours}:{minutes:02}:{seconds:02}")
        } else {
            format!("{minutes}:{seconds:02}")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    pub video_id: String,
    pub text: String,
}

impl Transcript {
    pub fn new(video_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
            text: text.into(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}
