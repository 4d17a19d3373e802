//! Run configuration, validated once before a run touches any collaborator.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_QUERIES: [&str; 5] = [
    "crypto news",
    "cryptocurrency analysis",
    "bitcoin news",
    "ethereum news",
    "crypto market analysis",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DurationBounds {
    pub min: Duration,
    pub max: Duration,
}

impl DurationBounds {
    pub fn contains(&self, duration: Duration) -> bool {
        self.min <= duration && duration <= self.max
    }
}

impl Default for DurationBounds {
    fn default() -> Self {
        Self {
            min: Duration::from_secs(5 * 60),
            max: Duration::from_secs(30 * 60),
        }
    }
}

/// Summary length, in words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthBounds {
    pub min_words: usize,
    pub max_words: usize,
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self {
            min_words: 100,
            max_words: 300,
        }
    }
}

/// Per-call deadlines applied to every collaborator call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deadlines {
    /// Platform API calls: discovery, listing and delivery
    pub api: Duration,
    pub download: Duration,
    /// Transcript extraction and summarization
    pub model: Duration,
}

impl Default for Deadlines {
    fn default() -> Self {
        Self {
            api: Duration::from_secs(60),
            download: Duration::from_secs(15 * 60),
            model: Duration::from_secs(3 * 60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunCriteria {
    pub queries: Vec<String>,
    pub max_channels: usize,
    /// Channels scoring below this are dropped before the channel cap applies
    pub relevance_threshold: f64,
    pub videos_per_channel: usize,
    pub duration_bounds: DurationBounds,
    pub summary_length: LengthBounds,
    /// Number of video tasks processed at the same time
    pub concurrency: usize,
    pub deadlines: Deadlines,
    /// Re-use previously fetched media instead of downloading
    pub skip_download: bool,
    pub skip_delivery: bool,
}

impl Default for RunCriteria {
    fn default() -> Self {
        Self {
            queries: DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect(),
            max_channels: 10,
            relevance_threshold: 0.7,
            videos_per_channel: 5,
            duration_bounds: DurationBounds::default(),
            summary_length: LengthBounds::default(),
            concurrency: 4,
            deadlines: Deadlines::default(),
            skip_download: false,
            skip_delivery: false,
        }
    }
}

impl RunCriteria {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queries.iter().all(|q| q.trim().is_empty()) {
            return Err(ConfigError::EmptyQueries);
        }

        let counts = [
            ("max_channels", self.max_channels),
            ("videos_per_channel", self.videos_per_channel),
            ("summary max_words", self.summary_length.max_words),
            ("concurrency", self.concurrency),
        ];
        if let Some((field, _)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ZeroValue { field: *field });
        }

        let deadlines = [
            ("api deadline", self.deadlines.api),
            ("download deadline", self.deadlines.download),
            ("model deadline", self.deadlines.model),
        ];
        if let Some((field, _)) = deadlines.iter().find(|(_, value)| value.is_zero()) {
            return Err(ConfigError::ZeroValue { field: *field });
        }

        if !(0.0..=1.0).contains(&self.relevance_threshold) {
            return Err(ConfigError::RelevanceThreshold(
                self.relevance_threshold.to_string(),
            ));
        }

        let DurationBounds { min, max } = self.duration_bounds;
        if min > max {
            return Err(ConfigError::DurationBounds { min, max });
        }

        let LengthBounds {
            min_words,
            max_words,
        } = self.summary_length;
        if min_words > max_words {
            return Err(ConfigError::LengthBounds {
                min: min_words,
                max: max_words,
            });
        }

        Ok(())
    }

    /// Non-blank queries, trimmed, in the order they were given
    pub fn search_queries(&self) -> Vec<String> {
        self.queries
            .iter()
            .map(|q| q.trim())
            .filter(|q| !q.is_empty())
            .map(str::to_string)
            .collect()
    }
}
