use std::fmt;

use chrono::{DateTime, Utc};
use digest_datastore::{Channel, VideoTask};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Discovery,
    Download,
    Transcript,
    Summarize,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Discovery => "discovery",
            Stage::Download => "download",
            Stage::Transcript => "transcript",
            Stage::Summarize => "summarize",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoTranscript,
    EmptyTranscript,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::NoTranscript => "no transcript available",
            SkipReason::EmptyTranscript => "transcript is empty",
        };
        f.write_str(reason)
    }
}

/// Terminal classification of one work item
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Summarized { summary: String },
    Skipped { reason: SkipReason },
    Failed { stage: Stage, detail: String },
}

/// What an outcome is about. Channel-level outcomes only occur when a
/// channel's videos could not be listed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItem {
    Channel(Channel),
    Video(VideoTask),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemOutcome {
    /// Position of the channel in the retained discovery order
    pub channel_index: usize,
    /// Position of the video in its channel's listing; `None` for channel-level outcomes
    pub video_index: Option<usize>,
    pub item: WorkItem,
    pub outcome: Outcome,
}

impl ItemOutcome {
    pub fn sort_key(&self) -> (usize, Option<usize>) {
        (self.channel_index, self.video_index)
    }

    pub fn video(&self) -> Option<&VideoTask> {
        match &self.item {
            WorkItem::Video(task) => Some(task),
            WorkItem::Channel(_) => None,
        }
    }

    pub fn channel_title(&self) -> &str {
        match &self.item {
            WorkItem::Video(task) => &task.channel_title,
            WorkItem::Channel(channel) => &channel.title,
        }
    }

    pub fn is_summarized(&self) -> bool {
        matches!(self.outcome, Outcome::Summarized { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, Outcome::Skipped { .. })
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Success,
    PartialSuccess,
    Failure,
}

impl RunStatus {
    /// Success needs at least one summary and no failures; any failure
    /// alongside a summary is a partial success; no summary at all is a
    /// failure however many items were skipped.
    pub fn from_outcomes(outcomes: &[ItemOutcome]) -> Self {
        let summarized = outcomes.iter().filter(|o| o.is_summarized()).count();
        let failed = outcomes.iter().filter(|o| o.is_failed()).count();

        match (summarized, failed) {
            (0, _) => RunStatus::Failure,
            (_, 0) => RunStatus::Success,
            _ => RunStatus::PartialSuccess,
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self {
            RunStatus::Success => "success",
            RunStatus::PartialSuccess => "partial success",
            RunStatus::Failure => "failure",
        };
        f.write_str(status)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    Delivered,
    Failed(String),
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunResult {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Channels retained after relevance filtering, in processing order
    pub channels: Vec<Channel>,
    /// Sorted by channel order, then video order
    pub outcomes: Vec<ItemOutcome>,
    pub status: RunStatus,
    /// Set when the channel search itself failed and nothing could be processed
    pub discovery_failure: Option<String>,
    pub delivery: Delivery,
}

impl RunResult {
    pub fn summarized(&self) -> impl Iterator<Item = (&VideoTask, &str)> {
        self.outcomes.iter().filter_map(|o| match (&o.item, &o.outcome) {
            (WorkItem::Video(task), Outcome::Summarized { summary }) => {
                Some((task, summary.as_str()))
            }
            _ => None,
        })
    }

    pub fn summarized_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_summarized()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_failed()).count()
    }

    pub fn delivered(&self) -> bool {
        self.delivery == Delivery::Delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_outcome(video_index: usize, outcome: Outcome) -> ItemOutcome {
        ItemOutcome {
            channel_index: 0,
            video_index: Some(video_index),
            item: WorkItem::Video(VideoTask {
                channel_id: "UC1".into(),
                channel_title: "Chain Daily".into(),
                video_id: format!("v{video_index}"),
                title: format!("Video {video_index}"),
                published_at: None,
                duration_secs: 600,
            }),
            outcome,
        }
    }

    fn summarized(idx: usize) -> ItemOutcome {
        video_outcome(
            idx,
            Outcome::Summarized {
                summary: "summary".into(),
            },
        )
    }

    fn skipped(idx: usize) -> ItemOutcome {
        video_outcome(
            idx,
            Outcome::Skipped {
                reason: SkipReason::NoTranscript,
            },
        )
    }

    fn failed(idx: usize) -> ItemOutcome {
        video_outcome(
            idx,
            Outcome::Failed {
                stage: Stage::Download,
                detail: "boom".into(),
            },
        )
    }

    #[test]
    fn test_status_success_requires_no_failures() {
        assert_eq!(
            RunStatus::from_outcomes(&[summarized(0), skipped(1)]),
            RunStatus::Success
        );
    }

    #[test]
    fn test_status_partial_success() {
        assert_eq!(
            RunStatus::from_outcomes(&[summarized(0), failed(1), skipped(2)]),
            RunStatus::PartialSuccess
        );
    }

    #[test]
    fn test_status_failure_without_summaries() {
        assert_eq!(RunStatus::from_outcomes(&[]), RunStatus::Failure);
        assert_eq!(
            RunStatus::from_outcomes(&[skipped(0), skipped(1)]),
            RunStatus::Failure
        );
        assert_eq!(
            RunStatus::from_outcomes(&[failed(0), skipped(1)]),
            RunStatus::Failure
        );
    }

    #[test]
    fn test_status_ignores_order() {
        let a = RunStatus::from_outcomes(&[failed(0), summarized(1)]);
        let b = RunStatus::from_outcomes(&[summarized(1), failed(0)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_channel_level_outcome_sorts_first() {
        let channel_failure = ItemOutcome {
            channel_index: 0,
            video_index: None,
            item: WorkItem::Channel(Channel {
                id: "UC1".into(),
                title: "Chain Daily".into(),
                description: String::new(),
                relevance: 1.0,
            }),
            outcome: Outcome::Failed {
                stage: Stage::Discovery,
                detail: "quota".into(),
            },
        };
        assert!(channel_failure.sort_key() < summarized(0).sort_key());
        assert_eq!(channel_failure.channel_title(), "Chain Daily");
        assert!(channel_failure.video().is_none());
    }
}
