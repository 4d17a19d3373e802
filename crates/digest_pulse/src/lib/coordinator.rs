pub mod builder;

use std::{fmt::Display, future::Future, time::Duration};

use chrono::Utc;
use digest_datastore::{Channel, VideoTask};
use futures::{stream, StreamExt};
use itertools::Itertools;

use crate::{
    criteria::RunCriteria,
    error::{ConfigError, StageError},
    outcome::{Delivery, ItemOutcome, Outcome, RunResult, RunStatus, SkipReason, Stage, WorkItem},
    report::Notifier,
    yt::{ChannelSource, MediaHandle, MediaSource, TextSource},
    Summarizer,
};

/// Drives one end-to-end pass: discovery, per-channel listing, per-video
/// download, transcript and summary, then delivery of the aggregate.
///
/// Failures of a single channel or video are recorded as outcomes and never
/// abort the run; only invalid criteria make [`RunCoordinator::execute`] fail.
#[derive(Debug)]
pub struct RunCoordinator<C, M, T, S, N>
where
    C: ChannelSource + Send + Sync + 'static,
    M: MediaSource + Send + Sync + 'static,
    T: TextSource + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    channel_source: C,
    media_source: M,
    text_source: T,
    summarizer: S,
    notifier: N,
}

/// Awaits a collaborator call under `limit`; an error or an elapsed deadline
/// both count as a failure of the stage.
async fn within<V, E: Display>(
    limit: Duration,
    call: impl Future<Output = Result<V, E>>,
) -> Result<V, StageError> {
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(StageError::Collaborator(e.to_string())),
        Err(_) => Err(StageError::DeadlineExceeded(limit)),
    }
}

/// Drops repeated channel ids and channels below `threshold`, then keeps
/// the `cap` most relevant. Ties keep discovery order.
pub fn select_channels(channels: Vec<Channel>, threshold: f64, cap: usize) -> Vec<Channel> {
    channels
        .into_iter()
        .unique_by(|c| c.id.clone())
        .filter(|c| c.relevance >= threshold)
        .sorted_by(|a, b| b.relevance.total_cmp(&a.relevance))
        .take(cap)
        .collect()
}

impl<C, M, T, S, N> RunCoordinator<C, M, T, S, N>
where
    C: ChannelSource + Send + Sync + 'static,
    M: MediaSource + Send + Sync + 'static,
    T: TextSource + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    pub fn new(
        channel_source: C,
        media_source: M,
        text_source: T,
        summarizer: S,
        notifier: N,
    ) -> Self {
        RunCoordinator {
            channel_source,
            media_source,
            text_source,
            summarizer,
            notifier,
        }
    }

    #[tracing::instrument(skip_all)]
    async fn discover_channels(&self, criteria: &RunCriteria) -> Result<Vec<Channel>, StageError> {
        let queries = criteria.search_queries();
        let candidates = within(
            criteria.deadlines.api,
            self.channel_source.discover(&queries),
        )
        .await?;
        tracing::info!(count = candidates.len(), "Discovered candidate channels");

        let channels = select_channels(
            candidates,
            criteria.relevance_threshold,
            criteria.max_channels,
        );
        for channel in &channels {
            tracing::info!(
                channel_id = %channel.id,
                title = %channel.title,
                relevance = channel.relevance,
                "Selected channel"
            );
        }
        Ok(channels)
    }

    #[tracing::instrument(skip_all, fields(channel_id = %channel.id))]
    async fn list_channel(
        &self,
        channel_index: usize,
        channel: Channel,
        criteria: &RunCriteria,
    ) -> (usize, Channel, Result<Vec<VideoTask>, StageError>) {
        let listing = within(
            criteria.deadlines.api,
            self.media_source.list_recent(
                &channel,
                criteria.videos_per_channel,
                criteria.duration_bounds,
            ),
        )
        .await
        .inspect_err(|e| tracing::error!(error = %e, "Failed to list channel videos"));

        (channel_index, channel, listing)
    }

    #[tracing::instrument(skip_all, fields(video_id = %task.video_id, channel_id = %task.channel_id))]
    async fn process_task(
        &self,
        channel_index: usize,
        video_index: usize,
        task: VideoTask,
        criteria: &RunCriteria,
    ) -> ItemOutcome {
        let outcome = self.run_stages(&task, criteria).await;

        match &outcome {
            Outcome::Summarized { .. } => tracing::info!("Video summarized"),
            Outcome::Skipped { reason } => tracing::warn!(%reason, "Video skipped"),
            Outcome::Failed { stage, detail } => {
                tracing::error!(%stage, error = %detail, "Video failed")
            }
        }

        ItemOutcome {
            channel_index,
            video_index: Some(video_index),
            item: WorkItem::Video(task),
            outcome,
        }
    }

    async fn run_stages(&self, task: &VideoTask, criteria: &RunCriteria) -> Outcome {
        let failed = |stage: Stage, e: StageError| Outcome::Failed {
            stage,
            detail: e.to_string(),
        };

        let media = if criteria.skip_download {
            MediaHandle::detached()
        } else {
            match within(criteria.deadlines.download, self.media_source.fetch(task)).await {
                Ok(media) => media,
                Err(e) => return failed(Stage::Download, e),
            }
        };

        let transcript = match within(
            criteria.deadlines.model,
            self.text_source.extract(task, &media),
        )
        .await
        {
            Ok(Some(transcript)) if transcript.is_blank() => {
                return Outcome::Skipped {
                    reason: SkipReason::EmptyTranscript,
                }
            }
            Ok(Some(transcript)) => transcript,
            Ok(None) => {
                return Outcome::Skipped {
                    reason: SkipReason::NoTranscript,
                }
            }
            Err(e) => return failed(Stage::Transcript, e),
        };

        match within(
            criteria.deadlines.model,
            self.summarizer
                .summarize(&transcript, criteria.summary_length),
        )
        .await
        {
            Ok(summary) => Outcome::Summarized { summary },
            Err(e) => failed(Stage::Summarize, e),
        }
    }

    async fn deliver(&self, result: &RunResult, criteria: &RunCriteria) -> Delivery {
        if criteria.skip_delivery {
            tracing::info!("Skipping report delivery");
            return Delivery::Skipped;
        }

        match within(criteria.deadlines.api, self.notifier.deliver(result)).await {
            Ok(()) => {
                tracing::info!("Report delivered");
                Delivery::Delivered
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to deliver report");
                Delivery::Failed(e.to_string())
            }
        }
    }

    /// Runs one pass over `criteria`. Returns `Err` only when the criteria are
    /// invalid, in which case no collaborator has been called.
    #[tracing::instrument(skip_all)]
    pub async fn execute(&self, criteria: &RunCriteria) -> Result<RunResult, ConfigError> {
        criteria
            .validate()
            .inspect_err(|e| tracing::error!(error = %e, "Invalid run criteria"))?;

        let started_at = Utc::now();
        tracing::info!(
            queries = criteria.queries.len(),
            max_channels = criteria.max_channels,
            "Starting run"
        );

        let (channels, discovery_failure) = match self.discover_channels(criteria).await {
            Ok(channels) => (channels, None),
            Err(e) => {
                tracing::error!(error = %e, "Channel discovery failed");
                (Vec::new(), Some(e.to_string()))
            }
        };

        // listings keep channel order; video tasks complete in any order
        let listings = stream::iter(channels.iter().cloned().enumerate())
            .map(|(channel_index, channel)| self.list_channel(channel_index, channel, criteria))
            .buffered(criteria.concurrency)
            .collect::<Vec<_>>()
            .await;

        let mut outcomes = Vec::new();
        let mut tasks = Vec::new();
        for (channel_index, channel, listing) in listings {
            match listing {
                Ok(videos) => {
                    tracing::info!(channel_id = %channel.id, count = videos.len(), "Listed channel videos");
                    tasks.extend(
                        videos
                            .into_iter()
                            .enumerate()
                            .map(|(video_index, task)| (channel_index, video_index, task)),
                    );
                }
                Err(e) => outcomes.push(ItemOutcome {
                    channel_index,
                    video_index: None,
                    item: WorkItem::Channel(channel),
                    outcome: Outcome::Failed {
                        stage: Stage::Discovery,
                        detail: e.to_string(),
                    },
                }),
            }
        }

        tracing::info!(count = tasks.len(), "Processing videos");
        let processed = stream::iter(tasks)
            .map(|(channel_index, video_index, task)| {
                self.process_task(channel_index, video_index, task, criteria)
            })
            .buffer_unordered(criteria.concurrency)
            .collect::<Vec<_>>()
            .await;

        outcomes.extend(processed);
        outcomes.sort_by_key(|o| o.sort_key());

        let mut result = RunResult {
            started_at,
            finished_at: Utc::now(),
            channels,
            status: RunStatus::from_outcomes(&outcomes),
            outcomes,
            discovery_failure,
            delivery: Delivery::Skipped,
        };

        result.delivery = self.deliver(&result, criteria).await;

        tracing::info!(
            status = %result.status,
            summarized = result.summarized_count(),
            skipped = result.skipped_count(),
            failed = result.failed_count(),
            delivered = result.delivered(),
            "Run finished"
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(id: &str, relevance: f64) -> Channel {
        Channel {
            id: id.into(),
            title: format!("Channel {id}"),
            description: String::new(),
            relevance,
        }
    }

    fn ids(channels: &[Channel]) -> Vec<&str> {
        channels.iter().map(|c| c.id.as_str()).collect()
    }

    #[test]
    fn test_select_filters_by_threshold_and_cap() {
        let selected = select_channels(vec![channel("a", 0.9), channel("b", 0.5)], 0.7, 1);
        assert_eq!(ids(&selected), ["a"]);
    }

    #[test]
    fn test_select_orders_by_relevance_then_discovery() {
        let selected = select_channels(
            vec![
                channel("a", 0.7),
                channel("b", 0.9),
                channel("c", 0.7),
                channel("d", 0.8),
            ],
            0.0,
            10,
        );
        assert_eq!(ids(&selected), ["b", "d", "a", "c"]);

        let capped = select_channels(
            vec![channel("a", 0.7), channel("b", 0.7), channel("c", 0.7)],
            0.0,
            2,
        );
        assert_eq!(ids(&capped), ["a", "b"]);
    }

    #[test]
    fn test_select_drops_duplicates_and_nan() {
        let selected = select_channels(
            vec![
                channel("a", 0.8),
                channel("a", 0.95),
                channel("b", f64::NAN),
            ],
            0.5,
            10,
        );
        assert_eq!(ids(&selected), ["a"]);
        assert_eq!(selected[0].relevance, 0.8);
    }

    #[tokio::test(start_paused = true)]
    async fn test_within_maps_deadline_to_stage_error() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, String>(())
        };
        assert_eq!(
            within(Duration::from_secs(1), slow).await,
            Err(StageError::DeadlineExceeded(Duration::from_secs(1)))
        );

        let failing = async { Err::<(), _>("quota exceeded") };
        assert_eq!(
            within(Duration::from_secs(1), failing).await,
            Err(StageError::Collaborator("quota exceeded".into()))
        );
    }
}
