use std::collections::HashMap;

use digest_datastore::{Channel, VideoTask};
use itertools::Itertools;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::de::DeserializeOwned;

use crate::{
    criteria::DurationBounds,
    error::ServiceError,
    parser::parse_iso8601_duration,
    types::{
        ApiErrorResponse, ChannelResource, ListResponse, PlaylistItem, SearchResult, VideoResource,
    },
    yt::{relevance::KeywordRelevance, ChannelSource},
};

/// The API accepts at most this many ids per `channels`/`videos` lookup
const MAX_IDS_PER_REQUEST: usize = 50;

/// YouTube Data API v3 client used for channel discovery and video listing.
///
/// Transient failures (connection errors, 5xx, 429) are retried with
/// exponential backoff before a call is reported as failed.
#[derive(Debug, Clone)]
pub struct YouTubeApi {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
    results_per_query: usize,
    relevance: Option<KeywordRelevance>,
}

impl YouTubeApi {
    const BASE_URL: &str = "https://www.googleapis.com/youtube/v3";

    pub fn new(api_key: impl Into<String>) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            api_key: api_key.into(),
            base_url: Self::BASE_URL.into(),
            results_per_query: 10,
            relevance: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Number of channels requested from each search query
    pub fn with_results_per_query(mut self, results: usize) -> Self {
        self.results_per_query = results.clamp(1, MAX_IDS_PER_REQUEST);
        self
    }

    /// Scores channels against these keywords instead of the query words
    pub fn with_relevance(mut self, relevance: KeywordRelevance) -> Self {
        self.relevance = Some(relevance);
        self
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, ServiceError> {
        let resp = self
            .client
            .get(format!("{}/{}", self.base_url, endpoint))
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, endpoint, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(ServiceError::Api { status, message });
        }

        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| ServiceError::Decode(format!("{endpoint}: {e}")))
    }

    #[tracing::instrument(skip(self))]
    async fn search_channel_ids(&self, query: &str) -> Result<Vec<String>, ServiceError> {
        let max_results = self.results_per_query.to_string();
        let resp: ListResponse<SearchResult> = self
            .get(
                "search",
                &[
                    ("part", "snippet"),
                    ("type", "channel"),
                    ("q", query),
                    ("maxResults", &max_results),
                ],
            )
            .await?;

        Ok(resp
            .items
            .into_iter()
            .filter_map(|item| item.id.channel_id)
            .collect())
    }

    /// Looks up channel resources, returned in the order of `ids`
    async fn channels_by_id(&self, ids: &[String]) -> Result<Vec<ChannelResource>, ServiceError> {
        let mut found = HashMap::new();

        for batch in ids.chunks(MAX_IDS_PER_REQUEST) {
            let joined = batch.join(",");
            let resp: ListResponse<ChannelResource> = self
                .get(
                    "channels",
                    &[("part", "snippet,contentDetails"), ("id", &joined)],
                )
                .await?;
            found.extend(resp.items.into_iter().map(|c| (c.id.clone(), c)));
        }

        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }

    async fn videos_by_id(&self, ids: &[String]) -> Result<Vec<VideoResource>, ServiceError> {
        let mut found = HashMap::new();

        for batch in ids.chunks(MAX_IDS_PER_REQUEST) {
            let joined = batch.join(",");
            let resp: ListResponse<VideoResource> = self
                .get(
                    "videos",
                    &[("part", "snippet,contentDetails"), ("id", &joined)],
                )
                .await?;
            found.extend(resp.items.into_iter().map(|v| (v.id.clone(), v)));
        }

        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }

    /// Lists the channel's most recent uploads whose duration lies within
    /// `bounds`, newest first, capped at `cap`.
    #[tracing::instrument(skip(self, channel), fields(channel_id = %channel.id))]
    pub async fn recent_videos(
        &self,
        channel: &Channel,
        cap: usize,
        bounds: DurationBounds,
    ) -> Result<Vec<VideoTask>, ServiceError> {
        let uploads = self
            .channels_by_id(std::slice::from_ref(&channel.id))
            .await?
            .into_iter()
            .next()
            .and_then(|c| c.content_details)
            .and_then(|d| d.related_playlists.uploads)
            .ok_or_else(|| {
                ServiceError::Decode(format!("channel {} has no uploads playlist", channel.id))
            })?;

        let max_results = MAX_IDS_PER_REQUEST.to_string();
        let playlist: ListResponse<PlaylistItem> = self
            .get(
                "playlistItems",
                &[
                    ("part", "contentDetails"),
                    ("playlistId", &uploads),
                    ("maxResults", &max_results),
                ],
            )
            .await?;

        let video_ids = playlist
            .items
            .into_iter()
            .map(|item| item.content_details.video_id)
            .collect::<Vec<_>>();

        let videos = self
            .videos_by_id(&video_ids)
            .await?
            .into_iter()
            .filter_map(|video| {
                let duration = parse_iso8601_duration(&video.content_details.duration)
                    .inspect_err(|e| tracing::warn!(error = %e, video_id = %video.id, "Skipping video with unparseable duration"))
                    .ok()?;

                if !bounds.contains(duration) {
                    tracing::debug!(video_id = %video.id, ?duration, "Video duration outside acceptable range");
                    return None;
                }

                Some(VideoTask {
                    channel_id: video.snippet.channel_id,
                    channel_title: video.snippet.channel_title,
                    video_id: video.id,
                    title: video.snippet.title,
                    published_at: video.snippet.published_at,
                    duration_secs: duration.as_secs(),
                })
            })
            .take(cap)
            .collect::<Vec<_>>();

        tracing::info!(count = videos.len(), "Retrieved recent videos");
        Ok(videos)
    }
}

impl ChannelSource for YouTubeApi {
    type Error = ServiceError;

    #[tracing::instrument(skip(self))]
    async fn discover(&self, queries: &[String]) -> Result<Vec<Channel>, Self::Error> {
        let mut channel_ids = Vec::new();
        let mut failed_queries = 0;

        for query in queries {
            match self.search_channel_ids(query).await {
                Ok(ids) => {
                    tracing::info!(query = %query, count = ids.len(), "Found channels for query");
                    channel_ids.extend(ids);
                }
                Err(e) => {
                    tracing::error!(error = %e, query = %query, "Channel search failed");
                    failed_queries += 1;
                }
            }
        }

        if !queries.is_empty() && failed_queries == queries.len() {
            return Err(ServiceError::AllQueriesFailed(failed_queries));
        }

        let channel_ids = channel_ids.into_iter().unique().collect::<Vec<_>>();
        let relevance = self
            .relevance
            .clone()
            .unwrap_or_else(|| KeywordRelevance::from_queries(queries));

        let channels = self
            .channels_by_id(&channel_ids)
            .await?
            .into_iter()
            .filter_map(|resource| {
                let snippet = resource.snippet?;
                let relevance = relevance.score(&snippet.title, &snippet.description);
                Some(Channel {
                    id: resource.id,
                    title: snippet.title,
                    description: snippet.description,
                    relevance,
                })
            })
            .collect();

        Ok(channels)
    }
}
