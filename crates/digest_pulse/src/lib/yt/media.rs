use digest_datastore::{Channel, VideoTask};

use crate::{
    criteria::DurationBounds,
    error::{DownloadError, ServiceError},
    yt::{api::YouTubeApi, ytdlp::YtDlp, MediaHandle, MediaSource},
};

#[derive(Debug, thiserror::Error)]
pub enum MediaSourceError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Download(#[from] DownloadError),
}

/// Lists videos through the Data API and downloads them with `yt-dlp`
#[derive(Debug, Clone)]
pub struct YtMediaSource {
    api: YouTubeApi,
    ytdlp: YtDlp,
}

impl YtMediaSource {
    pub fn new(api: YouTubeApi, ytdlp: YtDlp) -> Self {
        Self { api, ytdlp }
    }
}

impl MediaSource for YtMediaSource {
    type Error = MediaSourceError;

    async fn list_recent(
        &self,
        channel: &Channel,
        cap: usize,
        bounds: DurationBounds,
    ) -> Result<Vec<VideoTask>, Self::Error> {
        Ok(self.api.recent_videos(channel, cap, bounds).await?)
    }

    async fn fetch(&self, task: &VideoTask) -> Result<MediaHandle, Self::Error> {
        let path = self
            .ytdlp
            .download(task)
            .await
            .inspect_err(|e| tracing::error!(error = %e, video_id = %task.video_id, "Failed to download media"))?;

        tracing::info!(path = %path.display(), video_id = %task.video_id, "Downloaded media");
        Ok(MediaHandle::fetched(path))
    }
}
