use digest_datastore::{DataStore, Transcript, VideoTask};

use crate::{
    error::DownloadError,
    parser::parse_vtt,
    yt::{ytdlp::YtDlp, MediaHandle, TextSource},
};

/// Reads transcripts from the platform's subtitles (manual or automatic)
#[derive(Debug, Clone)]
pub struct SubtitleTextSource {
    ytdlp: YtDlp,
}

impl SubtitleTextSource {
    pub fn new(ytdlp: YtDlp) -> Self {
        Self { ytdlp }
    }
}

impl TextSource for SubtitleTextSource {
    type Error = DownloadError;

    #[tracing::instrument(skip_all, fields(video_id = %task.video_id))]
    async fn extract(
        &self,
        task: &VideoTask,
        media: &MediaHandle,
    ) -> Result<Option<Transcript>, Self::Error> {
        // subtitles are written beside fetched media; without media, fetch them alone
        let subtitles = match media.location() {
            Some(_) => self.ytdlp.find_subtitles(task).await?,
            None => self.ytdlp.fetch_subtitles(task).await?,
        };

        let Some(path) = subtitles else {
            tracing::warn!("No subtitles available");
            return Ok(None);
        };

        let vtt = tokio::fs::read_to_string(&path).await?;
        Ok(Some(Transcript::new(&task.video_id, parse_vtt(&vtt))))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CachedTextError<E> {
    #[error("{0}")]
    Source(E),
    #[error("transcript cache: {0:#}")]
    Store(anyhow::Error),
}

/// Serves transcripts from a [`DataStore`] when present, otherwise asks the
/// inner source and saves what it returns.
#[derive(Debug, Clone)]
pub struct CachedTextSource<T, D> {
    inner: T,
    store: D,
}

impl<T, D> CachedTextSource<T, D> {
    pub fn new(inner: T, store: D) -> Self {
        Self { inner, store }
    }
}

impl<T, D> TextSource for CachedTextSource<T, D>
where
    T: TextSource + Sync,
    D: DataStore + Sync,
{
    type Error = CachedTextError<T::Error>;

    async fn extract(
        &self,
        task: &VideoTask,
        media: &MediaHandle,
    ) -> Result<Option<Transcript>, Self::Error> {
        if let Some(cached) = self
            .store
            .load_transcript(task)
            .await
            .map_err(CachedTextError::Store)?
        {
            tracing::debug!(video_id = %task.video_id, "Using cached transcript");
            return Ok(Some(cached));
        }

        let transcript = self
            .inner
            .extract(task, media)
            .await
            .map_err(CachedTextError::Source)?;

        if let Some(transcript) = &transcript {
            if !transcript.is_blank() {
                self.store
                    .save_transcript(task, transcript)
                    .await
                    .map_err(CachedTextError::Store)?;
            }
        }

        Ok(transcript)
    }
}
