pub mod api;
pub mod media;
pub mod relevance;
pub mod transcript;
pub mod ytdlp;

use std::{
    fmt::Display,
    future::Future,
    path::{Path, PathBuf},
};

use digest_datastore::{Channel, Transcript, VideoTask};

use crate::criteria::DurationBounds;

/// Resolves search queries into candidate channels
pub trait ChannelSource {
    type Error: Display + Send;

    fn discover(
        &self,
        queries: &[String],
    ) -> impl Future<Output = Result<Vec<Channel>, Self::Error>> + Send;
}

pub trait MediaSource {
    type Error: Display + Send;

    /// Lists up to `cap` recent videos of `channel` whose duration is within `bounds`
    fn list_recent(
        &self,
        channel: &Channel,
        cap: usize,
        bounds: DurationBounds,
    ) -> impl Future<Output = Result<Vec<VideoTask>, Self::Error>> + Send;

    fn fetch(&self, task: &VideoTask) -> impl Future<Output = Result<MediaHandle, Self::Error>> + Send;
}

/// Extracts the transcript of one video. `Ok(None)` means the video has no
/// transcript, which is not an error.
pub trait TextSource {
    type Error: Display + Send;

    fn extract(
        &self,
        task: &VideoTask,
        media: &MediaHandle,
    ) -> impl Future<Output = Result<Option<Transcript>, Self::Error>> + Send;
}

/// Opaque reference to media fetched for one video. The location is absent
/// when the download stage was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle {
    location: Option<PathBuf>,
}

impl MediaHandle {
    pub fn fetched(location: impl Into<PathBuf>) -> Self {
        Self {
            location: Some(location.into()),
        }
    }

    pub fn detached() -> Self {
        Self { location: None }
    }

    pub fn location(&self) -> Option<&Path> {
        self.location.as_deref()
    }
}
