use std::{future::Future, path::PathBuf, sync::LazyLock};

use regex::Regex;

use crate::{Transcript, VideoTask};

pub mod fs;

static UNSAFE_FILENAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1f]"#).unwrap());

const MAX_FILENAME_CHARS: usize = 100;

pub trait DataStore {
    /// Returns a previously saved transcript for `task`, if any
    fn load_transcript(
        &self,
        task: &VideoTask,
    ) -> impl Future<Output = anyhow::Result<Option<Transcript>>> + Send;

    fn save_transcript(
        &self,
        task: &VideoTask,
        transcript: &Transcript,
    ) -> impl Future<Output = anyhow::Result<PathBuf>> + Send;

    fn save_summary(
        &self,
        task: &VideoTask,
        summary: &str,
    ) -> impl Future<Output = anyhow::Result<PathBuf>> + Send;

    fn save_report(
        &self,
        file_name: &str,
        contents: &str,
    ) -> impl Future<Output = anyhow::Result<PathBuf>> + Send;
}

impl<T: DataStore + Send + Sync> DataStore for &T {
    async fn load_transcript(&self, task: &VideoTask) -> anyhow::Result<Option<Transcript>> {
        (**self).load_transcript(task).await
    }

    async fn save_transcript(
        &self,
        task: &VideoTask,
        transcript: &Transcript,
    ) -> anyhow::Result<PathBuf> {
        (**self).save_transcript(task, transcript).await
    }

    async fn save_summary(&self, task: &VideoTask, summary: &str) -> anyhow::Result<PathBuf> {
        (**self).save_summary(task, summary).await
    }

    async fn save_report(&self, file_name: &str, contents: &str) -> anyhow::Result<PathBuf> {
        (**self).save_report(file_name, contents).await
    }
}

/// Replaces characters that are not valid in file names and caps the length
pub fn sanitize_filename(name: &str) -> String {
    let sanitized = UNSAFE_FILENAME_CHARS.replace_all(name.trim(), "_");
    let sanitized: String = sanitized.chars().take(MAX_FILENAME_CHARS).collect();

    // empty, "." and ".." do not name a file inside the target directory
    if sanitized.chars().all(|c| c == '.') {
        "_".to_string()
    } else {
        sanitized
    }
}
