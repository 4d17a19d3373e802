use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::{datastore::DataStore, sanitize_filename, Transcript, VideoTask};

/// Stores artifacts under a root directory:
///
/// ```text
/// <root>/transcripts/<channel>/<video_id>_transcript.txt
/// <root>/summaries/<channel>/<video_id>_summary.txt
/// <root>/reports/<file_name>
/// ```
#[derive(Debug, Clone)]
pub struct FsDataStore {
    root: PathBuf,
}

impl FsDataStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn transcript_path(&self, task: &VideoTask) -> PathBuf {
        self.root
            .join("transcripts")
            .join(sanitize_filename(&task.channel_title))
            .join(format!("{}_transcript.txt", sanitize_filename(&task.video_id)))
    }

    fn summary_path(&self, task: &VideoTask) -> PathBuf {
        self.root
            .join("summaries")
            .join(sanitize_filename(&task.channel_title))
            .join(format!("{}_summary.txt", sanitize_filename(&task.video_id)))
    }

    async fn write(path: &Path, contents: &str) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        tokio::fs::write(path, contents)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, path = %path.display(), "Failed to write artifact"))
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

impl DataStore for FsDataStore {
    async fn load_transcript(&self, task: &VideoTask) -> anyhow::Result<Option<Transcript>> {
        let path = self.transcript_path(task);

        match tokio::fs::read_to_string(&path).await {
            Ok(text) => {
                tracing::debug!(path = %path.display(), "Loaded cached transcript");
                Ok(Some(Transcript::new(&task.video_id, text)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    async fn save_transcript(
        &self,
        task: &VideoTask,
        transcript: &Transcript,
    ) -> anyhow::Result<PathBuf> {
        let path = self.transcript_path(task);
        Self::write(&path, &transcript.text).await?;
        tracing::info!(path = %path.display(), video_id = %task.video_id, "Saved transcript");
        Ok(path)
    }

    async fn save_summary(&self, task: &VideoTask, summary: &str) -> anyhow::Result<PathBuf> {
        let path = self.summary_path(task);

        let published = task
            .published_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| "unknown".into());
        let contents = format!(
            "Title: {}\nChannel: {}\nURL: {}\nPublished: {}\nDuration: {}\n\nSummary:\n{}\n",
            task.title,
            task.channel_title,
            task.url(),
            published,
            task.duration_label(),
            summary
        );

        Self::write(&path, &contents).await?;
        tracing::info!(path = %path.display(), video_id = %task.video_id, "Saved summary");
        Ok(path)
    }

    async fn save_report(&self, file_name: &str, contents: &str) -> anyhow::Result<PathBuf> {
        let path = self.root.join("reports").join(sanitize_filename(file_name));
        Self::write(&path, contents).await?;
        tracing::info!(path = %path.display(), "Saved report");
        Ok(path)
    }
}
