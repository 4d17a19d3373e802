use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use digest_datastore::{sanitize_filename, VideoTask};
use tokio::process::Command;

use crate::error::DownloadError;

const SUBTITLE_EXT: &str = "vtt";
/// Files yt-dlp leaves next to the media that are not the media itself
const NON_MEDIA_EXTS: [&str; 4] = [SUBTITLE_EXT, "part", "ytdl", "json"];
const MAX_STDERR_CHARS: usize = 500;

/// Drives the `yt-dlp` binary to fetch media and subtitle files into a
/// working directory, one sub-directory per channel.
#[derive(Debug, Clone)]
pub struct YtDlp {
    program: PathBuf,
    workdir: PathBuf,
    cookies_path: Option<PathBuf>,
    subtitle_langs: String,
}

impl YtDlp {
    const PROGRAM: &str = "yt-dlp";

    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            program: PathBuf::from(Self::PROGRAM),
            workdir: workdir.into(),
            cookies_path: None,
            subtitle_langs: "en.*,en".into(),
        }
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_cookies(mut self, cookies_path: Option<PathBuf>) -> Self {
        self.cookies_path = cookies_path;
        self
    }

    pub fn with_subtitle_langs(mut self, langs: impl Into<String>) -> Self {
        self.subtitle_langs = langs.into();
        self
    }

    /// Directory holding all files fetched for the channel of `task`
    pub fn media_dir(&self, task: &VideoTask) -> PathBuf {
        self.workdir
            .join("media")
            .join(sanitize_filename(&task.channel_title))
    }

    fn output_template(&self, task: &VideoTask) -> PathBuf {
        self.media_dir(task)
            .join(format!("{}.%(ext)s", sanitize_filename(&task.video_id)))
    }

    fn subtitle_args(&self) -> Vec<OsString> {
        vec![
            "--write-subs".into(),
            "--write-auto-subs".into(),
            "--sub-langs".into(),
            self.subtitle_langs.clone().into(),
            "--sub-format".into(),
            SUBTITLE_EXT.into(),
        ]
    }

    async fn exec(&self, mut args: Vec<OsString>, task: &VideoTask) -> Result<(), DownloadError> {
        if let Some(cookies) = &self.cookies_path {
            args.push("--cookies".into());
            args.push(cookies.clone().into());
        }
        args.extend([
            "--no-playlist".into(),
            "--no-progress".into(),
            "-o".into(),
            self.output_template(task).into(),
            task.url().into(),
        ]);

        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .inspect_err(|e| tracing::error!(error = ?e, program = %self.program.display(), "Failed to spawn yt-dlp"))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let tail: String = stderr
                .chars()
                .skip(stderr.chars().count().saturating_sub(MAX_STDERR_CHARS))
                .collect();
            return Err(DownloadError::ToolFailed {
                program: Self::PROGRAM,
                status: output.status,
                stderr: tail,
            });
        }

        Ok(())
    }

    /// Downloads the best audio stream and any English subtitles for `task`.
    /// Media already present in the working directory is reused.
    #[tracing::instrument(skip(self, task), fields(video_id = %task.video_id))]
    pub async fn download(&self, task: &VideoTask) -> Result<PathBuf, DownloadError> {
        let dir = self.media_dir(task);
        tokio::fs::create_dir_all(&dir).await?;

        if let Some(existing) = find_file(&dir, &task.video_id, |ext| !NON_MEDIA_EXTS.contains(&ext)).await? {
            tracing::debug!(path = %existing.display(), "Media already exists");
            return Ok(existing);
        }

        let mut args: Vec<OsString> = vec!["-f".into(), "bestaudio/best".into()];
        args.extend(self.subtitle_args());
        self.exec(args, task).await?;

        find_file(&dir, &task.video_id, |ext| !NON_MEDIA_EXTS.contains(&ext))
            .await?
            .ok_or_else(|| DownloadError::MissingOutput {
                program: Self::PROGRAM,
                dir: dir.display().to_string(),
            })
    }

    /// Fetches only the subtitles of `task`, returning `None` when the video
    /// has none in the configured languages.
    #[tracing::instrument(skip(self, task), fields(video_id = %task.video_id))]
    pub async fn fetch_subtitles(&self, task: &VideoTask) -> Result<Option<PathBuf>, DownloadError> {
        let dir = self.media_dir(task);
        tokio::fs::create_dir_all(&dir).await?;

        if let Some(existing) = self.find_subtitles(task).await? {
            return Ok(Some(existing));
        }

        let mut args: Vec<OsString> = vec!["--skip-download".into()];
        args.extend(self.subtitle_args());
        self.exec(args, task).await?;

        self.find_subtitles(task).await
    }

    pub async fn find_subtitles(&self, task: &VideoTask) -> Result<Option<PathBuf>, DownloadError> {
        find_file(&self.media_dir(task), &task.video_id, |ext| ext == SUBTITLE_EXT).await
    }
}

/// Finds `<dir>/<video_id>.*` whose extension satisfies `accept`, picking
/// the lexicographically first match so the choice is stable.
async fn find_file(
    dir: &Path,
    video_id: &str,
    accept: impl Fn(&str) -> bool,
) -> Result<Option<PathBuf>, DownloadError> {
    let prefix = format!("{}.", sanitize_filename(video_id));

    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut matches = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

        if name.starts_with(&prefix) && accept(ext) {
            matches.push(path.clone());
        }
    }

    matches.sort();
    Ok(matches.into_iter().next())
}
