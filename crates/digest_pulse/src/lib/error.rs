use std::time::Duration;

/// Invalid run or schedule configuration. Always raised before any
/// collaborator is called.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("at least one non-blank search query is required")]
    EmptyQueries,
    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },
    #[error("relevance threshold must be within 0.0..=1.0, got {0}")]
    RelevanceThreshold(String),
    #[error("minimum video duration ({min:?}) exceeds maximum ({max:?})")]
    DurationBounds { min: Duration, max: Duration },
    #[error("minimum summary length ({min} words) exceeds maximum ({max} words)")]
    LengthBounds { min: usize, max: usize },
}

/// Failure talking to the video platform API
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("HTTP error: {0}")]
    Response(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("Unexpected API response: {0}")]
    Decode(String),
    #[error("All {0} discovery queries failed")]
    AllQueriesFailed(usize),
}

/// Failure of the media tool for one video
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{program} exited with {status}: {stderr}")]
    ToolFailed {
        program: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("{program} did not produce the expected output in {dir}")]
    MissingOutput { program: &'static str, dir: String },
}

/// Why a single stage of one item did not produce a value
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StageError {
    #[error("{0}")]
    Collaborator(String),
    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid ISO-8601 duration: {0}")]
    Duration(String),
}
