use std::{path::PathBuf, time::Duration};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use digest_datastore::FsDataStore;

use digest_pulse::{
    criteria::{Deadlines, DurationBounds, LengthBounds, RunCriteria, DEFAULT_QUERIES},
    openai::OpenAIClient,
    outcome::RunStatus,
    report::DEFAULT_REPORT_TITLE,
    tracing::init_tracing_subscriber,
    yt::{
        api::YouTubeApi, media::YtMediaSource, relevance::KeywordRelevance,
        transcript::{CachedTextSource, SubtitleTextSource},
        ytdlp::YtDlp,
    },
    ReportNotifier, RunCoordinatorBuilder, ScheduleState, Scheduler,
};

/// Summarizes recent videos of relevant YouTube channels into one digest
#[derive(Parser, Debug)]
#[command(name = "digest-pulse")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    options: Options,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Perform a single run and exit
    Run,

    /// Run now, then again every interval until interrupted
    Schedule {
        #[arg(long, env = "DIGEST_INTERVAL_HOURS", default_value_t = 24)]
        interval_hours: u64,
    },
}

#[derive(Args, Debug)]
struct Options {
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true, global = true)]
    youtube_api_key: Option<String>,

    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    openai_api_key: Option<String>,

    /// Channel search query, repeatable
    #[arg(long = "query", env = "DIGEST_QUERIES", value_delimiter = ',', global = true)]
    queries: Vec<String>,

    /// Relevance keywords; defaults to the words of the queries
    #[arg(long = "keyword", env = "DIGEST_KEYWORDS", value_delimiter = ',', global = true)]
    keywords: Vec<String>,

    #[arg(long, env = "DIGEST_MAX_CHANNELS", default_value_t = 10, global = true)]
    max_channels: usize,

    #[arg(long, env = "DIGEST_RELEVANCE_THRESHOLD", default_value_t = 0.7, global = true)]
    relevance_threshold: f64,

    #[arg(long, env = "DIGEST_VIDEOS_PER_CHANNEL", default_value_t = 5, global = true)]
    videos_per_channel: usize,

    #[arg(long, env = "DIGEST_RESULTS_PER_QUERY", default_value_t = 10, global = true)]
    results_per_query: usize,

    #[arg(long, env = "DIGEST_MIN_DURATION_SECS", default_value_t = 300, global = true)]
    min_duration_secs: u64,

    #[arg(long, env = "DIGEST_MAX_DURATION_SECS", default_value_t = 1800, global = true)]
    max_duration_secs: u64,

    #[arg(long, env = "DIGEST_SUMMARY_MIN_WORDS", default_value_t = 100, global = true)]
    summary_min_words: usize,

    #[arg(long, env = "DIGEST_SUMMARY_MAX_WORDS", default_value_t = 300, global = true)]
    summary_max_words: usize,

    #[arg(long, env = "DIGEST_CONCURRENCY", default_value_t = 4, global = true)]
    concurrency: usize,

    #[arg(long, env = "DIGEST_API_TIMEOUT_SECS", default_value_t = 60, global = true)]
    api_timeout_secs: u64,

    #[arg(long, env = "DIGEST_DOWNLOAD_TIMEOUT_SECS", default_value_t = 900, global = true)]
    download_timeout_secs: u64,

    #[arg(long, env = "DIGEST_MODEL_TIMEOUT_SECS", default_value_t = 180, global = true)]
    model_timeout_secs: u64,

    /// Use cached transcripts and subtitles instead of downloading media
    #[arg(long, env = "DIGEST_SKIP_DOWNLOAD", global = true)]
    skip_download: bool,

    /// Build the report without saving or sending it
    #[arg(long, env = "DIGEST_SKIP_DELIVERY", global = true)]
    skip_delivery: bool,

    #[arg(long, env = "DIGEST_WORKDIR", default_value = "/var/tmp/digest-pulse", global = true)]
    workdir: PathBuf,

    #[arg(long, env = "DIGEST_REPORT_TITLE", default_value = DEFAULT_REPORT_TITLE, global = true)]
    report_title: String,

    /// Receives the rendered report as JSON
    #[arg(long, env = "DIGEST_WEBHOOK_URL", global = true)]
    webhook_url: Option<String>,

    #[arg(long, env = "YTDLP_PATH", default_value = "yt-dlp", global = true)]
    ytdlp_path: PathBuf,

    #[arg(long, env = "YTDLP_COOKIES_PATH", global = true)]
    ytdlp_cookies_path: Option<PathBuf>,

    /// Subtitle languages passed to `yt-dlp --sub-langs`
    #[arg(long, env = "YTDLP_SUBTITLE_LANGS", default_value = "en.*,en", global = true)]
    subtitle_langs: String,
}

impl Options {
    fn criteria(&self) -> RunCriteria {
        let queries = if self.queries.is_empty() {
            DEFAULT_QUERIES.iter().map(|q| q.to_string()).collect()
        } else {
            self.queries.clone()
        };

        RunCriteria {
            queries,
            max_channels: self.max_channels,
            relevance_threshold: self.relevance_threshold,
            videos_per_channel: self.videos_per_channel,
            duration_bounds: DurationBounds {
                min: Duration::from_secs(self.min_duration_secs),
                max: Duration::from_secs(self.max_duration_secs),
            },
            summary_length: LengthBounds {
                min_words: self.summary_min_words,
                max_words: self.summary_max_words,
            },
            concurrency: self.concurrency,
            deadlines: Deadlines {
                api: Duration::from_secs(self.api_timeout_secs),
                download: Duration::from_secs(self.download_timeout_secs),
                model: Duration::from_secs(self.model_timeout_secs),
            },
            skip_download: self.skip_download,
            skip_delivery: self.skip_delivery,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    init_tracing_subscriber()?;

    let cli = Cli::parse();
    let options = cli.options;
    let criteria = options.criteria();
    criteria
        .validate()
        .context("Invalid configuration")
        .inspect_err(|e| tracing::error!(error = ?e))?;

    let youtube_key = options
        .youtube_api_key
        .clone()
        .context("YOUTUBE_API_KEY not set")?;
    let openai_key = options
        .openai_api_key
        .clone()
        .context("OPENAI_API_KEY not set")?;

    let relevance = if options.keywords.is_empty() {
        KeywordRelevance::from_queries(&criteria.queries)
    } else {
        KeywordRelevance::new(&options.keywords)
    };

    let store = FsDataStore::new(&options.workdir);
    let yt_dlp = YtDlp::new(&options.workdir)
        .with_program(&options.ytdlp_path)
        .with_cookies(options.ytdlp_cookies_path.clone())
        .with_subtitle_langs(&options.subtitle_langs);

    //XXX: the api client serves both discovery and listing, hence the clone
    let youtube = YouTubeApi::new(youtube_key)
        .with_results_per_query(options.results_per_query)
        .with_relevance(relevance);

    let mut notifier = ReportNotifier::new(store.clone()).with_title(&options.report_title);
    if let Some(url) = &options.webhook_url {
        notifier = notifier.with_webhook(url);
    }

    let coordinator = RunCoordinatorBuilder::new()
        .channel_source(youtube.clone())
        .media_source(YtMediaSource::new(youtube, yt_dlp.clone()))
        .text_source(CachedTextSource::new(SubtitleTextSource::new(yt_dlp), store))
        .summarizer(OpenAIClient::new(openai_key))
        .notifier(notifier)
        .build();

    match cli.command {
        Command::Run => {
            let result = coordinator.execute(&criteria).await?;
            println!(
                "{}: {} summarized, {} skipped, {} failed",
                result.status,
                result.summarized_count(),
                result.skipped_count(),
                result.failed_count()
            );

            if result.status == RunStatus::Failure {
                anyhow::bail!("Run finished without a single summary");
            }
        }
        Command::Schedule { interval_hours } => {
            let interval = Duration::from_secs(interval_hours.saturating_mul(3600));
            let handle = Scheduler::start(coordinator, criteria, interval)?;

            let interrupted = tokio::select! {
                signal = tokio::signal::ctrl_c() => {
                    signal.context("Failed to listen for Ctrl-C")?;
                    tracing::info!("Received Ctrl-C, cancelling schedule");
                    handle.cancel();
                    true
                }
                _ = handle.wait_for(ScheduleState::is_cancelled) => false,
            };

            let state = handle.join().await?;
            tracing::info!(runs = state.runs_completed, "Schedule finished");

            if let (false, Some(error)) = (interrupted, state.last_error) {
                anyhow::bail!("Schedule stopped: {error}");
            }
        }
    }

    Ok(())
}
