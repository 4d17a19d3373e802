//! Discovers relevant YouTube channels, summarizes their recent videos and
//! delivers the result as a single digest, once or on a schedule.

mod coordinator;
pub mod criteria;
pub mod error;
mod llm;
pub mod outcome;
pub mod parser;
pub mod report;
pub mod scheduler;
pub mod tracing;
pub mod types;
pub mod yt;

pub use coordinator::{builder::RunCoordinatorBuilder, select_channels, RunCoordinator};
pub use llm::openai;
pub use llm::summarizer::Summarizer;
pub use report::{notifier::ReportNotifier, Notifier};
pub use scheduler::{RunExecutor, ScheduleHandle, SchedulePhase, ScheduleState, Scheduler};
