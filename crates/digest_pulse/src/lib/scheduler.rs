//! # Scheduler
//!
//! Re-runs a [`RunExecutor`] at a fixed interval. The loop owns the only
//! copy of the criteria and awaits every run before arming the next one, so
//! at most one run is ever in flight. Its state is published through a
//! `watch` channel and observed via [`ScheduleHandle`].

use std::{any::Any, future::Future, panic::AssertUnwindSafe, sync::Arc, time::Duration};

use chrono::{DateTime, TimeDelta, Utc};
use futures::FutureExt;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    criteria::RunCriteria,
    error::ConfigError,
    outcome::{RunResult, RunStatus},
    report::Notifier,
    yt::{ChannelSource, MediaSource, TextSource},
    RunCoordinator, Summarizer,
};

/// Anything that can perform one full run over a set of criteria.
pub trait RunExecutor: Send + Sync + 'static {
    fn execute(
        &self,
        criteria: &RunCriteria,
    ) -> impl Future<Output = Result<RunResult, ConfigError>> + Send;
}

impl<C, M, T, S, N> RunExecutor for RunCoordinator<C, M, T, S, N>
where
    C: ChannelSource + Send + Sync + 'static,
    M: MediaSource + Send + Sync + 'static,
    T: TextSource + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    fn execute(
        &self,
        criteria: &RunCriteria,
    ) -> impl Future<Output = Result<RunResult, ConfigError>> + Send {
        RunCoordinator::execute(self, criteria)
    }
}

impl<E: RunExecutor> RunExecutor for Arc<E> {
    fn execute(
        &self,
        criteria: &RunCriteria,
    ) -> impl Future<Output = Result<RunResult, ConfigError>> + Send {
        (**self).execute(criteria)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulePhase {
    /// Started, first run not yet begun
    Idle,
    Waiting { next_run_at: DateTime<Utc> },
    Running { started_at: DateTime<Utc> },
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleState {
    pub phase: SchedulePhase,
    pub runs_completed: usize,
    pub last_status: Option<RunStatus>,
    pub last_error: Option<String>,
}

impl Default for ScheduleState {
    fn default() -> Self {
        Self {
            phase: SchedulePhase::Idle,
            runs_completed: 0,
            last_status: None,
            last_error: None,
        }
    }
}

impl ScheduleState {
    pub fn is_cancelled(&self) -> bool {
        self.phase == SchedulePhase::Cancelled
    }
}

pub struct Scheduler;

impl Scheduler {
    /// Validates `criteria` and `interval`, then spawns the schedule loop on
    /// the current runtime. The first run starts immediately.
    pub fn start<E: RunExecutor>(
        executor: E,
        criteria: RunCriteria,
        interval: Duration,
    ) -> Result<ScheduleHandle, ConfigError> {
        criteria.validate()?;
        if interval.is_zero() {
            return Err(ConfigError::ZeroValue { field: "interval" });
        }

        let (state_tx, state_rx) = watch::channel(ScheduleState::default());
        let state_tx = Arc::new(state_tx);
        let cancel = CancellationToken::new();

        tracing::info!(interval_secs = interval.as_secs(), "Starting schedule");
        let task = tokio::spawn(schedule_loop(
            executor,
            criteria,
            interval,
            Arc::clone(&state_tx),
            cancel.clone(),
        ));

        Ok(ScheduleHandle {
            state_tx,
            state_rx,
            cancel,
            task,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn next_run_at(interval: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(interval)
        .ok()
        .and_then(|delta| Utc::now().checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

async fn schedule_loop<E: RunExecutor>(
    executor: E,
    criteria: RunCriteria,
    interval: Duration,
    state: Arc<watch::Sender<ScheduleState>>,
    cancel: CancellationToken,
) {
    loop {
        // cancellation is checked under the state lock so `cancel` and the
        // loop agree on the phase
        let mut started = false;
        state.send_modify(|s| {
            if cancel.is_cancelled() {
                s.phase = SchedulePhase::Cancelled;
            } else {
                s.phase = SchedulePhase::Running {
                    started_at: Utc::now(),
                };
                started = true;
            }
        });
        if !started {
            break;
        }

        tracing::info!("Scheduled run starting");
        match AssertUnwindSafe(executor.execute(&criteria))
            .catch_unwind()
            .await
        {
            Ok(Ok(result)) => {
                tracing::info!(status = %result.status, "Scheduled run finished");
                state.send_modify(|s| {
                    s.runs_completed += 1;
                    s.last_status = Some(result.status);
                    s.last_error = None;
                });
            }
            Ok(Err(e)) => {
                tracing::error!(error = %e, "Scheduled run rejected its criteria, stopping schedule");
                state.send_modify(|s| {
                    s.phase = SchedulePhase::Cancelled;
                    s.last_error = Some(e.to_string());
                });
                break;
            }
            Err(payload) => {
                let message = format!("run panicked: {}", panic_message(payload.as_ref()));
                tracing::error!(error = %message, "Scheduled run failed");
                state.send_modify(|s| {
                    s.runs_completed += 1;
                    s.last_status = Some(RunStatus::Failure);
                    s.last_error = Some(message);
                });
            }
        }

        let mut armed = false;
        state.send_modify(|s| {
            if cancel.is_cancelled() {
                s.phase = SchedulePhase::Cancelled;
            } else {
                s.phase = SchedulePhase::Waiting {
                    next_run_at: next_run_at(interval),
                };
                armed = true;
            }
        });
        if !armed {
            break;
        }

        tokio::select! {
            _ = cancel.cancelled() => {
                state.send_modify(|s| s.phase = SchedulePhase::Cancelled);
                break;
            }
            _ = tokio::time::sleep(interval) => {}
        }
    }

    tracing::info!("Schedule stopped");
}

/// Observes and controls a running schedule.
#[derive(Debug)]
pub struct ScheduleHandle {
    state_tx: Arc<watch::Sender<ScheduleState>>,
    state_rx: watch::Receiver<ScheduleState>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl ScheduleHandle {
    pub fn state(&self) -> ScheduleState {
        self.state_rx.borrow().clone()
    }

    /// Stops the schedule. A waiting schedule is cancelled before this
    /// returns; a run in progress finishes first and is not re-armed.
    pub fn cancel(&self) {
        self.cancel.cancel();
        self.state_tx.send_if_modified(|s| match s.phase {
            SchedulePhase::Idle | SchedulePhase::Waiting { .. } => {
                s.phase = SchedulePhase::Cancelled;
                true
            }
            SchedulePhase::Running { .. } | SchedulePhase::Cancelled => false,
        });
    }

    /// Resolves with the first published state matching `predicate`.
    pub async fn wait_for(&self, predicate: impl FnMut(&ScheduleState) -> bool) -> ScheduleState {
        let mut rx = self.state_rx.clone();
        let result = rx.wait_for(predicate).await.map(|state| state.clone());
        match result {
            Ok(state) => state,
            Err(_) => rx.borrow().clone(),
        }
    }

    /// Waits for the loop to stop and returns its final state.
    pub async fn join(mut self) -> Result<ScheduleState, tokio::task::JoinError> {
        (&mut self.task).await?;
        Ok(self.state())
    }
}
