//! Status polling for remote jobs.
//!
//! [`PollMachine`] is the per-handle state machine
//! (`PENDING -> PROGRESS* -> SUCCESS | FAILURE`); [`JobPoller`] drives it from a
//! fixed-interval timer. A loop issues one status query per tick and never
//! overlaps queries for the same handle.

use std::sync::Arc;
use std::time::Duration;

use engine_logging::{engine_debug, engine_info, engine_warn};
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::{RemoteError, RemoteService, TaskState, TaskStatus};

/// Failure text used when the status query itself fails.
pub const STATUS_CHECK_FAILED: &str = "Status check failed";
/// Failure text used when the service reports `FAILURE` without a reason.
pub const TASK_FAILED: &str = "Task failed";

/// Receives the outcome of one tracked job. Terminal callbacks arrive at most
/// once, and nothing arrives after them.
pub trait PollSink: Send + Sync {
    fn on_progress(&self, progress: u8);
    fn on_success(&self, result: Value);
    fn on_failure(&self, error: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Pending,
    Progress(u8),
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollStep {
    /// Nothing to report; keep polling.
    Wait,
    Progress(u8),
    Succeeded(Value),
    Failed(String),
}

impl PollStep {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollStep::Succeeded(_) | PollStep::Failed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollMachine {
    phase: PollPhase,
}

impl Default for PollMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PollMachine {
    pub fn new() -> Self {
        Self {
            phase: PollPhase::Pending,
        }
    }

    pub fn phase(&self) -> PollPhase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == PollPhase::Finished
    }

    /// Folds one status query outcome into the machine. A finished machine
    /// ignores everything.
    pub fn advance(&mut self, outcome: Result<TaskStatus, RemoteError>) -> PollStep {
        if self.is_finished() {
            return PollStep::Wait;
        }
        let status = match outcome {
            Ok(status) => status,
            Err(err) => {
                engine_warn!("Status query failed: {}", err);
                self.phase = PollPhase::Finished;
                return PollStep::Failed(STATUS_CHECK_FAILED.to_string());
            }
        };
        match status.state {
            TaskState::Pending | TaskState::Running => PollStep::Wait,
            TaskState::Progress => {
                let percent = status.percent();
                self.phase = PollPhase::Progress(percent);
                PollStep::Progress(percent)
            }
            TaskState::Success => {
                self.phase = PollPhase::Finished;
                PollStep::Succeeded(status.result.unwrap_or(Value::Null))
            }
            TaskState::Failure => {
                self.phase = PollPhase::Finished;
                let error = status
                    .error
                    .filter(|error| !error.trim().is_empty())
                    .unwrap_or_else(|| TASK_FAILED.to_string());
                PollStep::Failed(error)
            }
        }
    }
}

/// A running poll loop. Dropping the handle leaves the loop running.
#[derive(Debug)]
pub struct PollHandle {
    task_id: String,
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Stops the loop before its next tick. No callback runs after this
    /// returns, except one already executing.
    pub fn cancel(&self) {
        if !self.token.is_cancelled() {
            engine_debug!("Cancelling poll for {}", self.task_id);
        }
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the loop to exit.
    pub async fn join(self) {
        let _ = self.task.await;
    }
}

#[derive(Clone)]
pub struct JobPoller {
    remote: Arc<dyn RemoteService>,
}

impl JobPoller {
    pub fn new(remote: Arc<dyn RemoteService>) -> Self {
        Self { remote }
    }

    /// Starts polling `task_id` every `interval`. The first query goes out one
    /// interval after the call. Must be called inside a tokio runtime.
    pub fn track(
        &self,
        task_id: impl Into<String>,
        interval: Duration,
        sink: Arc<dyn PollSink>,
    ) -> PollHandle {
        let task_id = task_id.into();
        let token = CancellationToken::new();
        let task = tokio::spawn(run_poll_loop(
            self.remote.clone(),
            task_id.clone(),
            interval,
            sink,
            token.clone(),
        ));
        engine_debug!("Tracking {} every {:?}", task_id, interval);
        PollHandle {
            task_id,
            token,
            task,
        }
    }
}

async fn run_poll_loop(
    remote: Arc<dyn RemoteService>,
    task_id: String,
    interval: Duration,
    sink: Arc<dyn PollSink>,
    token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    let mut machine = PollMachine::new();
    loop {
        tokio::select! {
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }
        if token.is_cancelled() {
            return;
        }

        let outcome = tokio::select! {
            _ = token.cancelled() => return,
            outcome = remote.status(&task_id) => outcome,
        };
        let step = machine.advance(outcome);
        if step.is_terminal() {
            token.cancel();
        } else if token.is_cancelled() {
            return;
        }

        match step {
            PollStep::Wait => engine_debug!("{} still pending", task_id),
            PollStep::Progress(progress) => {
                engine_debug!("{} progress {}%", task_id, progress);
                sink.on_progress(progress);
            }
            PollStep::Succeeded(result) => {
                engine_info!("{} succeeded", task_id);
                sink.on_success(result);
                return;
            }
            PollStep::Failed(error) => {
                engine_warn!("{} failed: {}", task_id, error);
                sink.on_failure(error);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::RemoteErrorKind;

    fn status(state: TaskState, progress: Option<f64>) -> TaskStatus {
        TaskStatus {
            state,
            progress,
            result: None,
            error: None,
        }
    }

    #[test]
    fn pending_and_running_wait() {
        let mut machine = PollMachine::new();
        assert_eq!(
            machine.advance(Ok(status(TaskState::Pending, Some(0.0)))),
            PollStep::Wait
        );
        assert_eq!(
            machine.advance(Ok(status(TaskState::Running, None))),
            PollStep::Wait
        );
        assert_eq!(machine.phase(), PollPhase::Pending);
    }

    #[test]
    fn progress_is_clamped_and_rounded() {
        let mut machine = PollMachine::new();
        assert_eq!(
            machine.advance(Ok(status(TaskState::Progress, Some(39.6)))),
            PollStep::Progress(40)
        );
        assert_eq!(
            machine.advance(Ok(status(TaskState::Progress, Some(250.0)))),
            PollStep::Progress(100)
        );
        assert_eq!(machine.phase(), PollPhase::Progress(100));
    }

    #[test]
    fn finished_machine_ignores_later_statuses() {
        let mut machine = PollMachine::new();
        let mut done = status(TaskState::Success, None);
        done.result = Some(json!({"job_id": "abc123", "text": "hello"}));
        assert_eq!(
            machine.advance(Ok(done)),
            PollStep::Succeeded(json!({"job_id": "abc123", "text": "hello"}))
        );
        assert_eq!(
            machine.advance(Ok(status(TaskState::Progress, Some(10.0)))),
            PollStep::Wait
        );
        assert!(machine.is_finished());
    }

    #[test]
    fn transport_error_is_a_generic_failure() {
        let mut machine = PollMachine::new();
        let err = RemoteError::new(RemoteErrorKind::Network, "connection refused");
        assert_eq!(
            machine.advance(Err(err)),
            PollStep::Failed(STATUS_CHECK_FAILED.to_string())
        );
    }

    #[test]
    fn failure_without_reason_gets_fallback() {
        let mut machine = PollMachine::new();
        let mut failed = status(TaskState::Failure, None);
        failed.error = Some("  ".to_string());
        assert_eq!(
            machine.advance(Ok(failed)),
            PollStep::Failed(TASK_FAILED.to_string())
        );
    }
}
