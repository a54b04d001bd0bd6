//! Single-use delivery of a job's terminal result.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::oneshot;

/// Message carried by every successful completion.
pub const SUCCESS_MESSAGE: &str = "Finished editing video";

/// Stage reported when a job ends without its runner delivering a result.
pub const CRASHED_STAGE: &str = "pipeline";

/// Terminal outcome of a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Completion {
    Success {
        message: String,
    },
    #[serde(rename_all = "camelCase")]
    Failure {
        failing_stage: String,
        reason: String,
    },
}

impl Completion {
    pub fn success() -> Self {
        Completion::Success {
            message: SUCCESS_MESSAGE.to_string(),
        }
    }

    pub fn failure(failing_stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Completion::Failure {
            failing_stage: failing_stage.into(),
            reason: reason.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Completion::Success { .. })
    }

    /// Human-readable outcome for the submitter.
    pub fn summary(&self) -> String {
        match self {
            Completion::Success { message } => message.clone(),
            Completion::Failure {
                failing_stage,
                reason,
            } => format!("{} failed: {}", failing_stage, reason),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WaitError {
    /// The job may still finish; its outcome is unknown.
    #[error("No result after {0:?}, job outcome is indeterminate")]
    TimedOut(Duration),
}

/// Creates the connected sender/handle pair for one job.
pub fn channel(job_id: impl Into<String>) -> (CompletionSender, JobHandle) {
    let (tx, rx) = oneshot::channel();
    (
        CompletionSender { tx },
        JobHandle {
            job_id: job_id.into(),
            rx,
        },
    )
}

/// Runner side of the completion channel. Consumed by [`send`](Self::send),
/// so at most one result can ever be delivered.
#[derive(Debug)]
pub struct CompletionSender {
    tx: oneshot::Sender<Completion>,
}

impl CompletionSender {
    pub fn send(self, completion: Completion) {
        if self.tx.send(completion).is_err() {
            tracing::debug!("Job handle dropped before completion was delivered");
        }
    }
}

/// Submitter side of the completion channel.
///
/// If the sender is dropped without sending (the worker died), the handle
/// resolves to a failure attributed to [`CRASHED_STAGE`] instead of hanging.
#[derive(Debug)]
pub struct JobHandle {
    job_id: String,
    rx: oneshot::Receiver<Completion>,
}

impl JobHandle {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Waits for the outcome.
    pub async fn completion(self) -> Completion {
        self.rx.await.unwrap_or_else(|_| crashed())
    }

    /// Waits at most `timeout` for the outcome.
    pub async fn completion_timeout(self, timeout: Duration) -> Result<Completion, WaitError> {
        match tokio::time::timeout(timeout, self.rx).await {
            Ok(result) => Ok(result.unwrap_or_else(|_| crashed())),
            Err(_) => Err(WaitError::TimedOut(timeout)),
        }
    }

    /// Blocks the current thread until the outcome arrives.
    ///
    /// # Panics
    /// Panics if called from within an async runtime.
    pub fn wait(self) -> Completion {
        self.rx.blocking_recv().unwrap_or_else(|_| crashed())
    }
}

fn crashed() -> Completion {
    Completion::failure(CRASHED_STAGE, "job terminated without reporting a result")
}
