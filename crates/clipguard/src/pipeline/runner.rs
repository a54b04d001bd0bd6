use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use tracing::{debug, error, info, info_span, warn};

use crate::sanitize;

use super::completion::Completion;
use super::context::EditingContext;
use super::stage::Stage;

/// Lifecycle of a single run. Terminal states are never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        matches!(self, RunState::Succeeded | RunState::Failed)
    }

    pub fn can_advance_to(self, next: RunState) -> bool {
        matches!(
            (self, next),
            (RunState::Pending, RunState::Running)
                | (RunState::Running, RunState::Succeeded)
                | (RunState::Running, RunState::Failed)
        )
    }
}

/// Executes one job's stages in order and produces its single outcome.
///
/// A run is consumed by [`run`](Self::run) together with the job's
/// [`EditingContext`], so neither can be reused for another job.
pub struct PipelineRun {
    stages: Vec<Box<dyn Stage>>,
    state: RunState,
}

impl PipelineRun {
    pub fn new(stages: Vec<Box<dyn Stage>>) -> Self {
        Self {
            stages,
            state: RunState::Pending,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn advance(&mut self, next: RunState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "illegal run transition {:?} -> {:?}",
            self.state,
            next
        );
        debug!(from = ?self.state, to = ?next, "Run state changed");
        self.state = next;
    }

    /// Runs every stage until the first failure, cleans up the workspace and
    /// returns the outcome.
    pub fn run(mut self, mut ctx: EditingContext) -> Completion {
        let _job_span = info_span!("job",
            job_id = %ctx.job.id,
            account = %ctx.job.account,
            video = %ctx.job.video_name,
            chain = %ctx.job.chain,
        )
        .entered();

        self.advance(RunState::Running);
        let started = Instant::now();

        let mut failure = None;
        for stage in &self.stages {
            let _stage_span = info_span!("stage", stage = stage.name()).entered();

            match panic::catch_unwind(AssertUnwindSafe(|| stage.execute(&mut ctx))) {
                Ok(Ok(())) => debug!("Stage completed"),
                Ok(Err(e)) => {
                    warn!(error = %e, "Stage failed");
                    failure = Some(Completion::failure(stage.name(), e.to_string()));
                    break;
                }
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    error!(reason = %reason, "Stage aborted with a fatal error");
                    failure = Some(Completion::failure(
                        stage.name(),
                        format!("fatal error: {}", reason),
                    ));
                    break;
                }
            }
        }

        let completion = match failure {
            Some(completion) => {
                self.advance(RunState::Failed);
                completion
            }
            None => {
                self.advance(RunState::Succeeded);
                Completion::success()
            }
        };

        cleanup(ctx);

        info!(
            success = completion.is_success(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Job finished"
        );
        completion
    }
}

/// Discards every transient artifact of the job.
fn cleanup(ctx: EditingContext) {
    let workspace = ctx.job.workspace;
    let location = sanitize::redact_path(workspace.path());
    if let Err(e) = workspace.close() {
        warn!(workspace = %location, error = %e, "Failed to remove job workspace");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
