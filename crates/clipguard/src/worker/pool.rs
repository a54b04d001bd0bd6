use std::collections::HashSet;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, error, info};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::error::WorkerError;
use crate::pipeline::chain::{AnonymizerSet, ChainType, StageFactory};
use crate::pipeline::completion::{self, Completion, CompletionSender, JobHandle, CRASHED_STAGE};
use crate::pipeline::context::{AccountId, EditingContext};
use crate::pipeline::runner::PipelineRun;
use crate::storage::ArtifactStore;
use crate::worker::job::{validate_video_name, Job, JobSubmission};

type InFlight = Arc<Mutex<HashSet<(AccountId, String)>>>;

/// Marks an account/video pair as being processed until dropped.
struct InFlightGuard {
    key: (AccountId, String),
    registry: InFlight,
}

impl InFlightGuard {
    fn claim(registry: &InFlight, account: AccountId, video_name: &str) -> Result<Self, WorkerError> {
        let key = (account, video_name.to_string());
        let mut set = registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !set.insert(key.clone()) {
            return Err(WorkerError::DuplicateJob {
                account: account.to_string(),
                video: video_name.to_string(),
            });
        }
        Ok(Self {
            key,
            registry: Arc::clone(registry),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        let mut set = self
            .registry
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        set.remove(&self.key);
    }
}

struct QueuedJob {
    job: Job,
    completion: CompletionSender,
    guard: InFlightGuard,
}

/// Fixed set of worker threads running jobs off the submitter's path.
///
/// Each job runs start to finish on one worker; different jobs run
/// concurrently on different workers.
pub struct WorkerPool {
    job_sender: Sender<QueuedJob>,
    workers: Vec<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    factory: Arc<StageFactory>,
    scratch_root: PathBuf,
    in_flight: InFlight,
}

impl WorkerPool {
    /// Creates a pool of `worker_count` threads.
    ///
    /// # Panics
    /// Panics if `worker_count` is 0.
    pub fn new(factory: Arc<StageFactory>, scratch_root: PathBuf, worker_count: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        let (job_sender, job_receiver) = bounded::<QueuedJob>(worker_count * 2);
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let job_rx = job_receiver.clone();
            let shutdown_flag = Arc::clone(&shutdown);
            let worker_factory = Arc::clone(&factory);

            let handle = thread::spawn(move || {
                run_worker(worker_id, job_rx, shutdown_flag, worker_factory);
            });

            workers.push(handle);
        }

        info!("Started {} workers", worker_count);

        Self {
            job_sender,
            workers,
            shutdown,
            factory,
            scratch_root,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Wires the production stages from configuration.
    pub fn from_config(config: &Config, catalog: Arc<dyn Catalog>) -> Self {
        let store = ArtifactStore::new(&config.video_directory, &config.metadata_directory);
        let anonymizers = AnonymizerSet::from_config(&config.anonymizers);
        let factory = Arc::new(StageFactory::new(store, catalog, anonymizers));
        Self::new(factory, config.scratch_root(), config.worker_count)
    }

    /// Validates and takes in an upload, then queues it.
    ///
    /// Unknown chains, bad video names and a second in-flight job for the
    /// same account/video pair are rejected here, before any stage runs.
    /// The returned handle resolves once the job reaches a terminal state.
    pub fn submit(&self, submission: JobSubmission) -> Result<JobHandle, WorkerError> {
        if self.shutdown.load(Ordering::Relaxed) {
            return Err(WorkerError::ChannelClosed);
        }

        let chain: ChainType = submission.chain.parse()?;
        validate_video_name(&submission.video_name)?;
        let guard = InFlightGuard::claim(&self.in_flight, submission.account, &submission.video_name)?;

        let job = Job::intake(submission, chain, &self.scratch_root)?;
        let (sender, handle) = completion::channel(job.id.clone());

        info!(
            "Queued job {} ({} chain) for account {}",
            job.id, job.chain, job.account
        );

        self.job_sender
            .send(QueuedJob {
                job,
                completion: sender,
                guard,
            })
            .map_err(|_| WorkerError::ChannelClosed)?;

        Ok(handle)
    }

    /// Whether a job for this pair is queued or running.
    pub fn is_in_flight(&self, account: AccountId, video_name: &str) -> bool {
        self.in_flight
            .lock()
            .map(|set| set.contains(&(account, video_name.to_string())))
            .unwrap_or(false)
    }

    pub fn factory(&self) -> &StageFactory {
        &self.factory
    }

    pub fn shutdown(&self) {
        info!("Shutting down worker pool...");
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn wait(self) {
        // Drop sender to signal workers to exit
        drop(self.job_sender);

        for (i, worker) in self.workers.into_iter().enumerate() {
            if let Err(e) = worker.join() {
                error!("Worker {} panicked: {:?}", i, e);
            } else {
                debug!("Worker {} finished", i);
            }
        }

        info!("All workers have stopped");
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

fn run_worker(
    worker_id: usize,
    job_receiver: Receiver<QueuedJob>,
    shutdown: Arc<AtomicBool>,
    factory: Arc<StageFactory>,
) {
    debug!("Worker {} started", worker_id);

    loop {
        if shutdown.load(Ordering::Relaxed) {
            debug!("Worker {} received shutdown signal", worker_id);
            break;
        }

        match job_receiver.recv_timeout(std::time::Duration::from_millis(100)) {
            Ok(QueuedJob {
                job,
                completion,
                guard,
            }) => {
                debug!("Worker {} processing job: {}", worker_id, job.id);

                let stages = factory.assemble(job.chain);
                let ctx = EditingContext::new(job);
                let result = panic::catch_unwind(AssertUnwindSafe(|| PipelineRun::new(stages).run(ctx)))
                    .unwrap_or_else(|_| {
                        error!("Worker {} crashed while running a job", worker_id);
                        Completion::failure(CRASHED_STAGE, "job crashed outside of a stage")
                    });

                // Release the pair before notifying so the submitter may resubmit
                drop(guard);
                completion.send(result);
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                continue;
            }
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                debug!("Worker {} job channel disconnected", worker_id);
                break;
            }
        }
    }

    debug!("Worker {} stopped", worker_id);
}
