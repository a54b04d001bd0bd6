pub mod job;
pub mod pool;

pub use job::{validate_video_name, Job, JobSubmission};
pub use pool::WorkerPool;
