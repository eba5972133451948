//! Job Runner
//!
//! A small in-process background job runner.
//!
//! ## Features
//!
//! - **Generic worker**: `JobWorker<J, P>` executes any `Job` with any `Processor`
//! - **Typed retries**: only `ProcessingError::Transient` is rescheduled, everything
//!   else fails immediately
//! - **Retry policy**: attempt ceiling plus exponential or polynomial backoff with jitter
//! - **Serialization-stable queue**: `MemoryQueue` round-trips every job through JSON
//! - **Failure channel**: terminal failures are reported as `JobFailure`s
//! - **Prometheus metrics**: counters and histograms via the `metrics` facade
//!
//! ## Example
//!
//! ```rust,ignore
//! use job_runner::{JobWorker, MemoryQueue, WorkerConfig};
//!
//! let config = WorkerConfig::new("emails").with_max_concurrent_jobs(4);
//! let (queue, receiver) = MemoryQueue::<MyJob>::new(&config);
//! let worker = JobWorker::new(Arc::new(queue.clone()), processor, config);
//!
//! queue.enqueue(&job).await?;
//! worker.run(receiver, shutdown_rx).await?;
//! ```

mod config;
mod error;
mod job;
pub mod metrics;
mod queue;
mod retry;
mod worker;

// Re-export main types
pub use config::WorkerConfig;
pub use error::{ErrorCategory, JobError, ProcessingError, QueueError};
pub use job::{Job, Processor};
pub use metrics::{WorkerMetrics, init_metrics, render_metrics};
pub use queue::{JobQueue, MemoryQueue, QueueReceiver};
pub use retry::{Backoff, RetryPolicy};
pub use worker::{JobFailure, JobWorker, Outcome};
