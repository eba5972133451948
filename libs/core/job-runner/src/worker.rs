//! The generic JobWorker.
//!
//! Each job goes through `Pending → Executing → Succeeded | Rescheduled | Failed`.
//! Only `ProcessingError::Transient` leads to `Rescheduled`, and only while the
//! job's retry policy has attempts left. Terminal failures are returned from
//! [`JobWorker::execute`] and, when the worker runs its own loop, reported on the
//! failure channel. So are jobs the loop leaves behind when it shuts down.

use crate::config::WorkerConfig;
use crate::error::{JobError, QueueError};
use crate::job::{Job, Processor};
use crate::metrics::WorkerMetrics;
use crate::queue::{JobQueue, QueueReceiver};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Semaphore, mpsc, watch};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Non-terminal and successful results of one execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The job is done.
    Succeeded,
    /// A transient failure; the job is back on the queue.
    Rescheduled { next_attempt: u32, delay: Duration },
}

/// A job that ended in a terminal failure, with the payload it failed on.
#[derive(Debug)]
pub struct JobFailure<J> {
    pub job: J,
    pub error: JobError,
}

/// Worker that executes jobs with a processor.
///
/// - Bounded concurrency (`max_concurrent_jobs`)
/// - Retry with backoff for transient errors only
/// - Failure channel for terminal failures
/// - Graceful shutdown through a `watch` channel; pending jobs are reported as cancelled
pub struct JobWorker<J: Job, P: Processor<J>> {
    processor: Arc<P>,
    queue: Arc<dyn JobQueue<J>>,
    config: WorkerConfig,
    metrics: WorkerMetrics,
    failures: Option<mpsc::UnboundedSender<JobFailure<J>>>,
    concurrency_semaphore: Arc<Semaphore>,
}

impl<J: Job, P: Processor<J>> Clone for JobWorker<J, P> {
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
            queue: Arc::clone(&self.queue),
            config: self.config.clone(),
            metrics: self.metrics.clone(),
            failures: self.failures.clone(),
            concurrency_semaphore: Arc::clone(&self.concurrency_semaphore),
        }
    }
}

impl<J, P> JobWorker<J, P>
where
    J: Job,
    P: Processor<J> + 'static,
{
    /// Create a new worker.
    ///
    /// `queue` is where rescheduled jobs go; it should feed the receiver passed to `run`.
    pub fn new(queue: Arc<dyn JobQueue<J>>, processor: P, config: WorkerConfig) -> Self {
        Self::with_arc_processor(queue, Arc::new(processor), config)
    }

    /// Create a new worker with an Arc processor.
    pub fn with_arc_processor(
        queue: Arc<dyn JobQueue<J>>,
        processor: Arc<P>,
        config: WorkerConfig,
    ) -> Self {
        let metrics = WorkerMetrics::new(&config.queue_name, processor.name());
        let concurrency_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs));

        Self {
            processor,
            queue,
            config,
            metrics,
            failures: None,
            concurrency_semaphore,
        }
    }

    /// Report terminal failures on this channel.
    pub fn with_failure_channel(mut self, failures: mpsc::UnboundedSender<JobFailure<J>>) -> Self {
        self.failures = Some(failures);
        self
    }

    /// Worker configuration.
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Execute one job.
    ///
    /// - success → `Ok(Outcome::Succeeded)`
    /// - transient error with attempts left → job re-enqueued, `Ok(Outcome::Rescheduled)`
    /// - transient error on the last attempt → `Err(JobError::RetriesExhausted)`
    /// - any other error → `Err(JobError::Fatal)`, no retry
    pub async fn execute(&self, job: &J) -> Result<Outcome, JobError> {
        let job_id = job.job_id();
        let attempt = job.attempt();
        let policy = job.retry_policy();

        debug!(
            job_id = %job_id,
            job_type = %job.job_type(),
            attempt = %attempt,
            max_attempts = %policy.max_attempts,
            "Processing job"
        );
        self.metrics.job_received();

        let start = Instant::now();
        let error = match self.processor.process(job).await {
            Ok(()) => {
                self.metrics.job_succeeded(start.elapsed());
                info!(job_id = %job_id, attempt = %attempt, "Job succeeded");
                return Ok(Outcome::Succeeded);
            }
            Err(error) => error,
        };

        let category = error.category();

        if !error.is_retryable() {
            self.metrics.job_failed(category);
            error!(
                job_id = %job_id,
                attempt = %attempt,
                error = %error,
                error_category = %category,
                "Job failed with a non-retryable error"
            );
            return Err(JobError::Fatal {
                job_id,
                attempt,
                source: error,
            });
        }

        if !policy.can_retry(attempt) {
            self.metrics.job_failed(category);
            error!(
                job_id = %job_id,
                attempts = %attempt,
                error = %error,
                "Job exhausted its retry attempts"
            );
            return Err(JobError::RetriesExhausted {
                job_id,
                attempts: attempt,
                source: error,
            });
        }

        let delay = policy.delay_for_attempt(attempt);
        let retry = job.with_retry();
        self.queue.enqueue_in(&retry, delay).await?;
        self.metrics.job_retried();

        warn!(
            job_id = %job_id,
            error = %error,
            next_attempt = %retry.attempt(),
            delay_ms = %delay.as_millis(),
            "Job failed, scheduled retry with backoff"
        );

        Ok(Outcome::Rescheduled {
            next_attempt: retry.attempt(),
            delay,
        })
    }

    /// Execute a job and report a terminal failure on the failure channel.
    async fn handle(&self, job: J) {
        if let Err(error) = self.execute(&job).await {
            self.report(job, error);
        }
    }

    fn report(&self, job: J, error: JobError) {
        match &self.failures {
            Some(failures) => {
                if failures.send(JobFailure { job, error }).is_err() {
                    warn!("Failure channel closed, dropping failure report");
                }
            }
            None => debug!("No failure channel configured"),
        }
    }

    /// Report every job that will not run because the worker is stopping:
    /// delayed retries still held by the queue, then jobs already due but not
    /// yet picked up.
    async fn cancel_pending(&self, receiver: &mut QueueReceiver<J>) -> Result<(), QueueError> {
        let mut pending = self.queue.take_scheduled().await?;

        while let Some(next) = receiver.try_recv() {
            match next {
                Ok(job) => pending.push(job),
                Err(e) => {
                    self.metrics.job_dropped();
                    error!(queue = %receiver.name(), error = %e, "Dropping undecodable job");
                }
            }
        }

        for job in pending {
            let job_id = job.job_id();
            let attempt = job.attempt();

            self.metrics.job_cancelled();
            warn!(
                job_id = %job_id,
                attempt = %attempt,
                "Worker stopped before the job could run"
            );
            self.report(job, JobError::Cancelled { job_id, attempt });
        }

        Ok(())
    }

    /// Run the worker loop.
    ///
    /// Consumes `receiver` until the shutdown flag flips to `true` or its sender
    /// is dropped. The worker keeps a queue handle for rescheduling, so the
    /// receiver itself does not run dry while the worker is alive.
    ///
    /// On the way out, jobs in flight are awaited, then every job that would
    /// have run later is reported on the failure channel as `JobError::Cancelled`.
    pub async fn run(
        &self,
        mut receiver: QueueReceiver<J>,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), QueueError> {
        info!(
            queue = %self.config.queue_name,
            processor = %self.processor.name(),
            max_concurrent_jobs = %self.config.max_concurrent_jobs,
            "Starting job worker"
        );

        let mut in_flight = JoinSet::new();

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping worker");
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("Received shutdown signal, stopping worker");
                        break;
                    }
                }
                next = receiver.recv() => match next {
                    Some(Ok(job)) => {
                        let permit = Arc::clone(&self.concurrency_semaphore)
                            .acquire_owned()
                            .await
                            .map_err(|_| QueueError::Closed(self.config.queue_name.clone()))?;
                        let worker = self.clone();
                        in_flight.spawn(async move {
                            let _permit = permit;
                            worker.handle(job).await;
                        });
                    }
                    Some(Err(e)) => {
                        self.metrics.job_dropped();
                        error!(queue = %receiver.name(), error = %e, "Dropping undecodable job");
                    }
                    None => {
                        info!(queue = %receiver.name(), "Queue closed, stopping worker");
                        break;
                    }
                },
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    if let Err(e) = joined {
                        error!(error = %e, "Job task panicked");
                    }
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Job task panicked");
            }
        }

        self.cancel_pending(&mut receiver).await?;

        info!("Job worker stopped");
        Ok(())
    }
}
