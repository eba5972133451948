//! Job queues
//!
//! `JobQueue` is the producer side used by dispatchers and by the worker when it
//! reschedules a job. `MemoryQueue` is an in-process implementation backed by a
//! bounded tokio channel. Jobs cross it as JSON, so whatever the worker executes
//! is exactly what survives a serialization round trip.
//!
//! Delayed jobs stay registered with the queue until they are delivered, so a
//! stopping worker can take back the ones that never became due.

use crate::config::WorkerConfig;
use crate::error::QueueError;
use crate::job::Job;
use async_trait::async_trait;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, warn};

/// Producer side of a job queue.
#[async_trait]
pub trait JobQueue<J: Job>: Send + Sync {
    /// Enqueue a job for immediate execution. Returns the job ID.
    async fn enqueue(&self, job: &J) -> Result<String, QueueError>;

    /// Enqueue a job to become available after `delay`. Returns the job ID.
    async fn enqueue_in(&self, job: &J, delay: Duration) -> Result<String, QueueError>;

    /// Cancel every delayed job that has not been delivered yet and return them.
    async fn take_scheduled(&self) -> Result<Vec<J>, QueueError>;

    /// Queue name.
    fn name(&self) -> &str;
}

/// Delayed payloads not yet handed to the channel
#[derive(Default)]
struct Scheduled {
    next_token: u64,
    pending: HashMap<u64, String>,
}

/// In-process queue.
pub struct MemoryQueue<J> {
    name: String,
    tx: mpsc::Sender<String>,
    scheduled: Arc<Mutex<Scheduled>>,
    _phantom: PhantomData<fn() -> J>,
}

impl<J: Job> MemoryQueue<J> {
    /// Create a queue and the receiver the worker consumes from.
    pub fn new(config: &WorkerConfig) -> (Self, QueueReceiver<J>) {
        let (tx, rx) = mpsc::channel(config.queue_capacity);

        let queue = Self {
            name: config.queue_name.clone(),
            tx,
            scheduled: Arc::new(Mutex::new(Scheduled::default())),
            _phantom: PhantomData,
        };
        let receiver = QueueReceiver {
            name: config.queue_name.clone(),
            rx,
            _phantom: PhantomData,
        };

        (queue, receiver)
    }

    fn closed(&self) -> QueueError {
        QueueError::Closed(self.name.clone())
    }
}

impl<J> Clone for MemoryQueue<J> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            tx: self.tx.clone(),
            scheduled: Arc::clone(&self.scheduled),
            _phantom: PhantomData,
        }
    }
}

#[async_trait]
impl<J: Job> JobQueue<J> for MemoryQueue<J> {
    async fn enqueue(&self, job: &J) -> Result<String, QueueError> {
        let payload = serde_json::to_string(job)?;
        self.tx.send(payload).await.map_err(|_| self.closed())?;

        debug!(queue = %self.name, job_id = %job.job_id(), "Enqueued job");
        Ok(job.job_id())
    }

    async fn enqueue_in(&self, job: &J, delay: Duration) -> Result<String, QueueError> {
        // Snapshot now so later mutations of `job` cannot leak into the retry.
        let payload = serde_json::to_string(job)?;
        if self.tx.is_closed() {
            return Err(self.closed());
        }

        let job_id = job.job_id();
        let token = {
            let mut scheduled = self.scheduled.lock().await;
            let token = scheduled.next_token;
            scheduled.next_token += 1;
            scheduled.pending.insert(token, payload);
            token
        };

        let tx = self.tx.clone();
        let scheduled = Arc::clone(&self.scheduled);
        let name = self.name.clone();
        let scheduled_id = job_id.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            // Held across the send so `take_scheduled` never misses a job in transit.
            let mut scheduled = scheduled.lock().await;
            let Some(payload) = scheduled.pending.remove(&token) else {
                debug!(queue = %name, job_id = %scheduled_id, "Scheduled job was cancelled");
                return;
            };
            if tx.send(payload).await.is_err() {
                warn!(queue = %name, job_id = %scheduled_id, "Queue closed before scheduled job became due");
            }
        });

        debug!(
            queue = %self.name,
            job_id = %job_id,
            delay_ms = %delay.as_millis(),
            "Scheduled job"
        );
        Ok(job_id)
    }

    async fn take_scheduled(&self) -> Result<Vec<J>, QueueError> {
        let pending = {
            let mut scheduled = self.scheduled.lock().await;
            let mut pending: Vec<(u64, String)> = scheduled.pending.drain().collect();
            pending.sort_by_key(|(token, _)| *token);
            pending
        };

        pending
            .into_iter()
            .map(|(_, payload)| serde_json::from_str(&payload).map_err(QueueError::from))
            .collect()
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Consumer side of a `MemoryQueue`.
pub struct QueueReceiver<J> {
    name: String,
    rx: mpsc::Receiver<String>,
    _phantom: PhantomData<fn() -> J>,
}

impl<J: Job> QueueReceiver<J> {
    /// Wait for the next job.
    ///
    /// Returns `None` once every producer (including pending scheduled jobs) is gone.
    pub async fn recv(&mut self) -> Option<Result<J, QueueError>> {
        let payload = self.rx.recv().await?;
        Some(serde_json::from_str(&payload).map_err(QueueError::from))
    }

    /// Take the next job if one is ready right now.
    pub fn try_recv(&mut self) -> Option<Result<J, QueueError>> {
        let payload = self.rx.try_recv().ok()?;
        Some(serde_json::from_str(&payload).map_err(QueueError::from))
    }

    /// Queue name.
    pub fn name(&self) -> &str {
        &self.name
    }
}
