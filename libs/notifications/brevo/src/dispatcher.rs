//! DeliveryDispatcher - hands prepared requests to the job queue

use crate::error::MailerResult;
use crate::job::DeliveryJob;
use crate::models::EmailRequest;
use job_runner::JobQueue;
use std::sync::Arc;
use tracing::info;

/// Enqueues delivery jobs for out-of-band execution
#[derive(Clone)]
pub struct DeliveryDispatcher {
    queue: Arc<dyn JobQueue<DeliveryJob>>,
}

impl DeliveryDispatcher {
    pub fn new(queue: Arc<dyn JobQueue<DeliveryJob>>) -> Self {
        Self { queue }
    }

    /// Queue a request for delivery. Returns the job ID.
    pub async fn dispatch(&self, request: EmailRequest) -> MailerResult<String> {
        let template_id = request.template_id;
        let recipients = request.to.len();
        let job = DeliveryJob::new(request);

        let job_id = self.queue.enqueue(&job).await?;

        info!(
            job_id = %job_id,
            template_id = %template_id,
            recipients = %recipients,
            queue = %self.queue.name(),
            "Email delivery dispatched"
        );

        Ok(job_id)
    }
}
