//! Brevo Delivery Worker
//!
//! Sends one templated email through the full delivery pipeline (safety
//! policies, queue, worker with retries) and waits for the outcome.

use brevo_mailer::{
    DeliveryDispatcher, DeliveryJob, DeliveryProcessor, Mailer, Params, SafetyConfigSource,
    TransactionalEmailApi,
};
use eyre::{Result, WrapErr, eyre};
use job_runner::{JobWorker, MemoryQueue, Outcome, WorkerConfig};
use std::sync::Arc;
use tracing::info;

mod email;

pub use email::{TemplateEmail, parse_recipient};

/// Queue name used for logs and metric labels
pub const QUEUE_NAME: &str = "brevo_emails";

/// How a delivery ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryReport {
    pub job_id: String,
    pub attempts: u32,
}

/// Dispatch `email` and drive its job until it succeeds or fails for good.
///
/// Transient API failures are retried on the job's backoff schedule; the
/// returned error carries the terminal `JobError` otherwise.
pub async fn deliver_and_wait<A>(
    email: &TemplateEmail,
    api: A,
    safety: Arc<dyn SafetyConfigSource>,
) -> Result<DeliveryReport>
where
    A: TransactionalEmailApi + 'static,
{
    let config = WorkerConfig::new(QUEUE_NAME);
    let (queue, mut receiver) = MemoryQueue::<DeliveryJob>::new(&config);
    let queue = Arc::new(queue);

    let worker = JobWorker::new(queue.clone(), DeliveryProcessor::new(api), config);
    let mailer = Mailer::new(DeliveryDispatcher::new(queue), safety);

    let job_id = mailer
        .deliver(email)
        .await
        .wrap_err("Failed to dispatch email")?;

    while let Some(next) = receiver.recv().await {
        let job = next.wrap_err("Failed to decode delivery job")?;

        let outcome = worker
            .execute(&job)
            .await
            .wrap_err_with(|| format!("Delivery of job {job_id} failed"))?;

        match outcome {
            Outcome::Succeeded => {
                return Ok(DeliveryReport {
                    job_id,
                    attempts: job.attempt,
                });
            }
            Outcome::Rescheduled {
                next_attempt,
                delay,
            } => {
                info!(
                    job_id = %job_id,
                    next_attempt = %next_attempt,
                    delay_secs = %delay.as_secs_f64(),
                    "Waiting for retry"
                );
            }
        }
    }

    Err(eyre!("Queue closed before job {job_id} finished"))
}

/// Parse `--params` JSON. Must be an object; absent means no params.
pub fn parse_params(raw: Option<&str>) -> Result<Params> {
    let Some(raw) = raw else {
        return Ok(Params::new());
    };

    match serde_json::from_str(raw).wrap_err("Invalid --params JSON")? {
        serde_json::Value::Object(params) => Ok(params),
        other => Err(eyre!("--params must be a JSON object, got {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brevo_mailer::{MockTransactionalApi, Recipient, SafetyConfig};

    fn email() -> TemplateEmail {
        TemplateEmail {
            template_id: 42,
            to: vec![Recipient::new("user@example.com")],
            reply_to: None,
            params: parse_params(Some(r#"{"name": "Ada"}"#)).unwrap(),
        }
    }

    #[test]
    fn test_parse_params() {
        assert!(parse_params(None).unwrap().is_empty());
        assert_eq!(parse_params(Some(r#"{"a": 1}"#)).unwrap()["a"], 1);
        assert!(parse_params(Some("[1, 2]")).is_err());
        assert!(parse_params(Some("{oops")).is_err());
    }

    #[tokio::test]
    async fn test_deliver_and_wait_success() {
        let api = MockTransactionalApi::new();

        let report = deliver_and_wait(&email(), api.clone(), Arc::new(SafetyConfig::unrestricted()))
            .await
            .unwrap();

        assert_eq!(report.attempts, 1);
        assert!(api.was_sent_to("user@example.com").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_and_wait_retries_api_errors() {
        let api = MockTransactionalApi::failing_times(2, 503, "unavailable");

        let report = deliver_and_wait(&email(), api.clone(), Arc::new(SafetyConfig::unrestricted()))
            .await
            .unwrap();

        assert_eq!(report.attempts, 3);
        assert_eq!(api.sent_count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deliver_and_wait_gives_up_after_five_attempts() {
        let api = MockTransactionalApi::failing(503, "unavailable");

        let err = deliver_and_wait(&email(), api.clone(), Arc::new(SafetyConfig::unrestricted()))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("failed"));
        assert_eq!(api.attempts(), 5);
    }

    #[tokio::test]
    async fn test_deliver_and_wait_stops_on_unexpected_error() {
        let api = MockTransactionalApi::unexpected("boom");

        let result =
            deliver_and_wait(&email(), api.clone(), Arc::new(SafetyConfig::unrestricted())).await;

        assert!(result.is_err());
        assert_eq!(api.attempts(), 1);
    }
}
