//! DeliveryJob - the queued unit of email delivery

use crate::models::EmailRequest;
use chrono::{DateTime, Utc};
use job_runner::{Backoff, Job, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Total delivery attempts, the first one included
pub const MAX_DELIVERY_ATTEMPTS: u32 = 5;

/// Delivery job carrying a snapshot of a prepared request.
///
/// The request is final by the time the job exists: safety policies have
/// already been applied and nothing downstream changes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryJob {
    /// Unique job ID, kept across retries
    pub id: Uuid,

    /// The email to send
    pub request: EmailRequest,

    /// 1-based attempt number
    #[serde(default = "first_attempt")]
    pub attempt: u32,

    /// When the job was first enqueued
    pub enqueued_at: DateTime<Utc>,
}

fn first_attempt() -> u32 {
    1
}

impl DeliveryJob {
    /// Create a job for the first attempt
    pub fn new(request: EmailRequest) -> Self {
        Self {
            id: Uuid::new_v4(),
            request,
            attempt: 1,
            enqueued_at: Utc::now(),
        }
    }
}

impl Job for DeliveryJob {
    fn job_id(&self) -> String {
        self.id.to_string()
    }

    fn attempt(&self) -> u32 {
        self.attempt
    }

    fn with_retry(&self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self.clone()
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            MAX_DELIVERY_ATTEMPTS,
            Backoff::Exponential {
                base: Duration::from_secs(3),
                max: Duration::from_secs(300),
            },
        )
    }

    fn job_type(&self) -> &'static str {
        "email_delivery"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use crate::models::Params;

    #[test]
    fn test_new_job_starts_at_first_attempt() {
        let job = DeliveryJob::new(build(42, "user@example.com", None, Params::new()));

        assert_eq!(job.attempt(), 1);
        assert_eq!(job.job_id(), job.id.to_string());
        assert_eq!(job.job_type(), "email_delivery");
    }

    #[test]
    fn test_retry_keeps_id_and_payload() {
        let job = DeliveryJob::new(build(42, "user@example.com", None, Params::new()));
        let retried = job.with_retry();

        assert_eq!(retried.attempt(), 2);
        assert_eq!(retried.id, job.id);
        assert_eq!(retried.request, job.request);
        assert_eq!(retried.enqueued_at, job.enqueued_at);
    }

    #[test]
    fn test_retry_policy_allows_five_attempts() {
        let job = DeliveryJob::new(build(1, "user@example.com", None, Params::new()));
        let policy = job.retry_policy();

        assert_eq!(policy.max_attempts, MAX_DELIVERY_ATTEMPTS);
        assert!(policy.can_retry(4));
        assert!(!policy.can_retry(5));
    }
}
