//! Job and processor traits.

use crate::error::ProcessingError;
use crate::retry::RetryPolicy;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for job payloads.
///
/// A job is plain data: it is serialized onto the queue and deserialized by the
/// worker, so everything the processor needs must live in the payload.
///
/// # Example
///
/// ```rust,ignore
/// use job_runner::Job;
///
/// #[derive(Clone, Serialize, Deserialize)]
/// struct ReportJob {
///     id: String,
///     attempt: u32,
/// }
///
/// impl Job for ReportJob {
///     fn job_id(&self) -> String {
///         self.id.clone()
///     }
///
///     fn attempt(&self) -> u32 {
///         self.attempt
///     }
///
///     fn with_retry(&self) -> Self {
///         Self {
///             attempt: self.attempt + 1,
///             ..self.clone()
///         }
///     }
/// }
/// ```
pub trait Job: Serialize + DeserializeOwned + Send + Sync + Clone + 'static {
    /// Stable identifier, kept across retries.
    fn job_id(&self) -> String;

    /// 1-based number of the execution this payload is for.
    fn attempt(&self) -> u32;

    /// Copy of this job for the next attempt.
    fn with_retry(&self) -> Self;

    /// Retry policy for this job type.
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }

    /// Job type name for logging and metrics.
    fn job_type(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Trait for job processors.
///
/// Return `ProcessingError::Transient` only for failures that are worth
/// retrying; any other error fails the job without a retry.
#[async_trait]
pub trait Processor<J: Job>: Send + Sync {
    /// Process a single job.
    async fn process(&self, job: &J) -> Result<(), ProcessingError>;

    /// Get the processor name for logging.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Clone, Serialize, Deserialize)]
    struct TestJob {
        id: String,
        attempt: u32,
    }

    impl Job for TestJob {
        fn job_id(&self) -> String {
            self.id.clone()
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
    }

    #[test]
    fn test_job_trait() {
        let job = TestJob {
            id: "job-1".to_string(),
            attempt: 1,
        };

        assert_eq!(job.job_id(), "job-1");
        assert_eq!(job.retry_policy().max_attempts, 5);

        let retried = job.with_retry();
        assert_eq!(retried.attempt(), 2);
        assert_eq!(retried.job_id(), job.job_id());
        assert!(job.job_type().ends_with("TestJob"));
    }
}
