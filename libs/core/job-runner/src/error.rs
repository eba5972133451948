//! Job error types and error categorization
//!
//! Errors are categorized to determine retry behavior:
//! - **Transient**: the designated recoverable failure, rescheduled with backoff
//! - **Permanent**: everything else, fails the job on the spot

use std::fmt;
use thiserror::Error;

/// Category of error for determining retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Recoverable failure - reschedule until the attempt budget runs out
    Transient,
    /// Unrecoverable failure - never retried
    Permanent,
}

impl ErrorCategory {
    /// Whether errors of this category may be rescheduled at all
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Transient)
    }

    /// Label used for metrics and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transient => "transient",
            ErrorCategory::Permanent => "permanent",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by a `Processor`.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Recoverable error (upstream API failure, network hiccup)
    #[error("transient error: {message}")]
    Transient {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Unrecoverable error (bad payload, programming error)
    #[error("permanent error: {message}")]
    Permanent {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ProcessingError {
    /// Create a transient error.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
            source: None,
        }
    }

    /// Create a transient error with a source.
    pub fn transient_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Transient {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a permanent error.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent {
            message: message.into(),
            source: None,
        }
    }

    /// Create a permanent error with a source.
    pub fn permanent_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Permanent {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get the error category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            ProcessingError::Transient { .. } => ErrorCategory::Transient,
            ProcessingError::Permanent { .. } => ErrorCategory::Permanent,
            ProcessingError::Serialization(_) => ErrorCategory::Permanent,
        }
    }

    /// Check if this error may be rescheduled.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }
}

/// Queue errors
#[derive(Debug, Error)]
pub enum QueueError {
    /// The consuming side of the queue is gone
    #[error("queue '{0}' is closed")]
    Closed(String),

    /// Job could not be encoded or decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Terminal job errors, as seen by whoever executes a job.
#[derive(Debug, Error)]
pub enum JobError {
    /// Transient failures used up the whole attempt budget
    #[error("job {job_id} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        job_id: String,
        attempts: u32,
        #[source]
        source: ProcessingError,
    },

    /// A non-retryable failure
    #[error("job {job_id} failed on attempt {attempt}: {source}")]
    Fatal {
        job_id: String,
        attempt: u32,
        #[source]
        source: ProcessingError,
    },

    /// The worker stopped before the job's next attempt ran
    #[error("job {job_id} was waiting for attempt {attempt} when the worker stopped")]
    Cancelled { job_id: String, attempt: u32 },

    /// The retry could not be put back on the queue
    #[error("failed to reschedule job: {0}")]
    Queue(#[from] QueueError),
}

impl JobError {
    /// The processing error behind this failure, if any.
    pub fn processing_error(&self) -> Option<&ProcessingError> {
        match self {
            JobError::RetriesExhausted { source, .. } | JobError::Fatal { source, .. } => {
                Some(source)
            }
            JobError::Cancelled { .. } | JobError::Queue(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(ErrorCategory::Transient.is_retryable());
        assert!(!ErrorCategory::Permanent.is_retryable());
        assert_eq!(ErrorCategory::Transient.to_string(), "transient");
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(ProcessingError::transient("api down").is_retryable());
        assert!(!ProcessingError::permanent("bad data").is_retryable());

        let serde_err = serde_json::from_str::<u32>("nope").unwrap_err();
        assert!(!ProcessingError::from(serde_err).is_retryable());
    }

    #[test]
    fn test_job_error_exposes_processing_error() {
        let err = JobError::Fatal {
            job_id: "job-1".to_string(),
            attempt: 1,
            source: ProcessingError::permanent("boom"),
        };
        assert_eq!(
            err.processing_error().map(ProcessingError::category),
            Some(ErrorCategory::Permanent)
        );
        assert!(err.to_string().contains("job-1"));

        let err = JobError::Queue(QueueError::Closed("emails".to_string()));
        assert!(err.processing_error().is_none());

        let err = JobError::Cancelled {
            job_id: "job-2".to_string(),
            attempt: 3,
        };
        assert!(err.processing_error().is_none());
        assert!(err.to_string().contains("attempt 3"));
    }
}
