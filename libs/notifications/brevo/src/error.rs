//! Error types for the Brevo mailer.

use core_config::ConfigError;
use job_runner::QueueError;
use thiserror::Error;

/// Result type for mailer operations.
pub type MailerResult<T> = Result<T, MailerError>;

/// Errors raised while preparing or dispatching an email.
#[derive(Debug, Error)]
pub enum MailerError {
    /// Settings could not be loaded
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The delivery job could not be queued
    #[error("failed to enqueue delivery: {0}")]
    Queue(#[from] QueueError),

    /// The API client could not be created
    #[error(transparent)]
    Client(#[from] ClientError),
}

/// Failure reported by the Brevo API or the transport in front of it.
///
/// This is the error kind deliveries are retried on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Brevo API error{}: {message}", status_suffix(.status))]
pub struct ApiError {
    /// HTTP status, when a response was received
    pub status: Option<u16>,
    pub message: String,
}

impl ApiError {
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({s})")).unwrap_or_default()
}

/// Errors from a `TransactionalEmailApi` implementation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// API-level or transport-level failure
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Request or response body could not be (de)serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Client misconfiguration
    #[error("client configuration error: {0}")]
    Config(String),

    /// An accepted request whose response could not be read
    #[error("unreadable response: {0}")]
    Response(String),
}
