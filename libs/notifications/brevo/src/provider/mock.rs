//! Mock Brevo API for testing

use super::{CreateSmtpEmail, SendSmtpEmail, TransactionalEmailApi};
use crate::error::{ApiError, ClientError};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
enum Behavior {
    Succeed,
    /// Fail with an API error; `None` means forever
    ApiError {
        error: ApiError,
        times: Option<u32>,
    },
    /// Fail with a non-API error
    Unexpected(String),
}

/// Mock API that captures sent emails.
///
/// Clones share the captured state, so a test can keep one handle and pass
/// another to the code under test.
#[derive(Debug, Clone)]
pub struct MockTransactionalApi {
    sent: Arc<Mutex<Vec<SendSmtpEmail>>>,
    attempts: Arc<AtomicU32>,
    behavior: Behavior,
}

impl MockTransactionalApi {
    /// Create a mock that accepts everything
    pub fn new() -> Self {
        Self::with_behavior(Behavior::Succeed)
    }

    /// Create a mock that always fails with an API error
    pub fn failing(status: u16, message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::ApiError {
            error: ApiError::new(Some(status), message),
            times: None,
        })
    }

    /// Create a mock whose first `times` calls fail with an API error
    pub fn failing_times(times: u32, status: u16, message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::ApiError {
            error: ApiError::new(Some(status), message),
            times: Some(times),
        })
    }

    /// Create a mock that fails with an error that is not an API error
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Unexpected(message.into()))
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            attempts: Arc::new(AtomicU32::new(0)),
            behavior,
        }
    }

    /// Get all accepted emails
    pub async fn sent_emails(&self) -> Vec<SendSmtpEmail> {
        self.sent.lock().await.clone()
    }

    /// Get the count of accepted emails
    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Calls made so far, failed ones included
    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Check if an email was accepted for a specific address
    pub async fn was_sent_to(&self, email: &str) -> bool {
        self.sent
            .lock()
            .await
            .iter()
            .any(|e| e.to.iter().any(|to| to.email == email))
    }
}

impl Default for MockTransactionalApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TransactionalEmailApi for MockTransactionalApi {
    async fn send_transac_email(
        &self,
        email: &SendSmtpEmail,
    ) -> Result<CreateSmtpEmail, ClientError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        match &self.behavior {
            Behavior::ApiError { error, times } if times.map_or(true, |n| attempt <= n) => {
                return Err(error.clone().into());
            }
            Behavior::Unexpected(message) => {
                return Err(ClientError::Config(message.clone()));
            }
            _ => {}
        }

        let mut sent = self.sent.lock().await;
        sent.push(email.clone());

        Ok(CreateSmtpEmail {
            message_id: format!("<mock-{}@smtp-relay.mailin.fr>", sent.len()),
        })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
