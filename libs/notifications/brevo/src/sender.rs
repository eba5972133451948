//! Mailer - the entry point for template call sites
//!
//! A send loads safety settings, builds the request, applies the policies and
//! dispatches the result, in that order and before returning. Concrete emails
//! implement [`Sendable`] and go through [`Mailer::deliver`].

use crate::builder::build;
use crate::dispatcher::DeliveryDispatcher;
use crate::error::MailerResult;
use crate::job::DeliveryJob;
use crate::models::{Params, Recipient, Recipients};
use crate::safety::{apply, EnvSafetyConfig, SafetyConfigSource};
use async_trait::async_trait;
use job_runner::JobQueue;
use std::sync::Arc;

/// Prepares emails and queues them for delivery
#[derive(Clone)]
pub struct Mailer {
    dispatcher: DeliveryDispatcher,
    safety: Arc<dyn SafetyConfigSource>,
}

impl Mailer {
    pub fn new(dispatcher: DeliveryDispatcher, safety: Arc<dyn SafetyConfigSource>) -> Self {
        Self { dispatcher, safety }
    }

    /// Mailer that reads safety settings from the environment on every send
    pub fn from_env(queue: Arc<dyn JobQueue<DeliveryJob>>) -> Self {
        Self::new(DeliveryDispatcher::new(queue), Arc::new(EnvSafetyConfig))
    }

    /// Build, filter and dispatch a templated email. Returns the job ID.
    pub async fn send_email(
        &self,
        template_id: i64,
        to: impl Into<Recipients>,
        reply_to: Option<Recipient>,
        params: Params,
    ) -> MailerResult<String> {
        let config = self.safety.load()?;
        let request = apply(build(template_id, to, reply_to, params), &config);
        self.dispatcher.dispatch(request).await
    }

    /// Send a concrete email
    pub async fn deliver<S: Sendable + ?Sized>(&self, email: &S) -> MailerResult<String> {
        email.execute(self).await
    }
}

/// A concrete email: knows its template and recipients.
///
/// ```rust,ignore
/// struct WelcomeEmail {
///     user: User,
/// }
///
/// #[async_trait]
/// impl Sendable for WelcomeEmail {
///     async fn execute(&self, mailer: &Mailer) -> MailerResult<String> {
///         mailer
///             .send_email(WELCOME_TEMPLATE_ID, Recipient::new(&self.user.email), None, Params::new())
///             .await
///     }
/// }
/// ```
#[async_trait]
pub trait Sendable: Send + Sync {
    async fn execute(&self, mailer: &Mailer) -> MailerResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MailerError;
    use crate::safety::SafetyConfig;
    use job_runner::{Job, MemoryQueue, QueueReceiver, WorkerConfig};
    use std::collections::BTreeSet;

    fn mailer(config: SafetyConfig) -> (Mailer, QueueReceiver<DeliveryJob>) {
        let (queue, receiver) = MemoryQueue::<DeliveryJob>::new(&WorkerConfig::new("emails"));
        let mailer = Mailer::new(DeliveryDispatcher::new(Arc::new(queue)), Arc::new(config));
        (mailer, receiver)
    }

    struct PasswordReset {
        email: String,
        link: String,
    }

    #[async_trait]
    impl Sendable for PasswordReset {
        async fn execute(&self, mailer: &Mailer) -> MailerResult<String> {
            let mut params = Params::new();
            params.insert("link".to_string(), serde_json::json!(self.link));
            mailer
                .send_email(7, Recipient::new(&self.email), None, params)
                .await
        }
    }

    #[tokio::test]
    async fn test_send_email_applies_policies_before_dispatch() {
        let config = SafetyConfig {
            sandbox_mode: true,
            safe_mode: true,
            allowed_domains: BTreeSet::from(["example.com".to_string()]),
        };
        let (mailer, mut receiver) = mailer(config);

        mailer
            .send_email(
                42,
                vec![Recipient::new("user@example.com"), Recipient::new("x@gmail.com")],
                None,
                Params::new(),
            )
            .await
            .unwrap();

        let job = receiver.recv().await.unwrap().unwrap();
        assert_eq!(job.request.to, vec![Recipient::new("user@example.com")]);
        assert!(job.request.headers.is_some());
    }

    #[tokio::test]
    async fn test_deliver_runs_sendable() {
        let (mailer, mut receiver) = mailer(SafetyConfig::unrestricted());
        let email = PasswordReset {
            email: "user@example.com".to_string(),
            link: "https://example.com/reset".to_string(),
        };

        let job_id = mailer.deliver(&email).await.unwrap();

        let job = receiver.recv().await.unwrap().unwrap();
        assert_eq!(job.job_id(), job_id);
        assert_eq!(job.request.template_id, 7);
        assert_eq!(job.request.params["link"], "https://example.com/reset");
        assert!(job.request.headers.is_none());
    }

    #[tokio::test]
    async fn test_send_email_surfaces_queue_errors() {
        let (mailer, receiver) = mailer(SafetyConfig::unrestricted());
        drop(receiver);

        let err = mailer
            .send_email(1, "user@example.com", None, Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, MailerError::Queue(_)));
    }
}
