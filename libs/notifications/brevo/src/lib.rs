//! Brevo transactional email delivery
//!
//! Prepares templated emails, applies delivery safety policies and sends them
//! through the Brevo API from a background job.
//!
//! ## Flow
//!
//! caller → `build` → `safety::apply` → `DeliveryDispatcher` → [queue] →
//! `DeliveryProcessor` → `TransactionalEmailApi`
//!
//! ## Components
//!
//! - **Models**: `EmailRequest`, `Recipient`, `Recipients`
//! - **Safety**: `SafetyConfig` (sandbox mode, safe mode, allowed domains) and `apply`
//! - **Delivery**: `DeliveryJob`, `DeliveryDispatcher`, `DeliveryProcessor`
//! - **Providers**: `BrevoClient` (HTTP) and `MockTransactionalApi` (always available)
//! - **Mailer**: `Mailer` and the `Sendable` trait for concrete emails
//!
//! ## Usage
//!
//! ```ignore
//! use brevo_mailer::{BrevoClient, DeliveryJob, DeliveryProcessor, Mailer};
//! use job_runner::{JobWorker, MemoryQueue, WorkerConfig};
//!
//! let config = WorkerConfig::new("emails");
//! let (queue, receiver) = MemoryQueue::<DeliveryJob>::new(&config);
//! let queue = Arc::new(queue);
//!
//! let processor = DeliveryProcessor::new(BrevoClient::from_env()?);
//! let worker = JobWorker::new(queue.clone(), processor, config);
//! tokio::spawn(async move { worker.run(receiver, shutdown_rx).await });
//!
//! let mailer = Mailer::from_env(queue);
//! mailer.send_email(42, "user@example.com", None, Params::new()).await?;
//! ```

pub mod builder;
pub mod dispatcher;
pub mod error;
pub mod job;
pub mod models;
pub mod processor;
pub mod provider;
pub mod safety;
pub mod sender;

pub use builder::build;
pub use dispatcher::DeliveryDispatcher;
pub use error::{ApiError, ClientError, MailerError, MailerResult};
pub use job::{DeliveryJob, MAX_DELIVERY_ATTEMPTS};
pub use models::{EmailRequest, Params, Recipient, Recipients};
pub use processor::DeliveryProcessor;
pub use provider::{
    BrevoClient, BrevoConfig, CreateSmtpEmail, MockTransactionalApi, SendSmtpEmail,
    TransactionalEmailApi,
};
pub use safety::{apply, EnvSafetyConfig, SafetyConfig, SafetyConfigSource};
pub use sender::{Mailer, Sendable};
