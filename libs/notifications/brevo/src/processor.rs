//! DeliveryProcessor - executes delivery jobs against the Brevo API
//!
//! API errors are transient and get the job rescheduled; every other client
//! error is permanent and fails the job on the spot.

use crate::error::ClientError;
use crate::job::DeliveryJob;
use crate::provider::{SendSmtpEmail, TransactionalEmailApi};
use async_trait::async_trait;
use job_runner::{ProcessingError, Processor};
use std::sync::Arc;
use tracing::{debug, info};

/// Processor that sends delivery jobs through a `TransactionalEmailApi`
pub struct DeliveryProcessor<A: TransactionalEmailApi> {
    api: Arc<A>,
}

impl<A: TransactionalEmailApi> DeliveryProcessor<A> {
    pub fn new(api: A) -> Self {
        Self { api: Arc::new(api) }
    }
}

fn classify(error: ClientError) -> ProcessingError {
    match error {
        ClientError::Api(api_error) => {
            ProcessingError::transient_with_source("Brevo API call failed", api_error)
        }
        other => ProcessingError::permanent_with_source("email delivery failed", other),
    }
}

#[async_trait]
impl<A: TransactionalEmailApi + 'static> Processor<DeliveryJob> for DeliveryProcessor<A> {
    async fn process(&self, job: &DeliveryJob) -> Result<(), ProcessingError> {
        debug!(
            job_id = %job.id,
            template_id = %job.request.template_id,
            attempt = %job.attempt,
            provider = %self.api.name(),
            to = ?job.request.to.iter().map(|r| r.email.as_str()).collect::<Vec<_>>(),
            "Delivering email"
        );

        let email = SendSmtpEmail::from(&job.request);
        let created = self.api.send_transac_email(&email).await.map_err(classify)?;

        info!(
            job_id = %job.id,
            template_id = %job.request.template_id,
            message_id = %created.message_id,
            "Email delivered"
        );

        Ok(())
    }

    fn name(&self) -> &'static str {
        "email_delivery"
    }
}
