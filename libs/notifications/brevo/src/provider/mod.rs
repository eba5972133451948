//! Brevo transactional email API
//!
//! `TransactionalEmailApi` is the single operation this crate needs from
//! Brevo. `BrevoClient` talks to the real API over HTTP, `MockTransactionalApi`
//! records requests in memory.

pub mod brevo;
pub mod mock;

pub use brevo::{BrevoClient, BrevoConfig};
pub use mock::MockTransactionalApi;

use crate::error::ClientError;
use crate::models::{EmailRequest, Params, Recipient};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contact entry in a send request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendSmtpEmailContact {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl From<&Recipient> for SendSmtpEmailContact {
    fn from(recipient: &Recipient) -> Self {
        Self {
            email: recipient.email.clone(),
            name: recipient.name.clone(),
        }
    }
}

/// Body of `POST /smtp/email`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendSmtpEmail {
    pub template_id: i64,
    pub to: Vec<SendSmtpEmailContact>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<SendSmtpEmailContact>,
    #[serde(default)]
    pub params: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
}

impl From<&EmailRequest> for SendSmtpEmail {
    fn from(request: &EmailRequest) -> Self {
        Self {
            template_id: request.template_id,
            to: request.to.iter().map(SendSmtpEmailContact::from).collect(),
            reply_to: request.reply_to.as_ref().map(SendSmtpEmailContact::from),
            params: request.params.clone(),
            headers: request.headers.clone(),
        }
    }
}

/// Response of a successful send
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSmtpEmail {
    pub message_id: String,
}

/// The "send transactional email" operation
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TransactionalEmailApi: Send + Sync {
    /// Send a templated email.
    ///
    /// API and transport failures come back as `ClientError::Api`.
    async fn send_transac_email(&self, email: &SendSmtpEmail)
        -> Result<CreateSmtpEmail, ClientError>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build;
    use serde_json::json;

    #[test]
    fn test_send_smtp_email_mirrors_request() {
        let mut params = Params::new();
        params.insert("code".to_string(), json!("1234"));
        let mut request = build(
            9,
            vec![Recipient::new("a@example.com").with_name("A")],
            Some(Recipient::new("reply@example.com")),
            params,
        );
        request.headers = Some(BTreeMap::from([(
            "X-Sib-Sandbox".to_string(),
            "drop".to_string(),
        )]));

        let body = serde_json::to_value(SendSmtpEmail::from(&request)).unwrap();

        // Same wire shape as the request itself.
        assert_eq!(body, serde_json::to_value(&request).unwrap());
        assert_eq!(
            body,
            json!({
                "templateId": 9,
                "to": [{"email": "a@example.com", "name": "A"}],
                "replyTo": {"email": "reply@example.com"},
                "params": {"code": "1234"},
                "headers": {"X-Sib-Sandbox": "drop"}
            })
        );
    }
}
