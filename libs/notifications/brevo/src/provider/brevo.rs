//! Brevo HTTP API provider
//!
//! Sends templated emails via `POST {base_url}/smtp/email`.

use super::{CreateSmtpEmail, SendSmtpEmail, TransactionalEmailApi};
use crate::error::{ApiError, ClientError};
use async_trait::async_trait;
use core_config::{env_or_default, env_required, ConfigError, FromEnv};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::{debug, error};

/// Brevo API v3 base URL
pub const DEFAULT_BASE_URL: &str = "https://api.brevo.com/v3";

const DEFAULT_TIMEOUT_SECS: &str = "30";

/// Brevo API settings
#[derive(Clone)]
pub struct BrevoConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl BrevoConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Point the client at another host (a proxy, or a fake server in tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl fmt::Debug for BrevoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BrevoConfig")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl FromEnv for BrevoConfig {
    /// Expects:
    /// - `BREVO_API_KEY`
    /// - `BREVO_API_URL` (optional, defaults to the public API)
    /// - `BREVO_TIMEOUT_SECS` (optional, defaults to 30)
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = env_required("BREVO_API_KEY")?;
        let base_url = env_or_default("BREVO_API_URL", DEFAULT_BASE_URL);
        let timeout_secs = env_or_default("BREVO_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
            .parse::<u64>()
            .map_err(|e| ConfigError::ParseError {
                key: "BREVO_TIMEOUT_SECS".to_string(),
                details: e.to_string(),
            })?;

        Ok(Self {
            api_key,
            base_url,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Brevo transactional email client
pub struct BrevoClient {
    config: BrevoConfig,
    client: Client,
}

impl BrevoClient {
    pub fn new(config: BrevoConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::Config(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Create from environment variables (see [`BrevoConfig::from_env`])
    pub fn from_env() -> Result<Self, ClientError> {
        let config = BrevoConfig::from_env().map_err(|e| ClientError::Config(e.to_string()))?;
        Self::new(config)
    }

    fn endpoint(&self) -> String {
        format!("{}/smtp/email", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl TransactionalEmailApi for BrevoClient {
    async fn send_transac_email(
        &self,
        email: &SendSmtpEmail,
    ) -> Result<CreateSmtpEmail, ClientError> {
        debug!(template_id = %email.template_id, recipients = %email.to.len(), "Sending via Brevo");

        let response = self
            .client
            .post(self.endpoint())
            .header("api-key", &self.config.api_key)
            .header("accept", "application/json")
            .json(email)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Brevo request failed");
                ApiError::new(None, e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await;

        if !status.is_success() {
            let body = body.unwrap_or_else(|e| format!("unreadable error body: {e}"));
            error!(status = %status, body = %body, "Brevo API error");
            return Err(ApiError::new(Some(status.as_u16()), body).into());
        }

        // The message is accepted at this point; a bad body must not trigger a resend.
        let body = body.map_err(|e| accepted_body_error(status, e.to_string()))?;
        let created: CreateSmtpEmail = serde_json::from_str(&body)?;
        debug!(message_id = %created.message_id, "Brevo accepted email");

        Ok(created)
    }

    fn name(&self) -> &'static str {
        "brevo"
    }
}

fn accepted_body_error(status: StatusCode, message: String) -> ClientError {
    error!(status = %status, error = %message, "Brevo accepted email but the response was unreadable");
    ClientError::Response(format!("{status}: {message}"))
}
