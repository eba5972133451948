//! Delivery safety policies
//!
//! Two independent switches are applied to every request before it is queued:
//!
//! - **Safe mode** keeps only recipients whose domain is on the allow-list.
//! - **Sandbox mode** marks the request so Brevo accepts it without delivering.
//!
//! Settings are loaded fresh for every send through a [`SafetyConfigSource`],
//! so flipping an environment variable takes effect without a restart.

use crate::models::{EmailRequest, Recipient};
use core_config::{env_flag, env_list, parse_flag, parse_list, ConfigError, Environment, FromEnv};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

/// Header Brevo checks to accept a message without delivering it
pub const SANDBOX_HEADER: &str = "X-Sib-Sandbox";

/// Value of [`SANDBOX_HEADER`] that drops the message
pub const SANDBOX_HEADER_VALUE: &str = "drop";

const SANDBOX_MODE_VARS: &[&str] = &["BREVO_SANDBOX_MODE", "SANDBOX_MODE"];
const SAFE_MODE_VARS: &[&str] = &["BREVO_SAFE_MODE", "SAFE_MODE"];
const ALLOWED_DOMAINS_VARS: &[&str] = &[
    "BREVO_SAFE_MODE_ALLOWED_DOMAINS",
    "SAFE_MODE_ALLOWED_DOMAINS",
];

/// Safety settings for a single send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafetyConfig {
    /// Mark outgoing requests with the sandbox header
    pub sandbox_mode: bool,

    /// Drop recipients outside `allowed_domains`
    pub safe_mode: bool,

    /// Domains that pass the safe-mode filter
    pub allowed_domains: BTreeSet<String>,
}

impl SafetyConfig {
    /// Build settings from raw variable values.
    ///
    /// Unset switches default to on. Safe mode is forced on when `is_local`.
    /// Domains are comma separated; entries are trimmed and empty ones dropped.
    pub fn from_values(
        sandbox_mode: Option<&str>,
        safe_mode: Option<&str>,
        allowed_domains: Option<&str>,
        is_local: bool,
    ) -> Self {
        Self::new(
            sandbox_mode.map_or(true, parse_flag),
            safe_mode.map_or(true, parse_flag),
            allowed_domains.map(parse_list).unwrap_or_default(),
            is_local,
        )
    }

    fn new(
        sandbox_mode: bool,
        safe_mode: bool,
        allowed_domains: impl IntoIterator<Item = String>,
        is_local: bool,
    ) -> Self {
        Self {
            sandbox_mode,
            safe_mode: safe_mode || is_local,
            allowed_domains: allowed_domains.into_iter().collect(),
        }
    }

    /// Everything off: real delivery to every recipient
    pub fn unrestricted() -> Self {
        Self {
            sandbox_mode: false,
            safe_mode: false,
            allowed_domains: BTreeSet::new(),
        }
    }

    /// Whether a recipient domain passes the safe-mode filter
    pub fn allows(&self, domain: &str) -> bool {
        self.allowed_domains.contains(domain)
    }

    /// Whether a recipient passes the safe-mode filter. Addresses without a
    /// domain never do.
    pub fn allows_recipient(&self, recipient: &Recipient) -> bool {
        recipient
            .domain()
            .is_some_and(|domain| self.allows(&domain))
    }
}

impl Default for SafetyConfig {
    /// Sandbox and safe mode on, nothing allowed.
    fn default() -> Self {
        Self::from_values(None, None, None, false)
    }
}

impl FromEnv for SafetyConfig {
    /// Reads `BREVO_SANDBOX_MODE`, `BREVO_SAFE_MODE` and
    /// `BREVO_SAFE_MODE_ALLOWED_DOMAINS` (or the same names without the
    /// `BREVO_` prefix), plus `APP_ENV` for the local-environment override.
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(
            env_flag(SANDBOX_MODE_VARS, true),
            env_flag(SAFE_MODE_VARS, true),
            env_list(ALLOWED_DOMAINS_VARS),
            Environment::from_env().is_local(),
        ))
    }
}

/// Where the mailer gets its safety settings from on every send.
pub trait SafetyConfigSource: Send + Sync {
    fn load(&self) -> Result<SafetyConfig, ConfigError>;
}

/// Loads settings from the process environment on every call.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSafetyConfig;

impl SafetyConfigSource for EnvSafetyConfig {
    fn load(&self) -> Result<SafetyConfig, ConfigError> {
        SafetyConfig::from_env()
    }
}

/// Fixed settings, handy for tests and one-off tools.
impl SafetyConfigSource for SafetyConfig {
    fn load(&self) -> Result<SafetyConfig, ConfigError> {
        Ok(self.clone())
    }
}

/// Apply the safety policies to a request.
///
/// Recipient filtering runs first, then sandbox marking. An empty recipient
/// list after filtering is a valid result.
pub fn apply(mut request: EmailRequest, config: &SafetyConfig) -> EmailRequest {
    if config.safe_mode {
        let before = request.to.len();
        request
            .to
            .retain(|recipient| config.allows_recipient(recipient));

        let dropped = before - request.to.len();
        if dropped > 0 {
            debug!(
                template_id = %request.template_id,
                dropped = %dropped,
                "Safe mode removed recipients outside the allowed domains"
            );
        }
        if request.to.is_empty() {
            warn!(
                template_id = %request.template_id,
                "Safe mode left no recipients"
            );
        }
    }

    if config.sandbox_mode {
        request.headers = Some(BTreeMap::from([(
            SANDBOX_HEADER.to_string(),
            SANDBOX_HEADER_VALUE.to_string(),
        )]));
    }

    request
}
