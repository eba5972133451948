use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Default filter for local runs: chatty for our crates, quiet for HTTP internals.
const LOCAL_FILTER: &str =
    "info,brevo_delivery_worker=debug,brevo_mailer=debug,job_runner=debug,hyper=warn,reqwest=warn";

/// Default filter in production.
const PRODUCTION_FILTER: &str = "info,hyper=warn,reqwest=warn";

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in main() before any fallible operations. Safe to call
/// multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Initialize tracing with environment-aware configuration and error span capture.
///
/// - **Production**: JSON lines, no module targets.
/// - **Development / Test**: pretty, human-readable output.
///
/// Both include the `tracing_error::ErrorLayer` so eyre reports carry span traces.
/// `RUST_LOG` overrides the default filter.
///
/// Safe to call more than once; later calls are ignored (common in tests).
pub fn init_tracing(environment: &Environment) {
    let is_production = environment.is_production();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production {
            EnvFilter::new(PRODUCTION_FILTER)
        } else {
            EnvFilter::new(LOCAL_FILTER)
        }
    });

    let result = if is_production {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(false)
                    .flatten_event(true),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(false)
                    .with_line_number(false)
                    .pretty(),
            )
            .with(tracing_error::ErrorLayer::default())
            .with(filter)
            .try_init()
    };

    match result {
        Ok(_) => {
            info!(environment = ?environment, "Tracing initialized");
        }
        Err(_) => {
            debug!("Tracing already initialized, skipping re-initialization");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filters_are_valid() {
        assert!(EnvFilter::try_new(LOCAL_FILTER).is_ok());
        assert!(EnvFilter::try_new(PRODUCTION_FILTER).is_ok());
    }

    #[test]
    fn test_local_filter_is_verbose_for_mail_crates() {
        assert!(LOCAL_FILTER.contains("brevo_mailer=debug"));
        assert!(LOCAL_FILTER.contains("job_runner=debug"));
        assert!(!PRODUCTION_FILTER.contains("=debug"));
    }

    #[test]
    fn test_repeated_init_is_harmless() {
        for env in [Environment::Test, Environment::Production, Environment::Development] {
            init_tracing(&env);
        }
    }

    #[test]
    fn test_rust_log_overrides_default_filter() {
        temp_env::with_var("RUST_LOG", Some("brevo_mailer=trace"), || {
            init_tracing(&Environment::Test);
        });
    }
}
