//! Brevo Delivery Worker - Entry Point
//!
//! Sends a templated transactional email through Brevo from the command line.

use brevo_delivery_worker::{TemplateEmail, deliver_and_wait, parse_params, parse_recipient};
use brevo_mailer::{BrevoClient, EnvSafetyConfig, MockTransactionalApi, SafetyConfigSource};
use clap::{Parser, Subcommand};
use core_config::Environment;
use core_config::tracing::{init_tracing, install_color_eyre};
use eyre::{Result, WrapErr};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "brevo-delivery-worker")]
#[command(about = "Send templated transactional emails through Brevo")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one templated email and wait until it is delivered or fails
    Send {
        /// Brevo template ID
        #[arg(short, long)]
        template_id: i64,

        /// Recipients, `email` or `Name <email>`, comma separated
        #[arg(long, required = true, value_delimiter = ',')]
        to: Vec<String>,

        /// Reply-to address
        #[arg(short, long)]
        reply_to: Option<String>,

        /// Template parameters as a JSON object
        #[arg(short, long)]
        params: Option<String>,

        /// Use an in-memory API instead of calling Brevo
        #[arg(long)]
        dry_run: bool,

        /// Print Prometheus metrics when done
        #[arg(long)]
        metrics: bool,
    },

    /// Show the safety settings a send would use right now
    Safety,
}

#[tokio::main]
async fn main() -> Result<()> {
    install_color_eyre();

    let environment = Environment::from_env();
    init_tracing(&environment);

    job_runner::init_metrics();

    let cli = Cli::parse();

    match cli.command {
        Commands::Send {
            template_id,
            to,
            reply_to,
            params,
            dry_run,
            metrics,
        } => {
            let email = TemplateEmail {
                template_id,
                to: to.iter().map(|raw| parse_recipient(raw)).collect(),
                reply_to: reply_to.as_deref().map(parse_recipient),
                params: parse_params(params.as_deref())?,
            };
            let safety = Arc::new(EnvSafetyConfig);

            info!(template_id = %template_id, dry_run = %dry_run, "Sending email");

            let report = if dry_run {
                deliver_and_wait(&email, MockTransactionalApi::new(), safety).await?
            } else {
                let client = BrevoClient::from_env().wrap_err("Failed to create Brevo client")?;
                deliver_and_wait(&email, client, safety).await?
            };

            info!(
                job_id = %report.job_id,
                attempts = %report.attempts,
                "Email delivered"
            );

            if metrics {
                println!("{}", job_runner::render_metrics());
            }
        }

        Commands::Safety => {
            let config = EnvSafetyConfig.load()?;
            let status = serde_json::json!({
                "environment": format!("{environment:?}"),
                "sandboxMode": config.sandbox_mode,
                "safeMode": config.safe_mode,
                "allowedDomains": config.allowed_domains,
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }

    Ok(())
}
