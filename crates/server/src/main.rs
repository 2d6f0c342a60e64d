mod handlers;
mod routes;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use genie_core::config::{AppConfig, ConfigOverrides};
use genie_gcs::GcsStore;
use genie_openai::OpenAiClient;
use genie_slack::webhook::WebhookNotifier;

use crate::handlers::CommandHandlers;

/// Slack slash-command bot: `dalle`, `gpt` and `code` commands against the
/// OpenAI APIs, with generated images retained in GCS.
///
/// Every flag can be overridden by its environment variable (`SLACK_TOKEN`,
/// `SEND_TO_SLACK`, `OPEN_AI_TOKEN`, `GCS_BUCKET`, `BOT_DEBUG`, `PORT`).
#[derive(Debug, Parser)]
#[command(name = "genie-server")]
struct Args {
    /// Token for the Slack API.
    #[arg(long)]
    slack_token: Option<String>,
    /// Post command results back to Slack.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    send_to_slack: Option<bool>,
    /// Token for the OpenAI API.
    #[arg(long)]
    openai_token: Option<String>,
    /// GCS bucket for generated image retention.
    #[arg(long)]
    gcs_bucket: Option<String>,
    /// Debug logging.
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    debug: Option<bool>,
    /// HTTP listen port.
    #[arg(long)]
    port: Option<u16>,
}

impl From<Args> for ConfigOverrides {
    fn from(args: Args) -> Self {
        Self {
            slack_token: args.slack_token,
            send_to_slack: args.send_to_slack,
            openai_token: args.openai_token,
            gcs_bucket: args.gcs_bucket,
            debug: args.debug,
            port: args.port,
        }
    }
}

fn init_logging(config: &AppConfig) {
    use genie_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = if config.logging.debug { Level::DEBUG } else { Level::INFO };

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AppConfig::load(ConfigOverrides::from(args))?;
    init_logging(&config);

    let http = reqwest::Client::new();
    let openai = Arc::new(OpenAiClient::new(http.clone(), config.openai.token.clone()));
    let store = Arc::new(GcsStore::new(
        http.clone(),
        config.storage.bucket.clone(),
        config.storage.access_token.clone(),
        config.storage.upload_timeout_secs,
    ));
    let notifier = Arc::new(WebhookNotifier::new(http));

    let handlers = CommandHandlers::new(
        openai.clone(),
        openai,
        store,
        notifier,
        config.slack.send_to_slack,
    );

    // Listener bind failure is the only fatal error; everything downstream is
    // logged and swallowed inside its own task.
    let address = format!("{}:{}", config.server.bind_address, config.server.port);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    tracing::info!(bind_address = %address, send_to_slack = config.slack.send_to_slack, "listening for slash commands");

    axum::serve(listener, routes::router(handlers)).await?;
    Ok(())
}
