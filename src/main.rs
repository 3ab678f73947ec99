//! Messenger Gateway CLI entry point.
//!
//! Provides `serve`, `send`, `proof`, and `verify` subcommands for running the
//! webhook endpoint, sending a one-off message, printing the request proof,
//! or checking a captured webhook body.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::{info, warn};

use messenger_gateway::config::{load_config, load_default_config, runtime_paths, Config};
use messenger_gateway::credentials::{load_credentials, load_default_credentials, Credentials};
use messenger_gateway::messenger::{
    Activity, ClientConfig, ClientFactory, MessengerClient, StaticTokenResolver,
};
use messenger_gateway::{logging, webhook};

/// Signed Messenger Platform client and webhook verifier.
#[derive(Parser)]
#[command(name = "messenger-gateway", version, about)]
struct Cli {
    /// Config file (default: `~/.messenger-gateway/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Credentials file (default: `~/.messenger-gateway/.env`).
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Run the webhook endpoint until interrupted.
    Serve,
    /// Send a text message with the configured page token.
    Send {
        /// Recipient page-scoped user id.
        #[arg(long)]
        to: String,
        /// Message text.
        #[arg(long)]
        text: String,
    },
    /// Print the `appsecret_proof` for the configured page token.
    Proof,
    /// Check a captured webhook body against an `x-hub-signature` value.
    Verify {
        /// File holding the raw request body.
        #[arg(long)]
        file: PathBuf,
        /// The `x-hub-signature` header value.
        #[arg(long)]
        signature: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => load_config(path)?,
        None => load_default_config()?,
    };
    let credentials = match cli.env_file.as_deref() {
        Some(path) => load_credentials(path)?,
        None => load_default_credentials()?,
    };

    match cli.command {
        Command::Serve => handle_serve(&config, &credentials).await,
        Command::Send { to, text } => {
            logging::init_cli();
            handle_send(&config, &credentials, &to, &text).await
        }
        Command::Proof => {
            logging::init_cli();
            handle_proof(&config, &credentials)
        }
        Command::Verify { file, signature } => {
            logging::init_cli();
            handle_verify(&config, &credentials, &file, &signature)
        }
    }
}

/// Run the webhook endpoint and log verified activities.
async fn handle_serve(config: &Config, credentials: &Credentials) -> anyhow::Result<()> {
    let paths = runtime_paths()?;
    let _logging_guard = logging::init_production(&paths.logs_dir)?;

    let client_config = config.messenger.client_config(credentials)?;
    let bind = config.server.bind_addr()?;

    let mut factory = ClientFactory::new(reqwest::Client::new(), client_config.clone());
    if !client_config.has_access_token() {
        let pages = credentials.page_tokens();
        info!(pages = pages.len(), "no global access token, resolving per page");
        factory = factory.with_resolver(Arc::new(StaticTokenResolver::new(pages)));
    }

    let (activity_tx, mut activity_rx) =
        mpsc::channel::<Activity>(config.server.channel_buffer_size);
    let router = webhook::router(&config.server.webhook_path, client_config, activity_tx);

    let consumer = tokio::spawn(async move {
        while let Some(activity) = activity_rx.recv().await {
            match factory.resolve_client_for_activity(&activity).await {
                Ok(_) => info!(
                    from = %activity.from.id,
                    recipient = %activity.recipient.id,
                    echo = activity.is_echo(),
                    "activity received"
                ),
                Err(e) => warn!(error = %e, "activity received for unknown page"),
            }
        }
    });

    webhook::serve(bind, router, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    })
    .await?;

    consumer.abort();
    Ok(())
}

/// Send one text message and print the response status.
async fn handle_send(
    config: &Config,
    credentials: &Credentials,
    to: &str,
    text: &str,
) -> anyhow::Result<()> {
    let client = MessengerClient::new(signing_config(config, credentials)?);
    let response = client
        .send_text(to, text)
        .await
        .context("failed to send message")?;
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    println!("{status} {body}");
    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

/// Print the `appsecret_proof` for the configured page token.
fn handle_proof(config: &Config, credentials: &Credentials) -> anyhow::Result<()> {
    let proof = signing_config(config, credentials)?.proof()?;
    println!("{proof}");
    Ok(())
}

/// Check a raw body file against a signature header value.
fn handle_verify(
    config: &Config,
    credentials: &Credentials,
    file: &Path,
    signature: &str,
) -> anyhow::Result<()> {
    let client_config = config.messenger.client_config(credentials)?;
    let body = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    if client_config.verify_signature(&body, signature) {
        println!("valid");
        Ok(())
    } else {
        println!("invalid");
        std::process::exit(1);
    }
}

/// Client configuration that must carry a global page token.
fn signing_config(config: &Config, credentials: &Credentials) -> anyhow::Result<ClientConfig> {
    let client_config = config.messenger.client_config(credentials)?;
    if !client_config.has_access_token() {
        anyhow::bail!(
            "no page access token configured: set {}",
            config.messenger.access_token_env
        );
    }
    Ok(client_config)
}
