//! Bazaar terminal client
//!
//! Interactive client for the Bazaar shopping assistant. A websocket push
//! channel runs in the background with automatic reconnection, streaming
//! the assistant's intermediate tool notices, while the user drives
//! queries, image uploads, and resets over HTTP.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bz_core::config::{self, ClientConfig};
use bz_session::{
    ChannelConnection, ConversationLog, HttpExchange, MessageDispatcher, OperationOutcome,
    SessionOrchestrator, WsTransport,
};

mod output;

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(about = "Bazaar shopping assistant - terminal client")]
#[command(version)]
struct Args {
    /// Backend server URL
    /// Example: http://localhost:8000
    #[arg(short, long)]
    server: Option<String>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration, falling back to defaults
    let config_path = args
        .config
        .clone()
        .unwrap_or_else(config::default_config_path);
    let mut config = if config_path.exists() {
        config::load_config(&config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config from {:?}: {}", config_path, e);
            ClientConfig::default()
        })
    } else {
        ClientConfig::default()
    };
    if let Some(server) = args.server {
        config.server_url = server;
    }

    let log = Arc::new(ConversationLog::new());
    let exchange =
        Arc::new(HttpExchange::from_config(&config).context("Failed to build HTTP client")?);
    let orchestrator = Arc::new(SessionOrchestrator::new(exchange, Arc::clone(&log)));

    // Background push channel; self-heals independently of the REPL
    let transport = WsTransport::new(config.push_url());
    let dispatcher = MessageDispatcher::new(Arc::clone(&log));
    let channel = ChannelConnection::new(transport, dispatcher, config.reconnect.clone());
    channel.open();

    output::print_banner(&config.server_url);

    run_repl(&orchestrator, &log, &channel).await?;

    channel.teardown().await;
    Ok(())
}

async fn run_repl(
    orchestrator: &SessionOrchestrator<HttpExchange>,
    log: &ConversationLog,
    channel: &Arc<ChannelConnection<WsTransport>>,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    // Log entries already rendered; resets shrink the log, which rewinds this
    let mut rendered = 0usize;

    loop {
        render_new_entries(log, &mut rendered);

        let Some(line) = lines.next_line().await? else {
            break; // EOF
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').map_or((line, ""), |(c, rest)| (c, rest.trim())) {
            ("/quit", _) | ("/exit", _) => break,
            ("/help", _) => output::print_help(),
            ("/attach", path) => attach(orchestrator, path).await,
            ("/remove", _) => {
                orchestrator.remove_attachment();
                output::print_info("Attachment removed");
            }
            ("/reset", _) => match orchestrator.reset_session().await {
                OperationOutcome::Rejected => output::print_warning("Reset already in progress"),
                _ => {
                    rendered = 0;
                    output::print_success("Conversation reset");
                }
            },
            ("/health", _) => match orchestrator.health().await {
                Ok(health) => output::print_info(&format!(
                    "Server: {} (agent: {})",
                    health.status,
                    health.agent_status.as_deref().unwrap_or("unknown")
                )),
                Err(e) => output::print_error(&format!("Health check failed: {}", e)),
            },
            ("/status", _) => {
                output::print_info(&format!("Push channel: {}", channel.state()));
                let attachment = orchestrator.attachment();
                match (&attachment.preview, attachment.is_uploaded()) {
                    (Some(preview), true) => {
                        output::print_info(&format!("Attachment: {} (uploaded)", preview))
                    }
                    (Some(preview), false) => {
                        output::print_info(&format!("Attachment: {} (uploading...)", preview))
                    }
                    (None, _) => output::print_info("Attachment: none"),
                }
            }
            (cmd, _) if cmd.starts_with('/') => {
                output::print_warning(&format!("Unknown command: {} (try /help)", cmd));
            }
            _ => match orchestrator.submit_query(line).await {
                OperationOutcome::Rejected => {
                    output::print_warning("A query is already in flight; input discarded")
                }
                OperationOutcome::EmptySubmission => {}
                OperationOutcome::Completed => {}
            },
        }
    }

    render_new_entries(log, &mut rendered);
    Ok(())
}

async fn attach(orchestrator: &SessionOrchestrator<HttpExchange>, path: &str) {
    if path.is_empty() {
        output::print_warning("Usage: /attach <path>");
        return;
    }
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            output::print_error(&format!("Cannot read {}: {}", path, e));
            return;
        }
    };
    let filename = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());

    match orchestrator.attach_image(bytes, path, &filename).await {
        OperationOutcome::Rejected => output::print_warning("An upload is already in flight"),
        _ => {
            if orchestrator.attachment().is_uploaded() {
                output::print_success(&format!("Attached {}", filename));
            }
        }
    }
}

fn render_new_entries(log: &ConversationLog, rendered: &mut usize) {
    let snapshot = log.snapshot();
    if snapshot.len() < *rendered {
        *rendered = 0;
    }
    for entry in &snapshot[*rendered..] {
        output::print_entry(entry);
    }
    *rendered = snapshot.len();
}
