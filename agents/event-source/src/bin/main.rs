//! Event Source Agent entry point
//!
//! Normalises device telemetry events and dispatches device updates and
//! audit events.

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use event_source::config::EventSourceConfig;
use event_source::contracts::*;
use event_source::engine::EventRuleEngine;
use event_source::error::ValidationError;
use event_source::handler::{create_router, AppState};
use event_source::pipeline::{check_event, EventSource};
use event_source::telemetry::EventSourceMetricsRegistry;
use event_source::validation::EnvelopeSchema;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "event-source")]
#[command(about = "Event Source Agent - device event normalisation and dispatch")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Config file (YAML, TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Host to bind to (overrides the config file)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides the config file and PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run one event envelope through the full pipeline
    Dispatch {
        /// Event envelope JSON file
        #[arg(short, long)]
        file: PathBuf,

        /// Config file (YAML, TOML or JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Check an event envelope without contacting any service
    Validate {
        /// Event envelope JSON file
        #[arg(short, long)]
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config, host, port } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            serve(config).await?;
        }

        Commands::Dispatch { file, config } => {
            let config = load_config(config.as_deref())?;
            let message = read_message(&file)?;

            let registry = EventSourceMetricsRegistry::new()?;
            let source = EventSource::from_config(&config, registry.metrics())?;

            let response = source.save(&message).await;
            source.drain().await;

            println!("{}", serde_json::to_string_pretty(&response)?);

            if !response.is_success() {
                eprintln!(
                    "{} {} {}",
                    "FAILED".red().bold(),
                    response.ret_code,
                    response.description
                );
                std::process::exit(1);
            }
        }

        Commands::Validate { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;

            let (output, valid) = check_message(&content);
            println!("{}", serde_json::to_string_pretty(&output)?);

            if valid {
                eprintln!("{}", "VALID".green().bold());
            } else {
                eprintln!("{}", "INVALID".red().bold());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

async fn serve(config: EventSourceConfig) -> anyhow::Result<()> {
    let addr: SocketAddr = config.bind_address().parse()?;

    let registry = EventSourceMetricsRegistry::new()?;
    let source = EventSource::from_config(&config, registry.metrics())?;
    let state = Arc::new(AppState::new(source, registry));
    let router = create_router(Arc::clone(&state));

    tracing::info!("Starting Event Source Agent on {}", addr);
    tracing::info!(
        device_manager = ?config.services.device_manager,
        event_center = ?config.services.event_center,
        timeout_ms = config.request_timeout_ms,
        "Service {} {}",
        SERVICE_NAME,
        SERVICE_VERSION
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!(
        pending = state.source.pending_fanouts(),
        "Waiting for network fan-outs"
    );
    state.source.drain().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EventSourceConfig> {
    let config = match path {
        Some(path) => EventSourceConfig::load(path)?,
        None => EventSourceConfig::from_env()?,
    };
    Ok(config)
}

fn read_message(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not valid JSON", path.display()))
}

/// Envelope and tag-field checks; returns the report and whether it passed
fn check_message(content: &str) -> (Value, bool) {
    let message: Value = match serde_json::from_str(content) {
        Ok(message) => message,
        Err(e) => {
            return (
                json!({
                    "valid": false,
                    "eventTag": null,
                    "error": ValidationError::MalformedJson(e.to_string()).to_string()
                }),
                false,
            )
        }
    };

    let event_tag = message.get("eventTag").cloned().unwrap_or(Value::Null);

    match check_event(&message, &EnvelopeSchema::save(), &EventRuleEngine::new()) {
        Ok(_) => (json!({"valid": true, "eventTag": event_tag, "error": null}), true),
        Err(e) => (
            json!({"valid": false, "eventTag": event_tag, "error": e.to_string()}),
            false,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_message_reports() {
        let (report, valid) = check_message(
            r#"{"eventTag": "EVENT_DEV_MEBOOST_POWERON_REPORT", "eventData": {"uuid": "d1"}}"#,
        );
        assert!(valid);
        assert_eq!(report["eventTag"], "EVENT_DEV_MEBOOST_POWERON_REPORT");

        let (report, valid) = check_message(
            r#"{"eventTag": "EVENT_DEV_MEBOOST_BASIC_STATUS_REPORT", "eventData": {"uuid": "d1"}}"#,
        );
        assert!(!valid);
        assert!(report["error"].as_str().unwrap().contains("status"));

        let (report, valid) = check_message("{oops");
        assert!(!valid);
        assert_eq!(report["eventTag"], Value::Null);
        assert!(report["error"].as_str().unwrap().contains("not valid JSON"));
    }
}
