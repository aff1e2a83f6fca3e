//! Naughts Server - WebSocket matchmaking server.

#![warn(missing_docs)]

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use naughts_server::{InviteCodeGenerator, Lobby, ServerConfig, router, spawn_hub};
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    initialize_tracing();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            public_url,
        } => {
            let config =
                ServerConfig::load_or_default(&config)?.with_overrides(host, port, public_url);
            run_server(config).await
        }
    }
}

/// Run the WebSocket game server until Ctrl+C.
#[instrument(skip_all, fields(addr = %config.bind_addr()))]
async fn run_server(config: ServerConfig) -> Result<()> {
    let lobby = Lobby::new(InviteCodeGenerator::from_entropy(), config.public_url().clone());
    let (hub, hub_task) = spawn_hub(lobby);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    info!("Server ready at ws://{}/ws", config.bind_addr());

    axum::serve(listener, router(hub))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Upgraded sockets may still hold hub handles.
    hub_task.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,naughts_server=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
