//! Strictly Squares - Unified CLI
//!
//! Squares pool server with several modes of operation.

#![warn(missing_docs)]

mod cli;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use strictly_squares::{
    AppState, AxisNumbers, BroadcastGateway, GridRepository, ServerConfig, resolve_winner, router,
    shuffle_axis,
};
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,strictly_squares=debug")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            host,
            port,
            db,
        } => {
            let config = ServerConfig::load_or_default(&config)?
                .with_env_overrides()
                .with_overrides(host, port, db);
            run_http_server(config).await
        }
        Command::Migrate { db } => run_migrate(db),
        Command::Shuffle => {
            println!("{}", shuffle_axis());
            Ok(())
        }
        Command::Resolve {
            x_score,
            y_score,
            x_axis,
            y_axis,
        } => run_resolve(x_score, y_score, &x_axis, &y_axis),
    }
}

/// Run the HTTP server
#[instrument(skip(config), fields(host = %config.host(), port = config.port()))]
async fn run_http_server(config: ServerConfig) -> Result<()> {
    info!(database_path = %config.database_path(), "Starting Strictly Squares HTTP server");

    let repo = GridRepository::with_busy_timeout(
        config.database_path().clone(),
        *config.busy_timeout_ms(),
    )?;
    repo.run_migrations()?;

    let gateway = BroadcastGateway::new(*config.event_buffer());
    gateway.log_events();
    let state = AppState::new(repo, Arc::new(gateway));
    let app = router(state);

    let listener = tokio::net::TcpListener::bind((config.host().as_str(), *config.port())).await?;
    info!("Server ready at http://{}:{}/", config.host(), config.port());

    axum::serve(listener, app).await?;
    info!("Server stopped");
    Ok(())
}

/// Apply migrations to the database at `db`
#[instrument]
fn run_migrate(db: String) -> Result<()> {
    let repo = GridRepository::new(db)?;
    repo.run_migrations()?;
    info!(path = %repo.db_path(), "Migrations applied");
    Ok(())
}

/// Print the winning cell for a score
#[instrument(skip(x_axis, y_axis))]
fn run_resolve(x_score: u32, y_score: u32, x_axis: &AxisNumbers, y_axis: &AxisNumbers) -> Result<()> {
    let position = resolve_winner(x_score, y_score, x_axis, y_axis);
    let coords = position.to_coords();
    println!(
        "cell {} (row {}, col {})",
        position,
        coords.row(),
        coords.col()
    );
    Ok(())
}
