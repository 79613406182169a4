// src/main.rs

use clap::Parser;
use std::{path::PathBuf, process::ExitCode};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;

use crate::config::{AppState, Config};

/// ISP operations backend. Without flags, bootstraps the schema and serves HTTP.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Wipe clients, assets and lifecycle history (requires --yes-really-reset)
    #[arg(long)]
    reset_client_data: bool,

    /// Bulk-insert Virtual clients from a CSV export
    #[arg(long, value_name = "PATH")]
    seed_virtual_clients_csv: Option<PathBuf>,

    /// Confirms --reset-client-data
    #[arg(long)]
    yes_really_reset: bool,
}

impl Cli {
    fn wants_maintenance(&self) -> bool {
        self.reset_client_data || self.seed_virtual_clients_csv.is_some()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    if cli.reset_client_data && !cli.yes_really_reset {
        tracing::error!("🛑 Refusing to reset client data without --yes-really-reset");
        return ExitCode::from(2);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("🔥 {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = Config::from_env()?;
    tracing::info!("⚙️ Running in {:?} mode", config.environment);
    let app_state = AppState::new(&config).await?;

    let admin_created = db::schema::bootstrap(&app_state.db_pool, &config.admin).await?;
    tracing::info!("✅ Database schema ready");
    if admin_created {
        tracing::info!("👤 Default admin account created");
    }

    if cli.wants_maintenance() {
        if cli.reset_client_data {
            app_state.maintenance_service.reset_client_data().await?;
        }
        if let Some(path) = &cli.seed_virtual_clients_csv {
            let inserted = app_state
                .maintenance_service
                .seed_virtual_clients_from_csv(path)
                .await?;
            tracing::warn!("🌱 Seeded {} virtual clients from {}", inserted, path.display());
        }
        return Ok(());
    }

    let app = routes::build_router(app_state);

    let listener = TcpListener::bind(config.bind_address()).await?;
    tracing::info!("🚀 Server listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_maintenance_flags() {
        let cli = Cli::parse_from([
            "isp-ops",
            "--reset-client-data",
            "--yes-really-reset",
            "--seed-virtual-clients-csv",
            "clients.csv",
        ]);
        assert!(cli.reset_client_data && cli.yes_really_reset);
        assert_eq!(cli.seed_virtual_clients_csv, Some(PathBuf::from("clients.csv")));
        assert!(cli.wants_maintenance());
    }

    #[test]
    fn no_flags_means_serve() {
        let cli = Cli::parse_from(["isp-ops"]);
        assert!(!cli.wants_maintenance());
    }
}
