use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use listkit_core::{AppState, Services};
use listkit_services::{
    AirtableClient, AllowListService, PollService, PollsClient, RecordStore, SpearmintClient,
};

mod cli;
mod config;

use config::{Backend, Config};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("listkit=info,tower_http=debug")),
        )
        .init();

    let args = cli::Args::parse();
    let mut config = Config::load(&args.config)?;
    if let Some(backend) = args.backend {
        config.backend = backend;
    }

    let services = build_services(&config)?;
    let state = AppState::new(config.app_config(), services);

    let app = listkit_api::build_router().with_state(state.clone());

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!(
        backend = ?config.backend,
        "listkit listening on http://{bind_address}"
    );

    let shutdown_signal = async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Shutting down...");
        state.clear_logs();
    };

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    Ok(())
}

fn build_services(config: &Config) -> Result<Services> {
    match config.backend {
        Backend::Memory => {
            tracing::warn!("Using in-memory services; nothing is persisted");
            Ok(Services::in_memory())
        }
        Backend::Http => {
            config.validate_credentials()?;
            Ok(Services {
                records: RecordStore::Airtable(AirtableClient::new(&config.airtable())?),
                entries: AllowListService::Spearmint(SpearmintClient::new(&config.spearmint())?),
                polls: PollService::Http(PollsClient::new(&config.polls())?),
            })
        }
    }
}
