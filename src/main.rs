use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;

use visit_tracker::config::Args;
use visit_tracker::country::WhoisClient;
use visit_tracker::state::AppState;
use visit_tracker::store::LogStore;
use visit_tracker::worker::{log_channel, log_writer};
use visit_tracker::{build_router, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    telemetry::init();
    let args = Args::parse();

    let store = LogStore::new(&args.log_file);
    let events = store.load().await;
    tracing::info!(events = events.len(), path = %args.log_file.display(), "visit log loaded");

    let client = reqwest::Client::new();
    let whois = Arc::new(WhoisClient::new(
        client.clone(),
        &args.whois_url,
        args.whois_timeout(),
    ));
    let (log_tx, log_rx) = log_channel();
    let state = Arc::new(AppState::new(&args, client, whois, events, log_tx));

    // spawn the background log writer
    tokio::spawn(log_writer(log_rx, store, state.traffic.clone()));

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;

    tracing::info!(%addr, "visit tracker listening");
    tracing::info!(
        burst_limit = args.burst_limit,
        burst_window_ms = args.burst_window_ms,
        block_secs = ?args.block_secs,
        hit_limit = args.hit_limit,
        "abuse guard configured"
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
