// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{process::ExitCode, time::Duration};

use axum_server::Handle;
use relational_portfolio::{
    api::router,
    config::{AppConfig, LogFormat},
    ratelimit::RateLimitSweeper,
    setup_tracing,
    state::AppState,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Time in-flight requests get to finish after a shutdown signal.
const GRACEFUL_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = setup_tracing(LogFormat::from_env()) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    let config = AppConfig::from_env();
    let addr = config.bind_addr;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        price_feed = config.price_feed_mode.as_str(),
        explorer_key = config.etherscan_api_key.is_some(),
        "Configuration loaded"
    );

    let state = match AppState::from_config(config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = CancellationToken::new();
    let sweeper = tokio::spawn(
        RateLimitSweeper::new(state.rate_limits.clone()).run(shutdown.clone()),
    );

    let handle = Handle::new();
    tokio::spawn(shutdown_signal(handle.clone(), shutdown.clone()));

    tracing::info!(%addr, chains = ?state.chains.chain_ids(), "Portfolio server listening (docs at /docs)");

    let served = axum_server::bind(addr)
        .handle(handle)
        .serve(router(state).into_make_service())
        .await;

    shutdown.cancel();
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "Rate limit sweeper task failed");
    }

    match served {
        Ok(()) => {
            tracing::info!("Server stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "HTTP server failed");
            ExitCode::FAILURE
        }
    }
}

/// Wait for Ctrl-C or SIGTERM, then stop background tasks and drain the server.
async fn shutdown_signal(handle: Handle<std::net::SocketAddr>, shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
    shutdown.cancel();
    handle.graceful_shutdown(Some(GRACEFUL_SHUTDOWN_TIMEOUT));
}
