// SPDX-FileCopyrightText: 2026 Minuta Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `minuta serve` command implementation.

use minuta_config::MinutaConfig;
use minuta_core::MinutaError;
use minuta_gateway::AppState;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::assemble::build_chat_service;

/// Runs the HTTP API until SIGINT or SIGTERM, then drains memory writes.
pub async fn run_serve(config: MinutaConfig) -> Result<(), MinutaError> {
    init_tracing(&config.agent.log_level);
    info!(version = env!("CARGO_PKG_VERSION"), "starting minuta serve");

    let chat = build_chat_service(&config).await?;
    let state = AppState::new(chat.clone());

    let cancel = install_signal_handler();
    let shutdown = {
        let cancel = cancel.clone();
        async move { cancel.cancelled().await }
    };

    minuta_gateway::serve(&config.server, state, shutdown).await?;

    let pending = chat.pending_writes();
    if pending > 0 {
        info!(pending, "waiting for memory writes to finish");
    }
    chat.flush_writes().await;

    info!("minuta serve shutdown complete");
    Ok(())
}

/// Returns a token cancelled on Ctrl+C or SIGTERM.
fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();

    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::terminate()) {
                Ok(mut sigterm) => {
                    tokio::select! {
                        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
                        _ = sigterm.recv() => info!("received SIGTERM, initiating shutdown"),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "failed to install SIGTERM handler, listening for Ctrl+C only");
                    let _ = ctrl_c.await;
                    info!("received SIGINT (Ctrl+C), initiating shutdown");
                }
            }
        }

        #[cfg(not(unix))]
        {
            let _ = ctrl_c.await;
            info!("received Ctrl+C, initiating shutdown");
        }

        token_clone.cancel();
        debug!("shutdown signal handler completed");
    });

    token
}

/// Initializes the tracing subscriber with the given log level.
pub(crate) fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("minuta={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
