// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{net::SocketAddr, process::ExitCode, sync::Arc};

use rx_portal_server::{
    api::router,
    auth::service::ensure_admin,
    config::{LogFormat, Settings},
    state::AppState,
    store::InMemoryUserStore,
};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

fn init_tracing(format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(LogFormat::Pretty);
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_tracing(settings.server.log_format);

    let store = Arc::new(InMemoryUserStore::new());
    if let Some(seed) = &settings.seed_admin {
        match ensure_admin(store.as_ref(), &seed.email, &seed.password).await {
            Ok(admin) => tracing::info!(user_id = admin.id, "seed admin account ready"),
            Err(e) => {
                tracing::error!(error = %e, "failed to create seed admin account");
                return ExitCode::FAILURE;
            }
        }
    }

    let state = match AppState::new(store, &settings.token, settings.session.clone()) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(error = %e, "failed to initialise authentication");
            return ExitCode::FAILURE;
        }
    };
    let app = router(state);

    let addr: SocketAddr = match format!("{}:{}", settings.server.host, settings.server.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!(error = %e, host = %settings.server.host, "failed to parse bind address");
            return ExitCode::FAILURE;
        }
    };
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "failed to bind");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(%addr, "Rx portal listening (docs at /docs)");
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    match served {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "server failed");
            ExitCode::FAILURE
        }
    }
}
