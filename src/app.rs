/*
 * Responsibility
 * - Config読み込み → サービス生成 → Router 組み立て
 * - Middleware の適用 (security headers / CORS / request id + tracing)
 * - axum::serve() で起動
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, routing::get};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api;
use crate::config::Config;
use crate::error::AppError;
use crate::middleware;
use crate::services::auth::build_auth_service;
use crate::services::clock::{Clock, SystemClock};
use crate::state::AppState;

fn init_tracing() {
    // RUST_LOG があればそちらを優先。例:
    // RUST_LOG=info,marketplace_gateway=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // panic も tracing に流す (stderr は収集されないことがある)
        tracing::error!(?info, "panic");

        // 開発: 落として気づかせる。本番: default hook のまま継続
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("failed to load configuration")?;

    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting API in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config, Arc::new(SystemClock))
        .context("failed to build application state")?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Process-level services, injected into the shared application state.
pub fn build_state(config: &Config, clock: Arc<dyn Clock>) -> Result<AppState, AppError> {
    let auth = build_auth_service(config, clock)?;
    Ok(AppState::new(auth, config.store.clone()))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    async fn fallback() -> AppError {
        AppError::not_found("route")
    }

    let router = Router::new()
        .route("/health", get(api::v1::handlers::health::health))
        .nest("/api/v1", api::v1::routes(state.clone()))
        .fallback(fallback)
        .with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router)
}
