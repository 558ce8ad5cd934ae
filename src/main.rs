use std::{sync::Arc, time::Duration};

mod app;
mod auth;
mod cart;
mod config;
mod kitchen;
mod menu;
mod notice;
mod orders;
mod pwa;
mod state;
mod store;

use crate::kitchen::sync::{spawn_kitchen_sync, TerminalBell};
use crate::menu::catalog::spawn_catalog_sync;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "anandam=debug,axum=info,tower_http=info,sqlx=warn".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = state::AppState::init().await?;

    app_state.catalog.refresh().await;
    app_state.kitchen.refresh().await;
    spawn_catalog_sync(app_state.catalog.clone(), app_state.feed.clone());
    spawn_kitchen_sync(
        app_state.kitchen.clone(),
        app_state.feed.clone(),
        Arc::new(TerminalBell),
        Duration::from_secs(app_state.config.kitchen_poll_secs),
    );

    let app = app::build_app(app_state);
    app::serve(app).await
}
