pub mod config;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod utils;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::Config;
use crate::services::{telegram_service::TelegramService, update_service::UpdateService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub telegram: TelegramService,
    pub updates: UpdateService,
}

impl AppState {
    pub fn new(config: Config) -> error::Result<Self> {
        let telegram = TelegramService::new(
            config.telegram_bot_token.clone(),
            &config.telegram_api_base,
            Duration::from_secs(config.telegram_timeout_secs),
        )?;
        let updates = UpdateService::new(telegram.clone(), config.webapp_url.clone());

        Ok(Self {
            config: Arc::new(config),
            telegram,
            updates,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let mut app = Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/webapp/result", post(routes::webapp::submit_result))
        .route("/api/webhook/telegram", post(routes::telegram::handle_webhook));

    if let Some(dir) = &state.config.static_dir {
        tracing::info!("Serving calculator pages from: {}", dir);
        app = app.fallback_service(ServeDir::new(dir));
    }

    let cors = middleware::cors::webapp_cors(state.config.cors_allowed_origin.as_deref());

    app.with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
