use std::net::SocketAddr;

use thread_calc_bot::{
    build_router,
    config::{get_config, init_config},
    services::polling_service::PollingService,
    AppState,
};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    init_config()?;
    let config = get_config();
    info!(?config, "Configuration loaded");

    let app_state = AppState::new(config.clone())?;

    if let Some(url) = &config.menu_button_url {
        match app_state
            .telegram
            .set_chat_menu_button(&config.menu_button_text, url)
            .await
        {
            Ok(_) => info!("Chat menu button set to {}", url),
            Err(e) => warn!(error = %e, "Failed to set chat menu button"),
        }
    }

    let poller = match config.webhook_target() {
        Some(target) => {
            ensure_webhook(&app_state, &target).await;
            None
        }
        None => {
            if let Err(e) = app_state.telegram.delete_webhook(false).await {
                warn!(error = %e, "Could not remove webhook before polling");
            }
            let polling =
                PollingService::new(app_state.telegram.clone(), app_state.updates.clone());
            Some(tokio::spawn(polling.run()))
        }
    };

    let app = build_router(app_state.clone());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = poller {
        handle.abort();
    }
    if config.uses_webhook() {
        match app_state.telegram.delete_webhook(true).await {
            Ok(_) => info!("Telegram webhook removed"),
            Err(e) => warn!(error = %e, "Failed to remove Telegram webhook"),
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Registers the webhook unless Telegram already points at it. A freshly
/// generated secret always forces re-registration.
async fn ensure_webhook(state: &AppState, target: &str) {
    info!("Checking Telegram webhook status...");

    let current = match state.telegram.get_webhook_info().await {
        Ok(info) => {
            if let Some(err) = &info.last_error_message {
                warn!(pending = info.pending_update_count, "Last webhook delivery error: {}", err);
            }
            info.url
        }
        Err(e) => {
            warn!(error = %e, "Could not check Telegram webhook status");
            String::new()
        }
    };

    if current == target && !state.config.webhook_secret_generated {
        info!("Telegram webhook is already up to date: {}", current);
        return;
    }

    info!("Updating Telegram webhook: {} -> {}", current, target);
    match state
        .telegram
        .set_webhook(target, &state.config.webhook_secret)
        .await
    {
        Ok(_) => info!("Telegram webhook registered successfully"),
        Err(e) => warn!(error = %e, "Failed to register Telegram webhook"),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
