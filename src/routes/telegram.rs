use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
};
use subtle::ConstantTimeEq;

use crate::{
    dto::telegram_dto::TelegramUpdate,
    error::{Error, Result},
    AppState,
};

pub const SECRET_TOKEN_HEADER: &str = "x-telegram-bot-api-secret-token";

/// The body is decoded only after the secret token matched.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    verify_secret(&headers, &state.config.webhook_secret)?;
    let update: TelegramUpdate = serde_json::from_slice(&body)?;
    tracing::info!("Received Telegram webhook update ID: {}", update.update_id);
    state.updates.handle(update).await;
    Ok(StatusCode::OK)
}

fn verify_secret(headers: &HeaderMap, expected: &str) -> Result<()> {
    let Some(secret_hdr) = headers.get(SECRET_TOKEN_HEADER) else {
        return Err(Error::Unauthorized("missing_secret_token".into()));
    };
    let provided = secret_hdr
        .to_str()
        .map_err(|_| Error::Unauthorized("invalid_secret_header".into()))?;
    if ConstantTimeEq::ct_eq(provided.as_bytes(), expected.as_bytes()).into() {
        Ok(())
    } else {
        Err(Error::Unauthorized("invalid_secret_token".into()))
    }
}
