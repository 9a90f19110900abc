use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{info, warn};
use validator::Validate;

use crate::{
    dto::webapp_dto::{RejectedResultResponse, SubmitResultRequest, SubmitResultResponse, VerifiedUser},
    error::{Error, Result},
    utils::{
        format,
        telegram_auth::{verify_init_data_with, UserRequirement, VerificationResult},
    },
    AppState,
};

/// Accepts a calculator result from the Mini App, checks the signed
/// `initData` and sends the user a confirmation in the chat.
///
/// A failed notification is reported in the body; the request itself still
/// succeeds once the signature checks out.
pub async fn submit_result(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SubmitResultRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(payload) = payload.map_err(|e| Error::BadRequest(e.body_text()))?;
    payload.validate()?;

    let verified = match verify_init_data_with(
        &payload.init_data,
        &state.config.telegram_bot_token,
        UserRequirement::Required,
    ) {
        VerificationResult::Valid(data) => data,
        VerificationResult::Invalid(reason) => {
            warn!(reason = %reason, "Rejected Mini App result");
            let body = RejectedResultResponse {
                ok: false,
                validation: "invalid",
                error: reason.as_str(),
            };
            return Ok((reason.status_code(), Json(body)).into_response());
        }
    };

    let Some(user_id) = verified.user_id else {
        return Err(Error::Internal("verified init data without a user".to_string()));
    };
    info!(user_id, "Verified Mini App result");

    let text = format::result_confirmation(&verified.user_name, &payload.value);
    let bot_notification = state
        .telegram
        .send_message(user_id, &text, Some("HTML"), None)
        .await;

    let body = SubmitResultResponse {
        ok: true,
        validation: "valid",
        user: VerifiedUser {
            id: user_id,
            name: verified.user_name.clone(),
        },
        auth_date: verified.auth_date(),
        bot_notification,
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}
