use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::services::telegram_service::BotNotification;

/// Result posted by a calculator page together with its launch `initData`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubmitResultRequest {
    #[validate(length(min = 1))]
    pub value: String,
    #[serde(rename = "initData")]
    #[validate(length(min = 1))]
    pub init_data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedUser {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitResultResponse {
    pub ok: bool,
    pub validation: &'static str,
    pub user: VerifiedUser,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_date: Option<chrono::DateTime<chrono::Utc>>,
    pub bot_notification: BotNotification,
}

#[derive(Debug, Clone, Serialize)]
pub struct RejectedResultResponse {
    pub ok: bool,
    pub validation: &'static str,
    pub error: &'static str,
}
