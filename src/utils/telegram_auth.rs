//! Verification of Telegram Mini App `initData`.
//!
//! Telegram signs the launch parameters it hands to a Mini App with a key
//! derived from the bot token: `HMAC_SHA256(key = "WebAppData", msg = token)`.
//! The signature covers every field except `hash`, rendered as `key=value`,
//! sorted and joined with newlines.
//!
//! Everything here is a pure function of its arguments. Callers decide what
//! to log; nothing in this module ever sees a logger.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA_KEY: &[u8] = b"WebAppData";
const HASH_KEY: &str = "hash";
const USER_KEY: &str = "user";
const AUTH_DATE_KEY: &str = "auth_date";

/// Whether a verified payload must carry a `user` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserRequirement {
    Optional,
    Required,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReason {
    #[error("missing_signature")]
    MissingSignature,
    #[error("bad_signature")]
    BadSignature,
    #[error("malformed_user_field")]
    MalformedUserField,
    #[error("user_not_found")]
    UserNotFound,
}

impl InvalidReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvalidReason::MissingSignature => "missing_signature",
            InvalidReason::BadSignature => "bad_signature",
            InvalidReason::MalformedUserField => "malformed_user_field",
            InvalidReason::UserNotFound => "user_not_found",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            InvalidReason::BadSignature => StatusCode::FORBIDDEN,
            InvalidReason::MissingSignature
            | InvalidReason::MalformedUserField
            | InvalidReason::UserNotFound => StatusCode::BAD_REQUEST,
        }
    }
}

/// The `user` object embedded in `initData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebAppUser {
    pub id: i64,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub language_code: Option<String>,
}

impl WebAppUser {
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().filter(|s| !s.is_empty());
        let last = self.last_name.as_deref().filter(|s| !s.is_empty());
        match (first, last) {
            (Some(f), Some(l)) => format!("{} {}", f, l),
            (Some(n), None) | (None, Some(n)) => n.to_string(),
            (None, None) => "Unknown".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedInitData {
    pub user_id: Option<i64>,
    pub user_name: String,
    pub user: Option<WebAppUser>,
    /// Every decoded pair, `hash` included, in the order received.
    pub fields: Vec<(String, String)>,
}

impl VerifiedInitData {
    /// Value of `key`; a repeated key resolves to its last occurrence.
    pub fn field(&self, key: &str) -> Option<&str> {
        last_value(&self.fields, key)
    }

    /// Signed `auth_date`, if present and a valid unix timestamp.
    pub fn auth_date(&self) -> Option<DateTime<Utc>> {
        let secs = self.field(AUTH_DATE_KEY)?.parse::<i64>().ok()?;
        DateTime::from_timestamp(secs, 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    Valid(VerifiedInitData),
    Invalid(InvalidReason),
}

impl VerificationResult {
    pub fn is_valid(&self) -> bool {
        matches!(self, VerificationResult::Valid(_))
    }
}

/// Verifies `raw_init_data` against `bot_token`, accepting payloads without a user.
pub fn verify_init_data(raw_init_data: &str, bot_token: &str) -> VerificationResult {
    verify_init_data_with(raw_init_data, bot_token, UserRequirement::Optional)
}

pub fn verify_init_data_with(
    raw_init_data: &str,
    bot_token: &str,
    user_requirement: UserRequirement,
) -> VerificationResult {
    let fields: Vec<(String, String)> = url::form_urlencoded::parse(raw_init_data.as_bytes())
        .into_owned()
        .collect();

    let Some(claimed) = last_value(&fields, HASH_KEY) else {
        return VerificationResult::Invalid(InvalidReason::MissingSignature);
    };

    let check_string = data_check_string(
        fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str())),
    );
    let Some(expected) = compute_signature(&check_string, bot_token) else {
        return VerificationResult::Invalid(InvalidReason::BadSignature);
    };

    if !bool::from(expected.as_bytes().ct_eq(claimed.as_bytes())) {
        return VerificationResult::Invalid(InvalidReason::BadSignature);
    }

    let user = match last_value(&fields, USER_KEY) {
        Some(raw_user) => match serde_json::from_str::<WebAppUser>(raw_user) {
            Ok(user) => Some(user),
            Err(_) => return VerificationResult::Invalid(InvalidReason::MalformedUserField),
        },
        None if user_requirement == UserRequirement::Required => {
            return VerificationResult::Invalid(InvalidReason::UserNotFound);
        }
        None => None,
    };

    let user_name = user
        .as_ref()
        .map(WebAppUser::display_name)
        .unwrap_or_else(|| "Unknown".to_string());

    VerificationResult::Valid(VerifiedInitData {
        user_id: user.as_ref().map(|u| u.id),
        user_name,
        user,
        fields,
    })
}

// Repeated keys resolve to the last occurrence, for `hash` and signed fields alike.
fn last_value<'a>(fields: &'a [(String, String)], key: &str) -> Option<&'a str> {
    fields
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Builds the data-check-string from decoded pairs; any `hash` pair is skipped.
pub fn data_check_string<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut rendered: Vec<String> = pairs
        .into_iter()
        .filter(|(k, _)| *k != HASH_KEY)
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    rendered.sort_unstable();
    rendered.join("\n")
}

/// Lowercase hex signature Telegram would attach to `data_check_string`.
pub fn compute_signature(data_check_string: &str, bot_token: &str) -> Option<String> {
    let mut secret_mac = HmacSha256::new_from_slice(WEB_APP_DATA_KEY).ok()?;
    secret_mac.update(bot_token.as_bytes());
    let secret_key = secret_mac.finalize().into_bytes();

    let mut mac = HmacSha256::new_from_slice(&secret_key).ok()?;
    mac.update(data_check_string.as_bytes());
    Some(hex::encode(mac.finalize().into_bytes()))
}

/// Encodes `pairs` as a signed `initData` query string, the way a Telegram
/// client would hand it to a Mini App. Handy for local tooling and tests.
pub fn sign_init_data(pairs: &[(&str, &str)], bot_token: &str) -> Option<String> {
    let hash = compute_signature(&data_check_string(pairs.iter().copied()), bot_token)?;
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (k, v) in pairs {
        serializer.append_pair(k, v);
    }
    serializer.append_pair(HASH_KEY, &hash);
    Some(serializer.finish())
}
