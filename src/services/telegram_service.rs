use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::dto::telegram_dto::{
    ApiResponse, InlineKeyboardMarkup, MenuButtonWebApp, SendMessageRequest, SentMessage,
    TelegramUpdate, WebAppInfo, WebhookInfo,
};
use crate::error::{Error, Result};

/// How a `sendMessage` call ended, as reported back to the Mini App.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationStatus {
    Success,
    TelegramApiError,
    HttpError,
    Timeout,
    ConnectionError,
    UnknownError,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct BotNotification {
    pub status: NotificationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl BotNotification {
    fn failed(status: NotificationStatus, http_status: Option<u16>, description: String) -> Self {
        Self {
            status,
            message_id: None,
            http_status,
            description: Some(description),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == NotificationStatus::Success
    }
}

/// Thin Bot API client. The token only ever appears inside request URLs,
/// which are stripped from every error this type hands out.
#[derive(Clone)]
pub struct TelegramService {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramService {
    pub fn new(token: String, api_base: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    async fn call<P, T>(&self, method: &str, params: &P, timeout: Option<Duration>) -> Result<T>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.client.post(self.method_url(method)).json(params);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;
        let status = response.status();
        let envelope: ApiResponse<T> = response.json().await?;

        if !envelope.ok {
            return Err(Error::TelegramApi(format!(
                "{} failed ({}): {}",
                method,
                status,
                describe_rejection(&envelope)
            )));
        }
        envelope
            .result
            .ok_or_else(|| Error::TelegramApi(format!("{} returned no result", method)))
    }

    /// Sends a message and classifies the outcome; delivery problems are
    /// reported in the returned value rather than as an error.
    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        parse_mode: Option<&str>,
        reply_markup: Option<&InlineKeyboardMarkup>,
    ) -> BotNotification {
        let body = SendMessageRequest {
            chat_id,
            text,
            parse_mode,
            reply_markup,
        };

        let outcome = match self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(text) => classify_response(status, &text),
                    Err(err) => classify_transport_error(err),
                }
            }
            Err(err) => classify_transport_error(err),
        };

        if outcome.is_success() {
            info!(chat_id, message_id = ?outcome.message_id, "Telegram message delivered");
        } else {
            warn!(
                chat_id,
                status = ?outcome.status,
                http_status = ?outcome.http_status,
                description = ?outcome.description,
                "Telegram message not delivered"
            );
        }
        outcome
    }

    pub async fn get_webhook_info(&self) -> Result<WebhookInfo> {
        self.call("getWebhookInfo", &json!({}), None).await
    }

    pub async fn set_webhook(&self, url: &str, secret_token: &str) -> Result<bool> {
        let params = json!({
            "url": url,
            "secret_token": secret_token,
            "allowed_updates": ["message"],
        });
        self.call("setWebhook", &params, None).await
    }

    pub async fn delete_webhook(&self, drop_pending_updates: bool) -> Result<bool> {
        let params = json!({ "drop_pending_updates": drop_pending_updates });
        self.call("deleteWebhook", &params, None).await
    }

    pub async fn set_chat_menu_button(&self, text: &str, url: &str) -> Result<bool> {
        let params = json!({
            "menu_button": MenuButtonWebApp {
                r#type: "web_app",
                text,
                web_app: WebAppInfo { url: url.to_string() },
            }
        });
        self.call("setChatMenuButton", &params, None).await
    }

    /// Long-polls for new updates. The HTTP timeout is stretched past the
    /// server-side poll timeout so an idle poll is not reported as a failure.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<TelegramUpdate>> {
        let params = json!({
            "offset": offset,
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        self.call(
            "getUpdates",
            &params,
            Some(Duration::from_secs(timeout_secs + 10)),
        )
        .await
    }
}

/// `"<error_code>: <description>"`, as far as Telegram provided either.
fn describe_rejection<T>(envelope: &ApiResponse<T>) -> String {
    let description = envelope
        .description
        .as_deref()
        .unwrap_or("Telegram rejected the request");
    match envelope.error_code {
        Some(code) => format!("{}: {}", code, description),
        None => description.to_string(),
    }
}

fn classify_response(status: StatusCode, body: &str) -> BotNotification {
    let http_status = Some(status.as_u16());
    match serde_json::from_str::<ApiResponse<SentMessage>>(body) {
        Ok(envelope) if envelope.ok => BotNotification {
            status: NotificationStatus::Success,
            message_id: envelope.result.map(|m| m.message_id),
            http_status,
            description: None,
        },
        Ok(envelope) => BotNotification::failed(
            NotificationStatus::TelegramApiError,
            http_status,
            describe_rejection(&envelope),
        ),
        Err(_) if !status.is_success() => BotNotification::failed(
            NotificationStatus::HttpError,
            http_status,
            format!("HTTP {}", status),
        ),
        Err(err) => BotNotification::failed(
            NotificationStatus::UnknownError,
            http_status,
            format!("Unexpected response body: {}", err),
        ),
    }
}

fn classify_transport_error(err: reqwest::Error) -> BotNotification {
    let status = if err.is_timeout() {
        NotificationStatus::Timeout
    } else if err.is_connect() {
        NotificationStatus::ConnectionError
    } else {
        NotificationStatus::UnknownError
    };
    let http_status = err.status().map(|s| s.as_u16());
    BotNotification::failed(status, http_status, err.without_url().to_string())
}
