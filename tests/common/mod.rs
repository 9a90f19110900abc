#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use axum::{
    body::{to_bytes, Body},
    extract::{Path, State},
    http::{Request, StatusCode},
    response::Response,
    routing::post,
    Json, Router,
};
use serde_json::{json, Value as JsonValue};
use tokio::net::TcpListener;

use thread_calc_bot::config::{
    Config, DEFAULT_MENU_BUTTON_TEXT, DEFAULT_WEBAPP_URL,
};

pub const BOT_TOKEN: &str = "123:ABC";
pub const WEBHOOK_SECRET: &str = "whsec_test";

/// How the fake Bot API answers `sendMessage`.
#[derive(Clone, Copy)]
pub enum SendReply {
    Ok,
    Blocked,
    BadGateway,
}

#[derive(Clone)]
struct FakeState {
    reply: SendReply,
    calls: Arc<Mutex<Vec<(String, JsonValue)>>>,
    pending_updates: Arc<Mutex<Vec<JsonValue>>>,
}

pub struct FakeTelegram {
    pub base_url: String,
    calls: Arc<Mutex<Vec<(String, JsonValue)>>>,
    pending_updates: Arc<Mutex<Vec<JsonValue>>>,
}

impl FakeTelegram {
    pub fn calls(&self, method: &str) -> Vec<JsonValue> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .map(|(_, body)| body.clone())
            .collect()
    }

    pub fn queue_update(&self, update: JsonValue) {
        self.pending_updates.lock().unwrap().push(update);
    }
}

async fn bot_api(
    State(state): State<FakeState>,
    Path((bot, method)): Path<(String, String)>,
    Json(body): Json<JsonValue>,
) -> (StatusCode, Json<JsonValue>) {
    if bot != format!("bot{}", BOT_TOKEN) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "ok": false, "error_code": 401, "description": "Unauthorized" })),
        );
    }
    state.calls.lock().unwrap().push((method.clone(), body));

    match method.as_str() {
        "sendMessage" => match state.reply {
            SendReply::Ok => (
                StatusCode::OK,
                Json(json!({ "ok": true, "result": { "message_id": 10, "date": 0, "chat": { "id": 42, "type": "private" } } })),
            ),
            SendReply::Blocked => (
                StatusCode::FORBIDDEN,
                Json(json!({ "ok": false, "error_code": 403, "description": "Forbidden: bot was blocked by the user" })),
            ),
            SendReply::BadGateway => (StatusCode::BAD_GATEWAY, Json(json!("upstream down"))),
        },
        "getUpdates" => {
            let updates: Vec<JsonValue> = state.pending_updates.lock().unwrap().drain(..).collect();
            (StatusCode::OK, Json(json!({ "ok": true, "result": updates })))
        }
        _ => (StatusCode::OK, Json(json!({ "ok": true, "result": true }))),
    }
}

pub async fn spawn_fake_telegram(reply: SendReply) -> FakeTelegram {
    let state = FakeState {
        reply,
        calls: Arc::new(Mutex::new(Vec::new())),
        pending_updates: Arc::new(Mutex::new(Vec::new())),
    };
    let calls = state.calls.clone();
    let pending_updates = state.pending_updates.clone();

    let app = Router::new()
        .route("/:bot/:method", post(bot_api))
        .with_state(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake api");
    let addr = listener.local_addr().expect("fake api addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("fake api server");
    });

    FakeTelegram {
        base_url: format!("http://{}", addr),
        calls,
        pending_updates,
    }
}

pub fn test_config(api_base: &str) -> Config {
    Config {
        server_address: "127.0.0.1:0".to_string(),
        telegram_bot_token: BOT_TOKEN.to_string(),
        webapp_url: DEFAULT_WEBAPP_URL.to_string(),
        webhook_url: Some("https://bot.calc.press".to_string()),
        webhook_secret: WEBHOOK_SECRET.to_string(),
        webhook_secret_generated: false,
        menu_button_url: None,
        menu_button_text: DEFAULT_MENU_BUTTON_TEXT.to_string(),
        static_dir: None,
        telegram_api_base: api_base.to_string(),
        telegram_timeout_secs: 5,
        cors_allowed_origin: None,
    }
}

pub fn json_request(uri: &str, body: &JsonValue) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_json(resp: Response) -> JsonValue {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
