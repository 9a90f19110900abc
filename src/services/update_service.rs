use tracing::{debug, info};

use crate::dto::telegram_dto::{TelegramMessage, TelegramUpdate};
use crate::services::telegram_service::TelegramService;
use crate::utils::{format, keyboard};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateAction {
    Start,
    WebAppData,
    Help,
    Ignored,
}

/// Reacts to bot updates, whichever way they were delivered.
#[derive(Clone)]
pub struct UpdateService {
    telegram: TelegramService,
    webapp_url: String,
}

impl UpdateService {
    pub fn new(telegram: TelegramService, webapp_url: String) -> Self {
        Self {
            telegram,
            webapp_url,
        }
    }

    pub fn classify(update: &TelegramUpdate) -> UpdateAction {
        let Some(message) = &update.message else {
            return UpdateAction::Ignored;
        };
        if message.from.as_ref().is_some_and(|u| u.is_bot) {
            return UpdateAction::Ignored;
        }
        if message.web_app_data.is_some() {
            return UpdateAction::WebAppData;
        }
        match message.text.as_deref() {
            Some(text) if is_start_command(text) => UpdateAction::Start,
            Some(_) => UpdateAction::Help,
            None => UpdateAction::Ignored,
        }
    }

    pub async fn handle(&self, update: TelegramUpdate) -> UpdateAction {
        let action = Self::classify(&update);
        debug!(update_id = update.update_id, ?action, "Dispatching Telegram update");

        let Some(message) = update.message else {
            return action;
        };
        match action {
            UpdateAction::Start => self.send_menu(&message).await,
            UpdateAction::WebAppData => self.echo_web_app_data(&message).await,
            UpdateAction::Help => {
                self.telegram
                    .send_message(message.chat.id, format::HELP_TEXT, None, None)
                    .await;
            }
            UpdateAction::Ignored => {}
        }
        action
    }

    async fn send_menu(&self, message: &TelegramMessage) {
        let user_id = message.from.as_ref().map(|u| u.id);
        let first_name = message.from.as_ref().map(|u| u.first_name.as_str());
        info!(chat_id = message.chat.id, ?user_id, ?first_name, "Handling /start");
        let menu = keyboard::create_thread_menu(&self.webapp_url);
        self.telegram
            .send_message(message.chat.id, format::START_TEXT, None, Some(&menu))
            .await;
    }

    async fn echo_web_app_data(&self, message: &TelegramMessage) {
        let Some(data) = &message.web_app_data else {
            return;
        };
        info!(
            chat_id = message.chat.id,
            button = %data.button_text,
            len = data.data.len(),
            "Received web_app_data"
        );
        let text = format::web_app_echo(&data.button_text, &data.data);
        self.telegram
            .send_message(message.chat.id, &text, Some("HTML"), None)
            .await;
    }
}

fn is_start_command(text: &str) -> bool {
    let command = text.split_whitespace().next().unwrap_or_default();
    command == "/start" || command.starts_with("/start@")
}
