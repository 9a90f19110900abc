use crate::dto::telegram_dto::{InlineKeyboardButton, InlineKeyboardMarkup};

/// Calculator buttons: label and path below the Mini App base URL.
pub const CALCULATORS: &[(&str, &str)] = &[
    ("StubACME", "stubacme-calc"),
    ("Metric", "metric-calc"),
    ("test", "test"),
];

const BUTTONS_PER_ROW: usize = 2;

pub fn create_thread_menu(webapp_base: &str) -> InlineKeyboardMarkup {
    let base = webapp_base.trim_end_matches('/');
    let buttons: Vec<InlineKeyboardButton> = CALCULATORS
        .iter()
        .map(|(text, path)| InlineKeyboardButton::web_app(*text, format!("{}/{}", base, path)))
        .collect();

    InlineKeyboardMarkup {
        inline_keyboard: buttons
            .chunks(BUTTONS_PER_ROW)
            .map(|row| row.to_vec())
            .collect(),
    }
}
