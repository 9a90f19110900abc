pub mod format;
pub mod keyboard;
pub mod telegram_auth;
pub mod token;
