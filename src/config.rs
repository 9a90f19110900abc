use crate::error::{Error, Result};
use crate::utils::token::generate_webhook_secret;
use std::env;
use std::fmt;
use std::sync::OnceLock;

pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";
pub const DEFAULT_WEBAPP_URL: &str = "https://miniapp.calc.press";
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
pub const DEFAULT_MENU_BUTTON_TEXT: &str = "🔺 Калькулятор резьбы";

#[derive(Clone)]
pub struct Config {
    pub server_address: String,
    pub telegram_bot_token: String,
    pub webapp_url: String,
    pub webhook_url: Option<String>,
    pub webhook_secret: String,
    /// `true` when no `WEBHOOK_SECRET` was configured and one was generated for this run.
    pub webhook_secret_generated: bool,
    pub menu_button_url: Option<String>,
    pub menu_button_text: String,
    pub static_dir: Option<String>,
    pub telegram_api_base: String,
    pub telegram_timeout_secs: u64,
    pub cors_allowed_origin: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        load_env_file();

        let (webhook_secret, webhook_secret_generated) = match get_env_opt("WEBHOOK_SECRET") {
            Some(secret) => (secret, false),
            None => (generate_webhook_secret(32), true),
        };

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", DEFAULT_SERVER_ADDRESS),
            telegram_bot_token: get_env("BOT_TOKEN")?,
            webapp_url: get_env_or("WEBAPP_URL", DEFAULT_WEBAPP_URL),
            webhook_url: get_env_opt("WEBHOOK_URL"),
            webhook_secret,
            webhook_secret_generated,
            menu_button_url: get_env_opt("MENU_BUTTON_URL"),
            menu_button_text: get_env_or("MENU_BUTTON_TEXT", DEFAULT_MENU_BUTTON_TEXT),
            static_dir: get_env_opt("STATIC_DIR"),
            telegram_api_base: get_env_or("TELEGRAM_API_BASE", DEFAULT_TELEGRAM_API_BASE),
            telegram_timeout_secs: get_env_parse_or("TELEGRAM_TIMEOUT_SECS", 10)?,
            cors_allowed_origin: get_env_opt("CORS_ALLOWED_ORIGIN"),
        })
    }

    /// Polling is used whenever no public webhook URL is configured.
    pub fn uses_webhook(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Full URL Telegram should deliver updates to.
    pub fn webhook_target(&self) -> Option<String> {
        self.webhook_url
            .as_deref()
            .map(|base| format!("{}/api/webhook/telegram", base.trim_end_matches('/')))
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_address", &self.server_address)
            .field("telegram_bot_token", &"<redacted>")
            .field("webapp_url", &self.webapp_url)
            .field("webhook_url", &self.webhook_url)
            .field("webhook_secret", &"<redacted>")
            .field("webhook_secret_generated", &self.webhook_secret_generated)
            .field("menu_button_url", &self.menu_button_url)
            .field("menu_button_text", &self.menu_button_text)
            .field("static_dir", &self.static_dir)
            .field("telegram_api_base", &self.telegram_api_base)
            .field("telegram_timeout_secs", &self.telegram_timeout_secs)
            .field("cors_allowed_origin", &self.cors_allowed_origin)
            .finish()
    }
}

/// Outside the container the bot runs from `.env_local`; inside, `CONTEINER`
/// is set and the regular `.env` (or the real environment) is used.
fn load_env_file() {
    if env::var_os("CONTEINER").is_none() {
        tracing::info!("Running outside the container, reading .env_local");
        dotenvy::from_filename(".env_local").ok();
    } else {
        dotenvy::dotenv().ok();
    }
}

fn get_env(name: &str) -> Result<String> {
    get_env_opt(name).ok_or_else(|| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_opt(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn get_env_or(name: &str, default: &str) -> String {
    get_env_opt(name).unwrap_or_else(|| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get_env_opt(name) {
        Some(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        None => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            server_address: DEFAULT_SERVER_ADDRESS.to_string(),
            telegram_bot_token: "123:SECRET".to_string(),
            webapp_url: DEFAULT_WEBAPP_URL.to_string(),
            webhook_url: Some("https://bot.calc.press/".to_string()),
            webhook_secret: "whsec".to_string(),
            webhook_secret_generated: false,
            menu_button_url: None,
            menu_button_text: DEFAULT_MENU_BUTTON_TEXT.to_string(),
            static_dir: None,
            telegram_api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            telegram_timeout_secs: 10,
            cors_allowed_origin: None,
        }
    }

    #[test]
    fn debug_output_hides_secrets() {
        let rendered = format!("{:?}", sample());
        assert!(!rendered.contains("123:SECRET"));
        assert!(!rendered.contains("whsec"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn webhook_target_trims_trailing_slash() {
        let config = sample();
        assert!(config.uses_webhook());
        assert_eq!(
            config.webhook_target().as_deref(),
            Some("https://bot.calc.press/api/webhook/telegram")
        );
    }

    #[test]
    fn empty_values_count_as_unset() {
        env::set_var("THREAD_CALC_TEST_EMPTY", "  ");
        assert_eq!(get_env_opt("THREAD_CALC_TEST_EMPTY"), None);
        assert_eq!(get_env_or("THREAD_CALC_TEST_EMPTY", "fallback"), "fallback");
        assert!(get_env("THREAD_CALC_TEST_EMPTY").is_err());
    }

    #[test]
    fn numeric_values_are_parsed() {
        env::set_var("THREAD_CALC_TEST_TIMEOUT", "25");
        assert_eq!(get_env_parse_or::<u64>("THREAD_CALC_TEST_TIMEOUT", 10).unwrap(), 25);
        assert_eq!(get_env_parse_or::<u64>("THREAD_CALC_TEST_MISSING", 10).unwrap(), 10);

        env::set_var("THREAD_CALC_TEST_BAD_TIMEOUT", "soon");
        let err = get_env_parse_or::<u64>("THREAD_CALC_TEST_BAD_TIMEOUT", 10).unwrap_err();
        assert!(err.to_string().contains("THREAD_CALC_TEST_BAD_TIMEOUT"));
    }
}
