use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Random value for Telegram's `secret_token` webhook parameter.
///
/// Telegram accepts 1-256 characters from `A-Z a-z 0-9 _ -`; alphanumerics
/// keep it header-safe.
pub fn generate_webhook_secret(length: usize) -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length.clamp(1, 256))
        .map(char::from)
        .collect()
}
