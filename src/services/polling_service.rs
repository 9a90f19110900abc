use std::time::Duration;

use crate::error::Result;
use crate::services::telegram_service::TelegramService;
use crate::services::update_service::UpdateService;

const POLL_TIMEOUT_SECS: u64 = 30;
const ERROR_BACKOFF: Duration = Duration::from_secs(2);

/// Long-polling delivery, used when no public webhook URL is configured.
pub struct PollingService {
    telegram: TelegramService,
    updates: UpdateService,
    offset: Option<i64>,
    poll_timeout_secs: u64,
}

impl PollingService {
    pub fn new(telegram: TelegramService, updates: UpdateService) -> Self {
        Self {
            telegram,
            updates,
            offset: None,
            poll_timeout_secs: POLL_TIMEOUT_SECS,
        }
    }

    pub fn with_poll_timeout(mut self, secs: u64) -> Self {
        self.poll_timeout_secs = secs;
        self
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Fetches one batch and handles it. Returns how many updates were processed.
    pub async fn run_once(&mut self) -> Result<usize> {
        let batch = self
            .telegram
            .get_updates(self.offset, self.poll_timeout_secs)
            .await?;
        let count = batch.len();

        for update in batch {
            let next = update.update_id + 1;
            self.updates.handle(update).await;
            self.offset = Some(self.offset.map_or(next, |o| o.max(next)));
        }
        Ok(count)
    }

    pub async fn run(mut self) {
        tracing::info!("Starting long polling for Telegram updates");
        loop {
            match self.run_once().await {
                Ok(0) => {}
                Ok(n) => tracing::debug!(count = n, offset = ?self.offset, "Processed updates"),
                Err(e) => {
                    tracing::error!(error = %e, "Polling for updates failed");
                    tokio::time::sleep(ERROR_BACKOFF).await;
                }
            }
        }
    }
}
