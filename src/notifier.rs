use chrono::Utc;
use tracing::{Instrument, error, info, info_span};

use crate::config::{Config, check_tokens};
use crate::error::{NotifierError, Result};
use crate::homework::{check_response, parse_status};
use crate::practicum::PracticumClient;
use crate::telegram::{TelegramBot, send_message};

/// What a single poll cycle ended with.
#[derive(Debug)]
pub enum CycleOutcome {
    /// A status message was produced and handed to the bot.
    Notified(String),
    /// Polling failed; nothing was sent this cycle.
    Failed(NotifierError),
}

pub struct Notifier {
    config: Config,
    api: PracticumClient,
    bot: TelegramBot,
    from_date: i64,
    cycles: u64,
}

impl Notifier {
    pub fn new(config: Config) -> Result<Self> {
        if !check_tokens(&config) {
            return Err(NotifierError::Configuration(format!(
                "missing required environment variables: {}",
                config.missing_tokens().join(", ")
            )));
        }

        let api = PracticumClient::new(&config)?;
        let bot = TelegramBot::new(
            &config.telegram_token,
            &config.telegram_api_url,
            config.request_timeout(),
        )?;

        Ok(Self {
            config,
            api,
            bot,
            from_date: Utc::now().timestamp(),
            cycles: 0,
        })
    }

    /// Timestamp sent as `from_date`. Fixed at startup and never advanced.
    pub fn from_date(&self) -> i64 {
        self.from_date
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Fetch, validate and format. Does not talk to Telegram.
    pub async fn poll(&self) -> Result<String> {
        let response = self.api.get_api_answer(self.from_date).await?;
        let homework = check_response(&response)?;
        parse_status(homework)
    }

    /// Runs one cycle. Never fails: errors are logged and returned as
    /// [`CycleOutcome::Failed`].
    pub async fn tick(&mut self) -> CycleOutcome {
        self.cycles += 1;
        let span = info_span!("poll_cycle", cycle = self.cycles, from_date = self.from_date);
        let this = &*self;

        async move {
            match this.poll().await {
                Ok(message) => {
                    send_message(&this.bot, &this.config.telegram_chat_id, &message).await;
                    CycleOutcome::Notified(message)
                }
                Err(e) => {
                    error!(error = ?e, "Сбой в работе программы: {e}");
                    CycleOutcome::Failed(e)
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Polls forever, sleeping `RETRY_TIME` after every cycle whatever its
    /// outcome.
    pub async fn run(mut self) {
        let period = self.config.retry_period();
        info!(
            endpoint = self.api.endpoint(),
            from_date = self.from_date,
            retry_secs = period.as_secs(),
            "🔄 Starting poll loop"
        );

        loop {
            self.tick().await;
            tokio::time::sleep(period).await;
        }
    }
}
