use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, de};
use smart_default::SmartDefault;

pub const PRACTICUM_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Settings read once from the environment (and `.env`) at startup.
///
/// Field names map to upper-case variables: `practicum_token` is read from
/// `PRACTICUM_TOKEN`, `retry_time` from `RETRY_TIME` and so on.
#[derive(Clone, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Config {
    pub practicum_token: String,
    pub telegram_token: String,
    pub telegram_chat_id: String,
    /// Seconds to sleep between polls.
    #[default = 600]
    #[serde(deserialize_with = "positive_secs")]
    pub retry_time: u64,
    #[default(_code = "PRACTICUM_ENDPOINT.into()")]
    pub practicum_endpoint: String,
    #[default(_code = "TELEGRAM_API_URL.into()")]
    pub telegram_api_url: String,
    /// Per-request HTTP timeout, seconds.
    #[default = 30]
    #[serde(deserialize_with = "positive_secs")]
    pub request_timeout: u64,
    #[default = "logs"]
    pub log_dir: String,
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env::<Config>()
    }

    /// Same as [`Config::load`] but reads from an arbitrary set of variables.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, envy::Error>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        envy::from_iter(
            vars.into_iter()
                .map(|(k, v)| (k.as_ref().to_lowercase(), v.into())),
        )
    }

    pub fn retry_period(&self) -> Duration {
        Duration::from_secs(self.retry_time)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Names of the required variables that are unset or blank.
    pub fn missing_tokens(&self) -> Vec<&'static str> {
        [
            ("PRACTICUM_TOKEN", &self.practicum_token),
            ("TELEGRAM_TOKEN", &self.telegram_token),
            ("TELEGRAM_CHAT_ID", &self.telegram_chat_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

// Zero would turn the loop into a busy loop or time out every request.
fn positive_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = u64::deserialize(deserializer)?;
    if secs == 0 {
        return Err(de::Error::custom("expected a positive number of seconds, got 0"));
    }
    Ok(secs)
}

pub fn check_tokens(config: &Config) -> bool {
    config.missing_tokens().is_empty()
}

// Tokens stay out of logs.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &str) -> &'static str {
            if value.is_empty() { "<unset>" } else { "<redacted>" }
        }
        f.debug_struct("Config")
            .field("practicum_token", &redact(&self.practicum_token))
            .field("telegram_token", &redact(&self.telegram_token))
            .field("telegram_chat_id", &self.telegram_chat_id)
            .field("retry_time", &self.retry_time)
            .field("practicum_endpoint", &self.practicum_endpoint)
            .field("telegram_api_url", &self.telegram_api_url)
            .field("request_timeout", &self.request_timeout)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}
