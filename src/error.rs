use reqwest::StatusCode;
use thiserror::Error;

/// Everything that can go wrong between reading the environment and
/// delivering a Telegram message.
#[derive(Debug, Error)]
pub enum NotifierError {
    /// Required settings are absent or a client could not be built.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The homework API could not be reached (DNS, refused, timeout...).
    #[error("request to the homework API failed: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("homework API answered with status {0}")]
    UnexpectedStatus(StatusCode),

    /// The API answered, but not with the document we expect.
    #[error("unexpected API response: {0}")]
    ShapeMismatch(String),

    #[error("failed to deliver Telegram message: {0}")]
    Delivery(String),
}

impl NotifierError {
    /// Fatal errors stop the process before the poll loop starts; every
    /// other kind is logged and the loop carries on.
    pub fn is_fatal(&self) -> bool {
        matches!(self, NotifierError::Configuration(_))
    }
}

pub type Result<T, E = NotifierError> = std::result::Result<T, E>;
