use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{NotifierError, Result};

/// Client for the Practicum `homework_statuses` endpoint.
pub struct PracticumClient {
    http: Client,
    endpoint: String,
    authorization: HeaderValue,
}

impl PracticumClient {
    pub fn new(config: &Config) -> Result<Self> {
        let token = config.practicum_token.trim();
        if token.is_empty() {
            return Err(NotifierError::Configuration("Practicum token is empty".into()));
        }
        let mut authorization = HeaderValue::from_str(&format!("OAuth {token}")).map_err(|_| {
            NotifierError::Configuration("Practicum token contains invalid characters".into())
        })?;
        authorization.set_sensitive(true);

        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| NotifierError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: config.practicum_endpoint.clone(),
            authorization,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fetches the statuses changed since `timestamp` and returns the body as
    /// untouched JSON. Shape checks happen in [`crate::homework`].
    pub async fn get_api_answer(&self, timestamp: i64) -> Result<Value> {
        info!(endpoint = %self.endpoint, from_date = timestamp, "📡 Requesting homework statuses");

        let response = self
            .http
            .get(&self.endpoint)
            .header(AUTHORIZATION, self.authorization.clone())
            .query(&[("from_date", timestamp)])
            .send()
            .await
            .map_err(NotifierError::Connection)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(NotifierError::UnexpectedStatus(status));
        }

        let body = response.text().await.map_err(NotifierError::Connection)?;
        debug!(bytes = body.len(), "Homework API answered");

        serde_json::from_str(&body).map_err(|e| {
            NotifierError::ShapeMismatch(format!("API response is not valid JSON: {e}"))
        })
    }
}
