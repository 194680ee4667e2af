use reqwest::blocking::{Client, Response};
use reqwest::header::AUTHORIZATION;
use reqwest::{StatusCode, Url};
use serde_json::Value as JsonValue;

use crate::error::BotError;

/// Something that can be asked for homework updates since a timestamp.
pub trait HomeworkSource {
    /// Fetches the raw JSON body for all status changes since `from_date`
    /// (seconds since the Unix epoch).
    ///
    /// # Errors
    /// Any transport failure or non-200 response yields [`BotError::ApiUnavailable`].
    fn fetch(&self, from_date: i64) -> Result<JsonValue, BotError>;
}

pub struct PracticumClient {
    http_client: Client,
    token: String,
    endpoint: Url,
}

impl PracticumClient {
    #[must_use]
    pub const fn new(http_client: Client, token: String, endpoint: Url) -> Self {
        Self {
            http_client,
            token,
            endpoint,
        }
    }

    fn authorization(&self) -> String {
        format!("OAuth {}", self.token)
    }
}

impl HomeworkSource for PracticumClient {
    fn fetch(&self, from_date: i64) -> Result<JsonValue, BotError> {
        log::debug!("Requesting {} with from_date={from_date}", self.endpoint);
        let resp: Response = self
            .http_client
            .get(self.endpoint.clone())
            .header(AUTHORIZATION, self.authorization())
            .query(&[("from_date", from_date)])
            .send()
            .map_err(|e| {
                log::error!("Could not send GET request to {}: {e}", self.endpoint);
                BotError::api_unavailable(e.to_string())
            })?;
        handle_response(resp)
    }
}

fn handle_response(response: Response) -> Result<JsonValue, BotError> {
    let status: StatusCode = response.status();

    // Only a plain 200 counts; even other 2xx codes are treated as a failure.
    if status != StatusCode::OK {
        log::error!("Homework API responded with status {status}");
        return Err(BotError::api_unavailable(format!("status {status}")));
    }

    let text: String = response.text().map_err(|e| {
        log::error!("Could not read homework API response body: {e}");
        BotError::api_unavailable(e.to_string())
    })?;

    serde_json::from_str(&text).map_err(|e| {
        log::error!("Homework API returned invalid JSON: {e}");
        BotError::api_unavailable(e.to_string())
    })
}
