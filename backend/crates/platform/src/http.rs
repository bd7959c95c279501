//! JSON-over-HTTP Client
//!
//! Thin wrapper around `reqwest` that sends a JSON body and hands back
//! the status plus the raw response body. Callers decide which statuses
//! count as success; transport failures are kept separate from status
//! failures so retry policy can tell them apart.

use reqwest::{Method, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;

/// Longest response body excerpt kept in a status error
const STATUS_MESSAGE_LIMIT: usize = 256;

/// HTTP client errors
#[derive(Debug, Error)]
pub enum HttpError {
    /// Connection, TLS, DNS or timeout failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with an unexpected status
    #[error("Unexpected HTTP status {code}: {message}")]
    Status { code: u16, message: String },

    /// Response body was not the JSON we expected
    #[error("Decode error: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for HttpError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            HttpError::Decode(err.to_string())
        } else {
            HttpError::Transport(err.to_string())
        }
    }
}

/// Response with the body already read
#[derive(Debug, Clone)]
pub struct JsonResponse {
    pub status: StatusCode,
    pub body: String,
}

impl JsonResponse {
    /// Keep the response only if `accept` approves its status
    pub fn require(self, accept: impl Fn(StatusCode) -> bool) -> Result<Self, HttpError> {
        if accept(self.status) {
            Ok(self)
        } else {
            Err(HttpError::Status {
                code: self.status.as_u16(),
                message: truncate(&self.body, STATUS_MESSAGE_LIMIT),
            })
        }
    }

    /// Parse the body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_str(&self.body).map_err(|e| HttpError::Decode(e.to_string()))
    }
}

/// Stateless JSON client with a per-request timeout
#[derive(Debug, Clone)]
pub struct JsonHttpClient {
    inner: reqwest::Client,
}

impl JsonHttpClient {
    pub fn new(request_timeout: Duration) -> Result<Self, HttpError> {
        let inner = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| HttpError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { inner })
    }

    /// Send `body` as JSON and read the whole response
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: &B,
    ) -> Result<JsonResponse, HttpError> {
        tracing::debug!(%method, %url, "Sending JSON request");

        let response = self
            .inner
            .request(method.clone(), url.clone())
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        tracing::debug!(%method, %url, status = status.as_u16(), "Received response");

        Ok(JsonResponse { status, body })
    }
}

fn truncate(s: &str, limit: usize) -> String {
    match s.char_indices().nth(limit) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
