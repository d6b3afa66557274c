//! Client for the remote answer service. One `POST {"query": <text>}` per
//! exchange, bounded by the configured timeout, never retried. Every failure
//! mode collapses to the same generic user-facing outcome; the variants here
//! exist so the operational log can tell them apart.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback answer when the service responds successfully but with a blank
/// response string.
pub const NOT_FOUND_ANSWER: &str = "I can't find related information.";

#[derive(Debug, Error)]
pub enum AnswerError {
    #[error("answer service call timed out")]
    Timeout,
    #[error("answer service request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("answer service returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("answer service body was malformed: {0}")]
    MalformedBody(#[source] reqwest::Error),
}

#[async_trait]
pub trait AnswerClient: Send + Sync {
    async fn answer(&self, query: &str) -> Result<String, AnswerError>;

    /// Reachability probe for the health surface.
    async fn probe(&self) -> Result<(), AnswerError>;
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    response: String,
}

pub struct HttpAnswerClient {
    http: reqwest::Client,
    endpoint: String,
    health_url: String,
}

impl HttpAnswerClient {
    /// Builds a dedicated client carrying the per-call timeout. The health
    /// probe falls back to the query endpoint when no separate health URL is
    /// configured, matching the service's default deployment.
    pub fn new(
        endpoint: &str,
        health_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: endpoint.to_owned(),
            health_url: health_url.unwrap_or(endpoint).to_owned(),
        })
    }
}

fn classify_send_error(error: reqwest::Error) -> AnswerError {
    if error.is_timeout() {
        AnswerError::Timeout
    } else {
        AnswerError::Request(error)
    }
}

#[async_trait]
impl AnswerClient for HttpAnswerClient {
    async fn answer(&self, query: &str) -> Result<String, AnswerError> {
        let response = self
            .http
            .post(&self.endpoint)
            .json(&QueryRequest { query })
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnswerError::Status(status));
        }

        let body = response.json::<QueryResponse>().await.map_err(|error| {
            if error.is_timeout() {
                AnswerError::Timeout
            } else {
                AnswerError::MalformedBody(error)
            }
        })?;

        let answer = body.response.trim();
        Ok(if answer.is_empty() { NOT_FOUND_ANSWER.to_owned() } else { answer.to_owned() })
    }

    async fn probe(&self) -> Result<(), AnswerError> {
        let response =
            self.http.get(&self.health_url).send().await.map_err(classify_send_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnswerError::Status(status));
        }

        Ok(())
    }
}
