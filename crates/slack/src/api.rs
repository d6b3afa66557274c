//! Slack Web API client. The orchestrator only sees the `ChatApi` trait;
//! `SlackApiClient` is the `reqwest`-backed implementation against
//! `https://slack.com/api`. None of these calls are retried: a failed
//! platform call is logged by the caller and the exchange moves on.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SlackApiError {
    #[error("slack `{method}` request failed: {source}")]
    Transport { method: &'static str, source: reqwest::Error },
    #[error("slack `{method}` response could not be decoded: {source}")]
    Decode { method: &'static str, source: reqwest::Error },
    #[error("slack `{method}` returned an error: {error}")]
    Platform { method: &'static str, error: String },
    #[error("slack `{method}` response was missing `{field}`")]
    MissingField { method: &'static str, field: &'static str },
}

/// A message the platform accepted, identified by the timestamp Slack
/// assigns. The `ts` is what a later `chat.update` edits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

/// Platform call surface the relay depends on. Process-scoped and
/// immutable after init; test code substitutes recording fakes.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn add_reaction(
        &self,
        channel: &str,
        ts: &str,
        name: &str,
    ) -> Result<(), SlackApiError>;

    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<PostedMessage, SlackApiError>;

    async fn update_message(&self, channel: &str, ts: &str, text: &str)
        -> Result<(), SlackApiError>;

    /// `auth.test`: confirms the bot token works and returns the bot's own
    /// user id, which ingress needs for self-message filtering.
    async fn auth_check(&self) -> Result<String, SlackApiError>;
}

pub struct SlackApiClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: SecretString,
}

#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    ok: bool,
    #[serde(default)]
    ts: Option<String>,
    #[serde(default)]
    channel: Option<String>,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl SlackApiClient {
    pub fn new(http: reqwest::Client, api_base: &str, bot_token: SecretString) -> Self {
        Self { http, api_base: api_base.trim_end_matches('/').to_owned(), bot_token }
    }

    async fn call(
        &self,
        method: &'static str,
        payload: Value,
    ) -> Result<ApiEnvelope, SlackApiError> {
        let response = self
            .http
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&payload)
            .send()
            .await
            .map_err(|source| SlackApiError::Transport { method, source })?;

        let envelope = response
            .json::<ApiEnvelope>()
            .await
            .map_err(|source| SlackApiError::Decode { method, source })?;

        if !envelope.ok {
            return Err(SlackApiError::Platform {
                method,
                error: envelope.error.unwrap_or_else(|| "unknown error".to_owned()),
            });
        }

        Ok(envelope)
    }
}

#[async_trait]
impl ChatApi for SlackApiClient {
    async fn add_reaction(
        &self,
        channel: &str,
        ts: &str,
        name: &str,
    ) -> Result<(), SlackApiError> {
        self.call(
            "reactions.add",
            json!({ "channel": channel, "timestamp": ts, "name": name }),
        )
        .await
        .map(|_| ())
    }

    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<PostedMessage, SlackApiError> {
        let mut payload = json!({ "channel": channel, "text": text });
        if let Some(thread_ts) = thread_ts {
            payload["thread_ts"] = Value::String(thread_ts.to_owned());
        }

        let envelope = self.call("chat.postMessage", payload).await?;
        Ok(PostedMessage {
            channel: envelope.channel.unwrap_or_else(|| channel.to_owned()),
            ts: envelope.ts.ok_or(SlackApiError::MissingField {
                method: "chat.postMessage",
                field: "ts",
            })?,
        })
    }

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        text: &str,
    ) -> Result<(), SlackApiError> {
        self.call("chat.update", json!({ "channel": channel, "ts": ts, "text": text }))
            .await
            .map(|_| ())
    }

    async fn auth_check(&self) -> Result<String, SlackApiError> {
        let envelope = self.call("auth.test", json!({})).await?;
        envelope
            .user_id
            .filter(|value| !value.trim().is_empty())
            .ok_or(SlackApiError::MissingField { method: "auth.test", field: "user_id" })
    }
}
