use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tracing::info;

use ragline_core::config::{AppConfig, ConfigError, LoadOptions};
use ragline_relay::answer::{AnswerClient, HttpAnswerClient};
use ragline_relay::orchestrator::Relay;
use ragline_slack::api::{ChatApi, SlackApiClient, SlackApiError};

/// Budget for individual Slack Web API calls. Separate from the answer
/// service's 60 second budget; platform calls should fail much faster.
const SLACK_API_TIMEOUT_SECS: u64 = 30;

pub struct Application {
    pub config: AppConfig,
    pub chat: Arc<dyn ChatApi>,
    pub answers: Arc<dyn AnswerClient>,
    pub relay: Arc<Relay>,
    pub bot_user_id: Option<String>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("slack http client construction failed: {0}")]
    SlackHttpClient(#[source] reqwest::Error),
    #[error("slack auth.test failed (check slack.bot_token): {0}")]
    SlackAuth(#[source] SlackApiError),
    #[error("answer service client construction failed: {0}")]
    AnswerHttpClient(#[source] reqwest::Error),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let slack_http = reqwest::Client::builder()
        .timeout(Duration::from_secs(SLACK_API_TIMEOUT_SECS))
        .build()
        .map_err(BootstrapError::SlackHttpClient)?;

    let chat: Arc<dyn ChatApi> = Arc::new(SlackApiClient::new(
        slack_http,
        &config.slack.api_base_url,
        config.slack.bot_token.clone(),
    ));

    let bot_user_id = chat.auth_check().await.map_err(BootstrapError::SlackAuth)?;
    info!(
        event_name = "system.bootstrap.slack_authenticated",
        correlation_id = "bootstrap",
        bot_user_id = %bot_user_id,
        "slack bot token verified"
    );

    let answers: Arc<dyn AnswerClient> = Arc::new(
        HttpAnswerClient::new(
            &config.answer.endpoint,
            config.answer.health_url.as_deref(),
            Duration::from_secs(config.answer.timeout_secs),
        )
        .map_err(BootstrapError::AnswerHttpClient)?,
    );

    let relay = Arc::new(Relay::new(chat.clone(), answers.clone()));

    Ok(Application { config, chat, answers, relay, bot_user_id: Some(bot_user_id) })
}
