use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use ragline_relay::answer::AnswerClient;
use ragline_slack::api::ChatApi;

#[derive(Clone)]
pub struct HealthState {
    chat: Arc<dyn ChatApi>,
    answers: Arc<dyn AnswerClient>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub slack: HealthCheck,
    pub answer_service: HealthCheck,
    pub checked_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LivenessResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

pub fn router(chat: Arc<dyn ChatApi>, answers: Arc<dyn AnswerClient>) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .with_state(HealthState { chat, answers })
}

/// Liveness only; does not touch the outbound collaborators.
pub async fn root() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "ok",
        service: "ragline",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let slack = slack_check(state.chat.as_ref()).await;
    let answer_service = answer_check(state.answers.as_ref()).await;
    let ready = slack.status == "ready" && answer_service.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        slack,
        answer_service,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

async fn slack_check(chat: &dyn ChatApi) -> HealthCheck {
    match chat.auth_check().await {
        Ok(bot_user_id) => HealthCheck {
            status: "ready",
            detail: format!("authenticated as {bot_user_id}"),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("auth.test failed: {error}") }
        }
    }
}

async fn answer_check(answers: &dyn AnswerClient) -> HealthCheck {
    match answers.probe().await {
        Ok(()) => HealthCheck {
            status: "ready",
            detail: "answer service reachable".to_string(),
        },
        Err(error) => {
            HealthCheck { status: "degraded", detail: format!("probe failed: {error}") }
        }
    }
}
