//! Inbound Slack Events API surface.
//!
//! Slack expects a 2xx within three seconds and redelivers on anything else,
//! so the handler acknowledges immediately and drives each accepted event on
//! its own spawned task. Dropped payloads (self-authored, malformed, missing
//! fields) are acknowledged too; they are expected traffic, not errors.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ragline_relay::orchestrator::{EventContext, Relay};
use ragline_slack::ingress::{normalize_event, RawMessageEvent};
use ragline_slack::signature::verify_signature;

#[derive(Clone)]
pub struct WebhookState {
    pub relay: Arc<Relay>,
    pub bot_user_id: Option<String>,
    /// When unset, request verification is skipped (local development).
    pub signing_secret: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum WebhookEnvelope {
    #[serde(rename = "url_verification")]
    UrlVerification { challenge: String },
    #[serde(rename = "event_callback")]
    EventCallback { event: RawMessageEvent },
    #[serde(other)]
    Other,
}

pub fn router(state: WebhookState) -> Router {
    Router::new().route("/slack/events", post(receive_event)).with_state(state)
}

async fn receive_event(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if let Some(signing_secret) = &state.signing_secret {
        if !verify_delivery(&headers, &body, signing_secret) {
            return StatusCode::UNAUTHORIZED.into_response();
        }
    }

    let envelope = match serde_json::from_slice::<WebhookEnvelope>(&body) {
        Ok(envelope) => envelope,
        Err(error) => {
            debug!(
                event_name = "ingress.webhook.undecodable_payload",
                error = %error,
                "acknowledging undecodable webhook payload"
            );
            return StatusCode::OK.into_response();
        }
    };

    match envelope {
        WebhookEnvelope::UrlVerification { challenge } => {
            Json(json!({ "challenge": challenge })).into_response()
        }
        WebhookEnvelope::EventCallback { event } => {
            dispatch_event(&state, &event);
            StatusCode::OK.into_response()
        }
        WebhookEnvelope::Other => StatusCode::OK.into_response(),
    }
}

/// Run ingress and, when the payload survives it, hand the event to the
/// orchestrator on an independent task. Returns before the exchange runs.
fn dispatch_event(state: &WebhookState, raw: &RawMessageEvent) {
    let Some(event) = normalize_event(raw, state.bot_user_id.as_deref()) else {
        debug!(
            event_name = "ingress.webhook.event_dropped",
            event_type = %raw.event_type,
            "event did not pass ingress"
        );
        return;
    };

    let ctx = EventContext { correlation_id: Uuid::new_v4().to_string() };
    info!(
        event_name = "ingress.webhook.event_accepted",
        correlation_id = %ctx.correlation_id,
        channel_id = %event.conversation_id,
        thread_ts = %event.thread_id,
        kind = ?event.kind,
        "accepted inbound event"
    );

    let relay = state.relay.clone();
    tokio::spawn(async move {
        if let Err(error) = relay.handle(&event, &ctx).await {
            warn!(
                event_name = "relay.exchange.abandoned",
                correlation_id = %ctx.correlation_id,
                channel_id = %event.conversation_id,
                error = %error,
                "exchange ended without a placeholder to resolve"
            );
        }
    });
}

fn verify_delivery(headers: &HeaderMap, body: &[u8], signing_secret: &SecretString) -> bool {
    let timestamp = header_str(headers, "x-slack-request-timestamp");
    let signature = header_str(headers, "x-slack-signature");
    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        warn!(
            event_name = "ingress.webhook.signature_missing",
            "rejecting delivery without signature headers"
        );
        return false;
    };

    let now_unix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs() as i64)
        .unwrap_or_default();

    let verified =
        verify_signature(body, timestamp, signature, signing_secret.expose_secret(), now_unix);
    if !verified {
        warn!(
            event_name = "ingress.webhook.signature_rejected",
            "rejecting delivery with invalid signature"
        );
    }
    verified
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
