//! Drives one accepted `InboundEvent` through acknowledgment, remote lookup,
//! and response delivery.
//!
//! Ordering contract: the placeholder post always happens before the remote
//! call, which always happens before the resolving edit. No edit is ever
//! issued for a placeholder that was not posted.

use std::sync::Arc;

use thiserror::Error;
use tracing::{error, info, warn};

use ragline_slack::api::{ChatApi, SlackApiError};
use ragline_slack::ingress::InboundEvent;

use crate::answer::{AnswerClient, AnswerError};

/// Emoji added to the triggering message while the lookup is in flight.
pub const ACK_REACTION: &str = "face_with_monocle";
pub const PLACEHOLDER_TEXT: &str = "🔄 Finding the information for you...";
/// The only failure text end users ever see; error detail stays in the log.
pub const GENERIC_ERROR_TEXT: &str =
    "❌ Sorry, I encountered an error while answering. Please try again later.";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Answered(String),
    Failed(FailureKind),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Transport,
    Status,
    MalformedBody,
}

impl From<&AnswerError> for FailureKind {
    fn from(error: &AnswerError) -> Self {
        match error {
            AnswerError::Timeout => Self::Timeout,
            AnswerError::Request(_) => Self::Transport,
            AnswerError::Status(_) => Self::Status,
            AnswerError::MalformedBody(_) => Self::MalformedBody,
        }
    }
}

/// Record of one completed exchange. Exists only on the call stack; handed
/// back to the webhook task for a final log line and then dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayExchange {
    pub conversation_id: String,
    pub thread_id: String,
    pub placeholder_ts: String,
    pub query: String,
    pub outcome: ExchangeOutcome,
}

#[derive(Debug, Error)]
pub enum RelayError {
    /// The placeholder post failed, so there is nothing left to edit and the
    /// exchange cannot proceed.
    #[error("placeholder post failed: {0}")]
    Placeholder(#[source] SlackApiError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

/// The orchestrator. Holds process-scoped, immutable-after-init client
/// handles; per-event state lives entirely inside `handle`.
pub struct Relay {
    chat: Arc<dyn ChatApi>,
    answers: Arc<dyn AnswerClient>,
}

impl Relay {
    pub fn new(chat: Arc<dyn ChatApi>, answers: Arc<dyn AnswerClient>) -> Self {
        Self { chat, answers }
    }

    pub async fn handle(
        &self,
        event: &InboundEvent,
        ctx: &EventContext,
    ) -> Result<RelayExchange, RelayError> {
        if let Err(reaction_error) = self
            .chat
            .add_reaction(&event.conversation_id, &event.message_ts, ACK_REACTION)
            .await
        {
            warn!(
                event_name = "relay.ack.reaction_failed",
                correlation_id = %ctx.correlation_id,
                channel_id = %event.conversation_id,
                thread_ts = %event.thread_id,
                error = %reaction_error,
                "acknowledgment reaction failed; continuing exchange"
            );
        }

        let placeholder = self
            .chat
            .post_message(&event.conversation_id, Some(&event.thread_id), PLACEHOLDER_TEXT)
            .await
            .map_err(|post_error| {
                error!(
                    event_name = "relay.ack.placeholder_failed",
                    correlation_id = %ctx.correlation_id,
                    channel_id = %event.conversation_id,
                    thread_ts = %event.thread_id,
                    error = %post_error,
                    "placeholder post failed; abandoning exchange"
                );
                RelayError::Placeholder(post_error)
            })?;

        let outcome = match self.answers.answer(&event.text).await {
            Ok(answer) => ExchangeOutcome::Answered(answer),
            Err(answer_error) => {
                error!(
                    event_name = "relay.query.failed",
                    correlation_id = %ctx.correlation_id,
                    channel_id = %event.conversation_id,
                    thread_ts = %event.thread_id,
                    error = %answer_error,
                    "answer service call failed"
                );
                ExchangeOutcome::Failed(FailureKind::from(&answer_error))
            }
        };

        let final_text = match &outcome {
            ExchangeOutcome::Answered(answer) => answer.as_str(),
            ExchangeOutcome::Failed(_) => GENERIC_ERROR_TEXT,
        };

        if let Err(edit_error) = self
            .chat
            .update_message(&placeholder.channel, &placeholder.ts, final_text)
            .await
        {
            warn!(
                event_name = "relay.resolve.edit_failed",
                correlation_id = %ctx.correlation_id,
                channel_id = %placeholder.channel,
                placeholder_ts = %placeholder.ts,
                error = %edit_error,
                "resolving edit failed; placeholder left in prior state"
            );
        } else {
            info!(
                event_name = "relay.resolve.completed",
                correlation_id = %ctx.correlation_id,
                channel_id = %placeholder.channel,
                thread_ts = %event.thread_id,
                answered = matches!(outcome, ExchangeOutcome::Answered(_)),
                "exchange resolved"
            );
        }

        Ok(RelayExchange {
            conversation_id: event.conversation_id.clone(),
            thread_id: event.thread_id.clone(),
            placeholder_ts: placeholder.ts,
            query: event.text.clone(),
            outcome,
        })
    }
}
