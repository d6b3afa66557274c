//! Event Ingress: a pure filter from raw Slack event payloads to
//! `InboundEvent` values. No I/O happens here; payloads that should not
//! trigger a reply are dropped, not reported as errors.

use serde::Deserialize;

/// Inner event of a Slack `event_callback` envelope, decoded leniently.
/// Every field is optional at the wire level; ingress decides what is
/// required.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct RawMessageEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub channel_type: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
    #[serde(default)]
    pub thread_ts: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Mention,
    DirectMessage,
}

/// A normalized inbound message worth answering. Lives for exactly one
/// relay exchange and is never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundEvent {
    pub kind: EventKind,
    pub sender_id: String,
    pub conversation_id: String,
    /// Thread the reply belongs in: `thread_ts` when the message was already
    /// threaded, otherwise the message's own `ts`.
    pub thread_id: String,
    /// Timestamp of the triggering message, used for the acknowledgment
    /// reaction.
    pub message_ts: String,
    pub text: String,
}

/// No-self-reply invariant: true when the payload was authored by any bot
/// (Slack sets `bot_id` on bot-authored messages) or by the relay's own bot
/// user. Such payloads must never produce an `InboundEvent`, otherwise the
/// relay would answer its own placeholder posts forever.
pub fn is_self_authored(raw: &RawMessageEvent, bot_user_id: Option<&str>) -> bool {
    if raw.bot_id.is_some() {
        return true;
    }
    match (raw.user.as_deref(), bot_user_id) {
        (Some(user), Some(bot)) => user == bot,
        _ => false,
    }
}

/// Normalize a raw payload into an `InboundEvent`, or drop it.
///
/// Dropped (returns `None`):
/// - self-authored payloads (see [`is_self_authored`])
/// - message subtypes (edits, deletes, channel joins)
/// - event types other than `app_mention` and direct `message`s
/// - payloads missing a channel, a sender, a timestamp, or any query text
///   once bot mentions are stripped
pub fn normalize_event(raw: &RawMessageEvent, bot_user_id: Option<&str>) -> Option<InboundEvent> {
    if is_self_authored(raw, bot_user_id) {
        tracing::debug!(
            event_name = "ingress.slack.self_authored_dropped",
            event_type = %raw.event_type,
            "dropping self-authored event"
        );
        return None;
    }

    if raw.subtype.is_some() {
        return None;
    }

    let kind = match raw.event_type.as_str() {
        "app_mention" => EventKind::Mention,
        "message" if raw.channel_type.as_deref() == Some("im") => EventKind::DirectMessage,
        _ => return None,
    };

    let conversation_id = non_blank(raw.channel.as_deref())?;
    let sender_id = non_blank(raw.user.as_deref())?;
    let message_ts = non_blank(raw.ts.as_deref())?;

    let text = strip_bot_mention(raw.text.as_deref().unwrap_or(""), bot_user_id);
    if text.is_empty() {
        return None;
    }

    let thread_id =
        non_blank(raw.thread_ts.as_deref()).unwrap_or_else(|| message_ts.clone());

    Some(InboundEvent {
        kind,
        sender_id,
        conversation_id,
        thread_id,
        message_ts,
        text,
    })
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|value| !value.is_empty()).map(str::to_owned)
}

/// Remove the relay's own `<@U...>` mention tokens from the message text so
/// the remote service sees only the question. A leading mention is stripped
/// even when the bot user id is unknown (an `app_mention` always addresses
/// the bot).
pub fn strip_bot_mention(text: &str, bot_user_id: Option<&str>) -> String {
    let mut stripped = text.to_owned();
    if let Some(bot) = bot_user_id {
        stripped = stripped.replace(&format!("<@{bot}>"), "");
    }

    let trimmed = stripped.trim_start();
    let remainder = if let Some(rest) = trimmed.strip_prefix("<@") {
        match rest.find('>') {
            Some(end) => &rest[end + 1..],
            None => trimmed,
        }
    } else {
        trimmed
    };

    remainder.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::{is_self_authored, normalize_event, strip_bot_mention, EventKind, RawMessageEvent};

    fn mention_payload() -> RawMessageEvent {
        RawMessageEvent {
            event_type: "app_mention".to_owned(),
            user: Some("U123".to_owned()),
            channel: Some("C1".to_owned()),
            text: Some("<@UBOT> what is X?".to_owned()),
            ts: Some("1730000000.1000".to_owned()),
            ..RawMessageEvent::default()
        }
    }

    #[test]
    fn mention_is_normalized_with_query_text_stripped() {
        let event = normalize_event(&mention_payload(), Some("UBOT")).expect("event");

        assert_eq!(event.kind, EventKind::Mention);
        assert_eq!(event.sender_id, "U123");
        assert_eq!(event.conversation_id, "C1");
        assert_eq!(event.text, "what is X?");
        assert_eq!(event.message_ts, "1730000000.1000");
    }

    #[test]
    fn unthreaded_message_starts_thread_at_its_own_ts() {
        let event = normalize_event(&mention_payload(), Some("UBOT")).expect("event");
        assert_eq!(event.thread_id, "1730000000.1000");
    }

    #[test]
    fn threaded_message_keeps_existing_thread() {
        let raw = RawMessageEvent {
            thread_ts: Some("1729999999.5000".to_owned()),
            ..mention_payload()
        };

        let event = normalize_event(&raw, Some("UBOT")).expect("event");
        assert_eq!(event.thread_id, "1729999999.5000");
    }

    #[test]
    fn direct_message_is_normalized() {
        let raw = RawMessageEvent {
            event_type: "message".to_owned(),
            channel_type: Some("im".to_owned()),
            channel: Some("D9".to_owned()),
            text: Some("what is X?".to_owned()),
            user: Some("U123".to_owned()),
            ts: Some("1730000000.2000".to_owned()),
            ..RawMessageEvent::default()
        };

        let event = normalize_event(&raw, Some("UBOT")).expect("event");
        assert_eq!(event.kind, EventKind::DirectMessage);
        assert_eq!(event.conversation_id, "D9");
    }

    #[test]
    fn channel_message_without_mention_is_dropped() {
        let raw = RawMessageEvent {
            event_type: "message".to_owned(),
            channel_type: Some("channel".to_owned()),
            ..mention_payload()
        };

        assert_eq!(normalize_event(&raw, Some("UBOT")), None);
    }

    #[test]
    fn missing_channel_is_dropped() {
        let raw = RawMessageEvent { channel: None, ..mention_payload() };
        assert_eq!(normalize_event(&raw, Some("UBOT")), None);
    }

    #[test]
    fn missing_text_is_dropped() {
        let raw = RawMessageEvent { text: None, ..mention_payload() };
        assert_eq!(normalize_event(&raw, Some("UBOT")), None);
    }

    #[test]
    fn mention_with_no_question_is_dropped() {
        let raw = RawMessageEvent { text: Some("<@UBOT>".to_owned()), ..mention_payload() };
        assert_eq!(normalize_event(&raw, Some("UBOT")), None);
    }

    #[test]
    fn message_subtypes_are_dropped() {
        let raw = RawMessageEvent {
            subtype: Some("message_changed".to_owned()),
            ..mention_payload()
        };
        assert_eq!(normalize_event(&raw, Some("UBOT")), None);
    }

    #[test]
    fn bot_authored_payload_is_self_authored() {
        let raw = RawMessageEvent { bot_id: Some("B42".to_owned()), ..mention_payload() };
        assert!(is_self_authored(&raw, Some("UBOT")));
        assert_eq!(normalize_event(&raw, Some("UBOT")), None);
    }

    #[test]
    fn own_bot_user_is_self_authored() {
        let raw = RawMessageEvent { user: Some("UBOT".to_owned()), ..mention_payload() };
        assert!(is_self_authored(&raw, Some("UBOT")));
        assert_eq!(normalize_event(&raw, Some("UBOT")), None);
    }

    #[test]
    fn other_user_is_not_self_authored() {
        assert!(!is_self_authored(&mention_payload(), Some("UBOT")));
    }

    #[test]
    fn unknown_bot_identity_only_filters_bot_id() {
        let raw = RawMessageEvent { bot_id: Some("B42".to_owned()), ..mention_payload() };
        assert!(is_self_authored(&raw, None));
        assert!(!is_self_authored(&mention_payload(), None));
    }

    #[test]
    fn strips_known_bot_mention_anywhere_in_text() {
        assert_eq!(
            strip_bot_mention("hey <@UBOT> what is X?", Some("UBOT")),
            "hey  what is X?"
        );
    }

    #[test]
    fn strips_leading_mention_when_bot_identity_unknown() {
        assert_eq!(strip_bot_mention("<@U999> what is X?", None), "what is X?");
    }

    #[test]
    fn keeps_other_user_mentions_in_the_query() {
        assert_eq!(
            strip_bot_mention("<@UBOT> ask <@U777> about X", Some("UBOT")),
            "ask <@U777> about X"
        );
    }
}
