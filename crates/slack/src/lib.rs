//! Slack Integration - Events API webhook interface
//!
//! This crate provides the Slack-facing half of ragline:
//! - **Event Ingress** (`ingress`) - normalizes raw event payloads into
//!   `InboundEvent` values and drops everything that must not trigger a reply
//!   (self-authored messages, edits, payloads missing required fields)
//! - **Web API client** (`api`) - `reactions.add`, `chat.postMessage`,
//!   `chat.update`, `auth.test` behind the `ChatApi` trait
//! - **Request signing** (`signature`) - Slack v0 HMAC verification for the
//!   inbound webhook
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Subscribe to `app_mention` and `message.im` events and point the request
//!    URL at the relay's `/slack/events` endpoint
//! 3. Set `RAGLINE_SLACK_BOT_TOKEN` (and `RAGLINE_SLACK_SIGNING_SECRET` to
//!    enable request verification)
//!
//! # Key Types
//!
//! - `InboundEvent` - a mention or direct message worth answering
//! - `ChatApi` - the platform call surface the orchestrator depends on
//! - `SlackApiClient` - the `reqwest`-backed implementation

pub mod api;
pub mod ingress;
pub mod signature;
