//! Relay Orchestrator - drives one inbound event to completion
//!
//! This crate owns the only nontrivial contract in ragline:
//! - **Answer client** (`answer`) - single bounded `POST {"query": ...}` call
//!   to the remote answer service, never retried
//! - **Orchestrator** (`orchestrator`) - acknowledgment reaction, placeholder
//!   post, remote call, resolving edit, in that order
//!
//! # Architecture
//!
//! ```text
//! InboundEvent → Relay::handle
//!                  ├─ reactions.add      (best effort)
//!                  ├─ chat.postMessage   (placeholder; fatal on failure)
//!                  ├─ AnswerClient::answer (one call, 60s budget)
//!                  └─ chat.update        (answer text or fixed apology)
//! ```
//!
//! Each exchange is independent: no state survives `handle` returning and no
//! two exchanges coordinate with each other.

pub mod answer;
pub mod orchestrator;

pub use answer::{AnswerClient, AnswerError, HttpAnswerClient};
pub use orchestrator::{EventContext, ExchangeOutcome, FailureKind, Relay, RelayError, RelayExchange};
