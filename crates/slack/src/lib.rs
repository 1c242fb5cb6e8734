//! Slack slash-command engine
//!
//! This crate turns an inbound, untrusted slash-command webhook into a verified
//! command invocation and delivers the handler's reply:
//! - **Request verification** (`verify`) - HMAC-SHA256 signature, replay window
//! - **Slash Commands** (`commands`) - form payload parsing, the `SlashCommand` trait
//! - **Registry** (`registry`) - ordered handler set and dispatch
//! - **Help** (`help`) - listing synthesized from the registered handlers
//! - **Responder** (`responder`) - JSON reply POSTed to the `response_url`
//! - **Service** (`service`) - dispatch + delivery for one invocation
//!
//! # Architecture
//!
//! ```text
//! HTTP request → RequestVerifier → SlashCommandPayload → CommandInvocation
//!                                        ↓ (ack)
//!              ReplySender ← CommandRegistry::dispatch
//! ```

pub mod commands;
pub mod help;
pub mod registry;
pub mod responder;
pub mod service;
pub mod verify;
