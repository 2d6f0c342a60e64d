//! Slack integration - slash-command webhook interface
//!
//! This crate provides the Slack surface for genie:
//! - **Slash Commands** (`commands`) - inbound payload model and the
//!   `dalle`/`gpt`/`code` prefix dispatcher
//! - **Block Kit** (`blocks`) - typed message builders matching Slack's wire
//!   format
//! - **Webhook** (`webhook`) - posting results to the per-command response
//!   callback URL
//!
//! # Key Types
//!
//! - `SlashCommandPayload` - form-decoded inbound slash command
//! - `BotCommand` - dispatch decision derived from the command text
//! - `WebhookMessage` - in-channel Block Kit reply
//! - `Notifier` - trait for posting replies (reqwest-backed in production)

pub mod blocks;
pub mod commands;
pub mod webhook;
