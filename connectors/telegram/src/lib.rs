//! Telegram connector for callwatch.
//!
//! - [`TelegramNotifier`]: delivers detection texts and recordings
//! - [`CommandBot`]: the `/update` credential conversation

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod commands;
pub mod error;
pub mod notifier;
pub mod types;

pub use client::{DEFAULT_API_BASE, TelegramClient};
pub use commands::{CommandBot, CommandBotConfig, ConversationState, CredentialConversation, Step};
pub use error::{TelegramError, TelegramResult};
pub use notifier::TelegramNotifier;
