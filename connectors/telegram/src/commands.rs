//! `/update` credential conversation.
//!
//! [`CredentialConversation`] is the pure state machine; [`CommandBot`] feeds
//! it from a `getUpdates` long poll restricted to one chat, persists the
//! result and tells the feed supervisor to reconnect.

use std::sync::Arc;
use std::time::Duration;

use cw_core::Credentials;
use cw_core::render::escape_html;
use cw_runtime::{Backoff, CredentialStore, SessionHandle};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::client::TelegramClient;
use crate::error::TelegramResult;
use crate::types::Update;

pub const PROMPT_TOKEN: &str = "OK, starting credential update.\n\n1. Please send me the new <code>token</code>.";
pub const PROMPT_USER: &str = "Token received.\n\n2. Now, please send me the <code>user</code> ID.";
pub const PROMPT_COOKIE: &str =
    "User ID received.\n\n3. Finally, please paste the entire new <code>cookie</code> string.";
pub const REPLY_EMPTY: &str = "That was empty. Please send the value again, or /cancel.";
pub const REPLY_CANCELLED: &str = "Update cancelled.";
pub const REPLY_SAVED: &str =
    "✅ <b>Success!</b> Credentials saved.\n\n🔄 <b>Telling scraper to restart...</b>";
pub const REPLY_SIGNALED: &str = "🚀 Scraper signaled to restart.";
pub const REPLY_NOT_RUNNING: &str =
    "Scraper was not running, but will use new credentials on its next start.";

// ─────────────────────────────────────────────────────────────────────────────
// Conversation state machine
// ─────────────────────────────────────────────────────────────────────────────

/// Where the conversation is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConversationState {
    #[default]
    Idle,
    AwaitingToken,
    AwaitingUser {
        token: String,
    },
    AwaitingCookie {
        token: String,
        user: String,
    },
}

/// What the bot should do with one incoming message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Nothing to say.
    Ignore,
    /// Reply with this text.
    Reply(&'static str),
    /// The flow completed; persist these credentials.
    Complete(Credentials),
}

/// Collects token, user and cookie over three messages.
#[derive(Debug, Default)]
pub struct CredentialConversation {
    state: ConversationState,
}

/// Command name of `text`, without the leading slash or a `@botname` suffix.
fn command(text: &str) -> Option<&str> {
    let word = text.split_whitespace().next()?.strip_prefix('/')?;
    Some(word.split('@').next().unwrap_or(word))
}

impl CredentialConversation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Advance on one message from the authorized chat.
    pub fn handle(&mut self, text: &str) -> Step {
        let text = text.trim();

        if let Some(name) = command(text) {
            return match name {
                "update" => {
                    self.state = ConversationState::AwaitingToken;
                    Step::Reply(PROMPT_TOKEN)
                }
                "cancel" if self.state != ConversationState::Idle => {
                    self.state = ConversationState::Idle;
                    Step::Reply(REPLY_CANCELLED)
                }
                _ => Step::Ignore,
            };
        }

        if text.is_empty() && self.state != ConversationState::Idle {
            return Step::Reply(REPLY_EMPTY);
        }

        match std::mem::take(&mut self.state) {
            ConversationState::Idle => Step::Ignore,
            ConversationState::AwaitingToken => {
                self.state = ConversationState::AwaitingUser {
                    token: text.to_string(),
                };
                Step::Reply(PROMPT_USER)
            }
            ConversationState::AwaitingUser { token } => {
                self.state = ConversationState::AwaitingCookie {
                    token,
                    user: text.to_string(),
                };
                Step::Reply(PROMPT_COOKIE)
            }
            ConversationState::AwaitingCookie { token, user } => {
                Step::Complete(Credentials::new(token, user, text))
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CommandBot
// ─────────────────────────────────────────────────────────────────────────────

/// Long-poll settings for [`CommandBot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandBotConfig {
    /// `getUpdates` long-poll timeout (seconds).
    pub poll_timeout_secs: u32,
    /// Retry policy for failed polls.
    pub backoff: Backoff,
}

impl Default for CommandBotConfig {
    fn default() -> Self {
        Self {
            poll_timeout_secs: 30,
            backoff: Backoff::default(),
        }
    }
}

/// Serves the `/update` conversation for one chat.
pub struct CommandBot {
    client: TelegramClient,
    chat_id: String,
    store: Arc<dyn CredentialStore>,
    session: SessionHandle,
    config: CommandBotConfig,
    conversation: CredentialConversation,
    offset: Option<i64>,
}

impl CommandBot {
    #[must_use]
    pub fn new(
        client: TelegramClient,
        chat_id: impl Into<String>,
        store: Arc<dyn CredentialStore>,
        session: SessionHandle,
        config: CommandBotConfig,
    ) -> Self {
        Self {
            client,
            chat_id: chat_id.into().trim().to_string(),
            store,
            session,
            config,
            conversation: CredentialConversation::new(),
            offset: None,
        }
    }

    /// Next `getUpdates` offset.
    #[must_use]
    pub const fn offset(&self) -> Option<i64> {
        self.offset
    }

    /// Poll until `shutdown` becomes `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(chat_id = %self.chat_id, "Command bot running; send /update to begin");
        let mut failures: u32 = 0;

        loop {
            let polled = tokio::select! {
                result = self.poll_once() => result,
                _ = shutdown.wait_for(|stop| *stop) => break,
            };

            match polled {
                Ok(_) => failures = 0,
                Err(e) => {
                    let delay = e
                        .retry_after()
                        .unwrap_or_else(|| self.config.backoff.delay(failures));
                    failures = failures.saturating_add(1);
                    warn!(error = %e, retry_in_ms = delay.as_millis(), "Telegram poll failed");
                    if wait(delay, &mut shutdown).await {
                        break;
                    }
                }
            }
        }

        info!("Command bot stopped");
    }

    /// One `getUpdates` round. Returns the number of updates handled.
    ///
    /// # Errors
    /// Returns an error if the poll itself fails. Reply failures are logged.
    pub async fn poll_once(&mut self) -> TelegramResult<usize> {
        let updates = self
            .client
            .get_updates(self.offset, self.config.poll_timeout_secs)
            .await?;
        let count = updates.len();
        for update in updates {
            self.offset = Some(self.offset.map_or(update.update_id + 1, |o| o.max(update.update_id + 1)));
            self.handle_update(update).await;
        }
        Ok(count)
    }

    async fn handle_update(&mut self, update: Update) {
        let Some(message) = update.message else {
            return;
        };
        if message.chat.id.to_string() != self.chat_id {
            debug!(chat_id = message.chat.id, "Ignoring message from unauthorized chat");
            return;
        }
        let Some(text) = message.text else {
            return;
        };

        match self.conversation.handle(&text) {
            Step::Ignore => {}
            Step::Reply(reply) => self.reply(reply).await,
            Step::Complete(credentials) => self.complete(credentials).await,
        }
    }

    async fn complete(&mut self, credentials: Credentials) {
        if let Err(e) = self.store.save(&credentials).await {
            warn!(error = %e, "Failed to save credentials");
            let text = format!(
                "❌ <b>Error!</b>\nCould not save credentials: {}",
                escape_html(&e.to_string())
            );
            self.reply(&text).await;
            return;
        }

        info!(user = %credentials.user, "Credentials updated");
        self.reply(REPLY_SAVED).await;

        if self.session.disconnect() {
            self.reply(REPLY_SIGNALED).await;
        } else {
            info!("Feed not connected; new credentials apply on the next attempt");
            self.reply(REPLY_NOT_RUNNING).await;
        }
    }

    async fn reply(&self, text: &str) {
        if let Err(e) = self.client.send_message(&self.chat_id, text).await {
            warn!(error = %e, "Failed to send bot reply");
        }
    }
}

async fn wait(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        () = tokio::time::sleep(delay) => false,
        _ = shutdown.wait_for(|stop| *stop) => true,
    }
}
