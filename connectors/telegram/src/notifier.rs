//! [`Notifier`] backed by the Bot API.

use async_trait::async_trait;
use cw_runtime::{ActionError, AudioUpload, Notifier};
use tracing::{info, warn};

use crate::client::TelegramClient;
use crate::error::TelegramError;

/// Delivers call notifications and recordings to a Telegram chat.
#[derive(Debug, Clone)]
pub struct TelegramNotifier {
    client: TelegramClient,
}

impl TelegramNotifier {
    #[must_use]
    pub const fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

fn delivery(err: &TelegramError) -> ActionError {
    ActionError::Delivery(err.to_string())
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, chat: &str, text: &str) -> Result<(), ActionError> {
        match self.client.send_message(chat, text).await {
            Ok(message) => {
                info!(message_id = message.message_id, "Telegram message sent");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Telegram message failed");
                Err(delivery(&e))
            }
        }
    }

    async fn send_audio(&self, chat: &str, upload: &AudioUpload) -> Result<(), ActionError> {
        match self.client.send_audio(chat, upload).await {
            Ok(message) => {
                info!(
                    message_id = message.message_id,
                    title = %upload.title,
                    with_thumbnail = upload.thumbnail.is_some(),
                    "Telegram audio sent"
                );
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, title = %upload.title, "Telegram audio failed");
                Err(delivery(&e))
            }
        }
    }
}
