//! Telegram Bot API client.

use std::fmt;
use std::time::Duration;

use cw_runtime::AudioUpload;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{TelegramError, TelegramResult};
use crate::types::{ApiResponse, Message, Update};

/// Default Bot API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

const SEND_MESSAGE_TIMEOUT: Duration = Duration::from_secs(10);
const SEND_AUDIO_TIMEOUT: Duration = Duration::from_secs(30);
/// Slack added on top of the long-poll timeout for `getUpdates`.
const POLL_SLACK: Duration = Duration::from_secs(10);

/// Thin Bot API client.
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    token: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TelegramClient {
    /// Create a client for `token` against `api_base`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(token: impl Into<String>, api_base: impl Into<String>) -> TelegramResult<Self> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.token)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        request: reqwest::RequestBuilder,
    ) -> TelegramResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        let parsed: ApiResponse<T> = match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(TelegramError::Api {
                    status: status.as_u16(),
                    description: String::from_utf8_lossy(&body).into_owned(),
                    retry_after: None,
                });
            }
            Err(e) => return Err(e.into()),
        };

        match parsed.result {
            Some(result) if parsed.ok => {
                debug!(method, "Telegram call succeeded");
                Ok(result)
            }
            _ => Err(TelegramError::Api {
                status: parsed
                    .error_code
                    .and_then(|code| u16::try_from(code).ok())
                    .unwrap_or_else(|| status.as_u16()),
                description: parsed
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
                retry_after: parsed.parameters.and_then(|p| p.retry_after),
            }),
        }
    }

    /// `sendMessage` with HTML parse mode.
    ///
    /// # Errors
    /// Returns an error on transport failure or an API error response.
    pub async fn send_message(&self, chat_id: &str, text: &str) -> TelegramResult<Message> {
        let request = self
            .http
            .post(self.method_url("sendMessage"))
            .timeout(SEND_MESSAGE_TIMEOUT)
            .form(&[("chat_id", chat_id), ("text", text), ("parse_mode", "HTML")]);
        self.call("sendMessage", request).await
    }

    /// `sendAudio` as a multipart upload, with an optional thumbnail.
    ///
    /// # Errors
    /// Returns an error if a file cannot be read, on transport failure or on
    /// an API error response.
    pub async fn send_audio(&self, chat_id: &str, upload: &AudioUpload) -> TelegramResult<Message> {
        let audio = tokio::fs::read(&upload.path).await?;
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", upload.caption.clone())
            .text("title", upload.title.clone())
            .text("duration", upload.duration_seconds.to_string())
            .part("audio", Part::bytes(audio).file_name(upload.title.clone()));

        if let Some(thumbnail) = &upload.thumbnail {
            let bytes = tokio::fs::read(thumbnail).await?;
            let name = thumbnail
                .file_name()
                .map_or_else(|| "thumbnail".to_string(), |n| n.to_string_lossy().into_owned());
            form = form.part("thumbnail", Part::bytes(bytes).file_name(name));
        }

        let request = self
            .http
            .post(self.method_url("sendAudio"))
            .timeout(SEND_AUDIO_TIMEOUT)
            .multipart(form);
        self.call("sendAudio", request).await
    }

    /// `getUpdates` long poll for messages.
    ///
    /// # Errors
    /// Returns an error on transport failure or an API error response.
    pub async fn get_updates(&self, offset: Option<i64>, timeout_secs: u32) -> TelegramResult<Vec<Update>> {
        let mut query = vec![
            ("timeout", timeout_secs.to_string()),
            ("allowed_updates", r#"["message"]"#.to_string()),
        ];
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let request = self
            .http
            .get(self.method_url("getUpdates"))
            .timeout(Duration::from_secs(u64::from(timeout_secs)) + POLL_SLACK)
            .query(&query);
        self.call("getUpdates", request).await
    }
}
