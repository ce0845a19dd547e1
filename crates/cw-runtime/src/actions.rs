//! Action execution: notifications and recording retrieval.
//!
//! The dispatcher hands each [`Action`] to an [`ActionExecutor`]. The
//! production executor, [`CallActionExecutor`], renders message text and
//! drives two collaborators: a [`Notifier`] (the outbound chat channel) and a
//! [`RecordingFetcher`] (HTTP download of the call audio).

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use cw_core::render::{detected_message, received_caption};
use cw_core::{Action, CallSummary, Credentials};
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::RecordingConfig;
use crate::error::ActionError;

/// Per-connection data an action may need.
#[derive(Debug, Clone)]
pub struct SessionContext {
    /// Credentials the connection was opened with.
    pub credentials: Credentials,
}

/// Executes one action to completion.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Run `action`. Errors are logged by the caller and never retried.
    async fn execute(&self, action: Action, session: &SessionContext) -> Result<(), ActionError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Collaborators
// ─────────────────────────────────────────────────────────────────────────────

/// An audio file ready to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUpload {
    /// Local artifact.
    pub path: PathBuf,
    /// Caption text.
    pub caption: String,
    /// Track title.
    pub title: String,
    /// Duration in seconds.
    pub duration_seconds: u64,
    /// Optional thumbnail image.
    pub thumbnail: Option<PathBuf>,
}

/// Outbound notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a text message to `chat`.
    async fn send_text(&self, chat: &str, text: &str) -> Result<(), ActionError>;

    /// Upload an audio file to `chat`.
    async fn send_audio(&self, chat: &str, upload: &AudioUpload) -> Result<(), ActionError>;
}

/// A downloaded recording on local disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    /// Artifact path.
    pub path: PathBuf,
    /// Response content type, when the server sent one.
    pub content_type: Option<String>,
}

/// Downloads the recording of an ended call.
#[async_trait]
pub trait RecordingFetcher: Send + Sync {
    /// Fetch the recording for `call`. A failure leaves no artifact behind.
    async fn fetch(&self, call: &CallSummary, credentials: &Credentials) -> Result<Recording, ActionError>;
}

/// File extension for a recording content type.
#[must_use]
pub fn extension_for(content_type: Option<&str>) -> &'static str {
    let content_type = content_type.unwrap_or_default().to_ascii_lowercase();
    if content_type.contains("wav") {
        ".wav"
    } else if content_type.contains("ogg") {
        ".ogg"
    } else if content_type.contains("aac") {
        ".aac"
    } else {
        ".mp3"
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// HttpRecordingFetcher
// ─────────────────────────────────────────────────────────────────────────────

/// Fetches recordings from the panel's sound endpoint.
#[derive(Debug, Clone)]
pub struct HttpRecordingFetcher {
    client: reqwest::Client,
    config: RecordingConfig,
    user_agent: String,
}

impl HttpRecordingFetcher {
    /// Create a fetcher.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: RecordingConfig, user_agent: impl Into<String>) -> Result<Self, ActionError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config,
            user_agent: user_agent.into(),
        })
    }

    /// Sound URL for `call`.
    ///
    /// # Errors
    /// Returns an error if the configured endpoint does not parse.
    pub fn recording_url(&self, call: &CallSummary) -> Result<Url, ActionError> {
        let mut url = Url::parse(&self.config.url)?;
        url.query_pairs_mut()
            .append_pair("did", &call.subscriber_id)
            .append_pair("uuid", call.id.as_str());
        Ok(url)
    }

    fn artifact_path(&self, call: &CallSummary, extension: &str) -> PathBuf {
        let subscriber: String = call
            .subscriber_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-'))
            .collect();
        let stamp = chrono::Utc::now().timestamp();
        self.config
            .artifact_dir()
            .join(format!("rec_{subscriber}_{stamp}{extension}"))
    }
}

#[async_trait]
impl RecordingFetcher for HttpRecordingFetcher {
    async fn fetch(&self, call: &CallSummary, credentials: &Credentials) -> Result<Recording, ActionError> {
        let url = self.recording_url(call)?;
        debug!(call_id = %call.id, url = %url, "Fetching recording");

        let mut request = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "*/*")
            .header(reqwest::header::RANGE, "bytes=0-");
        if let Some(referer) = &self.config.referer {
            request = request.header(reqwest::header::REFERER, referer);
        }
        let cookie = credentials.cookie_header();
        if !cookie.is_empty() {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ActionError::FetchStatus {
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let path = self.artifact_path(call, extension_for(content_type.as_deref()));

        if let Err(e) = write_body(response, &path).await {
            remove_artifact(&path).await;
            return Err(e);
        }

        info!(call_id = %call.id, path = %path.display(), "Recording downloaded");
        Ok(Recording { path, content_type })
    }
}

async fn write_body(response: reqwest::Response, path: &Path) -> Result<(), ActionError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut file = tokio::fs::File::create(path).await?;
    let mut body = response.bytes_stream();
    while let Some(chunk) = body.next().await {
        file.write_all(&chunk?).await?;
    }
    file.flush().await?;
    Ok(())
}

async fn remove_artifact(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "Removed artifact"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to remove artifact"),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// CallActionExecutor
// ─────────────────────────────────────────────────────────────────────────────

/// Notify: send the detected text. Retrieve: fetch, upload, delete.
#[derive(Clone)]
pub struct CallActionExecutor {
    notifier: Arc<dyn Notifier>,
    fetcher: Arc<dyn RecordingFetcher>,
    chat: String,
    thumbnail: Option<PathBuf>,
}

impl CallActionExecutor {
    /// Create an executor delivering to `chat`.
    #[must_use]
    pub fn new(notifier: Arc<dyn Notifier>, fetcher: Arc<dyn RecordingFetcher>, chat: impl Into<String>) -> Self {
        Self {
            notifier,
            fetcher,
            chat: chat.into(),
            thumbnail: None,
        }
    }

    /// Attach `path` as the upload thumbnail when it exists.
    #[must_use]
    pub fn with_thumbnail(mut self, path: Option<PathBuf>) -> Self {
        self.thumbnail = path;
        self
    }

    async fn thumbnail(&self) -> Option<PathBuf> {
        let path = self.thumbnail.as_ref()?;
        match tokio::fs::try_exists(path).await {
            Ok(true) => Some(path.clone()),
            _ => {
                warn!(path = %path.display(), "Thumbnail not found, uploading without it");
                None
            }
        }
    }

    async fn retrieve(&self, call: &CallSummary, final_duration: u64, session: &SessionContext) -> Result<(), ActionError> {
        let recording = self.fetcher.fetch(call, &session.credentials).await?;

        let title = recording
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let upload = AudioUpload {
            path: recording.path.clone(),
            caption: received_caption(call, Local::now()),
            title,
            duration_seconds: final_duration,
            thumbnail: self.thumbnail().await,
        };

        let result = self.notifier.send_audio(&self.chat, &upload).await;
        remove_artifact(&recording.path).await;
        result
    }
}

#[async_trait]
impl ActionExecutor for CallActionExecutor {
    async fn execute(&self, action: Action, session: &SessionContext) -> Result<(), ActionError> {
        match action {
            Action::Notify { call } => {
                self.notifier
                    .send_text(&self.chat, &detected_message(&call))
                    .await
            }
            Action::Retrieve { call, final_duration } => {
                self.retrieve(&call, final_duration, session).await
            }
        }
    }
}
