//! `callwatch.toml` loading and validation.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use cw_runtime::{RecordingConfig, RuntimeConfig};
use cw_streaming::FeedConfig;
use cw_streaming::socketio::{DEFAULT_EVENT, DEFAULT_USER_AGENT};
use cw_telegram::DEFAULT_API_BASE;
use serde::Deserialize;
use url::Url;

/// Environment variable consulted when `[telegram] bot_token` is unset.
pub const BOT_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Whole configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub feed: FeedSection,
    pub recording: RecordingConfig,
    pub runtime: RuntimeConfig,
    pub telegram: TelegramSection,
    pub credentials: CredentialsSection,
}

// ─────────────────────────────────────────────────────────────────────────────
// Sections
// ─────────────────────────────────────────────────────────────────────────────

/// `[feed]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FeedSection {
    /// WebSocket endpoint of the live-calls panel.
    pub url: String,
    /// Socket.IO event carrying snapshots.
    pub event: String,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
    pub origin: Option<String>,
}

impl Default for FeedSection {
    fn default() -> Self {
        Self {
            url: String::new(),
            event: DEFAULT_EVENT.to_string(),
            connect_timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            origin: None,
        }
    }
}

impl FeedSection {
    /// Transport configuration for this section.
    #[must_use]
    pub fn to_feed_config(&self) -> FeedConfig {
        let config = FeedConfig::new(self.url.clone())
            .with_event(self.event.clone())
            .with_connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .with_user_agent(self.user_agent.clone());
        match &self.origin {
            Some(origin) => config.with_origin(origin.clone()),
            None => config,
        }
    }

    fn validate(&self, errors: &mut Vec<String>) {
        if self.url.trim().is_empty() {
            errors.push("feed.url is required".to_string());
        } else {
            match Url::parse(&self.url) {
                Ok(url) if matches!(url.scheme(), "ws" | "wss") => {}
                Ok(url) => errors.push(format!(
                    "feed.url must use ws:// or wss:// (got {}://)",
                    url.scheme()
                )),
                Err(e) => errors.push(format!("feed.url is not a valid URL: {e}")),
            }
        }
        if self.event.trim().is_empty() {
            errors.push("feed.event must not be empty".to_string());
        }
        if self.connect_timeout_secs == 0 {
            errors.push("feed.connect_timeout_secs must be > 0".to_string());
        }
    }
}

/// `[telegram]`
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TelegramSection {
    /// Chat receiving notifications and allowed to run `/update`.
    pub chat_id: String,
    pub api_base: String,
    /// Falls back to `TELEGRAM_BOT_TOKEN`.
    pub bot_token: Option<String>,
    /// Run the `/update` conversation bot.
    pub commands: bool,
}

impl Default for TelegramSection {
    fn default() -> Self {
        Self {
            chat_id: String::new(),
            api_base: DEFAULT_API_BASE.to_string(),
            bot_token: None,
            commands: true,
        }
    }
}

impl fmt::Debug for TelegramSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramSection")
            .field("chat_id", &self.chat_id)
            .field("api_base", &self.api_base)
            .field("bot_token", &self.bot_token.as_ref().map(|_| "<redacted>"))
            .field("commands", &self.commands)
            .finish()
    }
}

impl TelegramSection {
    /// Bot token from the file or the process environment.
    #[must_use]
    pub fn resolve_token(&self) -> Option<String> {
        self.resolve_token_with(|key| std::env::var(key).ok())
    }

    fn resolve_token_with(&self, env: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.bot_token
            .clone()
            .or_else(|| env(BOT_TOKEN_ENV))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    }

    fn validate(&self, token: Option<&str>, errors: &mut Vec<String>) {
        if self.chat_id.trim().is_empty() {
            errors.push("telegram.chat_id is required".to_string());
        }
        if token.is_none() {
            errors.push(format!(
                "telegram.bot_token is required (or set {BOT_TOKEN_ENV})"
            ));
        }
        if let Err(e) = Url::parse(&self.api_base) {
            errors.push(format!("telegram.api_base is not a valid URL: {e}"));
        }
    }
}

/// `[credentials]`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CredentialsSection {
    /// SQLite database holding the feed credentials.
    pub database: PathBuf,
}

impl Default for CredentialsSection {
    fn default() -> Self {
        Self {
            database: PathBuf::from("callwatch.db"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Loading
// ─────────────────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Read and parse `path`. A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    /// Parse TOML text.
    ///
    /// # Errors
    /// Returns an error if the text is not valid configuration TOML.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Every problem that would stop `run`.
    ///
    /// # Errors
    /// Returns the list of problems found.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        self.validate_with_token(self.telegram.resolve_token().as_deref())
    }

    fn validate_with_token(&self, token: Option<&str>) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        self.feed.validate(&mut errors);
        if let Err(mut problems) = self.recording.validate() {
            errors.append(&mut problems);
        }
        if let Err(mut problems) = self.runtime.validate() {
            errors.append(&mut problems);
        }
        self.telegram.validate(token, &mut errors);
        if self.credentials.database.as_os_str().is_empty() {
            errors.push("credentials.database must not be empty".to_string());
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const EXAMPLE: &str = include_str!("../../../callwatch.example.toml");

    #[test]
    fn example_config_is_valid() {
        let config = AppConfig::parse(EXAMPLE).unwrap();
        assert_eq!(config.validate_with_token(Some("123:abc")), Ok(()));
        assert_eq!(config.runtime.max_workers, 10);
        assert_eq!(config.recording.delay_secs, 15);
    }

    #[test]
    fn empty_file_uses_defaults_and_reports_every_problem() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.feed.event, "call");
        assert_eq!(config.telegram.api_base, DEFAULT_API_BASE);
        assert!(config.telegram.commands);

        let problems = config.validate_with_token(None).unwrap_err();
        assert!(problems.iter().any(|p| p.starts_with("feed.url")));
        assert!(problems.iter().any(|p| p.starts_with("recording.url")));
        assert!(problems.iter().any(|p| p.starts_with("telegram.chat_id")));
        assert!(problems.iter().any(|p| p.starts_with("telegram.bot_token")));
    }

    #[test]
    fn feed_url_must_be_websocket() {
        let config = AppConfig::parse("[feed]\nurl = \"https://panel.example/socket.io/\"").unwrap();
        let problems = config.validate_with_token(Some("t")).unwrap_err();
        assert!(problems.iter().any(|p| p.contains("ws:// or wss://")), "{problems:?}");
    }

    #[test]
    fn token_prefers_file_then_env() {
        let env = |key: &str| (key == BOT_TOKEN_ENV).then(|| " from-env ".to_string());

        let mut section = TelegramSection::default();
        assert_eq!(section.resolve_token_with(env).as_deref(), Some("from-env"));
        assert_eq!(section.resolve_token_with(|_| None), None);

        section.bot_token = Some("from-file".into());
        assert_eq!(section.resolve_token_with(env).as_deref(), Some("from-file"));
    }

    #[test]
    fn debug_hides_bot_token() {
        let section = TelegramSection {
            bot_token: Some("123:secret".into()),
            ..TelegramSection::default()
        };
        assert!(!format!("{section:?}").contains("secret"));
    }

    #[test]
    fn feed_section_maps_to_transport_config() {
        let config = AppConfig::parse(
            "[feed]\nurl = \"wss://panel.example/socket.io/\"\norigin = \"https://panel.example\"\nconnect_timeout_secs = 5",
        )
        .unwrap();
        let feed = config.feed.to_feed_config();
        assert_eq!(feed.url, "wss://panel.example/socket.io/");
        assert_eq!(feed.origin.as_deref(), Some("https://panel.example"));
        assert_eq!(feed.connect_timeout, Duration::from_secs(5));
        assert_eq!(feed.event, "call");
    }

    #[test]
    fn missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.credentials.database, PathBuf::from("callwatch.db"));
    }

    #[test]
    fn unparsable_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[runtime]\nmax_workers = \"many\"").unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("parsing config"));
    }
}
