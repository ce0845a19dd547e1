//! `callwatch`: watches a live-calls feed, announces new calls and delivers
//! their recordings to Telegram.

#![forbid(unsafe_code)]

mod config;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cw_core::Credentials;
use cw_runtime::{
    CallActionExecutor, CredentialStore, FeedSupervisor, HttpRecordingFetcher, SqliteCredentialStore,
};
use cw_streaming::SocketIoTransport;
use cw_telegram::{CommandBot, CommandBotConfig, TelegramClient, TelegramNotifier};
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::logging::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "callwatch", version, about = "Live-calls feed monitor with Telegram delivery")]
struct Cli {
    /// Configuration file.
    #[arg(long, short = 'c', env = "CALLWATCH_CONFIG", default_value = "callwatch.toml", global = true)]
    config: PathBuf,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Connect to the feed and process calls until Ctrl-C.
    Run,
    /// Manage stored feed credentials.
    Credentials {
        #[command(subcommand)]
        action: CredentialsCommand,
    },
    /// Validate the configuration file.
    CheckConfig,
}

#[derive(Subcommand, Debug)]
enum CredentialsCommand {
    /// Store a new credential set.
    Set {
        #[arg(long)]
        token: String,
        #[arg(long)]
        user: String,
        /// Full browser cookie string.
        #[arg(long)]
        cookie: String,
    },
    /// Show the stored credentials, redacted.
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.log_format);

    let config = AppConfig::load(&cli.config)?;
    match cli.command {
        Command::Run => run(config).await,
        Command::Credentials { action } => credentials(&config, action).await,
        Command::CheckConfig => check_config(&config),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// run
// ─────────────────────────────────────────────────────────────────────────────

async fn run(config: AppConfig) -> Result<()> {
    if let Err(problems) = config.validate() {
        for problem in &problems {
            error!(%problem, "Invalid configuration");
        }
        bail!("configuration has {} problem(s); see `callwatch check-config`", problems.len());
    }

    let store = Arc::new(
        SqliteCredentialStore::open(&config.credentials.database).context("opening credential store")?,
    );
    let token = config
        .telegram
        .resolve_token()
        .context("telegram bot token missing")?;
    let telegram = TelegramClient::new(token, config.telegram.api_base.clone())?;
    let chat_id = config.telegram.chat_id.trim().to_string();

    let fetcher = HttpRecordingFetcher::new(config.recording.clone(), config.feed.user_agent.clone())?;
    let executor = CallActionExecutor::new(
        Arc::new(TelegramNotifier::new(telegram.clone())),
        Arc::new(fetcher),
        chat_id.clone(),
    )
    .with_thumbnail(config.recording.thumbnail.clone());

    let mut supervisor = FeedSupervisor::new(
        config.runtime.clone(),
        config.recording.delay(),
        Arc::new(SocketIoTransport::new(config.feed.to_feed_config())),
        store.clone(),
        Arc::new(executor),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let bot = config.telegram.commands.then(|| {
        let bot = CommandBot::new(
            telegram,
            chat_id,
            store,
            supervisor.handle(),
            CommandBotConfig::default(),
        );
        tokio::spawn(bot.run(shutdown_rx.clone()))
    });

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Cannot listen for Ctrl-C");
            return;
        }
        info!("Shutdown requested, draining in-flight actions");
        shutdown_tx.send_replace(true);
    });

    let stats = supervisor.run(shutdown_rx).await;
    if let Some(bot) = bot {
        bot.await.context("command bot task failed")?;
    }

    info!(
        connections = stats.successful_connections,
        snapshots = stats.snapshots,
        actions = stats.actions_dispatched,
        "callwatch stopped"
    );
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// credentials / check-config
// ─────────────────────────────────────────────────────────────────────────────

async fn credentials(config: &AppConfig, action: CredentialsCommand) -> Result<()> {
    let store = SqliteCredentialStore::open(&config.credentials.database)
        .context("opening credential store")?;

    match action {
        CredentialsCommand::Set { token, user, cookie } => {
            let credentials = Credentials::new(token, user, cookie);
            if !credentials.is_complete() {
                bail!("token, user and cookie must all be non-empty");
            }
            store.save(&credentials).await?;
            println!("Credentials saved to {}", store.path().display());
        }
        CredentialsCommand::Show => match store.load().await? {
            Some(credentials) => println!("{}", describe(&credentials)),
            None => println!("No complete credentials stored in {}", store.path().display()),
        },
    }
    Ok(())
}

fn check_config(config: &AppConfig) -> Result<()> {
    match config.validate() {
        Ok(()) => {
            println!("Configuration OK");
            Ok(())
        }
        Err(problems) => {
            for problem in &problems {
                println!("  - {problem}");
            }
            bail!("{} configuration problem(s)", problems.len())
        }
    }
}

/// Redacted, human-readable credential summary.
fn describe(credentials: &Credentials) -> String {
    let token_hint: String = credentials.token.chars().take(4).collect();
    let names: Vec<String> = credentials
        .cookie_pairs()
        .into_iter()
        .map(|pair| pair.name)
        .collect();
    format!(
        "token:  {token_hint}… ({} chars)\nuser:   {}\ncookie: {} pair(s) [{}]",
        credentials.token.chars().count(),
        credentials.user,
        names.len(),
        names.join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_credentials_set() {
        let cli = Cli::try_parse_from([
            "callwatch", "--log-format", "json", "credentials", "set", "--token", "t", "--user", "u",
            "--cookie", "a=1",
        ])
        .unwrap();
        assert_eq!(cli.log_format, LogFormat::Json);
        assert!(matches!(
            cli.command,
            Command::Credentials {
                action: CredentialsCommand::Set { .. }
            }
        ));
    }

    #[test]
    fn describe_redacts_secrets() {
        let credentials = Credentials::new("abcdefghij", "user-1", "sid=secret; lang=en");
        let text = describe(&credentials);
        assert_eq!(
            text,
            "token:  abcd… (10 chars)\nuser:   user-1\ncookie: 2 pair(s) [sid, lang]"
        );
        assert!(!text.contains("secret"));
    }
}
