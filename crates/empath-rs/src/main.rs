//! Telegram relay binary: loads config, restores history, and polls for messages.

use anyhow::Context;
use clap::Parser;
use empath_rs::config::{Credentials, EmpathConfig};
use empath_rs::core::{LlmCompletionClient, Relay, build_llm_provider};
use empath_rs::history::{HistoryManager, JsonFileStorage, RetentionPolicy};
use empath_rs::telegram::{Poller, TelegramClient};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Command-line options for the relay.
#[derive(Parser)]
#[command(name = "empath", version)]
struct Cli {
    /// Optional path to an empath.json5 config file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the conversation history file
    #[arg(long)]
    history_file: Option<PathBuf>,
    /// Override the completion model name
    #[arg(long)]
    model: Option<String>,
    /// Dotenv file with credentials (defaults to `.env` searched from the cwd upwards)
    #[arg(long)]
    env_file: Option<PathBuf>,
}

/// Load dotenv variables without overriding the process environment.
///
/// The default `.env` is optional; an explicit path must exist.
fn load_env_file(path: Option<&Path>) -> anyhow::Result<Option<PathBuf>> {
    let loaded = match path {
        Some(path) => dotenvy::from_path(path).map(|()| path.to_path_buf()),
        None => dotenvy::dotenv(),
    };
    match loaded {
        Ok(loaded_from) => Ok(Some(loaded_from)),
        Err(err) if path.is_none() && err.not_found() => Ok(None),
        Err(err) => Err(err).context("failed to load env file"),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<EmpathConfig> {
    let mut config = if let Some(path) = cli.config.as_ref() {
        EmpathConfig::load_from_path(path).context("failed to load config")?
    } else {
        let cwd = std::env::current_dir().context("cwd")?;
        info!("loading layered config from cwd: {}", cwd.display());
        let layered = EmpathConfig::load_layered(&cwd).context("failed to load layered config")?;
        debug!("layered config loaded (layers={})", layered.layers.len());
        layered.config
    };
    if let Some(path) = cli.history_file.as_ref() {
        config.history.path = path.display().to_string();
    }
    if let Some(model) = cli.model.as_ref() {
        config.completion.model = model.clone();
    }
    config.validate().context("invalid config")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    empath_rs::init_logging();

    let cli = Cli::parse();
    info!(
        "starting relay (config_set={}, history_file_set={}, model_set={})",
        cli.config.is_some(),
        cli.history_file.is_some(),
        cli.model.is_some()
    );
    match load_env_file(cli.env_file.as_deref())? {
        Some(path) => info!("loaded env file: {}", path.display()),
        None => debug!("no .env file found; using process environment"),
    }
    let credentials = Credentials::from_env().context("missing credentials")?;
    let config = load_config(&cli)?;

    let storage = JsonFileStorage::new(&config.history.path);
    storage
        .ensure_exists()
        .with_context(|| format!("failed to create history file {}", config.history.path))?;
    let retention = RetentionPolicy {
        max_entries_per_user: config.history.max_entries_per_user,
    };
    let history = Arc::new(HistoryManager::load(Arc::new(storage), retention));

    let llm = build_llm_provider(&config.completion, &credentials.completion_api_key)
        .context("failed to build completion provider")?;
    let client = Arc::new(LlmCompletionClient::new(llm));
    let telegram = Arc::new(
        TelegramClient::new(&config.telegram, &credentials.bot_token)
            .context("failed to build telegram client")?,
    );
    let me = telegram.get_me().await.context("failed to fetch bot identity")?;
    let mut relay = Relay::from_config(&config, Arc::clone(&history), client);
    match me.username {
        Some(username) => {
            info!("bot identity resolved (username={})", username);
            relay = relay.with_bot_username(username);
        }
        None => warn!("bot has no username; accepting commands addressed to any bot"),
    }
    let relay = Arc::new(relay);
    info!(
        "relay ready (model={}, stream={}, window_size={}, update_threshold={})",
        config.completion.model,
        config.completion.stream,
        config.relay.window_size,
        config.relay.update_threshold
    );

    Poller::new(telegram, relay)
        .run(async {
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("failed to listen for ctrl-c (error={})", err);
                std::future::pending::<()>().await;
            }
            info!("received ctrl-c");
        })
        .await
        .context("polling failed")?;

    history.flush().context("failed to flush history")?;
    info!("history flushed; exiting");
    Ok(())
}
