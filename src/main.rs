use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info, warn};

mod banner;
mod calendar;
mod config;
mod error;
mod football;
mod telegram;
mod watch;

use banner::BannerCompositor;
use calendar::TimeConverter;
use config::Config;
use football::FootballDataClient;
use telegram::{build_http_client, DryRunNotifier, Notifier, RetryPolicy, TelegramNotifier};
use watch::Watcher;

/// Load `.env` from `env_file` if given, otherwise from the default lookup.
/// A missing default `.env` is fine; a missing explicit file or a malformed
/// one is an error.
fn load_dotenv(env_file: Option<&str>) -> Result<()> {
    match env_file {
        Some(path) => {
            dotenvy::from_path(path).with_context(|| format!("could not load env file {}", path))?;
        }
        None => match dotenvy::dotenv() {
            Err(e) if !e.not_found() => return Err(anyhow::Error::new(e).context("could not load .env")),
            _ => {}
        },
    }
    Ok(())
}

fn build_watcher(config: &Config) -> Result<Watcher> {
    let timeout = config.http_timeout();

    let matches = FootballDataClient::new(&config.api_key, config.team_id, &config.api_url, timeout)?;
    let converter = TimeConverter::new(&config.secondary_timezone)?;
    let banner = BannerCompositor::new(&config.work_dir, timeout)?;

    let notifier: Arc<dyn Notifier> = if config.dry_run {
        info!("🟡 DRY RUN mode – notifications are only logged");
        Arc::new(DryRunNotifier)
    } else {
        let proxy = config.proxy_url()?;
        let http = build_http_client(proxy.as_ref(), timeout)?;
        Arc::new(TelegramNotifier::new(
            http,
            &config.telegram_api_url,
            config.telegram_bot_token.as_deref().unwrap_or_default(),
            config.telegram_channel_id.as_deref().unwrap_or_default(),
            RetryPolicy::default(),
        )?)
    };

    Ok(Watcher::new(matches, converter, banner, notifier))
}

#[tokio::main]
async fn main() -> ExitCode {
    // RUST_LOG may come from .env
    let env_loaded = load_dotenv(std::env::var("ENV_FILE").ok().as_deref());

    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = env_loaded {
        warn!("{:#}", e);
    }
    let config = Config::parse();

    let watcher = match config
        .validate()
        .map_err(anyhow::Error::from)
        .and_then(|_| build_watcher(&config))
    {
        Ok(w) => w,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    info!("Checking matches for team {}", config.team_id);
    let report = watcher.run(Local::now()).await;

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        for (branch, e) in report.errors() {
            error!("{} branch failed: {}", branch, e);
        }
        ExitCode::FAILURE
    }
}
