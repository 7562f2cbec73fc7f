use clap::Parser;
use std::time::Duration;
use url::Url;

use crate::calendar::TimeConverter;
use crate::error::{WatchError, WatchResult};
use crate::telegram::validate_proxy_url;

/// Football match watcher posting to a Telegram channel
#[derive(Parser, Debug, Clone)]
#[command(name = "matchday-watch", version, about)]
pub struct Config {
    /// football-data.org API key
    #[arg(long, env = "API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// football-data.org API base URL
    #[arg(
        long,
        env = "FOOTBALL_API_URL",
        default_value = "https://api.football-data.org/v4"
    )]
    pub api_url: String,

    /// football-data.org team id (81 = FC Barcelona)
    #[arg(long, env = "TEAM_ID", default_value = "81")]
    pub team_id: u32,

    /// Telegram bot token (required unless --dry-run)
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: Option<String>,

    /// Telegram channel id or @username (required unless --dry-run)
    #[arg(long, env = "TELEGRAM_CHANNEL_ID")]
    pub telegram_channel_id: Option<String>,

    /// Telegram Bot API base URL
    #[arg(long, env = "TELEGRAM_API_URL", default_value = "https://api.telegram.org")]
    pub telegram_api_url: String,

    /// Proxy for Telegram requests (http, https or socks5)
    #[arg(long, env = "PROXY_URL")]
    pub proxy: Option<String>,

    /// IANA timezone used for the secondary kick-off time and Jalali date
    #[arg(long, env = "SECONDARY_TIMEZONE", default_value = "Asia/Tehran")]
    pub secondary_timezone: String,

    /// Directory for downloaded crests and the generated banner
    #[arg(long, env = "WORK_DIR", default_value = ".")]
    pub work_dir: String,

    /// Per-request HTTP timeout in seconds
    #[arg(long, env = "HTTP_TIMEOUT_SECS", default_value = "30")]
    pub http_timeout_secs: u64,

    /// Log notifications instead of sending them
    #[arg(long, env = "DRY_RUN", default_value = "false")]
    pub dry_run: bool,
}

impl Config {
    pub fn validate(&self) -> WatchResult<()> {
        if self.api_key.trim().is_empty() {
            return Err(WatchError::Config("API_KEY is required".into()));
        }
        if !self.dry_run {
            if is_blank(&self.telegram_bot_token) {
                return Err(WatchError::Config(
                    "TELEGRAM_BOT_TOKEN is required unless --dry-run is set".into(),
                ));
            }
            if is_blank(&self.telegram_channel_id) {
                return Err(WatchError::Config(
                    "TELEGRAM_CHANNEL_ID is required unless --dry-run is set".into(),
                ));
            }
        }
        if self.http_timeout_secs == 0 {
            return Err(WatchError::Config("http_timeout_secs must be positive".into()));
        }
        TimeConverter::new(&self.secondary_timezone)
            .map_err(|e| WatchError::Config(e.to_string()))?;
        self.proxy_url()?;
        Ok(())
    }

    /// Validated proxy URL, `None` when no proxy is configured.
    pub fn proxy_url(&self) -> WatchResult<Option<Url>> {
        match self.proxy.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => validate_proxy_url(raw).map(Some),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}
