use thiserror::Error;

/// Failure kinds surfaced by the watcher components.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Missing or invalid configuration (env var, flag, proxy URL, timezone)
    #[error("configuration error: {0}")]
    Config(String),

    /// Network, status or decode failure talking to the match-data API
    #[error("match fetch failed: {0}")]
    Fetch(String),

    /// Malformed timestamp or unusable calendar/timezone data
    #[error("time parse failed: {0}")]
    TimeParse(String),

    /// Banner asset could not be downloaded or stored
    #[error("download of {url} failed: {reason}")]
    Download { url: String, reason: String },

    /// Banner asset is not a decodable raster image
    #[error("image decode failed for {path}: {reason}")]
    Decode { path: String, reason: String },

    /// Rendered banner could not be written
    #[error("banner encode failed: {0}")]
    Encode(String),

    /// Notification was not accepted by the messaging API
    #[error("delivery failed after {attempts} attempt(s): {reason}")]
    Delivery { attempts: u32, reason: String },
}

impl WatchError {
    /// Short label used in logs and run summaries.
    pub fn kind(&self) -> &'static str {
        match self {
            WatchError::Config(_) => "config",
            WatchError::Fetch(_) => "fetch",
            WatchError::TimeParse(_) => "time_parse",
            WatchError::Download { .. } => "download",
            WatchError::Decode { .. } => "decode",
            WatchError::Encode(_) => "encode",
            WatchError::Delivery { .. } => "delivery",
        }
    }
}

pub type WatchResult<T> = std::result::Result<T, WatchError>;
