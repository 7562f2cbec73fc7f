use reqwest::{Client, Proxy};
use std::time::Duration;
use tracing::info;
use url::Url;

use crate::error::{WatchError, WatchResult};

const SUPPORTED_SCHEMES: [&str; 3] = ["http", "https", "socks5"];

/// Validate a forward-proxy URL: scheme must be http, https or socks5 and a
/// hostname must be present.
pub fn validate_proxy_url(raw: &str) -> WatchResult<Url> {
    let parsed = Url::parse(raw)
        .map_err(|e| WatchError::Config(format!("invalid proxy URL '{}': {}", raw, e)))?;

    if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
        return Err(WatchError::Config(format!(
            "unsupported proxy scheme: {}",
            parsed.scheme()
        )));
    }

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(parsed),
        _ => Err(WatchError::Config(
            "missing hostname or IP address in proxy URL".into(),
        )),
    }
}

/// Build the HTTP client used for messaging, routed through `proxy` when given.
pub fn build_http_client(proxy: Option<&Url>, timeout: Duration) -> WatchResult<Client> {
    let mut builder = Client::builder().timeout(timeout);
    if let Some(url) = proxy {
        let proxy = Proxy::all(url.as_str())
            .map_err(|e| WatchError::Config(format!("unusable proxy URL: {}", e)))?;
        info!(
            "Routing Telegram requests through {} proxy at {}",
            url.scheme(),
            url.host_str().unwrap_or_default()
        );
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| WatchError::Config(format!("failed to build HTTP client: {}", e)))
}
