pub mod client;
pub mod notifier;
pub mod proxy;

pub use client::{RetryPolicy, TelegramNotifier};
pub use notifier::{DryRunNotifier, Notifier};
pub use proxy::{build_http_client, validate_proxy_url};
