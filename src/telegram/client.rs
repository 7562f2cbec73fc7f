use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::notifier::Notifier;
use crate::error::{WatchError, WatchResult};

/// Retry budget shared by network timeouts and rate-limit responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Requests counted against the budget before giving up
    pub max_attempts: u32,
    /// Pause after a timed-out request
    pub retry_delay: Duration,
    /// Backoff unit for HTTP 429, doubled per retry already spent
    pub rate_limit_base: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            retry_delay: Duration::from_secs(2),
            rate_limit_base: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// `rate_limit_base << retries`: 2s, 4s, 8s, 16s, 32s with the defaults.
    pub fn rate_limit_backoff(&self, retries: u32) -> Duration {
        let factor = 1u32.checked_shl(retries).unwrap_or(u32::MAX);
        self.rate_limit_base.saturating_mul(factor)
    }
}

#[derive(Serialize)]
struct TextMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Telegram Bot API sender for a single channel.
pub struct TelegramNotifier {
    http: Client,
    /// `{api}/bot{token}`; never logged
    bot_url: String,
    chat_id: String,
    policy: RetryPolicy,
}

impl TelegramNotifier {
    /// `http` should come from [`super::build_http_client`] so the proxy
    /// choice stays explicit.
    pub fn new(
        http: Client,
        api_url: &str,
        bot_token: &str,
        chat_id: &str,
        policy: RetryPolicy,
    ) -> WatchResult<Self> {
        if bot_token.trim().is_empty() {
            return Err(WatchError::Config("TELEGRAM_BOT_TOKEN is not set".into()));
        }
        if chat_id.trim().is_empty() {
            return Err(WatchError::Config("TELEGRAM_CHANNEL_ID is not set".into()));
        }
        Ok(TelegramNotifier {
            http,
            bot_url: format!("{}/bot{}", api_url.trim_end_matches('/'), bot_token),
            chat_id: chat_id.to_string(),
            policy,
        })
    }

    /// Run `send` until it succeeds, a non-retryable failure occurs, or the
    /// retry budget is spent.
    async fn deliver<F, Fut>(&self, method: &str, send: F) -> WatchResult<()>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = reqwest::Result<Response>>,
    {
        let mut retries = 0u32;
        loop {
            debug!("Telegram {} attempt {}", method, retries + 1);
            match send().await {
                Ok(resp) if resp.status().is_success() => {
                    info!("Telegram {} delivered", method);
                    return Ok(());
                }
                Ok(resp) if resp.status() == StatusCode::TOO_MANY_REQUESTS => {
                    let wait = self.policy.rate_limit_backoff(retries);
                    warn!("Telegram rate limit exceeded, retrying after {:?}", wait);
                    tokio::time::sleep(wait).await;
                    retries += 1;
                    if retries >= self.policy.max_attempts {
                        return Err(WatchError::Delivery {
                            attempts: retries,
                            reason: "rate limit exceeded".into(),
                        });
                    }
                }
                Ok(resp) => {
                    let status = resp.status();
                    let body = resp.text().await.unwrap_or_default();
                    return Err(WatchError::Delivery {
                        attempts: retries + 1,
                        reason: format!("{} returned {}: {}", method, status, body),
                    });
                }
                Err(e) if e.is_timeout() => {
                    retries += 1;
                    if retries >= self.policy.max_attempts {
                        return Err(WatchError::Delivery {
                            attempts: retries,
                            reason: format!("network timeout on {}", method),
                        });
                    }
                    warn!("Network timeout on {}, retrying in {:?}", method, self.policy.retry_delay);
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                Err(e) => {
                    return Err(WatchError::Delivery {
                        attempts: retries + 1,
                        reason: format!("{} request failed: {}", method, e.without_url()),
                    });
                }
            }
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_text(&self, message: &str) -> WatchResult<()> {
        let url = format!("{}/sendMessage", self.bot_url);
        let payload = TextMessage {
            chat_id: &self.chat_id,
            text: message,
        };
        self.deliver("sendMessage", || self.http.post(&url).json(&payload).send())
            .await
    }

    async fn send_photo(&self, photo_path: &Path, caption: &str) -> WatchResult<()> {
        let url = format!("{}/sendPhoto", self.bot_url);
        let photo = tokio::fs::read(photo_path)
            .await
            .map_err(|e| WatchError::Delivery {
                attempts: 0,
                reason: format!("cannot read photo {}: {}", photo_path.display(), e),
            })?;
        let file_name = photo_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo.png".to_string());

        // multipart forms are consumed by send, so each attempt builds its own
        self.deliver("sendPhoto", || {
            let form = Form::new()
                .text("chat_id", self.chat_id.clone())
                .text("caption", caption.to_string())
                .part("photo", Part::bytes(photo.clone()).file_name(file_name.clone()));
            self.http.post(&url).multipart(form).send()
        })
        .await
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TOKEN: &str = "123:abc";

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 5,
            retry_delay: Duration::from_millis(1),
            rate_limit_base: Duration::from_millis(1),
        }
    }

    fn notifier(server: &MockServer, timeout: Duration) -> TelegramNotifier {
        let http = crate::telegram::build_http_client(None, timeout).unwrap();
        TelegramNotifier::new(http, &server.uri(), TOKEN, "@channel", fast_policy()).unwrap()
    }

    #[test]
    fn test_default_backoff_schedule() {
        let policy = RetryPolicy::default();
        let waits: Vec<u64> = (0..5).map(|n| policy.rate_limit_backoff(n).as_secs()).collect();
        assert_eq!(waits, vec![2, 4, 8, 16, 32]);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.retry_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy::default();
        assert!(policy.rate_limit_backoff(40) >= policy.rate_limit_backoff(31));
    }

    #[test]
    fn test_missing_credentials() {
        let http = Client::new();
        let policy = RetryPolicy::default();
        assert!(matches!(
            TelegramNotifier::new(http.clone(), "http://x", "", "@c", policy),
            Err(WatchError::Config(_))
        ));
        assert!(matches!(
            TelegramNotifier::new(http, "http://x", TOKEN, " ", policy),
            Err(WatchError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_send_text_posts_json() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{}/sendMessage", TOKEN)))
            .and(body_json(serde_json::json!({"chat_id": "@channel", "text": "hello"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server, Duration::from_secs(5))
            .send_text("hello")
            .await
            .expect("send should succeed");
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("chat not found"))
            .expect(1)
            .mount(&server)
            .await;

        let err = notifier(&server, Duration::from_secs(5))
            .send_text("hello")
            .await
            .unwrap_err();
        match err {
            WatchError::Delivery { attempts, reason } => {
                assert_eq!(attempts, 1);
                assert!(reason.contains("400"));
                assert!(reason.contains("chat not found"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rate_limit_exhausts_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(5)
            .mount(&server)
            .await;

        let err = notifier(&server, Duration::from_secs(5))
            .send_text("hello")
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::Delivery { attempts: 5, .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(2)
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server, Duration::from_secs(5))
            .send_text("hello")
            .await
            .expect("third attempt should succeed");
    }

    #[tokio::test]
    async fn test_timeouts_exhaust_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .expect(5)
            .mount(&server)
            .await;

        let err = notifier(&server, Duration::from_millis(50))
            .send_text("hello")
            .await
            .unwrap_err();
        match err {
            WatchError::Delivery { attempts, reason } => {
                assert_eq!(attempts, 5);
                assert!(reason.contains("timeout"));
            }
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_timeouts_and_rate_limits_share_budget() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let err = notifier(&server, Duration::from_millis(50))
            .send_text("hello")
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::Delivery { attempts: 5, .. }));
        assert_eq!(server.received_requests().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_rate_limit_sleeps_full_schedule_before_failing() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .expect(5)
            .mount(&server)
            .await;

        let unit = Duration::from_millis(20);
        let http = crate::telegram::build_http_client(None, Duration::from_secs(5)).unwrap();
        let policy = RetryPolicy {
            max_attempts: 5,
            retry_delay: Duration::from_millis(1),
            rate_limit_base: unit,
        };
        let notifier = TelegramNotifier::new(http, &server.uri(), TOKEN, "@channel", policy).unwrap();

        let started = std::time::Instant::now();
        let err = notifier.send_text("hello").await.unwrap_err();
        let elapsed = started.elapsed();

        assert!(matches!(err, WatchError::Delivery { attempts: 5, .. }));
        // 1+2+4+8+16 units, the last wait included; a schedule starting at
        // 2 units would need 62
        assert!(elapsed >= unit * 31, "waited only {:?}", elapsed);
        assert!(elapsed < unit * 62, "waited {:?}", elapsed);
    }

    #[tokio::test]
    async fn test_send_photo_uses_multipart_and_retries() {
        let dir = std::env::temp_dir().join(format!("matchday-watch-photo-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let photo = dir.join("banner.png");
        std::fs::write(&photo, b"\x89PNG fake").unwrap();

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{}/sendPhoto", TOKEN)))
            .respond_with(ResponseTemplate::new(429))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/bot{}/sendPhoto", TOKEN)))
            .and(header_regex("content-type", "^multipart/form-data"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        notifier(&server, Duration::from_secs(5))
            .send_photo(&photo, "🚩 [MatchDay]")
            .await
            .expect("photo should be delivered");

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 2);
        let body = String::from_utf8_lossy(&requests[1].body);
        assert!(body.contains("name=\"chat_id\""));
        assert!(body.contains("@channel"));
        assert!(body.contains("🚩 [MatchDay]"));
        assert!(body.contains("filename=\"banner.png\""));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_send_photo_missing_file() {
        let server = MockServer::start().await;
        let err = notifier(&server, Duration::from_secs(5))
            .send_photo(Path::new("/nonexistent/banner.png"), "caption")
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::Delivery { attempts: 0, .. }));
    }
}
