use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::models::{ApiResponse, Match, MatchStatus};
use crate::error::{WatchError, WatchResult};

/// Client for the football-data.org v4 matches API, scoped to one team.
#[derive(Clone)]
pub struct FootballDataClient {
    http: Client,
    api_key: String,
    team_id: u32,
    /// Base URL for overriding in tests
    base_url: String,
}

impl FootballDataClient {
    pub fn new(api_key: &str, team_id: u32, base_url: &str, timeout: Duration) -> WatchResult<Self> {
        if api_key.trim().is_empty() {
            return Err(WatchError::Config("API key must not be empty".into()));
        }
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WatchError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(FootballDataClient {
            http,
            api_key: api_key.to_string(),
            team_id,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch at most one match with the given status.
    ///
    /// An empty vector means the API has nothing for this filter, which is
    /// not an error.
    pub async fn fetch_matches(&self, status: MatchStatus) -> WatchResult<Vec<Match>> {
        let url = format!("{}/teams/{}/matches", self.base_url, self.team_id);
        debug!("Fetching {} matches from {}", status, url);

        let resp = self
            .http
            .get(&url)
            .header("X-Auth-Token", &self.api_key)
            .query(&[("status", status.as_query()), ("limit", "1")])
            .send()
            .await
            .map_err(|e| WatchError::Fetch(format!("request failed: {}", e)))?;

        if !resp.status().is_success() {
            let code = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(WatchError::Fetch(format!("API error {}: {}", code, body)));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| WatchError::Fetch(format!("failed to read body: {}", e)))?;
        let mut matches = parse_matches(&body)?;
        matches.truncate(1);

        info!("Fetched {} {} match(es)", matches.len(), status);
        Ok(matches)
    }
}

fn parse_matches(body: &[u8]) -> WatchResult<Vec<Match>> {
    let parsed: ApiResponse = serde_json::from_slice(body)
        .map_err(|e| WatchError::Fetch(format!("malformed JSON: {}", e)))?;
    Ok(parsed.matches)
}
