use serde::{Deserialize, Serialize};
use std::fmt;

/// Status filter accepted by the `/teams/{id}/matches` endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStatus {
    Finished,
    Scheduled,
}

impl MatchStatus {
    pub fn as_query(&self) -> &'static str {
        match self {
            MatchStatus::Finished => "FINISHED",
            MatchStatus::Scheduled => "SCHEDULED",
        }
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query())
    }
}

/// A single fixture as returned by football-data.org
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// ISO-8601 kick-off instant in UTC, e.g. `2024-09-01T15:00:00Z`
    pub utc_date: String,
    pub home_team: Team,
    pub away_team: Team,
    #[serde(default)]
    pub score: Score,
    #[serde(default)]
    pub season: Option<Season>,
    #[serde(default)]
    pub competition: Option<Competition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub name: String,
    /// Crest image URL
    #[serde(rename = "crest", default)]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Score {
    #[serde(default)]
    pub full_time: FullTime,
}

/// Full-time goals; both are `null` until the match is played
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FullTime {
    pub home: Option<u32>,
    pub away: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Season {
    pub current_matchday: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Competition {
    pub name: Option<String>,
}

/// Envelope of the matches endpoint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub matches: Vec<Match>,
}
