pub mod client;
pub mod models;

pub use client::FootballDataClient;
pub use models::{Match, MatchStatus};
