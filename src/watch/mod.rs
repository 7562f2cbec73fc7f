pub mod format;

use chrono::{DateTime, Local, Utc};
use std::sync::Arc;
use tracing::{error, info};

use crate::banner::BannerCompositor;
use crate::calendar::{days_until, is_yesterday, TimeConverter};
use crate::error::{WatchError, WatchResult};
use crate::football::{FootballDataClient, Match, MatchStatus};
use crate::telegram::Notifier;

/// What a branch did when it completed without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchOutcome {
    /// The API returned no match for this filter
    NoMatch,
    /// Last finished match was not played yesterday
    NotYesterday,
    ResultPosted,
    CountdownPosted { days: i64 },
    /// Match-day caption sent as text because a crest URL was missing
    MatchDayPosted,
    BannerPosted,
}

/// Outcome of both branches of one run. The branches are independent: one
/// failing never prevents the other from running.
#[derive(Debug)]
pub struct RunReport {
    pub finished: WatchResult<BranchOutcome>,
    pub scheduled: WatchResult<BranchOutcome>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.finished.is_ok() && self.scheduled.is_ok()
    }

    pub fn errors(&self) -> Vec<(&'static str, &WatchError)> {
        let mut out = Vec::new();
        if let Err(e) = &self.finished {
            out.push(("finished", e));
        }
        if let Err(e) = &self.scheduled {
            out.push(("scheduled", e));
        }
        out
    }
}

/// Runs the finished-match and scheduled-match checks for one team.
pub struct Watcher {
    matches: FootballDataClient,
    converter: TimeConverter,
    banner: BannerCompositor,
    notifier: Arc<dyn Notifier>,
}

impl Watcher {
    pub fn new(
        matches: FootballDataClient,
        converter: TimeConverter,
        banner: BannerCompositor,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Watcher {
            matches,
            converter,
            banner,
            notifier,
        }
    }

    pub async fn run(&self, now: DateTime<Local>) -> RunReport {
        info!("Running checks via {} notifier", self.notifier.name());

        let finished = self.check_finished(&now).await;
        log_outcome("finished", &finished);

        let scheduled = self.check_scheduled(&now.with_timezone(&Utc)).await;
        log_outcome("scheduled", &scheduled);

        RunReport {
            finished,
            scheduled,
        }
    }

    /// Post the result of the last finished match if it was played yesterday
    /// (calendar day in `now`'s timezone).
    pub async fn check_finished(&self, now: &DateTime<Local>) -> WatchResult<BranchOutcome> {
        let Some(m) = self.first_match(MatchStatus::Finished).await? else {
            info!("No finished matches found");
            return Ok(BranchOutcome::NoMatch);
        };

        let time = self.converter.convert(&m.utc_date)?;
        if !is_yesterday(&time.utc, now) {
            info!(
                "Last match {} vs {} was not played yesterday",
                m.home_team.name, m.away_team.name
            );
            return Ok(BranchOutcome::NotYesterday);
        }

        self.notifier.send_text(&format::finished_message(&m)).await?;
        Ok(BranchOutcome::ResultPosted)
    }

    /// Post a countdown for the next match, or a banner on match-day.
    pub async fn check_scheduled(&self, now: &DateTime<Utc>) -> WatchResult<BranchOutcome> {
        let Some(m) = self.first_match(MatchStatus::Scheduled).await? else {
            info!("No upcoming matches found");
            return Ok(BranchOutcome::NoMatch);
        };

        let time = self.converter.convert(&m.utc_date)?;
        let days = days_until(&time.utc, now);
        if days != 0 {
            let text = format::countdown_message(&m, days, &time);
            self.notifier.send_text(&text).await?;
            return Ok(BranchOutcome::CountdownPosted { days });
        }

        let caption = format::matchday_caption(&m, &time);
        match (m.home_team.logo_url.as_deref(), m.away_team.logo_url.as_deref()) {
            (Some(home), Some(away)) => {
                let banner = self.banner.generate(home, away).await?;
                self.notifier.send_photo(&banner, &caption).await?;
                Ok(BranchOutcome::BannerPosted)
            }
            _ => {
                info!("Crest URL missing, sending match-day notice without banner");
                self.notifier.send_text(&caption).await?;
                Ok(BranchOutcome::MatchDayPosted)
            }
        }
    }

    async fn first_match(&self, status: MatchStatus) -> WatchResult<Option<Match>> {
        Ok(self.matches.fetch_matches(status).await?.into_iter().next())
    }
}

fn log_outcome(branch: &str, outcome: &WatchResult<BranchOutcome>) {
    match outcome {
        Ok(o) => info!("{} check done: {:?}", branch, o),
        Err(e) => error!("{} check failed ({}): {}", branch, e.kind(), e),
    }
}
