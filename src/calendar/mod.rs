pub mod jalali;

pub use jalali::{to_jalali, JalaliDate};

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{WatchError, WatchResult};

/// A kick-off instant seen from UTC and from the secondary display zone.
#[derive(Debug, Clone)]
pub struct MatchTime {
    pub utc: DateTime<Utc>,
    pub local: DateTime<Tz>,
    /// Calendar date of `local` in the Jalali calendar
    pub jalali: JalaliDate,
}

/// Converts API timestamps into the configured secondary timezone.
#[derive(Debug, Clone, Copy)]
pub struct TimeConverter {
    zone: Tz,
}

impl TimeConverter {
    pub fn new(zone_name: &str) -> WatchResult<Self> {
        let zone = zone_name
            .parse::<Tz>()
            .map_err(|_| WatchError::TimeParse(format!("unknown timezone '{}'", zone_name)))?;
        Ok(TimeConverter { zone })
    }

    pub fn convert(&self, utc_date: &str) -> WatchResult<MatchTime> {
        let utc = parse_utc(utc_date)?;
        let local = utc.with_timezone(&self.zone);
        let jalali = to_jalali(local.date_naive())?;
        Ok(MatchTime { utc, local, jalali })
    }
}

/// Parse an RFC 3339 timestamp and normalise it to UTC.
pub fn parse_utc(raw: &str) -> WatchResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| WatchError::TimeParse(format!("invalid timestamp '{}': {}", raw, e)))
}

/// True when `match_time` falls on the calendar day of `now - 24h`, both
/// read in `now`'s timezone.
pub fn is_yesterday<Z: TimeZone>(match_time: &DateTime<Utc>, now: &DateTime<Z>) -> bool {
    let zone = now.timezone();
    let yesterday = now.clone() - Duration::hours(24);
    let played = match_time.with_timezone(&zone);
    played.year() == yesterday.year() && played.ordinal() == yesterday.ordinal()
}

/// Whole days until kick-off: hours remaining divided by 24, truncated.
/// Zero means match-day, including a match that already started.
pub fn days_until(match_time: &DateTime<Utc>, now: &DateTime<Utc>) -> i64 {
    (*match_time - *now).num_hours() / 24
}
