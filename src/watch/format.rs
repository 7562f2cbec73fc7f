use crate::calendar::MatchTime;
use crate::football::Match;

const KEYCAP_DIGITS: [&str; 10] = [
    "0️⃣", "1️⃣", "2️⃣", "3️⃣", "4️⃣", "5️⃣", "6️⃣", "7️⃣", "8️⃣", "9️⃣",
];

/// Rendered in place of a score the API has not filled in.
const NO_SCORE: &str = "➖";

/// Render a score digit by digit as keycap emoji: `23` → `2️⃣3️⃣`.
pub fn score_emoji(score: u32) -> String {
    score
        .to_string()
        .chars()
        .filter_map(|c| c.to_digit(10))
        .map(|d| KEYCAP_DIGITS[d as usize])
        .collect()
}

fn score_or_dash(score: Option<u32>) -> String {
    score.map(score_emoji).unwrap_or_else(|| NO_SCORE.to_string())
}

/// `2024-09-01 15:00 UTC | 18:30 Asia/Tehran (1403/06/11)`
pub fn kickoff(time: &MatchTime) -> String {
    format!(
        "{} UTC | {} {} ({})",
        time.utc.format("%Y-%m-%d %H:%M"),
        time.local.format("%H:%M"),
        time.local.timezone().name(),
        time.jalali
    )
}

fn with_competition(text: String, m: &Match) -> String {
    let name = m.competition.as_ref().and_then(|c| c.name.as_deref());
    let matchday = m.season.as_ref().and_then(|s| s.current_matchday);
    match (name, matchday) {
        (Some(name), Some(day)) => format!("{}\n🏆 {} · Matchday {}", text, name, day),
        (Some(name), None) => format!("{}\n🏆 {}", text, name),
        _ => text,
    }
}

pub fn finished_message(m: &Match) -> String {
    let text = format!(
        "🏁 [FINISHED] {} {}  - {}  {}",
        m.home_team.name,
        score_or_dash(m.score.full_time.home),
        score_or_dash(m.score.full_time.away),
        m.away_team.name
    );
    with_competition(text, m)
}

pub fn countdown_message(m: &Match, days: i64, time: &MatchTime) -> String {
    let text = format!(
        "🚩 [Days Until Match: {}] - {} vs {} - 🕞 {}",
        days,
        m.home_team.name,
        m.away_team.name,
        kickoff(time)
    );
    with_competition(text, m)
}

pub fn matchday_caption(m: &Match, time: &MatchTime) -> String {
    let text = format!(
        "🚩 [MatchDay] - {} vs {} - 🕞 {}",
        m.home_team.name,
        m.away_team.name,
        kickoff(time)
    );
    with_competition(text, m)
}
