use chrono::{Duration as ChronoDuration, Local, NaiveDate, TimeZone};
use rand::Rng;
use rand::seq::SliceRandom;
use serde_json::Value;

use crate::model::{COMPETITIONS, DateTab, FORM_LEN, MatchStatus, RawMatch};
use crate::normalize::competition_id;

const DETAIL_NOTES: &[&str] = &[
    "Key player injured.",
    "Pitch conditions poor.",
    "Kick-off delayed by heavy rain.",
    "Played behind closed doors.",
];

fn team_pool(competition: &str) -> &'static [&'static str] {
    match competition {
        "Premier League" => &[
            "Arsenal",
            "Chelsea",
            "Liverpool",
            "Manchester City",
            "Manchester United",
            "Tottenham Hotspur",
            "Newcastle United",
            "Aston Villa",
            "Brighton & Hove Albion",
            "West Ham United",
        ],
        "La Liga" => &[
            "Real Madrid",
            "FC Barcelona",
            "Atlético Madrid",
            "Sevilla",
            "Real Sociedad",
            "Villarreal",
            "Real Betis",
            "Athletic Club",
        ],
        "Serie A" => &[
            "Inter",
            "AC Milan",
            "Juventus",
            "Napoli",
            "AS Roma",
            "Lazio",
            "Atalanta",
            "Fiorentina",
        ],
        "Bundesliga" => &[
            "Bayern München",
            "Borussia Dortmund",
            "RB Leipzig",
            "Bayer Leverkusen",
            "Eintracht Frankfurt",
            "VfB Stuttgart",
            "SC Freiburg",
            "1. FC Union Berlin",
        ],
        "Ligue 1" => &[
            "Paris Saint-Germain",
            "Olympique de Marseille",
            "AS Monaco",
            "LOSC Lille",
            "Olympique Lyonnais",
            "Stade Rennais",
            "OGC Nice",
            "RC Lens",
        ],
        "MLS" => &[
            "LA Galaxy",
            "Inter Miami",
            "Seattle Sounders",
            "LAFC",
            "Atlanta United",
            "New York Red Bulls",
        ],
        _ => &[
            "Real Madrid",
            "Manchester City",
            "Bayern München",
            "Paris Saint-Germain",
            "Inter",
            "Benfica",
            "FC Porto",
            "Ajax",
            "Celtic",
            "Galatasaray",
        ],
    }
}

/// Generates 5-7 plausible raw records for one competition/tab pass.
///
/// Roughly one in eight form strings arrives without separators and one in twelve is
/// truncated, so the normalizer's repair paths get exercised.
pub fn generate_raw_matches(
    competition: Option<&str>,
    tab: DateTab,
    today: NaiveDate,
    rng: &mut impl Rng,
) -> Vec<RawMatch> {
    let count = rng.gen_range(5..=7);
    let leagues: Vec<&'static str> = COMPETITIONS
        .iter()
        .filter(|c| !c.is_all())
        .map(|c| c.name)
        .collect();

    (0..count)
        .map(|idx| {
            let league = match competition {
                Some(name) => name.to_string(),
                None => leagues[rng.gen_range(0..leagues.len())].to_string(),
            };
            let (home, away) = pick_pair(team_pool(&league), rng);
            let day = match tab {
                DateTab::Today => today,
                DateTab::Tomorrow => today + ChronoDuration::days(1),
                DateTab::LastMatches => today - ChronoDuration::days(rng.gen_range(1..=3)),
            };
            let hour = rng.gen_range(12..=21);
            let status = pick_status(tab, rng);
            let (score, half_time) = pick_scores(&status, rng);

            RawMatch {
                league: league.clone(),
                round: format!("Matchday {}", 1 + (idx % 38)),
                date: local_iso(day, hour),
                status: status.label().to_string(),
                home_team_name: home.to_string(),
                away_team_name: away.to_string(),
                home_score: score.map(|s| s.0),
                away_score: score.map(|s| s.1),
                home_half_time_score: half_time.map(|s| s.0),
                away_half_time_score: half_time.map(|s| s.1),
                competition_id: competition_id(&league),
                competition_name: league,
                details_error: if rng.gen_bool(0.1) {
                    DETAIL_NOTES.choose(rng).map(|s| s.to_string())
                } else {
                    None
                },
                home_team_recent_form: random_form(rng),
                away_team_recent_form: random_form(rng),
            }
        })
        .collect()
}

fn pick_pair(pool: &'static [&'static str], rng: &mut impl Rng) -> (&'static str, &'static str) {
    let home = rng.gen_range(0..pool.len());
    let mut away = rng.gen_range(0..pool.len() - 1);
    if away >= home {
        away += 1;
    }
    (pool[home], pool[away])
}

fn pick_status(tab: DateTab, rng: &mut impl Rng) -> MatchStatus {
    match tab {
        DateTab::Today => {
            if rng.gen_bool(0.3) {
                MatchStatus::InProgress
            } else {
                MatchStatus::Scheduled
            }
        }
        DateTab::Tomorrow => MatchStatus::Scheduled,
        DateTab::LastMatches => match rng.gen_range(0..10) {
            0 => MatchStatus::Cancelled,
            1 => MatchStatus::Postponed,
            _ => MatchStatus::Finished,
        },
    }
}

type Score = (u32, u32);

fn pick_scores(status: &MatchStatus, rng: &mut impl Rng) -> (Option<Score>, Option<Score>) {
    match status {
        MatchStatus::Finished => {
            let full = (rng.gen_range(0..=4), rng.gen_range(0..=4));
            let half = (rng.gen_range(0..=full.0), rng.gen_range(0..=full.1));
            (Some(full), Some(half))
        }
        MatchStatus::InProgress => (Some((rng.gen_range(0..=2), rng.gen_range(0..=2))), None),
        _ => (None, None),
    }
}

fn random_form(rng: &mut impl Rng) -> Value {
    const RESULTS: [char; 3] = ['W', 'D', 'L'];
    let len = if rng.gen_bool(1.0 / 12.0) {
        FORM_LEN - 1
    } else {
        FORM_LEN
    };
    let letters: Vec<String> = (0..len)
        .map(|_| RESULTS[rng.gen_range(0..RESULTS.len())].to_string())
        .collect();
    let sep = if rng.gen_bool(0.125) { "" } else { " " };
    Value::String(letters.join(sep))
}

fn local_iso(day: NaiveDate, hour: u32) -> String {
    let naive = day.and_hms_opt(hour, 0, 0).unwrap_or_default();
    match Local.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.to_rfc3339(),
        None => naive.and_utc().to_rfc3339(),
    }
}
