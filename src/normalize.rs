//! Turns raw source records into finished [`Match`] entities.
//!
//! Nothing here fails: malformed sub-fields degrade to sentinels and the problem is reported
//! through the caller's diagnostic sink.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::model::{
    FORM_LEN, FORM_SENTINEL, Match, MatchStatus, RawMatch, RecentForm, Team,
};
use crate::win_prob;

const LOGO_BASE_URL: &str = "https://picsum.photos/seed";
const UNKNOWN_COMPETITION_ID: &str = "unknown-competition";
const UNKNOWN_TIMESTAMP: &str = "nan";

/// Normalizes a fetched batch, discarding diagnostics.
pub fn normalize_matches(raw: &[RawMatch]) -> Vec<Match> {
    normalize_matches_with(raw, |_| {})
}

/// Normalizes a fetched batch, reporting per-record problems to `on_warn`.
///
/// Output order and length always match the input.
pub fn normalize_matches_with(raw: &[RawMatch], mut on_warn: impl FnMut(String)) -> Vec<Match> {
    raw.iter()
        .enumerate()
        .map(|(index, record)| normalize_match(record, index, &mut on_warn))
        .collect()
}

pub fn normalize_match(raw: &RawMatch, index: usize, on_warn: &mut impl FnMut(String)) -> Match {
    let home_team = team_from_name(&raw.home_team_name);
    let away_team = team_from_name(&raw.away_team_name);

    let home_form = validate_form_reporting(&raw.home_team_recent_form, &home_team.name, on_warn);
    let away_form = validate_form_reporting(&raw.away_team_recent_form, &away_team.name, on_warn);
    let outcome_probabilities = win_prob::estimate(&home_form, &away_form);

    let kickoff = parse_kickoff(&raw.date);
    if kickoff.is_none() {
        on_warn(format!(
            "[WARN] Unparseable match date \"{}\" for {} vs {}",
            raw.date, home_team.name, away_team.name
        ));
    }

    let status = MatchStatus::parse(&raw.status);
    if !status.is_known() {
        on_warn(format!(
            "[WARN] Unknown match status \"{}\" for {} vs {}",
            raw.status, home_team.name, away_team.name
        ));
    }

    let id = match_id(&home_team.id, &away_team.id, kickoff, index);

    Match {
        id,
        league: raw.league.clone(),
        round: raw.round.clone(),
        date: raw.date.clone(),
        kickoff,
        status,
        home_team,
        away_team,
        home_score: raw.home_score,
        away_score: raw.away_score,
        home_half_time_score: raw.home_half_time_score,
        away_half_time_score: raw.away_half_time_score,
        recent_form: RecentForm {
            home: home_form,
            away: away_form,
        },
        outcome_probabilities: Some(outcome_probabilities),
        details_error: raw.details_error.clone(),
        competition_id: competition_id(&raw.competition_name),
        competition_name: raw.competition_name.clone(),
    }
}

/// Lower-cases, turns whitespace runs into `-` and drops anything outside `[A-Za-z0-9_-]`.
pub fn slugify(text: &str) -> String {
    let lower = text.to_lowercase();
    let mut out = String::with_capacity(lower.len());
    let mut in_space = false;
    for ch in lower.chars() {
        if ch.is_whitespace() {
            if !in_space {
                out.push('-');
                in_space = true;
            }
            continue;
        }
        in_space = false;
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            out.push(ch);
        }
    }
    out
}

pub fn team_from_name(name: &str) -> Team {
    let id = slugify(name);
    Team {
        logo_url: logo_url(&id),
        id,
        name: name.to_string(),
    }
}

pub fn logo_url(team_id: &str) -> String {
    format!("{LOGO_BASE_URL}/{team_id}/40/40")
}

/// Grouping key derived from the record's own competition name.
pub fn competition_id(competition_name: &str) -> String {
    let slug = slugify(competition_name);
    if slug.is_empty() {
        UNKNOWN_COMPETITION_ID.to_string()
    } else {
        slug
    }
}

/// `{home}-vs-{away}-{epoch_ms}-{index}`; the index keeps same-day rematches apart.
pub fn match_id(
    home_id: &str,
    away_id: &str,
    kickoff: Option<DateTime<Utc>>,
    index: usize,
) -> String {
    let stamp = kickoff
        .map(|dt| dt.timestamp_millis().to_string())
        .unwrap_or_else(|| UNKNOWN_TIMESTAMP.to_string());
    format!("{home_id}-vs-{away_id}-{stamp}-{index}")
}

/// Accepts RFC 3339, zone-less date-times (read as UTC) and bare dates (UTC midnight).
pub fn parse_kickoff(raw: &str) -> Option<DateTime<Utc>> {
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt.and_utc());
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Canonical spaced form string, or `None` when the value cannot be repaired.
///
/// Accepted shapes are 15 single-space-separated `W`/`D`/`L` tokens (surrounding whitespace is
/// trimmed) and the same 15 letters with no separators at all.
pub fn canonical_form(value: &Value) -> Option<String> {
    let raw = value.as_str()?;

    let trimmed = raw.trim();
    let parts: Vec<&str> = trimmed.split(' ').collect();
    if parts.len() == FORM_LEN && parts.iter().all(|p| is_result_token(p)) {
        return Some(trimmed.to_string());
    }

    if raw.len() == FORM_LEN && raw.chars().all(is_result_char) {
        let mut spaced = String::with_capacity(FORM_LEN * 2 - 1);
        for (idx, ch) in raw.chars().enumerate() {
            if idx > 0 {
                spaced.push(' ');
            }
            spaced.push(ch);
        }
        return Some(spaced);
    }

    None
}

/// Canonical form string or the sentinel.
pub fn validate_form(value: &Value) -> String {
    canonical_form(value).unwrap_or_else(|| FORM_SENTINEL.to_string())
}

fn validate_form_reporting(
    value: &Value,
    team: &str,
    on_warn: &mut impl FnMut(String),
) -> String {
    match canonical_form(value) {
        Some(form) => form,
        None => {
            let shown = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            on_warn(format!(
                "[WARN] Invalid recent form for {team}: \"{shown}\". Using {FORM_SENTINEL}."
            ));
            FORM_SENTINEL.to_string()
        }
    }
}

fn is_result_token(token: &str) -> bool {
    matches!(token, "W" | "D" | "L")
}

fn is_result_char(ch: char) -> bool {
    matches!(ch, 'W' | 'D' | 'L')
}
