use chrono::{FixedOffset, TimeZone, Utc};

use prono_terminal::model::{DateTab, Match, MatchStatus, RawMatch};
use prono_terminal::normalize::normalize_matches;
use prono_terminal::state::{group_by_competition, visible_matches};

fn raw(home: &str, away: &str, date: &str, status: &str, competition: &str) -> RawMatch {
    RawMatch {
        date: date.to_string(),
        status: status.to_string(),
        home_team_name: home.to_string(),
        away_team_name: away.to_string(),
        competition_name: competition.to_string(),
        ..RawMatch::default()
    }
}

fn fixture() -> Vec<Match> {
    normalize_matches(&[
        raw("A", "B", "2025-05-01T12:00:00Z", "Scheduled", "Premier League"),
        raw("C", "D", "2025-05-01T20:00:00Z", "In Progress", "La Liga"),
        raw("E", "F", "2025-05-02T15:00:00Z", "Scheduled", "Premier League"),
        raw("G", "H", "2025-04-29T15:00:00Z", "Finished", "Premier League"),
        raw("I", "J", "2025-04-30T15:00:00Z", "Postponed", "La Liga"),
        raw("K", "L", "2025-04-28T15:00:00Z", "In Progress", "Premier League"),
        raw("M", "N", "2025-04-27T15:00:00Z", "Scheduled", "Serie A"),
        raw("O", "P", "sometime soon", "Scheduled", "Premier League"),
    ])
}

fn names(rows: &[&Match]) -> Vec<String> {
    rows.iter().map(|m| m.home_team.name.clone()).collect()
}

#[test]
fn today_and_tomorrow_keep_source_order() {
    let matches = fixture();
    let now = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();

    let today = visible_matches(&matches, DateTab::Today, None, &now);
    assert_eq!(names(&today), ["A", "C"]);

    let tomorrow = visible_matches(&matches, DateTab::Tomorrow, None, &now);
    assert_eq!(names(&tomorrow), ["E"]);
}

#[test]
fn last_matches_are_settled_or_unplayed_newest_first() {
    let matches = fixture();
    let now = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();

    let last = visible_matches(&matches, DateTab::LastMatches, None, &now);
    assert_eq!(names(&last), ["I", "G", "M"]);
    assert!(last.iter().all(|m| m.status != MatchStatus::InProgress));
}

#[test]
fn day_buckets_follow_local_calendar() {
    let matches = fixture();
    // 01:00 on May 2nd at UTC+5 is still May 1st in UTC.
    let tz = FixedOffset::east_opt(5 * 3600).unwrap();
    let now = tz.with_ymd_and_hms(2025, 5, 2, 1, 0, 0).unwrap();

    let today = visible_matches(&matches, DateTab::Today, None, &now);
    assert_eq!(names(&today), ["C", "E"]);
    let last = visible_matches(&matches, DateTab::LastMatches, None, &now);
    assert_eq!(names(&last), ["A", "I", "G", "M"]);
}

#[test]
fn undated_records_never_appear() {
    let matches = fixture();
    let now = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    for tab in DateTab::ALL {
        let rows = visible_matches(&matches, tab, None, &now);
        assert!(rows.iter().all(|m| m.home_team.name != "O"), "{tab:?}");
    }
}

#[test]
fn competition_filter_uses_derived_id() {
    let matches = fixture();
    let now = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();

    let rows = visible_matches(&matches, DateTab::Today, Some("la-liga"), &now);
    assert_eq!(names(&rows), ["C"]);
    let rows = visible_matches(&matches, DateTab::Today, Some("all"), &now);
    assert_eq!(names(&rows), ["A", "C"]);
    let rows = visible_matches(&matches, DateTab::Today, Some("bundesliga"), &now);
    assert!(rows.is_empty());
}

#[test]
fn groups_keep_first_seen_order() {
    let matches = fixture();
    let now = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();
    let rows = visible_matches(&matches, DateTab::LastMatches, None, &now);
    let groups = group_by_competition(&rows);
    let labels: Vec<(&str, usize)> = groups
        .iter()
        .map(|(name, items)| (name.as_str(), items.len()))
        .collect();
    assert_eq!(labels, [("La Liga", 1), ("Premier League", 1), ("Serie A", 1)]);
}

#[test]
fn selection_follows_grouped_display_order() {
    use prono_terminal::model::COMPETITIONS;
    use prono_terminal::state::{AppState, Delta, apply_delta};

    let mut state = AppState::new();
    let all = COMPETITIONS
        .iter()
        .position(|c| c.is_all())
        .expect("catalogue has an all entry");
    state.select_competition(Some(all));
    let generation = state.generation;
    apply_delta(
        &mut state,
        Delta::SetMatches {
            generation,
            matches: normalize_matches(&[
                raw("A", "B", "2025-05-01T12:00:00Z", "Scheduled", "Premier League"),
                raw("C", "D", "2025-05-01T13:00:00Z", "Scheduled", "La Liga"),
                raw("E", "F", "2025-05-01T14:00:00Z", "Scheduled", "Premier League"),
            ]),
        },
    );
    let now = Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap();

    let rows = state.visible(&now);
    assert_eq!(names(&rows), ["A", "E", "C"]);
    let len = rows.len();

    let mut picked = Vec::new();
    for _ in 0..len {
        picked.push(
            state
                .selected_match(&now)
                .map(|m| m.home_team.name.clone())
                .expect("row selected"),
        );
        state.select_next(len);
    }
    assert_eq!(picked, ["A", "E", "C"]);
}
