use prono_terminal::model::{FORM_SENTINEL, RawMatch};
use prono_terminal::normalize::{normalize_matches, normalize_matches_with};
use serde_json::json;

fn record(home: &str, away: &str) -> RawMatch {
    RawMatch {
        league: "Bundesliga".to_string(),
        round: "Matchday 31".to_string(),
        date: "2025-05-03T13:30:00Z".to_string(),
        status: "Scheduled".to_string(),
        home_team_name: home.to_string(),
        away_team_name: away.to_string(),
        competition_id: "bl1".to_string(),
        competition_name: "Bundesliga".to_string(),
        home_team_recent_form: json!("WWWWWWWWWWWWWWW"),
        away_team_recent_form: json!("D D D D D D D D D D D D D D D"),
        ..RawMatch::default()
    }
}

#[test]
fn empty_batch_normalizes_to_empty() {
    assert!(normalize_matches(&[]).is_empty());
}

#[test]
fn compact_form_is_spaced_out() {
    let out = normalize_matches(&[record("Bayern München", "Borussia Dortmund")]);
    assert_eq!(out[0].recent_form.home, "W W W W W W W W W W W W W W W");
    assert_eq!(out[0].recent_form.away, "D D D D D D D D D D D D D D D");
    assert!(out[0].recent_form.has_data());
}

#[test]
fn competition_id_comes_from_name() {
    let out = normalize_matches(&[record("Bayern München", "Borussia Dortmund")]);
    assert_eq!(out[0].competition_id, "bundesliga");
    assert_eq!(out[0].home_team.id, "bayern-mnchen");
}

#[test]
fn rematches_get_distinct_ids() {
    let out = normalize_matches(&[
        record("Mainz 05", "Union Berlin"),
        record("Mainz 05", "Union Berlin"),
    ]);
    assert_eq!(out.len(), 2);
    assert_ne!(out[0].id, out[1].id);
    assert!(out[0].id.starts_with("mainz-05-vs-union-berlin-"));
}

#[test]
fn bad_forms_fall_back_with_warning() {
    let mut bad = record("Freiburg", "Hoffenheim");
    bad.home_team_recent_form = json!("W W W");
    bad.away_team_recent_form = json!(["W", "D"]);
    let mut warnings = Vec::new();
    let out = normalize_matches_with(&[bad], |msg| warnings.push(msg));

    assert_eq!(out[0].recent_form.home, FORM_SENTINEL);
    assert_eq!(out[0].recent_form.away, FORM_SENTINEL);
    assert!(!out[0].recent_form.has_data());
    let p = out[0].outcome_probabilities.expect("computed");
    assert_eq!(p.total(), 100);
    assert_eq!((p.home_win, p.draw, p.away_win), (33, 34, 33));
    assert_eq!(warnings.len(), 2);
    assert!(warnings[0].contains("Freiburg"));
}

#[test]
fn probabilities_always_sum_to_hundred() {
    let forms = [
        json!("W D L W W L D D W L W W L D W"),
        json!("LLLLLLLLLLLLLLL"),
        json!("DDDDDDDDDDDDDDD"),
        json!("WWWWWWWWWWWWWWW"),
        json!(null),
    ];
    for home in &forms {
        for away in &forms {
            let mut r = record("X", "Y");
            r.home_team_recent_form = home.clone();
            r.away_team_recent_form = away.clone();
            let p = normalize_matches(&[r])[0]
                .outcome_probabilities
                .expect("computed");
            assert_eq!(p.total(), 100, "{home} vs {away}");
        }
    }
}
