use crate::model::{FORM_LEN, FORM_SENTINEL, OutcomeProbabilities};

/// Fixed share of the outcome space reserved for the draw before rounding.
pub const DRAW_BASE: f64 = 0.28;

// The last five results (indices 10..15) count double.
const RECENT_FROM: usize = 10;
const RECENT_WEIGHT: u32 = 2;

const HOME: usize = 0;
const DRAW: usize = 1;
const AWAY: usize = 2;

/// Three-way outcome estimate from two canonical recent-form strings.
///
/// Total and deterministic: any pair of inputs yields percentages summing to exactly 100.
/// Swapping the inputs swaps `home_win` and `away_win` and leaves `draw` untouched.
pub fn estimate(home_form: &str, away_form: &str) -> OutcomeProbabilities {
    let score_home = strength_score(home_form);
    let score_away = strength_score(away_form);

    let Some(markets) = outcome_markets(score_home, score_away) else {
        return OutcomeProbabilities::SYMMETRIC;
    };

    match to_percentages(markets, DRAW) {
        Some(pct) => OutcomeProbabilities {
            home_win: pct[HOME],
            draw: pct[DRAW],
            away_win: pct[AWAY],
        },
        None => OutcomeProbabilities::SYMMETRIC,
    }
}

/// Weighted points total for a form string (W=3, D=1, L=0). Max 60.
///
/// Anything that is not exactly 15 space-separated tokens scores 0, as does the sentinel.
pub fn strength_score(form: &str) -> u32 {
    if form == FORM_SENTINEL {
        return 0;
    }
    let results: Vec<&str> = form.split(' ').collect();
    if results.len() != FORM_LEN {
        return 0;
    }

    results
        .iter()
        .enumerate()
        .map(|(idx, result)| {
            let points = match *result {
                "W" => 3,
                "D" => 1,
                _ => 0,
            };
            let weight = if idx >= RECENT_FROM { RECENT_WEIGHT } else { 1 };
            points * weight
        })
        .sum()
}

/// Home/draw/away fractions summing to 1, or `None` when neither side has any strength.
fn outcome_markets(score_home: u32, score_away: u32) -> Option<[f64; 3]> {
    if score_home == 0 && score_away == 0 {
        return None;
    }

    let decisive = 1.0 - DRAW_BASE;
    let total = score_home.saturating_add(score_away);
    let (home, away) = if total > 0 {
        (
            (score_home as f64 / total as f64) * decisive,
            (score_away as f64 / total as f64) * decisive,
        )
    } else {
        match (score_home > 0, score_away > 0) {
            (true, true) => (decisive / 2.0, decisive / 2.0),
            (true, false) => (decisive, 0.0),
            (false, true) => (0.0, decisive),
            (false, false) => return None,
        }
    };

    Some([home, DRAW_BASE, away])
}

/// Converts three non-negative fractions into integer percentages summing to exactly 100.
///
/// Each component is rounded to the nearest integer and all rounding slack lands on
/// `absorber`. If that pushes the absorber below zero it is clamped and the other two are
/// rescaled. Returns `None` when nothing sensible is left (everything rounded to zero, or the
/// rescale cannot be absorbed).
pub fn to_percentages(values: [f64; 3], absorber: usize) -> Option<[u8; 3]> {
    if absorber >= values.len() {
        return None;
    }

    let mut pct = values.map(|v| (v.max(0.0) * 100.0).round() as i32);
    let diff = 100 - pct.iter().sum::<i32>();
    pct[absorber] += diff;

    for p in &mut pct {
        if *p < 0 {
            *p = 0;
        }
    }

    let total: i32 = pct.iter().sum();
    if total == 0 {
        return None;
    }
    if total != 100 {
        let scale = 100.0 / total as f64;
        let mut others = 0;
        for (idx, p) in pct.iter_mut().enumerate() {
            if idx != absorber {
                *p = (*p as f64 * scale).round() as i32;
                others += *p;
            }
        }
        pct[absorber] = 100 - others;
        if pct[absorber] < 0 {
            return None;
        }
    }

    let mut out = [0u8; 3];
    for (slot, p) in out.iter_mut().zip(pct) {
        *slot = u8::try_from(p).ok()?;
    }
    Some(out)
}
