use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Canonical marker for a recent-form field with no usable data.
pub const FORM_SENTINEL: &str = "N/A";
/// Number of results carried by a canonical recent-form string.
pub const FORM_LEN: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: String,
    pub name: String,
    pub logo_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecentForm {
    pub home: String,
    pub away: String,
}

impl RecentForm {
    /// At least one side carries a real form string.
    pub fn has_data(&self) -> bool {
        self.home != FORM_SENTINEL || self.away != FORM_SENTINEL
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeProbabilities {
    pub home_win: u8,
    pub draw: u8,
    pub away_win: u8,
}

impl OutcomeProbabilities {
    pub const SYMMETRIC: Self = Self {
        home_win: 33,
        draw: 34,
        away_win: 33,
    };

    pub fn total(&self) -> u16 {
        self.home_win as u16 + self.draw as u16 + self.away_win as u16
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchStatus {
    Scheduled,
    InProgress,
    Finished,
    Cancelled,
    Postponed,
    /// Anything the source sent that is not one of the known labels (trimmed, as received).
    Unknown(String),
}

impl MatchStatus {
    pub fn parse(raw: &str) -> Self {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "scheduled" => Self::Scheduled,
            "inprogress" => Self::InProgress,
            "finished" => Self::Finished,
            "cancelled" | "canceled" => Self::Cancelled,
            "postponed" => Self::Postponed,
            _ => Self::Unknown(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::InProgress => "In Progress",
            Self::Finished => "Finished",
            Self::Cancelled => "Cancelled",
            Self::Postponed => "Postponed",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }

    /// Final states that belong in the past-results bucket regardless of date.
    pub fn is_settled(&self) -> bool {
        matches!(self, Self::Finished | Self::Cancelled | Self::Postponed)
    }
}

impl Serialize for MatchStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub league: String,
    pub round: String,
    pub date: String,
    #[serde(skip)]
    pub kickoff: Option<DateTime<Utc>>,
    pub status: MatchStatus,
    pub home_team: Team,
    pub away_team: Team,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub home_half_time_score: Option<u32>,
    pub away_half_time_score: Option<u32>,
    pub recent_form: RecentForm,
    pub outcome_probabilities: Option<OutcomeProbabilities>,
    pub details_error: Option<String>,
    pub competition_id: String,
    pub competition_name: String,
}

/// One record as supplied by the external match-data source.
///
/// Decoding is deliberately loose: only the team names and the date are required, scores that
/// are not usable numbers become `None`, and the recent-form fields keep whatever JSON value
/// arrived so the validator can decide what to do with it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMatch {
    #[serde(default, deserialize_with = "lenient_string")]
    pub league: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub round: String,
    pub date: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: String,
    pub home_team_name: String,
    pub away_team_name: String,
    #[serde(default, deserialize_with = "lenient_score")]
    pub home_score: Option<u32>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub away_score: Option<u32>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub home_half_time_score: Option<u32>,
    #[serde(default, deserialize_with = "lenient_score")]
    pub away_half_time_score: Option<u32>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub competition_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub competition_name: String,
    #[serde(default)]
    pub details_error: Option<String>,
    #[serde(default)]
    pub home_team_recent_form: Value,
    #[serde(default)]
    pub away_team_recent_form: Value,
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn lenient_score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(score_from_value(&value))
}

pub(crate) fn score_from_value(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).or_else(|| {
            n.as_f64()
                .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u32::MAX as f64)
                .map(|f| f as u32)
        }),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// Date context requested from the source and used for day bucketing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateTab {
    Today,
    Tomorrow,
    LastMatches,
}

impl DateTab {
    pub const ALL: [DateTab; 3] = [DateTab::Today, DateTab::Tomorrow, DateTab::LastMatches];

    pub fn label(self) -> &'static str {
        match self {
            DateTab::Today => "Today",
            DateTab::Tomorrow => "Tomorrow",
            DateTab::LastMatches => "Last matches",
        }
    }

    pub fn next(self) -> Self {
        match self {
            DateTab::Today => DateTab::Tomorrow,
            DateTab::Tomorrow => DateTab::LastMatches,
            DateTab::LastMatches => DateTab::Today,
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "today" => Some(DateTab::Today),
            "tomorrow" => Some(DateTab::Tomorrow),
            "last" | "last-matches" | "last_matches" => Some(DateTab::LastMatches),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Competition {
    pub id: &'static str,
    pub name: &'static str,
}

pub const ALL_COMPETITIONS_ID: &str = "all";

pub const COMPETITIONS: &[Competition] = &[
    Competition {
        id: ALL_COMPETITIONS_ID,
        name: "All competitions",
    },
    Competition {
        id: "premier-league",
        name: "Premier League",
    },
    Competition {
        id: "la-liga",
        name: "La Liga",
    },
    Competition {
        id: "serie-a",
        name: "Serie A",
    },
    Competition {
        id: "bundesliga",
        name: "Bundesliga",
    },
    Competition {
        id: "ligue-1",
        name: "Ligue 1",
    },
    Competition {
        id: "champions-league",
        name: "Champions League",
    },
    Competition {
        id: "europa-league",
        name: "Europa League",
    },
    Competition {
        id: "mls",
        name: "MLS",
    },
    Competition {
        id: "club-world-cup",
        name: "Club World Cup",
    },
];

impl Competition {
    pub fn is_all(&self) -> bool {
        self.id == ALL_COMPETITIONS_ID
    }

    /// Name to ask the source for; `None` means "any competition".
    pub fn source_name(&self) -> Option<&'static str> {
        if self.is_all() { None } else { Some(self.name) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_parse_is_forgiving_about_case_and_separators() {
        assert_eq!(MatchStatus::parse("Finished"), MatchStatus::Finished);
        assert_eq!(MatchStatus::parse(" in progress "), MatchStatus::InProgress);
        assert_eq!(MatchStatus::parse("IN_PROGRESS"), MatchStatus::InProgress);
        assert_eq!(MatchStatus::parse("canceled"), MatchStatus::Cancelled);
        assert_eq!(
            MatchStatus::parse(" Half Time "),
            MatchStatus::Unknown("Half Time".to_string())
        );
        assert!(!MatchStatus::parse("").is_known());
    }

    #[test]
    fn raw_match_decodes_loose_scores() {
        let raw: RawMatch = serde_json::from_value(json!({
            "date": "2025-05-01T18:00:00Z",
            "homeTeamName": "A",
            "awayTeamName": "B",
            "homeScore": "2",
            "awayScore": 1.0,
            "homeHalfTimeScore": -1,
            "awayHalfTimeScore": "n/a",
            "league": null,
            "homeTeamRecentForm": 42
        }))
        .expect("loose record should decode");
        assert_eq!(raw.home_score, Some(2));
        assert_eq!(raw.away_score, Some(1));
        assert_eq!(raw.home_half_time_score, None);
        assert_eq!(raw.away_half_time_score, None);
        assert_eq!(raw.league, "");
        assert_eq!(raw.home_team_recent_form, json!(42));
        assert_eq!(raw.away_team_recent_form, Value::Null);
    }

    #[test]
    fn raw_match_requires_team_names() {
        let res = serde_json::from_value::<RawMatch>(json!({
            "date": "2025-05-01",
            "homeTeamName": "A"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn tab_cycle_wraps() {
        assert_eq!(DateTab::LastMatches.next(), DateTab::Today);
        assert_eq!(DateTab::parse("LAST"), Some(DateTab::LastMatches));
    }
}
