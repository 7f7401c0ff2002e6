use std::collections::VecDeque;

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, TimeZone};

use crate::model::{ALL_COMPETITIONS_ID, COMPETITIONS, Competition, DateTab, Match, MatchStatus};

const MAX_LOGS: usize = 200;

#[derive(Debug)]
pub enum Delta {
    SetMatches { generation: u64, matches: Vec<Match> },
    FetchFailed { generation: u64, error: String },
    Log(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    FetchMatches {
        generation: u64,
        /// `None` asks for every competition.
        competition: Option<String>,
        tab: DateTab,
    },
}

pub struct AppState {
    pub tab: DateTab,
    /// Index into [`COMPETITIONS`]; `None` until the user picks one.
    pub competition: Option<usize>,
    /// Bumped on every filter change; only results tagged with the current value are applied.
    pub generation: u64,
    pub matches: Vec<Match>,
    pub loading: bool,
    pub error: Option<String>,
    /// Set once at startup when the source cannot be used; blocks every fetch.
    pub config_error: Option<String>,
    pub selected: usize,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            tab: DateTab::Today,
            competition: None,
            generation: 0,
            matches: Vec::with_capacity(16),
            loading: false,
            error: None,
            config_error: None,
            selected: 0,
            logs: VecDeque::with_capacity(MAX_LOGS),
            help_overlay: false,
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn selected_competition(&self) -> Option<&'static Competition> {
        self.competition.and_then(|idx| COMPETITIONS.get(idx))
    }

    pub fn set_config_error(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        self.push_log(format!("[ERROR] {msg}"));
        self.config_error = Some(msg.clone());
        self.error = Some(msg);
        self.matches.clear();
        self.loading = false;
    }

    pub fn set_tab(&mut self, tab: DateTab) -> Option<ProviderCommand> {
        self.tab = tab;
        self.begin_pass()
    }

    pub fn cycle_tab(&mut self) -> Option<ProviderCommand> {
        self.set_tab(self.tab.next())
    }

    pub fn select_competition(&mut self, idx: Option<usize>) -> Option<ProviderCommand> {
        self.competition = idx.filter(|i| *i < COMPETITIONS.len());
        self.begin_pass()
    }

    /// Steps through "none selected" followed by every catalogue entry.
    pub fn cycle_competition(&mut self, forward: bool) -> Option<ProviderCommand> {
        let slots = COMPETITIONS.len() + 1;
        let current = self.competition.map(|i| i + 1).unwrap_or(0);
        let next = if forward {
            (current + 1) % slots
        } else {
            (current + slots - 1) % slots
        };
        self.select_competition(next.checked_sub(1))
    }

    pub fn refresh(&mut self) -> Option<ProviderCommand> {
        self.begin_pass()
    }

    /// Starts a new pass for the current filters, superseding anything in flight.
    ///
    /// Returns the command to send, or `None` when nothing should be fetched.
    pub fn begin_pass(&mut self) -> Option<ProviderCommand> {
        self.generation = self.generation.wrapping_add(1);
        self.selected = 0;

        if let Some(msg) = self.config_error.clone() {
            self.error = Some(msg);
            self.matches.clear();
            self.loading = false;
            return None;
        }

        let Some(competition) = self.selected_competition() else {
            self.matches.clear();
            self.error = None;
            self.loading = false;
            return None;
        };

        self.loading = true;
        self.error = None;
        Some(ProviderCommand::FetchMatches {
            generation: self.generation,
            competition: competition.source_name().map(str::to_string),
            tab: self.tab,
        })
    }

    /// Visible rows in display order: grouped by competition, so `selected` indexes what is drawn.
    pub fn visible<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Vec<&Match> {
        let rows = visible_matches(
            &self.matches,
            self.tab,
            self.selected_competition().map(|c| c.id),
            now,
        );
        group_by_competition(&rows)
            .into_iter()
            .flat_map(|(_, items)| items)
            .collect()
    }

    pub fn selected_match<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Option<&Match> {
        let rows = self.visible(now);
        rows.get(self.selected).copied()
    }

    pub fn select_next(&mut self, visible_len: usize) {
        if visible_len == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1).min(visible_len - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetMatches {
            generation,
            matches,
        } => {
            if generation != state.generation {
                state.push_log(format!(
                    "[INFO] Discarded stale result (pass {generation}, current {})",
                    state.generation
                ));
                return;
            }
            state.matches = matches;
            state.loading = false;
            state.error = None;
            state.selected = 0;
        }
        Delta::FetchFailed { generation, error } => {
            if generation != state.generation {
                return;
            }
            state.matches.clear();
            state.loading = false;
            state.error = Some(error);
            state.selected = 0;
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}

/// Matches shown for a tab, filtered to `competition_id` unless it is absent or "all".
///
/// Calendar days are compared in `now`'s time zone. Today/Tomorrow keep source order;
/// Last matches keeps past-dated settled or never-played fixtures, newest first. Records
/// without a parseable date never appear in a day bucket.
pub fn visible_matches<'a, Tz: TimeZone>(
    matches: &'a [Match],
    tab: DateTab,
    competition_id: Option<&str>,
    now: &DateTime<Tz>,
) -> Vec<&'a Match> {
    let tz = now.timezone();
    let today = now.date_naive();
    let local_day = |m: &Match| -> Option<NaiveDate> {
        m.kickoff.map(|k| k.with_timezone(&tz).date_naive())
    };

    let mut out: Vec<&Match> = match tab {
        DateTab::Today => matches
            .iter()
            .filter(|m| local_day(*m) == Some(today))
            .collect(),
        DateTab::Tomorrow => {
            let tomorrow = today + ChronoDuration::days(1);
            matches
                .iter()
                .filter(|m| local_day(*m) == Some(tomorrow))
                .collect()
        }
        DateTab::LastMatches => {
            let mut past: Vec<&Match> = matches
                .iter()
                .filter(|m| {
                    local_day(*m).is_some_and(|d| d < today)
                        && (m.status.is_settled() || m.status == MatchStatus::Scheduled)
                })
                .collect();
            past.sort_by(|a, b| b.kickoff.cmp(&a.kickoff));
            past
        }
    };

    if let Some(id) = competition_id.filter(|id| *id != ALL_COMPETITIONS_ID) {
        out.retain(|m| m.competition_id == id);
    }
    out
}

/// Groups consecutive rows by competition name, keeping first-seen order.
pub fn group_by_competition<'a>(rows: &[&'a Match]) -> Vec<(String, Vec<&'a Match>)> {
    let mut groups: Vec<(String, Vec<&'a Match>)> = Vec::new();
    for &m in rows {
        match groups
            .iter_mut()
            .find(|(name, _)| *name == m.competition_name)
        {
            Some((_, items)) => items.push(m),
            None => groups.push((m.competition_name.clone(), vec![m])),
        }
    }
    groups
}
