use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::thread;

use chrono::{Local, NaiveDate};

use crate::match_source::{self, SourceConfig, SourceError};
use crate::model::{DateTab, Match};
use crate::normalize::normalize_matches_with;
use crate::state::{Delta, ProviderCommand};

/// Result of one fetch-and-normalize pass.
#[derive(Debug, Clone)]
pub struct PassOutput {
    pub matches: Vec<Match>,
    pub warnings: Vec<String>,
}

/// Fetches raw records and normalizes them. A source failure skips normalization entirely.
pub fn fetch_and_normalize(
    config: &SourceConfig,
    competition: Option<&str>,
    tab: DateTab,
    today: NaiveDate,
) -> Result<PassOutput, SourceError> {
    let raw = match_source::fetch_raw_matches(config, competition, tab, today)?;
    let mut warnings = Vec::new();
    let matches = normalize_matches_with(&raw, |msg| warnings.push(msg));
    Ok(PassOutput { matches, warnings })
}

pub fn spawn_provider(config: SourceConfig, tx: Sender<Delta>, cmd_rx: Receiver<ProviderCommand>) {
    thread::spawn(move || {
        let config = Arc::new(config);
        let pool = build_fetch_pool(config.parallelism);

        for cmd in cmd_rx {
            match cmd {
                ProviderCommand::FetchMatches {
                    generation,
                    competition,
                    tab,
                } => {
                    let tx = tx.clone();
                    let config = config.clone();
                    let job = move || run_pass(&config, generation, competition.as_deref(), tab, &tx);

                    if let Some(pool) = pool.as_ref() {
                        pool.spawn(job);
                    } else {
                        thread::spawn(job);
                    }
                }
            }
        }
    });
}

fn run_pass(
    config: &SourceConfig,
    generation: u64,
    competition: Option<&str>,
    tab: DateTab,
    tx: &Sender<Delta>,
) {
    let today = Local::now().date_naive();
    let label = competition.unwrap_or("all competitions");
    match fetch_and_normalize(config, competition, tab, today) {
        Ok(out) => {
            for msg in out.warnings {
                let _ = tx.send(Delta::Log(msg));
            }
            let _ = tx.send(Delta::Log(format!(
                "[INFO] {} matches for {label} ({})",
                out.matches.len(),
                tab.label()
            )));
            let _ = tx.send(Delta::SetMatches {
                generation,
                matches: out.matches,
            });
        }
        Err(err) => {
            let level = if err.is_rate_limit() { "WARN" } else { "ERROR" };
            let _ = tx.send(Delta::Log(format!("[{level}] Match fetch failed: {err}")));
            let _ = tx.send(Delta::FetchFailed {
                generation,
                error: err.user_message(),
            });
        }
    }
}

fn build_fetch_pool(threads: usize) -> Option<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .build()
        .ok()
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;
    use std::time::Duration;

    use super::*;
    use crate::match_source::{KeyStatus, SourceKind};

    #[test]
    fn fake_pass_normalizes_every_record() {
        let today = NaiveDate::from_ymd_opt(2025, 5, 1).expect("valid date");
        let out = fetch_and_normalize(&SourceConfig::fake(), Some("Ligue 1"), DateTab::Today, today)
            .expect("fake source never fails");
        assert!((5..=7).contains(&out.matches.len()));
        for m in &out.matches {
            assert_eq!(m.competition_id, "ligue-1");
            let p = m.outcome_probabilities.expect("always computed");
            assert_eq!(p.total(), 100);
        }
    }

    #[test]
    fn config_error_skips_the_pass() {
        let mut cfg = SourceConfig::fake();
        cfg.kind = SourceKind::Gemini;
        cfg.key = KeyStatus::Placeholder;
        let today = NaiveDate::from_ymd_opt(2025, 5, 1).expect("valid date");
        let err = fetch_and_normalize(&cfg, None, DateTab::Today, today).expect_err("no key");
        assert!(err.is_config());
    }

    #[test]
    fn provider_tags_results_with_generation() {
        let (tx, rx) = mpsc::channel();
        let (cmd_tx, cmd_rx) = mpsc::channel();
        spawn_provider(SourceConfig::fake(), tx, cmd_rx);
        cmd_tx
            .send(ProviderCommand::FetchMatches {
                generation: 42,
                competition: Some("MLS".to_string()),
                tab: DateTab::Tomorrow,
            })
            .expect("provider alive");

        loop {
            match rx.recv_timeout(Duration::from_secs(10)).expect("provider answers") {
                Delta::SetMatches {
                    generation,
                    matches,
                } => {
                    assert_eq!(generation, 42);
                    assert!(!matches.is_empty());
                    break;
                }
                Delta::FetchFailed { error, .. } => panic!("unexpected failure: {error}"),
                Delta::Log(_) => continue,
            }
        }
    }
}
