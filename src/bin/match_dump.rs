use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::Local;

use prono_terminal::feed::fetch_and_normalize;
use prono_terminal::match_source::{SourceConfig, parse_raw_matches_json};
use prono_terminal::model::DateTab;
use prono_terminal::normalize::normalize_matches_with;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let competition = arg_value(&args, "--competition");
    let tab = match arg_value(&args, "--tab") {
        Some(raw) => DateTab::parse(&raw).ok_or_else(|| anyhow!("unknown tab: {raw}"))?,
        None => DateTab::Today,
    };

    let matches = if let Some(path) = arg_value(&args, "--input").map(PathBuf::from) {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("failed reading {}", path.display()))?;
        let records = parse_raw_matches_json(&raw).context("payload rejected")?;
        normalize_matches_with(&records, |msg| eprintln!("{msg}"))
    } else {
        let config = SourceConfig::from_env();
        eprintln!("[INFO] Match source: {}", config.describe());
        let out = fetch_and_normalize(
            &config,
            competition.as_deref(),
            tab,
            Local::now().date_naive(),
        )
        .map_err(|err| anyhow!(err.user_message()))?;
        for msg in &out.warnings {
            eprintln!("{msg}");
        }
        out.matches
    };

    eprintln!("[INFO] {} matches normalized", matches.len());
    let json = serde_json::to_string_pretty(&matches).context("serialize matches")?;
    println!("{json}");
    Ok(())
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag
            && let Some(next) = args.get(idx + 1)
            && !next.trim().is_empty()
        {
            return Some(next.trim().to_string());
        }
    }
    None
}
