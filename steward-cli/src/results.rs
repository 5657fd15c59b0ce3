//! Timestamped JSON result files for `--save-results`.

use anyhow::{Context, Result};
use chrono::Local;
use roster_engine::{Outcome, Summary};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct ResultsFile<'a> {
    generated_at: String,
    summary: &'a Summary,
    outcomes: &'a [Outcome],
}

/// Write outcomes and the summary to `results_YYYYMMDD_HHMMSS.json` in
/// `dir`, returning the path written.
pub fn save_results(dir: &Path, outcomes: &[Outcome], summary: &Summary) -> Result<PathBuf> {
    let stamp = Local::now().format("%Y%m%d_%H%M%S");
    let path = dir.join(format!("results_{stamp}.json"));

    let payload = ResultsFile {
        generated_at: Local::now().to_rfc3339(),
        summary,
        outcomes,
    };
    let rendered =
        serde_json::to_string_pretty(&payload).context("could not serialize results")?;
    fs::write(&path, rendered)
        .with_context(|| format!("could not write results file {}", path.display()))?;
    Ok(path)
}
