//! The `merge` command: apply a diff log to a target branch.

use std::path::Path;

use chrono::Utc;
use colored::Colorize;
use meta_config::Config;
use meta_diff::read_diff_log;
use meta_merge::{MergeLog, MergeOptions, MergeReport, Merger};

use crate::error::{CliError, Result};
use crate::interactive;

pub fn run_merge(
    config: &Config,
    log_path: &Path,
    source: &Path,
    target: &Path,
    options: MergeOptions,
    yes: bool,
    json: bool,
) -> Result<MergeReport> {
    let rows = read_diff_log(log_path)?;
    if rows.is_empty() {
        println!("{} nothing to merge", "merge".green().bold());
        return Ok(MergeReport {
            started_at: Utc::now(),
            success: true,
            files: Vec::new(),
        });
    }

    if !yes {
        let prompt = format!(
            "Apply {} row(s) from {} to {}?",
            rows.len(),
            log_path.display(),
            target.display()
        );
        if !interactive::confirm_phase(&prompt)? {
            return Err(CliError::user("Merge cancelled by user."));
        }
    }

    let log = MergeLog::group(rows);
    let mut merger = Merger::new(config, source, target, options);
    let report = merger.apply(&log)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(report);
    }

    let status = if report.success {
        "merge".green().bold()
    } else {
        "merge".red().bold()
    };
    println!(
        "{status} {} row(s) applied across {} file(s)",
        report.applied(),
        report.files.len()
    );
    for file in &report.files {
        for note in &file.notes {
            println!("  {} {note}", "note".dimmed());
        }
        for error in &file.errors {
            println!("  {} {error}", "error".red().bold());
        }
    }
    Ok(report)
}
