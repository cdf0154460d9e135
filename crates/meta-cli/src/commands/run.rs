//! The `run` command: compare → merge → package with a gate between
//! phases. Declining a gate aborts cleanly, leaving already-written
//! outputs in place.

use std::fs;
use std::path::Path;

use colored::Colorize;
use meta_config::Config;
use meta_merge::MergeOptions;

use crate::commands::{self, diff, merge, package};
use crate::error::Result;
use crate::interactive;

pub fn run_pipeline(
    config: &Config,
    source: &Path,
    target: &Path,
    out: &Path,
    api_version: &str,
) -> Result<()> {
    fs::create_dir_all(out)?;
    let log_path = out.join("diff.csv");

    let meta = interactive::complete_row_meta(
        None,
        None,
        None,
        None,
        commands::request_timestamp(),
    )?;
    let summary = diff::run_diff(
        config,
        source,
        &[target.to_path_buf()],
        &log_path,
        None,
        &meta,
        false,
    )?;
    if summary.rows == 0 {
        println!("{} branches are identical", "run".green().bold());
        return Ok(());
    }

    if !interactive::confirm_phase("Merge these changes into the target?")? {
        println!("{} stopped after diff; log kept", "run".yellow().bold());
        return Ok(());
    }
    merge::run_merge(
        config,
        &log_path,
        source,
        target,
        MergeOptions::default(),
        true, // the phase gate above already confirmed
        false,
    )?;

    if !interactive::confirm_phase("Assemble a deployment package?")? {
        println!("{} stopped after merge", "run".yellow().bold());
        return Ok(());
    }
    package::run_package(&log_path, source, &out.join("package"), api_version)?;
    Ok(())
}
