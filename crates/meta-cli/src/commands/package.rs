//! The `package` command: assemble a deployment package from a diff log.
//!
//! Every row that creates or changes content adds its artifact to the
//! package manifest and copies the (post-merge) source file into the
//! package tree. `Delete File` rows feed the destructive manifest
//! instead, which is written from its own member map.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use colored::Colorize;
use meta_diff::{read_diff_log, MergeAction};
use tracing::warn;

use crate::error::Result;
use crate::manifest::{add_member, manifest_xml, Members};

pub fn run_package(log_path: &Path, source: &Path, out: &Path, api_version: &str) -> Result<()> {
    let rows = read_diff_log(log_path)?;

    let mut package = Members::new();
    let mut destructive = Members::new();
    let mut to_copy: BTreeSet<String> = BTreeSet::new();

    for row in &rows {
        match &row.action {
            MergeAction::DeleteFile => add_member(&mut destructive, &row.metadata),
            MergeAction::CreateFile
            | MergeAction::UpdateFile
            | MergeAction::CreateItem
            | MergeAction::UpdateItem
            | MergeAction::DeleteItem => {
                add_member(&mut package, &row.metadata);
                to_copy.insert(row.path.clone());
            }
            MergeAction::Unknown(other) => {
                warn!(path = %row.path, action = %other, "skipping unknown action");
            }
        }
    }

    fs::create_dir_all(out)?;
    let mut copied = 0usize;
    for path in &to_copy {
        let from = source.join(path);
        if !from.is_file() {
            warn!(path = %path, "changed artifact missing in source branch");
            continue;
        }
        let to = out.join(path);
        if let Some(parent) = to.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(&from, &to)?;
        copied += 1;
    }

    fs::write(out.join("package.xml"), manifest_xml(&package, api_version))?;
    if !destructive.is_empty() {
        fs::write(
            out.join("destructiveChanges.xml"),
            manifest_xml(&destructive, api_version),
        )?;
    }

    println!(
        "{} {} artifact(s) copied, {} type(s) in package.xml{}",
        "package".green().bold(),
        copied,
        package.len(),
        if destructive.is_empty() {
            String::new()
        } else {
            format!(", {} destructive type(s)", destructive.len())
        }
    );
    Ok(())
}
