//! The merge driver: applies a grouped diff log to a target branch.
//!
//! File-level rows copy or remove whole files; item-level rows are bound
//! into an action tree and spliced in by re-parsing the target file, then
//! reconstructing it in place. Per-row problems (missing targets, unknown
//! actions) land in the change log; only reconstruction swap failures
//! abort the run.

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use meta_config::Config;
use meta_diff::{DiffRow, MergeAction};
use meta_tree::{ActionNode, Context};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::log::MergeLog;

/// Options for a merge run.
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Simulate only: no file is copied, removed, or rewritten. Actions
    /// are prefixed with "[dry-run] Would ..." in the change log.
    pub dry_run: bool,
}

/// Change log for one target file.
#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub path: String,
    /// Rows whose action was applied (or would be, in a dry run).
    pub applied: usize,
    /// Rows skipped because the file was already updated this run.
    pub skipped: usize,
    pub notes: Vec<String>,
    pub errors: Vec<String>,
}

impl FileOutcome {
    fn new(path: &str) -> Self {
        Self {
            path: path.to_string(),
            applied: 0,
            skipped: 0,
            notes: Vec::new(),
            errors: Vec::new(),
        }
    }
}

/// The complete change log of one merge run.
#[derive(Debug, Clone, Serialize)]
pub struct MergeReport {
    pub started_at: DateTime<Utc>,
    pub success: bool,
    pub files: Vec<FileOutcome>,
}

impl MergeReport {
    pub fn applied(&self) -> usize {
        self.files.iter().map(|f| f.applied).sum()
    }

    pub fn error_count(&self) -> usize {
        self.files.iter().map(|f| f.errors.len()).sum()
    }
}

/// Applies diff logs against one target branch.
pub struct Merger<'cfg> {
    config: &'cfg Config,
    source_root: PathBuf,
    target_root: PathBuf,
    options: MergeOptions,
    /// Files wholly refreshed this run; later rows on them are redundant.
    updated: BTreeSet<String>,
}

impl<'cfg> Merger<'cfg> {
    pub fn new(
        config: &'cfg Config,
        source_root: impl Into<PathBuf>,
        target_root: impl Into<PathBuf>,
        options: MergeOptions,
    ) -> Self {
        Self {
            config,
            source_root: source_root.into(),
            target_root: target_root.into(),
            options,
            updated: BTreeSet::new(),
        }
    }

    /// Apply every request of the log, oldest first per file.
    ///
    /// # Errors
    ///
    /// Only unrecoverable I/O during reconstruction aborts; everything
    /// else is collected into the returned report.
    pub fn apply(&mut self, log: &MergeLog) -> Result<MergeReport> {
        let started_at = Utc::now();
        let mut files = Vec::new();

        for (path, by_timestamp) in &log.files {
            let mut outcome = FileOutcome::new(path);
            for (timestamp, rows) in by_timestamp {
                debug!(path, timestamp, rows = rows.len(), "applying request");
                self.apply_request(path, rows, &mut outcome)?;
            }
            files.push(outcome);
        }

        let success = files.iter().all(|f| f.errors.is_empty());
        Ok(MergeReport {
            started_at,
            success,
            files,
        })
    }

    fn apply_request(
        &mut self,
        path: &str,
        rows: &[DiffRow],
        outcome: &mut FileOutcome,
    ) -> Result<()> {
        let mut actions = ActionNode::default();
        let mut item_rows = 0;

        for row in rows {
            if self.updated.contains(path) {
                outcome.skipped += 1;
                outcome
                    .notes
                    .push(format!("{path}: {} skipped, already updated", row.action));
                continue;
            }
            match &row.action {
                MergeAction::CreateFile | MergeAction::UpdateFile => {
                    self.copy_file(path, outcome);
                }
                MergeAction::DeleteFile => {
                    self.delete_file(path, outcome);
                }
                MergeAction::CreateItem => {
                    actions.insert_create(&row.levels(), payload(&row.new_value));
                    item_rows += 1;
                }
                MergeAction::UpdateItem => {
                    actions.insert_change(&row.levels(), payload(&row.new_value));
                    item_rows += 1;
                }
                MergeAction::DeleteItem => {
                    actions.insert_delete(&row.levels());
                    item_rows += 1;
                }
                MergeAction::Unknown(other) => {
                    outcome
                        .errors
                        .push(format!("{path}: unknown merge action `{other}`"));
                }
            }
        }

        if item_rows > 0 {
            self.apply_items(path, actions, item_rows, outcome)?;
        }
        Ok(())
    }

    /// Copy the file from the source branch, creating parents. Marks the
    /// path updated so later rows skip with a note.
    fn copy_file(&mut self, path: &str, outcome: &mut FileOutcome) {
        let from = self.source_root.join(path);
        let to = self.target_root.join(path);
        if !from.is_file() {
            outcome
                .errors
                .push(format!("{path}: source file missing at {}", from.display()));
            return;
        }
        if self.options.dry_run {
            outcome
                .notes
                .push(format!("[dry-run] Would copy {path} into target"));
            outcome.applied += 1;
            self.updated.insert(path.to_string());
            return;
        }
        let copied = to
            .parent()
            .map(fs::create_dir_all)
            .transpose()
            .and_then(|_| fs::copy(&from, &to));
        match copied {
            Ok(_) => {
                outcome.applied += 1;
                self.updated.insert(path.to_string());
            }
            Err(e) => outcome.errors.push(format!("{path}: copy failed: {e}")),
        }
    }

    /// Remove the file from the target branch; a missing target is only a
    /// warning.
    fn delete_file(&mut self, path: &str, outcome: &mut FileOutcome) {
        let target = self.target_root.join(path);
        if !target.exists() {
            warn!(path, "delete target already absent");
            outcome
                .notes
                .push(format!("{path}: delete target already absent"));
            self.updated.insert(path.to_string());
            return;
        }
        if self.options.dry_run {
            outcome
                .notes
                .push(format!("[dry-run] Would delete {path} from target"));
            outcome.applied += 1;
            self.updated.insert(path.to_string());
            return;
        }
        match fs::remove_file(&target) {
            Ok(()) => {
                outcome.applied += 1;
                self.updated.insert(path.to_string());
            }
            Err(e) => outcome.errors.push(format!("{path}: delete failed: {e}")),
        }
    }

    /// Re-parse the target with the action tree bound, then reconstruct.
    fn apply_items(
        &mut self,
        path: &str,
        actions: ActionNode,
        item_rows: usize,
        outcome: &mut FileOutcome,
    ) -> Result<()> {
        let target = self.target_root.join(path);
        if !target.is_file() {
            outcome.errors.push(format!(
                "{path}: target file missing, {item_rows} item row(s) not applied"
            ));
            return Ok(());
        }
        let text = fs::read_to_string(&target).map_err(|e| Error::io(&target, e))?;

        let mut ctx = Context::with_actions(self.config, path, actions);
        let tree = match meta_tree::parse(&mut ctx, &text) {
            Ok(tree) => tree,
            Err(meta_tree::Error::NotMetadata { .. }) => {
                outcome
                    .errors
                    .push(format!("{path}: target is not a metadata file"));
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        outcome.applied += item_rows;
        outcome.notes.append(&mut ctx.notes);
        for leftover in ctx.actions.leftovers() {
            outcome.notes.push(format!("{path}: {leftover}"));
        }

        let rendered = meta_tree::render(&tree, self.config);
        if self.options.dry_run {
            outcome
                .notes
                .push(format!("[dry-run] Would rewrite {path}"));
            return Ok(());
        }
        // Swap failures abort the run: the .new/.orig on disk is the
        // recovery hint.
        meta_tree::write_in_place(&target, &rendered)?;
        Ok(())
    }
}

/// Tolerate diff logs that lost the trailing newline of a value.
fn payload(value: &str) -> String {
    if value.is_empty() || value.ends_with('\n') {
        value.to_string()
    } else {
        format!("{value}\n")
    }
}
