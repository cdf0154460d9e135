//! The leaf-map differ: compares one source branch against one or more
//! target branches and classifies every differing leaf into a diff row.
//!
//! Classification is checked top-down per leaf. Whole-file keys
//! (`#NEW_METADATA#`, `#OVERWRITE#`) sort before structural keys, so a
//! file-level row is emitted first and suppresses the redundant item rows
//! beneath it. The same suppression applies when a complex block is
//! created or deleted wholesale: its `#CONTENTS#` leaf wins and the child
//! leaves under that block are skipped.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use tracing::debug;

use crate::row::{DiffRow, MergeAction, RowMeta};

/// Identity of one artifact: the `TYPE=NAME` pair.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArtifactId {
    pub metadata_type: String,
    pub name: String,
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.metadata_type, self.name)
    }
}

/// Diff key → content for one artifact.
pub type LeafMap = BTreeMap<String, String>;

/// All leaf maps of one branch, keyed by artifact.
#[derive(Debug, Clone)]
pub struct BranchLeaves {
    pub branch: String,
    pub artifacts: BTreeMap<ArtifactId, LeafMap>,
}

impl BranchLeaves {
    pub fn new(branch: impl Into<String>) -> Self {
        Self {
            branch: branch.into(),
            artifacts: BTreeMap::new(),
        }
    }

    /// Merge one parsed file's leaves into the branch. Leaves accumulate
    /// per artifact because some types spread over several files.
    pub fn insert(&mut self, id: ArtifactId, leaves: LeafMap) {
        self.artifacts.entry(id).or_default().extend(leaves);
    }
}

/// Compare `source` against each target; rows are classified against the
/// first target, additional targets only contribute Old Value columns.
pub fn diff(
    source: &BranchLeaves,
    targets: &[BranchLeaves],
    separator: char,
    meta: &RowMeta,
) -> Vec<DiffRow> {
    let empty_map = LeafMap::new();
    let empty_artifacts = BTreeMap::new();
    let primary = targets
        .first()
        .map(|t| &t.artifacts)
        .unwrap_or(&empty_artifacts);

    let mut rows = Vec::new();
    let ids: BTreeSet<&ArtifactId> = source.artifacts.keys().chain(primary.keys()).collect();

    for id in ids {
        let src = source.artifacts.get(id).unwrap_or(&empty_map);
        let trg = primary.get(id).unwrap_or(&empty_map);
        let before = rows.len();
        diff_artifact(id, src, trg, targets, separator, meta, &mut rows);
        debug!(
            artifact = %id,
            rows = rows.len() - before,
            "compared artifact"
        );
    }
    rows
}

fn diff_artifact(
    id: &ArtifactId,
    src: &LeafMap,
    trg: &LeafMap,
    targets: &[BranchLeaves],
    separator: char,
    meta: &RowMeta,
    rows: &mut Vec<DiffRow>,
) {
    let keys: BTreeSet<&String> = src.keys().chain(trg.keys()).collect();
    let mut skip_prefix: Option<String> = None;

    for key in keys {
        if let Some(prefix) = &skip_prefix {
            if key.starts_with(prefix.as_str()) {
                continue;
            }
            skip_prefix = None;
        }

        let (path, levels) = split_key(key, separator);
        let source_value = src.get(key);
        let target_value = trg.get(key);

        if levels[0] == "#NEW_METADATA#" {
            match (source_value, target_value) {
                (Some(content), None) => {
                    let mut row = item_row(meta, MergeAction::CreateFile, id, path, &levels);
                    row.new_value = content.clone();
                    row.old_values.push(String::new());
                    fill_old_values(&mut row, key, targets, 1);
                    rows.push(row);
                    return; // whole file created: skip child rows
                }
                (None, Some(content)) => {
                    let mut row = item_row(meta, MergeAction::DeleteFile, id, path, &levels);
                    row.old_values.push(content.clone());
                    fill_old_values(&mut row, key, targets, 1);
                    rows.push(row);
                    return; // whole file deleted: skip child rows
                }
                _ => continue,
            }
        }

        if levels[0] == "#OVERWRITE#" {
            match (source_value, target_value) {
                (Some(digest), None) => {
                    let mut row = item_row(meta, MergeAction::CreateFile, id, path, &levels);
                    row.new_value = digest.clone();
                    row.old_values.push(String::new());
                    fill_old_values(&mut row, key, targets, 1);
                    rows.push(row);
                }
                (None, Some(digest)) => {
                    let mut row = item_row(meta, MergeAction::DeleteFile, id, path, &levels);
                    row.old_values.push(digest.clone());
                    fill_old_values(&mut row, key, targets, 1);
                    rows.push(row);
                }
                (Some(new_digest), Some(old_digest)) if new_digest != old_digest => {
                    let mut row = item_row(meta, MergeAction::UpdateFile, id, path, &levels);
                    row.new_value = new_digest.clone();
                    row.old_values.push(old_digest.clone());
                    fill_old_values(&mut row, key, targets, 1);
                    rows.push(row);
                }
                _ => {}
            }
            continue;
        }

        match (source_value, target_value) {
            (Some(content), None) => {
                let mut row = item_row(meta, MergeAction::CreateItem, id, path, &levels);
                row.new_value = content.clone();
                row.old_values.push(String::new());
                fill_old_values(&mut row, key, targets, 1);
                rows.push(row);
                skip_prefix = contents_prefix(key, &levels, separator);
            }
            (None, Some(content)) => {
                let mut row = item_row(meta, MergeAction::DeleteItem, id, path, &levels);
                row.old_values.push(content.clone());
                fill_old_values(&mut row, key, targets, 1);
                rows.push(row);
                skip_prefix = contents_prefix(key, &levels, separator);
            }
            (Some(new_content), Some(old_content)) => {
                // A #CONTENTS# leaf present on both sides means the parent
                // block exists in both branches; its children carry the
                // real differences.
                if levels.iter().any(|l| *l == "#CONTENTS#") {
                    continue;
                }
                if normalized(new_content) != normalized(old_content) {
                    let mut row = item_row(meta, MergeAction::UpdateItem, id, path, &levels);
                    row.new_value = new_content.clone();
                    row.old_values.push(old_content.clone());
                    fill_old_values(&mut row, key, targets, 1);
                    rows.push(row);
                }
            }
            (None, None) => {}
        }
    }
}

/// Split a diff key into its file path and four levels.
fn split_key(key: &str, separator: char) -> (&str, [&str; 4]) {
    let mut parts = key.split(separator);
    let path = parts.next().unwrap_or_default();
    let mut levels = [""; 4];
    for slot in &mut levels {
        *slot = parts.next().unwrap_or_default();
    }
    (path, levels)
}

/// When a created/deleted leaf is a `#CONTENTS#` block, suppress the
/// sibling and child leaves under the same parent.
fn contents_prefix(key: &str, levels: &[&str; 4], separator: char) -> Option<String> {
    let position = levels.iter().position(|l| *l == "#CONTENTS#")?;
    let mut prefix_parts = position + 1; // path plus the levels before #CONTENTS#
    let mut end = 0;
    for (idx, ch) in key.char_indices() {
        if ch == separator {
            prefix_parts -= 1;
            if prefix_parts == 0 {
                end = idx + ch.len_utf8();
                break;
            }
        }
    }
    if end == 0 {
        return None;
    }
    Some(key[..end].to_string())
}

fn item_row(
    meta: &RowMeta,
    action: MergeAction,
    id: &ArtifactId,
    path: &str,
    levels: &[&str; 4],
) -> DiffRow {
    let mut row = DiffRow::new(meta, action, id.to_string(), path.to_string());
    for (slot, level) in row.keys.iter_mut().zip(levels.iter()) {
        *slot = (*level).to_string();
    }
    row
}

/// Secondary targets contribute extra Old Value columns only; callers
/// push the primary column before calling.
fn fill_old_values(row: &mut DiffRow, key: &String, targets: &[BranchLeaves], from: usize) {
    let (metadata_type, name) = row.metadata.split_once('=').unwrap_or(("", ""));
    let id = ArtifactId {
        metadata_type: metadata_type.to_string(),
        name: name.to_string(),
    };
    for target in targets.iter().skip(from) {
        let value = target
            .artifacts
            .get(&id)
            .and_then(|leaves| leaves.get(key))
            .cloned()
            .unwrap_or_default();
        row.old_values.push(value);
    }
}

/// Comparison ignores indentation: leading whitespace is stripped from
/// every line before equality is checked.
fn normalized(value: &str) -> String {
    value
        .lines()
        .map(str::trim_start)
        .collect::<Vec<_>>()
        .join("\n")
}
