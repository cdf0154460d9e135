//! Duplicate-key report and run summaries.

use std::collections::BTreeMap;
use std::path::Path;

use meta_tree::Duplicate;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::io;
use crate::row::{DiffRow, MergeAction};

/// Write the duplicate-keys report: `MetadataKey, Content, Count`, one
/// row per colliding diff key. The key's path levels are joined with
/// newlines for readability; empty trailing levels are dropped.
pub fn write_duplicates(
    path: &Path,
    duplicates: &BTreeMap<String, Duplicate>,
    separator: char,
) -> Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());
    writer
        .write_record(["MetadataKey", "Content", "Count"])
        .map_err(|e| Error::csv(path, e))?;

    for (key, duplicate) in duplicates {
        let readable = key
            .split(separator)
            .filter(|level| !level.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        writer
            .write_record([
                readable.as_str(),
                duplicate.content.as_str(),
                duplicate.count.to_string().as_str(),
            ])
            .map_err(|e| Error::csv(path, e))?;
    }

    let data = writer
        .into_inner()
        .map_err(|e| Error::io(path, std::io::Error::other(e)))?;
    io::write_atomic(path, &data)
}

/// Machine-readable summary of one diff run.
#[derive(Debug, Clone, Serialize)]
pub struct DiffSummary {
    pub rows: usize,
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
    pub duplicate_keys: usize,
}

impl DiffSummary {
    pub fn from_rows(rows: &[DiffRow], duplicate_keys: usize) -> Self {
        let count = |matcher: fn(&MergeAction) -> bool| {
            rows.iter().filter(|r| matcher(&r.action)).count()
        };
        Self {
            rows: rows.len(),
            creates: count(|a| matches!(a, MergeAction::CreateFile | MergeAction::CreateItem)),
            updates: count(|a| matches!(a, MergeAction::UpdateFile | MergeAction::UpdateItem)),
            deletes: count(|a| matches!(a, MergeAction::DeleteFile | MergeAction::DeleteItem)),
            duplicate_keys,
        }
    }
}
