//! Diff-log CSV reading and writing.
//!
//! The writer emits canonical column names, always quoted. The reader is
//! lenient: every column may also be spelled in its `Snake_Case__c`
//! variant, any number of trailing `Old Value` columns are accepted, and
//! unknown merge actions are preserved for per-row error reporting. A
//! missing required column aborts with a message listing the full set.

use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::io;
use crate::row::{snake_variant, DiffRow, MergeAction, REQUIRED_COLUMNS};

/// Write rows to a diff log, replacing any existing file atomically.
pub fn write_diff_log(path: &Path, rows: &[DiffRow]) -> Result<()> {
    let old_columns = rows
        .iter()
        .map(|r| r.old_values.len())
        .max()
        .unwrap_or(1)
        .max(1);

    let mut writer = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .from_writer(Vec::new());

    let mut header: Vec<&str> = REQUIRED_COLUMNS.to_vec();
    for _ in 1..old_columns {
        header.push("Old Value");
    }
    writer
        .write_record(&header)
        .map_err(|e| Error::csv(path, e))?;

    for row in rows {
        let action = row.action.to_string();
        let mut record = vec![
            row.log_name.as_str(),
            row.timestamp.as_str(),
            row.work_team.as_str(),
            row.developer.as_str(),
            row.user_story.as_str(),
            action.as_str(),
            row.metadata.as_str(),
            row.path.as_str(),
            row.keys[0].as_str(),
            row.keys[1].as_str(),
            row.keys[2].as_str(),
            row.keys[3].as_str(),
            row.new_value.as_str(),
        ];
        for slot in 0..old_columns {
            record.push(row.old_values.get(slot).map(String::as_str).unwrap_or(""));
        }
        writer.write_record(&record).map_err(|e| Error::csv(path, e))?;
    }

    let data = writer
        .into_inner()
        .map_err(|e| Error::io(path, std::io::Error::other(e)))?;
    io::write_atomic(path, &data)?;
    debug!(path = %path.display(), rows = rows.len(), "wrote diff log");
    Ok(())
}

/// Read a diff log, resolving lenient column names.
pub fn read_diff_log(path: &Path) -> Result<Vec<DiffRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| Error::csv(path, e))?;
    let headers = reader.headers().map_err(|e| Error::csv(path, e))?.clone();

    let mut indices = Vec::with_capacity(REQUIRED_COLUMNS.len());
    let mut missing = Vec::new();
    for column in REQUIRED_COLUMNS {
        let variant = snake_variant(column);
        match headers
            .iter()
            .position(|h| h == column || h == variant)
        {
            Some(idx) => indices.push(idx),
            None => missing.push(column.to_string()),
        }
    }
    if !missing.is_empty() {
        return Err(Error::MissingColumns {
            path: path.to_path_buf(),
            missing,
        });
    }

    // Every column named "Old Value" (either spelling), in order; the
    // first is the primary target's.
    let old_variant = snake_variant("Old Value");
    let old_indices: Vec<usize> = headers
        .iter()
        .enumerate()
        .filter(|(_, h)| *h == "Old Value" || *h == old_variant)
        .map(|(idx, _)| idx)
        .collect();

    let field = |record: &csv::StringRecord, idx: usize| -> String {
        record.get(idx).unwrap_or_default().to_string()
    };

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| Error::csv(path, e))?;
        let row = DiffRow {
            log_name: field(&record, indices[0]),
            timestamp: field(&record, indices[1]),
            work_team: field(&record, indices[2]),
            developer: field(&record, indices[3]),
            user_story: field(&record, indices[4]),
            action: MergeAction::parse(record.get(indices[5]).unwrap_or_default()),
            metadata: field(&record, indices[6]),
            path: field(&record, indices[7]),
            keys: [
                field(&record, indices[8]),
                field(&record, indices[9]),
                field(&record, indices[10]),
                field(&record, indices[11]),
            ],
            new_value: field(&record, indices[12]),
            old_values: old_indices.iter().map(|&idx| field(&record, idx)).collect(),
        };
        rows.push(row);
    }
    debug!(path = %path.display(), rows = rows.len(), "read diff log");
    Ok(rows)
}
