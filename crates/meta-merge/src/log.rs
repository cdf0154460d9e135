//! Grouping of diff rows into an applicable merge log.

use std::collections::BTreeMap;

use meta_diff::DiffRow;

/// Diff rows grouped `path → timestamp → rows`. Both maps are ordered, so
/// iteration applies files deterministically and requests oldest-first
/// (timestamps are textual but compare chronologically).
#[derive(Debug, Default)]
pub struct MergeLog {
    pub files: BTreeMap<String, BTreeMap<String, Vec<DiffRow>>>,
}

impl MergeLog {
    /// Group rows read from a diff log.
    pub fn group(rows: Vec<DiffRow>) -> Self {
        let mut files: BTreeMap<String, BTreeMap<String, Vec<DiffRow>>> = BTreeMap::new();
        for row in rows {
            files
                .entry(row.path.clone())
                .or_default()
                .entry(row.timestamp.clone())
                .or_default()
                .push(row);
        }
        Self { files }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.files
            .values()
            .flat_map(|by_time| by_time.values())
            .map(Vec::len)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meta_diff::{MergeAction, RowMeta};

    fn row(path: &str, timestamp: &str) -> DiffRow {
        let meta = RowMeta {
            timestamp: timestamp.to_string(),
            ..RowMeta::default()
        };
        DiffRow::new(
            &meta,
            MergeAction::UpdateItem,
            "T=A".to_string(),
            path.to_string(),
        )
    }

    #[test]
    fn groups_by_path_then_timestamp() {
        let rows = vec![
            row("b.object", "2026-08-02 10:00:00"),
            row("a.object", "2026-08-01 09:00:00"),
            row("a.object", "2026-07-30 08:00:00"),
            row("a.object", "2026-08-01 09:00:00"),
        ];
        let log = MergeLog::group(rows);
        assert_eq!(log.files.len(), 2);
        assert_eq!(log.row_count(), 4);

        let a = &log.files["a.object"];
        let timestamps: Vec<&String> = a.keys().collect();
        assert_eq!(
            timestamps,
            vec!["2026-07-30 08:00:00", "2026-08-01 09:00:00"]
        );
        assert_eq!(a["2026-08-01 09:00:00"].len(), 2);
    }
}
