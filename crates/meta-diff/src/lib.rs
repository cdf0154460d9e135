//! Leaf-map differ and CSV report I/O for metamerge.
//!
//! Given per-branch leaf maps produced by the tree engine, the differ
//! emits one [`DiffRow`] per semantic change, classified as a file-level
//! or item-level create/update/delete. Rows serialize to and from the
//! diff-log CSV with lenient column naming; duplicate-key collisions get
//! their own report.

pub mod csv_io;
pub mod differ;
pub mod error;
pub mod io;
pub mod report;
pub mod row;

pub use csv_io::{read_diff_log, write_diff_log};
pub use differ::{diff, ArtifactId, BranchLeaves, LeafMap};
pub use error::{Error, Result};
pub use report::{write_duplicates, DiffSummary};
pub use row::{snake_variant, DiffRow, MergeAction, RowMeta, REQUIRED_COLUMNS};
