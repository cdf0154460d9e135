//! Scoped configuration for the metamerge tree engine.
//!
//! Options are resolved per *scope*, where a scope is the dash-joined chain
//! of metadata type and section names (`CustomObject-fields-valueSet`).
//! Lookup walks scope → metadata-type scope → global and takes the first
//! hit, so a deep scope only needs to override what actually differs.

pub mod error;
pub mod file;
pub mod options;

pub use error::{Error, Result};
pub use file::ConfigFile;
pub use options::{Config, Filter, MetadataMapEntry, SortRule};

/// Default diff-key separator: ASCII Record Separator.
///
/// Rare enough that it never appears in metadata content, which keeps the
/// joined `(filepath, L1..L4)` tuples unambiguous.
pub const DEFAULT_SEPARATOR: char = '\u{1e}';
