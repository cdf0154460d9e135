//! Section-tree engine for metadata files.
//!
//! This crate is the core of metamerge: a lenient stream parser for the
//! restricted metadata XML dialect, a canonicalizer (sort + strip), a key
//! synthesizer with content-hash fallback, and a structural merge engine
//! driven by an external diff log.
//!
//! A file parses into a [`MetadataTree`] of sections (Header, Standard,
//! Empty, Params, End) whose entries carry exact original bytes plus a
//! deterministic sort key. In report mode every leaf path also lands in
//! the context's leaf map under a position-independent diff key; in merge
//! mode a bound [`ActionNode`] tree is consumed as the parser passes each
//! path, splicing creates, changes, and deletes into the tree.

pub mod actions;
pub mod context;
pub mod error;
pub mod key;
pub mod line;
pub mod parser;
pub mod reconstruct;
pub mod section;
pub mod subsection;

pub use actions::{ActionNode, CreateEntry, LevelKey};
pub use context::{Context, Duplicate, ParseMode};
pub use error::{Error, Result};
pub use key::{fallback_key, is_fallback_key, md5_hex, md5_hex_bytes, Shape};
pub use parser::{parse, parse_path};
pub use reconstruct::{render, write_in_place};
pub use section::{Entry, MetadataTree, Section, SectionKind};
