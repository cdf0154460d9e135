//! Shared parse state threaded through every level of the tree engine.
//!
//! One `Context` lives for the duration of one file parse. It carries the
//! resolved config, identifies the (branch, file) being parsed, and
//! accumulates the leaf map, duplicate-key records, and merge notes. The
//! merge-action tree rides here too so the parser can consume actions as
//! it passes their paths.

use std::collections::BTreeMap;
use std::path::Path;

use meta_config::Config;

use crate::actions::ActionNode;

/// What the parse is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Emit leaf-map entries for diffing.
    Report,
    /// Consume bound merge actions while building the tree.
    Merge,
    /// Neither: parse for canonicalization (filters and deletes apply).
    Plain,
}

/// A diff key seen more than once during one parse.
#[derive(Debug, Clone)]
pub struct Duplicate {
    /// Content of the first colliding occurrence.
    pub content: String,
    pub count: u64,
}

/// Per-file parse state.
#[derive(Debug)]
pub struct Context<'cfg> {
    pub config: &'cfg Config,
    pub mode: ParseMode,
    /// Branch tag, e.g. `SRC` or `TRG1`.
    pub branch: String,
    /// Repository-relative path with forward slashes; the first component
    /// of every diff key.
    pub file_path: String,
    /// The file stem; artifacts are identified as `TYPE=NAME`.
    pub metadata_name: String,
    separator: char,
    /// Diff key → content for every leaf of this file.
    pub leaves: BTreeMap<String, String>,
    /// Diff keys seen more than once (sanity signal, never fatal).
    pub duplicates: BTreeMap<String, Duplicate>,
    /// Merge actions still to be applied, rooted at the file.
    pub actions: ActionNode,
    /// Human-readable notes (e.g. `already updated`) gathered while merging.
    pub notes: Vec<String>,
}

impl<'cfg> Context<'cfg> {
    pub fn new(
        config: &'cfg Config,
        mode: ParseMode,
        branch: impl Into<String>,
        file_path: impl Into<String>,
    ) -> Self {
        let file_path = file_path.into();
        let metadata_name = Path::new(&file_path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            config,
            mode,
            branch: branch.into(),
            file_path,
            metadata_name,
            separator: config.separator(),
            leaves: BTreeMap::new(),
            duplicates: BTreeMap::new(),
            actions: ActionNode::default(),
            notes: Vec::new(),
        }
    }

    /// A merge-mode context with the file's action tree bound.
    pub fn with_actions(
        config: &'cfg Config,
        file_path: impl Into<String>,
        actions: ActionNode,
    ) -> Self {
        let mut ctx = Self::new(config, ParseMode::Merge, "", file_path);
        ctx.actions = actions;
        ctx
    }

    /// Join `(filepath, L1..L4)` into a diff key. Unused levels stay empty
    /// but their separators are always present.
    pub fn diff_key(&self, levels: &[&str]) -> String {
        let mut out = String::with_capacity(self.file_path.len() + 32);
        out.push_str(&self.file_path);
        for slot in 0..4 {
            out.push(self.separator);
            if let Some(level) = levels.get(slot) {
                out.push_str(level);
            }
        }
        out
    }

    /// Record one leaf. A repeated key keeps its first content and bumps
    /// the duplicate count instead of overwriting.
    pub fn record_leaf(&mut self, levels: &[&str], content: &str) {
        let key = self.diff_key(levels);
        if self.leaves.contains_key(&key) {
            self.duplicates
                .entry(key)
                .and_modify(|d| d.count += 1)
                .or_insert_with(|| Duplicate {
                    content: content.to_string(),
                    count: 2,
                });
        } else {
            self.leaves.insert(key, content.to_string());
        }
    }

    pub fn separator(&self) -> char {
        self.separator
    }
}
