//! The file-level parser: one pass over a metadata file, producing a
//! [`MetadataTree`] and, depending on the parse mode, leaf-map entries or
//! applied merge actions.
//!
//! The parser is a line-oriented state machine. It seeks the root element
//! within the first three lines, then alternates between recognizing
//! section boundaries and accumulating one entry at a time. Entry content
//! is kept as the exact original bytes; classification only ever looks at
//! trimmed lines.

use std::fs;
use std::mem;
use std::path::Path;

use tracing::debug;

use crate::actions::{CreateEntry, LevelKey};
use crate::context::{Context, ParseMode};
use crate::error::{Error, Result};
use crate::key::{self, Shape};
use crate::line::{self, Line};
use crate::section::{Entry, MetadataTree, Section, SectionKind};
use crate::subsection;

/// Parse a file's text.
///
/// In [`ParseMode::Report`] the context accumulates the leaf map and
/// duplicate records; in [`ParseMode::Merge`] bound actions are consumed
/// and spliced into the tree as their paths are passed.
///
/// # Errors
///
/// [`Error::NotMetadata`] when no root element appears within the first
/// three lines; [`Error::UnclosedSection`] when an entry's closing tag is
/// missing.
pub fn parse(ctx: &mut Context, text: &str) -> Result<MetadataTree> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut pos = 0;
    let mut header = String::new();
    let mut metadata_type = None;

    while pos < lines.len() && pos < 3 {
        let raw = lines[pos];
        pos += 1;
        header.push_str(raw);
        if let Some(tag) = line::root_tag(raw.trim()) {
            metadata_type = Some(tag.to_string());
            break;
        }
    }
    let metadata_type = metadata_type.ok_or_else(|| Error::NotMetadata {
        path: ctx.file_path.clone(),
    })?;
    debug!(
        file = %ctx.file_path,
        metadata_type = %metadata_type,
        "parsing metadata file"
    );

    let pending = if ctx.mode == ParseMode::Merge {
        mem::take(&mut ctx.actions.creates)
    } else {
        Vec::new()
    };

    let mut parser = FileParser {
        ctx: &mut *ctx,
        metadata_type: metadata_type.clone(),
        sections: vec![Section::single(
            metadata_type.clone(),
            SectionKind::Header,
            String::new(),
            header,
        )],
        pending,
        current: None,
    };

    while pos < lines.len() {
        let raw = lines[pos];
        pos += 1;
        let trimmed = raw.trim();
        match line::classify(trimmed) {
            Line::Close(tag) if tag == parser.metadata_type => {
                parser.close_current();
                parser.flush_creates(None);
                let mut end = raw.to_string();
                while pos < lines.len() {
                    end.push_str(lines[pos]);
                    pos += 1;
                }
                parser.sections.push(Section::single(
                    tag,
                    SectionKind::End,
                    String::new(),
                    end,
                ));
            }
            Line::Open(tag) => {
                let tag = tag.to_string();
                let (block, next) = collect_entry(&lines, pos - 1, &tag, &parser.ctx.file_path)?;
                pos = next;
                if parser.current.as_ref().map(|s| s.name.as_str()) != Some(tag.as_str()) {
                    parser.close_current();
                    parser.flush_creates(Some(&tag));
                    parser.current = Some(Section {
                        name: tag.clone(),
                        kind: SectionKind::Standard,
                        entries: Vec::new(),
                    });
                }
                parser.commit_entry(&tag, block)?;
            }
            Line::Empty(tag) => {
                let tag = tag.to_string();
                parser.add_single(&tag, SectionKind::Empty, "#SINGLE#", raw);
            }
            Line::Param(tag) => {
                let tag = tag.to_string();
                parser.add_single(&tag, SectionKind::Params, "#PARAM#", raw);
            }
            _ => parser.append_stray(raw),
        }
    }

    // A missing root close is tolerated: commit what we have.
    parser.close_current();
    parser.flush_creates(None);

    let tree = MetadataTree {
        metadata_type,
        metadata_name: parser.ctx.metadata_name.clone(),
        sections: parser.sections,
    };

    if ctx.mode == ParseMode::Report {
        ctx.record_leaf(&["#NEW_METADATA#"], text);
    }
    Ok(tree)
}

/// Read and parse a file from disk.
pub fn parse_path(ctx: &mut Context, path: &Path) -> Result<MetadataTree> {
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse(ctx, &text)
}

/// Accumulate lines from the opening tag through its exact closing line.
fn collect_entry(
    lines: &[&str],
    start: usize,
    tag: &str,
    file_path: &str,
) -> Result<(String, usize)> {
    let close = format!("</{tag}>");
    let mut buf = lines[start].to_string();
    let mut i = start + 1;
    while i < lines.len() {
        let raw = lines[i];
        buf.push_str(raw);
        i += 1;
        if raw.trim() == close {
            return Ok((buf, i));
        }
    }
    Err(Error::UnclosedSection {
        path: file_path.to_string(),
        section: tag.to_string(),
    })
}

struct FileParser<'a, 'cfg> {
    ctx: &'a mut Context<'cfg>,
    metadata_type: String,
    sections: Vec<Section>,
    /// Root-level `##CREATE##` entries waiting for their flush point.
    pending: Vec<CreateEntry>,
    current: Option<Section>,
}

impl FileParser<'_, '_> {
    /// Commit one entry to the current Standard section, applying delete
    /// predicates, key synthesis, filters, descent, and merge actions.
    fn commit_entry(&mut self, section_name: &str, mut content: String) -> Result<()> {
        let scope = format!("{}-{}", self.metadata_type, section_name);
        let cfg = self.ctx.config;

        let patterns = cfg.delete_patterns(&scope);
        if !patterns.is_empty() && patterns.iter().all(|p| content.contains(p.as_str())) {
            return Ok(());
        }

        let rule = cfg.sort_rule(&scope);
        let (sort_key, shape) = key::synthesize(&content, &rule);

        if self.ctx.mode == ParseMode::Plain {
            let filters = cfg.filters(&scope);
            let relevant: Vec<_> = filters
                .iter()
                .filter(|f| f.name == self.ctx.metadata_name)
                .collect();
            if !relevant.is_empty() && !relevant.iter().any(|f| f.key == sort_key) {
                return Ok(());
            }
        }

        let mut entry_node = None;
        if self.ctx.mode == ParseMode::Merge {
            self.consume_pending(section_name, &sort_key);
            entry_node = self.ctx.actions.remove_child(section_name, &sort_key);
        }

        // Delete wins before any descend: the sub-section parser drains
        // the node, and actions nested under a deleted entry must stay
        // put so they surface as leftovers.
        if let Some(mut node) = entry_node.take() {
            if node.delete {
                node.delete = false;
                self.reattach(section_name, &sort_key, node);
                return Ok(());
            }
            entry_node = Some(node);
        }

        let level1 = format!("{section_name}={sort_key}");
        let descend = shape == Shape::Complex
            && !cfg.full_section(&scope)
            && (self.ctx.mode == ParseMode::Report
                || cfg.has_sub_filters(&scope)
                || entry_node.is_some());
        if descend {
            content = subsection::parse_block(
                self.ctx,
                &scope,
                &[level1.clone()],
                &content,
                entry_node.as_mut(),
            )?;
        } else if self.ctx.mode == ParseMode::Report {
            self.ctx.record_leaf(&[&level1], &content);
        }

        if let Some(mut node) = entry_node {
            if let Some(payload) = node.change.take() {
                content = payload;
            }
            self.reattach(section_name, &sort_key, node);
        }

        self.current
            .as_mut()
            .expect("commit_entry requires an open section")
            .entries
            .push(Entry { sort_key, content });
        Ok(())
    }

    /// Commit an Empty or Params section (exactly one verbatim entry,
    /// still addressable by merge actions).
    fn add_single(&mut self, tag: &str, kind: SectionKind, special: &str, raw: &str) {
        self.close_current();
        self.flush_creates(Some(tag));

        let mut content = raw.to_string();
        if self.ctx.mode == ParseMode::Report {
            let level1 = format!("{tag}={special}");
            self.ctx.record_leaf(&[&level1], raw);
        }
        if self.ctx.mode == ParseMode::Merge {
            self.consume_pending(tag, special);
            if let Some(mut node) = self.ctx.actions.remove_child(tag, special) {
                if node.delete {
                    node.delete = false;
                    self.reattach(tag, special, node);
                    return;
                }
                if let Some(payload) = node.change.take() {
                    content = payload;
                }
                self.reattach(tag, special, node);
            }
        }
        self.sections
            .push(Section::single(tag, kind, special, content));
    }

    /// A pending create whose key already exists means the target is up to
    /// date: consume it with a note instead of inserting a duplicate.
    fn consume_pending(&mut self, section_name: &str, sort_key: &str) {
        let matched = self.pending.iter().position(|c| {
            c.sort_key == sort_key && (c.section.is_empty() || c.section == section_name)
        });
        if let Some(idx) = matched {
            self.pending.remove(idx);
            self.ctx.notes.push(format!(
                "{}: {section_name}={sort_key} already updated",
                self.ctx.file_path
            ));
        }
    }

    fn reattach(&mut self, section_name: &str, sort_key: &str, node: crate::actions::ActionNode) {
        if !node.is_empty() {
            self.ctx.actions.children.push((
                LevelKey {
                    name: section_name.to_string(),
                    value: sort_key.to_string(),
                },
                node,
            ));
        }
    }

    /// Close the open Standard section, first absorbing any pending
    /// creates addressed at it. Absorbed entries land at the end; the
    /// reconstructor's sort puts them in place.
    fn close_current(&mut self) {
        let Some(mut section) = self.current.take() else {
            return;
        };
        if self.ctx.mode == ParseMode::Merge && section.kind == SectionKind::Standard {
            let (mut mine, keep): (Vec<_>, Vec<_>) =
                mem::take(&mut self.pending).into_iter().partition(|c| {
                    c.section == section.name
                        && c.sort_key != "#PARAM#"
                        && c.sort_key != "#SINGLE#"
                });
            self.pending = keep;
            mine.sort_by(|a, b| {
                a.sort_key
                    .to_lowercase()
                    .cmp(&b.sort_key.to_lowercase())
            });
            for create in mine {
                section.entries.push(Entry {
                    sort_key: create.sort_key,
                    content: create.content,
                });
            }
        }
        self.sections.push(section);
    }

    /// Emit pending creates whose section name sorts before the next
    /// encountered section (all of them at end of file) as new sections.
    fn flush_creates(&mut self, next_section: Option<&str>) {
        if self.pending.is_empty() {
            return;
        }
        let (mut due, keep): (Vec<_>, Vec<_>) = mem::take(&mut self.pending)
            .into_iter()
            .partition(|c| match next_section {
                Some(next) => c.section.as_str() < next,
                None => true,
            });
        self.pending = keep;
        if due.is_empty() {
            return;
        }
        due.sort_by(|a, b| {
            (a.section.as_str(), a.sort_key.to_lowercase())
                .cmp(&(b.section.as_str(), b.sort_key.to_lowercase()))
        });

        for create in due {
            let kind = match create.sort_key.as_str() {
                "#PARAM#" => SectionKind::Params,
                "#SINGLE#" => SectionKind::Empty,
                _ => SectionKind::Standard,
            };
            match self.sections.last_mut() {
                // Consecutive creates for the same new Standard section
                // collapse into it.
                Some(last)
                    if kind == SectionKind::Standard
                        && last.kind == SectionKind::Standard
                        && last.name == create.section
                        && self.current.is_none() =>
                {
                    last.entries.push(Entry {
                        sort_key: create.sort_key,
                        content: create.content,
                    });
                }
                _ => {
                    self.sections.push(Section::single(
                        create.section,
                        kind,
                        create.sort_key,
                        create.content,
                    ));
                }
            }
        }
    }

    /// Keep stray bytes (blank lines, comments) attached to whatever came
    /// before them so reconstruction reproduces them.
    fn append_stray(&mut self, raw: &str) {
        if let Some(section) = self.current.as_mut() {
            if let Some(entry) = section.entries.last_mut() {
                entry.content.push_str(raw);
                return;
            }
        }
        if let Some(section) = self.sections.last_mut() {
            if let Some(entry) = section.entries.last_mut() {
                entry.content.push_str(raw);
            }
        }
    }
}
