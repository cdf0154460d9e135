//! The sub-section parser: descends into a Standard entry when deeper
//! leaves are needed (reporting, deep filters, or a bound merge action).
//!
//! Each descended block contributes a `#CONTENTS#` leaf (the whole block)
//! and a `#PARAMS#` leaf (its depth-0 parameter lines); complex children
//! recurse with their own keys up to the fourth named level. In merge mode
//! the block's text is rewritten in place: changed children substituted,
//! deleted children omitted, created children spliced in sort order.

use std::mem;

use crate::actions::{ActionNode, LevelKey};
use crate::context::{Context, ParseMode};
use crate::error::{Error, Result};
use crate::key::{self, Shape};
use crate::line::{self, Line};

/// One piece of a block's body, in original order.
enum Item {
    /// A parameter line, blank line, or other verbatim text.
    Text(String),
    /// A nested `<tag>…</tag>` block.
    Child {
        tag: String,
        sort_key: String,
        body: String,
    },
}

/// Parse (and in merge mode rewrite) one block of content.
///
/// `levels` holds the formatted diff-key levels leading to this block
/// (`["fields=Foo__c"]` for a first-level entry). Returns the block's
/// text, modified if merge actions applied.
pub fn parse_block(
    ctx: &mut Context,
    scope: &str,
    levels: &[String],
    content: &str,
    mut node: Option<&mut ActionNode>,
) -> Result<String> {
    let lines: Vec<&str> = content.split_inclusive('\n').collect();
    if lines.len() < 2 {
        return Ok(content.to_string());
    }
    let open_line = lines[0];
    let close_line = lines[lines.len() - 1];
    let body_end = lines.len() - 1;

    let mut items: Vec<Item> = Vec::new();
    let mut params = String::new();
    let mut i = 1;
    while i < body_end {
        let raw = lines[i];
        match line::classify(raw.trim()) {
            Line::Open(tag) => {
                let tag = tag.to_string();
                let open = format!("<{tag}>");
                let close = format!("</{tag}>");
                let mut depth = 1u32;
                let mut body = raw.to_string();
                i += 1;
                while i < body_end && depth > 0 {
                    let inner = lines[i];
                    let trimmed = inner.trim();
                    body.push_str(inner);
                    i += 1;
                    if trimmed == open {
                        depth += 1;
                    } else if trimmed == close {
                        depth -= 1;
                    }
                }
                if depth > 0 {
                    return Err(Error::UnclosedSection {
                        path: ctx.file_path.clone(),
                        section: tag,
                    });
                }
                items.push(Item::Child {
                    tag,
                    sort_key: String::new(),
                    body,
                });
            }
            _ => {
                params.push_str(raw);
                items.push(Item::Text(raw.to_string()));
                i += 1;
            }
        }
    }

    if ctx.mode == ParseMode::Report {
        record_with(ctx, levels, "#CONTENTS#", content);
        record_with(ctx, levels, "#PARAMS#", &params);
    }

    let mut out_items: Vec<Item> = Vec::with_capacity(items.len());
    for item in items {
        let (tag, body) = match item {
            Item::Child { tag, body, .. } => (tag, body),
            text => {
                out_items.push(text);
                continue;
            }
        };

        let child_scope = format!("{scope}-{tag}");
        let rule = ctx.config.sort_rule(&child_scope);
        let (sort_key, shape) = key::synthesize(&body, &rule);

        if ctx.mode == ParseMode::Merge {
            if let Some(n) = node.as_deref_mut() {
                if n.take_create(&tag, &sort_key).is_some() {
                    ctx.notes.push(format!(
                        "{}: {tag}={sort_key} already updated",
                        ctx.file_path
                    ));
                }
            }
        }
        let mut child_node = node
            .as_deref_mut()
            .and_then(|n| n.remove_child(&tag, &sort_key));

        // Delete wins before any descend, so actions nested under the
        // deleted child are not drained; giving the node back reports
        // them as leftovers.
        if child_node.as_ref().is_some_and(|n| n.delete) {
            if let Some(mut n) = child_node {
                n.delete = false;
                give_back(&mut node, &tag, &sort_key, n);
            }
            continue;
        }

        if ctx.mode == ParseMode::Plain {
            let filters = ctx.config.filters(&child_scope);
            let relevant: Vec<_> = filters
                .iter()
                .filter(|f| f.name == ctx.metadata_name)
                .collect();
            if !relevant.is_empty() && !relevant.iter().any(|f| f.key == sort_key) {
                continue;
            }
        }

        let child_level = format!("{tag}={sort_key}");
        let descend = shape == Shape::Complex
            && levels.len() <= 2
            && !ctx.config.full_section(&child_scope)
            && (ctx.mode == ParseMode::Report
                || ctx.config.has_sub_filters(&child_scope)
                || child_node.is_some());

        let mut body = body;
        if descend {
            let mut child_levels = levels.to_vec();
            child_levels.push(child_level.clone());
            body = parse_block(ctx, &child_scope, &child_levels, &body, child_node.as_mut())?;
        } else if ctx.mode == ParseMode::Report {
            record_with(ctx, levels, &child_level, &body);
        }

        if let Some(mut n) = child_node {
            if let Some(payload) = n.change.take() {
                body = payload;
            }
            give_back(&mut node, &tag, &sort_key, n);
        }
        out_items.push(Item::Child {
            tag,
            sort_key,
            body,
        });
    }

    if ctx.mode == ParseMode::Merge {
        if let Some(n) = node.as_deref_mut() {
            if let Some(payload) = n.take_child_change("", "#PARAMS#") {
                replace_params(&mut out_items, payload);
            }
        }
        if let Some(n) = node.as_deref_mut() {
            let mut creates = mem::take(&mut n.creates);
            creates.sort_by(|a, b| a.sort_key.to_lowercase().cmp(&b.sort_key.to_lowercase()));
            for create in creates {
                insert_create(&mut out_items, create);
            }
        }
    }

    let mut out = String::from(open_line);
    for item in &out_items {
        match item {
            Item::Text(text) => out.push_str(text),
            Item::Child { body, .. } => out.push_str(body),
        }
    }
    out.push_str(close_line);
    Ok(out)
}

fn record_with(ctx: &mut Context, levels: &[String], last: &str, content: &str) {
    let mut full: Vec<&str> = levels.iter().map(String::as_str).collect();
    full.push(last);
    ctx.record_leaf(&full, content);
}

/// Reattach a child node that still holds unconsumed actions so they
/// surface as leftovers.
fn give_back(node: &mut Option<&mut ActionNode>, tag: &str, sort_key: &str, child: ActionNode) {
    if child.is_empty() {
        return;
    }
    if let Some(n) = node.as_deref_mut() {
        n.children.push((
            LevelKey {
                name: tag.to_string(),
                value: sort_key.to_string(),
            },
            child,
        ));
    }
}

/// Swap the block's parameter lines for a replacement payload, keeping the
/// payload at the position of the first original parameter line.
fn replace_params(out_items: &mut Vec<Item>, payload: String) {
    let first_text = out_items
        .iter()
        .position(|item| matches!(item, Item::Text(_)));
    let insert_at = match first_text {
        Some(pos) => out_items[..pos]
            .iter()
            .filter(|item| matches!(item, Item::Child { .. }))
            .count(),
        None => out_items.len(),
    };
    out_items.retain(|item| matches!(item, Item::Child { .. }));
    if !payload.is_empty() {
        out_items.insert(insert_at.min(out_items.len()), Item::Text(payload));
    }
}

/// Splice a created child into the body. Structured keys insert in sorted
/// order among existing children of the same section; fallback keys have
/// no natural order and append at the end of the body.
fn insert_create(out_items: &mut Vec<Item>, create: crate::actions::CreateEntry) {
    let item = Item::Child {
        tag: create.section.clone(),
        sort_key: create.sort_key.clone(),
        body: create.content,
    };
    if key::is_fallback_key(&create.sort_key) {
        out_items.push(item);
        return;
    }
    let folded = create.sort_key.to_lowercase();
    let mut last_same_tag = None;
    for (idx, existing) in out_items.iter().enumerate() {
        if let Item::Child { tag, sort_key, .. } = existing {
            if create.section.is_empty() || *tag == create.section {
                if sort_key.to_lowercase() > folded {
                    out_items.insert(idx, item);
                    return;
                }
                last_same_tag = Some(idx);
            }
        }
    }
    let at = match last_same_tag {
        Some(idx) => idx + 1,
        None => out_items.len(),
    };
    out_items.insert(at, item);
}
