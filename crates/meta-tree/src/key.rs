//! Sort-key synthesis for section entries.
//!
//! A key is extracted from an entry's parameter lines according to the
//! section's [`SortRule`]. Entries with no extractable key get a content
//! hash instead, so every block has a deterministic identity that survives
//! reordering across branches.

use md5::{Digest, Md5};
use meta_config::SortRule;

use crate::line::{self, Line};

/// Whether a block contains nested blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Simple,
    Complex,
}

/// Lowercase hex MD5 of a byte slice. Overwrite-directory files are
/// hashed whole, and may be binary.
pub fn md5_hex_bytes(input: &[u8]) -> String {
    let mut hasher = Md5::new();
    hasher.update(input);
    format!("{:x}", hasher.finalize())
}

/// Lowercase hex MD5 of a string.
pub fn md5_hex(input: &str) -> String {
    md5_hex_bytes(input.as_bytes())
}

/// The content-hash fallback key: leading whitespace stripped from every
/// line, line breaks removed, then hashed. Whitespace-only reformatting
/// therefore keeps the identity stable.
pub fn fallback_key(block: &str) -> String {
    let mut squeezed = String::new();
    for line in block.lines() {
        squeezed.push_str(line.trim_start());
    }
    md5_hex(&squeezed)
}

/// Detect a fallback key: exactly 32 characters, no space, all lowercase
/// hex. Insert logic treats such keys as having no natural ordering.
pub fn is_fallback_key(key: &str) -> bool {
    key.len() == 32
        && !key.contains(' ')
        && key.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Derive `(key, shape)` for a block of content under the given rule.
pub fn synthesize(content: &str, rule: &SortRule) -> (String, Shape) {
    let lines: Vec<&str> = content.lines().collect();
    let mut start = 0;
    let mut end = lines.len();
    if start < end && matches!(line::classify(lines[start].trim()), Line::Open(_)) {
        start += 1;
    }
    if start < end && matches!(line::classify(lines[end - 1].trim()), Line::Close(_)) {
        end -= 1;
    }

    // Depth walk: lines at depth 0 form the parameter region; any opening
    // line makes the block complex.
    let mut depth = 0i32;
    let mut saw_open = false;
    let mut region = String::new();
    for raw in &lines[start..end] {
        let trimmed = raw.trim();
        match line::classify(trimmed) {
            Line::Open(_) => {
                saw_open = true;
                depth += 1;
            }
            Line::Close(_) => depth -= 1,
            _ => {
                if depth == 0 {
                    region.push_str(raw);
                    region.push('\n');
                }
            }
        }
    }
    let shape = if saw_open { Shape::Complex } else { Shape::Simple };

    match rule {
        SortRule::Single => ("#SINGLE#".to_string(), shape),
        SortRule::Content => (fallback_key(content), shape),
        SortRule::Tags(tags) => {
            for tag in tags {
                let marker = format!("<{tag}>");
                if let Some(pos) = region.find(&marker) {
                    let rest = &region[pos + marker.len()..];
                    let value = match rest.find('<') {
                        Some(stop) => &rest[..stop],
                        None => rest,
                    };
                    if !value.is_empty() {
                        return (value.to_string(), shape);
                    }
                }
            }
            (fallback_key(content), shape)
        }
    }
}
