//! Serialize a tree back to text and swap it into place.

use std::fs;
use std::path::Path;

use meta_config::Config;
use tracing::debug;

use crate::error::{Error, Result};
use crate::section::{Entry, MetadataTree, SectionKind};

/// Render the tree in original section order. Standard sections sort
/// their entries by case-folded key (stable, so ties keep insertion
/// order) unless the scope opts out with `#DONOTSORT#`.
pub fn render(tree: &MetadataTree, config: &Config) -> String {
    let mut out = String::new();
    for section in &tree.sections {
        if section.kind == SectionKind::Standard {
            let scope = format!("{}-{}", tree.metadata_type, section.name);
            if config.reconstruct_sorts(&scope) {
                let mut ordered: Vec<&Entry> = section.entries.iter().collect();
                ordered.sort_by_key(|e| e.sort_key.to_lowercase());
                for entry in ordered {
                    out.push_str(&entry.content);
                }
                continue;
            }
        }
        for entry in &section.entries {
            out.push_str(&entry.content);
        }
    }
    out
}

/// Write `rendered` to `<file>.new`, then swap: the original becomes
/// `<file>.orig`, the new file takes its place, the backup is removed.
///
/// # Errors
///
/// Any I/O failure here is fatal for the file; the `.new` or `.orig`
/// left behind is the recovery hint.
pub fn write_in_place(path: &Path, rendered: &str) -> Result<()> {
    let path_display = path.to_string_lossy();
    let new_path = path.with_file_name(format!(
        "{}.new",
        path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
    ));
    let orig_path = path.with_file_name(format!(
        "{}.orig",
        path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
    ));

    fs::write(&new_path, rendered).map_err(|e| Error::io(&new_path, e))?;
    fs::rename(path, &orig_path).map_err(|e| Error::io(path, e))?;
    fs::rename(&new_path, path).map_err(|e| Error::io(&new_path, e))?;
    fs::remove_file(&orig_path).map_err(|e| Error::io(&orig_path, e))?;
    debug!(file = %path_display, "reconstructed in place");
    Ok(())
}
