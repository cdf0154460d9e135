//! Branch discovery: which files of a branch root participate, and how.
//!
//! Only the first path segment decides whether a file is merged
//! structurally or compared whole-file; nested overwrite roots are not
//! supported. Exclusion is a prefix match on the bare filename, which is
//! what the default `. package destructiveChanges` list relies on.

use std::path::{Path, PathBuf};

use meta_config::Config;
use meta_diff::ArtifactId;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::Result;

/// How a discovered file is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Parsed into a section tree and diffed per leaf.
    Merge,
    /// Compared by whole-file MD5.
    Overwrite,
}

/// One file of a branch.
#[derive(Debug, Clone)]
pub struct BranchFile {
    /// Repository-relative path with forward slashes.
    pub rel_path: String,
    pub abs_path: PathBuf,
    pub kind: FileKind,
    /// First path segment.
    pub top_dir: String,
}

/// Walk a branch root and classify its files.
pub fn discover(root: &Path, config: &Config) -> Result<Vec<BranchFile>> {
    let merge_dirs = config.merge_dirs();
    let overwrite_dirs = config.overwrite_dirs();
    let excludes = config.exclude_prefixes();

    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            std::io::Error::other(format!("walk failed under {}: {e}", root.display()))
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = match entry.path().strip_prefix(root) {
            Ok(rel) => rel,
            Err(_) => continue,
        };
        let rel_path = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let Some((top_dir, _)) = rel_path.split_once('/') else {
            // Top-level files (package manifests etc.) never participate.
            continue;
        };
        let file_name = entry.file_name().to_string_lossy();
        if excludes.iter().any(|prefix| file_name.starts_with(prefix)) {
            debug!(file = %rel_path, "excluded by filename prefix");
            continue;
        }

        let kind = if merge_dirs.iter().any(|d| d == top_dir) {
            FileKind::Merge
        } else if overwrite_dirs.iter().any(|d| d == top_dir) {
            FileKind::Overwrite
        } else {
            continue;
        };
        let top_dir = top_dir.to_string();
        files.push(BranchFile {
            rel_path,
            abs_path: entry.path().to_path_buf(),
            kind,
            top_dir,
        });
    }
    debug!(root = %root.display(), files = files.len(), "discovered branch files");
    Ok(files)
}

/// Infer the artifact identity of an overwrite-directory file through the
/// `metadatamap-<dir>` config. Without a mapping the directory name
/// stands in for the type and the basename for the name.
pub fn overwrite_artifact(config: &Config, top_dir: &str, file_name: &str) -> ArtifactId {
    for entry in config.metadata_map(top_dir) {
        for suffix in &entry.suffixes {
            if suffix == "#BASENAME#" {
                return ArtifactId {
                    metadata_type: entry.metadata_type.clone(),
                    name: basename(file_name),
                };
            }
            if let Some(stem) = file_name.strip_suffix(suffix.as_str()) {
                return ArtifactId {
                    metadata_type: entry.metadata_type.clone(),
                    name: stem.to_string(),
                };
            }
        }
    }
    ArtifactId {
        metadata_type: top_dir.to_string(),
        name: basename(file_name),
    }
}

/// The part of a filename before the first dot.
fn basename(file_name: &str) -> String {
    file_name
        .split_once('.')
        .map(|(stem, _)| stem.to_string())
        .unwrap_or_else(|| file_name.to_string())
}
