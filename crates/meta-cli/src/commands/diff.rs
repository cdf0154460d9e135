//! The `diff` command: compare a source branch against target branches.

use std::collections::BTreeMap;
use std::fs;
use std::mem;
use std::path::{Path, PathBuf};

use colored::Colorize;
use meta_config::Config;
use meta_diff::{
    diff, write_diff_log, write_duplicates, ArtifactId, BranchLeaves, DiffSummary, RowMeta,
};
use meta_tree::{md5_hex_bytes, Context, Duplicate, ParseMode};
use tracing::info;

use crate::discovery::{discover, overwrite_artifact, FileKind};
use crate::error::Result;

pub fn run_diff(
    config: &Config,
    source: &Path,
    targets: &[PathBuf],
    out: &Path,
    duplicates_out: Option<&Path>,
    meta: &RowMeta,
    json: bool,
) -> Result<DiffSummary> {
    let mut duplicates = BTreeMap::new();

    let source_leaves = collect_branch(config, "SRC", source, &mut duplicates)?;
    let mut target_leaves = Vec::with_capacity(targets.len());
    for (index, target) in targets.iter().enumerate() {
        let tag = format!("TRG{}", index + 1);
        target_leaves.push(collect_branch(config, &tag, target, &mut duplicates)?);
    }

    let rows = diff(&source_leaves, &target_leaves, config.separator(), meta);
    write_diff_log(out, &rows)?;

    let duplicates_path = if duplicates.is_empty() {
        None
    } else {
        let path = duplicates_out
            .map(Path::to_path_buf)
            .unwrap_or_else(|| derive_duplicates_path(out));
        write_duplicates(&path, &duplicates, config.separator())?;
        Some(path)
    };

    let summary = DiffSummary::from_rows(&rows, duplicates.len());
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!(
            "{} {} row(s): {} create, {} update, {} delete",
            "diff".green().bold(),
            summary.rows,
            summary.creates,
            summary.updates,
            summary.deletes
        );
        println!("  {} {}", "log".dimmed(), out.display());
        if let Some(path) = &duplicates_path {
            println!(
                "  {} {} duplicate key(s), see {}",
                "warning".yellow().bold(),
                summary.duplicate_keys,
                path.display()
            );
        }
    }
    Ok(summary)
}

/// Parse every participating file of one branch into leaf maps.
fn collect_branch(
    config: &Config,
    tag: &str,
    root: &Path,
    duplicates: &mut BTreeMap<String, Duplicate>,
) -> Result<BranchLeaves> {
    let mut branch = BranchLeaves::new(tag);
    for file in discover(root, config)? {
        match file.kind {
            FileKind::Merge => {
                let mut ctx =
                    Context::new(config, ParseMode::Report, tag, file.rel_path.clone());
                match meta_tree::parse_path(&mut ctx, &file.abs_path) {
                    Ok(tree) => {
                        let separator = ctx.separator();
                        for (key, duplicate) in mem::take(&mut ctx.duplicates) {
                            duplicates.insert(format!("{tag}{separator}{key}"), duplicate);
                        }
                        branch.insert(
                            ArtifactId {
                                metadata_type: tree.metadata_type,
                                name: tree.metadata_name,
                            },
                            mem::take(&mut ctx.leaves),
                        );
                    }
                    Err(meta_tree::Error::NotMetadata { path }) => {
                        info!(file = %path, "skipping non-metadata file");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            FileKind::Overwrite => {
                let bytes = fs::read(&file.abs_path)?;
                let digest = md5_hex_bytes(&bytes);
                let file_name = file
                    .rel_path
                    .rsplit('/')
                    .next()
                    .unwrap_or(file.rel_path.as_str());
                let id = overwrite_artifact(config, &file.top_dir, file_name);
                let separator = config.separator();
                let key = format!(
                    "{}{separator}#OVERWRITE#{separator}{separator}{separator}",
                    file.rel_path
                );
                branch.insert(id, [(key, digest)].into());
            }
        }
    }
    Ok(branch)
}

fn derive_duplicates_path(out: &Path) -> PathBuf {
    let stem = out
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "diff".to_string());
    out.with_file_name(format!("{stem}-duplicates.csv"))
}
