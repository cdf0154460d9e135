//! The `canon` command: canonicalize a branch in place.
//!
//! Parses every merge-directory file in plain mode (filters and delete
//! predicates apply) and rewrites the ones whose canonical form differs.

use std::fs;
use std::path::Path;

use colored::Colorize;
use meta_config::Config;
use meta_tree::{parse, render, write_in_place, Context, ParseMode};
use tracing::info;

use crate::discovery::{discover, FileKind};
use crate::error::Result;

pub fn run_canon(config: &Config, root: &Path) -> Result<()> {
    let mut rewritten = 0usize;
    let mut unchanged = 0usize;
    let mut skipped = 0usize;

    for file in discover(root, config)? {
        if file.kind != FileKind::Merge {
            continue;
        }
        let text = fs::read_to_string(&file.abs_path)?;
        let mut ctx = Context::new(config, ParseMode::Plain, "", file.rel_path.clone());
        let tree = match parse(&mut ctx, &text) {
            Ok(tree) => tree,
            Err(meta_tree::Error::NotMetadata { path }) => {
                info!(file = %path, "skipping non-metadata file");
                skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        let canonical = render(&tree, config);
        if canonical == text {
            unchanged += 1;
            continue;
        }
        write_in_place(&file.abs_path, &canonical)?;
        rewritten += 1;
    }

    println!(
        "{} {} file(s) rewritten, {} unchanged, {} skipped",
        "canon".green().bold(),
        rewritten,
        unchanged,
        skipped
    );
    Ok(())
}
