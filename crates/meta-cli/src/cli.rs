//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// metamerge - compare, merge, and package metadata repository branches
#[derive(Parser, Debug)]
#[command(name = "metamerge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a config file overlaying the built-in defaults
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Compare a source branch against one or more target branches
    ///
    /// Writes one diff row per semantic change to a CSV log. Work-team
    /// metadata is prompted for unless given as flags.
    ///
    /// Examples:
    ///   metamerge diff -s branches/dev -t branches/main -o diff.csv
    ///   metamerge diff -s dev -t uat -t prod -o diff.csv --work-team Platform
    Diff {
        /// Source branch root
        #[arg(short, long)]
        source: PathBuf,

        /// Target branch root (repeat for additional targets)
        #[arg(short, long, required = true)]
        target: Vec<PathBuf>,

        /// Output CSV path
        #[arg(short, long)]
        out: PathBuf,

        /// Duplicate-keys report path (defaults to `<out>-duplicates.csv`,
        /// written only when collisions occur)
        #[arg(long)]
        duplicates: Option<PathBuf>,

        /// Work team recorded on every row
        #[arg(long)]
        work_team: Option<String>,

        /// Developer name recorded on every row
        #[arg(long)]
        developer: Option<String>,

        /// User story recorded on every row
        #[arg(long)]
        story: Option<String>,

        /// Work log name (defaults to one derived from the timestamp)
        #[arg(long)]
        log_name: Option<String>,

        /// Output the summary as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Apply a diff log to a target branch
    ///
    /// Rows are grouped per file and applied oldest request first.
    ///
    /// Examples:
    ///   metamerge merge -l diff.csv -s branches/dev -t branches/main
    ///   metamerge merge -l diff.csv -s dev -t main --dry-run
    Merge {
        /// Diff log CSV to apply
        #[arg(short, long)]
        log: PathBuf,

        /// Source branch root (file-level rows copy from here)
        #[arg(short, long)]
        source: PathBuf,

        /// Target branch root to rewrite
        #[arg(short, long)]
        target: PathBuf,

        /// Preview changes without touching the target
        #[arg(long)]
        dry_run: bool,

        /// Skip the confirmation gate
        #[arg(short, long)]
        yes: bool,

        /// Output the change log as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Assemble a deployment package from a diff log
    ///
    /// Copies every changed artifact from the source branch and emits
    /// package.xml plus destructiveChanges.xml when files were deleted.
    Package {
        /// Diff log CSV to package
        #[arg(short, long)]
        log: PathBuf,

        /// Source branch root to copy artifacts from
        #[arg(short, long)]
        source: PathBuf,

        /// Output package directory
        #[arg(short, long)]
        out: PathBuf,

        /// API version written into the manifests
        #[arg(long, default_value = "58.0")]
        api_version: String,
    },

    /// Canonicalize a branch in place (sort entries, apply filters)
    Canon {
        /// Branch root to canonicalize
        #[arg(short, long)]
        root: PathBuf,
    },

    /// Compare, then merge, then package, with a gate between phases
    Run {
        /// Source branch root
        #[arg(short, long)]
        source: PathBuf,

        /// Target branch root
        #[arg(short, long)]
        target: PathBuf,

        /// Directory receiving the diff log and the package
        #[arg(short, long)]
        out: PathBuf,

        /// API version written into the manifests
        #[arg(long, default_value = "58.0")]
        api_version: String,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   metamerge completions bash > ~/.local/share/bash-completion/completions/metamerge
    ///   metamerge completions zsh > ~/.zfunc/_metamerge
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_diff_with_two_targets() {
        let cli = Cli::parse_from([
            "metamerge", "diff", "-s", "dev", "-t", "uat", "-t", "prod", "-o", "diff.csv",
        ]);
        match cli.command {
            Commands::Diff {
                source,
                target,
                out,
                json,
                ..
            } => {
                assert_eq!(source, PathBuf::from("dev"));
                assert_eq!(target, vec![PathBuf::from("uat"), PathBuf::from("prod")]);
                assert_eq!(out, PathBuf::from("diff.csv"));
                assert!(!json);
            }
            _ => panic!("Expected Diff command"),
        }
    }

    #[test]
    fn diff_requires_a_target() {
        assert!(Cli::try_parse_from(["metamerge", "diff", "-s", "dev", "-o", "d.csv"]).is_err());
    }

    #[test]
    fn parse_merge_flags() {
        let cli = Cli::parse_from([
            "metamerge", "merge", "-l", "diff.csv", "-s", "dev", "-t", "main", "--dry-run", "-y",
        ]);
        match cli.command {
            Commands::Merge {
                dry_run, yes, json, ..
            } => {
                assert!(dry_run);
                assert!(yes);
                assert!(!json);
            }
            _ => panic!("Expected Merge command"),
        }
    }

    #[test]
    fn parse_package_defaults_api_version() {
        let cli = Cli::parse_from([
            "metamerge", "package", "-l", "diff.csv", "-s", "dev", "-o", "pkg",
        ]);
        match cli.command {
            Commands::Package { api_version, .. } => assert_eq!(api_version, "58.0"),
            _ => panic!("Expected Package command"),
        }
    }

    #[test]
    fn global_config_flag() {
        let cli = Cli::parse_from([
            "metamerge", "--config", "custom.cfg", "canon", "-r", "dev",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("custom.cfg")));
        assert!(matches!(cli.command, Commands::Canon { .. }));
    }

    #[test]
    fn parse_completions() {
        let cli = Cli::parse_from(["metamerge", "completions", "bash"]);
        assert!(matches!(cli.command, Commands::Completions { .. }));
    }
}
