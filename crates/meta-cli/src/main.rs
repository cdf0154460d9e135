//! metamerge CLI
//!
//! Compares, merges, and packages branches of a metadata repository.

mod cli;
mod commands;
mod discovery;
mod error;
mod interactive;
mod manifest;

use std::path::Path;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use meta_config::Config;
use meta_merge::MergeOptions;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use cli::{Cli, Commands};
use error::Result;

/// Config file picked up from the working directory when `--config` is
/// not given.
const DEFAULT_CONFIG_FILE: &str = "metamerge.cfg";

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(Level::DEBUG)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)
            .expect("Failed to set tracing subscriber");
        tracing::debug!("Verbose mode enabled");
    }

    let config = load_config(&cli)?;
    execute_command(cli.command, &config)
}

fn load_config(cli: &Cli) -> Result<Config> {
    if let Some(path) = &cli.config {
        return Ok(Config::load(path)?);
    }
    let default = Path::new(DEFAULT_CONFIG_FILE);
    if default.is_file() {
        return Ok(Config::load(default)?);
    }
    Ok(Config::builtin())
}

fn execute_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Diff {
            source,
            target,
            out,
            duplicates,
            work_team,
            developer,
            story,
            log_name,
            json,
        } => {
            let meta = interactive::complete_row_meta(
                work_team,
                developer,
                story,
                log_name,
                commands::request_timestamp(),
            )?;
            commands::diff::run_diff(
                config,
                &source,
                &target,
                &out,
                duplicates.as_deref(),
                &meta,
                json,
            )?;
            Ok(())
        }
        Commands::Merge {
            log,
            source,
            target,
            dry_run,
            yes,
            json,
        } => {
            commands::merge::run_merge(
                config,
                &log,
                &source,
                &target,
                MergeOptions { dry_run },
                yes,
                json,
            )?;
            Ok(())
        }
        Commands::Package {
            log,
            source,
            out,
            api_version,
        } => commands::package::run_package(&log, &source, &out, &api_version),
        Commands::Canon { root } => commands::canon::run_canon(config, &root),
        Commands::Run {
            source,
            target,
            out,
            api_version,
        } => commands::run::run_pipeline(config, &source, &target, &out, &api_version),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "metamerge",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meta_diff::RowMeta;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    const SOURCE_OBJECT: &str = "<CustomObject xmlns=\"http://soap.sforce.com/2006/04/metadata\">\n\
    <fields>\n\
        <fullName>Alpha__c</fullName>\n\
        <type>Text</type>\n\
    </fields>\n\
    <fields>\n\
        <fullName>Beta__c</fullName>\n\
        <type>Picklist</type>\n\
        <valueSet>\n\
            <restricted>true</restricted>\n\
        </valueSet>\n\
    </fields>\n\
    <sharingModel>Private</sharingModel>\n\
</CustomObject>\n";

    const TARGET_OBJECT: &str = "<CustomObject xmlns=\"http://soap.sforce.com/2006/04/metadata\">\n\
    <fields>\n\
        <fullName>Alpha__c</fullName>\n\
        <type>Text</type>\n\
    </fields>\n\
    <indexes/>\n\
    <sharingModel>ReadWrite</sharingModel>\n\
</CustomObject>\n";

    fn setup_branches(dir: &TempDir) -> (PathBuf, PathBuf) {
        let source = dir.path().join("src");
        let target = dir.path().join("trg");
        fs::create_dir_all(source.join("objects")).unwrap();
        fs::create_dir_all(target.join("objects")).unwrap();
        fs::write(source.join("objects/Account.object"), SOURCE_OBJECT).unwrap();
        fs::write(target.join("objects/Account.object"), TARGET_OBJECT).unwrap();
        (source, target)
    }

    fn meta() -> RowMeta {
        RowMeta {
            log_name: "WL-1".to_string(),
            timestamp: "2026-08-02 10:00:00".to_string(),
            work_team: "Platform".to_string(),
            developer: "ada".to_string(),
            user_story: "US-42".to_string(),
        }
    }

    #[test]
    fn diff_then_merge_converges_the_branches() {
        let dir = TempDir::new().unwrap();
        let (source, target) = setup_branches(&dir);
        let config = Config::builtin();
        let log = dir.path().join("diff.csv");

        let summary = commands::diff::run_diff(
            &config,
            &source,
            &[target.clone()],
            &log,
            None,
            &meta(),
            false,
        )
        .unwrap();
        // Beta__c created, sharingModel updated, indexes deleted.
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.creates, 1);
        assert_eq!(summary.updates, 1);
        assert_eq!(summary.deletes, 1);

        let report = commands::merge::run_merge(
            &config,
            &log,
            &source,
            &target,
            MergeOptions::default(),
            true,
            false,
        )
        .unwrap();
        assert!(report.success);

        // After the merge the branches compare clean.
        let relog = dir.path().join("recheck.csv");
        let summary = commands::diff::run_diff(
            &config,
            &source,
            &[target],
            &relog,
            None,
            &meta(),
            false,
        )
        .unwrap();
        assert_eq!(summary.rows, 0);
    }

    #[test]
    fn package_assembles_manifest_and_artifacts() {
        let dir = TempDir::new().unwrap();
        let (source, target) = setup_branches(&dir);
        let config = Config::builtin();
        let log = dir.path().join("diff.csv");

        commands::diff::run_diff(
            &config,
            &source,
            &[target],
            &log,
            None,
            &meta(),
            false,
        )
        .unwrap();

        let out = dir.path().join("package");
        commands::package::run_package(&log, &source, &out, "58.0").unwrap();

        let manifest = fs::read_to_string(out.join("package.xml")).unwrap();
        assert!(manifest.contains("<members>Account</members>"));
        assert!(manifest.contains("<name>CustomObject</name>"));
        assert!(manifest.contains("<version>58.0</version>"));
        assert!(out.join("objects/Account.object").is_file());
        // No file-level deletes, so no destructive manifest.
        assert!(!out.join("destructiveChanges.xml").exists());
    }

    #[test]
    fn canon_sorts_files_in_place() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("branch");
        fs::create_dir_all(root.join("profiles")).unwrap();
        let unsorted = "<Profile xmlns=\"x\">\n\
    <fieldPermissions>\n\
        <field>B</field>\n\
    </fieldPermissions>\n\
    <fieldPermissions>\n\
        <field>A</field>\n\
    </fieldPermissions>\n\
</Profile>\n";
        fs::write(root.join("profiles/Admin.profile"), unsorted).unwrap();

        let config = Config::builtin();
        commands::canon::run_canon(&config, &root).unwrap();

        let text = fs::read_to_string(root.join("profiles/Admin.profile")).unwrap();
        let a = text.find("<field>A</field>").unwrap();
        let b = text.find("<field>B</field>").unwrap();
        assert!(a < b);

        // Second pass is a no-op.
        commands::canon::run_canon(&config, &root).unwrap();
        assert_eq!(
            fs::read_to_string(root.join("profiles/Admin.profile")).unwrap(),
            text
        );
    }

    #[test]
    fn missing_diff_log_column_aborts_merge() {
        let dir = TempDir::new().unwrap();
        let (source, target) = setup_branches(&dir);
        let config = Config::builtin();
        let log = dir.path().join("broken.csv");
        fs::write(&log, "\"Only\",\"Two\"\n\"a\",\"b\"\n").unwrap();

        let err = commands::merge::run_merge(
            &config,
            &log,
            &source,
            &target,
            MergeOptions::default(),
            true,
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("missing required column"));
    }
}
