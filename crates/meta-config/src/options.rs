//! Option resolution over a parsed config file.
//!
//! `Config` wraps a [`ConfigFile`] (built-in defaults overlaid by an
//! optional user file) and exposes one pure accessor per recognized
//! option. All accessors resolve scope → metadata-type scope → global
//! with first-hit-wins semantics and fall back to documented defaults,
//! so a missing or partial config is never fatal.

use std::fs;
use std::path::Path;

use crate::error::{Error, Result};
use crate::file::ConfigFile;
use crate::DEFAULT_SEPARATOR;

/// How a section derives sort keys for its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortRule {
    /// Try each tag in order; the first `<tag>value` found supplies the key.
    Tags(Vec<String>),
    /// The literal key `#SINGLE#` (sections with exactly one entry).
    Single,
    /// No structured key; entries are identified by a content hash.
    Content,
}

/// One `NAME.KEY` filter entry: keep only entry `key` when the artifact is
/// named `name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub name: String,
    pub key: String,
}

/// One `metadatamap-<dir>` entry: how to infer (type, name) from a file in
/// an overwrite directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataMapEntry {
    pub metadata_type: String,
    /// Filename suffixes to strip, or the literal `#BASENAME#` meaning
    /// "part before the first dot".
    pub suffixes: Vec<String>,
}

/// Built-in defaults; a user config overlays these per (scope, key).
const DEFAULT_CONFIG: &str = r#"
merge = objects profiles permissionsets labels workflows classes triggers pages
overwrite = staticresources documents email
excludeFiles = . package destructiveChanges

metadatamap-staticresources = StaticResource #BASENAME#
metadatamap-documents = Document #BASENAME#
metadatamap-email = EmailTemplate .email

sort = fullName name

[CustomObject-fields]
sort = fullName

[CustomObject-recordTypes]
sort = fullName

[CustomObject-listViews]
sort = fullName

[CustomObject-webLinks]
sort = fullName

[CustomObject-validationRules]
sort = fullName

[Profile-fieldPermissions]
sort = field

[Profile-objectPermissions]
sort = object

[Profile-classAccesses]
sort = apexClass

[Profile-pageAccesses]
sort = apexPage

[Profile-recordTypeVisibilities]
sort = recordType

[Profile-userPermissions]
sort = name

[CustomLabels-labels]
sort = fullName

[Workflow-alerts]
sort = fullName

[Workflow-rules]
sort = fullName

[PermissionSet-fieldPermissions]
sort = field

[PermissionSet-classAccesses]
sort = apexClass
"#;

/// Resolved configuration: defaults plus any user overrides.
#[derive(Debug, Clone)]
pub struct Config {
    file: ConfigFile,
}

impl Default for Config {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Config {
    /// The built-in defaults with no user overrides.
    pub fn builtin() -> Self {
        let file = ConfigFile::parse(DEFAULT_CONFIG).expect("built-in config is valid");
        Self { file }
    }

    /// Defaults overlaid with the config file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_text(&text)
    }

    /// Defaults overlaid with parsed config text.
    pub fn from_text(text: &str) -> Result<Self> {
        let mut cfg = Self::builtin();
        cfg.file.overlay(ConfigFile::parse(text)?);
        Ok(cfg)
    }

    /// Scope → metadata-type scope → global, first hit wins.
    fn lookup(&self, scope: &str, key: &str) -> Option<&[String]> {
        if let Some(v) = self.file.get(scope, key) {
            return Some(v);
        }
        if let Some((metadata_type, _)) = scope.split_once('-') {
            if let Some(v) = self.file.get(metadata_type, key) {
                return Some(v);
            }
        }
        if !scope.is_empty() {
            if let Some(v) = self.file.get("", key) {
                return Some(v);
            }
        }
        None
    }

    /// Values of a list option whose entries are whitespace-separated
    /// tokens (possibly spread over repeated keys).
    fn tokens(&self, scope: &str, key: &str) -> Vec<String> {
        self.lookup(scope, key)
            .map(|values| {
                values
                    .iter()
                    .flat_map(|v| v.split_whitespace())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The sort rule for a section scope.
    ///
    /// Unconfigured scopes hash their content, which gives every entry a
    /// deterministic identity even without a natural key.
    pub fn sort_rule(&self, scope: &str) -> SortRule {
        let tags = self.tokens(scope, "sort");
        if tags.is_empty() {
            return SortRule::Content;
        }
        if tags.iter().any(|t| t == "#SINGLE#") {
            return SortRule::Single;
        }
        if tags.iter().any(|t| t == "#CONTENT#") {
            return SortRule::Content;
        }
        SortRule::Tags(tags)
    }

    /// Substring predicates: an entry containing all of them is dropped
    /// during parse. Each config value is one predicate, spaces included.
    pub fn delete_patterns(&self, scope: &str) -> &[String] {
        self.lookup(scope, "delete").unwrap_or(&[])
    }

    /// Whether the reconstructor sorts this section's entries.
    pub fn reconstruct_sorts(&self, scope: &str) -> bool {
        self.lookup(scope, "reconstruct")
            .and_then(|v| v.first())
            .map(|v| v != "#DONOTSORT#")
            .unwrap_or(true)
    }

    /// Whether sub-section parsing must not descend into this section
    /// (`parser = #FULLSECTION#`).
    pub fn full_section(&self, scope: &str) -> bool {
        self.lookup(scope, "parser")
            .and_then(|v| v.first())
            .map(|v| v == "#FULLSECTION#")
            .unwrap_or(false)
    }

    /// `NAME.KEY` filters configured for this scope.
    pub fn filters(&self, scope: &str) -> Vec<Filter> {
        self.tokens(scope, "filter")
            .into_iter()
            .filter_map(|entry| {
                entry.split_once('.').map(|(name, key)| Filter {
                    name: name.to_string(),
                    key: key.to_string(),
                })
            })
            .collect()
    }

    /// Whether any scope nested under `scope` carries filters. The parser
    /// must descend into a section when deeper filters exist, even if the
    /// section itself has none.
    pub fn has_sub_filters(&self, scope: &str) -> bool {
        let prefix = format!("{scope}-");
        self.file
            .scope_names()
            .any(|s| s.starts_with(&prefix) && self.file.get(s, "filter").is_some())
    }

    /// Top-level directories parsed and merged structurally.
    pub fn merge_dirs(&self) -> Vec<String> {
        self.tokens("", "merge")
    }

    /// Top-level directories compared by whole-file hash.
    pub fn overwrite_dirs(&self) -> Vec<String> {
        self.tokens("", "overwrite")
    }

    /// Bare-filename prefixes excluded from discovery.
    pub fn exclude_prefixes(&self) -> Vec<String> {
        self.tokens("", "excludeFiles")
    }

    /// `metadatamap-<dir>` entries for an overwrite directory.
    pub fn metadata_map(&self, dir: &str) -> Vec<MetadataMapEntry> {
        let key = format!("metadatamap-{dir}");
        self.lookup("", &key)
            .map(|values| {
                values
                    .iter()
                    .filter_map(|v| {
                        let mut parts = v.split_whitespace();
                        let metadata_type = parts.next()?.to_string();
                        Some(MetadataMapEntry {
                            metadata_type,
                            suffixes: parts.map(str::to_string).collect(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The diff-key separator character.
    pub fn separator(&self) -> char {
        self.lookup("", "diffKeySeparator")
            .and_then(|v| v.first())
            .and_then(|v| v.chars().next())
            .unwrap_or(DEFAULT_SEPARATOR)
    }
}
