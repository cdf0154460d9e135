//! Parser for the section-oriented config dialect.
//!
//! The format is deliberately not TOML: repeated keys accumulate into
//! lists, which TOML forbids. It looks like:
//!
//! ```text
//! # global options live before the first section header
//! merge = objects profiles
//! excludeFiles = . package destructiveChanges
//!
//! [CustomObject-fields]
//! sort = fullName
//! delete = <trackHistory>false</trackHistory>
//! ```
//!
//! Keys in the anonymous root section apply globally; `[scope]` headers
//! open a per-scope section.

use std::collections::HashMap;

use crate::error::{Error, Result};

/// A parsed config file: scope → key → accumulated values.
///
/// The global scope is the empty string. Values keep their original
/// spelling; splitting list values into tokens is the resolver's business
/// because some options carry meaningful whitespace.
#[derive(Debug, Clone, Default)]
pub struct ConfigFile {
    scopes: HashMap<String, HashMap<String, Vec<String>>>,
}

impl ConfigFile {
    /// Parse config text.
    ///
    /// # Errors
    ///
    /// Returns a parse error for an unterminated `[scope` header or a line
    /// that is neither a comment, a header, nor a `key = value` pair.
    pub fn parse(text: &str) -> Result<Self> {
        let mut scopes: HashMap<String, HashMap<String, Vec<String>>> = HashMap::new();
        let mut current = String::new();

        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if let Some(rest) = line.strip_prefix('[') {
                let scope = rest.strip_suffix(']').ok_or_else(|| Error::Parse {
                    line: idx + 1,
                    message: format!("unterminated scope header: {line}"),
                })?;
                current = scope.trim().to_string();
                scopes.entry(current.clone()).or_default();
                continue;
            }
            let (key, value) = line.split_once('=').ok_or_else(|| Error::Parse {
                line: idx + 1,
                message: format!("expected `key = value`, got: {line}"),
            })?;
            scopes
                .entry(current.clone())
                .or_default()
                .entry(key.trim().to_string())
                .or_default()
                .push(value.trim().to_string());
        }

        Ok(Self { scopes })
    }

    /// Raw values for `key` in `scope`, if any were given.
    pub fn get(&self, scope: &str, key: &str) -> Option<&[String]> {
        self.scopes
            .get(scope)
            .and_then(|s| s.get(key))
            .map(Vec::as_slice)
    }

    /// All scope names that were declared (the global scope included only
    /// if it holds keys).
    pub fn scope_names(&self) -> impl Iterator<Item = &str> {
        self.scopes.keys().map(String::as_str)
    }

    /// Overlay `other` on top of `self`: each (scope, key) present in
    /// `other` replaces the same (scope, key) here wholesale.
    pub fn overlay(&mut self, other: ConfigFile) {
        for (scope, keys) in other.scopes {
            let target = self.scopes.entry(scope).or_default();
            for (key, values) in keys {
                target.insert(key, values);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_global_and_scoped_keys() {
        let cfg = ConfigFile::parse(
            "merge = objects\n\n[CustomObject-fields]\nsort = fullName\n",
        )
        .unwrap();
        assert_eq!(cfg.get("", "merge"), Some(&["objects".to_string()][..]));
        assert_eq!(
            cfg.get("CustomObject-fields", "sort"),
            Some(&["fullName".to_string()][..])
        );
    }

    #[test]
    fn repeated_keys_accumulate() {
        let cfg = ConfigFile::parse("[S]\ndelete = a\ndelete = b b\n").unwrap();
        assert_eq!(
            cfg.get("S", "delete"),
            Some(&["a".to_string(), "b b".to_string()][..])
        );
    }

    #[test]
    fn comments_and_blanks_skipped() {
        let cfg = ConfigFile::parse("# hi\n\nkey = v\n").unwrap();
        assert_eq!(cfg.get("", "key"), Some(&["v".to_string()][..]));
    }

    #[test]
    fn bad_header_is_an_error() {
        let err = ConfigFile::parse("[oops\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn bare_word_is_an_error() {
        assert!(ConfigFile::parse("justaword\n").is_err());
    }

    #[test]
    fn overlay_replaces_per_key() {
        let mut base = ConfigFile::parse("[S]\nsort = a\ndelete = x\n").unwrap();
        let over = ConfigFile::parse("[S]\nsort = b\n").unwrap();
        base.overlay(over);
        assert_eq!(base.get("S", "sort"), Some(&["b".to_string()][..]));
        assert_eq!(base.get("S", "delete"), Some(&["x".to_string()][..]));
    }

    #[test]
    fn values_keep_internal_whitespace() {
        let cfg = ConfigFile::parse("metadatamap-email = EmailTemplate .email\n").unwrap();
        assert_eq!(
            cfg.get("", "metadatamap-email"),
            Some(&["EmailTemplate .email".to_string()][..])
        );
    }
}
