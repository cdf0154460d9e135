//! Line classification for the metadata dialect.
//!
//! Each logical line of a metadata file is exactly one of: a section open,
//! a section close, a self-closing empty element, a primitive
//! `<tag>value</tag>` parameter, or free text. Attributes other than the
//! root `xmlns` are not recognized; lines carrying them classify as
//! `Other` and ride along verbatim inside whatever block holds them.

use regex::Regex;
use std::sync::LazyLock;

static OPEN_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<([A-Za-z_][A-Za-z0-9_.]*)>$").expect("valid open regex"));

static CLOSE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^</([A-Za-z_][A-Za-z0-9_.]*)>$").expect("valid close regex"));

static EMPTY_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([A-Za-z_][A-Za-z0-9_.]*)\s*/>$").expect("valid empty regex")
});

static PARAM_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^<([A-Za-z_][A-Za-z0-9_.]*)>(.*)</([A-Za-z_][A-Za-z0-9_.]*)>$")
        .expect("valid param regex")
});

/// The root element: `<TYPE xmlns="…">`.
static ROOT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^<([A-Za-z_][A-Za-z0-9_]*)\s+xmlns\s*="#).expect("valid root regex")
});

/// One classified line. Tag names borrow from the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    Open(&'a str),
    Close(&'a str),
    Empty(&'a str),
    Param(&'a str),
    Other,
}

/// Classify a trimmed line.
pub fn classify(trimmed: &str) -> Line<'_> {
    if let Some(caps) = OPEN_LINE.captures(trimmed) {
        return Line::Open(caps.get(1).expect("group 1").as_str());
    }
    if let Some(caps) = CLOSE_LINE.captures(trimmed) {
        return Line::Close(caps.get(1).expect("group 1").as_str());
    }
    if let Some(caps) = EMPTY_LINE.captures(trimmed) {
        return Line::Empty(caps.get(1).expect("group 1").as_str());
    }
    if let Some(caps) = PARAM_LINE.captures(trimmed) {
        return Line::Param(caps.get(1).expect("group 1").as_str());
    }
    Line::Other
}

/// The root tag name, if this trimmed line opens a metadata file.
pub fn root_tag(trimmed: &str) -> Option<&str> {
    ROOT_LINE
        .captures(trimmed)
        .map(|caps| caps.get(1).expect("group 1").as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_open_close() {
        assert_eq!(classify("<fields>"), Line::Open("fields"));
        assert_eq!(classify("</fields>"), Line::Close("fields"));
    }

    #[test]
    fn classify_empty_element() {
        assert_eq!(classify("<indexes/>"), Line::Empty("indexes"));
        assert_eq!(classify("<indexes />"), Line::Empty("indexes"));
    }

    #[test]
    fn classify_param() {
        assert_eq!(classify("<fullName>Foo__c</fullName>"), Line::Param("fullName"));
        assert_eq!(classify("<label></label>"), Line::Param("label"));
    }

    #[test]
    fn attributes_are_other() {
        assert_eq!(classify(r#"<fields attr="x">"#), Line::Other);
        assert_eq!(classify(""), Line::Other);
        assert_eq!(classify("plain text"), Line::Other);
    }

    #[test]
    fn root_tag_matches() {
        assert_eq!(
            root_tag(r#"<CustomObject xmlns="http://soap.sforce.com/2006/04/metadata">"#),
            Some("CustomObject")
        );
        assert_eq!(root_tag("<CustomObject>"), None);
    }
}
