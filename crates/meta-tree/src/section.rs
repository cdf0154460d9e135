//! The section tree built from one metadata file.
//!
//! Content is always the exact original bytes, line terminators included,
//! so that reconstruction is byte-identical when nothing reorders.

/// What kind of block a section is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    /// Everything up to and including the root `<TYPE xmlns=…>` line.
    Header,
    /// A repeatable `<tag>…</tag>` block whose entries sort and merge
    /// individually.
    Standard,
    /// A self-closing `<tag/>` line.
    Empty,
    /// A single primitive `<tag>value</tag>` line.
    Params,
    /// The closing `</TYPE>` line plus any trailing bytes.
    End,
}

/// One entry (sub-section) of a section.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Sort key derived from the section's rule; `#SINGLE#`/`#PARAM#` for
    /// the single entry of Empty/Params sections.
    pub sort_key: String,
    /// Exact byte range of the original file covering this entry.
    pub content: String,
}

/// An ordered run of entries under one tag name.
#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub kind: SectionKind,
    pub entries: Vec<Entry>,
}

impl Section {
    /// A section holding exactly one entry.
    pub fn single(
        name: impl Into<String>,
        kind: SectionKind,
        sort_key: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            entries: vec![Entry {
                sort_key: sort_key.into(),
                content: content.into(),
            }],
        }
    }
}

/// A fully parsed metadata file.
#[derive(Debug, Clone)]
pub struct MetadataTree {
    /// The root tag name.
    pub metadata_type: String,
    /// The file stem.
    pub metadata_name: String,
    pub sections: Vec<Section>,
}
