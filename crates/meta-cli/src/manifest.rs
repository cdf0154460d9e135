//! Deployment manifest emitters (`package.xml`, `destructiveChanges.xml`).

use std::collections::{BTreeMap, BTreeSet};

/// Members per metadata type.
pub type Members = BTreeMap<String, BTreeSet<String>>;

/// Render a manifest. Both the package and the destructive-changes
/// manifests share this layout; each is fed its own member map.
pub fn manifest_xml(members: &Members, api_version: &str) -> String {
    let mut out = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<Package xmlns=\"http://soap.sforce.com/2006/04/metadata\">\n");
    for (metadata_type, names) in members {
        out.push_str("    <types>\n");
        for name in names {
            out.push_str(&format!("        <members>{name}</members>\n"));
        }
        out.push_str(&format!("        <name>{metadata_type}</name>\n"));
        out.push_str("    </types>\n");
    }
    out.push_str(&format!("    <version>{api_version}</version>\n"));
    out.push_str("</Package>\n");
    out
}

/// Add one `TYPE=NAME` metadata identity to a member map.
pub fn add_member(members: &mut Members, metadata: &str) {
    if let Some((metadata_type, name)) = metadata.split_once('=') {
        members
            .entry(metadata_type.to_string())
            .or_default()
            .insert(name.to_string());
    }
}
