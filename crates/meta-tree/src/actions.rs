//! The merge-action tree.
//!
//! Diff rows addressed at one file are loaded into a tree whose nodes
//! mirror the file's section nesting. Each node may carry a replacement
//! payload, a delete marker, and a list of pending creates; children are
//! keyed by `(section_name, key)`. The parser consumes entries as it
//! passes their paths, so whatever is left after the parse is exactly the
//! set of actions that found no anchor.
//!
//! Path levels accept both the fully qualified `SNAME=SVALUE` form and a
//! bare `SVALUE`; a `#CONTENTS#` tail addresses the whole block and is
//! normalized onto the parent node at insert time.

/// One path level of a merge action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelKey {
    /// Section name; empty when the level was given as a bare value or a
    /// `#…#` special.
    pub name: String,
    pub value: String,
}

impl LevelKey {
    /// Parse a level string (`fields=Foo__c`, `Foo__c`, `#PARAMS#`).
    pub fn parse(level: &str) -> Self {
        if level.starts_with('#') {
            return Self {
                name: String::new(),
                value: level.to_string(),
            };
        }
        match level.split_once('=') {
            Some((name, value)) => Self {
                name: name.to_string(),
                value: value.to_string(),
            },
            None => Self {
                name: String::new(),
                value: level.to_string(),
            },
        }
    }

    /// Whether this level addresses the given `(section, key)` pair. A
    /// level with no name matches on value alone.
    pub fn matches(&self, name: &str, value: &str) -> bool {
        self.value == value && (self.name.is_empty() || self.name == name)
    }
}

/// A pending `Create Item`.
#[derive(Debug, Clone)]
pub struct CreateEntry {
    /// Section the new entry belongs to; may be empty for bare-value rows.
    pub section: String,
    pub sort_key: String,
    pub content: String,
}

/// One node of the action tree.
#[derive(Debug, Clone, Default)]
pub struct ActionNode {
    /// `##CHANGE##`: replace the block's content with this payload.
    pub change: Option<String>,
    /// `##DELETE##`: drop the block.
    pub delete: bool,
    /// `##CREATE##`: entries to insert under this block.
    pub creates: Vec<CreateEntry>,
    pub children: Vec<(LevelKey, ActionNode)>,
}

impl ActionNode {
    /// Whether every action in this subtree has been consumed.
    pub fn is_empty(&self) -> bool {
        self.change.is_none()
            && !self.delete
            && self.creates.is_empty()
            && self.children.iter().all(|(_, child)| child.is_empty())
    }

    /// Detach the child addressing `(name, value)`, if any.
    pub fn remove_child(&mut self, name: &str, value: &str) -> Option<ActionNode> {
        let idx = self
            .children
            .iter()
            .position(|(key, _)| key.matches(name, value))?;
        Some(self.children.remove(idx).1)
    }

    /// Take the replacement payload of the child at `(name, value)`.
    pub fn take_child_change(&mut self, name: &str, value: &str) -> Option<String> {
        self.children
            .iter_mut()
            .find(|(key, _)| key.matches(name, value))
            .and_then(|(_, child)| child.change.take())
    }

    /// Remove and return a pending create matching `(section, key)`. Used
    /// to detect a target that is already up to date.
    pub fn take_create(&mut self, section: &str, sort_key: &str) -> Option<CreateEntry> {
        let idx = self.creates.iter().position(|c| {
            c.sort_key == sort_key && (c.section.is_empty() || c.section == section)
        })?;
        Some(self.creates.remove(idx))
    }

    fn ensure(&mut self, key: LevelKey) -> &mut ActionNode {
        let pos = self.children.iter().position(|(k, _)| *k == key);
        let idx = match pos {
            Some(idx) => idx,
            None => {
                self.children.push((key, ActionNode::default()));
                self.children.len() - 1
            }
        };
        &mut self.children[idx].1
    }

    fn ensure_path(&mut self, levels: &[LevelKey]) -> &mut ActionNode {
        let mut node = self;
        for level in levels {
            node = node.ensure(level.clone());
        }
        node
    }

    /// Bind an `Update Item` at the given path.
    pub fn insert_change(&mut self, levels: &[&str], payload: String) {
        let keys = normalize(levels);
        self.ensure_path(&keys).change = Some(payload);
    }

    /// Bind a `Delete Item` at the given path.
    pub fn insert_delete(&mut self, levels: &[&str]) {
        let keys = normalize(levels);
        self.ensure_path(&keys).delete = true;
    }

    /// Bind a `Create Item`: the last level names the new entry, the rest
    /// locate its parent. A `#CONTENTS#` tail shifts the entry level one up.
    pub fn insert_create(&mut self, levels: &[&str], payload: String) {
        let mut keys: Vec<LevelKey> = levels.iter().map(|l| LevelKey::parse(l)).collect();
        if keys.last().is_some_and(|k| k.value == "#CONTENTS#") {
            keys.pop();
        }
        let Some(entry) = keys.pop() else {
            return;
        };
        let node = self.ensure_path(&keys);
        node.creates.push(CreateEntry {
            section: entry.name,
            sort_key: entry.value,
            content: payload,
        });
    }

    /// Describe every unconsumed action in this subtree, prefixing each
    /// with its path.
    pub fn leftovers(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.collect_leftovers(&mut Vec::new(), &mut out);
        out
    }

    fn collect_leftovers(&self, path: &mut Vec<String>, out: &mut Vec<String>) {
        let at = if path.is_empty() {
            "top level".to_string()
        } else {
            path.join("/")
        };
        if self.change.is_some() {
            out.push(format!("unapplied change at {at}"));
        }
        if self.delete {
            out.push(format!("unapplied delete at {at}"));
        }
        for create in &self.creates {
            out.push(format!(
                "unapplied create {}={} at {at}",
                create.section, create.sort_key
            ));
        }
        for (key, child) in &self.children {
            let level = if key.name.is_empty() {
                key.value.clone()
            } else {
                format!("{}={}", key.name, key.value)
            };
            path.push(level);
            child.collect_leftovers(path, out);
            path.pop();
        }
    }
}

/// Parse levels, folding a `#CONTENTS#` tail onto its parent.
fn normalize(levels: &[&str]) -> Vec<LevelKey> {
    let mut keys: Vec<LevelKey> = levels.iter().map(|l| LevelKey::parse(l)).collect();
    if keys.len() > 1 && keys.last().is_some_and(|k| k.value == "#CONTENTS#") {
        keys.pop();
    }
    keys
}
