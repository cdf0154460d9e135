//! The diff-row model shared by the differ, the CSV reports, and the
//! merge driver.

use std::fmt;

/// Canonical column names of a diff log, in writing order. Readers also
/// accept the `Snake_Case__c` variant of each (see [`snake_variant`]),
/// and any number of trailing `Old Value` columns.
pub const REQUIRED_COLUMNS: [&str; 14] = [
    "Developer Work Log Name",
    "Request Time Stamp",
    "Work Team",
    "Developer Name",
    "User Story",
    "Merge Action",
    "Metadata",
    "Path",
    "L1 Key",
    "L2 Key",
    "L3 Key",
    "L4 Key",
    "New Value",
    "Old Value",
];

/// The alternative column spelling: spaces become underscores and the
/// custom-field suffix is appended (`User Story` → `User_Story__c`).
pub fn snake_variant(column: &str) -> String {
    format!("{}__c", column.replace(' ', "_"))
}

/// One merge action. Unknown spellings survive reading so the merge
/// driver can report them per row instead of rejecting the whole log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAction {
    CreateFile,
    UpdateFile,
    DeleteFile,
    CreateItem,
    UpdateItem,
    DeleteItem,
    Unknown(String),
}

impl MergeAction {
    pub fn parse(text: &str) -> Self {
        match text {
            "Create File" => Self::CreateFile,
            "Update File" => Self::UpdateFile,
            "Delete File" => Self::DeleteFile,
            "Create Item" => Self::CreateItem,
            "Update Item" => Self::UpdateItem,
            "Delete Item" => Self::DeleteItem,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether this action addresses the whole file rather than an item.
    pub fn is_file_level(&self) -> bool {
        matches!(
            self,
            Self::CreateFile | Self::UpdateFile | Self::DeleteFile
        )
    }
}

impl fmt::Display for MergeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::CreateFile => "Create File",
            Self::UpdateFile => "Update File",
            Self::DeleteFile => "Delete File",
            Self::CreateItem => "Create Item",
            Self::UpdateItem => "Update Item",
            Self::DeleteItem => "Delete Item",
            Self::Unknown(other) => other,
        };
        f.write_str(text)
    }
}

/// Request-level metadata stamped onto every row of one diff run.
#[derive(Debug, Clone, Default)]
pub struct RowMeta {
    pub log_name: String,
    pub timestamp: String,
    pub work_team: String,
    pub developer: String,
    pub user_story: String,
}

/// One semantic change between branches.
#[derive(Debug, Clone)]
pub struct DiffRow {
    pub log_name: String,
    /// Textual timestamps compare chronologically (`%Y-%m-%d %H:%M:%S`).
    pub timestamp: String,
    pub work_team: String,
    pub developer: String,
    pub user_story: String,
    pub action: MergeAction,
    /// `TYPE=NAME` of the artifact.
    pub metadata: String,
    /// Repository-relative file path.
    pub path: String,
    /// `L1..L4` path levels; unused levels are empty.
    pub keys: [String; 4],
    pub new_value: String,
    /// Old value per target branch; index 0 is the primary target.
    pub old_values: Vec<String>,
}

impl DiffRow {
    pub fn new(meta: &RowMeta, action: MergeAction, metadata: String, path: String) -> Self {
        Self {
            log_name: meta.log_name.clone(),
            timestamp: meta.timestamp.clone(),
            work_team: meta.work_team.clone(),
            developer: meta.developer.clone(),
            user_story: meta.user_story.clone(),
            action,
            metadata,
            path,
            keys: Default::default(),
            new_value: String::new(),
            old_values: Vec::new(),
        }
    }

    /// The non-empty key levels.
    pub fn levels(&self) -> Vec<&str> {
        self.keys
            .iter()
            .map(String::as_str)
            .filter(|k| !k.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_variants() {
        assert_eq!(
            snake_variant("Developer Work Log Name"),
            "Developer_Work_Log_Name__c"
        );
        assert_eq!(snake_variant("L1 Key"), "L1_Key__c");
        assert_eq!(snake_variant("Metadata"), "Metadata__c");
    }

    #[test]
    fn action_round_trip() {
        for text in [
            "Create File",
            "Update File",
            "Delete File",
            "Create Item",
            "Update Item",
            "Delete Item",
        ] {
            assert_eq!(MergeAction::parse(text).to_string(), text);
        }
    }

    #[test]
    fn unknown_action_is_preserved() {
        let action = MergeAction::parse("Rename Item");
        assert_eq!(action, MergeAction::Unknown("Rename Item".to_string()));
        assert_eq!(action.to_string(), "Rename Item");
        assert!(!action.is_file_level());
    }

    #[test]
    fn levels_skip_empty_slots() {
        let meta = RowMeta::default();
        let mut row = DiffRow::new(
            &meta,
            MergeAction::CreateItem,
            "CustomObject=Account".to_string(),
            "objects/Account.object".to_string(),
        );
        row.keys[0] = "fields=Foo__c".to_string();
        row.keys[1] = "#CONTENTS#".to_string();
        assert_eq!(row.levels(), vec!["fields=Foo__c", "#CONTENTS#"]);
    }
}
