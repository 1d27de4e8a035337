use serde::{Deserialize, Serialize};

use crate::ids::GroupId;

/// Partial payload of a single-row update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ItemPatch {
    Rename { name: String },
    SetFlag { flag: String, value: bool },
    AssignGroup { group: Option<GroupId> },
    SetNotes { notes: String },
}

impl ItemPatch {
    pub fn rename(name: impl Into<String>) -> Self {
        Self::Rename { name: name.into() }
    }

    pub fn set_flag(flag: impl Into<String>, value: bool) -> Self {
        Self::SetFlag {
            flag: flag.into(),
            value,
        }
    }

    pub fn assign_group(group: Option<GroupId>) -> Self {
        Self::AssignGroup { group }
    }

    pub fn set_notes(notes: impl Into<String>) -> Self {
        Self::SetNotes {
            notes: notes.into(),
        }
    }

    /// Short operation name for logs.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Rename { .. } => "rename",
            Self::SetFlag { .. } => "set_flag",
            Self::AssignGroup { .. } => "assign_group",
            Self::SetNotes { .. } => "set_notes",
        }
    }
}
