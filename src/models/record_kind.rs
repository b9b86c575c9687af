use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Discriminates the two shapes a record can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    /// Free-form note.
    #[default]
    Note,
    /// Task that can be marked completed.
    Task,
}

impl RecordKind {
    /// Returns the lowercase storage name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Note => "note",
            Self::Task => "task",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown record kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown record kind '{0}' (expected 'note' or 'task')")]
pub struct ParseKindError(pub String);

impl FromStr for RecordKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "note" | "notes" => Ok(Self::Note),
            "task" | "tasks" => Ok(Self::Task),
            _ => Err(ParseKindError(s.to_string())),
        }
    }
}
