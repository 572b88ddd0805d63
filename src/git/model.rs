use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GitError;

/// Kind of change a file went through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    Add,
    Delete,
    Rename,
    Modify,
    Copy,
}

impl FromStr for Action {
    type Err = GitError;

    /// Parse a status code as printed by `git status --short` or
    /// `git diff-tree --name-status`
    fn from_str(code: &str) -> Result<Self, Self::Err> {
        match code {
            "A" | "??" => Ok(Action::Add),
            "D" => Ok(Action::Delete),
            "R" | "RM" => Ok(Action::Rename),
            "M" => Ok(Action::Modify),
            "C" | "AM" => Ok(Action::Copy),
            _ => Err(GitError::UnknownAction(code.to_string())),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Add => "ADD",
            Action::Delete => "DELETE",
            Action::Rename => "RENAME",
            Action::Modify => "MODIFY",
            Action::Copy => "COPY",
        };
        f.write_str(name)
    }
}

/// A changed file, either committed or still in the working tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub filename: String,
    pub action: Action,
    /// `None` for uncommitted working-tree entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_id: Option<String>,
}

impl File {
    pub fn new(filename: impl Into<String>, action: Action) -> Self {
        Self {
            filename: filename.into(),
            action,
            commit_id: None,
        }
    }

    /// Copy of this file stamped with the owning commit
    pub fn with_commit_id(&self, commit_id: impl Into<String>) -> Self {
        Self {
            commit_id: Some(commit_id.into()),
            ..self.clone()
        }
    }
}

/// A commit and the files it changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub files: Vec<File>,
}

impl Commit {
    pub fn new(id: impl Into<String>, files: Vec<File>) -> Self {
        Self {
            id: id.into(),
            files,
        }
    }
}
