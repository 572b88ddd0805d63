use std::io;
use thiserror::Error;

use crate::git::executor::CommandFailure;

/// Errors that can occur during git operations
#[derive(Debug, Error)]
pub enum GitError {
    #[error("Not a git repository")]
    NotARepository,

    /// The command ran but wrote to stderr
    #[error("Git command failed: {0}")]
    CommandFailed(CommandFailure),

    #[error("Failed to execute '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Unknown change type {0}")]
    UnknownAction(String),

    #[error("Failed to list files in commit {commit_id}: {source}")]
    ParseContext {
        commit_id: String,
        #[source]
        source: Box<GitError>,
    },

    #[error("Failed to fetch remote branch before merging '{branch}': {stderr}")]
    FetchFailed { branch: String, stderr: String },

    #[error("Failed to parse git output: {0}")]
    ParseError(String),

    #[error("Git version {0} is too old. Minimum required: 2.28")]
    GitVersionTooOld(String),

    #[error("Failed to detect git version: {0}")]
    GitVersionDetectionFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;
