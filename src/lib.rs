pub mod audit;
pub mod config;
pub mod error;
pub mod git;

// Re-export commonly used types for convenience
pub use config::{Config, ConfigError};
pub use error::{GitError, GitResult};
pub use git::{Action, Commit, CommandFailure, CommandRecord, File, GitVersion, Repository};
