pub mod executor;
pub mod model;
pub mod parser;
pub mod repository;
pub mod version;

// Re-export commonly used types
pub use executor::{CommandFailure, CommandOutput, CommandRecord, GitExecutor};
pub use model::{Action, Commit, File};
pub use parser::{
    parse_change_action, parse_commit_ids, parse_committed_file_list, parse_name_list,
    parse_working_tree_status, split_non_empty_lines,
};
pub use repository::Repository;
pub use version::GitVersion;
