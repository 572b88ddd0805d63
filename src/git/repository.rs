use crate::audit::AuditLogger;
use crate::config::Config;
use crate::error::{GitError, GitResult};
use crate::git::executor::{CommandOutput, CommandRecord, GitExecutor};
use crate::git::model::{Commit, File};
use crate::git::parser;
use crate::git::version::GitVersion;
use std::cell::Ref;
use std::env;
use std::path::{Path, PathBuf};

/// A git repository driven through the `git` executable
///
/// One handle serves one caller: the command history is not synchronized,
/// so a `Repository` cannot be shared between threads.
#[derive(Debug)]
pub struct Repository {
    path: PathBuf,
    executor: GitExecutor,
    git_binary: String,
    mainline_branch: String,
    remote: String,
}

impl Repository {
    /// Detect git repository from current working directory
    pub fn discover() -> GitResult<Self> {
        let current_dir = env::current_dir()?;
        Self::discover_from(&current_dir)
    }

    /// Detect git repository starting from a specific directory
    pub fn discover_from<P: AsRef<Path>>(start_path: P) -> GitResult<Self> {
        let mut current = start_path.as_ref().to_path_buf();

        loop {
            if current.join(".git").exists() {
                return Ok(Self::new(current));
            }

            // Move up to parent directory
            if !current.pop() {
                return Err(GitError::NotARepository);
            }
        }
    }

    /// Create a Repository with the default configuration
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let config = Config::default_config();
        let path = path.as_ref().to_path_buf();
        let executor = GitExecutor::with_binary(&path, &config.git.binary);

        Self {
            path,
            executor,
            git_binary: config.git.binary,
            mainline_branch: config.git.mainline_branch,
            remote: config.git.remote,
        }
    }

    /// Create a Repository using the given configuration
    pub fn with_config<P: AsRef<Path>>(path: P, config: &Config) -> GitResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut executor = GitExecutor::with_binary(&path, &config.git.binary);

        if config.audit.log_commands {
            let audit = match &config.audit.log_path {
                Some(log_path) => AuditLogger::with_path(log_path)?,
                None => AuditLogger::new()?,
            };
            executor = executor.with_audit_logger(audit);
        }

        Ok(Self {
            path,
            executor,
            git_binary: config.git.binary.clone(),
            mainline_branch: config.git.mainline_branch.clone(),
            remote: config.git.remote.clone(),
        })
    }

    /// Get the repository path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the branch merges go through
    pub fn mainline_branch(&self) -> &str {
        &self.mainline_branch
    }

    /// Commands run so far that did not write to stderr
    pub fn history(&self) -> Ref<'_, [CommandRecord]> {
        self.executor.history()
    }

    /// Check that the configured git executable is recent enough
    pub fn check_git_version(&self) -> GitResult<GitVersion> {
        GitVersion::require_minimum(&self.git_binary)
    }

    /// Create an empty repository whose first branch is the mainline
    ///
    /// Fails with `GitVersionTooOld` before touching the directory when the
    /// configured git predates `--initial-branch`.
    pub fn init(&self) -> GitResult<()> {
        self.check_git_version()?;
        let initial_branch = format!("--initial-branch={}", self.mainline_branch);
        self.executor
            .execute_args(&["init", "--quiet", initial_branch.as_str()])?;
        Ok(())
    }

    /// Set the committer identity for this repository only
    pub fn configure_user(&self, name: &str, email: &str) -> GitResult<()> {
        self.executor.execute_args(&["config", "user.name", name])?;
        self.executor.execute_args(&["config", "user.email", email])?;
        Ok(())
    }

    /// Create or reset `branch` and check it out
    pub fn switch_branch(&self, branch: &str) -> GitResult<()> {
        self.executor
            .execute_args(&["checkout", "--quiet", "-B", branch])?;
        Ok(())
    }

    pub fn tag_head(&self, name: &str) -> GitResult<()> {
        self.executor.execute_args(&["tag", "--end-of-options", name])?;
        Ok(())
    }

    /// Commit ids reachable from `branch`, oldest first
    pub fn get_commit_ids(&self, branch: &str) -> GitResult<Vec<String>> {
        let output = self
            .executor
            .execute_args(&["log", "--pretty=%H", "--end-of-options", branch])?;
        Ok(parser::parse_commit_ids(&output.stdout))
    }

    /// Commits reachable from `branch`, oldest first
    ///
    /// The oldest commit is where the branch forked off, so its file list is
    /// left empty.
    pub fn get_commits(&self, branch: &str) -> GitResult<Vec<Commit>> {
        let ids = self.get_commit_ids(branch)?;
        let mut commits = Vec::with_capacity(ids.len());

        for (i, id) in ids.into_iter().enumerate() {
            let files = if i == 0 {
                Vec::new()
            } else {
                self.get_files_in_commit(&id)?
            };
            commits.push(Commit::new(id, files));
        }

        Ok(commits)
    }

    pub fn get_files_in_commit(&self, commit_id: &str) -> GitResult<Vec<File>> {
        let output = self.executor.execute_args(&[
            "diff-tree",
            "--no-commit-id",
            "--name-status",
            "-r",
            "--end-of-options",
            commit_id,
        ])?;
        parser::parse_committed_file_list(&output.stdout, commit_id)
    }

    /// Working-tree changes, without commit ids
    pub fn get_uncommitted_files(&self) -> GitResult<Vec<File>> {
        let output = self.executor.execute("status --short")?;
        parser::parse_working_tree_status(&output.stdout)
    }

    pub fn add_file(&self, path: &str) -> GitResult<()> {
        self.executor.execute_args(&["add", "--", path])?;
        Ok(())
    }

    /// Stage `files` and commit them with `message`
    ///
    /// The returned commit carries the new HEAD id, and every file is stamped
    /// with it. When nothing is staged git exits non-zero without writing to
    /// stderr: no commit is made and the id returned is the unchanged HEAD.
    pub fn commit(&self, files: &[File], message: &str) -> GitResult<Commit> {
        for file in files {
            self.add_file(&file.filename)?;
        }
        let output = self.executor.execute_args(&["commit", "-m", message])?;
        if !output.success {
            tracing::warn!(
                exit_code = output.exit_code,
                stdout = %output.stdout.trim(),
                "nothing committed, HEAD unchanged"
            );
        }

        let commit_id = self.get_head_commit_id()?;
        let files = files
            .iter()
            .map(|file| file.with_commit_id(commit_id.as_str()))
            .collect();

        Ok(Commit::new(commit_id, files))
    }

    /// Push every branch to the remote
    pub fn push_all(&self) -> GitResult<()> {
        self.executor
            .execute_args(&["push", "--quiet", "--all", self.remote.as_str()])?;
        Ok(())
    }

    pub fn pull(&self) -> GitResult<()> {
        self.executor.execute("pull --quiet")?;
        Ok(())
    }

    /// Merge `branch` into the mainline branch
    ///
    /// With `remote`, `<remote>/<branch>` is fetched first and merged instead.
    /// Returns `false` if the merge wrote to stderr or exited non-zero, which
    /// is how git reports content conflicts. The working tree is then left
    /// mid-merge. A failed fetch is an error and no merge is attempted.
    pub fn merge(&self, branch: &str, remote: bool) -> GitResult<bool> {
        self.switch_to_mainline()?;

        let output = if remote {
            let fetch = self.executor.execute_unchecked_args(&[
                "fetch",
                "--quiet",
                "--end-of-options",
                self.remote.as_str(),
                branch,
            ])?;
            if !fetch.stderr.is_empty() {
                return Err(GitError::FetchFailed {
                    branch: branch.to_string(),
                    stderr: fetch.stderr,
                });
            }

            let remote_branch = format!("{}/{}", self.remote, branch);
            let message = format!("Merge remote-tracking branch '{}'", remote_branch);
            self.executor.execute_unchecked_args(&[
                "merge",
                "--no-edit",
                "-m",
                message.as_str(),
                "--end-of-options",
                remote_branch.as_str(),
            ])?
        } else {
            self.executor.execute_unchecked_args(&[
                "merge",
                "--no-edit",
                "--end-of-options",
                branch,
            ])?
        };

        Ok(Self::merged_cleanly(branch, &output))
    }

    /// Merge `branch` into the mainline, resolving conflicts in its favor
    ///
    /// Returns `false` under the same conditions as [`Repository::merge`].
    pub fn merge_theirs(&self, branch: &str) -> GitResult<bool> {
        self.switch_to_mainline()?;
        let output = self.executor.execute_unchecked_args(&[
            "merge",
            "--no-edit",
            "-s",
            "recursive",
            "-Xtheirs",
            "--end-of-options",
            branch,
        ])?;
        Ok(Self::merged_cleanly(branch, &output))
    }

    fn merged_cleanly(branch: &str, output: &CommandOutput) -> bool {
        let clean = output.success && output.stderr.is_empty();
        if !clean {
            tracing::warn!(
                branch = branch,
                exit_code = output.exit_code,
                "merge did not complete"
            );
        }
        clean
    }

    /// Whether `branch` has been merged into the mainline
    pub fn is_merged(&self, branch: &str) -> GitResult<bool> {
        let output = self
            .executor
            .execute_args(&["branch", "--merged", self.mainline_branch.as_str()])?;
        let merged = parser::parse_name_list(&output.stdout, 2)?;
        Ok(merged.iter().any(|name| name == branch))
    }

    /// Hard-reset the current branch to `reference`
    pub fn reset(&self, reference: &str) -> GitResult<()> {
        self.executor
            .execute_args(&["reset", "--quiet", "--hard", "--end-of-options", reference])?;
        Ok(())
    }

    /// Force-delete `branch`
    pub fn remove_branch(&self, branch: &str) -> GitResult<()> {
        self.executor
            .execute_args(&["branch", "--quiet", "-D", "--end-of-options", branch])?;
        Ok(())
    }

    pub fn list_branches(&self) -> GitResult<Vec<String>> {
        let output = self.executor.execute("branch")?;
        // Each line starts with "* " or "  "
        parser::parse_name_list(&output.stdout, 2)
    }

    pub fn get_tag_list(&self) -> GitResult<Vec<String>> {
        let output = self.executor.execute("tag")?;
        parser::parse_name_list(&output.stdout, 0)
            .map_err(|e| GitError::ParseError(format!("Get tag list failed: {}", e)))
    }

    /// Contents of `path` at `commit_id`, minus one trailing newline
    pub fn get_file_contents(&self, commit_id: &str, path: &str) -> GitResult<String> {
        let object = format!("{}:{}", commit_id, path);
        let output = self
            .executor
            .execute_args(&["show", "--end-of-options", object.as_str()])?;

        let mut contents = output.stdout;
        if contents.ends_with('\n') {
            contents.pop();
        }
        Ok(contents)
    }

    pub fn current_branch(&self) -> GitResult<String> {
        let output = self.executor.execute("rev-parse --abbrev-ref HEAD")?;
        Ok(output.stdout.trim().to_string())
    }

    pub fn get_head_commit_id(&self) -> GitResult<String> {
        let output = self.executor.execute("rev-parse HEAD")?;
        Ok(output.stdout.replace('\n', ""))
    }

    fn switch_to_mainline(&self) -> GitResult<()> {
        let current = self.current_branch()?;
        if current != self.mainline_branch {
            tracing::warn!(
                current = %current,
                mainline = %self.mainline_branch,
                "not on the mainline branch, switching"
            );
            // Plain checkout, `-B` would move the mainline to the current HEAD
            self.executor
                .execute_args(&["checkout", "--quiet", self.mainline_branch.as_str()])?;
        }
        Ok(())
    }

    /// Get the git executor for this repository
    pub fn executor(&self) -> &GitExecutor {
        &self.executor
    }
}
