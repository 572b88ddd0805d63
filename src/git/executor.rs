use crate::audit::AuditLogger;
use crate::error::{GitError, GitResult};
use std::cell::{Ref, RefCell};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

/// Result of executing a git command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

/// A command that completed without writing to stderr
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRecord {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

/// A command that wrote to stderr, along with everything run before it
#[derive(Debug, Clone)]
pub struct CommandFailure {
    pub command: String,
    pub stderr: String,
    pub exit_code: i32,
    /// Previously recorded commands, oldest first
    pub previous: Vec<CommandRecord>,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "\n{}\n{}[exit code {}]\n",
            self.command, self.stderr, self.exit_code
        )?;
        if !self.previous.is_empty() {
            writeln!(f, "Previous git commands (most recent is on top):")?;
            for record in self.previous.iter().rev() {
                write!(
                    f,
                    "\n{}\nstdout: {}\nstderr: {}",
                    record.command, record.stdout, record.stderr
                )?;
            }
        }
        Ok(())
    }
}

/// Executes git commands against one repository
///
/// Every command runs as `git --git-dir=<repo>/.git --work-tree=<repo> ...`.
/// Successful commands are kept in an append-only history which is dumped
/// into the error message when a later command fails.
#[derive(Debug)]
pub struct GitExecutor {
    git_binary: String,
    repo_path: PathBuf,
    history: RefCell<Vec<CommandRecord>>,
    audit: Option<AuditLogger>,
}

impl GitExecutor {
    /// Create a new GitExecutor for the given repository path
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Self {
        Self::with_binary(repo_path, "git")
    }

    /// Create a GitExecutor that runs a specific git executable
    pub fn with_binary<P: AsRef<Path>>(repo_path: P, git_binary: &str) -> Self {
        Self {
            git_binary: git_binary.to_string(),
            repo_path: repo_path.as_ref().to_path_buf(),
            history: RefCell::new(Vec::new()),
            audit: None,
        }
    }

    /// Append every executed command to an audit log
    pub fn with_audit_logger(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Execute a git command and return the output
    ///
    /// The command string should not include "git" prefix and is split on
    /// whitespace. Use [`GitExecutor::execute_args`] when an argument may
    /// itself contain whitespace.
    /// Example: executor.execute("status --short")
    pub fn execute(&self, command: &str) -> GitResult<CommandOutput> {
        let args: Vec<&str> = command.split_whitespace().collect();
        self.execute_args(args.as_slice())
    }

    /// Execute a git command given as separate arguments
    ///
    /// Fails with [`GitError::CommandFailed`] if the command wrote anything to
    /// stderr.
    pub fn execute_args<S: AsRef<str>>(&self, args: &[S]) -> GitResult<CommandOutput> {
        let (command, output) = self.run(args)?;

        if !output.stderr.is_empty() {
            tracing::warn!(
                command = %command,
                exit_code = output.exit_code,
                stderr = %output.stderr.trim(),
                "git command failed"
            );
            self.audit_failure(&command, &output);
            return Err(GitError::CommandFailed(CommandFailure {
                command,
                stderr: output.stderr,
                exit_code: output.exit_code,
                previous: self.history.borrow().clone(),
            }));
        }

        Ok(output)
    }

    /// Execute a git command without treating stderr as a failure
    ///
    /// Only spawn errors are returned as `Err`. The command is recorded in the
    /// history only if it wrote nothing to stderr.
    pub fn execute_unchecked_args<S: AsRef<str>>(&self, args: &[S]) -> GitResult<CommandOutput> {
        let (command, output) = self.run(args)?;
        if !output.stderr.is_empty() {
            tracing::debug!(command = %command, stderr = %output.stderr.trim(), "git wrote to stderr");
            self.audit_failure(&command, &output);
        }
        Ok(output)
    }

    fn run<S: AsRef<str>>(&self, args: &[S]) -> GitResult<(String, CommandOutput)> {
        if args.is_empty() {
            return Err(GitError::ParseError("Empty command".to_string()));
        }

        let full_args: Vec<String> = self
            .base_args()
            .into_iter()
            .chain(args.iter().map(|a| a.as_ref().to_string()))
            .collect();
        let command = self.command_line(&full_args);
        tracing::debug!(command = %command, "running git command");

        let output = Command::new(&self.git_binary)
            .args(&full_args)
            .current_dir(&self.repo_path)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| GitError::SpawnFailed {
                command: command.clone(),
                source,
            })?;

        let output = self.process_output(output);
        if output.stderr.is_empty() {
            self.audit_success(&command, output.exit_code);
            self.history.borrow_mut().push(CommandRecord {
                command: command.clone(),
                stdout: output.stdout.clone(),
                stderr: output.stderr.clone(),
                exit_code: output.exit_code,
            });
        }

        Ok((command, output))
    }

    /// Process command output into CommandOutput struct
    fn process_output(&self, output: Output) -> CommandOutput {
        CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code().unwrap_or(-1),
            success: output.status.success(),
        }
    }

    fn base_args(&self) -> [String; 2] {
        [
            format!("--git-dir={}", self.repo_path.join(".git").display()),
            format!("--work-tree={}", self.repo_path.display()),
        ]
    }

    fn command_line(&self, full_args: &[String]) -> String {
        std::iter::once(self.git_binary.as_str())
            .chain(full_args.iter().map(String::as_str))
            .map(|arg| {
                if arg.chars().any(char::is_whitespace) {
                    format!("\"{}\"", arg)
                } else {
                    arg.to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn audit_success(&self, command: &str, exit_code: i32) {
        if let Some(audit) = &self.audit {
            if let Err(e) = audit.log_command(command, &self.repo_path, exit_code) {
                tracing::warn!(error = %e, "failed to write audit log");
            }
        }
    }

    fn audit_failure(&self, command: &str, output: &CommandOutput) {
        if let Some(audit) = &self.audit {
            if let Err(e) =
                audit.log_failure(command, &output.stderr, &self.repo_path, output.exit_code)
            {
                tracing::warn!(error = %e, "failed to write audit log");
            }
        }
    }

    /// Commands recorded so far, oldest first
    pub fn history(&self) -> Ref<'_, [CommandRecord]> {
        Ref::map(self.history.borrow(), Vec::as_slice)
    }

    /// Get the repository path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }
}
