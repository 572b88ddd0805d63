use crate::error::{GitError, GitResult};
use std::fmt;
use std::process::Command;
use std::str::FromStr;

/// A `git --version` release number
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Oldest release `init` can drive: `--initial-branch` shipped in 2.28
    pub const MINIMUM: GitVersion = GitVersion::new(2, 28, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Ask `git_binary` for its version
    pub fn of_binary(git_binary: &str) -> GitResult<Self> {
        let output = Command::new(git_binary)
            .arg("--version")
            .output()
            .map_err(|e| {
                GitError::GitVersionDetectionFailed(format!("{}: {}", git_binary, e))
            })?;

        if !output.status.success() {
            return Err(GitError::GitVersionDetectionFailed(format!(
                "{} --version exited with {}",
                git_binary, output.status
            )));
        }

        String::from_utf8_lossy(&output.stdout).parse()
    }

    /// Version of `git_binary`, or `GitVersionTooOld` below [`GitVersion::MINIMUM`]
    pub fn require_minimum(git_binary: &str) -> GitResult<Self> {
        let version = Self::of_binary(git_binary)?;
        if !version.meets_minimum() {
            tracing::warn!(binary = git_binary, version = %version, "git is too old");
            return Err(GitError::GitVersionTooOld(version.to_string()));
        }
        Ok(version)
    }

    pub fn meets_minimum(&self) -> bool {
        *self >= Self::MINIMUM
    }
}

/// Digits at the start of a version component, so "0-rc1" reads as 0
fn leading_number(component: &str) -> Option<u32> {
    let end = component
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(component.len());
    component[..end].parse().ok()
}

impl FromStr for GitVersion {
    type Err = GitError;

    /// Accepts `git --version` output, e.g. "git version 2.39.3 (Apple Git-145)"
    fn from_str(s: &str) -> GitResult<Self> {
        let number = s
            .trim()
            .strip_prefix("git version ")
            .and_then(|rest| rest.split_whitespace().next())
            .ok_or_else(|| GitError::ParseError(format!("Not a git version line: {}", s.trim())))?;

        let mut components = number.split('.');
        let mut next_strict = |name: &str| {
            components
                .next()
                .and_then(|c| c.parse::<u32>().ok())
                .ok_or_else(|| GitError::ParseError(format!("Bad {} in git version {}", name, number)))
        };

        let major = next_strict("major")?;
        let minor = next_strict("minor")?;
        let patch = components.next().and_then(leading_number).unwrap_or(0);

        Ok(Self::new(major, minor, patch))
    }
}

impl fmt::Display for GitVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
