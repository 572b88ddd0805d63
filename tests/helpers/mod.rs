#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn configure_user(repo_path: &Path) {
    git(repo_path, &["config", "user.name", "Test User"]);
    git(repo_path, &["config", "user.email", "test@example.com"]);
}

/// Helper to create a test git repository whose first branch is master
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    git(&repo_path, &["init", "--quiet", "--initial-branch=master"]);
    configure_user(&repo_path);

    (temp_dir, repo_path)
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    fs::write(repo_path.join(file), content).expect("Failed to write file");
    git(repo_path, &["add", file]);
    git(repo_path, &["commit", "--quiet", "-m", message]);
}

/// Helper to create an empty bare repository usable as a remote
pub fn create_bare_remote() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let remote_path = temp_dir.path().join("remote.git");
    fs::create_dir(&remote_path).unwrap();

    git(&remote_path, &["init", "--quiet", "--bare", "--initial-branch=master"]);

    (temp_dir, remote_path)
}

/// Point `origin` of `repo_path` at `remote_path`
pub fn add_origin(repo_path: &Path, remote_path: &Path) {
    let url = remote_path.to_string_lossy().into_owned();
    git(repo_path, &["remote", "add", "origin", url.as_str()]);
}

/// Helper to clone `remote_path` into a fresh directory
pub fn clone_repo(remote_path: &Path) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let clone_path = temp_dir.path().join("clone");
    let url = remote_path.to_string_lossy().into_owned();

    git(temp_dir.path(), &["clone", "--quiet", url.as_str(), "clone"]);
    configure_user(&clone_path);
    git(&clone_path, &["config", "pull.rebase", "false"]);

    (temp_dir, clone_path)
}

/// Run a read-only git command and return trimmed stdout
pub fn git_stdout(repo_path: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .expect("Failed to run git");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}
