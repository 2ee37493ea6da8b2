#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Run git in `dir`, panicking on failure, and return trimmed stdout
pub fn git(dir: &Path, args: &[&str]) -> String {
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
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Helper to create a test git repository on branch `main`
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().join("work");
    fs::create_dir(&repo_path).unwrap();

    git(&repo_path, &["init", "-b", "main"]);
    git(&repo_path, &["config", "user.name", "Test User"]);
    git(&repo_path, &["config", "user.email", "test@example.com"]);
    git(&repo_path, &["config", "commit.gpgsign", "false"]);

    (temp_dir, repo_path)
}

/// Test repository with a bare `origin` next to it; `main` is pushed with one commit
pub fn create_repo_with_origin() -> (TempDir, PathBuf) {
    let (temp_dir, repo_path) = create_test_repo();
    let origin_path = temp_dir.path().join("origin.git");

    git(temp_dir.path(), &["init", "--bare", "-b", "main", "origin.git"]);
    git(
        &repo_path,
        &["remote", "add", "origin", &origin_path.to_string_lossy()],
    );
    create_commit(&repo_path, "README.md", "hello", "Initial commit");
    git(&repo_path, &["push", "-u", "origin", "main"]);

    (temp_dir, repo_path)
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    fs::write(repo_path.join(file), content).expect("Failed to write file");
    git(repo_path, &["add", file]);
    git(repo_path, &["commit", "-m", message]);
}

/// Abbreviated hash of `rev`
pub fn short_hash(repo_path: &Path, rev: &str) -> String {
    git(repo_path, &["rev-parse", "--short=7", rev])
}
