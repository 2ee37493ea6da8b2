use crate::audit::{AuditEntry, AuditSink, TracingAudit};
use crate::error::{GitError, GitResult};
use async_trait::async_trait;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, instrument};

/// Result of executing a git command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output with a single trailing newline removed
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
    pub success: bool,
}

impl CommandOutput {
    /// Successful output carrying `stdout`
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: 0,
            success: true,
        }
    }

    /// Turn a non-zero exit into `GitError::CommandFailed`
    pub fn into_checked(self, command: &str) -> GitResult<String> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(GitError::CommandFailed {
                command: command.to_string(),
                exit_code: self.exit_code,
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Runs git commands against one fixed working directory.
///
/// `execute` only fails when the process cannot be started. A command that
/// runs and exits non-zero still yields its `CommandOutput`; callers that care
/// use [`CommandOutput::into_checked`].
#[async_trait]
pub trait GitRunner: Send + Sync {
    /// Run `git <command>` and wait for it to exit
    async fn execute(&self, command: &str) -> GitResult<CommandOutput>;

    /// Working directory every command runs in
    fn work_dir(&self) -> &Path;

    /// Name of the checked-out branch, empty on a detached HEAD
    async fn current_branch(&self) -> GitResult<String> {
        Ok(self.execute("branch --show-current").await?.stdout)
    }
}

/// `GitRunner` backed by the system git binary
pub struct GitExecutor {
    work_dir: PathBuf,
    binary: String,
    locale_c: bool,
    audit: Arc<dyn AuditSink>,
}

impl GitExecutor {
    /// Create a new GitExecutor for the given working directory
    pub fn new<P: AsRef<Path>>(work_dir: P) -> Self {
        Self {
            work_dir: work_dir.as_ref().to_path_buf(),
            binary: "git".to_string(),
            locale_c: true,
            audit: Arc::new(TracingAudit),
        }
    }

    /// Use a different git binary
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Send every invocation to `audit`
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Force `LC_ALL=C` so status headers come out in English
    pub fn with_locale_c(mut self, locale_c: bool) -> Self {
        self.locale_c = locale_c;
        self
    }

    /// A sibling executor for another working directory sharing binary and audit sink
    pub fn for_dir<P: AsRef<Path>>(&self, work_dir: P) -> Self {
        Self {
            work_dir: work_dir.as_ref().to_path_buf(),
            binary: self.binary.clone(),
            locale_c: self.locale_c,
            audit: Arc::clone(&self.audit),
        }
    }
}

impl fmt::Debug for GitExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitExecutor")
            .field("work_dir", &self.work_dir)
            .field("binary", &self.binary)
            .field("locale_c", &self.locale_c)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GitRunner for GitExecutor {
    #[instrument(skip(self), fields(work_dir = %self.work_dir.display()))]
    async fn execute(&self, command: &str) -> GitResult<CommandOutput> {
        let mut cmd = Command::new(&self.binary);
        cmd.args(split_args(command))
            .current_dir(&self.work_dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if self.locale_c {
            cmd.env("LC_ALL", "C");
        }

        let output = cmd.output().await.map_err(|source| GitError::ProcessLaunch {
            command: command.to_string(),
            source,
        })?;

        let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.ends_with('\n') {
            stdout.pop();
        }
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        let exit_code = output.status.code().unwrap_or(-1);

        let command_line = format!("git {}", command);
        self.audit.record(&AuditEntry {
            work_dir: &self.work_dir,
            command_line: &command_line,
            result: &stdout,
            exit_code,
        });
        debug!(exit_code, "git command finished");

        Ok(CommandOutput {
            stdout,
            stderr,
            exit_code,
            success: output.status.success(),
        })
    }

    fn work_dir(&self) -> &Path {
        &self.work_dir
    }
}

/// Split an argument string on whitespace, keeping double-quoted runs together.
///
/// Quotes are removed; no escaping is recognised. `checkout "my branch"`
/// becomes `["checkout", "my branch"]` and `rev-parse origin/"main"` becomes
/// `["rev-parse", "origin/main"]`.
pub fn split_args(command: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_token = false;

    for c in command.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                has_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_token {
                    args.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            c => {
                current.push(c);
                has_token = true;
            }
        }
    }
    if has_token {
        args.push(current);
    }

    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let repo_path = temp_dir.path().to_path_buf();

        for args in [
            vec!["init", "-b", "main"],
            vec!["config", "user.name", "Test User"],
            vec!["config", "user.email", "test@example.com"],
        ] {
            StdCommand::new("git")
                .args(&args)
                .current_dir(&repo_path)
                .output()
                .unwrap();
        }

        (temp_dir, repo_path)
    }

    #[derive(Default)]
    struct RecordingAudit {
        entries: Mutex<Vec<(String, String, i32)>>,
    }

    impl AuditSink for RecordingAudit {
        fn record(&self, entry: &AuditEntry<'_>) {
            self.entries.lock().unwrap().push((
                entry.command_line.to_string(),
                entry.result.to_string(),
                entry.exit_code,
            ));
        }
    }

    #[test]
    fn test_split_plain_args() {
        assert_eq!(split_args("status -uall"), vec!["status", "-uall"]);
        assert_eq!(split_args("  log   --oneline  "), vec!["log", "--oneline"]);
        assert!(split_args("").is_empty());
    }

    #[test]
    fn test_split_quoted_args() {
        assert_eq!(
            split_args("commit -m \"fix the thing\""),
            vec!["commit", "-m", "fix the thing"]
        );
        assert_eq!(
            split_args("rev-parse origin/\"feature/x\""),
            vec!["rev-parse", "origin/feature/x"]
        );
        assert_eq!(split_args("commit -m \"\""), vec!["commit", "-m", ""]);
    }

    #[tokio::test]
    async fn test_execute_status() {
        let (_temp, repo_path) = create_test_repo();
        let executor = GitExecutor::new(&repo_path);

        let output = executor.execute("status -uall").await.unwrap();
        assert!(output.success);
        assert_eq!(output.exit_code, 0);
        assert!(output.stdout.contains("On branch main"));
        assert!(!output.stdout.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_current_branch() {
        let (_temp, repo_path) = create_test_repo();
        let executor = GitExecutor::new(&repo_path);

        assert_eq!(executor.current_branch().await.unwrap(), "main");
    }

    #[tokio::test]
    async fn test_failed_command_still_returns_output() {
        let (_temp, repo_path) = create_test_repo();
        let executor = GitExecutor::new(&repo_path);

        // Empty repo has no commits to log
        let output = executor.execute("log --oneline").await.unwrap();
        assert!(!output.success);
        assert_ne!(output.exit_code, 0);

        let err = output.into_checked("log --oneline").unwrap_err();
        assert!(matches!(err, GitError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_missing_work_dir_is_launch_failure() {
        let temp_dir = TempDir::new().unwrap();
        let executor = GitExecutor::new(temp_dir.path().join("does-not-exist"));

        let err = executor.execute("status").await.unwrap_err();
        assert!(matches!(err, GitError::ProcessLaunch { .. }));
    }

    #[tokio::test]
    async fn test_missing_binary_is_launch_failure() {
        let (_temp, repo_path) = create_test_repo();
        let executor = GitExecutor::new(&repo_path).with_binary("definitely-not-git-binary");

        let err = executor.execute("status").await.unwrap_err();
        assert!(matches!(err, GitError::ProcessLaunch { .. }));
    }

    #[tokio::test]
    async fn test_every_invocation_is_audited() {
        let (_temp, repo_path) = create_test_repo();
        let audit = Arc::new(RecordingAudit::default());
        let executor = GitExecutor::new(&repo_path).with_audit(audit.clone());

        executor.execute("branch --show-current").await.unwrap();
        executor.execute("rev-parse \"nope\"").await.unwrap();

        let entries = audit.entries.lock().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].0, "git branch --show-current");
        assert_eq!(entries[0].1, "main");
        assert_eq!(entries[0].2, 0);
        assert_eq!(entries[1].0, "git rev-parse \"nope\"");
        assert_ne!(entries[1].2, 0);
    }

    #[test]
    fn test_for_dir_keeps_settings() {
        let executor = GitExecutor::new("/a").with_binary("git2").with_locale_c(false);
        let sibling = executor.for_dir("/a/sub");

        assert_eq!(sibling.work_dir(), Path::new("/a/sub"));
        assert_eq!(sibling.binary, "git2");
        assert!(!sibling.locale_c);
    }
}
