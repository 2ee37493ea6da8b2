use crate::error::{GitError, GitResult};
use crate::git::executor::GitRunner;
use crate::git::parser::{self, CommitSummary};
use crate::git::refresh::{RefreshGuard, RefreshOutcome, StateCell};
use std::sync::Arc;
use tracing::{debug, info};

const LOG_COMMAND: &str = "log --oneline --first-parent -5";

/// Recent commits of the current branch relative to `origin`
pub struct HistoryState {
    runner: Arc<dyn GitRunner>,
    guard: RefreshGuard,
    commits: StateCell<CommitSummary>,
    web_url: Option<String>,
}

impl HistoryState {
    /// `remote_url` is only used to build commit links
    pub fn new(runner: Arc<dyn GitRunner>, remote_url: &str) -> Self {
        Self {
            runner,
            guard: RefreshGuard::new(),
            commits: StateCell::default(),
            web_url: parser::web_url(remote_url),
        }
    }

    /// Resolve both branch tips and re-split the last five first-parent commits
    pub async fn refresh(&self) -> GitResult<RefreshOutcome> {
        let Some(_ticket) = self.guard.try_acquire() else {
            debug!(work_dir = %self.runner.work_dir().display(), "history refresh in flight, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        let current = self.runner.current_branch().await?;
        let (current_hash, origin_hash) = if current.is_empty() {
            // Detached HEAD: no branch to compare against
            (None, None)
        } else {
            let current_hash = self
                .resolve_short_hash(&format!("rev-parse \"{}\"", current))
                .await?;
            let origin_hash = self
                .resolve_short_hash(&format!("rev-parse origin/\"{}\"", current))
                .await?;
            (current_hash, origin_hash)
        };

        let log = self.runner.execute(LOG_COMMAND).await?;
        let commits = parser::classify_history(
            &log.stdout,
            current_hash.as_deref(),
            origin_hash.as_deref(),
        );

        debug!(
            branch = %current,
            new = commits.new_commits.len(),
            synced = commits.synced_commits.len(),
            "history refreshed"
        );
        self.commits.replace(commits);

        Ok(RefreshOutcome::Refreshed)
    }

    /// A rev that fails to resolve (no remote branch yet) never matches a log line
    async fn resolve_short_hash(&self, command: &str) -> GitResult<Option<String>> {
        let output = self.runner.execute(command).await?;
        if !output.success {
            return Ok(None);
        }
        Ok(parser::short_hash(&output.stdout).map(str::to_string))
    }

    /// Full hash of the commit a log descriptor names
    async fn resolve_full_hash(&self, descriptor: &str) -> GitResult<String> {
        let hash = parser::descriptor_hash(descriptor).ok_or_else(|| {
            GitError::ParseError(format!("no commit hash in '{}'", descriptor))
        })?;
        let command = format!("rev-parse {}", hash);
        let full = self.runner.execute(&command).await?.into_checked(&command)?;
        Ok(full.trim().to_string())
    }

    /// Undo the commit named by `descriptor`, keeping its changes in the working tree.
    ///
    /// Runs `reset --mixed <full hash>~1`. Only meaningful for the newest
    /// unpushed commit; see [`CommitSummary::can_reset`].
    pub async fn reset(&self, descriptor: &str) -> GitResult<String> {
        let full = self.resolve_full_hash(descriptor).await?;
        let command = format!("reset --mixed {}~1", full);
        info!(work_dir = %self.runner.work_dir().display(), commit = %full, "resetting commit");
        self.runner.execute(&command).await?.into_checked(&command)
    }

    /// Web page of a commit on the remote host, when the remote URL maps to one
    pub async fn commit_url(&self, descriptor: &str) -> GitResult<Option<String>> {
        let Some(web_url) = &self.web_url else {
            return Ok(None);
        };
        let full = self.resolve_full_hash(descriptor).await?;
        Ok(Some(format!("{}/commit/{}", web_url, full)))
    }

    pub fn commits(&self) -> CommitSummary {
        self.commits.get()
    }

    pub fn is_refreshing(&self) -> bool {
        self.guard.is_busy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::testing::ScriptedRunner;

    const LOG: &str = "1111111 third\n2222222 second\n3333333 first";

    fn scripted(origin_hash: &str) -> Arc<ScriptedRunner> {
        let runner = Arc::new(ScriptedRunner::new());
        runner
            .respond("branch --show-current", "main")
            .respond("rev-parse \"main\"", "1111111aaaabbbbccccdddd")
            .respond("rev-parse origin/\"main\"", origin_hash)
            .respond(LOG_COMMAND, LOG);
        runner
    }

    #[tokio::test]
    async fn test_refresh_splits_at_origin() {
        let runner = scripted("2222222eeeeffff00001111");
        let state = HistoryState::new(runner.clone(), "");

        state.refresh().await.unwrap();

        let commits = state.commits();
        assert_eq!(commits.new_commits, vec!["1111111 third"]);
        assert_eq!(commits.synced_commits, vec!["2222222 second", "3333333 first"]);
        assert_eq!(
            runner.calls(),
            vec![
                "branch --show-current",
                "rev-parse \"main\"",
                "rev-parse origin/\"main\"",
                LOG_COMMAND,
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_origin_branch_makes_everything_new() {
        let runner = scripted("");
        // rev-parse echoes the unknown rev and exits 128
        runner.fail("rev-parse origin/\"main\"", 128, "fatal: ambiguous argument");
        let state = HistoryState::new(runner, "");

        state.refresh().await.unwrap();

        let commits = state.commits();
        assert_eq!(commits.new_commits.len(), 3);
        assert!(commits.synced_commits.is_empty());
    }

    #[tokio::test]
    async fn test_detached_head_skips_rev_parse() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond(LOG_COMMAND, LOG);
        let state = HistoryState::new(runner.clone(), "");

        state.refresh().await.unwrap();

        assert!(state.commits().new_commits.is_empty());
        assert_eq!(state.commits().synced_commits.len(), 3);
        assert_eq!(runner.calls(), vec!["branch --show-current", LOG_COMMAND]);
    }

    #[tokio::test]
    async fn test_reset_uses_full_hash_parent() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond("rev-parse abc1234", "abc1234567890abcdef1234567890abcdef12345");
        let state = HistoryState::new(runner.clone(), "");

        state.reset("abc1234 Add feature").await.unwrap();

        assert_eq!(
            runner.calls(),
            vec![
                "rev-parse abc1234",
                "reset --mixed abc1234567890abcdef1234567890abcdef12345~1",
            ]
        );
    }

    #[tokio::test]
    async fn test_reset_rejects_descriptor_without_hash() {
        let runner = Arc::new(ScriptedRunner::new());
        let state = HistoryState::new(runner.clone(), "");

        let err = state.reset("not a commit").await.unwrap_err();
        assert!(matches!(err, GitError::ParseError(_)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn test_reset_of_unknown_commit_fails() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.fail("rev-parse deadbee", 128, "fatal: ambiguous argument 'deadbee'");
        let state = HistoryState::new(runner.clone(), "");

        let err = state.reset("deadbee gone").await.unwrap_err();
        assert!(matches!(err, GitError::CommandFailed { exit_code: 128, .. }));
        assert_eq!(runner.calls(), vec!["rev-parse deadbee"]);
    }

    #[tokio::test]
    async fn test_commit_url() {
        let runner = Arc::new(ScriptedRunner::new());
        runner.respond("rev-parse abc1234", "abc1234ffff");
        let state = HistoryState::new(runner.clone(), "git@github.com:owner/project.git");

        let url = state.commit_url("abc1234 Add feature").await.unwrap();
        assert_eq!(
            url.as_deref(),
            Some("https://github.com/owner/project/commit/abc1234ffff")
        );

        let local = HistoryState::new(runner, "/srv/git/project.git");
        assert_eq!(local.commit_url("abc1234 Add feature").await.unwrap(), None);
    }
}
