use crate::error::{GitError, GitResult};
use crate::git::branch::BranchState;
use crate::git::executor::GitRunner;
use crate::git::history::HistoryState;
use crate::git::mutation::{Batch, BatchOutcome, BatchReport, CommandReport, Invalidation, Mutation};
use crate::git::parser::{self, BranchSet, CommitSummary, FileStatus};
use crate::git::refresh::{RefreshGuard, RefreshOutcome};
use crate::git::repository::WorkingDirectory;
use crate::git::status::FileStatusState;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything a renderer needs to draw one working directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositorySnapshot {
    pub working_directory: WorkingDirectory,
    pub branches: BranchSet,
    pub status: FileStatus,
    pub commits: CommitSummary,
}

impl RepositorySnapshot {
    pub fn change_count(&self) -> usize {
        self.status.change_count()
    }

    /// `name (branch)`, plus ` - N changed.` when the tree is dirty
    pub fn title(&self) -> String {
        let mut title = format!(
            "{} ({})",
            self.working_directory.name(),
            self.branches.current
        );
        let changes = self.change_count();
        if changes > 0 {
            title.push_str(&format!(" - {} changed.", changes));
        }
        title
    }
}

/// Owns the runner and the three parsed states of one working directory.
///
/// Mutations go through [`submit`](Self::submit): the batch's commands run
/// in order, then a single refresh pass re-reads every state the batch made
/// stale. Only one batch runs at a time; a second `submit` is rejected.
pub struct RepositoryController {
    working_directory: WorkingDirectory,
    runner: Arc<dyn GitRunner>,
    branch: BranchState,
    status: FileStatusState,
    history: HistoryState,
    batch_guard: RefreshGuard,
}

impl RepositoryController {
    pub fn new(working_directory: WorkingDirectory, runner: Arc<dyn GitRunner>) -> Self {
        let history = HistoryState::new(Arc::clone(&runner), working_directory.remote_url());
        Self {
            branch: BranchState::new(Arc::clone(&runner)),
            status: FileStatusState::new(Arc::clone(&runner)),
            history,
            working_directory,
            runner,
            batch_guard: RefreshGuard::new(),
        }
    }

    /// Resolve the working directory's identity and load all state
    pub async fn open(runner: Arc<dyn GitRunner>) -> GitResult<Self> {
        let working_directory = WorkingDirectory::resolve(runner.as_ref()).await?;
        let controller = Self::new(working_directory, runner);
        controller.refresh_all().await?;
        Ok(controller)
    }

    pub fn working_directory(&self) -> &WorkingDirectory {
        &self.working_directory
    }

    /// Key for per-directory UI state
    pub fn path(&self) -> &Path {
        self.working_directory.path()
    }

    /// Refresh branch, then status, then history.
    ///
    /// History resolves hashes of the checked-out branch, so it runs last.
    pub async fn refresh_all(&self) -> GitResult<()> {
        self.invalidate(Invalidation::ALL).await
    }

    pub async fn refresh_branches(&self) -> GitResult<RefreshOutcome> {
        self.branch.refresh().await
    }

    pub async fn refresh_status(&self) -> GitResult<RefreshOutcome> {
        self.status.refresh().await
    }

    pub async fn refresh_history(&self) -> GitResult<RefreshOutcome> {
        self.history.refresh().await
    }

    /// Re-read the given states in dependency order.
    ///
    /// Every requested state is attempted; the first error is returned.
    pub async fn invalidate(&self, invalidation: Invalidation) -> GitResult<()> {
        let mut first_error = None;
        if invalidation.branch {
            self.note_refresh("branch", self.branch.refresh().await, &mut first_error);
        }
        if invalidation.status {
            self.note_refresh("status", self.status.refresh().await, &mut first_error);
        }
        if invalidation.history {
            self.note_refresh("history", self.history.refresh().await, &mut first_error);
        }
        first_error.map_or(Ok(()), Err)
    }

    fn note_refresh(
        &self,
        state: &str,
        result: GitResult<RefreshOutcome>,
        first_error: &mut Option<GitError>,
    ) {
        if let Err(e) = result {
            warn!(work_dir = %self.path().display(), state, "refresh failed: {}", e);
            first_error.get_or_insert(e);
        }
    }

    /// Run every pending mutation of `batch`, then refresh the union of what they invalidate.
    ///
    /// On success the batch is emptied. While another batch is running the
    /// call returns `Rejected` and leaves `batch` untouched. A command that
    /// exits non-zero is recorded in the report and the batch carries on; a
    /// command that cannot be launched stops the remaining commands. The
    /// refresh pass runs in both cases, and a refresh that fails is kept in
    /// `BatchReport::refresh_error` next to the command results.
    pub async fn submit(&self, batch: &mut Batch) -> GitResult<BatchOutcome> {
        let Some(_ticket) = self.batch_guard.try_acquire() else {
            debug!(work_dir = %self.path().display(), "batch already running, rejecting");
            return Ok(BatchOutcome::Rejected);
        };

        let batch = batch.take();
        let invalidation = batch.invalidation();
        let mut report = BatchReport {
            invalidated: invalidation,
            ..BatchReport::default()
        };

        info!(
            work_dir = %self.path().display(),
            mutations = batch.len(),
            "applying batch"
        );

        for mutation in batch.mutations() {
            if !self.apply_mutation(mutation, &mut report).await {
                warn!(work_dir = %self.path().display(), %mutation, "git could not be launched, abandoning batch");
                break;
            }
        }

        for failure in report.failures() {
            if let Err(e) = &failure.result {
                warn!(work_dir = %self.path().display(), command = %failure.command, "{}", e);
            }
        }

        report.refresh_error = self.invalidate(invalidation).await.err();

        Ok(BatchOutcome::Applied(report))
    }

    /// Submit a single mutation as its own batch
    pub async fn apply(&self, mutation: Mutation) -> GitResult<BatchOutcome> {
        self.submit(&mut Batch::from(mutation)).await
    }

    /// Returns false when git could not be started
    async fn apply_mutation(&self, mutation: &Mutation, report: &mut BatchReport) -> bool {
        if let Mutation::ResetCommit { descriptor } = mutation {
            let result = self.history.reset(descriptor).await;
            let launched = !matches!(result, Err(GitError::ProcessLaunch { .. }));
            let target = parser::descriptor_hash(descriptor).unwrap_or(descriptor);
            report.commands.push(CommandReport {
                command: format!("reset --mixed {}~1", target),
                result,
            });
            return launched;
        }

        for command in mutation.commands() {
            let result = match self.runner.execute(&command).await {
                Ok(output) => output.into_checked(&command),
                Err(e) => {
                    report.commands.push(CommandReport { command, result: Err(e) });
                    return false;
                }
            };
            report.commands.push(CommandReport { command, result });
        }
        true
    }

    pub async fn fetch(&self) -> GitResult<BatchOutcome> {
        self.apply(Mutation::Fetch).await
    }

    pub async fn checkout(&self, branch: &str) -> GitResult<BatchOutcome> {
        let mutation = Mutation::checkout(branch, &self.branches());
        self.apply(mutation).await
    }

    pub async fn new_branch(&self, name: &str) -> GitResult<BatchOutcome> {
        self.apply(Mutation::NewBranch { name: name.to_string() }).await
    }

    pub async fn delete_branch(&self, name: &str) -> GitResult<BatchOutcome> {
        self.apply(Mutation::DeleteBranch { name: name.to_string() }).await
    }

    pub async fn commit(&self, message: &str) -> GitResult<BatchOutcome> {
        self.apply(Mutation::Commit { message: message.to_string() }).await
    }

    pub async fn add(&self, path: &str) -> GitResult<BatchOutcome> {
        self.apply(Mutation::Add { path: path.to_string() }).await
    }

    pub async fn unstage(&self, path: &str) -> GitResult<BatchOutcome> {
        self.apply(Mutation::Unstage { path: path.to_string() }).await
    }

    pub async fn revert(&self, path: &str) -> GitResult<BatchOutcome> {
        self.apply(Mutation::Revert { path: path.to_string() }).await
    }

    pub async fn remove(&self, path: &str) -> GitResult<BatchOutcome> {
        self.apply(Mutation::Remove { path: path.to_string() }).await
    }

    pub async fn pull(&self) -> GitResult<BatchOutcome> {
        self.apply(Mutation::Pull).await
    }

    pub async fn push(&self) -> GitResult<BatchOutcome> {
        self.apply(Mutation::Push).await
    }

    pub async fn reset_commit(&self, descriptor: &str) -> GitResult<BatchOutcome> {
        self.apply(Mutation::ResetCommit {
            descriptor: descriptor.to_string(),
        })
        .await
    }

    /// Web link of a commit, see [`HistoryState::commit_url`]
    pub async fn commit_url(&self, descriptor: &str) -> GitResult<Option<String>> {
        self.history.commit_url(descriptor).await
    }

    pub fn branches(&self) -> BranchSet {
        self.branch.branches()
    }

    pub fn file_status(&self) -> FileStatus {
        self.status.status()
    }

    pub fn commits(&self) -> CommitSummary {
        self.history.commits()
    }

    pub fn change_count(&self) -> usize {
        self.status.change_count()
    }

    pub fn snapshot(&self) -> RepositorySnapshot {
        RepositorySnapshot {
            working_directory: self.working_directory.clone(),
            branches: self.branches(),
            status: self.file_status(),
            commits: self.commits(),
        }
    }

    /// Whether a batch or any refresh is in flight
    pub fn is_busy(&self) -> bool {
        self.batch_guard.is_busy()
            || self.branch.is_refreshing()
            || self.status.is_refreshing()
            || self.history.is_refreshing()
    }
}
