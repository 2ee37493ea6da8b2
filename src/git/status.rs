use crate::error::GitResult;
use crate::git::executor::GitRunner;
use crate::git::parser::{self, FileStatus};
use crate::git::refresh::{RefreshGuard, RefreshOutcome, StateCell};
use std::sync::Arc;
use tracing::debug;

/// Staged, unstaged and untracked files of one working directory
pub struct FileStatusState {
    runner: Arc<dyn GitRunner>,
    guard: RefreshGuard,
    status: StateCell<FileStatus>,
}

impl FileStatusState {
    pub fn new(runner: Arc<dyn GitRunner>) -> Self {
        Self {
            runner,
            guard: RefreshGuard::new(),
            status: StateCell::default(),
        }
    }

    /// Re-read `status -uall`; skipped while another refresh runs
    pub async fn refresh(&self) -> GitResult<RefreshOutcome> {
        let Some(_ticket) = self.guard.try_acquire() else {
            debug!(work_dir = %self.runner.work_dir().display(), "status refresh in flight, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        let output = self.runner.execute("status -uall").await?;
        let status = parser::parse_status(&output.stdout);

        debug!(
            staged = status.staged.len(),
            unstaged = status.unstaged.len(),
            untracked = status.untracked.len(),
            "status refreshed"
        );
        self.status.replace(status);

        Ok(RefreshOutcome::Refreshed)
    }

    pub fn status(&self) -> FileStatus {
        self.status.get()
    }

    /// Staged + unstaged + untracked, computed from the current lists
    pub fn change_count(&self) -> usize {
        self.status.read(FileStatus::change_count)
    }

    pub fn is_refreshing(&self) -> bool {
        self.guard.is_busy()
    }
}
