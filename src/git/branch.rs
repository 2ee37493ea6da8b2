use crate::error::GitResult;
use crate::git::executor::GitRunner;
use crate::git::parser::{self, BranchSet};
use crate::git::refresh::{RefreshGuard, RefreshOutcome, StateCell};
use std::sync::Arc;
use tracing::debug;

/// Local and remote branches of one working directory
pub struct BranchState {
    runner: Arc<dyn GitRunner>,
    guard: RefreshGuard,
    branches: StateCell<BranchSet>,
}

impl BranchState {
    pub fn new(runner: Arc<dyn GitRunner>) -> Self {
        Self {
            runner,
            guard: RefreshGuard::new(),
            branches: StateCell::default(),
        }
    }

    /// Re-read `branch --show-current` and `branch -a`.
    ///
    /// Returns `Skipped` without touching git when a refresh is already
    /// running. On a launch failure the previous branch set is kept.
    pub async fn refresh(&self) -> GitResult<RefreshOutcome> {
        let Some(_ticket) = self.guard.try_acquire() else {
            debug!(work_dir = %self.runner.work_dir().display(), "branch refresh in flight, skipping");
            return Ok(RefreshOutcome::Skipped);
        };

        let current = self.runner.current_branch().await?;
        let listing = self.runner.execute("branch -a").await?;
        let branches = parser::parse_branch_list(&current, &listing.stdout);

        debug!(
            current = %branches.current,
            local = branches.local.len(),
            remote = branches.remote.len(),
            both = branches.local_and_remote.len(),
            "branches refreshed"
        );
        self.branches.replace(branches);

        Ok(RefreshOutcome::Refreshed)
    }

    /// Snapshot of the last parsed branch set
    pub fn branches(&self) -> BranchSet {
        self.branches.get()
    }

    pub fn current(&self) -> String {
        self.branches.read(|b| b.current.clone())
    }

    pub fn is_refreshing(&self) -> bool {
        self.guard.is_busy()
    }
}
