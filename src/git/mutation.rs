use crate::error::{GitError, GitResult};
use crate::git::parser::BranchSet;
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// Which parsed states must be re-read after a mutation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Invalidation {
    pub branch: bool,
    pub status: bool,
    pub history: bool,
}

impl Invalidation {
    pub const NONE: Self = Self {
        branch: false,
        status: false,
        history: false,
    };
    pub const BRANCH: Self = Self {
        branch: true,
        ..Self::NONE
    };
    pub const STATUS: Self = Self {
        status: true,
        ..Self::NONE
    };
    pub const HISTORY: Self = Self {
        history: true,
        ..Self::NONE
    };
    pub const ALL: Self = Self {
        branch: true,
        status: true,
        history: true,
    };

    pub const fn union(self, other: Self) -> Self {
        Self {
            branch: self.branch || other.branch,
            status: self.status || other.status,
            history: self.history || other.history,
        }
    }

    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }
}

impl BitOr for Invalidation {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

impl BitOrAssign for Invalidation {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = self.union(rhs);
    }
}

/// A user-triggered command that changes the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Fetch,
    /// Switch branches, fetching the remote branch first when it has one
    Checkout { branch: String, fetch_first: bool },
    NewBranch { name: String },
    DeleteBranch { name: String },
    Commit { message: String },
    Add { path: String },
    /// Move a staged file back out of the index
    Unstage { path: String },
    /// Discard working-tree changes of a tracked file
    Revert { path: String },
    /// Delete an untracked file or directory
    Remove { path: String },
    Pull,
    Push,
    /// Undo the commit a `log --oneline` descriptor names
    ResetCommit { descriptor: String },
}

impl Mutation {
    /// Checkout that fetches first when `branch` exists on `origin`
    pub fn checkout(branch: impl Into<String>, branches: &BranchSet) -> Self {
        let branch = branch.into();
        let fetch_first = branches.remote.contains(&branch)
            || branches.local_and_remote.contains(&branch);
        Mutation::Checkout {
            branch,
            fetch_first,
        }
    }

    /// States this mutation makes stale
    pub fn invalidates(&self) -> Invalidation {
        match self {
            Mutation::Checkout { .. } | Mutation::NewBranch { .. } | Mutation::DeleteBranch { .. } => {
                Invalidation::STATUS | Invalidation::HISTORY
            }
            Mutation::Commit { .. } => Invalidation::BRANCH | Invalidation::HISTORY,
            Mutation::Add { .. }
            | Mutation::Unstage { .. }
            | Mutation::Revert { .. }
            | Mutation::Remove { .. } => Invalidation::STATUS,
            Mutation::Fetch | Mutation::Pull | Mutation::Push => Invalidation::ALL,
            Mutation::ResetCommit { .. } => Invalidation::STATUS | Invalidation::HISTORY,
        }
    }

    /// Git argument strings, in order.
    ///
    /// `ResetCommit` has none: its target hash is resolved at run time by
    /// [`HistoryState::reset`](crate::git::history::HistoryState::reset).
    pub fn commands(&self) -> Vec<String> {
        match self {
            Mutation::Fetch => vec!["fetch --prune".to_string()],
            Mutation::Checkout {
                branch,
                fetch_first,
            } => {
                let mut commands = Vec::new();
                if *fetch_first {
                    commands.push(format!("fetch origin {}", branch));
                }
                commands.push(format!("checkout \"{}\"", branch));
                commands
            }
            Mutation::NewBranch { name } => vec![format!("checkout -b \"{}\"", name)],
            Mutation::DeleteBranch { name } => vec![format!("branch -D \"{}\"", name)],
            Mutation::Commit { message } => vec![format!("commit -m \"{}\"", message)],
            Mutation::Add { path } => vec![format!("add \"{}\"", path)],
            Mutation::Unstage { path } => vec![format!("restore --staged \"{}\"", path)],
            Mutation::Revert { path } => vec![format!("checkout -- \"{}\"", path)],
            Mutation::Remove { path } => vec![format!("clean -df \"{}\"", path)],
            Mutation::Pull => vec!["pull --prune".to_string()],
            Mutation::Push => vec!["push".to_string()],
            Mutation::ResetCommit { .. } => Vec::new(),
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Fetch => write!(f, "fetch"),
            Mutation::Checkout { branch, .. } => write!(f, "checkout {}", branch),
            Mutation::NewBranch { name } => write!(f, "new branch {}", name),
            Mutation::DeleteBranch { name } => write!(f, "delete branch {}", name),
            Mutation::Commit { .. } => write!(f, "commit"),
            Mutation::Add { path } => write!(f, "add {}", path),
            Mutation::Unstage { path } => write!(f, "unstage {}", path),
            Mutation::Revert { path } => write!(f, "revert {}", path),
            Mutation::Remove { path } => write!(f, "remove {}", path),
            Mutation::Pull => write!(f, "pull"),
            Mutation::Push => write!(f, "push"),
            Mutation::ResetCommit { descriptor } => write!(f, "reset {}", descriptor),
        }
    }
}

/// Mutations collected by a caller and applied together, followed by one refresh pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Batch {
    mutations: Vec<Mutation>,
    extra: Invalidation,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mutation: Mutation) -> &mut Self {
        self.mutations.push(mutation);
        self
    }

    /// Refresh `invalidation` as well, on top of what the mutations declare
    pub fn refresh_also(&mut self, invalidation: Invalidation) -> &mut Self {
        self.extra |= invalidation;
        self
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty() && self.extra.is_empty()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Union of everything this batch makes stale
    pub fn invalidation(&self) -> Invalidation {
        self.mutations
            .iter()
            .fold(self.extra, |acc, m| acc | m.invalidates())
    }

    pub(crate) fn take(&mut self) -> Batch {
        std::mem::take(self)
    }
}

impl From<Mutation> for Batch {
    fn from(mutation: Mutation) -> Self {
        let mut batch = Batch::new();
        batch.push(mutation);
        batch
    }
}

/// Outcome of one git command run for a batch
#[derive(Debug)]
pub struct CommandReport {
    pub command: String,
    /// Standard output, or the launch / non-zero exit error
    pub result: GitResult<String>,
}

impl CommandReport {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Everything a submitted batch did
#[derive(Debug, Default)]
pub struct BatchReport {
    pub commands: Vec<CommandReport>,
    pub invalidated: Invalidation,
    /// First state refresh that failed after the commands ran
    pub refresh_error: Option<GitError>,
}

impl BatchReport {
    pub fn failures(&self) -> impl Iterator<Item = &CommandReport> {
        self.commands.iter().filter(|c| !c.succeeded())
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures().next().is_none()
    }

    /// First error, if any command failed
    pub fn first_error(&self) -> Option<&GitError> {
        self.commands.iter().find_map(|c| c.result.as_ref().err())
    }
}

/// Result of [`RepositoryController::submit`](crate::git::controller::RepositoryController::submit)
#[derive(Debug)]
pub enum BatchOutcome {
    Applied(BatchReport),
    /// Another batch was still running; nothing was executed
    Rejected,
}

impl BatchOutcome {
    pub fn report(&self) -> Option<&BatchReport> {
        match self {
            BatchOutcome::Applied(report) => Some(report),
            BatchOutcome::Rejected => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, BatchOutcome::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::parser::parse_branch_list;

    #[test]
    fn test_invalidation_table() {
        let checkout = Mutation::Checkout {
            branch: "dev".to_string(),
            fetch_first: false,
        };
        assert_eq!(checkout.invalidates(), Invalidation::STATUS | Invalidation::HISTORY);
        assert!(!checkout.invalidates().branch);

        let commit = Mutation::Commit {
            message: "m".to_string(),
        };
        assert_eq!(commit.invalidates(), Invalidation::BRANCH | Invalidation::HISTORY);

        for m in [
            Mutation::Add { path: "a".into() },
            Mutation::Unstage { path: "a".into() },
            Mutation::Revert { path: "a".into() },
            Mutation::Remove { path: "a".into() },
        ] {
            assert_eq!(m.invalidates(), Invalidation::STATUS, "{}", m);
        }

        for m in [Mutation::Fetch, Mutation::Pull, Mutation::Push] {
            assert_eq!(m.invalidates(), Invalidation::ALL, "{}", m);
        }
    }

    #[test]
    fn test_commands_quote_names() {
        assert_eq!(
            Mutation::Commit {
                message: "Fix login".to_string()
            }
            .commands(),
            vec!["commit -m \"Fix login\""]
        );
        assert_eq!(
            Mutation::Unstage {
                path: "src/a b.rs".to_string()
            }
            .commands(),
            vec!["restore --staged \"src/a b.rs\""]
        );
        assert_eq!(
            Mutation::Remove {
                path: "tmp/".to_string()
            }
            .commands(),
            vec!["clean -df \"tmp/\""]
        );
        assert!(
            Mutation::ResetCommit {
                descriptor: "abc1234 x".to_string()
            }
            .commands()
            .is_empty()
        );
    }

    #[test]
    fn test_checkout_fetches_remote_branches_only() {
        let branches = parse_branch_list(
            "main",
            "* main\n  local-only\n  remotes/origin/main\n  remotes/origin/feature",
        );

        assert_eq!(
            Mutation::checkout("feature", &branches).commands(),
            vec!["fetch origin feature", "checkout \"feature\""]
        );
        assert_eq!(
            Mutation::checkout("local-only", &branches).commands(),
            vec!["checkout \"local-only\""]
        );
    }

    #[test]
    fn test_batch_invalidation_is_union() {
        let mut batch = Batch::new();
        assert!(batch.is_empty());
        assert_eq!(batch.invalidation(), Invalidation::NONE);

        batch
            .push(Mutation::Add { path: "a".into() })
            .push(Mutation::Commit {
                message: "m".into(),
            });
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.invalidation(), Invalidation::ALL);

        let mut branch_panel = Batch::from(Mutation::NewBranch { name: "x".into() });
        branch_panel.refresh_also(Invalidation::BRANCH);
        assert_eq!(branch_panel.invalidation(), Invalidation::ALL);
    }

    #[test]
    fn test_take_clears_batch() {
        let mut batch = Batch::from(Mutation::Push);
        let taken = batch.take();

        assert!(batch.is_empty());
        assert_eq!(taken.mutations(), &[Mutation::Push]);
    }
}
