pub mod branch;
pub mod controller;
pub mod executor;
pub mod history;
pub mod mutation;
pub mod parser;
pub mod refresh;
pub mod registry;
pub mod repository;
pub mod status;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

// Re-export commonly used types
pub use controller::{RepositoryController, RepositorySnapshot};
pub use executor::{CommandOutput, GitExecutor, GitRunner};
pub use mutation::{Batch, BatchOutcome, BatchReport, CommandReport, Invalidation, Mutation};
pub use parser::{BranchSet, CommitSummary, FileStatus};
pub use refresh::RefreshOutcome;
pub use registry::RepositoryRegistry;
pub use repository::WorkingDirectory;
pub use version::GitVersion;
