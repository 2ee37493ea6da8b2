pub mod audit;
pub mod config;
pub mod error;
pub mod git;
pub mod ui;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult, GitError, GitResult};
pub use git::{
    Batch, BatchOutcome, BatchReport, GitExecutor, GitVersion, Mutation, RepositoryController,
    RepositoryRegistry, RepositorySnapshot, WorkingDirectory,
};
