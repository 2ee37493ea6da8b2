use std::io;
use thiserror::Error;

use crate::config::settings::ConfigError;

/// Errors that can occur while driving the git command-line tool
#[derive(Debug, Error)]
pub enum GitError {
    /// The git process could not be started (missing binary, bad working directory)
    #[error("Failed to launch 'git {command}': {source}")]
    ProcessLaunch {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Command 'git {command}' failed with exit code {exit_code}: {stderr}")]
    CommandFailed {
        command: String,
        exit_code: i32,
        stderr: String,
    },

    #[error("Not a git repository")]
    NotARepository,

    #[error("Failed to parse git output: {0}")]
    ParseError(String),

    #[error("Git version {0} is too old. Minimum required: 2.23")]
    GitVersionTooOld(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Top-level application error used by the binary
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Git error: {0}")]
    Git(#[from] GitError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Result type for git operations
pub type GitResult<T> = std::result::Result<T, GitError>;

/// Result type for application-level operations
pub type AppResult<T> = std::result::Result<T, AppError>;
