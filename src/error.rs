use std::path::PathBuf;

use thiserror::Error;

/// Unified error type for branch-gardener operations
#[derive(Error, Debug)]
pub enum GardenerError {
    #[error(
        "Could not create new {operation} due to uncommitted changes. \
         Please commit your current work before creating new {operation}."
    )]
    UncommittedChanges { operation: &'static str },

    #[error("Invalid version format: '{0}'. Should be in x.y format")]
    InvalidVersionFormat(String),

    #[error("Current branch '{branch}' does not match release branch naming pattern '{pattern}'")]
    BranchNamingConventionViolation { branch: String, pattern: String },

    #[error("Temporary branch '{0}' already exists. Please delete it first")]
    TempBranchAlreadyExists(String),

    #[error("Can not find git repository with search path: {}", .0.display())]
    RepositoryNotFound(PathBuf),

    #[error("Branch '{0}' already exists")]
    BranchAlreadyExists(String),

    #[error("Branch '{0}' not found")]
    BranchNotFound(String),

    #[error("Tag '{0}' already exists")]
    TagAlreadyExists(String),

    #[error("Tag '{0}' not found")]
    TagNotFound(String),

    #[error(
        "Failed to fetch tags from remote '{remote}': {reason}{}",
        credentials_hint(.credentials_supplied)
    )]
    Fetch {
        remote: String,
        reason: String,
        credentials_supplied: bool,
    },

    #[error("Failed to push tag '{tag}' to remote '{remote}': {reason}")]
    TagPush {
        tag: String,
        remote: String,
        reason: String,
    },

    #[error("HEAD is detached, a branch must be checked out")]
    DetachedHead,

    #[error("Failed to find '{name}' at '{}'", .dir.display())]
    PropertiesFileNotFound { name: String, dir: PathBuf },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn credentials_hint(supplied: &bool) -> &'static str {
    if *supplied {
        ""
    } else {
        "\nBe aware that there were no credentials provided."
    }
}

/// Convenience type alias for Results in branch-gardener
pub type Result<T> = std::result::Result<T, GardenerError>;

impl GardenerError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        GardenerError::Config(msg.into())
    }

    /// Create a prompt error with context
    pub fn prompt(msg: impl Into<String>) -> Self {
        GardenerError::Prompt(msg.into())
    }

    /// Create an invalid version error for the offending input
    pub fn invalid_version(input: impl Into<String>) -> Self {
        GardenerError::InvalidVersionFormat(input.into())
    }
}
