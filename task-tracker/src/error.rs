use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to access task file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize tasks: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Task file {} is malformed: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("Invalid status '{0}'. Must be one of: todo, in-progress, done")]
    InvalidStatus(String),

    #[error("No task id left after {0}")]
    IdExhausted(u64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("Invalid date '{0}'")]
    Invalid(String),
}

impl StoreError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        StoreError::Malformed {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
