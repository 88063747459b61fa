//! Error types for the task manager.
//!
//! Store failures are mostly logged and swallowed by the repository; the
//! errors below are the ones callers actually see.

use std::path::PathBuf;

use thiserror::Error;

use crate::form::ValidationError;
use crate::task::TaskId;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Select a task from the list first")]
    NothingSelected,

    #[error("No task id left after {0}")]
    IdsExhausted(TaskId),

    #[error("Task {0} is not in the trash; delete it before purging")]
    PurgeActive(TaskId),

    #[error("Cannot read photo {path}: {source}")]
    Photo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, AppError>;
