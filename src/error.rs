//! Error types for samplehub

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Inbox path is not a directory: {}", .0.display())]
    InvalidInbox(PathBuf),
    #[error("Hub path is not a directory: {}", .0.display())]
    InvalidHub(PathBuf),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("No audit trail found under {}", .0.display())]
    NoAuditTrail(PathBuf),
}

pub type Result<T> = std::result::Result<T, Error>;
