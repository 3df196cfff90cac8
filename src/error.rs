use std::path::PathBuf;
use thiserror::Error;

/// Failures of the tab operations themselves.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TabError {
    #[error("tab not found: {0}")]
    NotFound(String),
}

/// Failures of the persistence layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store I/O failed at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode store contents: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to start store flusher: {0}")]
    Flusher(#[source] std::io::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
