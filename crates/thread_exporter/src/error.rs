use std::fmt;

/// Coarse classification of an [`ExportError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The thread could not be identified from the page context.
    Resolution,
    /// Any HTTP failure while talking to the forum API.
    Network,
    /// The exporter was configured with something unusable.
    Configuration,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Resolution => write!(f, "resolution error"),
            FailureKind::Network => write!(f, "network error"),
            FailureKind::Configuration => write!(f, "configuration error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("could not find the thread id (TID) for this page")]
    ThreadIdUnresolved,
    #[error("failed to fetch pagination info: {status}")]
    Pagination { status: String },
    #[error("failed to load page {page}: {status}")]
    Page { page: u32, status: String },
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("unexpected response from {url}: {message}")]
    InvalidResponse { url: String, message: String },
    #[error("invalid citation pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },
    #[error("failed to build http client: {0}")]
    Client(String),
}

impl ExportError {
    pub fn kind(&self) -> FailureKind {
        match self {
            ExportError::ThreadIdUnresolved => FailureKind::Resolution,
            ExportError::Pagination { .. }
            | ExportError::Page { .. }
            | ExportError::Transport { .. }
            | ExportError::InvalidResponse { .. } => FailureKind::Network,
            ExportError::InvalidPattern { .. } | ExportError::Client(_) => {
                FailureKind::Configuration
            }
        }
    }
}
