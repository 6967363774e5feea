use thiserror::Error;

/// Failure of a single listing or retrieval command.
///
/// These never escape [`RemoteClient`](crate::remote::client::RemoteClient):
/// it logs them and degrades to "no data" for the affected resource.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Resource \"{0}\" does not exist")]
    NotFound(String),

    #[error("Transfer failed: {0}")]
    Failed(String),
}
