use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned HTTP {0}")]
    Status(u16),

    #[error("identity not registered with server")]
    NotFound,

    #[error("malformed response: {0}")]
    Parse(#[source] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),

    #[error("server rejected the sync request")]
    ServerRejected,

    #[error("store write failed: {0}")]
    Store(#[from] StoreError),
}
