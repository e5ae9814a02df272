use std::path::PathBuf;

/// Core error type.
///
/// Adapter crates map their platform errors into this type so the campaign
/// engine can tell an unreachable recipient apart from any other failure.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("counter storage corrupt: {path}: {reason}")]
    StorageCorrupt { path: PathBuf, reason: String },

    /// The recipient cannot be reached (DMs closed, blocked, left the server).
    #[error("recipient unreachable: {0}")]
    RecipientUnreachable(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
