use thiserror::Error;

/// A failed page fetch.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("search API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid search response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Transport errors, timeouts, rate limiting and server errors may succeed on a later attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Decode(_) => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` exited with {status}: {stderr}")]
    Command {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("tunnel task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("unsupported output format for {0} (expected .xlsx, .sqlite or .db)")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}
