use thiserror::Error;

/// Shown when the server cannot be reached or does not answer in JSON.
pub const CONNECTIVITY_MESSAGE: &str =
    "Unable to reach the server. Please check your connection and try again.";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status; `message` is its own.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("{}", CONNECTIVITY_MESSAGE)]
    Unreachable,

    #[error("session storage failed: {0}")]
    Storage(#[from] std::io::Error),

    #[error("could not encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}
