#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Validation or authorization/state error reported by the backend
    #[error("{message}")]
    Rejected {
        status: Option<u16>,
        message: String,
    },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Session error: {0}")]
    Session(String),

    #[error("{0} is not available right now")]
    ActionUnavailable(&'static str),
}

impl ClientError {
    pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
        ClientError::Rejected {
            status,
            message: message.into(),
        }
    }
}
