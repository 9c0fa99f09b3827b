use thiserror::Error;

/// Errors surfaced by the session store, HTTP client and ticket board.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Credentials were rejected by the backend.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Form input rejected, either locally before dispatch or by the backend.
    #[error("{0}")]
    Validation(String),

    /// Non-2xx response. A 404 is reported here as well.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The request never produced a response.
    #[error("network error: {0}")]
    Network(String),

    /// The response body was not the shape we expected.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Local storage (the session database) failed.
    #[error("local storage error: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Server { status: 404, .. })
    }

    /// Message suitable for showing inline next to the control that failed.
    pub fn message(&self) -> String {
        match self {
            ClientError::Authentication(msg)
            | ClientError::Validation(msg)
            | ClientError::Network(msg)
            | ClientError::Decode(msg)
            | ClientError::Storage(msg) => msg.clone(),
            ClientError::Server { message, .. } => message.clone(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Network(err.to_string())
        }
    }
}

impl From<anyhow::Error> for ClientError {
    fn from(err: anyhow::Error) -> Self {
        ClientError::Storage(format!("{:#}", err))
    }
}
