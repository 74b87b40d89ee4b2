use thiserror::Error;

/// Typed failure produced by the remote service clients.
///
/// Every remote problem surfaces as one of these variants; clients never
/// panic on bad responses. The engine converts them to a user-visible error
/// message at the intent boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// Bad credentials or an expired/invalid session.
    #[error("{0}")]
    Auth(String),

    /// The remote answered but the requested entity does not exist
    /// (empty registry result, missing worksheet column).
    #[error("{0}")]
    NotFound(String),

    /// Network failure or a non-2xx response, carrying the server's message.
    #[error("{0}")]
    Transport(String),

    /// Expected response structure was absent. Treated like a transport
    /// failure by the engine.
    #[error("{0}")]
    Parse(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Parse(err.to_string())
    }
}
