/// Error type for client session operations

use serde::Deserialize;

/// Client result type alias
pub type SessionResult<T> = Result<T, SessionError>;

/// Error surfaced by the session agent
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The refresh token itself was rejected; all held session state has
    /// been cleared and the caller must re-authenticate
    #[error("Session expired, re-authentication required")]
    SessionExpired,

    /// The server answered with a non-success status
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,

        /// Server-provided message
        message: String,
    },

    /// Network or protocol failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A request body could not be serialized
    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The server's `{"message": ...}` error body
#[derive(Debug, Deserialize)]
pub(crate) struct MessageBody {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialization_failure_maps_to_encode() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let session: SessionError = err.into();

        assert!(matches!(session, SessionError::Encode(_)));
        assert!(session
            .to_string()
            .starts_with("Failed to encode request body"));
    }
}
