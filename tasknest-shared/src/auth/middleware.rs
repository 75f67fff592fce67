/// Bearer-token authentication primitives for Axum
///
/// The API server installs a single auth layer in front of every protected
/// route. On success the layer inserts an [`AuthContext`] into the request
/// extensions; handlers read the caller's user id from there and never touch
/// the token themselves.
///
/// # Status mapping
///
/// - Missing or malformed `Authorization` header → 401 (the client has not
///   presented a credential at all)
/// - Present but invalid or expired token → 403 (the credential was rejected;
///   the client's cue to attempt a refresh)
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use tasknest_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Authentication context added to request extensions after a successful
/// bearer-token verification
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user id, resolved from the access token's `sub` claim
    pub user_id: i64,
}

impl AuthContext {
    /// Creates an auth context for a verified user id
    pub fn new(user_id: i64) -> Self {
        Self { user_id }
    }
}

/// Error type for the authentication gate
#[derive(Debug)]
pub enum AuthError {
    /// No bearer token was presented (401)
    MissingToken,

    /// A token was presented but failed verification (403)
    InvalidToken,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingToken => (StatusCode::UNAUTHORIZED, "Access token required"),
            AuthError::InvalidToken => (StatusCode::FORBIDDEN, "Invalid or expired token"),
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

/// Extracts the bearer token from an `Authorization` header value
///
/// Returns `None` for a missing or non-Bearer header; both cases are treated
/// as "no credential presented".
pub fn bearer_token(header: Option<&str>) -> Option<&str> {
    header?.strip_prefix("Bearer ")
}
