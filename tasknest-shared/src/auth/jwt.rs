/// Token issuance and verification
///
/// This module mints and verifies the two signed credentials that represent a
/// user session. Tokens are signed using HS256 (HMAC-SHA256) and carry the
/// user id as their only identity claim.
///
/// # Token Types
///
/// - **Access Token**: short-lived (15 minutes), sent as a bearer credential
///   on every API call
/// - **Refresh Token**: long-lived (7 days), transported only inside an
///   HTTP-only cookie and used solely to mint new access tokens
///
/// The two token types are signed with independent secrets, so an access
/// token can never be replayed against the refresh endpoint or vice versa.
/// There is no token family or version id: a refresh token stays valid until
/// its natural expiry.
///
/// # Example
///
/// ```
/// use tasknest_shared::auth::jwt::{issue_pair, verify_token, rotate_access};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pair = issue_pair(7, "access-secret", "refresh-secret")?;
///
/// // The access token resolves back to the user id
/// let claims = verify_token(&pair.access_token, "access-secret")?;
/// assert_eq!(claims.sub, 7);
///
/// // A refresh token mints a brand-new access token for the same user
/// let access = rotate_access(&pair.refresh_token, "refresh-secret", "access-secret")?;
/// assert_eq!(verify_token(&access, "access-secret")?.sub, 7);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Signature or format check failed
    #[error("Invalid token: {0}")]
    Invalid(String),
}

/// Token kind, determining which lifetime applies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Access token (15 minutes)
    Access,

    /// Refresh token (7 days)
    Refresh,
}

impl TokenKind {
    /// Gets the lifetime for this token kind
    pub fn lifetime(&self) -> Duration {
        match self {
            TokenKind::Access => Duration::minutes(15),
            TokenKind::Refresh => Duration::days(7),
        }
    }
}

/// JWT claims carried by both token types
///
/// The user id (`sub`) is the sole identity claim; `iat`/`exp` bound the
/// token in time. Nothing else is embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - user id
    pub sub: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for `user_id` with the default lifetime of `kind`
    pub fn new(user_id: i64, kind: TokenKind) -> Self {
        Self::with_lifetime(user_id, kind.lifetime())
    }

    /// Creates claims for `user_id` expiring after `lifetime`
    pub fn with_lifetime(user_id: i64, lifetime: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// An access/refresh token pair minted for one user
#[derive(Debug, Clone)]
pub struct TokenPair {
    /// Short-lived bearer credential (15 minutes)
    pub access_token: String,

    /// Long-lived cookie credential (7 days)
    pub refresh_token: String,
}

/// Issues a fresh access/refresh token pair for `user_id`
///
/// The two tokens are signed independently, each with its own secret and its
/// own expiry (15 minutes for access, 7 days for refresh).
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token encoding fails
pub fn issue_pair(
    user_id: i64,
    access_secret: &str,
    refresh_secret: &str,
) -> Result<TokenPair, JwtError> {
    let access_token = create_token(&Claims::new(user_id, TokenKind::Access), access_secret)?;
    let refresh_token = create_token(&Claims::new(user_id, TokenKind::Refresh), refresh_secret)?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

/// Creates a signed JWT from claims
///
/// # Arguments
///
/// * `claims` - Token claims
/// * `secret` - Secret key for signing (should be at least 32 bytes)
///
/// # Errors
///
/// Returns `JwtError::CreateError` if token encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies a JWT and extracts its claims
///
/// Checks the signature and the expiry. Access and refresh tokens are
/// distinguished solely by the secret passed in: a token signed with the
/// refresh secret fails verification against the access secret.
///
/// # Errors
///
/// - `JwtError::Expired` if the expiry has passed
/// - `JwtError::Invalid` if the signature or format does not validate
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        _ => JwtError::Invalid(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Exchanges a valid refresh token for a brand-new access token
///
/// Verifies the refresh token against the refresh secret, then mints a fresh
/// 15-minute access token bound to the same user. The refresh token itself is
/// NOT re-issued: refreshing re-authorizes short-term access but never
/// extends the 7-day session.
///
/// # Errors
///
/// Returns an error if the refresh token is invalid or expired
///
/// # Example
///
/// ```
/// use tasknest_shared::auth::jwt::{issue_pair, rotate_access, verify_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pair = issue_pair(1, "access-secret", "refresh-secret")?;
/// let access = rotate_access(&pair.refresh_token, "refresh-secret", "access-secret")?;
/// assert_eq!(verify_token(&access, "access-secret")?.sub, 1);
/// # Ok(())
/// # }
/// ```
pub fn rotate_access(
    refresh_token: &str,
    refresh_secret: &str,
    access_secret: &str,
) -> Result<String, JwtError> {
    let refresh_claims = verify_token(refresh_token, refresh_secret)?;

    create_token(&Claims::new(refresh_claims.sub, TokenKind::Access), access_secret)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ACCESS_SECRET: &str = "test-access-secret-at-least-32-bytes-long";
    const REFRESH_SECRET: &str = "test-refresh-secret-at-least-32-bytes-long";

    #[test]
    fn test_token_kind_lifetime() {
        assert_eq!(TokenKind::Access.lifetime(), Duration::minutes(15));
        assert_eq!(TokenKind::Refresh.lifetime(), Duration::days(7));
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(42, TokenKind::Access);

        assert_eq!(claims.sub, 42);
        assert!(!claims.is_expired());
        assert!(claims.exp - claims.iat <= 15 * 60);
    }

    #[test]
    fn test_create_and_verify_token() {
        let claims = Claims::new(42, TokenKind::Access);
        let token = create_token(&claims, ACCESS_SECRET).expect("Should create token");

        let validated = verify_token(&token, ACCESS_SECRET).expect("Should verify token");
        assert_eq!(validated.sub, 42);
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let claims = Claims::new(42, TokenKind::Access);
        let token = create_token(&claims, ACCESS_SECRET).expect("Should create token");

        let result = verify_token(&token, "wrong-secret");
        assert!(matches!(result, Err(JwtError::Invalid(_))));
    }

    #[test]
    fn test_secrets_keep_token_types_apart() {
        let pair = issue_pair(42, ACCESS_SECRET, REFRESH_SECRET).unwrap();

        // A refresh token never validates against the access secret
        assert!(verify_token(&pair.refresh_token, ACCESS_SECRET).is_err());

        // And an access token never validates against the refresh secret
        assert!(verify_token(&pair.access_token, REFRESH_SECRET).is_err());
    }

    #[test]
    fn test_verify_expired_token() {
        // Expired an hour ago, well past the default validation leeway
        let claims = Claims::with_lifetime(42, Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = create_token(&claims, ACCESS_SECRET).expect("Should create token");
        let result = verify_token(&token, ACCESS_SECRET);

        assert!(matches!(result, Err(JwtError::Expired)));
    }

    #[test]
    fn test_issue_pair() {
        let pair = issue_pair(7, ACCESS_SECRET, REFRESH_SECRET).unwrap();

        let access = verify_token(&pair.access_token, ACCESS_SECRET).unwrap();
        let refresh = verify_token(&pair.refresh_token, REFRESH_SECRET).unwrap();

        assert_eq!(access.sub, 7);
        assert_eq!(refresh.sub, 7);

        // The refresh token outlives the access token
        assert!(refresh.exp > access.exp);
    }

    #[test]
    fn test_rotate_access() {
        let pair = issue_pair(7, ACCESS_SECRET, REFRESH_SECRET).unwrap();

        let new_access = rotate_access(&pair.refresh_token, REFRESH_SECRET, ACCESS_SECRET)
            .expect("Should rotate access token");

        let validated = verify_token(&new_access, ACCESS_SECRET).unwrap();
        assert_eq!(validated.sub, 7);
    }

    #[test]
    fn test_rotate_with_access_token_fails() {
        let pair = issue_pair(7, ACCESS_SECRET, REFRESH_SECRET).unwrap();

        // Feeding an access token to rotation must fail: it is signed with
        // the wrong secret
        let result = rotate_access(&pair.access_token, REFRESH_SECRET, ACCESS_SECRET);
        assert!(result.is_err());
    }

    #[test]
    fn test_rotate_with_expired_refresh_fails() {
        let claims = Claims::with_lifetime(7, Duration::seconds(-3600));
        let stale = create_token(&claims, REFRESH_SECRET).unwrap();

        let result = rotate_access(&stale, REFRESH_SECRET, ACCESS_SECRET);
        assert!(matches!(result, Err(JwtError::Expired)));
    }
}
