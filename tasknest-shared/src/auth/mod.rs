/// Authentication utilities
///
/// This module provides the authentication primitives for TaskNest:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`jwt`]: Access/refresh token issuance and verification
/// - [`middleware`]: Bearer-token auth context for Axum handlers
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **Tokens**: HS256-signed JWTs; the access and refresh tokens use
///   independent secrets and independent lifetimes (15 minutes / 7 days)
/// - **Constant-time Comparison**: Password verification is constant-time
///
/// # Example
///
/// ```no_run
/// use tasknest_shared::auth::password::{hash_password, verify_password};
/// use tasknest_shared::auth::jwt::{issue_pair, verify_token};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
///
/// let pair = issue_pair(42, "access-secret", "refresh-secret")?;
/// let claims = verify_token(&pair.access_token, "access-secret")?;
/// assert_eq!(claims.sub, 42);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
