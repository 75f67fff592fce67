/// Authentication endpoints
///
/// - `POST /auth/register` - Create an account and open a session
/// - `POST /auth/login` - Open a session with existing credentials
/// - `POST /auth/refresh` - Exchange the refresh cookie for a new access token
/// - `POST /auth/logout` - Clear the refresh cookie
///
/// # Session shape
///
/// A session is a pair of tokens. The short-lived access token travels in
/// the response body and is held by the client; the long-lived refresh token
/// travels only in an HTTP-only `SameSite=Lax` cookie scoped to `/`, so
/// browser scripts can never read it. Logout clears the cookie with the
/// same attributes it was set with, otherwise browsers keep the old one.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    routes::{validation_error, MessageResponse},
};
use axum::{extract::State, http::StatusCode, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tasknest_shared::{
    auth::{jwt, password},
    models::user::{CreateUser, PublicUser, User},
};
use validator::Validate;

/// Name of the refresh-token cookie
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    /// Display name
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    pub password: String,
}

/// Response for register and login: the access token plus the public user
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// Access token (15 minutes)
    pub access_token: String,

    /// The authenticated user, without the password hash
    pub user: PublicUser,
}

/// Refresh response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    /// New access token (15 minutes)
    pub access_token: String,
}

/// Builds the refresh-token cookie
///
/// `Secure` is set only in production so local development over plain HTTP
/// keeps working.
fn refresh_cookie(token: String, production: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token))
        .http_only(true)
        .secure(production)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::days(7))
        .build()
}

/// Builds an expired cookie with attributes identical to [`refresh_cookie`]
fn clear_refresh_cookie(production: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, ""))
        .http_only(true)
        .secure(production)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(time::Duration::ZERO)
        .build()
}

/// Register a new user
///
/// # Endpoint
///
/// ```text
/// POST /auth/register
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "pw123456",
///   "name": "Jane Doe"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed or email already registered
/// - `500 Internal Server Error`: store error
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, CookieJar, Json<AuthResponse>)> {
    req.validate().map_err(validation_error)?;

    // Duplicate email is a validation failure (400), not a conflict
    if User::find_by_email(&state.db, &req.email).await?.is_some() {
        return Err(ApiError::BadRequest("User already exists".to_string()));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            email: req.email,
            password_hash,
            name: req.name,
        },
    )
    .await?;

    let pair = jwt::issue_pair(user.id, state.access_secret(), state.refresh_secret())?;

    tracing::info!(user_id = user.id, "User registered");

    let jar = jar.add(refresh_cookie(
        pair.refresh_token,
        state.config.api.production,
    ));

    Ok((
        StatusCode::CREATED,
        jar,
        Json(AuthResponse {
            access_token: pair.access_token,
            user: PublicUser::from(&user),
        }),
    ))
}

/// Login with email and password
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// {
///   "email": "user@example.com",
///   "password": "pw123456"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: unknown email or wrong password — the same message
///   for both, so the response never confirms an email exists
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> ApiResult<(CookieJar, Json<AuthResponse>)> {
    req.validate().map_err(validation_error)?;

    let user = User::find_by_email(&state.db, &req.email)
        .await?
        .ok_or_else(|| ApiError::BadRequest("Invalid credentials".to_string()))?;

    let valid = password::verify_password(&req.password, &user.password_hash)?;
    if !valid {
        return Err(ApiError::BadRequest("Invalid credentials".to_string()));
    }

    let pair = jwt::issue_pair(user.id, state.access_secret(), state.refresh_secret())?;

    tracing::info!(user_id = user.id, "User logged in");

    let jar = jar.add(refresh_cookie(
        pair.refresh_token,
        state.config.api.production,
    ));

    Ok((
        jar,
        Json(AuthResponse {
            access_token: pair.access_token,
            user: PublicUser::from(&user),
        }),
    ))
}

/// Exchange the refresh cookie for a new access token
///
/// The refresh token arrives in the HTTP-only cookie set at login, not in a
/// header or body. On success only a new access token is minted; the
/// refresh token keeps its original 7-day expiry, so refreshing never
/// extends the session.
///
/// # Errors
///
/// - `401 Unauthorized`: no refresh cookie present
/// - `403 Forbidden`: cookie present but invalid or expired
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> ApiResult<Json<RefreshResponse>> {
    let cookie = jar
        .get(REFRESH_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("No refresh token found".to_string()))?;

    let access_token =
        jwt::rotate_access(cookie.value(), state.refresh_secret(), state.access_secret())
            .map_err(|_| ApiError::Forbidden("Invalid refresh token".to_string()))?;

    Ok(Json(RefreshResponse { access_token }))
}

/// Logout: clear the refresh cookie
///
/// The clearing cookie must carry the same attributes the session cookie was
/// created with. Always succeeds, even without an active session.
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> (CookieJar, Json<MessageResponse>) {
    let jar = jar.add(clear_refresh_cookie(state.config.api.production));

    (jar, Json(MessageResponse::new("Logged out successfully")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_cookie_attributes() {
        let cookie = refresh_cookie("tok".to_string(), false);

        assert_eq!(cookie.name(), REFRESH_COOKIE);
        assert_eq!(cookie.value(), "tok");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.max_age(), Some(time::Duration::days(7)));
    }

    #[test]
    fn test_secure_only_in_production() {
        assert_eq!(refresh_cookie("tok".to_string(), true).secure(), Some(true));
    }

    #[test]
    fn test_clear_cookie_matches_attributes() {
        let set = refresh_cookie("tok".to_string(), true);
        let clear = clear_refresh_cookie(true);

        assert_eq!(clear.name(), set.name());
        assert_eq!(clear.path(), set.path());
        assert_eq!(clear.http_only(), set.http_only());
        assert_eq!(clear.secure(), set.secure());
        assert_eq!(clear.same_site(), set.same_site());
        assert_eq!(clear.max_age(), Some(time::Duration::ZERO));
    }

    #[test]
    fn test_register_request_validation() {
        let req = RegisterRequest {
            email: "not-an-email".to_string(),
            password: "pw123456".to_string(),
            name: "A".to_string(),
        };
        assert!(req.validate().is_err());

        let req = RegisterRequest {
            email: "a@x.com".to_string(),
            password: "short".to_string(),
            name: "A".to_string(),
        };
        assert!(req.validate().is_err());

        let req = RegisterRequest {
            email: "a@x.com".to_string(),
            password: "pw123456".to_string(),
            name: "A".to_string(),
        };
        assert!(req.validate().is_ok());
    }
}
