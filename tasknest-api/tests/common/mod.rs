/// Common test utilities for integration tests
///
/// These tests exercise the real router against a real Postgres. They need
/// `DATABASE_URL` pointing at a disposable database; when it is not set,
/// [`TestContext::new`] returns `None` and the test skips, so the rest of
/// the suite stays runnable without infrastructure.
///
/// Every context tags its users with a unique email prefix and `cleanup`
/// deletes by that prefix, so concurrent test runs do not collide.

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use serde_json::json;
use sqlx::PgPool;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tasknest_api::app::{build_router, AppState};
use tasknest_api::config::{ApiConfig, Config, DatabaseConfig, TokenConfig};
use tasknest_shared::db::run_migrations;
use tower::Service as _;

/// Password used for every test account
pub const TEST_PASSWORD: &str = "pw123456";

/// An authenticated user created through the register endpoint
pub struct Session {
    pub user_id: i64,
    pub email: String,
    pub access_token: String,
    /// The `refreshToken=...` pair from the Set-Cookie header
    pub refresh_cookie: String,
}

impl Session {
    /// Returns the Authorization header value for this session
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Test context holding the app router and database handle
pub struct TestContext {
    pub db: PgPool,
    pub app: Router,
    pub config: Config,
    tag: u128,
    counter: AtomicUsize,
}

impl TestContext {
    /// Creates a test context, or `None` when `DATABASE_URL` is not set
    pub async fn new() -> anyhow::Result<Option<Self>> {
        dotenvy::dotenv().ok();

        let Ok(database_url) = std::env::var("DATABASE_URL") else {
            eprintln!("DATABASE_URL not set, skipping integration test");
            return Ok(None);
        };

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            database: DatabaseConfig {
                url: database_url.clone(),
                max_connections: 5,
            },
            tokens: TokenConfig {
                access_secret: "integration-access-secret-0123456789abcdef".to_string(),
                refresh_secret: "integration-refresh-secret-0123456789abcdef".to_string(),
            },
        };

        let db = PgPool::connect(&database_url).await?;
        run_migrations(&db).await?;

        let state = AppState::new(db.clone(), config.clone());
        let app = build_router(state);

        let tag = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock before epoch")
            .as_nanos();

        Ok(Some(TestContext {
            db,
            app,
            config,
            tag,
            counter: AtomicUsize::new(0),
        }))
    }

    /// Returns an email address unique to this context
    pub fn unique_email(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        format!("it-{}-{}@example.com", self.tag, n)
    }

    /// Sends a request through the router and decodes the JSON body
    pub async fn send(
        &self,
        request: Request<Body>,
    ) -> anyhow::Result<(StatusCode, HeaderMap, serde_json::Value)> {
        let response = self.app.clone().call(request).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes)?
        };

        Ok((status, headers, body))
    }

    /// Builds a JSON request, optionally with an Authorization header
    pub fn json_request(
        method: &str,
        uri: &str,
        auth: Option<&str>,
        body: &serde_json::Value,
    ) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");

        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }

        builder
            .body(Body::from(body.to_string()))
            .expect("failed to build request")
    }

    /// Builds a bodyless request, optionally with an Authorization header
    pub fn empty_request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }

        builder.body(Body::empty()).expect("failed to build request")
    }

    /// Registers a fresh user through the API and returns the session
    pub async fn register(&self, name: &str) -> anyhow::Result<Session> {
        let email = self.unique_email();
        let request = Self::json_request(
            "POST",
            "/auth/register",
            None,
            &json!({
                "email": email,
                "password": TEST_PASSWORD,
                "name": name,
            }),
        );

        let (status, headers, body) = self.send(request).await?;
        anyhow::ensure!(
            status == StatusCode::CREATED,
            "register failed with {}: {}",
            status,
            body
        );

        let refresh_cookie = refresh_cookie_pair(&headers)
            .ok_or_else(|| anyhow::anyhow!("register did not set the refresh cookie"))?;

        Ok(Session {
            user_id: body["user"]["id"]
                .as_i64()
                .ok_or_else(|| anyhow::anyhow!("register response missing user id"))?,
            email,
            access_token: body["accessToken"]
                .as_str()
                .ok_or_else(|| anyhow::anyhow!("register response missing access token"))?
                .to_string(),
            refresh_cookie,
        })
    }

    /// Creates a task through the API and returns its id
    pub async fn create_task(
        &self,
        session: &Session,
        title: &str,
        status: Option<&str>,
    ) -> anyhow::Result<i64> {
        let mut body = json!({ "title": title });
        if let Some(status) = status {
            body["status"] = json!(status);
        }

        let request = Self::json_request("POST", "/tasks", Some(&session.auth_header()), &body);
        let (status, _, body) = self.send(request).await?;

        anyhow::ensure!(
            status == StatusCode::CREATED,
            "create task failed with {}: {}",
            status,
            body
        );

        body["id"]
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("create response missing task id"))
    }

    /// Deletes every user (and, via cascade, every task) this context made
    pub async fn cleanup(&self) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM users WHERE email LIKE $1")
            .bind(format!("it-{}-%", self.tag))
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Extracts the `refreshToken=...` pair from a Set-Cookie header
pub fn refresh_cookie_pair(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|cookie| cookie.starts_with("refreshToken="))
        .map(|cookie| {
            cookie
                .split(';')
                .next()
                .unwrap_or(cookie)
                .trim()
                .to_string()
        })
}
