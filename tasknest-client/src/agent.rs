/// The client session agent
///
/// Wraps a reqwest client with the TaskNest session protocol:
///
/// 1. Every outbound request attaches the currently held access token as a
///    bearer credential, if one is held.
/// 2. On a 401/403 response the agent calls `POST /auth/refresh` — the
///    refresh token rides along automatically in the HTTP-only cookie kept
///    by the transport's cookie store — and replays the original request
///    exactly once with the new token.
/// 3. A failure on the replayed request is surfaced to the caller; it is
///    never retried again, so a broken session cannot loop.
/// 4. If the refresh itself fails, all held session state is cleared and
///    [`SessionError::SessionExpired`] tells the caller to re-authenticate.
///
/// Concurrent requests that bounce at the same moment share one refresh: an
/// async mutex gates the refresh call, and a waiter that acquires the gate
/// after the token already rotated reuses the fresh token instead of
/// spending a second round trip.

use crate::{
    error::{MessageBody, SessionError, SessionResult},
    store::{MemoryTokenStore, TokenStore},
};
use reqwest::{Method, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tasknest_shared::models::{
    task::{Task, TaskStatus},
    user::PublicUser,
};
use tokio::sync::Mutex;

/// Login/register response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AuthResponse {
    access_token: String,
    user: PublicUser,
}

/// Refresh response body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RefreshResponse {
    access_token: String,
}

/// Pagination metadata from the list endpoint
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Total number of tasks matching the filter
    pub total_tasks: i64,

    /// Total number of pages
    pub total_pages: i64,

    /// The page that was returned
    pub current_page: i64,

    /// The page size that was applied
    pub page_size: i64,
}

/// One page of tasks plus pagination metadata
#[derive(Debug, Deserialize)]
pub struct TaskPage {
    /// The requested page, newest first
    pub tasks: Vec<Task>,

    /// Pagination metadata
    pub pagination: Pagination,
}

/// Filter and pagination parameters for [`SessionAgent::list_tasks`]
#[derive(Debug, Clone, Default)]
pub struct TaskQuery {
    /// 1-based page number
    pub page: Option<i64>,

    /// Items per page
    pub limit: Option<i64>,

    /// Status filter; `None` lists every status
    pub status: Option<TaskStatus>,

    /// Case-insensitive substring match on the title
    pub search: Option<String>,
}

impl TaskQuery {
    fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();

        if let Some(page) = self.page {
            params.push(("page", page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }

        params
    }
}

/// Fields for creating a task
#[derive(Debug, Clone, Serialize)]
pub struct NewTask {
    /// Task title, required
    pub title: String,

    /// Optional description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Initial status; the server defaults to PENDING when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

/// Partial-update fields; only set fields are sent
#[derive(Debug, Clone, Default, Serialize)]
pub struct TaskPatch {
    /// New title
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// New description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// New status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
}

/// A TaskNest session: typed API calls with transparent token refresh
pub struct SessionAgent {
    http: reqwest::Client,
    base_url: String,
    store: Arc<dyn TokenStore>,
    refresh_gate: Mutex<()>,
}

impl SessionAgent {
    /// Creates an agent with the default in-memory token store
    pub fn new(base_url: impl Into<String>) -> SessionResult<Self> {
        Self::with_store(base_url, Arc::new(MemoryTokenStore::new()))
    }

    /// Creates an agent with an injected token store
    ///
    /// The underlying HTTP client keeps a cookie store so the refresh-token
    /// cookie set at login flows back on refresh calls without the agent
    /// ever touching it.
    pub fn with_store(
        base_url: impl Into<String>,
        store: Arc<dyn TokenStore>,
    ) -> SessionResult<Self> {
        let http = reqwest::Client::builder().cookie_store(true).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            store,
            refresh_gate: Mutex::new(()),
        })
    }

    /// Returns the currently held access token, if any
    pub fn access_token(&self) -> Option<String> {
        self.store.load()
    }

    /// Registers a new account and opens a session
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> SessionResult<PublicUser> {
        let response = self
            .http
            .post(self.url("/auth/register"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "name": name,
            }))
            .send()
            .await?;

        let auth: AuthResponse = expect_json(response).await?;
        self.store.store(&auth.access_token);

        Ok(auth.user)
    }

    /// Logs in with existing credentials and opens a session
    pub async fn login(&self, email: &str, password: &str) -> SessionResult<PublicUser> {
        let response = self
            .http
            .post(self.url("/auth/login"))
            .json(&serde_json::json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        let auth: AuthResponse = expect_json(response).await?;
        self.store.store(&auth.access_token);

        Ok(auth.user)
    }

    /// Ends the session: clears the server-side cookie and the held token
    pub async fn logout(&self) -> SessionResult<()> {
        let response = self.http.post(self.url("/auth/logout")).send().await?;
        self.store.clear();

        expect_json::<MessageBody>(response).await?;
        Ok(())
    }

    /// Lists tasks with pagination, status filter, and title search
    pub async fn list_tasks(&self, query: &TaskQuery) -> SessionResult<TaskPage> {
        let response = self
            .send_authorized(Method::GET, "/tasks", &query.to_params(), None)
            .await?;

        expect_json(response).await
    }

    /// Creates a task
    pub async fn create_task(&self, task: &NewTask) -> SessionResult<Task> {
        let body = serde_json::to_value(task)?;
        let response = self
            .send_authorized(Method::POST, "/tasks", &[], Some(body))
            .await?;

        expect_json(response).await
    }

    /// Partially updates a task
    pub async fn update_task(&self, id: i64, patch: &TaskPatch) -> SessionResult<Task> {
        let body = serde_json::to_value(patch)?;
        let response = self
            .send_authorized(Method::PATCH, &format!("/tasks/{}", id), &[], Some(body))
            .await?;

        expect_json(response).await
    }

    /// Deletes a task
    pub async fn delete_task(&self, id: i64) -> SessionResult<()> {
        let response = self
            .send_authorized(Method::DELETE, &format!("/tasks/{}", id), &[], None)
            .await?;

        expect_json::<MessageBody>(response).await?;
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends a bearer-authorized request with the single-attempt
    /// refresh-and-replay policy
    async fn send_authorized(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<serde_json::Value>,
    ) -> SessionResult<Response> {
        let token = self.store.load();
        let response = self
            .request(method.clone(), path, query, body.as_ref(), token.as_deref())
            .await?;

        let status = response.status();
        if status != StatusCode::UNAUTHORIZED && status != StatusCode::FORBIDDEN {
            return Ok(response);
        }

        tracing::debug!(%status, path, "Access token rejected, attempting refresh");

        // One refresh, one replay. Whatever comes back the second time is
        // the caller's answer.
        let fresh = self.refresh_access(token.as_deref()).await?;

        self.request(method, path, query, body.as_ref(), Some(&fresh))
            .await
            .map_err(SessionError::from)
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&'static str, String)],
        body: Option<&serde_json::Value>,
        bearer: Option<&str>,
    ) -> Result<Response, reqwest::Error> {
        let mut request = self.http.request(method, self.url(path));

        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        request.send().await
    }

    /// Exchanges the refresh cookie for a new access token
    ///
    /// `stale` is the token the caller just had rejected. Refreshes are
    /// serialized through a gate; if the held token changed while we waited,
    /// another caller already refreshed and we reuse their result.
    async fn refresh_access(&self, stale: Option<&str>) -> SessionResult<String> {
        let _guard = self.refresh_gate.lock().await;

        if let Some(current) = self.store.load() {
            if Some(current.as_str()) != stale {
                tracing::debug!("Reusing access token refreshed by a concurrent request");
                return Ok(current);
            }
        }

        let response = self.http.post(self.url("/auth/refresh")).send().await?;

        if !response.status().is_success() {
            tracing::debug!(status = %response.status(), "Refresh rejected, clearing session");
            self.store.clear();
            return Err(SessionError::SessionExpired);
        }

        let refreshed: RefreshResponse = response.json().await?;
        self.store.store(&refreshed.access_token);

        Ok(refreshed.access_token)
    }
}

/// Parses a success body, or maps an error status to [`SessionError::Api`]
async fn expect_json<T: serde::de::DeserializeOwned>(response: Response) -> SessionResult<T> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = response
        .json::<MessageBody>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.to_string());

    Err(SessionError::Api {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let agent = SessionAgent::new("http://localhost:8080/").unwrap();
        assert_eq!(agent.url("/tasks"), "http://localhost:8080/tasks");
    }

    #[test]
    fn test_task_query_params() {
        let query = TaskQuery {
            page: Some(2),
            limit: Some(10),
            status: Some(TaskStatus::Completed),
            search: Some("plants".to_string()),
        };

        let params = query.to_params();
        assert!(params.contains(&("page", "2".to_string())));
        assert!(params.contains(&("limit", "10".to_string())));
        assert!(params.contains(&("status", "COMPLETED".to_string())));
        assert!(params.contains(&("search", "plants".to_string())));

        assert!(TaskQuery::default().to_params().is_empty());
    }

    #[test]
    fn test_patch_skips_unset_fields() {
        let patch = TaskPatch {
            status: Some(TaskStatus::Completed),
            ..Default::default()
        };

        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"status":"COMPLETED"}"#);
    }
}
