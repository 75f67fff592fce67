//! # TaskNest Client
//!
//! A typed client for the TaskNest API that makes token expiry invisible to
//! callers. The [`agent::SessionAgent`] holds the current access token in an
//! injectable [`store::TokenStore`] and, when a request bounces with 401/403,
//! silently exchanges the refresh cookie for a new access token and replays
//! the request exactly once.
//!
//! ## Example
//!
//! ```no_run
//! use tasknest_client::agent::SessionAgent;
//!
//! # async fn example() -> Result<(), tasknest_client::error::SessionError> {
//! let agent = SessionAgent::new("http://localhost:8080")?;
//! agent.login("user@example.com", "pw123456").await?;
//!
//! let page = agent.list_tasks(&Default::default()).await?;
//! println!("{} tasks", page.pagination.total_tasks);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod error;
pub mod store;

pub use agent::SessionAgent;
pub use error::SessionError;
pub use store::{MemoryTokenStore, TokenStore};
