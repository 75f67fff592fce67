/// Database layer for TaskNest
///
/// Connection pooling and embedded migrations. Models live in
/// [`crate::models`].

pub mod migrations;
pub mod pool;

pub use migrations::run_migrations;
pub use pool::{create_pool, DatabaseConfig};
