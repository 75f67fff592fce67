/// Database models for TaskNest
///
/// # Models
///
/// - [`user::User`]: registered account, owner of tasks
/// - [`task::Task`]: a single to-do item, always scoped to its owner

pub mod task;
pub mod user;
