//! # TaskNest Shared Library
//!
//! This crate contains the types and business logic shared between the
//! TaskNest API server and the TaskNest client.
//!
//! ## Module Organization
//!
//! - `models`: Database models and data structures
//! - `auth`: Token issuance, password hashing, and auth middleware primitives
//! - `db`: Connection pool and migrations

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the TaskNest shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
