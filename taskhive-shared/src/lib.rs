//! # Taskhive Shared Library
//!
//! This crate contains the types and business logic shared by the Taskhive
//! API server: database models, the authentication subsystem, and the
//! database pool/migration helpers.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing, bearer tokens, and request authentication
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Taskhive shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
