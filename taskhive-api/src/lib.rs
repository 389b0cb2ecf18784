//! # Taskhive API Server library
//!
//! Everything the binary needs, exported so the integration tests can
//! build the router against their own database:
//!
//! - `app`: Application state and router construction
//! - `config`: Environment-driven configuration
//! - `error`: The HTTP error type and its conversions
//! - `mail`: Fire-and-forget mail relay client
//! - `routes`: Request handlers

pub mod app;
pub mod config;
pub mod error;
pub mod mail;
pub mod routes;
