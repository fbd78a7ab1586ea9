// Test code patterns:
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Rollcall API Library
//!
//! This crate contains the API server components for Rollcall.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{Config, LogFormat};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
