#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Rollcall shared types
//!
//! Plan tiers, subscription statuses and database plumbing used by both the
//! billing core and the API server.

pub mod db;
pub mod types;

pub use db::{create_migration_pool, create_pool, run_migrations};
pub use types::{BillingCycle, ParseEnumError, PlanChangeType, PlanId, SubscriptionStatus};
