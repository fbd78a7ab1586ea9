// Billing crate clippy configuration
#![allow(clippy::result_large_err)] // BillingError carries owned messages
// Test code patterns (expected in test files):
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Rollcall Billing Module
//!
//! Tenant subscription lifecycle: plans, status transitions, validation and
//! storage.
//!
//! ## Features
//!
//! - **Subscription Management**: Create, update, cancel and list subscriptions
//! - **Single Active Subscription**: At most one ACTIVE subscription per tenant,
//!   enforced atomically by the store
//! - **Plan History**: Append-only record of upgrades, downgrades, grace
//!   conversions and cancellations
//! - **Status Machine**: Explicit table of allowed status moves
//! - **Storage**: PostgreSQL or in-memory backends behind one trait

pub mod error;
pub mod memory;
pub mod model;
pub mod pg;
pub mod plans;
pub mod repository;
pub mod subscriptions;
pub mod transitions;
pub mod validation;


// Error
pub use error::{BillingError, BillingResult};

// Model
pub use model::{
    CancelSubscriptionRequest, CreateSubscriptionRequest, Metadata, PlanChange, Subscription,
    UpdateSubscriptionRequest, DEFAULT_CURRENCY,
};

// Plans
pub use plans::{Plan, CATALOGUE_CURRENCY};

// Storage
pub use memory::InMemorySubscriptionRepository;
pub use pg::PgSubscriptionRepository;
pub use repository::{ListQuery, SubscriptionRepository};

// Subscriptions
pub use subscriptions::{
    ListOptions, Pagination, SubscriptionPage, SubscriptionService, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};

// Transitions
pub use transitions::{allowed_transitions, validate_status_transition, SubscriptionEvent};
