//! Subscription storage interface
//!
//! Every lookup takes the tenant id and filters on it inside the store, so no
//! method can return another tenant's record.

use async_trait::async_trait;
use rollcall_shared::SubscriptionStatus;
use uuid::Uuid;

use crate::error::BillingResult;
use crate::model::Subscription;

/// Message used for every single-active-subscription conflict
pub const ACTIVE_CONFLICT_MESSAGE: &str = "Tenant already has an active subscription";

/// Page window for listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub status: Option<SubscriptionStatus>,
    pub offset: u64,
    pub limit: u64,
}

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Persist a new record.
    ///
    /// When the record is ACTIVE the check for an existing ACTIVE record of
    /// the same tenant and the write happen atomically; a second one fails
    /// with `BillingError::Conflict`.
    async fn insert(&self, sub: &Subscription) -> BillingResult<()>;

    /// Find a record of `tenant_id` by id
    async fn find(&self, tenant_id: &str, id: Uuid) -> BillingResult<Option<Subscription>>;

    /// The tenant's ACTIVE record, if any
    async fn find_active(&self, tenant_id: &str) -> BillingResult<Option<Subscription>>;

    /// Replace the stored record of `tenant_id` with the same id.
    ///
    /// Fails with `NotFound` when no such record exists and with `Conflict`
    /// when the record becomes ACTIVE while another one already is.
    async fn update(&self, tenant_id: &str, sub: &Subscription) -> BillingResult<()>;

    /// Records of `tenant_id`, newest first
    async fn list(&self, tenant_id: &str, query: ListQuery) -> BillingResult<Vec<Subscription>>;

    /// Number of records of `tenant_id`, optionally restricted to one status
    async fn count(
        &self,
        tenant_id: &str,
        status: Option<SubscriptionStatus>,
    ) -> BillingResult<u64>;
}
