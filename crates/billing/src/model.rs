//! Subscription records and request payloads

use rollcall_shared::{BillingCycle, PlanChangeType, PlanId, SubscriptionStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::BillingResult;
use crate::validation;

/// Caller-defined key/value bag stored with a subscription
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Default currency for new subscriptions
pub const DEFAULT_CURRENCY: &str = "EUR";

/// One entry of a subscription's append-only plan history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanChange {
    pub from_plan_id: PlanId,
    pub to_plan_id: PlanId,
    #[serde(with = "time::serde::rfc3339")]
    pub changed_at: OffsetDateTime,
    pub change_type: PlanChangeType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_difference: Decimal,
    #[serde(with = "time::serde::rfc3339")]
    pub effective_date: OffsetDateTime,
    pub changed_by: String,
}

/// Tenant subscription record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub tenant_id: String,
    pub plan_id: PlanId,
    pub status: SubscriptionStatus,
    pub billing_cycle: BillingCycle,
    #[serde(with = "rust_decimal::serde::float")]
    pub base_price: Decimal,
    pub currency: String,
    pub is_in_grace_period: bool,
    pub grace_period_id: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub grace_period_ends_at: Option<OffsetDateTime>,
    pub plan_history: Vec<PlanChange>,
    pub metadata: Metadata,
    pub created_by: String,
    pub updated_by: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub cancelled_at: Option<OffsetDateTime>,
    pub cancelled_by: Option<String>,
    pub cancellation_reason: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl Subscription {
    /// Build a new ACTIVE subscription from a create request.
    ///
    /// New records start at base price 0 in EUR with an empty plan history.
    /// Fails when the plan id is missing or not in the whitelist.
    pub fn from_create_request(
        request: CreateSubscriptionRequest,
        tenant_id: &str,
        user_id: &str,
        now: OffsetDateTime,
    ) -> BillingResult<Self> {
        let plan_id = validation::parse_plan_id(request.plan_id.as_deref())?;

        Ok(Self {
            id: Uuid::new_v4(),
            tenant_id: tenant_id.to_string(),
            plan_id,
            status: SubscriptionStatus::Active,
            billing_cycle: request.billing_cycle.unwrap_or_default(),
            base_price: Decimal::ZERO,
            currency: DEFAULT_CURRENCY.to_string(),
            is_in_grace_period: false,
            grace_period_id: None,
            grace_period_ends_at: None,
            plan_history: Vec::new(),
            metadata: request.metadata.unwrap_or_default(),
            created_by: user_id.to_string(),
            updated_by: None,
            cancelled_at: None,
            cancelled_by: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == SubscriptionStatus::Active
    }

    /// Drop all grace-period fields
    pub(crate) fn clear_grace_period(&mut self) {
        self.is_in_grace_period = false;
        self.grace_period_id = None;
        self.grace_period_ends_at = None;
    }
}

/// Body of `POST /subscriptions`
///
/// `plan_id` stays a raw string so that a missing or unknown plan surfaces as
/// a validation error naming the field rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubscriptionRequest {
    pub plan_id: Option<String>,
    pub billing_cycle: Option<BillingCycle>,
    pub metadata: Option<Metadata>,
}

/// Body of `PUT /subscriptions/{id}`; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSubscriptionRequest {
    pub plan_id: Option<String>,
    pub status: Option<String>,
    pub metadata: Option<Metadata>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub base_price: Option<Decimal>,
    pub currency: Option<String>,
    pub grace_period_id: Option<String>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub grace_period_ends_at: Option<OffsetDateTime>,
    /// Recorded on the plan history entry when the plan changes
    pub reason: Option<String>,
}

/// Body of `DELETE /subscriptions/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelSubscriptionRequest {
    pub reason: Option<String>,
}
