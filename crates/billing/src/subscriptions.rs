//! Subscription management
//!
//! Create, read, update, cancel and list tenant subscriptions. Status changes
//! go through [`crate::transitions`]; the one-ACTIVE-per-tenant rule is
//! enforced atomically by the repository.

use std::sync::Arc;

use rollcall_shared::{PlanChangeType, SubscriptionStatus};
use rust_decimal::Decimal;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::memory::InMemorySubscriptionRepository;
use crate::model::{
    CancelSubscriptionRequest, CreateSubscriptionRequest, PlanChange, Subscription,
    UpdateSubscriptionRequest,
};
use crate::plans;
use crate::repository::{ListQuery, SubscriptionRepository};
use crate::transitions::{self, SubscriptionEvent};
use crate::validation;

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Largest page size a caller can request
pub const MAX_PAGE_SIZE: u64 = 100;

/// Listing options as received from the caller, before clamping
#[derive(Debug, Clone, Copy, Default)]
pub struct ListOptions {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<SubscriptionStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionPage {
    pub data: Vec<Subscription>,
    pub pagination: Pagination,
}

/// Normalize page/limit: page starts at 1, limit is clamped to [1, MAX_PAGE_SIZE]
fn page_window(page: Option<i64>, limit: Option<i64>) -> (u64, u64) {
    let page = u64::try_from(page.unwrap_or(1).max(1)).unwrap_or(1);
    let limit = limit
        .map(|l| u64::try_from(l.max(1)).unwrap_or(1))
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .min(MAX_PAGE_SIZE);
    (page, limit)
}

/// Current time at the microsecond precision PostgreSQL keeps
fn now_micros() -> OffsetDateTime {
    let now = OffsetDateTime::now_utc();
    now.replace_nanosecond(now.nanosecond() / 1_000 * 1_000)
        .unwrap_or(now)
}

fn not_found() -> BillingError {
    BillingError::NotFound("Subscription not found".to_string())
}

#[derive(Clone)]
pub struct SubscriptionService {
    repo: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionService {
    pub fn new(repo: Arc<dyn SubscriptionRepository>) -> Self {
        Self { repo }
    }

    /// Service backed by the in-memory store
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySubscriptionRepository::new()))
    }

    /// Create a new ACTIVE subscription for `tenant_id`.
    ///
    /// Fails with `Validation` when the plan id is missing or unknown and
    /// with `Conflict` when the tenant already has an ACTIVE subscription.
    pub async fn create_subscription(
        &self,
        request: CreateSubscriptionRequest,
        tenant_id: &str,
        user_id: &str,
    ) -> BillingResult<Subscription> {
        let now = now_micros();
        let sub = Subscription::from_create_request(request, tenant_id, user_id, now)?;
        validation::validate_subscription(&sub, now)?;

        if let Err(e) = self.repo.insert(&sub).await {
            if matches!(e, BillingError::Conflict(_)) {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    plan_id = %sub.plan_id,
                    "Rejected subscription: tenant already has an active one"
                );
            }
            return Err(e);
        }

        tracing::info!(
            tenant_id = %tenant_id,
            subscription_id = %sub.id,
            plan_id = %sub.plan_id,
            created_by = %user_id,
            "Subscription created"
        );

        Ok(sub)
    }

    /// Fetch a subscription of the caller's tenant.
    ///
    /// Records of other tenants look exactly like missing ones.
    pub async fn get_subscription(
        &self,
        id: Uuid,
        tenant_id: &str,
    ) -> BillingResult<Option<Subscription>> {
        self.repo.find(tenant_id, id).await
    }

    pub async fn get_active_subscription_by_tenant(
        &self,
        tenant_id: &str,
    ) -> BillingResult<Option<Subscription>> {
        self.repo.find_active(tenant_id).await
    }

    /// Merge `updates` into the stored record and persist it.
    ///
    /// Plan moves append UPGRADE/DOWNGRADE history, GRACE_PERIOD -> ACTIVE
    /// appends GRACE_CONVERSION, and the merged record is re-validated before
    /// it is written.
    pub async fn update_subscription(
        &self,
        id: Uuid,
        updates: UpdateSubscriptionRequest,
        tenant_id: &str,
        user_id: &str,
    ) -> BillingResult<Subscription> {
        let mut sub = self
            .repo
            .find(tenant_id, id)
            .await?
            .ok_or_else(not_found)?;

        if sub.status.is_terminal() {
            return Err(BillingError::validation(
                "status",
                "Cancelled subscriptions cannot be updated",
            ));
        }

        let now = now_micros();

        if let Some(raw_plan) = updates.plan_id.as_deref() {
            let new_plan = validation::parse_plan_id(Some(raw_plan))?;
            if new_plan != sub.plan_id {
                sub.plan_history.push(PlanChange {
                    from_plan_id: sub.plan_id,
                    to_plan_id: new_plan,
                    changed_at: now,
                    change_type: PlanChangeType::for_plan_move(sub.plan_id, new_plan),
                    reason: updates.reason.clone(),
                    price_difference: plans::price_difference(sub.plan_id, new_plan),
                    effective_date: now,
                    changed_by: user_id.to_string(),
                });
                sub.plan_id = new_plan;
            }
        }

        if let Some(grace_id) = updates.grace_period_id {
            sub.grace_period_id = Some(grace_id);
        }
        if let Some(ends_at) = updates.grace_period_ends_at {
            sub.grace_period_ends_at = Some(ends_at);
        }

        if let Some(raw_status) = updates.status.as_deref() {
            let target = validation::parse_status(raw_status)?;
            if target == SubscriptionStatus::Cancelled {
                return Err(BillingError::validation(
                    "status",
                    "Use the cancel operation to cancel a subscription",
                ));
            }

            if target != sub.status {
                let from = sub.status;
                sub.status = transitions::next_status(from, SubscriptionEvent::targeting(target))?;

                if from == SubscriptionStatus::GracePeriod {
                    if target == SubscriptionStatus::Active {
                        sub.plan_history.push(PlanChange {
                            from_plan_id: sub.plan_id,
                            to_plan_id: sub.plan_id,
                            changed_at: now,
                            change_type: PlanChangeType::GraceConversion,
                            reason: updates.reason.clone(),
                            price_difference: Decimal::ZERO,
                            effective_date: now,
                            changed_by: user_id.to_string(),
                        });
                    }
                    sub.clear_grace_period();
                }

                tracing::info!(
                    tenant_id = %tenant_id,
                    subscription_id = %id,
                    from = %from,
                    to = %target,
                    "Subscription status changed"
                );
            }
        }

        if sub.status == SubscriptionStatus::GracePeriod {
            sub.is_in_grace_period = true;
        }

        if let Some(metadata) = updates.metadata {
            sub.metadata = metadata;
        }
        if let Some(base_price) = updates.base_price {
            sub.base_price = base_price;
        }
        if let Some(currency) = updates.currency {
            sub.currency = currency;
        }

        sub.updated_at = now;
        sub.updated_by = Some(user_id.to_string());

        validation::validate_subscription(&sub, now)?;
        self.repo.update(tenant_id, &sub).await?;

        tracing::debug!(
            tenant_id = %tenant_id,
            subscription_id = %id,
            updated_by = %user_id,
            "Subscription updated"
        );

        Ok(sub)
    }

    /// Cancel a subscription. Cancelling twice fails with `Validation`.
    pub async fn cancel_subscription(
        &self,
        id: Uuid,
        tenant_id: &str,
        user_id: &str,
        request: CancelSubscriptionRequest,
    ) -> BillingResult<Subscription> {
        let mut sub = self
            .repo
            .find(tenant_id, id)
            .await?
            .ok_or_else(not_found)?;

        if sub.status == SubscriptionStatus::Cancelled {
            return Err(BillingError::validation(
                "status",
                "Subscription is already cancelled",
            ));
        }

        let from = sub.status;
        sub.status = transitions::next_status(from, SubscriptionEvent::Cancel)?;

        let now = now_micros();
        sub.plan_history.push(PlanChange {
            from_plan_id: sub.plan_id,
            to_plan_id: sub.plan_id,
            changed_at: now,
            change_type: PlanChangeType::Cancellation,
            reason: request.reason.clone(),
            price_difference: Decimal::ZERO,
            effective_date: now,
            changed_by: user_id.to_string(),
        });
        sub.clear_grace_period();
        sub.cancelled_at = Some(now);
        sub.cancelled_by = Some(user_id.to_string());
        sub.cancellation_reason = request.reason;
        sub.updated_at = now;
        sub.updated_by = Some(user_id.to_string());

        self.repo.update(tenant_id, &sub).await?;

        tracing::info!(
            tenant_id = %tenant_id,
            subscription_id = %id,
            previous_status = %from,
            cancelled_by = %user_id,
            reason = ?sub.cancellation_reason,
            "Subscription cancelled"
        );

        Ok(sub)
    }

    /// Page through the tenant's subscriptions, newest first.
    ///
    /// The total comes from a separate count query.
    pub async fn get_subscriptions_by_tenant(
        &self,
        tenant_id: &str,
        options: ListOptions,
    ) -> BillingResult<SubscriptionPage> {
        let (page, limit) = page_window(options.page, options.limit);

        let total = self.repo.count(tenant_id, options.status).await?;
        let data = self
            .repo
            .list(
                tenant_id,
                ListQuery {
                    status: options.status,
                    offset: (page - 1).saturating_mul(limit),
                    limit,
                },
            )
            .await?;

        Ok(SubscriptionPage {
            data,
            pagination: Pagination {
                page,
                limit,
                total,
                total_pages: total.div_ceil(limit),
            },
        })
    }
}
