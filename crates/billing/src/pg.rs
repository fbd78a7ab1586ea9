//! PostgreSQL subscription store
//!
//! Writes for a tenant are serialized with a transaction-scoped advisory lock
//! keyed on the tenant id, and the partial unique index
//! `idx_subscriptions_one_active_per_tenant` backs the one-ACTIVE rule at the
//! storage level.

use async_trait::async_trait;
use rollcall_shared::{BillingCycle, PlanId, SubscriptionStatus};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::model::{Metadata, PlanChange, Subscription};
use crate::repository::{ListQuery, SubscriptionRepository, ACTIVE_CONFLICT_MESSAGE};

const SUBSCRIPTION_COLUMNS: &str = r#"
    id, tenant_id, plan_id, status, billing_cycle, base_price, currency,
    is_in_grace_period, grace_period_id, grace_period_ends_at,
    plan_history, metadata, created_by, updated_by,
    cancelled_at, cancelled_by, cancellation_reason, created_at, updated_at
"#;

/// Row type for the subscriptions table
#[derive(Debug, FromRow)]
struct SubscriptionRow {
    id: Uuid,
    tenant_id: String,
    plan_id: String,
    status: String,
    billing_cycle: String,
    base_price: Decimal,
    currency: String,
    is_in_grace_period: bool,
    grace_period_id: Option<String>,
    grace_period_ends_at: Option<OffsetDateTime>,
    plan_history: Json<Vec<PlanChange>>,
    metadata: Json<Metadata>,
    created_by: String,
    updated_by: Option<String>,
    cancelled_at: Option<OffsetDateTime>,
    cancelled_by: Option<String>,
    cancellation_reason: Option<String>,
    created_at: OffsetDateTime,
    updated_at: OffsetDateTime,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = BillingError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let id = row.id;
        let corrupt = |e: rollcall_shared::ParseEnumError| {
            BillingError::Database(format!("Corrupt subscription row {}: {}", id, e))
        };

        let plan_id: PlanId = row.plan_id.parse().map_err(corrupt)?;
        let status: SubscriptionStatus = row.status.parse().map_err(corrupt)?;
        let billing_cycle: BillingCycle = row.billing_cycle.parse().map_err(corrupt)?;

        Ok(Subscription {
            id,
            tenant_id: row.tenant_id,
            plan_id,
            status,
            billing_cycle,
            base_price: row.base_price,
            currency: row.currency,
            is_in_grace_period: row.is_in_grace_period,
            grace_period_id: row.grace_period_id,
            grace_period_ends_at: row.grace_period_ends_at,
            plan_history: row.plan_history.0,
            metadata: row.metadata.0,
            created_by: row.created_by,
            updated_by: row.updated_by,
            cancelled_at: row.cancelled_at,
            cancelled_by: row.cancelled_by,
            cancellation_reason: row.cancellation_reason,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Translate a unique-index violation into the single-active conflict
fn map_write_error(e: sqlx::Error) -> BillingError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return BillingError::Conflict(ACTIVE_CONFLICT_MESSAGE.to_string());
        }
    }
    BillingError::from(e)
}

#[derive(Clone)]
pub struct PgSubscriptionRepository {
    pool: PgPool,
}

impl PgSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Start a transaction holding the tenant's advisory lock
    async fn begin_tenant_tx(
        &self,
        tenant_id: &str,
    ) -> BillingResult<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(tenant_id)
            .execute(&mut *tx)
            .await?;

        Ok(tx)
    }

    /// Id of the tenant's ACTIVE record other than `exclude`, read inside `tx`
    async fn other_active_id(
        tx: &mut Transaction<'static, Postgres>,
        tenant_id: &str,
        exclude: Option<Uuid>,
    ) -> BillingResult<Option<Uuid>> {
        let id: Option<Uuid> = sqlx::query_scalar(
            r#"
            SELECT id FROM subscriptions
            WHERE tenant_id = $1
              AND status = 'ACTIVE'
              AND ($2::UUID IS NULL OR id <> $2)
            LIMIT 1
            "#,
        )
        .bind(tenant_id)
        .bind(exclude)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(id)
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn insert(&self, sub: &Subscription) -> BillingResult<()> {
        let mut tx = self.begin_tenant_tx(&sub.tenant_id).await?;

        if sub.is_active()
            && Self::other_active_id(&mut tx, &sub.tenant_id, None)
                .await?
                .is_some()
        {
            return Err(BillingError::Conflict(ACTIVE_CONFLICT_MESSAGE.to_string()));
        }

        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, tenant_id, plan_id, status, billing_cycle, base_price, currency,
                is_in_grace_period, grace_period_id, grace_period_ends_at,
                plan_history, metadata, created_by, updated_by,
                cancelled_at, cancelled_by, cancellation_reason, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            "#,
        )
        .bind(sub.id)
        .bind(&sub.tenant_id)
        .bind(sub.plan_id.as_str())
        .bind(sub.status.as_str())
        .bind(sub.billing_cycle.as_str())
        .bind(sub.base_price)
        .bind(&sub.currency)
        .bind(sub.is_in_grace_period)
        .bind(&sub.grace_period_id)
        .bind(sub.grace_period_ends_at)
        .bind(Json(&sub.plan_history))
        .bind(Json(&sub.metadata))
        .bind(&sub.created_by)
        .bind(&sub.updated_by)
        .bind(sub.cancelled_at)
        .bind(&sub.cancelled_by)
        .bind(&sub.cancellation_reason)
        .bind(sub.created_at)
        .bind(sub.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(())
    }

    async fn find(&self, tenant_id: &str, id: Uuid) -> BillingResult<Option<Subscription>> {
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE tenant_id = $1 AND id = $2",
            SUBSCRIPTION_COLUMNS
        );
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_active(&self, tenant_id: &str) -> BillingResult<Option<Subscription>> {
        let sql = format!(
            "SELECT {} FROM subscriptions WHERE tenant_id = $1 AND status = 'ACTIVE' LIMIT 1",
            SUBSCRIPTION_COLUMNS
        );
        let row: Option<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Subscription::try_from).transpose()
    }

    async fn update(&self, tenant_id: &str, sub: &Subscription) -> BillingResult<()> {
        let mut tx = self.begin_tenant_tx(tenant_id).await?;

        if sub.is_active()
            && Self::other_active_id(&mut tx, tenant_id, Some(sub.id))
                .await?
                .is_some()
        {
            return Err(BillingError::Conflict(ACTIVE_CONFLICT_MESSAGE.to_string()));
        }

        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                plan_id = $3,
                status = $4,
                billing_cycle = $5,
                base_price = $6,
                currency = $7,
                is_in_grace_period = $8,
                grace_period_id = $9,
                grace_period_ends_at = $10,
                plan_history = $11,
                metadata = $12,
                updated_by = $13,
                cancelled_at = $14,
                cancelled_by = $15,
                cancellation_reason = $16,
                updated_at = $17
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(sub.id)
        .bind(sub.plan_id.as_str())
        .bind(sub.status.as_str())
        .bind(sub.billing_cycle.as_str())
        .bind(sub.base_price)
        .bind(&sub.currency)
        .bind(sub.is_in_grace_period)
        .bind(&sub.grace_period_id)
        .bind(sub.grace_period_ends_at)
        .bind(Json(&sub.plan_history))
        .bind(Json(&sub.metadata))
        .bind(&sub.updated_by)
        .bind(sub.cancelled_at)
        .bind(&sub.cancelled_by)
        .bind(&sub.cancellation_reason)
        .bind(sub.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(BillingError::NotFound("Subscription not found".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list(&self, tenant_id: &str, query: ListQuery) -> BillingResult<Vec<Subscription>> {
        let sql = format!(
            r#"
            SELECT {} FROM subscriptions
            WHERE tenant_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3 OFFSET $4
            "#,
            SUBSCRIPTION_COLUMNS
        );
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&sql)
            .bind(tenant_id)
            .bind(query.status.map(|s| s.as_str()))
            .bind(i64::try_from(query.limit).unwrap_or(i64::MAX))
            .bind(i64::try_from(query.offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn count(
        &self,
        tenant_id: &str,
        status: Option<SubscriptionStatus>,
    ) -> BillingResult<u64> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM subscriptions
            WHERE tenant_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            "#,
        )
        .bind(tenant_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;

        Ok(u64::try_from(total).unwrap_or(0))
    }
}
