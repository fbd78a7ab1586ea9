//! In-memory subscription store
//!
//! Used by tests and by the API server when no database is configured.
//! Records are bucketed per tenant; a single write lock covers each
//! check-and-write so the one-ACTIVE-per-tenant rule holds under concurrency.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rollcall_shared::SubscriptionStatus;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{BillingError, BillingResult};
use crate::model::Subscription;
use crate::repository::{ListQuery, SubscriptionRepository, ACTIVE_CONFLICT_MESSAGE};

#[derive(Debug, Default, Clone)]
pub struct InMemorySubscriptionRepository {
    /// tenant id -> records in insertion order
    tenants: Arc<RwLock<HashMap<String, Vec<Subscription>>>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn insert(&self, sub: &Subscription) -> BillingResult<()> {
        let mut tenants = self.tenants.write().await;
        let records = tenants.entry(sub.tenant_id.clone()).or_default();

        if sub.is_active() && records.iter().any(Subscription::is_active) {
            return Err(BillingError::Conflict(ACTIVE_CONFLICT_MESSAGE.to_string()));
        }

        records.push(sub.clone());
        Ok(())
    }

    async fn find(&self, tenant_id: &str, id: Uuid) -> BillingResult<Option<Subscription>> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(tenant_id)
            .and_then(|records| records.iter().find(|s| s.id == id))
            .cloned())
    }

    async fn find_active(&self, tenant_id: &str) -> BillingResult<Option<Subscription>> {
        let tenants = self.tenants.read().await;
        Ok(tenants
            .get(tenant_id)
            .and_then(|records| records.iter().find(|s| s.is_active()))
            .cloned())
    }

    async fn update(&self, tenant_id: &str, sub: &Subscription) -> BillingResult<()> {
        let mut tenants = self.tenants.write().await;
        let records = tenants
            .get_mut(tenant_id)
            .ok_or_else(|| BillingError::NotFound("Subscription not found".to_string()))?;

        if sub.is_active()
            && records
                .iter()
                .any(|other| other.id != sub.id && other.is_active())
        {
            return Err(BillingError::Conflict(ACTIVE_CONFLICT_MESSAGE.to_string()));
        }

        let slot = records
            .iter_mut()
            .find(|s| s.id == sub.id)
            .ok_or_else(|| BillingError::NotFound("Subscription not found".to_string()))?;
        *slot = sub.clone();
        Ok(())
    }

    async fn list(&self, tenant_id: &str, query: ListQuery) -> BillingResult<Vec<Subscription>> {
        let tenants = self.tenants.read().await;
        let Some(records) = tenants.get(tenant_id) else {
            return Ok(Vec::new());
        };

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(query.limit).unwrap_or(usize::MAX);

        Ok(records
            .iter()
            .rev()
            .filter(|s| query.status.is_none_or(|status| s.status == status))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(
        &self,
        tenant_id: &str,
        status: Option<SubscriptionStatus>,
    ) -> BillingResult<u64> {
        let tenants = self.tenants.read().await;
        let count = tenants.get(tenant_id).map_or(0, |records| {
            records
                .iter()
                .filter(|s| status.is_none_or(|status| s.status == status))
                .count()
        });
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CreateSubscriptionRequest;
    use time::OffsetDateTime;

    fn subscription(tenant_id: &str, plan: &str) -> Subscription {
        Subscription::from_create_request(
            CreateSubscriptionRequest {
                plan_id: Some(plan.to_string()),
                ..Default::default()
            },
            tenant_id,
            "user-1",
            OffsetDateTime::now_utc(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_second_active_insert_conflicts() {
        let repo = InMemorySubscriptionRepository::new();
        repo.insert(&subscription("T1", "basic")).await.unwrap();

        let err = repo.insert(&subscription("T1", "premium")).await.unwrap_err();
        assert!(matches!(err, BillingError::Conflict(_)));

        // Other tenants are unaffected
        repo.insert(&subscription("T2", "premium")).await.unwrap();
    }

    #[tokio::test]
    async fn test_lookups_are_tenant_scoped() {
        let repo = InMemorySubscriptionRepository::new();
        let sub = subscription("T1", "basic");
        repo.insert(&sub).await.unwrap();

        assert!(repo.find("T1", sub.id).await.unwrap().is_some());
        assert!(repo.find("T2", sub.id).await.unwrap().is_none());
        assert!(repo.find_active("T2").await.unwrap().is_none());

        let err = repo.update("T2", &sub).await.unwrap_err();
        assert!(matches!(err, BillingError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_update_to_active_conflicts_with_other_active() {
        let repo = InMemorySubscriptionRepository::new();
        let first = subscription("T1", "basic");
        repo.insert(&first).await.unwrap();

        let mut second = subscription("T1", "premium");
        second.status = SubscriptionStatus::Inactive;
        repo.insert(&second).await.unwrap();

        second.status = SubscriptionStatus::Active;
        let err = repo.update("T1", &second).await.unwrap_err();
        assert!(matches!(err, BillingError::Conflict(_)));

        // Re-saving the active record itself is fine
        repo.update("T1", &first).await.unwrap();
    }

    #[tokio::test]
    async fn test_concurrent_inserts_allow_one_active() {
        let repo = InMemorySubscriptionRepository::new();
        let mut handles = Vec::new();

        for _ in 0..16 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.insert(&subscription("T1", "basic")).await
            }));
        }

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                created += 1;
            }
        }

        assert_eq!(created, 1);
        assert_eq!(
            repo.count("T1", Some(SubscriptionStatus::Active)).await.unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_list_newest_first_with_window_and_filter() {
        let repo = InMemorySubscriptionRepository::new();
        let mut ids = Vec::new();
        for _ in 0..5 {
            let mut sub = subscription("T1", "free");
            sub.status = SubscriptionStatus::Inactive;
            repo.insert(&sub).await.unwrap();
            ids.push(sub.id);
        }
        let active = subscription("T1", "basic");
        repo.insert(&active).await.unwrap();

        let all = repo
            .list(
                "T1",
                ListQuery {
                    status: None,
                    offset: 0,
                    limit: 10,
                },
            )
            .await
            .unwrap();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0].id, active.id);

        let window = repo
            .list(
                "T1",
                ListQuery {
                    status: Some(SubscriptionStatus::Inactive),
                    offset: 1,
                    limit: 2,
                },
            )
            .await
            .unwrap();
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].id, ids[3]);
        assert_eq!(window[1].id, ids[2]);

        assert_eq!(
            repo.count("T1", Some(SubscriptionStatus::Inactive)).await.unwrap(),
            5
        );
        assert_eq!(repo.count("T1", None).await.unwrap(), 6);
        assert_eq!(repo.count("T9", None).await.unwrap(), 0);
    }
}
