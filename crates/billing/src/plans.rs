//! Plan catalogue
//!
//! List prices and entitlement limits per plan id. Prices are monthly, in EUR.

use rollcall_shared::PlanId;
use rust_decimal::Decimal;
use serde::Serialize;

/// Catalogue currency for list prices
pub const CATALOGUE_CURRENCY: &str = "EUR";

/// Subscription plan configuration
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_price: Decimal,
    /// `None` means unlimited
    pub max_projects: Option<u32>,
    /// `None` means unlimited
    pub max_members: Option<u32>,
}

impl Plan {
    /// Free tier: 1 project, 5 team members
    pub fn free() -> Self {
        Self {
            id: PlanId::Free,
            monthly_price: Decimal::ZERO,
            max_projects: Some(1),
            max_members: Some(5),
        }
    }

    /// Basic tier: 5 projects, 25 team members
    pub fn basic() -> Self {
        Self {
            id: PlanId::Basic,
            monthly_price: Decimal::new(1900, 2),
            max_projects: Some(5),
            max_members: Some(25),
        }
    }

    /// Premium tier: 25 projects, 100 team members
    pub fn premium() -> Self {
        Self {
            id: PlanId::Premium,
            monthly_price: Decimal::new(4900, 2),
            max_projects: Some(25),
            max_members: Some(100),
        }
    }

    /// Enterprise tier: unlimited everything
    pub fn enterprise() -> Self {
        Self {
            id: PlanId::Enterprise,
            monthly_price: Decimal::new(19900, 2),
            max_projects: None,
            max_members: None,
        }
    }

    pub fn for_id(id: PlanId) -> Self {
        match id {
            PlanId::Free => Self::free(),
            PlanId::Basic => Self::basic(),
            PlanId::Premium => Self::premium(),
            PlanId::Enterprise => Self::enterprise(),
        }
    }

    /// Whole catalogue, cheapest first
    pub fn catalogue() -> Vec<Plan> {
        PlanId::ALL.into_iter().map(Plan::for_id).collect()
    }
}

/// Monthly list price of `to` minus that of `from`; negative for downgrades
pub fn price_difference(from: PlanId, to: PlanId) -> Decimal {
    Plan::for_id(to).monthly_price - Plan::for_id(from).monthly_price
}
