//! Shared enums for plans and subscription state
//!
//! Wire format follows the public API: plan ids and billing cycles are
//! lowercase, statuses and change types are SCREAMING_SNAKE_CASE. The same
//! strings are stored in the database TEXT columns.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Returned when a string does not name a known variant
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} '{value}'")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Service tier a tenant subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanId {
    Free,
    Basic,
    Premium,
    Enterprise,
}

impl PlanId {
    /// Every plan id accepted by the API, cheapest first
    pub const ALL: [PlanId; 4] = [
        PlanId::Free,
        PlanId::Basic,
        PlanId::Premium,
        PlanId::Enterprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanId::Free => "free",
            PlanId::Basic => "basic",
            PlanId::Premium => "premium",
            PlanId::Enterprise => "enterprise",
        }
    }

    /// Ordering used to tell upgrades from downgrades
    pub fn rank(&self) -> u8 {
        match self {
            PlanId::Free => 0,
            PlanId::Basic => 1,
            PlanId::Premium => 2,
            PlanId::Enterprise => 3,
        }
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanId {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(PlanId::Free),
            "basic" => Ok(PlanId::Basic),
            "premium" => Ok(PlanId::Premium),
            "enterprise" => Ok(PlanId::Enterprise),
            _ => Err(ParseEnumError::new("plan id", s)),
        }
    }
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionStatus {
    Active,
    Inactive,
    Cancelled,
    Trialing,
    GracePeriod,
    PastDue,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Active => "ACTIVE",
            SubscriptionStatus::Inactive => "INACTIVE",
            SubscriptionStatus::Cancelled => "CANCELLED",
            SubscriptionStatus::Trialing => "TRIALING",
            SubscriptionStatus::GracePeriod => "GRACE_PERIOD",
            SubscriptionStatus::PastDue => "PAST_DUE",
        }
    }

    /// Terminal statuses accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubscriptionStatus::Cancelled)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubscriptionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(SubscriptionStatus::Active),
            "INACTIVE" => Ok(SubscriptionStatus::Inactive),
            "CANCELLED" => Ok(SubscriptionStatus::Cancelled),
            "TRIALING" => Ok(SubscriptionStatus::Trialing),
            "GRACE_PERIOD" => Ok(SubscriptionStatus::GracePeriod),
            "PAST_DUE" => Ok(SubscriptionStatus::PastDue),
            _ => Err(ParseEnumError::new("status", s)),
        }
    }
}

/// Kind of entry in a subscription's plan history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanChangeType {
    Upgrade,
    Downgrade,
    GraceConversion,
    Cancellation,
}

impl PlanChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanChangeType::Upgrade => "UPGRADE",
            PlanChangeType::Downgrade => "DOWNGRADE",
            PlanChangeType::GraceConversion => "GRACE_CONVERSION",
            PlanChangeType::Cancellation => "CANCELLATION",
        }
    }

    /// Classify a plan move by tier rank. Same-rank moves count as upgrades.
    pub fn for_plan_move(from: PlanId, to: PlanId) -> Self {
        if to.rank() < from.rank() {
            PlanChangeType::Downgrade
        } else {
            PlanChangeType::Upgrade
        }
    }
}

impl fmt::Display for PlanChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How often the tenant is invoiced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    #[default]
    Monthly,
    Yearly,
}

impl BillingCycle {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(BillingCycle::Monthly),
            "yearly" => Ok(BillingCycle::Yearly),
            _ => Err(ParseEnumError::new("billing cycle", s)),
        }
    }
}
