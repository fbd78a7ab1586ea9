//! Field-level subscription checks
//!
//! Pure functions: no I/O, the current time is passed in. Errors name the
//! first violated field using its API name.

use std::sync::LazyLock;

use regex::Regex;
use rollcall_shared::{PlanId, SubscriptionStatus};
use rust_decimal::Decimal;
use time::OffsetDateTime;

use crate::error::{BillingError, BillingResult};
use crate::model::Subscription;

#[allow(clippy::expect_used)] // Literal pattern, cannot fail
static CURRENCY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{3}$").expect("valid currency regex"));

/// Parse a plan id against the whitelist
pub fn parse_plan_id(raw: Option<&str>) -> BillingResult<PlanId> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(BillingError::validation("planId", "planId is required"));
    }

    raw.parse().map_err(|_| {
        BillingError::validation(
            "planId",
            format!(
                "Invalid plan '{}'. Valid plans are: free, basic, premium, enterprise",
                raw
            ),
        )
    })
}

/// Parse a status string (`ACTIVE`, `PAST_DUE`, ...)
pub fn parse_status(raw: &str) -> BillingResult<SubscriptionStatus> {
    raw.trim().parse().map_err(|_| {
        BillingError::validation(
            "status",
            format!(
                "Invalid status '{}'. Valid statuses are: ACTIVE, INACTIVE, CANCELLED, TRIALING, GRACE_PERIOD, PAST_DUE",
                raw
            ),
        )
    })
}

/// Currency must be a three-letter uppercase ISO code
pub fn validate_currency(currency: &str) -> BillingResult<()> {
    if CURRENCY_RE.is_match(currency) {
        Ok(())
    } else {
        Err(BillingError::validation(
            "currency",
            format!(
                "Invalid currency '{}'. Expected a 3-letter uppercase ISO code",
                currency
            ),
        ))
    }
}

/// Check a whole subscription record before it is persisted
pub fn validate_subscription(sub: &Subscription, now: OffsetDateTime) -> BillingResult<()> {
    if sub.tenant_id.trim().is_empty() {
        return Err(BillingError::validation("tenantId", "tenantId is required"));
    }

    if sub.created_by.trim().is_empty() {
        return Err(BillingError::validation("createdBy", "createdBy is required"));
    }

    if sub.base_price < Decimal::ZERO {
        return Err(BillingError::validation(
            "basePrice",
            "basePrice must be a non-negative number",
        ));
    }

    // Stored as NUMERIC(12, 2)
    if sub.base_price.normalize().scale() > 2 {
        return Err(BillingError::validation(
            "basePrice",
            "basePrice must have at most 2 decimal places",
        ));
    }
    if sub.base_price >= Decimal::new(10_000_000_000, 0) {
        return Err(BillingError::validation(
            "basePrice",
            "basePrice must be less than 10000000000",
        ));
    }

    validate_currency(&sub.currency)?;

    if let Some(ends_at) = sub.grace_period_ends_at {
        if ends_at <= now {
            return Err(BillingError::validation(
                "gracePeriodEndsAt",
                "gracePeriodEndsAt must be in the future",
            ));
        }
    }

    let has_grace_fields = sub.is_in_grace_period
        || sub.grace_period_id.is_some()
        || sub.grace_period_ends_at.is_some();
    if sub.status != SubscriptionStatus::GracePeriod && has_grace_fields {
        return Err(BillingError::validation(
            "gracePeriodId",
            "Grace period fields require GRACE_PERIOD status",
        ));
    }

    if sub.status == SubscriptionStatus::GracePeriod {
        let has_grace_id = sub
            .grace_period_id
            .as_deref()
            .is_some_and(|id| !id.trim().is_empty());
        if !sub.is_in_grace_period || !has_grace_id {
            return Err(BillingError::validation(
                "gracePeriodId",
                "GRACE_PERIOD status requires a gracePeriodId",
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CreateSubscriptionRequest;
    use time::Duration;

    fn subscription(now: OffsetDateTime) -> Subscription {
        Subscription::from_create_request(
            CreateSubscriptionRequest {
                plan_id: Some("basic".to_string()),
                ..Default::default()
            },
            "T1",
            "u1",
            now,
        )
        .unwrap()
    }

    fn failed_field(result: BillingResult<()>) -> &'static str {
        match result {
            Err(BillingError::Validation { field, .. }) => field,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_currency_accepts_exactly_three_uppercase_letters() {
        assert!(validate_currency("USD").is_ok());
        assert!(validate_currency("EUR").is_ok());

        for bad in ["usd", "US", "USDD", "", "U5D", "Usd", " USD", "USD\n"] {
            assert_eq!(failed_field(validate_currency(bad)), "currency", "{:?}", bad);
        }
    }

    #[test]
    fn test_parse_plan_id() {
        assert_eq!(parse_plan_id(Some("enterprise")).unwrap(), PlanId::Enterprise);
        assert_eq!(parse_plan_id(Some(" free ")).unwrap(), PlanId::Free);

        for bad in [None, Some(""), Some("   "), Some("gold"), Some("FREE")] {
            match parse_plan_id(bad) {
                Err(BillingError::Validation { field, .. }) => assert_eq!(field, "planId"),
                other => panic!("expected validation error for {:?}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(
            parse_status("GRACE_PERIOD").unwrap(),
            SubscriptionStatus::GracePeriod
        );
        assert!(parse_status("paused").is_err());
    }

    #[test]
    fn test_fresh_subscription_is_valid() {
        let now = OffsetDateTime::now_utc();
        assert!(validate_subscription(&subscription(now), now).is_ok());
    }

    #[test]
    fn test_first_violated_field_is_reported() {
        let now = OffsetDateTime::now_utc();

        let mut sub = subscription(now);
        sub.tenant_id = String::new();
        sub.currency = "eur".to_string();
        assert_eq!(failed_field(validate_subscription(&sub, now)), "tenantId");

        let mut sub = subscription(now);
        sub.created_by = "  ".to_string();
        assert_eq!(failed_field(validate_subscription(&sub, now)), "createdBy");

        let mut sub = subscription(now);
        sub.base_price = Decimal::new(-1, 2);
        assert_eq!(failed_field(validate_subscription(&sub, now)), "basePrice");

        let mut sub = subscription(now);
        sub.currency = "euro".to_string();
        assert_eq!(failed_field(validate_subscription(&sub, now)), "currency");
    }

    #[test]
    fn test_grace_period_end_must_be_in_future() {
        let now = OffsetDateTime::now_utc();

        let mut sub = subscription(now);
        sub.status = SubscriptionStatus::GracePeriod;
        sub.is_in_grace_period = true;
        sub.grace_period_id = Some("gp_1".to_string());
        sub.grace_period_ends_at = Some(now);
        assert_eq!(
            failed_field(validate_subscription(&sub, now)),
            "gracePeriodEndsAt"
        );

        sub.grace_period_ends_at = Some(now - Duration::days(1));
        assert!(validate_subscription(&sub, now).is_err());

        sub.grace_period_ends_at = Some(now + Duration::days(7));
        assert!(validate_subscription(&sub, now).is_ok());
    }

    #[test]
    fn test_grace_status_requires_grace_id() {
        let now = OffsetDateTime::now_utc();
        let mut sub = subscription(now);
        sub.status = SubscriptionStatus::GracePeriod;
        sub.is_in_grace_period = true;
        assert_eq!(failed_field(validate_subscription(&sub, now)), "gracePeriodId");

        sub.grace_period_id = Some("gp_1".to_string());
        assert!(validate_subscription(&sub, now).is_ok());

        sub.is_in_grace_period = false;
        assert!(validate_subscription(&sub, now).is_err());
    }

    #[test]
    fn test_grace_fields_require_grace_status() {
        let now = OffsetDateTime::now_utc();

        let mut sub = subscription(now);
        sub.grace_period_id = Some("gp_1".to_string());
        assert_eq!(failed_field(validate_subscription(&sub, now)), "gracePeriodId");

        let mut sub = subscription(now);
        sub.grace_period_ends_at = Some(now + Duration::days(7));
        assert_eq!(failed_field(validate_subscription(&sub, now)), "gracePeriodId");

        let mut sub = subscription(now);
        sub.status = SubscriptionStatus::PastDue;
        sub.is_in_grace_period = true;
        assert_eq!(failed_field(validate_subscription(&sub, now)), "gracePeriodId");
    }

    #[test]
    fn test_base_price_fits_stored_precision() {
        let now = OffsetDateTime::now_utc();
        let mut sub = subscription(now);

        for ok in [
            Decimal::new(1234, 2),
            Decimal::new(12340, 3),
            Decimal::new(999_999_999_999, 2),
        ] {
            sub.base_price = ok;
            assert!(validate_subscription(&sub, now).is_ok(), "{}", ok);
        }

        for bad in [
            Decimal::new(12345, 3),
            Decimal::new(10_000_000_000, 0),
            Decimal::new(1_000_000_000_000, 2),
        ] {
            sub.base_price = bad;
            assert_eq!(failed_field(validate_subscription(&sub, now)), "basePrice", "{}", bad);
        }
    }

    #[test]
    fn test_zero_price_is_allowed() {
        let now = OffsetDateTime::now_utc();
        let mut sub = subscription(now);
        sub.base_price = Decimal::ZERO;
        assert!(validate_subscription(&sub, now).is_ok());
    }
}
