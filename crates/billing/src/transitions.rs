//! Subscription status state machine
//!
//! Every status change goes through [`next_status`]. The table below is the
//! complete set of allowed moves; anything absent is rejected.
//!
//! | From         | Activate | StartTrial | EnterGracePeriod | MarkPastDue | Deactivate | Cancel    |
//! |--------------|----------|------------|------------------|-------------|------------|-----------|
//! | TRIALING     | ACTIVE   |            |                  | PAST_DUE    | INACTIVE   | CANCELLED |
//! | ACTIVE       |          |            | GRACE_PERIOD     | PAST_DUE    | INACTIVE   | CANCELLED |
//! | GRACE_PERIOD | ACTIVE   |            |                  | PAST_DUE    | INACTIVE   | CANCELLED |
//! | PAST_DUE     | ACTIVE   |            | GRACE_PERIOD     |             | INACTIVE   | CANCELLED |
//! | INACTIVE     | ACTIVE   | TRIALING   |                  |             |            | CANCELLED |
//! | CANCELLED    |          |            |                  |             |            |           |

use rollcall_shared::SubscriptionStatus;

use crate::error::{BillingError, BillingResult};

/// Lifecycle event that moves a subscription between statuses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionEvent {
    Activate,
    StartTrial,
    EnterGracePeriod,
    MarkPastDue,
    Deactivate,
    Cancel,
}

impl SubscriptionEvent {
    /// The event whose outcome is `status`
    pub fn targeting(status: SubscriptionStatus) -> Self {
        match status {
            SubscriptionStatus::Active => SubscriptionEvent::Activate,
            SubscriptionStatus::Trialing => SubscriptionEvent::StartTrial,
            SubscriptionStatus::GracePeriod => SubscriptionEvent::EnterGracePeriod,
            SubscriptionStatus::PastDue => SubscriptionEvent::MarkPastDue,
            SubscriptionStatus::Inactive => SubscriptionEvent::Deactivate,
            SubscriptionStatus::Cancelled => SubscriptionEvent::Cancel,
        }
    }

    pub fn target(&self) -> SubscriptionStatus {
        match self {
            SubscriptionEvent::Activate => SubscriptionStatus::Active,
            SubscriptionEvent::StartTrial => SubscriptionStatus::Trialing,
            SubscriptionEvent::EnterGracePeriod => SubscriptionStatus::GracePeriod,
            SubscriptionEvent::MarkPastDue => SubscriptionStatus::PastDue,
            SubscriptionEvent::Deactivate => SubscriptionStatus::Inactive,
            SubscriptionEvent::Cancel => SubscriptionStatus::Cancelled,
        }
    }
}

use SubscriptionEvent as E;
use SubscriptionStatus as S;

const TRANSITIONS: &[(SubscriptionStatus, SubscriptionEvent)] = &[
    (S::Trialing, E::Activate),
    (S::Trialing, E::MarkPastDue),
    (S::Trialing, E::Deactivate),
    (S::Trialing, E::Cancel),
    (S::Active, E::EnterGracePeriod),
    (S::Active, E::MarkPastDue),
    (S::Active, E::Deactivate),
    (S::Active, E::Cancel),
    (S::GracePeriod, E::Activate),
    (S::GracePeriod, E::MarkPastDue),
    (S::GracePeriod, E::Deactivate),
    (S::GracePeriod, E::Cancel),
    (S::PastDue, E::Activate),
    (S::PastDue, E::EnterGracePeriod),
    (S::PastDue, E::Deactivate),
    (S::PastDue, E::Cancel),
    (S::Inactive, E::Activate),
    (S::Inactive, E::StartTrial),
    (S::Inactive, E::Cancel),
];

/// Apply `event` to `from`, returning the resulting status
pub fn next_status(
    from: SubscriptionStatus,
    event: SubscriptionEvent,
) -> BillingResult<SubscriptionStatus> {
    if TRANSITIONS.contains(&(from, event)) {
        Ok(event.target())
    } else {
        Err(BillingError::InvalidTransition {
            from,
            to: event.target(),
        })
    }
}

/// Check a direct status change. Keeping the same status is always allowed.
pub fn validate_status_transition(
    from: SubscriptionStatus,
    to: SubscriptionStatus,
) -> BillingResult<()> {
    if from == to {
        return Ok(());
    }
    next_status(from, SubscriptionEvent::targeting(to)).map(|_| ())
}

/// Statuses reachable from `from` in one step
pub fn allowed_transitions(from: SubscriptionStatus) -> Vec<SubscriptionStatus> {
    TRANSITIONS
        .iter()
        .filter(|(status, _)| *status == from)
        .map(|(_, event)| event.target())
        .collect()
}
