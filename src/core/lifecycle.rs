//! Settlement lifecycle of a group.
//!
//! A group cycles between `Open` and `Settled`. A settle-up request parks it
//! in `PendingSettlement` until the dispatcher reports back; any new expense
//! drops it back to `Open` from wherever it is.

use crate::core::errors::{ConflictReason, LedgerError};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementState {
    #[default]
    Open,
    PendingSettlement,
    Settled,
    NotificationFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleEvent {
    SettlementRequested,
    NotificationsDelivered,
    NotificationsFailed,
    ExpenseRecorded,
}

impl fmt::Display for SettlementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SettlementState::Open => "OPEN",
            SettlementState::PendingSettlement => "PENDING_SETTLEMENT",
            SettlementState::Settled => "SETTLED",
            SettlementState::NotificationFailed => "NOTIFICATION_FAILED",
        };
        write!(f, "{}", s)
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleEvent::SettlementRequested => "settlement request",
            LifecycleEvent::NotificationsDelivered => "notification delivery",
            LifecycleEvent::NotificationsFailed => "notification failure",
            LifecycleEvent::ExpenseRecorded => "new expense",
        };
        write!(f, "{}", s)
    }
}

impl SettlementState {
    pub fn apply(self, event: LifecycleEvent) -> Result<SettlementState, LedgerError> {
        use LifecycleEvent::*;
        use SettlementState::*;

        match (self, event) {
            (_, ExpenseRecorded) => Ok(Open),
            (Open | NotificationFailed, SettlementRequested) => Ok(PendingSettlement),
            (Settled, SettlementRequested) => Err(LedgerError::Conflict(ConflictReason::AlreadySettled)),
            (PendingSettlement, NotificationsDelivered) => Ok(Settled),
            (PendingSettlement, NotificationsFailed) => Ok(NotificationFailed),
            (from, event) => Err(LedgerError::InvalidTransition {
                from: from.to_string(),
                event: event.to_string(),
            }),
        }
    }

    pub fn is_settled(&self) -> bool {
        matches!(self, SettlementState::Settled)
    }
}
