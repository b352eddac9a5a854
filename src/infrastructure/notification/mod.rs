//! Settlement notifications.
//!
//! The ledger hands a [`SettlementNotice`] to a [`NotificationDispatcher`]
//! after a settle-up request and only records what comes back.

pub mod in_memory;
pub mod log;

use crate::core::models::{
    group::Group,
    member::Member,
    money::Money,
    settlement::Settlement,
};
use async_trait::async_trait;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum NotificationOutcome {
    Delivered,
    Failed { reason: String },
}

impl NotificationOutcome {
    pub fn from_success(success: bool, reason: Option<String>) -> Self {
        if success {
            NotificationOutcome::Delivered
        } else {
            NotificationOutcome::Failed {
                reason: reason.unwrap_or_else(|| "notification failed".to_string()),
            }
        }
    }

    pub fn is_delivered(&self) -> bool {
        matches!(self, NotificationOutcome::Delivered)
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct NoticeLine {
    pub member: Member,
    pub balance: Money,
    pub message: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct SettlementNotice {
    pub settlement: Settlement,
    pub group_name: String,
    pub lines: Vec<NoticeLine>,
}

impl SettlementNotice {
    pub fn build(settlement: &Settlement, group: &Group) -> Self {
        let lines = settlement
            .snapshot
            .iter()
            .filter_map(|entry| {
                let member = group.member(&entry.member_id)?.clone();
                Some(NoticeLine {
                    message: balance_message(&group.name, entry.balance),
                    balance: entry.balance,
                    member,
                })
            })
            .collect();

        SettlementNotice {
            settlement: settlement.clone(),
            group_name: group.name.clone(),
            lines,
        }
    }
}

fn balance_message(group_name: &str, balance: Money) -> String {
    if balance.is_positive() {
        format!("You are owed {} in {}", balance, group_name)
    } else if balance.is_negative() {
        let owed = balance.negate().unwrap_or(balance);
        format!("You owe {} in {}", owed, group_name)
    } else {
        format!("You are settled up in {}", group_name)
    }
}

/// Delivers settlement notices. Implementations own their retry policy and
/// should bound their own latency; the ledger adds a timeout on top.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, notice: &SettlementNotice) -> NotificationOutcome;
}
