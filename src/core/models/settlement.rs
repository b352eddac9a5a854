use super::money::Money;
use super::member::MemberId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum SettlementStatus {
    Pending,
    Notified,
    Failed,
}

impl SettlementStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SettlementStatus::Pending)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct MemberBalance {
    pub member_id: MemberId,
    pub name: String,
    pub balance: Money,
}

/// A request to acknowledge the group's balances. Records communication,
/// not a transfer of money.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Settlement {
    pub id: String,
    pub group_id: String,
    pub status: SettlementStatus,
    /// Balances as they stood when settlement was requested.
    pub snapshot: Vec<MemberBalance>,
    pub failure_reason: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds_option")]
    #[schema(value_type = Option<String>, example = "2024-06-01T12:35:02Z")]
    pub resolved_at: Option<DateTime<Utc>>,
}
