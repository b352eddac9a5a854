use super::member::MemberId;
use super::money::Money;
use crate::core::balances::split_evenly;
use crate::core::errors::LedgerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use utoipa::ToSchema;

/// An unvalidated expense as it arrives from a caller.
#[derive(Clone, Debug)]
pub struct NewExpense {
    pub description: String,
    pub payer: MemberId,
    pub amount: Money,
    pub participants: BTreeSet<MemberId>,
}

/// An immutable ledger entry: `payer` advanced `amount`, owed evenly by
/// `participants`. The payer need not participate.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Expense {
    pub id: String,
    pub group_id: String,
    pub description: String,
    pub payer: MemberId,
    pub amount: Money,
    #[schema(value_type = Vec<String>)]
    pub participants: BTreeSet<MemberId>,
    #[serde(with = "chrono::serde::ts_seconds")]
    #[schema(value_type = String, example = "2024-06-01T12:34:56Z")]
    pub created_at: DateTime<Utc>,
}

impl Expense {
    pub fn shares(&self) -> Result<Vec<(MemberId, Money)>, LedgerError> {
        split_evenly(self.amount, &self.participants)
    }

    pub fn references(&self, member: &MemberId) -> bool {
        self.payer == *member || self.participants.contains(member)
    }
}
