use crate::core::errors::LedgerError;
use crate::core::models::{audit::GroupAudit, expense::Expense, group::Group, settlement::Settlement};
use async_trait::async_trait;

#[async_trait]
pub trait Storage: Send + Sync {
    async fn save_group(&self, group: Group) -> Result<(), LedgerError>;
    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError>;
    async fn list_groups(&self) -> Result<Vec<Group>, LedgerError>;
    /// Removes the group together with its ledger.
    async fn delete_group(&self, group_id: &str) -> Result<(), LedgerError>;
    async fn append_expense(&self, expense: Expense) -> Result<(), LedgerError>;
    /// The group's ledger in append order.
    async fn get_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError>;
    async fn get_recent_expenses(&self, limit: usize) -> Result<Vec<Expense>, LedgerError>;
    async fn save_settlement(&self, settlement: Settlement) -> Result<(), LedgerError>;
    async fn get_settlement(&self, settlement_id: &str) -> Result<Option<Settlement>, LedgerError>;
    async fn get_settlements(&self, group_id: &str) -> Result<Vec<Settlement>, LedgerError>;
    async fn get_pending_settlement(&self, group_id: &str) -> Result<Option<Settlement>, LedgerError>;
    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), LedgerError>;
    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, LedgerError>;
}

pub mod in_memory;
