use crate::core::errors::LedgerError;
use crate::core::models::{
    audit::GroupAudit,
    expense::Expense,
    group::Group,
    settlement::{Settlement, SettlementStatus},
};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    groups: Arc<RwLock<HashMap<String, Group>>>,
    ledgers: Arc<RwLock<HashMap<String, Vec<Expense>>>>,
    settlements: Arc<RwLock<HashMap<String, Settlement>>>,
    group_audits: Arc<RwLock<HashMap<String, Vec<GroupAudit>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save_group(&self, group: Group) -> Result<(), LedgerError> {
        let mut groups = self.groups.write().await;
        groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        let groups = self.groups.read().await;
        Ok(groups.get(group_id).cloned())
    }

    async fn list_groups(&self) -> Result<Vec<Group>, LedgerError> {
        let groups = self.groups.read().await;
        let mut all: Vec<Group> = groups.values().cloned().collect();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn delete_group(&self, group_id: &str) -> Result<(), LedgerError> {
        let mut groups = self.groups.write().await;
        if groups.remove(group_id).is_some() {
            let mut ledgers = self.ledgers.write().await;
            ledgers.remove(group_id);
        }
        Ok(())
    }

    async fn append_expense(&self, expense: Expense) -> Result<(), LedgerError> {
        let mut ledgers = self.ledgers.write().await;
        ledgers.entry(expense.group_id.clone()).or_default().push(expense);
        Ok(())
    }

    async fn get_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError> {
        let ledgers = self.ledgers.read().await;
        Ok(ledgers.get(group_id).cloned().unwrap_or_default())
    }

    async fn get_recent_expenses(&self, limit: usize) -> Result<Vec<Expense>, LedgerError> {
        let ledgers = self.ledgers.read().await;
        let mut all: Vec<Expense> = ledgers.values().flatten().cloned().collect();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        all.truncate(limit);
        Ok(all)
    }

    async fn save_settlement(&self, settlement: Settlement) -> Result<(), LedgerError> {
        let mut settlements = self.settlements.write().await;
        settlements.insert(settlement.id.clone(), settlement);
        Ok(())
    }

    async fn get_settlement(&self, settlement_id: &str) -> Result<Option<Settlement>, LedgerError> {
        let settlements = self.settlements.read().await;
        Ok(settlements.get(settlement_id).cloned())
    }

    async fn get_settlements(&self, group_id: &str) -> Result<Vec<Settlement>, LedgerError> {
        let settlements = self.settlements.read().await;
        let mut found: Vec<Settlement> = settlements
            .values()
            .filter(|s| s.group_id == group_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }

    async fn get_pending_settlement(&self, group_id: &str) -> Result<Option<Settlement>, LedgerError> {
        let settlements = self.settlements.read().await;
        Ok(settlements
            .values()
            .find(|s| s.group_id == group_id && s.status == SettlementStatus::Pending)
            .cloned())
    }

    async fn save_group_audit(&self, audit: GroupAudit) -> Result<(), LedgerError> {
        let mut group_audits = self.group_audits.write().await;
        group_audits.entry(audit.group_id.clone()).or_default().push(audit);
        Ok(())
    }

    async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, LedgerError> {
        let group_audits = self.group_audits.read().await;
        Ok(group_audits.get(group_id).cloned().unwrap_or_default())
    }
}
