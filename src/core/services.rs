use crate::config::Config;
use crate::constants::{
    EXPENSE_ADDED, GROUP_CREATED, GROUP_DELETED, MAX_EXPENSE_DESCRIPTION_LENGTH, MAX_GROUP_DESCRIPTION_LENGTH,
    MAX_NAME_LENGTH, MEMBER_ADDED, MEMBER_REMOVED, SETTLEMENT_FAILED, SETTLEMENT_NOTIFIED, SETTLEMENT_REQUESTED,
};
use crate::core::balances::{Balances, Transfer, compute_balances, simplify_debts};
use crate::core::errors::{ConflictReason, ExpenseViolation, FieldError, LedgerError};
use crate::core::lifecycle::{LifecycleEvent, SettlementState};
use crate::core::models::{
    audit::{AppLog, GroupAudit},
    expense::{Expense, NewExpense},
    group::Group,
    member::{Member, MemberId},
    money::{Currency, Money},
    settlement::{MemberBalance, Settlement, SettlementStatus},
};
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::notification::{NotificationDispatcher, NotificationOutcome, SettlementNotice};
use crate::infrastructure::storage::Storage;
use chrono::Utc;
use futures::FutureExt;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::{HashMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use utoipa::ToSchema;
use uuid::Uuid;

const REPORT_ATTEMPTS: u32 = 3;
const REPORT_BACKOFF: Duration = Duration::from_millis(50);

#[derive(Clone, Debug)]
pub struct LedgerSettings {
    pub notification_timeout: Duration,
    /// Largest accepted expense, in major units.
    pub max_expense_amount: i64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            notification_timeout: Duration::from_secs(10),
            max_expense_amount: 1_000_000,
        }
    }
}

impl From<&Config> for LedgerSettings {
    fn from(config: &Config) -> Self {
        LedgerSettings {
            notification_timeout: config.notification_timeout,
            max_expense_amount: config.max_expense_amount,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, ToSchema, Clone)]
pub struct GroupBalances {
    pub group_id: String,
    pub currency: Currency,
    pub state: SettlementState,
    /// Settled after a confirmed settle-up, or trivially with an empty ledger.
    pub settled: bool,
    pub balances: Vec<MemberBalance>,
    pub transfers: Vec<Transfer>,
}

pub struct LedgerService<L: LoggingService, S: Storage, D: NotificationDispatcher> {
    storage: Arc<S>,
    logging: Arc<L>,
    dispatcher: Arc<D>,
    settings: LedgerSettings,
    group_locks: Arc<Mutex<HashMap<String, Arc<Mutex<()>>>>>,
}

impl<L: LoggingService, S: Storage, D: NotificationDispatcher> Clone for LedgerService<L, S, D> {
    fn clone(&self) -> Self {
        LedgerService {
            storage: self.storage.clone(),
            logging: self.logging.clone(),
            dispatcher: self.dispatcher.clone(),
            settings: self.settings.clone(),
            group_locks: self.group_locks.clone(),
        }
    }
}

fn text_problem(label: &str, value: &str, max_length: usize) -> Option<String> {
    if value.trim().is_empty() {
        return Some(format!("{} cannot be empty", label));
    }
    if value.chars().count() > max_length {
        return Some(format!("{} cannot exceed {} characters", label, max_length));
    }
    if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
        return Some(format!("{} contains invalid characters", label));
    }
    None
}

fn invalid_input(field: &str, title: &str, description: String) -> LedgerError {
    LedgerError::InvalidInput(
        field.to_string(),
        FieldError {
            field: field.to_string(),
            title: title.to_string(),
            description,
        },
    )
}

/// Balances in group display order; ids the group no longer lists follow.
fn member_balances(group: &Group, balances: &Balances) -> Vec<MemberBalance> {
    let mut listed: Vec<MemberBalance> = group
        .members
        .iter()
        .filter_map(|member| {
            balances.get(&member.id).map(|balance| MemberBalance {
                member_id: member.id.clone(),
                name: member.name.clone(),
                balance: *balance,
            })
        })
        .collect();

    for (member_id, balance) in balances {
        if !group.is_member(member_id) {
            listed.push(MemberBalance {
                member_id: member_id.clone(),
                name: member_id.to_string(),
                balance: *balance,
            });
        }
    }
    listed
}

impl<L, S, D> LedgerService<L, S, D>
where
    L: LoggingService + 'static,
    S: Storage + 'static,
    D: NotificationDispatcher + 'static,
{
    pub fn new(storage: S, logging: L, dispatcher: D, settings: LedgerSettings) -> Self {
        LedgerService {
            storage: Arc::new(storage),
            logging: Arc::new(logging),
            dispatcher: Arc::new(dispatcher),
            settings,
            group_locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Serializes writers of one group. Readers never take it.
    ///
    /// Entries nobody holds or waits on are dropped on the way in, so ids
    /// of unknown or deleted groups do not pile up.
    async fn lock_group(&self, group_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.group_locks.lock().await;
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(group_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    #[cfg(test)]
    pub(crate) async fn tracked_group_locks(&self) -> usize {
        self.group_locks.lock().await.len()
    }

    async fn load_group(&self, group_id: &str) -> Result<Group, LedgerError> {
        self.storage
            .get_group(group_id)
            .await?
            .ok_or_else(|| LedgerError::GroupNotFound(group_id.to_string()))
    }

    /// Writes the application log and the group audit. Both are attempted;
    /// the first failure is returned.
    async fn log_and_audit(
        &self,
        group_id: &str,
        action: &str,
        log_details: serde_json::Value,
        member_id: Option<&str>,
    ) -> Result<(), LedgerError> {
        let logged = self.logging.log_action(action, log_details.clone(), member_id).await;
        let audited = self
            .storage
            .save_group_audit(GroupAudit {
                id: Uuid::new_v4().to_string(),
                group_id: group_id.to_string(),
                action: action.to_string(),
                member_id: member_id.map(String::from),
                details: log_details,
                timestamp: Utc::now(),
            })
            .await;
        logged.and(audited)
    }

    /// Audits a change that is already persisted. The change stands either
    /// way, so a failing audit sink is reported but not propagated.
    async fn audit_committed(
        &self,
        group_id: &str,
        action: &str,
        log_details: serde_json::Value,
        member_id: Option<&str>,
    ) {
        if let Err(err) = self.log_and_audit(group_id, action, log_details, member_id).await {
            warn!(group_id, action, error = %err, "audit write failed after commit");
        }
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), LedgerError> {
        match text_problem(field, value, max_length) {
            Some(problem) => Err(invalid_input(field, &format!("Invalid {}", field), problem)),
            None => Ok(()),
        }
    }

    fn validate_member(&self, member: &Member) -> Result<(), LedgerError> {
        self.validate_string_input("member_id", member.id.as_str(), MAX_NAME_LENGTH)?;
        self.validate_string_input("name", &member.name, MAX_NAME_LENGTH)?;
        if let Some(email) = &member.email {
            if !email.contains('@') || !email.contains('.') || email.len() < 5 {
                return Err(invalid_input("email", "Invalid email", format!("{} is not an e-mail address", email)));
            }
        }
        Ok(())
    }

    fn validate_expense(&self, group: &Group, draft: &NewExpense) -> Result<(), LedgerError> {
        if draft.amount.currency() != group.currency {
            return Err(LedgerError::CurrencyMismatch {
                expected: group.currency,
                found: draft.amount.currency(),
            });
        }
        if !draft.amount.is_positive() {
            return Err(ExpenseViolation::NonPositiveAmount.into());
        }
        let max_units = self
            .settings
            .max_expense_amount
            .saturating_mul(group.currency.minor_per_major());
        if draft.amount.minor_units() > max_units {
            return Err(ExpenseViolation::AmountTooLarge(max_units).into());
        }
        if let Some(problem) = text_problem("description", &draft.description, MAX_EXPENSE_DESCRIPTION_LENGTH) {
            return Err(ExpenseViolation::InvalidDescription(problem).into());
        }
        if !group.is_member(&draft.payer) {
            return Err(ExpenseViolation::UnknownPayer(draft.payer.to_string()).into());
        }
        if draft.participants.is_empty() {
            return Err(ExpenseViolation::EmptyParticipants.into());
        }
        if let Some(stranger) = draft.participants.iter().find(|id| !group.is_member(id)) {
            return Err(ExpenseViolation::UnknownParticipant(stranger.to_string()).into());
        }
        Ok(())
    }

    pub async fn create_group(
        &self,
        name: String,
        description: Option<String>,
        currency: Currency,
        members: Vec<Member>,
    ) -> Result<Group, LedgerError> {
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        if let Some(description) = &description {
            if description.chars().count() > MAX_GROUP_DESCRIPTION_LENGTH {
                return Err(invalid_input(
                    "description",
                    "Description Too Long",
                    format!("description cannot exceed {} characters", MAX_GROUP_DESCRIPTION_LENGTH),
                ));
            }
        }

        let mut seen = HashSet::new();
        for member in &members {
            self.validate_member(member)?;
            if !seen.insert(member.id.clone()) {
                return Err(LedgerError::AlreadyGroupMember(member.id.to_string()));
            }
        }

        let group = Group {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            currency,
            members,
            state: SettlementState::Open,
            created_at: Utc::now(),
        };
        self.storage.save_group(group.clone()).await?;

        info!(group_id = %group.id, members = group.members.len(), "group created");
        self.audit_committed(
            &group.id,
            GROUP_CREATED,
            json!({
                "group_id": group.id,
                "name": group.name,
                "currency": group.currency,
                "member_ids": group.members.iter().map(|m| m.id.to_string()).collect::<Vec<_>>()
            }),
            None,
        )
        .await;

        Ok(group)
    }

    pub async fn get_group(&self, group_id: &str) -> Result<Option<Group>, LedgerError> {
        self.storage.get_group(group_id).await
    }

    pub async fn list_groups(&self) -> Result<Vec<Group>, LedgerError> {
        self.storage.list_groups().await
    }

    pub async fn delete_group(&self, group_id: &str) -> Result<(), LedgerError> {
        let _guard = self.lock_group(group_id).await;
        let group = self.load_group(group_id).await?;
        self.storage.delete_group(group_id).await?;

        info!(group_id, "group deleted");
        self.audit_committed(
            group_id,
            GROUP_DELETED,
            json!({ "group_id": group_id, "name": group.name }),
            None,
        )
        .await;
        Ok(())
    }

    pub async fn add_member(&self, group_id: &str, member: Member) -> Result<Group, LedgerError> {
        self.validate_member(&member)?;
        let _guard = self.lock_group(group_id).await;
        let mut group = self.load_group(group_id).await?;

        if group.is_member(&member.id) {
            return Err(LedgerError::AlreadyGroupMember(member.id.to_string()));
        }
        group.members.push(member.clone());
        self.storage.save_group(group.clone()).await?;

        self.audit_committed(
            group_id,
            MEMBER_ADDED,
            json!({ "group_id": group_id, "member_id": member.id, "name": member.name }),
            Some(member.id.as_str()),
        )
        .await;
        Ok(group)
    }

    /// Members named by any ledger entry stay; the ledger is append-only so
    /// those references never go away.
    pub async fn remove_member(&self, group_id: &str, member_id: &MemberId) -> Result<Group, LedgerError> {
        let _guard = self.lock_group(group_id).await;
        let mut group = self.load_group(group_id).await?;

        if !group.is_member(member_id) {
            return Err(LedgerError::MemberNotFound(member_id.to_string()));
        }
        let expenses = self.storage.get_expenses(group_id).await?;
        if expenses.iter().any(|e| e.references(member_id)) {
            return Err(LedgerError::MemberReferenced(member_id.to_string()));
        }

        group.members.retain(|m| m.id != *member_id);
        self.storage.save_group(group.clone()).await?;

        self.audit_committed(
            group_id,
            MEMBER_REMOVED,
            json!({ "group_id": group_id, "member_id": member_id }),
            Some(member_id.as_str()),
        )
        .await;
        Ok(group)
    }

    /// Appends an expense to the ledger. Always reopens the group, even when
    /// the new entry nets out to the same balances.
    pub async fn create_expense(&self, group_id: &str, draft: NewExpense) -> Result<Expense, LedgerError> {
        let _guard = self.lock_group(group_id).await;
        let mut group = self.load_group(group_id).await?;
        self.validate_expense(&group, &draft)?;

        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            group_id: group_id.to_string(),
            description: draft.description,
            payer: draft.payer,
            amount: draft.amount,
            participants: draft.participants,
            created_at: Utc::now(),
        };
        self.storage.append_expense(expense.clone()).await?;

        let previous = group.state;
        group.state = group.state.apply(LifecycleEvent::ExpenseRecorded)?;
        self.storage.save_group(group).await?;
        if previous != SettlementState::Open {
            info!(group_id, from = %previous, "group reopened by new expense");
        }

        info!(group_id, expense_id = %expense.id, amount = %expense.amount, "expense recorded");
        self.audit_committed(
            group_id,
            EXPENSE_ADDED,
            json!({
                "expense_id": expense.id,
                "group_id": group_id,
                "description": expense.description,
                "amount": expense.amount,
                "payer_id": expense.payer,
                "participant_ids": expense.participants
            }),
            Some(expense.payer.as_str()),
        )
        .await;

        Ok(expense)
    }

    pub async fn list_expenses(&self, group_id: &str) -> Result<Vec<Expense>, LedgerError> {
        self.load_group(group_id).await?;
        self.storage.get_expenses(group_id).await
    }

    pub async fn recent_expenses(&self, limit: usize) -> Result<Vec<Expense>, LedgerError> {
        self.storage.get_recent_expenses(limit).await
    }

    pub async fn get_balances(&self, group_id: &str) -> Result<GroupBalances, LedgerError> {
        let group = self.load_group(group_id).await?;
        let expenses = self.storage.get_expenses(group_id).await?;
        let balances = compute_balances(&group, &expenses)?;
        let transfers = simplify_debts(&balances)?;
        debug!(group_id, expenses = expenses.len(), transfers = transfers.len(), "balances computed");

        Ok(GroupBalances {
            group_id: group.id.clone(),
            currency: group.currency,
            state: group.state,
            settled: group.state.is_settled() || expenses.is_empty(),
            balances: member_balances(&group, &balances),
            transfers,
        })
    }

    /// Balance views for several groups at once. Groups deleted in the
    /// meantime are left out.
    pub async fn get_balances_for(&self, group_ids: &[String]) -> Result<Vec<GroupBalances>, LedgerError> {
        let views = try_join_all(group_ids.iter().map(|group_id| async move {
            match self.get_balances(group_id).await {
                Ok(view) => Ok(Some(view)),
                Err(LedgerError::GroupNotFound(_)) => Ok(None),
                Err(err) => Err(err),
            }
        }))
        .await?;
        Ok(views.into_iter().flatten().collect())
    }

    /// Opens a settle-up round and hands the notice to the dispatcher in the
    /// background. Returns as soon as the settlement is recorded as pending.
    pub async fn request_settlement(&self, group_id: &str) -> Result<Settlement, LedgerError> {
        let (settlement, group) = {
            let _guard = self.lock_group(group_id).await;
            let mut group = self.load_group(group_id).await?;

            if let Some(pending) = self.storage.get_pending_settlement(group_id).await? {
                return Err(LedgerError::Conflict(ConflictReason::SettlementPending(pending.id)));
            }
            let next = group.state.apply(LifecycleEvent::SettlementRequested)?;

            let expenses = self.storage.get_expenses(group_id).await?;
            let balances = compute_balances(&group, &expenses)?;
            let settlement = Settlement {
                id: Uuid::new_v4().to_string(),
                group_id: group_id.to_string(),
                status: SettlementStatus::Pending,
                snapshot: member_balances(&group, &balances),
                failure_reason: None,
                created_at: Utc::now(),
                resolved_at: None,
            };
            self.storage.save_settlement(settlement.clone()).await?;

            group.state = next;
            if let Err(err) = self.storage.save_group(group.clone()).await {
                self.abandon_settlement(settlement, &err).await;
                return Err(err);
            }

            info!(group_id, settlement_id = %settlement.id, "settlement requested");
            self.audit_committed(
                group_id,
                SETTLEMENT_REQUESTED,
                json!({ "settlement_id": settlement.id, "group_id": group_id }),
                None,
            )
            .await;
            (settlement, group)
        };

        self.spawn_dispatch(settlement.clone(), group);
        Ok(settlement)
    }

    /// Marks a settlement whose group could not be moved to pending as
    /// failed, so it never blocks the next request.
    async fn abandon_settlement(&self, mut settlement: Settlement, cause: &LedgerError) {
        settlement.status = SettlementStatus::Failed;
        settlement.failure_reason = Some(format!("settlement could not be opened: {}", cause));
        settlement.resolved_at = Some(Utc::now());
        if let Err(err) = self.storage.save_settlement(settlement.clone()).await {
            warn!(settlement_id = %settlement.id, error = %err, "could not abandon settlement");
        }
    }

    fn spawn_dispatch(&self, settlement: Settlement, group: Group) {
        let service = self.clone();
        tokio::spawn(async move {
            let notice = SettlementNotice::build(&settlement, &group);
            let timeout = service.settings.notification_timeout;
            let delivery = AssertUnwindSafe(service.dispatcher.notify(&notice)).catch_unwind();
            let outcome = match tokio::time::timeout(timeout, delivery).await {
                Ok(Ok(outcome)) => outcome,
                Ok(Err(_)) => {
                    warn!(settlement_id = %settlement.id, "notification dispatcher panicked");
                    NotificationOutcome::Failed {
                        reason: "notification dispatcher panicked".to_string(),
                    }
                }
                Err(_) => NotificationOutcome::Failed {
                    reason: format!("notification timed out after {}ms", timeout.as_millis()),
                },
            };
            for attempt in 1..=REPORT_ATTEMPTS {
                match service.report_notification_outcome(&settlement.id, outcome.clone()).await {
                    Ok(_) => break,
                    Err(LedgerError::StorageError(reason)) if attempt < REPORT_ATTEMPTS => {
                        warn!(settlement_id = %settlement.id, attempt, %reason, "retrying notification outcome");
                        tokio::time::sleep(REPORT_BACKOFF * attempt).await;
                    }
                    Err(err) => {
                        warn!(settlement_id = %settlement.id, error = %err, "could not record notification outcome");
                        break;
                    }
                }
            }
        });
    }

    /// Resolves a pending settlement. The group only moves to `Settled` or
    /// `NotificationFailed` if nothing reopened it in the meantime.
    pub async fn report_notification_outcome(
        &self,
        settlement_id: &str,
        outcome: NotificationOutcome,
    ) -> Result<Settlement, LedgerError> {
        let group_id = self
            .storage
            .get_settlement(settlement_id)
            .await?
            .ok_or_else(|| LedgerError::SettlementNotFound(settlement_id.to_string()))?
            .group_id;

        let _guard = self.lock_group(&group_id).await;
        let mut settlement = self
            .storage
            .get_settlement(settlement_id)
            .await?
            .ok_or_else(|| LedgerError::SettlementNotFound(settlement_id.to_string()))?;
        if settlement.status.is_terminal() {
            return Err(LedgerError::SettlementAlreadyResolved(settlement_id.to_string()));
        }

        let (event, action) = match &outcome {
            NotificationOutcome::Delivered => {
                settlement.status = SettlementStatus::Notified;
                (LifecycleEvent::NotificationsDelivered, SETTLEMENT_NOTIFIED)
            }
            NotificationOutcome::Failed { reason } => {
                settlement.status = SettlementStatus::Failed;
                settlement.failure_reason = Some(reason.clone());
                (LifecycleEvent::NotificationsFailed, SETTLEMENT_FAILED)
            }
        };
        settlement.resolved_at = Some(Utc::now());

        // Group first: if the settlement write then fails it stays pending
        // and a repeated report can still finish the job.
        match self.storage.get_group(&group_id).await? {
            Some(mut group) if group.state == SettlementState::PendingSettlement => {
                group.state = group.state.apply(event)?;
                info!(
                    group_id = %group_id,
                    settlement_id,
                    delivered = outcome.is_delivered(),
                    state = %group.state,
                    "settlement resolved"
                );
                self.storage.save_group(group).await?;
            }
            Some(group) => {
                info!(group_id = %group_id, settlement_id, state = %group.state, "group changed while notifying; state kept");
            }
            None => {
                warn!(group_id = %group_id, settlement_id, "settlement resolved for a deleted group");
            }
        }
        self.storage.save_settlement(settlement.clone()).await?;

        self.audit_committed(
            &group_id,
            action,
            json!({ "settlement_id": settlement.id, "group_id": group_id, "outcome": outcome }),
            None,
        )
        .await;
        Ok(settlement)
    }

    pub async fn get_settlement(&self, settlement_id: &str) -> Result<Settlement, LedgerError> {
        self.storage
            .get_settlement(settlement_id)
            .await?
            .ok_or_else(|| LedgerError::SettlementNotFound(settlement_id.to_string()))
    }

    pub async fn list_settlements(&self, group_id: &str) -> Result<Vec<Settlement>, LedgerError> {
        self.storage.get_settlements(group_id).await
    }

    pub async fn get_group_audits(&self, group_id: &str) -> Result<Vec<GroupAudit>, LedgerError> {
        self.load_group(group_id).await?;
        self.storage.get_group_audits(group_id).await
    }

    pub async fn get_app_logs(&self) -> Result<Vec<AppLog>, LedgerError> {
        self.logging.get_logs().await
    }

    /// Convenience for callers holding loose ids and a major-unit amount.
    pub async fn record_expense(
        &self,
        group_id: &str,
        description: &str,
        payer: &str,
        amount: &str,
        participants: &[&str],
    ) -> Result<Expense, LedgerError> {
        let group = self.load_group(group_id).await?;
        let draft = NewExpense {
            description: description.to_string(),
            payer: MemberId::from(payer),
            amount: Money::parse(amount, group.currency)?,
            participants: participants.iter().map(|id| MemberId::from(*id)).collect(),
        };
        self.create_expense(group_id, draft).await
    }
}
