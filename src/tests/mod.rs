mod balance_tests;
mod group_tests;

use crate::core::models::{
    audit::GroupAudit,
    group::Group,
    member::Member,
    money::Currency,
    settlement::Settlement,
};
use crate::core::services::{LedgerService, LedgerSettings};
use crate::constants::{SETTLEMENT_FAILED, SETTLEMENT_NOTIFIED};
use crate::infrastructure::logging::{LoggingService, in_memory::InMemoryLogging};
use crate::infrastructure::notification::{NotificationDispatcher, in_memory::InMemoryDispatcher};
use crate::infrastructure::storage::{Storage, in_memory::InMemoryStorage};
use std::time::Duration;

pub type TestService = LedgerService<InMemoryLogging, InMemoryStorage, InMemoryDispatcher>;

pub fn test_settings() -> LedgerSettings {
    LedgerSettings {
        notification_timeout: Duration::from_secs(2),
        max_expense_amount: 1_000_000,
    }
}

pub fn create_test_service() -> (TestService, InMemoryDispatcher) {
    let dispatcher = InMemoryDispatcher::new();
    let service = create_test_service_with(dispatcher.clone(), test_settings());
    (service, dispatcher)
}

pub fn create_test_service_with(dispatcher: InMemoryDispatcher, settings: LedgerSettings) -> TestService {
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    LedgerService::new(storage, logging, dispatcher, settings)
}

pub fn members(ids: &[&str]) -> Vec<Member> {
    ids.iter()
        .map(|id| Member::new(*id, id.to_uppercase()).with_email(format!("{}@example.com", id)))
        .collect()
}

pub async fn create_group<L, S, D>(service: &LedgerService<L, S, D>, ids: &[&str]) -> Group
where
    L: LoggingService + 'static,
    S: Storage + 'static,
    D: NotificationDispatcher + 'static,
{
    service
        .create_group("Trip".to_string(), None, Currency::Inr, members(ids))
        .await
        .unwrap()
}

fn resolves(audit: &GroupAudit, settlement_id: &str) -> bool {
    (audit.action == SETTLEMENT_NOTIFIED || audit.action == SETTLEMENT_FAILED)
        && audit.details["settlement_id"] == settlement_id
}

/// Polls until the background dispatch for `settlement_id` has been fully
/// recorded. The resolving audit entry is the last write it makes.
pub async fn wait_for_resolution<L, S, D>(
    service: &LedgerService<L, S, D>,
    group_id: &str,
    settlement_id: &str,
) -> Settlement
where
    L: LoggingService + 'static,
    S: Storage + 'static,
    D: NotificationDispatcher + 'static,
{
    for _ in 0..500 {
        let audits = service.get_group_audits(group_id).await.unwrap();
        if audits.iter().any(|audit| resolves(audit, settlement_id)) {
            return service.get_settlement(settlement_id).await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("settlement {} was never resolved", settlement_id);
}
