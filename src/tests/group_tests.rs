use super::{create_group, create_test_service, members};
use crate::constants::{GROUP_CREATED, MEMBER_ADDED, MEMBER_REMOVED};
use crate::core::errors::LedgerError;
use crate::core::lifecycle::SettlementState;
use crate::core::models::{
    member::{Member, MemberId},
    money::{Currency, Money},
};

#[tokio::test]
async fn test_create_group_starts_open() {
    let (service, _) = create_test_service();

    let group = service
        .create_group(
            "Goa".to_string(),
            Some("Beach week".to_string()),
            Currency::Inr,
            members(&["a", "b"]),
        )
        .await
        .unwrap();

    assert_eq!(group.name, "Goa");
    assert_eq!(group.state, SettlementState::Open);
    assert_eq!(group.members.len(), 2);
    assert!(service.get_group(&group.id).await.unwrap().is_some());

    let audits = service.get_group_audits(&group.id).await.unwrap();
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].action, GROUP_CREATED);
    let logs = service.get_app_logs().await.unwrap();
    assert_eq!(logs[0].action, GROUP_CREATED);
}

#[tokio::test]
async fn test_create_group_rejects_bad_input() {
    let (service, _) = create_test_service();

    let empty = service
        .create_group("  ".to_string(), None, Currency::Inr, members(&["a"]))
        .await;
    assert!(matches!(empty, Err(LedgerError::InvalidInput(field, _)) if field == "name"));

    let markup = service
        .create_group("<b>Trip</b>".to_string(), None, Currency::Inr, members(&["a"]))
        .await;
    assert!(matches!(markup, Err(LedgerError::InvalidInput(..))));

    let long_description = service
        .create_group("Trip".to_string(), Some("x".repeat(501)), Currency::Inr, vec![])
        .await;
    assert!(matches!(long_description, Err(LedgerError::InvalidInput(field, _)) if field == "description"));

    let duplicate = service
        .create_group("Trip".to_string(), None, Currency::Inr, members(&["a", "a"]))
        .await;
    assert!(matches!(duplicate, Err(LedgerError::AlreadyGroupMember(id)) if id == "a"));

    let bad_email = service
        .create_group(
            "Trip".to_string(),
            None,
            Currency::Inr,
            vec![Member::new("a", "A").with_email("nope")],
        )
        .await;
    assert!(matches!(bad_email, Err(LedgerError::InvalidInput(field, _)) if field == "email"));

    assert!(service.list_groups().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_add_member() {
    let (service, _) = create_test_service();
    let group = create_group(&service, &["a"]).await;

    let updated = service
        .add_member(&group.id, Member::new("b", "Bea"))
        .await
        .unwrap();
    assert!(updated.is_member(&MemberId::from("b")));

    let again = service.add_member(&group.id, Member::new("b", "Bea")).await;
    assert!(matches!(again, Err(LedgerError::AlreadyGroupMember(_))));

    let missing = service.add_member("nope", Member::new("c", "Cy")).await;
    assert!(matches!(missing, Err(LedgerError::GroupNotFound(_))));

    let audits = service.get_group_audits(&group.id).await.unwrap();
    assert_eq!(audits.last().unwrap().action, MEMBER_ADDED);
    assert_eq!(audits.last().unwrap().member_id.as_deref(), Some("b"));
}

#[tokio::test]
async fn test_remove_member_without_expenses() {
    let (service, _) = create_test_service();
    let group = create_group(&service, &["a", "b"]).await;

    let updated = service
        .remove_member(&group.id, &MemberId::from("b"))
        .await
        .unwrap();
    assert_eq!(updated.members.len(), 1);

    let unknown = service.remove_member(&group.id, &MemberId::from("b")).await;
    assert!(matches!(unknown, Err(LedgerError::MemberNotFound(_))));

    let audits = service.get_group_audits(&group.id).await.unwrap();
    assert_eq!(audits.last().unwrap().action, MEMBER_REMOVED);
}

#[tokio::test]
async fn test_remove_member_referenced_by_ledger_is_forbidden() {
    let (service, _) = create_test_service();
    let group = create_group(&service, &["a", "b", "c"]).await;
    service
        .record_expense(&group.id, "Taxi", "a", "30", &["a", "b"])
        .await
        .unwrap();

    let payer = service.remove_member(&group.id, &MemberId::from("a")).await;
    assert!(matches!(payer, Err(LedgerError::MemberReferenced(id)) if id == "a"));
    let participant = service.remove_member(&group.id, &MemberId::from("b")).await;
    assert!(matches!(participant, Err(LedgerError::MemberReferenced(id)) if id == "b"));

    service
        .remove_member(&group.id, &MemberId::from("c"))
        .await
        .unwrap();

    let balances = service.get_balances(&group.id).await.unwrap();
    let total = balances
        .balances
        .iter()
        .fold(0, |sum, entry| sum + entry.balance.minor_units());
    assert_eq!(total, 0);
    assert_eq!(balances.balances.len(), 2);
}

#[tokio::test]
async fn test_delete_group_drops_its_ledger() {
    let (service, _) = create_test_service();
    let group = create_group(&service, &["a", "b"]).await;
    service
        .record_expense(&group.id, "Lunch", "a", "10", &["a", "b"])
        .await
        .unwrap();

    service.delete_group(&group.id).await.unwrap();

    assert!(service.get_group(&group.id).await.unwrap().is_none());
    assert!(matches!(
        service.list_expenses(&group.id).await,
        Err(LedgerError::GroupNotFound(_))
    ));
    assert!(service.recent_expenses(10).await.unwrap().is_empty());
    assert!(matches!(
        service.delete_group(&group.id).await,
        Err(LedgerError::GroupNotFound(_))
    ));
}

#[tokio::test]
async fn test_group_currency_is_kept() {
    let (service, _) = create_test_service();
    let group = service
        .create_group("Tokyo".to_string(), None, Currency::Jpy, members(&["a", "b"]))
        .await
        .unwrap();

    let expense = service
        .record_expense(&group.id, "Ramen", "a", "1500", &["a", "b"])
        .await
        .unwrap();
    assert_eq!(expense.amount, Money::new(1500, Currency::Jpy));

    let balances = service.get_balances(&group.id).await.unwrap();
    assert_eq!(balances.currency, Currency::Jpy);
}

#[tokio::test]
async fn test_group_locks_do_not_accumulate() {
    let (service, _) = create_test_service();

    for i in 0..1000 {
        let result = service.request_settlement(&format!("bogus-{}", i)).await;
        assert!(matches!(result, Err(LedgerError::GroupNotFound(_))));
    }
    let group = create_group(&service, &["a"]).await;
    service.delete_group(&group.id).await.unwrap();

    assert!(service.tracked_group_locks().await <= 1);
}
