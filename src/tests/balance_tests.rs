use super::{create_group, create_test_service};
use crate::core::balances::{Transfer, compute_balances, simplify_debts, split_evenly, sum_balances};
use crate::core::lifecycle::SettlementState;
use crate::core::models::{
    expense::NewExpense,
    member::MemberId,
    money::{Currency, Money},
};
use std::collections::{BTreeMap, BTreeSet};

fn inr(units: i64) -> Money {
    Money::new(units, Currency::Inr)
}

fn ids(list: &[&str]) -> BTreeSet<MemberId> {
    list.iter().map(|id| MemberId::from(*id)).collect()
}

fn draft(payer: &str, units: i64, participants: &[&str]) -> NewExpense {
    NewExpense {
        description: "Groceries".to_string(),
        payer: MemberId::from(payer),
        amount: inr(units),
        participants: ids(participants),
    }
}

fn balance_of(balances: &crate::core::services::GroupBalances, id: &str) -> i64 {
    balances
        .balances
        .iter()
        .find(|entry| entry.member_id.as_str() == id)
        .map(|entry| entry.balance.minor_units())
        .unwrap()
}

#[test]
fn test_split_gives_remainder_to_lowest_ids() {
    let shares = split_evenly(inr(100), &ids(&["c", "a", "b"])).unwrap();
    assert_eq!(
        shares,
        vec![
            (MemberId::from("a"), inr(34)),
            (MemberId::from("b"), inr(33)),
            (MemberId::from("c"), inr(33)),
        ]
    );

    let shares = split_evenly(inr(101), &ids(&["x", "y", "z"])).unwrap();
    let units: Vec<i64> = shares.iter().map(|(_, m)| m.minor_units()).collect();
    assert_eq!(units, vec![34, 34, 33]);
}

#[tokio::test]
async fn test_three_way_split_balances() {
    let (service, _) = create_test_service();
    let group = create_group(&service, &["a", "b", "c"]).await;
    service
        .create_expense(&group.id, draft("a", 100, &["a", "b", "c"]))
        .await
        .unwrap();

    let balances = service.get_balances(&group.id).await.unwrap();
    assert_eq!(balance_of(&balances, "a"), 66);
    assert_eq!(balance_of(&balances, "b"), -33);
    assert_eq!(balance_of(&balances, "c"), -33);
    assert!(!balances.settled);
    assert_eq!(balances.state, SettlementState::Open);
}

#[tokio::test]
async fn test_payer_inside_a_two_way_split() {
    let (service, _) = create_test_service();
    let group = create_group(&service, &["a", "b"]).await;
    service
        .create_expense(&group.id, draft("b", 10, &["a", "b"]))
        .await
        .unwrap();

    let balances = service.get_balances(&group.id).await.unwrap();
    assert_eq!(balance_of(&balances, "a"), -5);
    assert_eq!(balance_of(&balances, "b"), 5);
    assert_eq!(
        balances.transfers,
        vec![Transfer {
            from: MemberId::from("a"),
            to: MemberId::from("b"),
            amount: inr(5),
        }]
    );
}

#[tokio::test]
async fn test_payer_outside_the_split() {
    let (service, _) = create_test_service();
    let group = create_group(&service, &["a", "b", "c"]).await;
    service
        .create_expense(&group.id, draft("c", 90, &["a", "b"]))
        .await
        .unwrap();

    let balances = service.get_balances(&group.id).await.unwrap();
    assert_eq!(balance_of(&balances, "a"), -45);
    assert_eq!(balance_of(&balances, "b"), -45);
    assert_eq!(balance_of(&balances, "c"), 90);
}

#[tokio::test]
async fn test_empty_ledger_is_settled() {
    let (service, _) = create_test_service();
    let group = create_group(&service, &["a", "b", "c"]).await;

    let balances = service.get_balances(&group.id).await.unwrap();
    assert!(balances.balances.iter().all(|entry| entry.balance.is_zero()));
    assert!(balances.settled);
    assert!(balances.transfers.is_empty());
}

#[tokio::test]
async fn test_balances_follow_member_display_order() {
    let (service, _) = create_test_service();
    let group = create_group(&service, &["zed", "amy", "kim"]).await;

    let balances = service.get_balances(&group.id).await.unwrap();
    let order: Vec<&str> = balances.balances.iter().map(|b| b.member_id.as_str()).collect();
    assert_eq!(order, vec!["zed", "amy", "kim"]);
}

#[tokio::test]
async fn test_recompute_is_idempotent() {
    let (service, _) = create_test_service();
    let group = create_group(&service, &["a", "b", "c"]).await;
    service
        .create_expense(&group.id, draft("a", 1_001, &["a", "b", "c"]))
        .await
        .unwrap();
    service
        .create_expense(&group.id, draft("b", 250, &["b", "c"]))
        .await
        .unwrap();

    let first = service.get_balances(&group.id).await.unwrap();
    let second = service.get_balances(&group.id).await.unwrap();
    assert_eq!(first.balances, second.balances);
    assert_eq!(first.transfers, second.transfers);
}

#[test]
fn test_simplify_debts_zeroes_everything() {
    let balances: BTreeMap<MemberId, Money> = BTreeMap::from([
        (MemberId::from("a"), inr(70)),
        (MemberId::from("b"), inr(-50)),
        (MemberId::from("c"), inr(-30)),
        (MemberId::from("d"), inr(10)),
    ]);

    let transfers = simplify_debts(&balances).unwrap();
    assert_eq!(
        transfers,
        vec![
            Transfer {
                from: MemberId::from("b"),
                to: MemberId::from("a"),
                amount: inr(50),
            },
            Transfer {
                from: MemberId::from("c"),
                to: MemberId::from("a"),
                amount: inr(20),
            },
            Transfer {
                from: MemberId::from("c"),
                to: MemberId::from("d"),
                amount: inr(10),
            },
        ]
    );
}

#[test]
fn test_compute_balances_conserves_units() {
    let group = crate::core::models::group::Group {
        id: "g".to_string(),
        name: "G".to_string(),
        description: None,
        currency: Currency::Inr,
        members: super::members(&["a", "b", "c"]),
        state: SettlementState::Open,
        created_at: chrono::Utc::now(),
    };
    let expenses = vec![crate::core::models::expense::Expense {
        id: "e1".to_string(),
        group_id: "g".to_string(),
        description: "Fuel".to_string(),
        payer: MemberId::from("b"),
        amount: inr(7),
        participants: ids(&["a", "b", "c"]),
        created_at: chrono::Utc::now(),
    }];

    let balances = compute_balances(&group, &expenses).unwrap();
    assert_eq!(sum_balances(&balances, Currency::Inr).unwrap(), inr(0));
    assert_eq!(balances[&MemberId::from("a")], inr(-3));
    assert_eq!(balances[&MemberId::from("b")], inr(5));
    assert_eq!(balances[&MemberId::from("c")], inr(-2));
}

#[tokio::test]
async fn test_balance_overview_skips_vanished_groups() {
    let (service, _) = create_test_service();
    let kept = create_group(&service, &["a", "b"]).await;
    let gone = create_group(&service, &["c", "d"]).await;
    service.delete_group(&gone.id).await.unwrap();

    let views = service
        .get_balances_for(&[kept.id.clone(), gone.id.clone()])
        .await
        .unwrap();
    assert_eq!(views.len(), 1);
    assert_eq!(views[0].group_id, kept.id);
}
