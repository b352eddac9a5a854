//! Balance engine.
//!
//! Balances are recomputed from the ledger on every read. Nothing here holds
//! state, so concurrent readers need no coordination.

use crate::core::errors::LedgerError;
use crate::core::models::{
    expense::Expense,
    group::Group,
    member::MemberId,
    money::{Currency, Money},
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use utoipa::ToSchema;

/// Net position per member: positive is owed money, negative owes money.
pub type Balances = BTreeMap<MemberId, Money>;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct Transfer {
    pub from: MemberId,
    pub to: MemberId,
    pub amount: Money,
}

/// Divides `amount` evenly across `participants`.
///
/// Leftover minor units go one each to the participants with the lowest
/// member ids, so the shares always add back up to `amount`.
pub fn split_evenly(amount: Money, participants: &BTreeSet<MemberId>) -> Result<Vec<(MemberId, Money)>, LedgerError> {
    let (share, remainder) = amount.divide_evenly(participants.len() as i64)?;
    let extra_unit = Money::new(1, amount.currency());

    participants
        .iter()
        .enumerate()
        .map(|(idx, member)| {
            let owed = if (idx as i64) < remainder {
                share.add(extra_unit)?
            } else {
                share
            };
            Ok((member.clone(), owed))
        })
        .collect()
}

pub fn compute_balances(group: &Group, expenses: &[Expense]) -> Result<Balances, LedgerError> {
    let currency = group.currency;
    let mut balances: Balances = group
        .member_ids()
        .map(|id| (id.clone(), Money::zero(currency)))
        .collect();

    for expense in expenses {
        adjust(&mut balances, &expense.payer, expense.amount, currency)?;
        for (member, share) in expense.shares()? {
            adjust(&mut balances, &member, share.negate()?, currency)?;
        }
    }

    Ok(balances)
}

fn adjust(balances: &mut Balances, member: &MemberId, delta: Money, currency: Currency) -> Result<(), LedgerError> {
    let entry = balances.entry(member.clone()).or_insert(Money::zero(currency));
    *entry = entry.add(delta)?;
    Ok(())
}

pub fn sum_balances(balances: &Balances, currency: Currency) -> Result<Money, LedgerError> {
    balances
        .values()
        .try_fold(Money::zero(currency), |total, balance| -> Result<Money, LedgerError> {
            Ok(total.add(*balance)?)
        })
}

/// Suggests who should pay whom so every balance reaches zero.
///
/// Greedy: the largest debtor pays the largest creditor, ties broken by
/// member id. Amounts stay exact.
pub fn simplify_debts(balances: &Balances) -> Result<Vec<Transfer>, LedgerError> {
    let Some(currency) = balances.values().next().map(|m| m.currency()) else {
        return Ok(Vec::new());
    };

    let mut creditors: Vec<(MemberId, i64)> = Vec::new();
    let mut debtors: Vec<(MemberId, i64)> = Vec::new();
    for (member, balance) in balances {
        if balance.currency() != currency {
            return Err(LedgerError::CurrencyMismatch {
                expected: currency,
                found: balance.currency(),
            });
        }
        if balance.is_positive() {
            creditors.push((member.clone(), balance.minor_units()));
        } else if balance.is_negative() {
            debtors.push((member.clone(), balance.minor_units().checked_neg().ok_or(LedgerError::AmountOverflow)?));
        }
    }

    let by_size = |a: &(MemberId, i64), b: &(MemberId, i64)| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0));

    let mut transfers = Vec::new();
    while !creditors.is_empty() && !debtors.is_empty() {
        creditors.sort_by(by_size);
        debtors.sort_by(by_size);

        let amount = creditors[0].1.min(debtors[0].1);
        transfers.push(Transfer {
            from: debtors[0].0.clone(),
            to: creditors[0].0.clone(),
            amount: Money::new(amount, currency),
        });

        creditors[0].1 -= amount;
        debtors[0].1 -= amount;
        creditors.retain(|(_, left)| *left > 0);
        debtors.retain(|(_, left)| *left > 0);
    }

    Ok(transfers)
}
