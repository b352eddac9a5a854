use serde::Serialize;
use thiserror::Error;

use crate::core::models::money::Currency;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

/// The constraint an expense draft broke.
#[derive(Error, Debug, Clone, Serialize, PartialEq, Eq)]
pub enum ExpenseViolation {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("amount exceeds the maximum of {0} minor units")]
    AmountTooLarge(i64),
    #[error("at least one participant is required")]
    EmptyParticipants,
    #[error("participant {0} is not a group member")]
    UnknownParticipant(String),
    #[error("payer {0} is not a group member")]
    UnknownPayer(String),
    #[error("description {0}")]
    InvalidDescription(String),
}

#[derive(Error, Debug, Clone, Serialize, PartialEq, Eq)]
pub enum ConflictReason {
    #[error("settlement {0} is still pending")]
    SettlementPending(String),
    #[error("group is already settled")]
    AlreadySettled,
}

#[derive(Error, Debug, Clone, Serialize, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },
    #[error("Cannot split an amount {0} ways")]
    InvalidSplit(i64),
    #[error("Amount overflow")]
    Overflow,
    #[error("Cannot parse amount `{0}`")]
    Parse(String),
}

#[derive(Error, Debug, Serialize)]
pub enum LedgerError {
    #[error("Invalid expense: {0}")]
    InvalidExpense(ExpenseViolation),
    #[error("Currency mismatch: expected {expected}, found {found}")]
    CurrencyMismatch { expected: Currency, found: Currency },
    #[error("Cannot split an amount {0} ways")]
    InvalidSplit(i64),
    #[error("Conflict: {0}")]
    Conflict(ConflictReason),
    #[error("Group {0} not found")]
    GroupNotFound(String),
    #[error("Member {0} not found")]
    MemberNotFound(String),
    #[error("Settlement {0} not found")]
    SettlementNotFound(String),
    #[error("Member {0} is already a group member")]
    AlreadyGroupMember(String),
    #[error("Member {0} is referenced by recorded expenses")]
    MemberReferenced(String),
    #[error("Settlement {0} already resolved")]
    SettlementAlreadyResolved(String),
    #[error("Cannot apply {event} while {from}")]
    InvalidTransition { from: String, event: String },
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Amount overflow")]
    AmountOverflow,
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Logging error: {0}")]
    LoggingError(String),
}

impl From<MoneyError> for LedgerError {
    fn from(err: MoneyError) -> Self {
        match err {
            MoneyError::CurrencyMismatch { expected, found } => LedgerError::CurrencyMismatch { expected, found },
            MoneyError::InvalidSplit(n) => LedgerError::InvalidSplit(n),
            MoneyError::Overflow => LedgerError::AmountOverflow,
            MoneyError::Parse(input) => LedgerError::InvalidAmount(input),
        }
    }
}

impl From<ExpenseViolation> for LedgerError {
    fn from(violation: ExpenseViolation) -> Self {
        LedgerError::InvalidExpense(violation)
    }
}
