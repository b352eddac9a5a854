pub mod api;
pub mod config;
pub mod constants;
pub mod core;
pub mod infrastructure;

pub use crate::core::errors::LedgerError;
pub use crate::core::models::{
    expense::{Expense, NewExpense},
    group::Group,
    member::{Member, MemberId},
    money::{Currency, Money},
    settlement::Settlement,
};
pub use crate::core::services::{GroupBalances, LedgerService, LedgerSettings};

#[cfg(test)]
mod tests; // Include integration tests
