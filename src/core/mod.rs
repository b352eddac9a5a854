pub mod balances;
pub mod errors;
pub mod lifecycle;
pub mod models;
pub mod services;
