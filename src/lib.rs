//! Back-office accounting engine for a two-store food-service operation.
//!
//! The two stores ("base1" and "base3") share one kitchen ledger: daily
//! sales are entered per store, variable expenses are entered once and
//! split by revenue ratio, and fixed costs are entered per store per month.
//! On top of that the crate derives the monthly profit/loss analysis, a
//! prorated month-to-date prediction, and a dashboard breakdown.
//!
//! The command layer in [`commands`] is the public surface: each command
//! checks the caller's role, validates its payload, and reads or writes
//! through the shared SQLite state in [`db`].

pub mod aggregates;
pub mod analysis;
pub mod audit;
pub mod commands;
pub mod db;
pub mod entries;
pub mod errors;
pub mod fixed_costs;
pub mod identity;
pub mod logging;
pub mod money;

pub use commands::accounting::{
    accounting_get_daily, accounting_get_history, accounting_get_monthly, accounting_save_daily,
    accounting_save_monthly,
};
pub use commands::analysis::{
    analysis_get_dashboard, analysis_get_monthly, analysis_get_prediction,
};
pub use db::DbState;
pub use errors::ServiceError;
pub use identity::{Caller, Role};
