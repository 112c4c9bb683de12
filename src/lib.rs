//! Student ledger and grading engine for the school portal: carry-forward
//! fee balances, best-seven examination points and performance analytics,
//! plus the stdio sidecar protocol the portal UI talks to.

pub mod analytics;
pub mod calc;
pub mod config;
pub mod fees;
pub mod grading;
pub mod ipc;
pub mod records;
