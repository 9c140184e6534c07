//! Deterministic, pure decision logic for the governance loop.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for tests.

pub mod daily_budget;
pub mod pacing;
pub mod performance;
pub mod scaling;
pub mod types;
