//! Autonomous spend governance for a single advertising account.
//!
//! Each externally triggered cycle reads spend and performance from the
//! platform, records a shadow spend ledger, scales the daily budget on the
//! LTV:CAC ratio and pauses or pushes ads and ad groups. The crate keeps a
//! strict split:
//!
//! - **[`core`]**: Pure, deterministic decision rules (scaling, pacing,
//!   performance). No I/O, fully testable in isolation.
//! - **[`io`]**: Side effects (ledger and config files, the platform seam,
//!   the offline snapshot platform).
//!
//! Orchestration modules ([`tracker`], [`gate`], [`mutation`], [`cycle`])
//! combine the two to implement CLI commands.

pub mod core;
pub mod cycle;
pub mod exit_codes;
pub mod gate;
pub mod io;
pub mod logging;
pub mod mutation;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod tracker;
