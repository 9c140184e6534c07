//! I/O helpers for governor commands.

pub mod config;
pub mod init;
pub mod ledger;
pub mod platform;
pub mod snapshot;
