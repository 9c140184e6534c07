//! Stable exit codes for governor CLI commands.

/// Command succeeded.
pub const OK: i32 = 0;
/// Invalid config, snapshot or arguments, or any other failure.
pub const INVALID: i32 = 1;
/// `governor cycle` completed, but a failed read forced a fallback.
pub const DEGRADED: i32 = 2;
/// A mutation was still rejected for policy reasons after the exempted retry.
pub const POLICY_REJECTED: i32 = 3;
