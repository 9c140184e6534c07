//! LTV:CAC-driven daily budget scaling.
//!
//! The budget moves through four tiers keyed on the LTV:CAC ratio. Scaling up
//! is gradual (bounded by a per-day change percentage) and always capped by a
//! hard daily ceiling. Pausing is instantaneous and ignores the change cap.

use serde::{Deserialize, Serialize};

use crate::core::types::{MICROS_PER_UNIT, ScalingTier, units_to_micros};

/// Hard limits applied to every computed budget.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BudgetGuardrails {
    /// Absolute ceiling for the daily budget, in micros.
    pub max_daily_budget_micros: u64,
    /// Largest allowed day-over-day change, as a fraction of the current budget.
    pub max_daily_change_percent: f64,
}

impl Default for BudgetGuardrails {
    fn default() -> Self {
        Self {
            max_daily_budget_micros: units_to_micros(2_000),
            max_daily_change_percent: 0.20,
        }
    }
}

/// Lifetime value over customer acquisition cost.
///
/// Returns `0.0` without conversions and `f64::INFINITY` when conversions exist
/// but spend is zero.
pub fn ltv_cac_ratio(conversions: u64, total_spend_micros: u64, avg_ltv: f64) -> f64 {
    if conversions == 0 {
        return 0.0;
    }
    let total_spend = total_spend_micros as f64 / MICROS_PER_UNIT as f64;
    let cac = total_spend / conversions as f64;
    if cac == 0.0 {
        return f64::INFINITY;
    }
    avg_ltv / cac
}

/// Compute tomorrow's daily budget from the current budget and LTV:CAC ratio.
pub fn next_daily_budget(current_micros: u64, ratio: f64, guardrails: &BudgetGuardrails) -> u64 {
    let tier = ScalingTier::from_ratio(ratio);
    if tier == ScalingTier::Pause {
        return 0;
    }

    let current = current_micros as f64;
    let target = current * tier.factor();
    let limited = clamp_daily_change(current, target, guardrails.max_daily_change_percent);
    let capped = limited.min(guardrails.max_daily_budget_micros as f64);
    capped.ceil() as u64
}

/// Bound `target` to within `max_change_percent` of `current` in either direction.
///
/// The decrease arm is not reachable from [`next_daily_budget`] while every
/// non-pause tier has a factor of at least 1.0.
pub(crate) fn clamp_daily_change(current: f64, target: f64, max_change_percent: f64) -> f64 {
    let max_change = (current * max_change_percent).floor();
    if target > current {
        target.min(current + max_change)
    } else if target < current {
        target.max(current - max_change)
    } else {
        target
    }
}
