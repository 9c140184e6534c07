//! Initial daily budget for a fixed-duration promotion.

use thiserror::Error;

use crate::core::types::MICROS_PER_UNIT;

/// Smallest total promotional budget accepted, in whole currency units.
pub const MINIMUM_TOTAL_BUDGET: u64 = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    #[error("total budget {total} is below the minimum of {minimum}")]
    BelowMinimum { total: u64, minimum: u64 },
    #[error("duration must be a positive number of days")]
    ZeroDuration,
}

pub fn validate_total_budget(total_units: u64, minimum_units: u64) -> Result<(), BudgetError> {
    if total_units < minimum_units {
        return Err(BudgetError::BelowMinimum {
            total: total_units,
            minimum: minimum_units,
        });
    }
    Ok(())
}

/// Spread `total_units` evenly over `duration_days`, returning micros per day.
pub fn initial_daily_budget(
    total_units: u64,
    duration_days: u32,
    minimum_units: u64,
) -> Result<u64, BudgetError> {
    validate_total_budget(total_units, minimum_units)?;
    if duration_days == 0 {
        return Err(BudgetError::ZeroDuration);
    }
    let per_day = total_units as f64 / f64::from(duration_days);
    Ok((per_day * MICROS_PER_UNIT as f64).round() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_total_across_days() {
        let daily = initial_daily_budget(20_000, 60, MINIMUM_TOTAL_BUDGET).expect("budget");
        assert_eq!(daily, 333_333_333);
    }

    #[test]
    fn rejects_budget_below_minimum() {
        let err = initial_daily_budget(9_999, 30, MINIMUM_TOTAL_BUDGET).unwrap_err();
        assert_eq!(
            err,
            BudgetError::BelowMinimum {
                total: 9_999,
                minimum: 10_000
            }
        );
    }

    #[test]
    fn minimum_itself_is_accepted() {
        assert!(validate_total_budget(MINIMUM_TOTAL_BUDGET, MINIMUM_TOTAL_BUDGET).is_ok());
    }

    #[test]
    fn rejects_zero_duration() {
        let err = initial_daily_budget(20_000, 0, MINIMUM_TOTAL_BUDGET).unwrap_err();
        assert_eq!(err, BudgetError::ZeroDuration);
    }
}
