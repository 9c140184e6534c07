//! Spend pacing and milestone classification.

use crate::core::types::{DailySpendRecord, Milestone, PacingStatus};

/// Compare cumulative spend against the straight-line expectation for the period.
///
/// Day zero is always green. Red is checked before yellow since spend below
/// half the expectation is also below 80% of it.
pub fn pacing_status(
    current_spend: u64,
    target_spend: u64,
    days_elapsed: u32,
    total_days: u32,
) -> PacingStatus {
    if days_elapsed == 0 {
        return PacingStatus::Green;
    }

    let expected = target_spend as f64 / f64::from(total_days.max(1)) * f64::from(days_elapsed);
    let actual = current_spend as f64;

    if actual >= expected {
        return PacingStatus::Green;
    }
    if actual < expected / 2.0 {
        return PacingStatus::Red;
    }
    if actual < expected * 0.8 {
        return PacingStatus::Yellow;
    }
    PacingStatus::Green
}

/// Labels of milestones crossed between `previous` and `current_spend`.
///
/// `previous` is the latest snapshot from before the current cycle; without
/// one, spend is assumed to start at zero. Results follow ascending threshold
/// order regardless of configuration order.
pub fn crossed_milestones(
    previous: Option<&DailySpendRecord>,
    current_spend: u64,
    milestones: &[Milestone],
) -> Vec<String> {
    let previous_spend = previous.map_or(0, |record| record.spend_micros);

    let mut ordered: Vec<&Milestone> = milestones.iter().collect();
    ordered.sort_by_key(|milestone| milestone.threshold_micros);

    ordered
        .into_iter()
        .filter(|milestone| {
            previous_spend < milestone.threshold_micros
                && milestone.threshold_micros <= current_spend
        })
        .map(|milestone| milestone.label.clone())
        .collect()
}
