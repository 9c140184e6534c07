//! Keep/cut/push rules for ads and ad groups.
//!
//! All rules operate on already-fetched [`PerformanceRecord`]s and return unit
//! ids in input order.

use serde::{Deserialize, Serialize};

use crate::core::types::{BiddingStrategy, PerformanceRecord, units_to_micros};

/// Thresholds used by the performance gate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateRules {
    /// Ads with a CTR below this are paused.
    pub ctr_threshold: f64,
    /// Ads need strictly more impressions than this before the CTR rule applies.
    pub min_impressions: u64,
    /// Ad groups without conversions are cut once spend exceeds this.
    pub losing_spend_floor_micros: u64,
    /// Minimum conversions before an ad group can be called a winner.
    pub winning_min_conversions: f64,
    /// Fractional bid raise applied for winners (0.20 = +20%).
    pub bid_increase_percent: f64,
}

impl Default for GateRules {
    fn default() -> Self {
        Self {
            ctr_threshold: 0.01,
            min_impressions: 100,
            losing_spend_floor_micros: units_to_micros(2_000),
            winning_min_conversions: 5.0,
            bid_increase_percent: 0.20,
        }
    }
}

/// Units whose CTR is below `threshold`.
///
/// Callers are expected to have dropped thin samples (see
/// [`GateRules::min_impressions`]) before applying this rule.
pub fn underperformers(records: &[PerformanceRecord], threshold: f64) -> Vec<String> {
    records
        .iter()
        .filter(|record| record.ctr < threshold)
        .map(|record| record.unit_id.clone())
        .collect()
}

/// Units costing more than the target CPA, or spending past the floor without converting.
pub fn losing_units(
    records: &[PerformanceRecord],
    target_cpa_micros: u64,
    spend_floor_micros: u64,
) -> Vec<String> {
    records
        .iter()
        .filter(|record| {
            let over_target =
                target_cpa_micros > 0 && record.cost_per_conversion_micros > target_cpa_micros;
            let burning = record.conversions == 0.0 && record.cost_micros > spend_floor_micros;
            over_target || burning
        })
        .map(|record| record.unit_id.clone())
        .collect()
}

/// Units beating the target CPA with enough conversions to trust it.
///
/// Without a target CPA nothing can win.
pub fn winning_units(
    records: &[PerformanceRecord],
    target_cpa_micros: u64,
    min_conversions: f64,
) -> Vec<String> {
    if target_cpa_micros == 0 {
        return Vec::new();
    }
    records
        .iter()
        .filter(|record| {
            record.cost_per_conversion_micros < target_cpa_micros
                && record.conversions >= min_conversions
        })
        .map(|record| record.unit_id.clone())
        .collect()
}

/// Why no bid change is made for a strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidSkipReason {
    /// Maximize-clicks campaign without a bid cap to raise.
    NoBidCap,
    /// The platform controls bids (target CPA / target ROAS).
    Automated,
    Unhandled,
}

/// Bid change to make for winning units, by bidding strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum BidAction {
    RaiseKeywordBids {
        percentage: f64,
    },
    RaiseBidCap {
        current_limit_micros: u64,
        new_limit_micros: u64,
    },
    Skip {
        reason: BidSkipReason,
    },
}

pub fn bid_adjustment_plan(
    strategy: BiddingStrategy,
    bid_cap_micros: Option<u64>,
    percentage: f64,
) -> BidAction {
    match strategy {
        BiddingStrategy::ManualCpc => BidAction::RaiseKeywordBids { percentage },
        BiddingStrategy::MaximizeClicks => match bid_cap_micros {
            Some(current) if current > 0 => BidAction::RaiseBidCap {
                current_limit_micros: current,
                new_limit_micros: raised_bid(current, percentage),
            },
            _ => BidAction::Skip {
                reason: BidSkipReason::NoBidCap,
            },
        },
        BiddingStrategy::TargetCpa | BiddingStrategy::TargetRoas => BidAction::Skip {
            reason: BidSkipReason::Automated,
        },
        BiddingStrategy::Unknown => BidAction::Skip {
            reason: BidSkipReason::Unhandled,
        },
    }
}

/// Raise a bid by `percentage`, truncating to whole micros.
pub fn raised_bid(bid_micros: u64, percentage: f64) -> u64 {
    (bid_micros as f64 * (1.0 + percentage)).floor() as u64
}
