//! Shared deterministic types for governor core logic.
//!
//! These types define stable contracts between the pure decision rules and the
//! orchestration layer. They must not depend on external state or I/O.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Number of micros in one whole currency unit.
pub const MICROS_PER_UNIT: u64 = 1_000_000;

/// Convert whole currency units to micros.
pub const fn units_to_micros(units: u64) -> u64 {
    units * MICROS_PER_UNIT
}

/// One cumulative spend snapshot per calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailySpendRecord {
    pub date: NaiveDate,
    /// Cumulative account spend since the promotion start, in micros.
    pub spend_micros: u64,
}

/// Whether cumulative spend is on track for the promotional target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PacingStatus {
    /// On track or ahead of schedule.
    Green,
    /// More than 20% behind schedule.
    Yellow,
    /// More than 50% behind schedule.
    Red,
}

/// A cumulative-spend threshold whose first crossing is reported once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub label: String,
    pub threshold_micros: u64,
}

impl Milestone {
    pub fn new(label: impl Into<String>, threshold_micros: u64) -> Self {
        Self {
            label: label.into(),
            threshold_micros,
        }
    }
}

/// Budget tier derived from the LTV:CAC ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScalingTier {
    Pause,
    Maintain,
    Scale,
    AggressiveScale,
}

impl ScalingTier {
    pub const ALL: [ScalingTier; 4] = [
        ScalingTier::Pause,
        ScalingTier::Maintain,
        ScalingTier::Scale,
        ScalingTier::AggressiveScale,
    ];

    /// Multiplier applied to the current daily budget.
    pub fn factor(self) -> f64 {
        match self {
            ScalingTier::Pause => 0.0,
            ScalingTier::Maintain => 1.0,
            ScalingTier::Scale => 1.618,
            ScalingTier::AggressiveScale => 2.618,
        }
    }

    /// Classify an LTV:CAC ratio. Lower bounds are closed; NaN pauses.
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio.is_nan() || ratio < 1.0 {
            ScalingTier::Pause
        } else if ratio < 3.0 {
            ScalingTier::Maintain
        } else if ratio < 4.0 {
            ScalingTier::Scale
        } else {
            ScalingTier::AggressiveScale
        }
    }
}

/// Performance metrics for one ad or ad group, read fresh each cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    /// Ad group id, or the ad-group-ad resource name for ads.
    pub unit_id: String,
    pub cost_micros: u64,
    pub conversions: f64,
    pub clicks: u64,
    pub impressions: u64,
    pub ctr: f64,
    pub cost_per_conversion_micros: u64,
}

/// Campaign bidding strategy as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BiddingStrategy {
    ManualCpc,
    MaximizeClicks,
    TargetCpa,
    TargetRoas,
    #[serde(other)]
    Unknown,
}

/// Campaign-level settings relevant to budget and bid decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignSettings {
    pub campaign_id: String,
    pub bidding_strategy: BiddingStrategy,
    /// Zero when the campaign has no target CPA.
    #[serde(default)]
    pub target_cpa_micros: u64,
    /// Maximize-clicks bid cap, if one is set.
    #[serde(default)]
    pub cpc_bid_limit_micros: Option<u64>,
    pub daily_budget_micros: u64,
}

/// An enabled keyword and its current CPC bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordBid {
    pub resource_name: String,
    #[serde(default)]
    pub cpc_bid_micros: Option<u64>,
}
