//! Advertising platform abstraction.
//!
//! The [`AdsPlatform`] trait decouples the governance loop from the remote
//! account API. A handle is bound to a single account and passed explicitly to
//! every component; tests use scripted platforms that return predetermined
//! reports and record mutations without any network access.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::types::{CampaignSettings, KeywordBid, PerformanceRecord};

/// Cost reported by the platform for one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCost {
    pub date: NaiveDate,
    pub cost_micros: u64,
}

/// A single platform write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    PauseAd {
        resource_name: String,
    },
    PauseAdGroup {
        ad_group_id: String,
    },
    SetKeywordBid {
        resource_name: String,
        cpc_bid_micros: u64,
    },
    SetCampaignBidCap {
        campaign_id: String,
        cpc_bid_limit_micros: u64,
    },
    SetDailyBudget {
        campaign_id: String,
        amount_micros: u64,
    },
    CreateNegativeKeywordSet {
        name: String,
        keywords: Vec<String>,
    },
}

impl Mutation {
    /// Identifier of the resource the mutation changes or creates.
    pub fn target(&self) -> &str {
        match self {
            Mutation::PauseAd { resource_name } | Mutation::SetKeywordBid { resource_name, .. } => {
                resource_name
            }
            Mutation::PauseAdGroup { ad_group_id } => ad_group_id,
            Mutation::SetCampaignBidCap { campaign_id, .. }
            | Mutation::SetDailyBudget { campaign_id, .. } => campaign_id,
            Mutation::CreateNegativeKeywordSet { name, .. } => name,
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::PauseAd { resource_name } => write!(f, "pause ad {resource_name}"),
            Mutation::PauseAdGroup { ad_group_id } => write!(f, "pause ad group {ad_group_id}"),
            Mutation::SetKeywordBid {
                resource_name,
                cpc_bid_micros,
            } => write!(f, "set keyword {resource_name} bid to {cpc_bid_micros}"),
            Mutation::SetCampaignBidCap {
                campaign_id,
                cpc_bid_limit_micros,
            } => write!(
                f,
                "set campaign {campaign_id} bid cap to {cpc_bid_limit_micros}"
            ),
            Mutation::SetDailyBudget {
                campaign_id,
                amount_micros,
            } => write!(
                f,
                "set campaign {campaign_id} daily budget to {amount_micros}"
            ),
            Mutation::CreateNegativeKeywordSet { name, keywords } => write!(
                f,
                "create negative keyword set '{name}' ({} keywords)",
                keywords.len()
            ),
        }
    }
}

/// Policy topics the platform should ignore when validating a write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyExemption {
    pub ignorable_policy_topics: Vec<String>,
}

/// A mutation plus the optional exemption attached on retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryableOperation {
    pub mutation: Mutation,
    pub exemption: Option<PolicyExemption>,
}

impl RetryableOperation {
    pub fn new(mutation: Mutation) -> Self {
        Self {
            mutation,
            exemption: None,
        }
    }

    pub fn with_exemption(mut self, exemption: PolicyExemption) -> Self {
        self.exemption = Some(exemption);
        self
    }
}

/// Result of an accepted write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOutcome {
    /// Resource the platform reports as changed or created.
    pub resource_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// Content or settings violate one or more platform policies.
    #[error("policy finding: {message}")]
    PolicyFinding { message: String, topics: Vec<String> },
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("platform unavailable: {0}")]
    Unavailable(String),
}

impl PlatformError {
    /// Policy topics reported by the failure; empty for non-policy errors.
    pub fn policy_topics(&self) -> &[String] {
        match self {
            PlatformError::PolicyFinding { topics, .. } => topics,
            _ => &[],
        }
    }
}

/// Anything that can issue a platform write.
pub trait Mutator {
    fn execute(&self, operation: &RetryableOperation) -> Result<MutationOutcome, PlatformError>;
}

/// Read and write access to one advertising account.
pub trait AdsPlatform: Mutator {
    /// Per-day cost for `start..=end`.
    fn daily_costs(&self, start: NaiveDate, end: NaiveDate)
    -> Result<Vec<DailyCost>, PlatformError>;

    /// Per-ad metrics for a campaign. Unit ids are ad-group-ad resource names.
    fn ad_performance(&self, campaign_id: &str) -> Result<Vec<PerformanceRecord>, PlatformError>;

    /// Per-ad-group metrics for a campaign. Unit ids are ad group ids.
    fn ad_group_performance(
        &self,
        campaign_id: &str,
    ) -> Result<Vec<PerformanceRecord>, PlatformError>;

    fn campaign_settings(&self, campaign_id: &str) -> Result<CampaignSettings, PlatformError>;

    /// Enabled keywords of an ad group.
    fn keyword_bids(&self, ad_group_id: &str) -> Result<Vec<KeywordBid>, PlatformError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_policy_findings_carry_topics() {
        let policy = PlatformError::PolicyFinding {
            message: "trademark".to_string(),
            topics: vec!["TRADEMARKS_IN_AD_TEXT".to_string()],
        };
        assert_eq!(policy.policy_topics(), ["TRADEMARKS_IN_AD_TEXT"]);
        assert!(
            PlatformError::Rejected("quota".to_string())
                .policy_topics()
                .is_empty()
        );
    }

    #[test]
    fn mutation_serializes_with_kind_tag() {
        let mutation = Mutation::SetDailyBudget {
            campaign_id: "42".to_string(),
            amount_micros: 1_000_000,
        };
        let value = serde_json::to_value(&mutation).expect("serialize");
        assert_eq!(value["kind"], "set_daily_budget");
        assert_eq!(mutation.to_string(), "set campaign 42 daily budget to 1000000");
    }

    #[test]
    fn negative_keyword_set_targets_its_name() {
        let mutation = Mutation::CreateNegativeKeywordSet {
            name: "brand-exclusions".to_string(),
            keywords: vec!["free".to_string(), "jobs".to_string()],
        };
        assert_eq!(mutation.target(), "brand-exclusions");
        assert_eq!(
            mutation.to_string(),
            "create negative keyword set 'brand-exclusions' (2 keywords)"
        );
    }
}
