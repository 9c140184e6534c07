//! Performance gate: decides which ads and ad groups to cut and which to push.
//!
//! Reads go through the platform handle and degrade to empty on failure, so a
//! flaky report never pauses anything. The resulting [`GateDecisions`] are
//! expanded into platform writes by [`PerformanceGate::mutations`]; issuing
//! them is the caller's job.

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::core::performance::{
    self, BidAction, BidSkipReason, GateRules, bid_adjustment_plan, raised_bid,
};
use crate::core::types::{CampaignSettings, PerformanceRecord};
use crate::io::platform::{AdsPlatform, Mutation, PlatformError};

/// Keep/cut/push decisions for one campaign.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GateDecisions {
    /// Ad resource names whose CTR is below the threshold.
    pub pause_ads: Vec<String>,
    /// Ad group ids losing money against the target CPA.
    pub pause_ad_groups: Vec<String>,
    /// Ad group ids beating the target CPA.
    pub winning_ad_groups: Vec<String>,
    /// Bid change for the winners. `None` without winners or campaign settings.
    pub bid_action: Option<BidAction>,
}

pub struct PerformanceGate<'a, P: AdsPlatform + ?Sized> {
    platform: &'a P,
    rules: &'a GateRules,
}

impl<'a, P: AdsPlatform + ?Sized> PerformanceGate<'a, P> {
    pub fn new(platform: &'a P, rules: &'a GateRules) -> Self {
        Self { platform, rules }
    }

    /// Fetch current performance and apply the gate rules.
    ///
    /// Without `settings` there is no target CPA, so only the zero-conversion
    /// spend rule can cut ad groups and nothing wins.
    #[instrument(skip_all, fields(campaign_id = %campaign_id))]
    pub fn evaluate(
        &self,
        campaign_id: &str,
        settings: Option<&CampaignSettings>,
    ) -> GateDecisions {
        let ads: Vec<PerformanceRecord> = degrade_to_empty(
            "ad performance",
            self.platform.ad_performance(campaign_id),
        )
        .into_iter()
        .filter(|record| record.impressions > self.rules.min_impressions)
        .collect();
        let pause_ads = performance::underperformers(&ads, self.rules.ctr_threshold);

        let ad_groups = degrade_to_empty(
            "ad group performance",
            self.platform.ad_group_performance(campaign_id),
        );
        let target_cpa_micros = settings.map_or(0, |settings| settings.target_cpa_micros);
        let pause_ad_groups = performance::losing_units(
            &ad_groups,
            target_cpa_micros,
            self.rules.losing_spend_floor_micros,
        );
        let winning_ad_groups = performance::winning_units(
            &ad_groups,
            target_cpa_micros,
            self.rules.winning_min_conversions,
        );

        let bid_action = match settings {
            Some(settings) if !winning_ad_groups.is_empty() => {
                let action = bid_adjustment_plan(
                    settings.bidding_strategy,
                    settings.cpc_bid_limit_micros,
                    self.rules.bid_increase_percent,
                );
                log_skip(&action, settings);
                Some(action)
            }
            _ => None,
        };

        debug!(
            ads = ads.len(),
            ad_groups = ad_groups.len(),
            pause_ads = pause_ads.len(),
            pause_ad_groups = pause_ad_groups.len(),
            winners = winning_ad_groups.len(),
            "gate evaluated"
        );
        GateDecisions {
            pause_ads,
            pause_ad_groups,
            winning_ad_groups,
            bid_action,
        }
    }

    /// Expand decisions into platform writes, pauses first.
    ///
    /// Keyword bids are only read for manual CPC raises; keywords without a
    /// bid of their own are left alone.
    pub fn mutations(&self, campaign_id: &str, decisions: &GateDecisions) -> Vec<Mutation> {
        let mut mutations: Vec<Mutation> = decisions
            .pause_ads
            .iter()
            .map(|resource_name| Mutation::PauseAd {
                resource_name: resource_name.clone(),
            })
            .chain(
                decisions
                    .pause_ad_groups
                    .iter()
                    .map(|ad_group_id| Mutation::PauseAdGroup {
                        ad_group_id: ad_group_id.clone(),
                    }),
            )
            .collect();

        match &decisions.bid_action {
            Some(BidAction::RaiseKeywordBids { percentage }) => {
                for ad_group_id in &decisions.winning_ad_groups {
                    let keywords = degrade_to_empty(
                        "keyword bids",
                        self.platform.keyword_bids(ad_group_id),
                    );
                    mutations.extend(keywords.into_iter().filter_map(|keyword| {
                        let bid = keyword.cpc_bid_micros.filter(|bid| *bid > 0)?;
                        Some(Mutation::SetKeywordBid {
                            resource_name: keyword.resource_name,
                            cpc_bid_micros: raised_bid(bid, *percentage),
                        })
                    }));
                }
            }
            Some(BidAction::RaiseBidCap {
                new_limit_micros, ..
            }) => mutations.push(Mutation::SetCampaignBidCap {
                campaign_id: campaign_id.to_string(),
                cpc_bid_limit_micros: *new_limit_micros,
            }),
            Some(BidAction::Skip { .. }) | None => {}
        }
        mutations
    }
}

fn degrade_to_empty<T>(what: &str, result: Result<Vec<T>, PlatformError>) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(error = %err, "{what} read failed, treating as empty");
        Vec::new()
    })
}

fn log_skip(action: &BidAction, settings: &CampaignSettings) {
    let BidAction::Skip { reason } = action else {
        return;
    };
    match reason {
        BidSkipReason::NoBidCap => warn!(
            campaign_id = %settings.campaign_id,
            "maximize clicks campaign has no bid cap, skipping bid raise"
        ),
        BidSkipReason::Automated => debug!(
            campaign_id = %settings.campaign_id,
            strategy = ?settings.bidding_strategy,
            "automated bidding, skipping bid raise"
        ),
        BidSkipReason::Unhandled => warn!(
            campaign_id = %settings.campaign_id,
            strategy = ?settings.bidding_strategy,
            "unhandled bidding strategy, skipping bid raise"
        ),
    }
}
