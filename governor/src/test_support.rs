//! Test-only helpers: a scripted platform and record fixtures.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::NaiveDate;

use crate::core::types::{
    BiddingStrategy, CampaignSettings, KeywordBid, PerformanceRecord, units_to_micros,
};
use crate::io::config::{GovernorConfig, write_config};
use crate::io::init::GovernorPaths;
use crate::io::platform::{
    AdsPlatform, DailyCost, MutationOutcome, Mutator, PlatformError, RetryableOperation,
};

/// Campaign id used by every fixture.
pub const CAMPAIGN_ID: &str = "1001";

/// Platform returning canned reads and scripted mutation results.
///
/// Mutations are recorded in call order. Once the scripted results run out,
/// every further mutation is accepted.
pub struct ScriptedPlatform {
    daily_costs: Result<Vec<DailyCost>, PlatformError>,
    ads: Result<Vec<PerformanceRecord>, PlatformError>,
    ad_groups: Result<Vec<PerformanceRecord>, PlatformError>,
    campaign: Result<CampaignSettings, PlatformError>,
    keywords: BTreeMap<String, Vec<KeywordBid>>,
    mutation_results: RefCell<VecDeque<Result<MutationOutcome, PlatformError>>>,
    calls: RefCell<Vec<RetryableOperation>>,
    cost_ranges: RefCell<Vec<(NaiveDate, NaiveDate)>>,
}

impl Default for ScriptedPlatform {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedPlatform {
    pub fn new() -> Self {
        Self {
            daily_costs: Ok(Vec::new()),
            ads: Ok(Vec::new()),
            ad_groups: Ok(Vec::new()),
            campaign: Ok(campaign(BiddingStrategy::ManualCpc, units_to_micros(100))),
            keywords: BTreeMap::new(),
            mutation_results: RefCell::new(VecDeque::new()),
            calls: RefCell::new(Vec::new()),
            cost_ranges: RefCell::new(Vec::new()),
        }
    }

    pub fn with_daily_costs(mut self, costs: Vec<DailyCost>) -> Self {
        self.daily_costs = Ok(costs);
        self
    }

    pub fn with_ads(mut self, ads: Vec<PerformanceRecord>) -> Self {
        self.ads = Ok(ads);
        self
    }

    pub fn with_ad_groups(mut self, ad_groups: Vec<PerformanceRecord>) -> Self {
        self.ad_groups = Ok(ad_groups);
        self
    }

    pub fn with_campaign(mut self, settings: CampaignSettings) -> Self {
        self.campaign = Ok(settings);
        self
    }

    pub fn with_keywords(mut self, ad_group_id: &str, keywords: Vec<KeywordBid>) -> Self {
        self.keywords.insert(ad_group_id.to_string(), keywords);
        self
    }

    /// Make every read fail with `err`.
    pub fn with_failing_reads(mut self, err: PlatformError) -> Self {
        self.daily_costs = Err(err.clone());
        self.ads = Err(err.clone());
        self.ad_groups = Err(err.clone());
        self.campaign = Err(err);
        self
    }

    pub fn with_failing_cost_read(mut self, err: PlatformError) -> Self {
        self.daily_costs = Err(err);
        self
    }

    pub fn with_mutation_results(
        self,
        results: Vec<Result<MutationOutcome, PlatformError>>,
    ) -> Self {
        self.mutation_results.borrow_mut().extend(results);
        self
    }

    /// Every operation passed to `execute`, in call order.
    pub fn mutation_calls(&self) -> Vec<RetryableOperation> {
        self.calls.borrow().clone()
    }

    /// Date ranges requested through `daily_costs`.
    pub fn cost_ranges(&self) -> Vec<(NaiveDate, NaiveDate)> {
        self.cost_ranges.borrow().clone()
    }
}

impl Mutator for ScriptedPlatform {
    fn execute(&self, operation: &RetryableOperation) -> Result<MutationOutcome, PlatformError> {
        self.calls.borrow_mut().push(operation.clone());
        self.mutation_results
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| {
                Ok(MutationOutcome {
                    resource_name: operation.mutation.target().to_string(),
                })
            })
    }
}

impl AdsPlatform for ScriptedPlatform {
    fn daily_costs(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyCost>, PlatformError> {
        self.cost_ranges.borrow_mut().push((start, end));
        self.daily_costs.clone()
    }

    fn ad_performance(&self, _campaign_id: &str) -> Result<Vec<PerformanceRecord>, PlatformError> {
        self.ads.clone()
    }

    fn ad_group_performance(
        &self,
        _campaign_id: &str,
    ) -> Result<Vec<PerformanceRecord>, PlatformError> {
        self.ad_groups.clone()
    }

    fn campaign_settings(&self, _campaign_id: &str) -> Result<CampaignSettings, PlatformError> {
        self.campaign.clone()
    }

    fn keyword_bids(&self, ad_group_id: &str) -> Result<Vec<KeywordBid>, PlatformError> {
        Ok(self.keywords.get(ad_group_id).cloned().unwrap_or_default())
    }
}

/// Deterministic date in October 2026.
pub fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, d).expect("valid fixture date")
}

pub fn cost(d: u32, cost_micros: u64) -> DailyCost {
    DailyCost {
        date: day(d),
        cost_micros,
    }
}

/// Ad record with the given reach and CTR.
pub fn ad(resource_name: &str, impressions: u64, ctr: f64) -> PerformanceRecord {
    PerformanceRecord {
        unit_id: resource_name.to_string(),
        cost_micros: 0,
        conversions: 0.0,
        clicks: (impressions as f64 * ctr).round() as u64,
        impressions,
        ctr,
        cost_per_conversion_micros: 0,
    }
}

/// Ad group record with the given spend, conversions and CPA.
pub fn ad_group(
    ad_group_id: &str,
    cost_micros: u64,
    conversions: f64,
    cost_per_conversion_micros: u64,
) -> PerformanceRecord {
    PerformanceRecord {
        unit_id: ad_group_id.to_string(),
        cost_micros,
        conversions,
        clicks: 0,
        impressions: 0,
        ctr: 0.0,
        cost_per_conversion_micros,
    }
}

pub fn campaign(strategy: BiddingStrategy, daily_budget_micros: u64) -> CampaignSettings {
    CampaignSettings {
        campaign_id: CAMPAIGN_ID.to_string(),
        bidding_strategy: strategy,
        target_cpa_micros: 0,
        cpc_bid_limit_micros: None,
        daily_budget_micros,
    }
}

pub fn keyword(resource_name: &str, cpc_bid_micros: Option<u64>) -> KeywordBid {
    KeywordBid {
        resource_name: resource_name.to_string(),
        cpc_bid_micros,
    }
}

pub fn policy_error(topics: &[&str]) -> PlatformError {
    PlatformError::PolicyFinding {
        message: "policy finding".to_string(),
        topics: topics.iter().map(|topic| (*topic).to_string()).collect(),
    }
}

/// Config for fixture campaign starting on `day(1)`.
pub fn test_config() -> GovernorConfig {
    GovernorConfig {
        customer_id: "test-account".to_string(),
        campaign_id: CAMPAIGN_ID.to_string(),
        start_date: Some(day(1)),
        avg_ltv: 200.0,
        ..GovernorConfig::default()
    }
}

/// Temporary project root with a written `.governor/config.toml`.
pub struct TestWorkspace {
    _temp: tempfile::TempDir,
    root: PathBuf,
}

impl TestWorkspace {
    pub fn new(config: &GovernorConfig) -> Result<Self> {
        let temp = tempfile::tempdir()?;
        let root = temp.path().to_path_buf();
        write_config(&GovernorPaths::new(&root).config_path, config)?;
        Ok(Self { _temp: temp, root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn paths(&self) -> GovernorPaths {
        GovernorPaths::new(&self.root)
    }
}
