//! Offline platform backed by an account snapshot file.
//!
//! Reads are served from a JSON export of the account; accepted writes are
//! appended to a JSONL journal (one [`RetryableOperation`] per line) instead of
//! reaching a live account. Policy rejections can be scripted per resource so
//! a rehearsal exercises the exemption retry path.

use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::types::{CampaignSettings, KeywordBid, PerformanceRecord};
use crate::io::platform::{
    AdsPlatform, DailyCost, MutationOutcome, Mutator, PlatformError, PolicyExemption,
    RetryableOperation,
};

/// JSON export of one account.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountSnapshot {
    pub daily_costs: Vec<DailyCost>,
    pub ads: Vec<PerformanceRecord>,
    pub ad_groups: Vec<PerformanceRecord>,
    pub campaigns: Vec<CampaignSettings>,
    /// Enabled keywords keyed by ad group id.
    pub keywords: BTreeMap<String, Vec<KeywordBid>>,
    pub policy_rejections: Vec<ScriptedRejection>,
}

/// Writes to `target` fail with these topics unless all of them are exempted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptedRejection {
    pub target: String,
    pub topics: Vec<String>,
}

pub struct SnapshotPlatform {
    snapshot: AccountSnapshot,
    journal_path: Option<PathBuf>,
}

impl SnapshotPlatform {
    pub fn new(snapshot: AccountSnapshot, journal_path: Option<PathBuf>) -> Self {
        Self {
            snapshot,
            journal_path,
        }
    }

    pub fn load(snapshot_path: &Path, journal_path: Option<PathBuf>) -> Result<Self> {
        let contents = fs::read_to_string(snapshot_path)
            .with_context(|| format!("read snapshot {}", snapshot_path.display()))?;
        let snapshot: AccountSnapshot = serde_json::from_str(&contents)
            .with_context(|| format!("parse snapshot {}", snapshot_path.display()))?;
        debug!(
            path = %snapshot_path.display(),
            days = snapshot.daily_costs.len(),
            ads = snapshot.ads.len(),
            ad_groups = snapshot.ad_groups.len(),
            "account snapshot loaded"
        );
        Ok(Self::new(snapshot, journal_path))
    }

    fn append_journal(&self, operation: &RetryableOperation) -> Result<()> {
        let Some(path) = &self.journal_path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create journal dir {}", parent.display()))?;
        }
        let mut line = serde_json::to_string(operation)?;
        line.push('\n');
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open journal {}", path.display()))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("append journal {}", path.display()))
    }
}

fn exempts_all(exemption: Option<&PolicyExemption>, topics: &[String]) -> bool {
    exemption.is_some_and(|exemption| {
        topics
            .iter()
            .all(|topic| exemption.ignorable_policy_topics.contains(topic))
    })
}

impl Mutator for SnapshotPlatform {
    fn execute(&self, operation: &RetryableOperation) -> Result<MutationOutcome, PlatformError> {
        let target = operation.mutation.target();
        if let Some(rejection) = self
            .snapshot
            .policy_rejections
            .iter()
            .find(|rejection| rejection.target == target)
            && !exempts_all(operation.exemption.as_ref(), &rejection.topics)
        {
            return Err(PlatformError::PolicyFinding {
                message: format!("{} violates policy", operation.mutation),
                topics: rejection.topics.clone(),
            });
        }

        self.append_journal(operation)
            .map_err(|err| PlatformError::Unavailable(format!("{err:#}")))?;
        Ok(MutationOutcome {
            resource_name: target.to_string(),
        })
    }
}

impl AdsPlatform for SnapshotPlatform {
    fn daily_costs(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyCost>, PlatformError> {
        Ok(self
            .snapshot
            .daily_costs
            .iter()
            .filter(|cost| cost.date >= start && cost.date <= end)
            .cloned()
            .collect())
    }

    fn ad_performance(&self, _campaign_id: &str) -> Result<Vec<PerformanceRecord>, PlatformError> {
        Ok(self.snapshot.ads.clone())
    }

    fn ad_group_performance(
        &self,
        _campaign_id: &str,
    ) -> Result<Vec<PerformanceRecord>, PlatformError> {
        Ok(self.snapshot.ad_groups.clone())
    }

    fn campaign_settings(&self, campaign_id: &str) -> Result<CampaignSettings, PlatformError> {
        self.snapshot
            .campaigns
            .iter()
            .find(|campaign| campaign.campaign_id == campaign_id)
            .cloned()
            .ok_or_else(|| PlatformError::Rejected(format!("campaign {campaign_id} not found")))
    }

    fn keyword_bids(&self, ad_group_id: &str) -> Result<Vec<KeywordBid>, PlatformError> {
        Ok(self
            .snapshot
            .keywords
            .get(ad_group_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::platform::Mutation;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).expect("date")
    }

    fn pause(resource: &str) -> RetryableOperation {
        RetryableOperation::new(Mutation::PauseAd {
            resource_name: resource.to_string(),
        })
    }

    #[test]
    fn daily_costs_are_filtered_to_range() {
        let snapshot = AccountSnapshot {
            daily_costs: (1..=5)
                .map(|d| DailyCost {
                    date: day(d),
                    cost_micros: u64::from(d),
                })
                .collect(),
            ..AccountSnapshot::default()
        };
        let platform = SnapshotPlatform::new(snapshot, None);
        let costs = platform.daily_costs(day(2), day(4)).expect("costs");
        let dates: Vec<NaiveDate> = costs.iter().map(|cost| cost.date).collect();
        assert_eq!(dates, vec![day(2), day(3), day(4)]);
    }

    #[test]
    fn scripted_rejection_clears_once_topics_are_exempted() {
        let snapshot = AccountSnapshot {
            policy_rejections: vec![ScriptedRejection {
                target: "ads/1".to_string(),
                topics: vec!["HEALTH_CLAIMS".to_string()],
            }],
            ..AccountSnapshot::default()
        };
        let platform = SnapshotPlatform::new(snapshot, None);

        let err = platform.execute(&pause("ads/1")).unwrap_err();
        assert_eq!(err.policy_topics(), ["HEALTH_CLAIMS"]);

        let exempted = pause("ads/1").with_exemption(PolicyExemption {
            ignorable_policy_topics: vec!["HEALTH_CLAIMS".to_string()],
        });
        assert!(platform.execute(&exempted).is_ok());
        assert!(platform.execute(&pause("ads/2")).is_ok());
    }

    #[test]
    fn accepted_writes_are_journaled() {
        let temp = tempfile::tempdir().expect("tempdir");
        let journal = temp.path().join("journal").join("mutations.jsonl");
        let platform = SnapshotPlatform::new(AccountSnapshot::default(), Some(journal.clone()));

        platform.execute(&pause("ads/1")).expect("first");
        platform.execute(&pause("ads/2")).expect("second");

        let contents = fs::read_to_string(&journal).expect("read journal");
        let entries: Vec<RetryableOperation> = contents
            .lines()
            .map(|line| serde_json::from_str(line).expect("parse entry"))
            .collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1], pause("ads/2"));
    }

    #[test]
    fn unknown_campaign_is_rejected() {
        let platform = SnapshotPlatform::new(AccountSnapshot::default(), None);
        let err = platform.campaign_settings("7").unwrap_err();
        assert_eq!(err, PlatformError::Rejected("campaign 7 not found".to_string()));
    }
}
