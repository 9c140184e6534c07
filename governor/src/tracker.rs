//! Spend pacing tracker: platform cost reads recorded into the shadow ledger.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::core::pacing;
use crate::core::types::{DailySpendRecord, PacingStatus};
use crate::io::config::PacingConfig;
use crate::io::ledger::SpendLedger;
use crate::io::platform::AdsPlatform;

/// Where a cumulative spend figure came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum SpendSource {
    Fresh,
    /// The platform read failed; the total is a zero placeholder and the
    /// ledger was left untouched.
    Degraded { reason: String },
}

/// Result of one spend read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpendObservation {
    pub total_micros: u64,
    /// Latest ledger record dated before today, captured before the write.
    pub previous: Option<DailySpendRecord>,
    #[serde(flatten)]
    pub source: SpendSource,
}

impl SpendObservation {
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, SpendSource::Degraded { .. })
    }
}

pub struct SpendPacingTracker<'a, P: AdsPlatform + ?Sized> {
    platform: &'a P,
    ledger: SpendLedger,
    pacing: &'a PacingConfig,
}

impl<'a, P: AdsPlatform + ?Sized> SpendPacingTracker<'a, P> {
    pub fn new(platform: &'a P, ledger: SpendLedger, pacing: &'a PacingConfig) -> Self {
        Self {
            platform,
            ledger,
            pacing,
        }
    }

    pub fn ledger(&self) -> &SpendLedger {
        &self.ledger
    }

    /// Sum platform cost for `start_date..=today` and record it as today's snapshot.
    ///
    /// A failed platform read yields a degraded zero total and skips the
    /// ledger write. Ledger write failures are returned.
    #[instrument(skip_all, fields(start = %start_date, today = %today))]
    pub fn record_and_total_spend(
        &mut self,
        start_date: NaiveDate,
        today: NaiveDate,
    ) -> Result<SpendObservation> {
        let previous = self.ledger.latest_before(today).cloned();

        let costs = match self.platform.daily_costs(start_date, today) {
            Ok(costs) => costs,
            Err(err) => {
                warn!(error = %err, "spend read failed, treating spend as zero");
                return Ok(SpendObservation {
                    total_micros: 0,
                    previous,
                    source: SpendSource::Degraded {
                        reason: err.to_string(),
                    },
                });
            }
        };

        let total_micros: u64 = costs.iter().map(|cost| cost.cost_micros).sum();
        debug!(days = costs.len(), total_micros, "spend read");

        self.ledger
            .upsert(DailySpendRecord {
                date: today,
                spend_micros: total_micros,
            })
            .with_context(|| format!("record spend for {today}"))?;

        Ok(SpendObservation {
            total_micros,
            previous,
            source: SpendSource::Fresh,
        })
    }

    pub fn pacing_status(&self, current_spend: u64, days_elapsed: u32) -> PacingStatus {
        pacing::pacing_status(
            current_spend,
            self.pacing.target_spend_micros,
            days_elapsed,
            self.pacing.total_days,
        )
    }

    /// Configured milestones crossed since `previous`, each logged once.
    pub fn crossed_milestones(
        &self,
        previous: Option<&DailySpendRecord>,
        current_spend: u64,
    ) -> Vec<String> {
        let crossed = pacing::crossed_milestones(previous, current_spend, &self.pacing.milestones);
        for label in &crossed {
            info!(milestone = %label, spend_micros = current_spend, "spend milestone crossed");
        }
        crossed
    }
}
