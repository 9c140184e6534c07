//! One governance cycle: spend, pacing, budget, gate, then writes.
//!
//! The cycle is externally triggered (once a day) and runs to completion
//! before returning its [`CycleReport`]. All platform writes go through the
//! [`MutationRetryGovernor`]; the first write that still fails aborts the cycle
//! and later writes are not attempted.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::core::scaling::{ltv_cac_ratio, next_daily_budget};
use crate::core::types::{CampaignSettings, PacingStatus, ScalingTier};
use crate::gate::{GateDecisions, PerformanceGate};
use crate::io::config::GovernorConfig;
use crate::io::ledger::SpendLedger;
use crate::io::platform::{AdsPlatform, Mutation, MutationOutcome};
use crate::mutation::MutationRetryGovernor;
use crate::tracker::{SpendObservation, SpendPacingTracker};

#[derive(Debug, Clone, Copy, Default)]
pub struct CycleOptions {
    /// Plan writes without issuing them. The spend ledger is still updated.
    pub dry_run: bool,
}

/// Budget scaling inputs and result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetDecision {
    pub conversions: u64,
    /// Serialized as `null` when infinite.
    pub ltv_cac_ratio: f64,
    pub tier: ScalingTier,
    pub current_daily_budget_micros: u64,
    pub next_daily_budget_micros: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BudgetStep {
    Decided(BudgetDecision),
    /// An input read failed, so the budget was left as is.
    Skipped { reason: String },
}

/// Everything one cycle observed, decided and did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub date: NaiveDate,
    pub days_elapsed: u32,
    pub spend: SpendObservation,
    pub pacing: PacingStatus,
    pub milestones: Vec<String>,
    pub budget: BudgetStep,
    pub gate: GateDecisions,
    pub planned: Vec<Mutation>,
    pub applied: Vec<MutationOutcome>,
    pub dry_run: bool,
}

impl CycleReport {
    /// True when a failed read forced a fallback during the cycle.
    pub fn is_degraded(&self) -> bool {
        self.spend.is_degraded() || matches!(self.budget, BudgetStep::Skipped { .. })
    }
}

/// Run one governance cycle for `today`.
#[instrument(skip_all, fields(today = %today, dry_run = options.dry_run))]
pub fn run_cycle<P: AdsPlatform + ?Sized>(
    platform: &P,
    config: &GovernorConfig,
    ledger: SpendLedger,
    today: NaiveDate,
    options: CycleOptions,
) -> Result<CycleReport> {
    let start_date = config
        .start_date
        .context("start_date is not configured (run `governor init` or set it in config.toml)")?;
    let days_elapsed = days_between(start_date, today);

    let mut tracker = SpendPacingTracker::new(platform, ledger, &config.pacing);
    let spend = tracker.record_and_total_spend(start_date, today)?;
    let pacing = tracker.pacing_status(spend.total_micros, days_elapsed);
    let milestones = tracker.crossed_milestones(spend.previous.as_ref(), spend.total_micros);
    info!(
        spend_micros = spend.total_micros,
        days_elapsed,
        pacing = ?pacing,
        "spend pacing"
    );

    let settings = match platform.campaign_settings(&config.campaign_id) {
        Ok(settings) => Some(settings),
        Err(err) => {
            warn!(error = %err, "campaign settings read failed, skipping budget and bid changes");
            None
        }
    };

    let budget = budget_step(platform, config, &spend, settings.as_ref());
    let mut planned = Vec::new();
    if let BudgetStep::Decided(decision) = &budget
        && decision.next_daily_budget_micros != decision.current_daily_budget_micros
    {
        planned.push(Mutation::SetDailyBudget {
            campaign_id: config.campaign_id.clone(),
            amount_micros: decision.next_daily_budget_micros,
        });
    }

    let gate = PerformanceGate::new(platform, &config.gate);
    let decisions = gate.evaluate(&config.campaign_id, settings.as_ref());
    planned.extend(gate.mutations(&config.campaign_id, &decisions));

    let mut applied = Vec::new();
    if options.dry_run {
        info!(planned = planned.len(), "dry run, no mutations issued");
    } else {
        let governor = MutationRetryGovernor::new(platform);
        for mutation in &planned {
            let outcome = governor
                .execute(mutation.clone())
                .with_context(|| format!("apply mutation: {mutation}"))?;
            applied.push(outcome);
        }
        info!(applied = applied.len(), "mutations applied");
    }

    Ok(CycleReport {
        date: today,
        days_elapsed,
        spend,
        pacing,
        milestones,
        budget,
        gate: decisions,
        planned,
        applied,
        dry_run: options.dry_run,
    })
}

fn budget_step<P: AdsPlatform + ?Sized>(
    platform: &P,
    config: &GovernorConfig,
    spend: &SpendObservation,
    settings: Option<&CampaignSettings>,
) -> BudgetStep {
    if spend.is_degraded() {
        return skipped("spend read degraded");
    }
    let Some(settings) = settings else {
        return skipped("campaign settings unavailable");
    };
    let ad_groups = match platform.ad_group_performance(&config.campaign_id) {
        Ok(ad_groups) => ad_groups,
        Err(err) => {
            warn!(error = %err, "conversion read failed, leaving daily budget unchanged");
            return skipped("conversion read failed");
        }
    };

    let conversions = ad_groups
        .iter()
        .map(|record| record.conversions)
        .sum::<f64>()
        .floor() as u64;
    let ratio = ltv_cac_ratio(conversions, spend.total_micros, config.avg_ltv);
    let tier = ScalingTier::from_ratio(ratio);
    let current = settings.daily_budget_micros;
    let next = next_daily_budget(current, ratio, &config.budget);
    info!(
        conversions,
        ratio,
        tier = ?tier,
        current_micros = current,
        next_micros = next,
        "daily budget decided"
    );
    BudgetStep::Decided(BudgetDecision {
        conversions,
        ltv_cac_ratio: ratio,
        tier,
        current_daily_budget_micros: current,
        next_daily_budget_micros: next,
    })
}

fn skipped(reason: &str) -> BudgetStep {
    BudgetStep::Skipped {
        reason: reason.to_string(),
    }
}

/// Whole days from `start` to `today`, zero before the start.
fn days_between(start: NaiveDate, today: NaiveDate) -> u32 {
    u32::try_from((today - start).num_days().max(0)).unwrap_or(u32::MAX)
}
