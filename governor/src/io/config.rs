//! Governor configuration stored under `.governor/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::performance::GateRules;
use crate::core::scaling::BudgetGuardrails;
use crate::core::types::{Milestone, units_to_micros};

/// Governor configuration (TOML).
///
/// Edited by humans and read on every cycle. Missing fields default to the
/// standard 60-day / 20k promotion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GovernorConfig {
    /// Advertising account the ledger belongs to.
    pub customer_id: String,

    /// Campaign whose budget and bids are governed.
    pub campaign_id: String,

    /// First day of the promotional period.
    pub start_date: Option<NaiveDate>,

    /// Average customer lifetime value, in whole currency units.
    pub avg_ltv: f64,

    /// Override for the ledger location. Relative paths resolve against the
    /// project root.
    pub ledger_path: Option<PathBuf>,

    pub pacing: PacingConfig,
    pub budget: BudgetGuardrails,
    pub gate: GateRules,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PacingConfig {
    pub target_spend_micros: u64,
    pub total_days: u32,
    pub milestones: Vec<Milestone>,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            target_spend_micros: units_to_micros(20_000),
            total_days: 60,
            milestones: vec![
                Milestone::new("5k", units_to_micros(5_000)),
                Milestone::new("10k", units_to_micros(10_000)),
                Milestone::new("15k", units_to_micros(15_000)),
                Milestone::new("20k", units_to_micros(20_000)),
            ],
        }
    }
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            customer_id: "default".to_string(),
            campaign_id: String::new(),
            start_date: None,
            avg_ltv: 0.0,
            ledger_path: None,
            pacing: PacingConfig::default(),
            budget: BudgetGuardrails::default(),
            gate: GateRules::default(),
        }
    }
}

impl GovernorConfig {
    pub fn validate(&self) -> Result<()> {
        if self.customer_id.trim().is_empty() {
            return Err(anyhow!("customer_id must be non-empty"));
        }
        if self.pacing.total_days == 0 {
            return Err(anyhow!("pacing.total_days must be > 0"));
        }
        if let Some(label) = duplicate_label(&self.pacing.milestones) {
            return Err(anyhow!("pacing.milestones has duplicate label '{label}'"));
        }
        if !(self.budget.max_daily_change_percent >= 0.0
            && self.budget.max_daily_change_percent <= 1.0)
        {
            return Err(anyhow!("budget.max_daily_change_percent must be within 0..=1"));
        }
        if !(self.avg_ltv >= 0.0 && self.avg_ltv.is_finite()) {
            return Err(anyhow!("avg_ltv must be a finite non-negative number"));
        }
        if !(self.gate.ctr_threshold >= 0.0 && self.gate.ctr_threshold <= 1.0) {
            return Err(anyhow!("gate.ctr_threshold must be within 0..=1"));
        }
        if !(self.gate.bid_increase_percent >= 0.0 && self.gate.bid_increase_percent.is_finite()) {
            return Err(anyhow!("gate.bid_increase_percent must be >= 0"));
        }
        Ok(())
    }

    /// Ledger file for this account under `root`.
    pub fn resolved_ledger_path(&self, root: &Path) -> PathBuf {
        match &self.ledger_path {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => root.join(path),
            None => root
                .join(".governor")
                .join("ledger")
                .join(format!("{}.json", self.customer_id)),
        }
    }
}

fn duplicate_label(milestones: &[Milestone]) -> Option<&str> {
    milestones.iter().enumerate().find_map(|(index, milestone)| {
        milestones[..index]
            .iter()
            .any(|earlier| earlier.label == milestone.label)
            .then_some(milestone.label.as_str())
    })
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `GovernorConfig::default()`.
pub fn load_config(path: &Path) -> Result<GovernorConfig> {
    if !path.exists() {
        let cfg = GovernorConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: GovernorConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &GovernorConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
