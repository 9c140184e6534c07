//! Shadow spend ledger (`.governor/ledger/<customer>.json`).
//!
//! One cumulative spend snapshot per calendar day, kept independently of the
//! platform's own reporting. Reads never fail: a missing or corrupt file is an
//! empty ledger and the next successful write replaces it.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::core::types::DailySpendRecord;

#[derive(Debug, Clone)]
pub struct SpendLedger {
    path: PathBuf,
    records: Vec<DailySpendRecord>,
}

impl SpendLedger {
    /// Load the ledger at `path`, treating unreadable contents as empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = read_records(&path);
        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All records, ascending by date, at most one per date.
    pub fn records(&self) -> &[DailySpendRecord] {
        &self.records
    }

    /// Latest record dated strictly before `date`.
    pub fn latest_before(&self, date: NaiveDate) -> Option<&DailySpendRecord> {
        self.records.iter().rev().find(|record| record.date < date)
    }

    /// Insert or replace the record for `record.date` and rewrite the file.
    pub fn upsert(&mut self, record: DailySpendRecord) -> Result<()> {
        let mut records = read_records(&self.path);
        match records.binary_search_by_key(&record.date, |existing| existing.date) {
            Ok(index) => records[index] = record,
            Err(index) => records.insert(index, record),
        }
        write_records(&self.path, &records)?;
        self.records = records;
        Ok(())
    }
}

fn read_records(path: &Path) -> Vec<DailySpendRecord> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) => {
            if path.exists() {
                warn!(path = %path.display(), error = %err, "unreadable spend ledger, using empty ledger");
            } else {
                debug!(path = %path.display(), "no spend ledger yet");
            }
            return Vec::new();
        }
    };
    let mut records: Vec<DailySpendRecord> = match serde_json::from_str(&contents) {
        Ok(records) => records,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "corrupt spend ledger, using empty ledger");
            return Vec::new();
        }
    };
    // Later entries win for duplicated dates.
    records.reverse();
    records.sort_by_key(|record| record.date);
    records.dedup_by_key(|record| record.date);
    debug!(path = %path.display(), records = records.len(), "spend ledger loaded");
    records
}

fn write_records(path: &Path, records: &[DailySpendRecord]) -> Result<()> {
    debug!(path = %path.display(), records = records.len(), "writing spend ledger");
    let mut buf = serde_json::to_string_pretty(records)?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("ledger path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp ledger {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace ledger {}", path.display()))?;
    Ok(())
}
