//! Initialization helpers for `.governor/` scaffolding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDate;

use super::config::{GovernorConfig, write_config};

/// Canonical paths within `.governor/` for a project root.
#[derive(Debug, Clone)]
pub struct GovernorPaths {
    pub root: PathBuf,
    pub governor_dir: PathBuf,
    pub config_path: PathBuf,
    pub ledger_dir: PathBuf,
    pub journal_dir: PathBuf,
    pub gitignore_path: PathBuf,
}

impl GovernorPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let governor_dir = root.join(".governor");
        Self {
            root: root.clone(),
            governor_dir: governor_dir.clone(),
            config_path: governor_dir.join("config.toml"),
            ledger_dir: governor_dir.join("ledger"),
            journal_dir: governor_dir.join("journal"),
            gitignore_path: governor_dir.join(".gitignore"),
        }
    }
}

/// Options for `init_governor`.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// If true, overwrite an existing config.
    pub force: bool,
    /// Promotion start written into the fresh config.
    pub start_date: NaiveDate,
}

/// Create `.governor/` scaffolding in `root`.
///
/// Fails if `.governor/` already exists unless `options.force` is set. The
/// ledger directory is never cleared.
pub fn init_governor(root: &Path, options: &InitOptions) -> Result<GovernorPaths> {
    let paths = GovernorPaths::new(root);
    if paths.governor_dir.exists() && !options.force {
        return Err(anyhow!(
            "governor init: .governor already exists (use --force to overwrite)"
        ));
    }
    if paths.governor_dir.exists() && !paths.governor_dir.is_dir() {
        return Err(anyhow!(
            "governor init: .governor exists but is not a directory"
        ));
    }

    create_dir(&paths.governor_dir)?;
    create_dir(&paths.ledger_dir)?;
    create_dir(&paths.journal_dir)?;

    fs::write(&paths.gitignore_path, GOVERNOR_GITIGNORE)
        .with_context(|| format!("write file {}", paths.gitignore_path.display()))?;
    let config = GovernorConfig {
        start_date: Some(options.start_date),
        ..GovernorConfig::default()
    };
    write_config(&paths.config_path, &config)?;

    Ok(paths)
}

fn create_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path).with_context(|| format!("create directory {}", path.display()))
}

const GOVERNOR_GITIGNORE: &str = "journal/\n";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::DailySpendRecord;
    use crate::io::config::load_config;
    use crate::io::ledger::SpendLedger;

    fn options(force: bool) -> InitOptions {
        InitOptions {
            force,
            start_date: NaiveDate::from_ymd_opt(2026, 10, 1).expect("date"),
        }
    }

    #[test]
    fn init_creates_expected_layout() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_governor(temp.path(), &options(false)).expect("init");

        assert!(paths.governor_dir.is_dir());
        assert!(paths.ledger_dir.is_dir());
        assert!(paths.journal_dir.is_dir());
        assert_eq!(
            fs::read_to_string(&paths.gitignore_path).expect("read"),
            GOVERNOR_GITIGNORE
        );

        let cfg = load_config(&paths.config_path).expect("load config");
        assert_eq!(cfg.start_date, Some(options(false).start_date));
    }

    #[test]
    fn init_without_force_refuses_existing_dir() {
        let temp = tempfile::tempdir().expect("tempdir");
        init_governor(temp.path(), &options(false)).expect("init");
        let err = init_governor(temp.path(), &options(false)).unwrap_err();
        assert!(err.to_string().contains("already exists"));
    }

    /// Re-init with force rewrites the config but keeps ledger history.
    #[test]
    fn init_with_force_keeps_ledger() {
        let temp = tempfile::tempdir().expect("tempdir");
        let paths = init_governor(temp.path(), &options(false)).expect("init");

        let cfg = load_config(&paths.config_path).expect("load");
        let ledger_path = cfg.resolved_ledger_path(temp.path());
        let record = DailySpendRecord {
            date: options(false).start_date,
            spend_micros: 42,
        };
        SpendLedger::load(&ledger_path)
            .upsert(record.clone())
            .expect("upsert");

        init_governor(temp.path(), &options(true)).expect("re-init");
        assert_eq!(SpendLedger::load(&ledger_path).records(), [record]);
    }
}
