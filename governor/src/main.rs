//! Spend governor CLI.
//!
//! Runs one governance cycle per invocation against an account, keeping the
//! shadow spend ledger under `.governor/`. Meant to be driven by an external
//! scheduler once a day.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};

use governor::core::daily_budget::{MINIMUM_TOTAL_BUDGET, initial_daily_budget};
use governor::core::types::MICROS_PER_UNIT;
use governor::cycle::{BudgetStep, CycleOptions, CycleReport, run_cycle};
use governor::exit_codes;
use governor::io::config::load_config;
use governor::io::init::{GovernorPaths, InitOptions, init_governor};
use governor::io::ledger::SpendLedger;
use governor::io::snapshot::SnapshotPlatform;
use governor::logging;
use governor::mutation::MutationError;

#[derive(Parser)]
#[command(
    name = "governor",
    version,
    about = "Autonomous spend governance for a single ad account"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create `.governor/` with a default config.
    Init {
        /// Overwrite an existing config. Ledger history is kept.
        #[arg(short, long)]
        force: bool,
        /// First day of the promotion (defaults to today).
        #[arg(long, value_name = "YYYY-MM-DD")]
        start_date: Option<NaiveDate>,
    },
    /// Run one governance cycle against an account snapshot.
    Cycle {
        /// JSON account snapshot to read from.
        #[arg(long, value_name = "FILE")]
        snapshot: PathBuf,
        /// Cycle date (defaults to today).
        #[arg(long, value_name = "YYYY-MM-DD")]
        today: Option<NaiveDate>,
        /// Plan mutations without issuing them.
        #[arg(long)]
        dry_run: bool,
        /// Print the cycle report as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the shadow spend ledger.
    Ledger {
        #[arg(long)]
        json: bool,
    },
    /// Compute the starting daily budget for a promotion.
    DailyBudget {
        /// Total promotional budget, in whole currency units.
        #[arg(long)]
        total: u64,
        /// Promotion length in days.
        #[arg(long)]
        days: u32,
        /// Smallest total budget accepted.
        #[arg(long, default_value_t = MINIMUM_TOTAL_BUDGET)]
        minimum: u64,
    },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            error_exit_code(&err)
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    let root = std::env::current_dir().context("resolve current directory")?;
    match cli.command {
        Command::Init { force, start_date } => cmd_init(&root, force, start_date),
        Command::Cycle {
            snapshot,
            today,
            dry_run,
            json,
        } => cmd_cycle(&root, &snapshot, today, dry_run, json),
        Command::Ledger { json } => cmd_ledger(&root, json),
        Command::DailyBudget {
            total,
            days,
            minimum,
        } => cmd_daily_budget(total, days, minimum),
    }
}

fn error_exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<MutationError>() {
        Some(MutationError::PolicyViolationPersisted { .. }) => exit_codes::POLICY_REJECTED,
        _ => exit_codes::INVALID,
    }
}

fn cmd_init(root: &Path, force: bool, start_date: Option<NaiveDate>) -> Result<i32> {
    let options = InitOptions {
        force,
        start_date: start_date.unwrap_or_else(today),
    };
    let paths = init_governor(root, &options)?;
    println!("initialized {}", paths.governor_dir.display());
    Ok(exit_codes::OK)
}

fn cmd_cycle(
    root: &Path,
    snapshot: &Path,
    date: Option<NaiveDate>,
    dry_run: bool,
    json: bool,
) -> Result<i32> {
    let paths = GovernorPaths::new(root);
    let config = load_config(&paths.config_path)?;
    let journal = paths.journal_dir.join("mutations.jsonl");
    let platform = SnapshotPlatform::load(snapshot, Some(journal))?;
    let ledger = SpendLedger::load(config.resolved_ledger_path(root));

    let report = run_cycle(
        &platform,
        &config,
        ledger,
        date.unwrap_or_else(today),
        CycleOptions { dry_run },
    )?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize cycle report")?
        );
    } else {
        print_report(&report);
    }

    if report.is_degraded() {
        return Ok(exit_codes::DEGRADED);
    }
    Ok(exit_codes::OK)
}

fn cmd_ledger(root: &Path, json: bool) -> Result<i32> {
    let paths = GovernorPaths::new(root);
    let config = load_config(&paths.config_path)?;
    let ledger = SpendLedger::load(config.resolved_ledger_path(root));
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(ledger.records()).context("serialize ledger")?
        );
        return Ok(exit_codes::OK);
    }
    for record in ledger.records() {
        println!("{}  {}", record.date, units(record.spend_micros));
    }
    Ok(exit_codes::OK)
}

fn cmd_daily_budget(total: u64, days: u32, minimum: u64) -> Result<i32> {
    let daily_micros = initial_daily_budget(total, days, minimum)?;
    println!("{} per day ({daily_micros} micros)", units(daily_micros));
    Ok(exit_codes::OK)
}

fn print_report(report: &CycleReport) {
    println!("date: {} (day {})", report.date, report.days_elapsed);
    let source = if report.spend.is_degraded() {
        "degraded"
    } else {
        "fresh"
    };
    println!("spend: {} ({source})", units(report.spend.total_micros));
    println!("pacing: {:?}", report.pacing);
    if !report.milestones.is_empty() {
        println!("milestones: {}", report.milestones.join(", "));
    }
    match &report.budget {
        BudgetStep::Decided(decision) => println!(
            "budget: {} -> {} ({:?}, ratio {:.2}, {} conversions)",
            units(decision.current_daily_budget_micros),
            units(decision.next_daily_budget_micros),
            decision.tier,
            decision.ltv_cac_ratio,
            decision.conversions
        ),
        BudgetStep::Skipped { reason } => println!("budget: unchanged ({reason})"),
    }
    println!("planned: {}", report.planned.len());
    for mutation in &report.planned {
        println!("  - {mutation}");
    }
    if report.dry_run {
        println!("applied: none (dry run)");
    } else {
        println!("applied: {}", report.applied.len());
    }
}

fn units(micros: u64) -> String {
    format!("{:.2}", micros as f64 / MICROS_PER_UNIT as f64)
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use governor::io::platform::PlatformError;

    #[test]
    fn parse_init() {
        let cli = Cli::parse_from(["governor", "init"]);
        assert!(matches!(
            cli.command,
            Command::Init {
                force: false,
                start_date: None
            }
        ));
    }

    #[test]
    fn parse_init_with_start_date() {
        let cli = Cli::parse_from(["governor", "init", "--force", "--start-date", "2026-10-01"]);
        assert!(matches!(
            cli.command,
            Command::Init {
                force: true,
                start_date: Some(date)
            } if date == NaiveDate::from_ymd_opt(2026, 10, 1).expect("date")
        ));
    }

    #[test]
    fn parse_cycle_flags() {
        let cli = Cli::parse_from([
            "governor",
            "cycle",
            "--snapshot",
            "account.json",
            "--today",
            "2026-10-15",
            "--dry-run",
        ]);
        match cli.command {
            Command::Cycle {
                snapshot,
                today,
                dry_run,
                json,
            } => {
                assert_eq!(snapshot, PathBuf::from("account.json"));
                assert_eq!(today, NaiveDate::from_ymd_opt(2026, 10, 15));
                assert!(dry_run);
                assert!(!json);
            }
            _ => panic!("expected cycle command"),
        }
    }

    #[test]
    fn cycle_requires_snapshot() {
        assert!(Cli::try_parse_from(["governor", "cycle"]).is_err());
    }

    #[test]
    fn parse_daily_budget_defaults_minimum() {
        let cli = Cli::parse_from(["governor", "daily-budget", "--total", "20000", "--days", "60"]);
        assert!(matches!(
            cli.command,
            Command::DailyBudget {
                total: 20_000,
                days: 60,
                minimum: MINIMUM_TOTAL_BUDGET
            }
        ));
    }

    #[test]
    fn policy_persisted_maps_to_policy_exit_code() {
        let err = anyhow::Error::new(MutationError::PolicyViolationPersisted {
            mutation: governor::io::platform::Mutation::PauseAd {
                resource_name: "ads/1".to_string(),
            },
            topics: vec!["TRADEMARKS".to_string()],
            source: PlatformError::PolicyFinding {
                message: "trademark".to_string(),
                topics: vec!["TRADEMARKS".to_string()],
            },
        })
        .context("apply mutation: pause ad ads/1");
        assert_eq!(error_exit_code(&err), exit_codes::POLICY_REJECTED);

        let other = anyhow::Error::new(MutationError::Platform(PlatformError::Rejected(
            "quota".to_string(),
        )));
        assert_eq!(error_exit_code(&other), exit_codes::INVALID);
    }

    #[test]
    fn units_formats_two_decimals() {
        assert_eq!(units(1_234_567), "1.23");
        assert_eq!(units(0), "0.00");
    }
}
