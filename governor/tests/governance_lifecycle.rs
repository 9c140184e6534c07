//! Multi-day governance scenarios driven through `run_cycle`.
//!
//! Each day gets a fresh scripted platform (the account as it looks that day)
//! while the ledger persists on disk between cycles, the way a daily scheduler
//! would run the binary.

use governor::core::types::{BiddingStrategy, PacingStatus, units_to_micros};
use governor::cycle::{BudgetStep, CycleOptions, CycleReport, run_cycle};
use governor::io::config::GovernorConfig;
use governor::io::ledger::SpendLedger;
use governor::io::platform::{DailyCost, Mutation};
use governor::test_support::{
    ScriptedPlatform, TestWorkspace, ad_group, campaign, cost, day, test_config,
};

/// Spend of `per_day` units on each day from the 1st to `through`.
fn steady_costs(through: u32, per_day: u64) -> Vec<DailyCost> {
    (1..=through)
        .map(|d| cost(d, units_to_micros(per_day)))
        .collect()
}

fn run_day(
    workspace: &TestWorkspace,
    config: &GovernorConfig,
    platform: &ScriptedPlatform,
    today: u32,
) -> CycleReport {
    let ledger = SpendLedger::load(config.resolved_ledger_path(workspace.root()));
    run_cycle(platform, config, ledger, day(today), CycleOptions::default()).expect("cycle")
}

/// Milestones are reported on the day they are crossed and never again, even
/// when a day is re-run.
///
/// ```text
/// day 10: 4500 cumulative  -> none
/// day 11: 5500 cumulative  -> 5k
/// day 11: re-run           -> 5k (previous record is still day 10)
/// day 12: 10500 cumulative -> 10k
/// day 13: 11500 cumulative -> none
/// ```
#[test]
fn milestones_fire_once_across_days() {
    let config = test_config();
    let workspace = TestWorkspace::new(&config).expect("workspace");

    let mut seen = Vec::new();
    for (today, costs) in [
        (10, steady_costs(10, 450)),
        (11, steady_costs(11, 500)),
        (11, steady_costs(11, 500)),
        (12, {
            let mut costs = steady_costs(11, 500);
            costs.push(cost(12, units_to_micros(5_000)));
            costs
        }),
        (13, {
            let mut costs = steady_costs(11, 500);
            costs.push(cost(12, units_to_micros(5_000)));
            costs.push(cost(13, units_to_micros(1_000)));
            costs
        }),
    ] {
        let platform = ScriptedPlatform::new().with_daily_costs(costs);
        let report = run_day(&workspace, &config, &platform, today);
        seen.push((today, report.milestones));
    }

    assert_eq!(
        seen,
        vec![
            (10, vec![]),
            (11, vec!["5k".to_string()]),
            (11, vec!["5k".to_string()]),
            (12, vec!["10k".to_string()]),
            (13, vec![]),
        ]
    );

    let ledger = SpendLedger::load(config.resolved_ledger_path(workspace.root()));
    let dates: Vec<_> = ledger.records().iter().map(|record| record.date).collect();
    assert_eq!(dates, vec![day(10), day(11), day(12), day(13)]);
}

/// A strong ratio grows the budget by at most the daily change cap per cycle
/// and stops at the configured ceiling.
#[test]
fn budget_ramps_to_ceiling() {
    let mut config = test_config();
    config.budget.max_daily_budget_micros = units_to_micros(150);
    let workspace = TestWorkspace::new(&config).expect("workspace");

    let mut budget = units_to_micros(100);
    let mut history = Vec::new();
    for today in 2..=5 {
        // 100 conversions over 1000 units: CAC 10, ratio 20.
        let platform = ScriptedPlatform::new()
            .with_daily_costs(steady_costs(today, 1_000 / today as u64))
            .with_ad_groups(vec![ad_group(
                "all",
                units_to_micros(1_000),
                100.0,
                units_to_micros(10),
            )])
            .with_campaign(campaign(BiddingStrategy::MaximizeClicks, budget));

        let report = run_day(&workspace, &config, &platform, today);
        let BudgetStep::Decided(decision) = &report.budget else {
            panic!("budget step skipped on day {today}");
        };
        budget = decision.next_daily_budget_micros;
        history.push(budget);
    }

    assert_eq!(
        history,
        vec![
            units_to_micros(120),
            units_to_micros(144),
            units_to_micros(150),
            units_to_micros(150),
        ]
    );
}

/// No conversions after real spend pauses the campaign outright, ignoring the
/// daily change cap.
#[test]
fn no_conversions_pause_budget_immediately() {
    let config = test_config();
    let workspace = TestWorkspace::new(&config).expect("workspace");
    let platform = ScriptedPlatform::new()
        .with_daily_costs(steady_costs(20, 100))
        .with_ad_groups(vec![ad_group("quiet", units_to_micros(2_000), 0.0, 0)]);

    let report = run_day(&workspace, &config, &platform, 21);

    assert_eq!(report.pacing, PacingStatus::Red);
    assert_eq!(
        report.planned.first(),
        Some(&Mutation::SetDailyBudget {
            campaign_id: config.campaign_id.clone(),
            amount_micros: 0,
        })
    );
    let issued: Vec<Mutation> = platform
        .mutation_calls()
        .into_iter()
        .map(|call| call.mutation)
        .collect();
    assert_eq!(issued, report.planned);
}
