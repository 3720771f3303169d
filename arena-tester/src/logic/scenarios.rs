use anyhow::{Result, ensure};

use crate::logic::policy::GameplayStrategy;
use crate::logic::simulation::{SimulationPlan, SimulationSummary};
use crate::util::split_csv;

/// Named logic scenario: a plan plus the checks run against every summary.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

const SCENARIOS: [(&str, &str); 7] = [
    ("smoke", "Clicker run with core ledger checks"),
    ("tier-monotonic", "Current arena never decreases"),
    ("lifetime-monotonic", "Lifetime earnings never decrease"),
    ("rewards-claimed-once", "Each arena reward credited exactly once"),
    ("chest-accounting", "Balance equals earnings minus spend plus sales"),
    ("persistence-roundtrip", "Save, reload and confirm nothing is re-granted"),
    ("strategy-sweep", "Every strategy with all ledger checks"),
];

#[must_use]
pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS.to_vec()
}

/// Resolve a scenario key into one or more runnable scenarios.
#[must_use]
pub fn get_scenario(name: &str) -> Option<Vec<TestScenario>> {
    let scenario = |label: &str, plan| vec![TestScenario::simulation(label, plan)];
    let found = match name.to_ascii_lowercase().as_str() {
        "smoke" => scenario(
            "Smoke",
            SimulationPlan::new(GameplayStrategy::Clicker)
                .with_steps(300)
                .with_expectation(balance_matches_flow)
                .with_expectation(counters_match_collection),
        ),
        "tier-monotonic" => scenario(
            "Tier Monotonic",
            SimulationPlan::new(GameplayStrategy::Investor).with_expectation(tiers_never_decrease),
        ),
        "lifetime-monotonic" => scenario(
            "Lifetime Monotonic",
            SimulationPlan::new(GameplayStrategy::Clicker)
                .with_expectation(lifetime_never_decreases),
        ),
        "rewards-claimed-once" => scenario(
            "Rewards Claimed Once",
            SimulationPlan::new(GameplayStrategy::Investor)
                .with_expectation(rewards_claimed_once),
        ),
        "chest-accounting" => scenario(
            "Chest Accounting",
            SimulationPlan::new(GameplayStrategy::Flipper)
                .with_expectation(balance_matches_flow)
                .with_expectation(counters_match_collection),
        ),
        "persistence-roundtrip" => scenario(
            "Persistence Roundtrip",
            SimulationPlan::new(GameplayStrategy::Collector)
                .with_persistence()
                .with_expectation(reload_is_identical),
        ),
        "strategy-sweep" => GameplayStrategy::ALL
            .into_iter()
            .map(|strategy| {
                TestScenario::simulation(format!("Sweep {strategy}"), full_checks(strategy))
            })
            .collect(),
        _ => return None,
    };
    Some(found)
}

/// Split the CLI list and expand the `all` keyword.
#[must_use]
pub fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        scenarios.extend(
            SCENARIOS
                .iter()
                .map(|(key, _)| (*key).to_string())
                .filter(|key| key != "strategy-sweep"),
        );
    }
    scenarios
}

fn full_checks(strategy: GameplayStrategy) -> SimulationPlan {
    SimulationPlan::new(strategy)
        .with_persistence()
        .with_expectation(balance_matches_flow)
        .with_expectation(counters_match_collection)
        .with_expectation(tiers_never_decrease)
        .with_expectation(lifetime_never_decreases)
        .with_expectation(rewards_claimed_once)
        .with_expectation(reload_is_identical)
}

fn balance_matches_flow(summary: &SimulationSummary) -> Result<()> {
    let balance = summary.final_ledger.balance_cents();
    ensure!(balance >= 0, "balance went negative: {balance}");
    ensure!(
        summary.flow.expected_balance() == balance,
        "balance {balance} != flow total {} ({:?})",
        summary.flow.expected_balance(),
        summary.flow
    );
    ensure!(
        summary.final_ledger.lifetime_earned_cents() == summary.flow.earned_cents,
        "lifetime {} != earned {}",
        summary.final_ledger.lifetime_earned_cents(),
        summary.flow.earned_cents
    );
    Ok(())
}

fn counters_match_collection(summary: &SimulationSummary) -> Result<()> {
    let counters = summary.final_ledger.counters();
    ensure!(
        counters.chests_opened == summary.chests_opened,
        "counter says {} chests, runner opened {}",
        counters.chests_opened,
        summary.chests_opened
    );
    ensure!(
        counters.items_collected == counters.chests_opened,
        "{} items for {} chests",
        counters.items_collected,
        counters.chests_opened
    );
    let held = summary.final_ledger.collection().len() as u64;
    ensure!(
        held + counters.items_sold == counters.items_collected,
        "held {held} + sold {} != collected {}",
        counters.items_sold,
        counters.items_collected
    );
    for item in summary.final_ledger.collection() {
        let band = summary
            .config
            .rewards
            .rarity(item.rarity)
            .ok_or_else(|| anyhow::anyhow!("no band for {}", item.rarity))?;
        ensure!(
            band.contains(item.value_cents),
            "{} {} worth {} outside its band",
            item.id,
            item.name,
            item.value_cents
        );
    }
    Ok(())
}

fn tiers_never_decrease(summary: &SimulationSummary) -> Result<()> {
    if let Some(pair) = summary.tier_history.windows(2).find(|w| w[1] < w[0]) {
        anyhow::bail!("tier dropped from {} to {}", pair[0], pair[1]);
    }
    ensure!(
        summary.final_ledger.current_tier() <= summary.config.max_tier(),
        "tier {} beyond the ladder",
        summary.final_ledger.current_tier()
    );
    Ok(())
}

fn lifetime_never_decreases(summary: &SimulationSummary) -> Result<()> {
    if let Some(pair) = summary.lifetime_history.windows(2).find(|w| w[1] < w[0]) {
        anyhow::bail!("lifetime earnings dropped from {} to {}", pair[0], pair[1]);
    }
    Ok(())
}

fn rewards_claimed_once(summary: &SimulationSummary) -> Result<()> {
    let mut granted: Vec<u32> = summary.unlocks.iter().map(|event| event.tier).collect();
    let in_order = granted.windows(2).all(|w| w[0] < w[1]);
    ensure!(in_order, "unlock events out of order: {granted:?}");
    granted.dedup();
    ensure!(
        granted.len() == summary.unlocks.len(),
        "an arena was granted twice"
    );
    let claimed: Vec<u32> = summary
        .final_ledger
        .claimed_tiers()
        .iter()
        .copied()
        .filter(|tier| *tier > 1)
        .collect();
    ensure!(
        claimed == granted,
        "claimed {claimed:?} but events granted {granted:?}"
    );
    for event in &summary.unlocks {
        let expected = summary.config.tier(event.tier).map_or(0, |t| t.reward_cents);
        ensure!(
            event.reward_cents == expected,
            "arena {} paid {} instead of {expected}",
            event.tier,
            event.reward_cents
        );
    }
    Ok(())
}

fn reload_is_identical(summary: &SimulationSummary) -> Result<()> {
    let reload = match &summary.reload {
        Some(Ok(reload)) => reload,
        Some(Err(err)) => anyhow::bail!("reload failed: {err}"),
        None => anyhow::bail!("scenario did not persist its ledger"),
    };
    ensure!(
        reload.ledger == summary.final_ledger,
        "reloaded ledger differs from the saved one"
    );
    ensure!(
        reload.regranted.is_empty(),
        "reload re-granted arenas {:?}",
        reload
            .regranted
            .iter()
            .map(|event| event.tier)
            .collect::<Vec<_>>()
    );
    Ok(())
}
