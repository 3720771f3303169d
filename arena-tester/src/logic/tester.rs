use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::policy::GameplayStrategy;
use crate::logic::scenarios::TestScenario;
use crate::logic::simulation::{GameTester, SimulationPlan, SimulationSummary};

/// Averages over the iterations of one scenario/seed pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunAverages {
    pub final_tier: f64,
    pub chests_opened: f64,
    pub items_sold: f64,
    pub loot_draws: f64,
    pub final_balance_cents: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub strategy: GameplayStrategy,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub averages: RunAverages,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    tester: GameTester,
}

impl LogicTester {
    pub const fn new(tester: GameTester) -> Self {
        Self { tester }
    }

    pub fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        seeds
            .iter()
            .map(|&seed| {
                if self.tester.verbose() {
                    println!(
                        "🧪 Testing scenario: {} (strategy: {} seed: {})",
                        scenario.name.bright_white(),
                        scenario.plan.strategy,
                        seed
                    );
                }
                self.run_single_scenario(scenario, seed, iterations)
            })
            .collect()
    }

    fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();
        let mut totals = RunAverages::default();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let summary = self.tester.run_plan(&scenario.plan, iteration_seed);
            accumulate(&mut totals, &summary);

            if let Some(err) = evaluate_expectations(&scenario.plan, &summary) {
                let ledger = &summary.final_ledger;
                failures.push(format!(
                    "Iteration {} (strategy {}, seed {}, steps {}): {} | arena {} balance {} chests {} sold {}",
                    i + 1,
                    summary.strategy,
                    summary.seed,
                    summary.steps,
                    err,
                    ledger.current_tier(),
                    ledger.balance_cents(),
                    ledger.counters().chests_opened,
                    ledger.counters().items_sold
                ));
                if self.tester.verbose() {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.red()
                    );
                    if let Some(last) = summary.rejected_actions.last() {
                        println!("     ↳ last rejected action: {last}");
                    }
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);
                if self.tester.verbose() {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) arena:{} chests:{} draws:{}",
                        i + 1,
                        iterations,
                        summary.final_ledger.current_tier(),
                        summary.chests_opened,
                        summary.loot_draws
                    );
                }
            }
        }

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            strategy: scenario.plan.strategy,
            seed,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            averages: average(totals, iterations),
            average_duration: mean_duration(&performance_data),
            performance_data,
        }
    }
}

fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    plan.expectations
        .iter()
        .find_map(|expectation| expectation.evaluate(summary).err())
        .map(|err| format!("{err:#}"))
}

#[allow(clippy::cast_precision_loss)]
fn accumulate(totals: &mut RunAverages, summary: &SimulationSummary) {
    let ledger = &summary.final_ledger;
    totals.final_tier += f64::from(ledger.current_tier());
    totals.chests_opened += ledger.counters().chests_opened as f64;
    totals.items_sold += ledger.counters().items_sold as f64;
    totals.loot_draws += summary.loot_draws as f64;
    totals.final_balance_cents += ledger.balance_cents() as f64;
}

#[allow(clippy::cast_precision_loss)]
fn average(totals: RunAverages, iterations: usize) -> RunAverages {
    if iterations == 0 {
        return RunAverages::default();
    }
    let n = iterations as f64;
    RunAverages {
        final_tier: totals.final_tier / n,
        chests_opened: totals.chests_opened / n,
        items_sold: totals.items_sold / n,
        loot_draws: totals.loot_draws / n,
        final_balance_cents: totals.final_balance_cents / n,
    }
}

fn mean_duration(samples: &[Duration]) -> Duration {
    if samples.is_empty() {
        Duration::ZERO
    } else {
        samples.iter().sum::<Duration>() / u32::try_from(samples.len()).unwrap_or(u32::MAX)
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis: Vec<u128> = durations.iter().map(Duration::as_millis).collect();
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = Vec::<u128>::deserialize(deserializer)?;
        Ok(millis
            .into_iter()
            .map(|m| Duration::from_millis(u64::try_from(m).unwrap_or(0)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scenarios::get_scenario;
    use arena_game::GameConfig;
    use std::sync::Arc;

    fn logic_tester() -> LogicTester {
        let tester = GameTester::new(Arc::new(GameConfig::default_config()), false)
            .with_default_steps(200);
        LogicTester::new(tester)
    }

    #[test]
    fn runs_one_result_per_seed() {
        let scenario = get_scenario("smoke").unwrap().remove(0);
        let results = logic_tester().run_scenario(&scenario, &[1, 2, 3], 2);
        assert_eq!(results.len(), 3);
        for result in &results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.successful_iterations, 2);
            assert_eq!(result.strategy, GameplayStrategy::Clicker);
        }
    }

    #[test]
    fn failing_expectation_is_reported_per_iteration() {
        let plan = SimulationPlan::new(GameplayStrategy::Clicker)
            .with_steps(10)
            .with_expectation(|_: &SimulationSummary| -> anyhow::Result<()> {
                anyhow::bail!("always fails")
            });
        let scenario = TestScenario::simulation("Broken", plan);
        let result = logic_tester().run_scenario(&scenario, &[7], 3).remove(0);
        assert!(!result.passed);
        assert_eq!(result.failures.len(), 3);
        assert!(result.failures[0].contains("always fails"));
        assert_eq!(result.average_duration, Duration::ZERO);
    }

    #[test]
    fn result_serializes_durations_as_millis() {
        let scenario = get_scenario("smoke").unwrap().remove(0);
        let result = logic_tester().run_scenario(&scenario, &[1], 1).remove(0);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json["average_duration"].is_u64());
        assert_eq!(json["strategy"], "Clicker");
    }
}
