use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::time::Duration;

use super::{GameplayStrategy, ScenarioResult};

/// Results folded per strategy across scenarios and seeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StrategyAggregate {
    pub strategy: Option<GameplayStrategy>,
    pub runs: usize,
    pub passed_runs: usize,
    pub mean_final_tier: f64,
    pub mean_chests_opened: f64,
    pub mean_items_sold: f64,
    pub mean_loot_draws: f64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    results: &'a [ScenarioResult],
    strategies: Vec<StrategyAggregate>,
}

#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate_by_strategy(results: &[ScenarioResult]) -> Vec<StrategyAggregate> {
    let mut grouped: BTreeMap<GameplayStrategy, StrategyAggregate> = BTreeMap::new();
    for result in results {
        let entry = grouped
            .entry(result.strategy)
            .or_insert_with(|| StrategyAggregate {
                strategy: Some(result.strategy),
                ..StrategyAggregate::default()
            });
        let weight = result.iterations_run as f64;
        entry.runs += result.iterations_run;
        entry.passed_runs += result.successful_iterations;
        entry.mean_final_tier += result.averages.final_tier * weight;
        entry.mean_chests_opened += result.averages.chests_opened * weight;
        entry.mean_items_sold += result.averages.items_sold * weight;
        entry.mean_loot_draws += result.averages.loot_draws * weight;
    }
    grouped
        .into_values()
        .map(|mut aggregate| {
            if aggregate.runs > 0 {
                let runs = aggregate.runs as f64;
                aggregate.mean_final_tier /= runs;
                aggregate.mean_chests_opened /= runs;
                aggregate.mean_items_sold /= runs;
                aggregate.mean_loot_draws /= runs;
            }
            aggregate
        })
        .collect()
}

fn strategy_label(aggregate: &StrategyAggregate) -> &'static str {
    aggregate.strategy.map_or("-", GameplayStrategy::label)
}

#[allow(clippy::cast_precision_loss)]
fn success_rate(results: &[ScenarioResult]) -> f64 {
    if results.is_empty() {
        return 0.0;
    }
    let passed = results.iter().filter(|r| r.passed).count();
    (passed as f64 / results.len() as f64) * 100.0
}

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "Total scenario runs: {total}")?;
    writeln!(out, "Passed: {}", passed.to_string().green())?;
    writeln!(out, "Failed: {}", (total - passed).to_string().red())?;
    writeln!(out, "Success rate: {:.1}%", success_rate(results))?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };
        writeln!(
            out,
            "{} {} (seed {})",
            status,
            result.scenario_name.bold(),
            result.seed
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(
            out,
            "   Mean arena {:.1} | chests {:.1} | sold {:.1} | balance {}",
            result.averages.final_tier,
            result.averages.chests_opened,
            result.averages.items_sold,
            arena_game::format_cents(arena_game::numbers::round_f64_to_i64(
                result.averages.final_balance_cents
            ))
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;
        for failure in &result.failures {
            writeln!(out, "     • {}", failure.red())?;
        }
        writeln!(out)?;
    }

    let aggregates = aggregate_by_strategy(results);
    if !aggregates.is_empty() {
        writeln!(out, "{}", "🎯 Strategy Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "===================".yellow())?;
        for aggregate in &aggregates {
            writeln!(
                out,
                "{:10} runs {:4} passed {:4} arena {:5.1} chests {:7.1} sold {:6.1} draws {:8.1}",
                strategy_label(aggregate),
                aggregate.runs,
                aggregate.passed_runs,
                aggregate.mean_final_tier,
                aggregate.mean_chests_opened,
                aggregate.mean_items_sold,
                aggregate.mean_loot_draws
            )?;
        }
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let report = JsonReport {
        results,
        strategies: aggregate_by_strategy(results),
    };
    serde_json::to_writer_pretty(&mut *out, &report)?;
    writeln!(out)?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Arena Logic Test Results\n")?;

    let total = results.len();
    let passed = results.iter().filter(|r| r.passed).count();
    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenario runs**: {total}")?;
    writeln!(out, "- **Passed**: {passed}")?;
    writeln!(out, "- **Failed**: {}", total - passed)?;
    writeln!(out, "- **Success rate**: {:.1}%\n", success_rate(results))?;

    writeln!(out, "## Strategies\n")?;
    writeln!(out, "| Strategy | Runs | Passed | Mean arena | Mean chests | Mean sold |")?;
    writeln!(out, "|---|---|---|---|---|---|")?;
    for aggregate in aggregate_by_strategy(results) {
        writeln!(
            out,
            "| {} | {} | {} | {:.1} | {:.1} | {:.1} |",
            strategy_label(&aggregate),
            aggregate.runs,
            aggregate.passed_runs,
            aggregate.mean_final_tier,
            aggregate.mean_chests_opened,
            aggregate.mean_items_sold
        )?;
    }
    writeln!(out)?;

    writeln!(out, "## Detailed Results\n")?;
    for result in results {
        let status = if result.passed { "✅" } else { "❌" };
        writeln!(
            out,
            "### {} {} (seed {})\n",
            status, result.scenario_name, result.seed
        )?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;
        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}
