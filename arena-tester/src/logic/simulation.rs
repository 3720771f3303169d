use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use arena_game::{GameConfig, GameEngine, GameSession, PlayerLedger, TierUnlockEvent};
use colored::Colorize;

use crate::logic::policy::{Action, GameplayStrategy};
use crate::storage::FileStorage;

/// Steps per iteration when the CLI does not override it.
pub const DEFAULT_STEPS: usize = 2_000;

/// Declarative plan for running a simulation session.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub steps: Option<usize>,
    pub persist: bool,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub const fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            steps: None,
            persist: false,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_steps(mut self, steps: usize) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Save and reload the ledger once the run finishes.
    #[must_use]
    pub const fn with_persistence(mut self) -> Self {
        self.persist = true;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulationExpectation").finish()
    }
}

impl SimulationExpectation {
    pub fn evaluate(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Where every cent of the run came from and went to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerFlow {
    pub starting_balance_cents: i64,
    pub earned_cents: i64,
    pub rewards_cents: i64,
    pub sales_cents: i64,
    pub chest_spend_cents: i64,
    pub upgrade_spend_cents: i64,
}

impl LedgerFlow {
    #[must_use]
    pub const fn expected_balance(&self) -> i64 {
        self.starting_balance_cents + self.earned_cents + self.rewards_cents + self.sales_cents
            - self.chest_spend_cents
            - self.upgrade_spend_cents
    }
}

/// Outcome of saving and reloading the final ledger.
#[derive(Debug, Clone)]
pub struct ReloadCheck {
    pub ledger: PlayerLedger,
    pub regranted: Vec<TierUnlockEvent>,
}

/// Complete record of a simulation run.
#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub strategy: GameplayStrategy,
    pub steps: usize,
    pub config: Arc<GameConfig>,
    pub final_ledger: PlayerLedger,
    pub unlocks: Vec<TierUnlockEvent>,
    pub tier_history: Vec<u32>,
    pub lifetime_history: Vec<i64>,
    pub flow: LedgerFlow,
    pub chests_opened: u64,
    pub rejected_actions: Vec<String>,
    pub loot_draws: u64,
    pub reload: Option<Result<ReloadCheck, String>>,
}

/// Headless deterministic runner for the core game logic.
#[derive(Clone)]
pub struct GameTester {
    verbose: bool,
    config: Arc<GameConfig>,
    default_steps: usize,
    save_dir: PathBuf,
}

impl GameTester {
    pub fn new(config: Arc<GameConfig>, verbose: bool) -> Self {
        Self {
            verbose,
            config,
            default_steps: DEFAULT_STEPS,
            save_dir: std::env::temp_dir().join("arena-tester-saves"),
        }
    }

    #[must_use]
    pub const fn with_default_steps(mut self, steps: usize) -> Self {
        self.default_steps = steps;
        self
    }

    #[must_use]
    pub fn with_save_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.save_dir = dir.into();
        self
    }

    pub const fn verbose(&self) -> bool {
        self.verbose
    }

    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> SimulationSummary {
        let steps = plan.steps.unwrap_or(self.default_steps);
        let mut session = GameSession::new(Arc::clone(&self.config), seed);
        let mut policy = plan.strategy.create_policy();
        let mut flow = LedgerFlow {
            starting_balance_cents: session.ledger().balance_cents(),
            ..LedgerFlow::default()
        };
        let mut unlocks = Vec::new();
        let mut tier_history = Vec::with_capacity(steps);
        let mut lifetime_history = Vec::with_capacity(steps);
        let mut rejected_actions = Vec::new();
        let mut chests_opened = 0;

        for step in 0..steps {
            let action = policy.next_action(&session);
            let outcome = match &action {
                Action::Click => Ok(Some(session.click())),
                Action::Tick(elapsed) => Ok(Some(session.tick(*elapsed))),
                Action::OpenChest(name) => {
                    let price = self
                        .config
                        .chest(name)
                        .filter(|chest| !chest.reward_only)
                        .map_or(0, |chest| chest.price_cents);
                    session
                        .open_chest(name)
                        .map(|_| {
                            flow.chest_spend_cents += price;
                            chests_opened += 1;
                            None
                        })
                        .map_err(|err| err.to_string())
                }
                Action::Sell(id) => session
                    .sell(*id)
                    .map(|value| {
                        flow.sales_cents += value;
                        None
                    })
                    .map_err(|err| err.to_string()),
                Action::BuyUpgrade(name) => {
                    let cost = self.config.upgrade(name).map_or(0, |up| up.cost_cents);
                    session
                        .buy_upgrade(name)
                        .map(|_| {
                            flow.upgrade_spend_cents += cost;
                            None
                        })
                        .map_err(|err| err.to_string())
                }
            };

            match outcome {
                Ok(Some(earning)) => {
                    flow.earned_cents += earning.earned_cents;
                    for event in earning.unlocks {
                        flow.rewards_cents += event.reward_cents;
                        if self.verbose {
                            println!(
                                "     {} step {step}: arena {} (+{})",
                                "🏟".yellow(),
                                event.tier,
                                arena_game::format_cents(event.reward_cents)
                            );
                        }
                        unlocks.push(event);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    log::debug!("{} step {step} rejected {action:?}: {err}", policy.name());
                    rejected_actions.push(format!("step {step}: {action:?}: {err}"));
                }
            }
            tier_history.push(session.ledger().current_tier());
            lifetime_history.push(session.ledger().lifetime_earned_cents());
        }

        let reload = plan.persist.then(|| self.reload(&session, seed));

        SimulationSummary {
            seed,
            strategy: plan.strategy,
            steps,
            config: Arc::clone(&self.config),
            loot_draws: session.loot_draws(),
            final_ledger: session.into_ledger(),
            unlocks,
            tier_history,
            lifetime_history,
            flow,
            chests_opened,
            rejected_actions,
            reload,
        }
    }

    fn reload(&self, session: &GameSession, seed: u64) -> Result<ReloadCheck, String> {
        let engine = GameEngine::new(
            StaticLoader(Arc::clone(&self.config)),
            FileStorage::new(&self.save_dir),
        );
        let save_name = format!("seed-{seed}");
        engine
            .save_session(&save_name, session)
            .map_err(|err| err.to_string())?;
        let mut restored = engine
            .load_session(&save_name, seed)
            .map_err(|err| format!("{err:#}"))?
            .ok_or_else(|| format!("save '{save_name}' vanished"))?;
        let regranted = restored.check_progression().into_vec();
        if let Err(err) = engine.delete_save(&save_name) {
            log::warn!("could not remove {save_name}: {err}");
        }
        Ok(ReloadCheck {
            ledger: restored.into_ledger(),
            regranted,
        })
    }
}

/// Serves an already-loaded config to a [`GameEngine`].
struct StaticLoader(Arc<GameConfig>);

impl arena_game::DataLoader for StaticLoader {
    type Error = std::convert::Infallible;

    fn load_config(&self) -> Result<GameConfig, Self::Error> {
        Ok((*self.0).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tester() -> GameTester {
        GameTester::new(Arc::new(GameConfig::default_config()), false)
    }

    #[test]
    fn same_seed_produces_identical_runs() {
        let plan = SimulationPlan::new(GameplayStrategy::Flipper).with_steps(500);
        let first = tester().run_plan(&plan, 77);
        let second = tester().run_plan(&plan, 77);
        assert_eq!(first.final_ledger, second.final_ledger);
        assert_eq!(first.loot_draws, second.loot_draws);
        assert!(first.chests_opened > 0);
    }

    #[test]
    fn histories_cover_every_step() {
        let plan = SimulationPlan::new(GameplayStrategy::Clicker).with_steps(120);
        let summary = tester().run_plan(&plan, 1);
        assert_eq!(summary.tier_history.len(), 120);
        assert_eq!(summary.lifetime_history.len(), 120);
        assert_eq!(summary.flow.expected_balance(), summary.final_ledger.balance_cents());
    }

    #[test]
    fn investor_reaches_later_arenas_through_ticks() {
        let plan = SimulationPlan::new(GameplayStrategy::Investor).with_steps(3_000);
        let summary = tester().run_plan(&plan, 9);
        assert!(summary.final_ledger.current_tier() > 1);
        assert!(!summary.final_ledger.upgrades_owned().is_empty());
        assert!(summary.rejected_actions.is_empty(), "{:?}", summary.rejected_actions);
    }

    #[test]
    fn persistence_plan_reloads_an_identical_ledger() {
        let dir = std::env::temp_dir().join(format!("arena-sim-{}", std::process::id()));
        let plan = SimulationPlan::new(GameplayStrategy::Collector)
            .with_steps(400)
            .with_persistence();
        let summary = tester().with_save_dir(dir).run_plan(&plan, 3);
        let reload = summary.reload.expect("persistence requested").unwrap();
        assert_eq!(reload.ledger, summary.final_ledger);
        assert!(reload.regranted.is_empty());
    }
}
