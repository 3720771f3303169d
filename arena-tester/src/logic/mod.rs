pub mod policy;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod simulation;
pub mod tester;

pub use policy::{Action, GameplayStrategy, PlayerPolicy};
pub use scenarios::{TestScenario, expand_scenarios, get_scenario, list_scenarios};
pub use seeds::resolve_seed_inputs;
pub use simulation::{GameTester, SimulationPlan, SimulationSummary};
pub use tester::*;
