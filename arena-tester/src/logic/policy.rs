use std::fmt;
use std::time::Duration;

use arena_game::{ChestDefinition, GameSession, ItemId};
use serde::{Deserialize, Serialize};

/// Seconds of passive income an idle step credits.
pub const IDLE_TICK: Duration = Duration::from_secs(10);

/// Items below this value are sold by the flipper.
pub const FLIP_BELOW_CENTS: i64 = 1_000;

/// One gameplay operation chosen by a [`PlayerPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Click,
    Tick(Duration),
    OpenChest(String),
    Sell(ItemId),
    BuyUpgrade(String),
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Choose the next operation for the session.
    fn next_action(&mut self, session: &GameSession) -> Action;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum GameplayStrategy {
    Clicker,
    Investor,
    Collector,
    Flipper,
}

impl GameplayStrategy {
    pub const ALL: [Self; 4] = [Self::Clicker, Self::Investor, Self::Collector, Self::Flipper];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Clicker => "Clicker",
            Self::Investor => "Investor",
            Self::Collector => "Collector",
            Self::Flipper => "Flipper",
        }
    }

    #[must_use]
    pub fn create_policy(self) -> Box<dyn PlayerPolicy + Send> {
        match self {
            Self::Clicker => Box::new(ClickerPolicy),
            Self::Investor => Box::new(InvestorPolicy),
            Self::Collector => Box::new(CollectorPolicy),
            Self::Flipper => Box::new(FlipperPolicy {
                sell_below_cents: FLIP_BELOW_CENTS,
            }),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct ClickerPolicy;
struct InvestorPolicy;
struct CollectorPolicy;
struct FlipperPolicy {
    sell_below_cents: i64,
}

fn affordable_chests(session: &GameSession) -> impl Iterator<Item = &ChestDefinition> {
    let balance = session.ledger().balance_cents();
    session
        .available_chests()
        .into_iter()
        .filter(move |chest| chest.price_cents <= balance)
}

fn held_voucher(session: &GameSession) -> Option<Action> {
    session
        .ledger()
        .reward_chests()
        .first()
        .map(|chest| Action::OpenChest(chest.clone()))
}

fn best_affordable_chest(session: &GameSession) -> Option<Action> {
    affordable_chests(session)
        .max_by_key(|chest| chest.price_cents)
        .map(|chest| Action::OpenChest(chest.name.clone()))
}

impl PlayerPolicy for ClickerPolicy {
    fn name(&self) -> &'static str {
        "Clicker"
    }

    fn next_action(&mut self, session: &GameSession) -> Action {
        let clicks = session.ledger().counters().total_clicks;
        if clicks % 2 == 1
            && let Some(chest) = affordable_chests(session).min_by_key(|chest| chest.price_cents)
        {
            return Action::OpenChest(chest.name.clone());
        }
        Action::Click
    }
}

impl PlayerPolicy for InvestorPolicy {
    fn name(&self) -> &'static str {
        "Investor"
    }

    fn next_action(&mut self, session: &GameSession) -> Action {
        let balance = session.ledger().balance_cents();
        if let Some(upgrade) = session
            .available_upgrades()
            .into_iter()
            .filter(|upgrade| upgrade.cost_cents <= balance)
            .min_by_key(|upgrade| upgrade.cost_cents)
        {
            return Action::BuyUpgrade(upgrade.name.clone());
        }
        if session.ledger().money_per_second_cents() > 0 {
            Action::Tick(IDLE_TICK)
        } else {
            Action::Click
        }
    }
}

impl PlayerPolicy for CollectorPolicy {
    fn name(&self) -> &'static str {
        "Collector"
    }

    fn next_action(&mut self, session: &GameSession) -> Action {
        held_voucher(session)
            .or_else(|| best_affordable_chest(session))
            .unwrap_or(Action::Click)
    }
}

impl PlayerPolicy for FlipperPolicy {
    fn name(&self) -> &'static str {
        "Flipper"
    }

    fn next_action(&mut self, session: &GameSession) -> Action {
        if let Some(item) = session
            .ledger()
            .collection()
            .iter()
            .find(|item| item.value_cents < self.sell_below_cents)
        {
            return Action::Sell(item.id);
        }
        held_voucher(session)
            .or_else(|| best_affordable_chest(session))
            .unwrap_or(Action::Click)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_game::GameConfig;
    use std::sync::Arc;

    fn session() -> GameSession {
        GameSession::new(Arc::new(GameConfig::default_config()), 1)
    }

    #[test]
    fn broke_players_click() {
        let session = session();
        for strategy in GameplayStrategy::ALL {
            let mut policy = strategy.create_policy();
            assert_eq!(policy.next_action(&session), Action::Click, "{strategy}");
        }
    }

    #[test]
    fn investor_buys_cheapest_affordable_upgrade_then_idles() {
        let mut session = session();
        for _ in 0..20 {
            session.click();
        }
        let mut policy = GameplayStrategy::Investor.create_policy();
        assert_eq!(
            policy.next_action(&session),
            Action::BuyUpgrade("Auto Clicker I".to_string())
        );
        session.buy_upgrade("Auto Clicker I").unwrap();
        assert_eq!(policy.next_action(&session), Action::Tick(IDLE_TICK));
    }

    #[test]
    fn collector_opens_priciest_unlocked_chest() {
        let mut session = session();
        for _ in 0..1_000 {
            session.click();
        }
        let mut policy = GameplayStrategy::Collector.create_policy();
        assert_eq!(
            policy.next_action(&session),
            Action::OpenChest("Silver Chest".to_string())
        );
    }

    #[test]
    fn flipper_sells_cheap_pulls_first() {
        let mut session = session();
        for _ in 0..100 {
            session.click();
        }
        let item = session.open_chest("Wooden Chest").unwrap();
        let mut policy = GameplayStrategy::Flipper.create_policy();
        let action = policy.next_action(&session);
        if item.value_cents < FLIP_BELOW_CENTS {
            assert_eq!(action, Action::Sell(item.id));
        } else {
            assert_ne!(action, Action::Sell(item.id));
        }
    }
}
