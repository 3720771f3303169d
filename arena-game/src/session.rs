//! A player's session: ledger, shared config and the loot RNG stream.
use parking_lot::Mutex;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::chest::{ChestEngine, ChestError, available_chests};
use crate::config::GameConfig;
use crate::income;
use crate::ledger::{Item, ItemId, LedgerError, PlayerLedger};
use crate::rewards::ChestDefinition;
use crate::rng::{CountingRng, LOOT_DOMAIN};
use crate::tiers::{TierProgress, UnlockEvents, check_and_advance, tier_progress};
use crate::upgrades::{self, UpgradeDefinition, UpgradeEffect, UpgradeError};

/// Session guarded by the single lock every mutation goes through.
pub type SharedSession = Arc<Mutex<GameSession>>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("reset refused without explicit confirmation")]
    ResetNotConfirmed,
}

/// Currency earned by a click or tick plus any tiers it unlocked.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningOutcome {
    pub earned_cents: i64,
    pub unlocks: UnlockEvents,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    config: Arc<GameConfig>,
    ledger: PlayerLedger,
    seed: u64,
    loot: CountingRng<SmallRng>,
}

impl GameSession {
    /// Fresh ledger at the config's starting state.
    #[must_use]
    pub fn new(config: Arc<GameConfig>, seed: u64) -> Self {
        let ledger = PlayerLedger::new(&config.starting);
        Self::from_ledger(config, ledger, seed)
    }

    /// Resume with a restored ledger.
    #[must_use]
    pub fn from_ledger(config: Arc<GameConfig>, ledger: PlayerLedger, seed: u64) -> Self {
        log::info!(
            "session seeded {seed:#x} at tier {} with balance {} cents",
            ledger.current_tier(),
            ledger.balance_cents()
        );
        Self {
            config,
            ledger,
            seed,
            loot: CountingRng::from_user_seed(seed, LOOT_DOMAIN),
        }
    }

    #[must_use]
    pub fn into_shared(self) -> SharedSession {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub const fn ledger(&self) -> &PlayerLedger {
        &self.ledger
    }

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Draws taken from the loot stream since the last (re)seed.
    #[must_use]
    pub const fn loot_draws(&self) -> u64 {
        self.loot.draws()
    }

    #[must_use]
    pub fn into_ledger(self) -> PlayerLedger {
        self.ledger
    }

    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.loot = CountingRng::from_user_seed(seed, LOOT_DOMAIN);
    }

    pub fn click(&mut self) -> EarningOutcome {
        let earned_cents = income::click(&mut self.ledger);
        self.after_earning(earned_cents)
    }

    pub fn tick(&mut self, elapsed: Duration) -> EarningOutcome {
        let earned_cents = income::tick(&mut self.ledger, elapsed);
        self.after_earning(earned_cents)
    }

    fn after_earning(&mut self, earned_cents: i64) -> EarningOutcome {
        EarningOutcome {
            earned_cents,
            unlocks: self.check_progression(),
        }
    }

    /// Claim every tier the current lifetime earnings qualify for.
    pub fn check_progression(&mut self) -> UnlockEvents {
        check_and_advance(&mut self.ledger, &self.config.tiers, &self.config.rewards)
    }

    /// # Errors
    ///
    /// See [`ChestEngine::open`].
    pub fn open_chest(&mut self, chest_name: &str) -> Result<Item, ChestError> {
        ChestEngine::new(&self.config).open(chest_name, &mut self.ledger, &mut self.loot)
    }

    /// # Errors
    ///
    /// See [`PlayerLedger::sell`].
    pub fn sell(&mut self, id: ItemId) -> Result<i64, LedgerError> {
        self.ledger.sell(id)
    }

    /// # Errors
    ///
    /// See [`upgrades::buy_upgrade`].
    pub fn buy_upgrade(&mut self, name: &str) -> Result<UpgradeEffect, UpgradeError> {
        upgrades::buy_upgrade(&mut self.ledger, &self.config, name)
    }

    /// Wipe the ledger back to the starting state.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ResetNotConfirmed`] unless `confirm` is true.
    pub fn reset(&mut self, confirm: bool) -> Result<(), SessionError> {
        if !confirm {
            return Err(SessionError::ResetNotConfirmed);
        }
        self.ledger.reset(&self.config.starting);
        log::info!("session {:#x} reset to starting state", self.seed);
        Ok(())
    }

    #[must_use]
    pub fn progress(&self) -> TierProgress {
        tier_progress(&self.ledger, &self.config.tiers)
    }

    #[must_use]
    pub fn available_chests(&self) -> Vec<&ChestDefinition> {
        available_chests(&self.ledger, &self.config).collect()
    }

    #[must_use]
    pub fn available_upgrades(&self) -> Vec<&UpgradeDefinition> {
        upgrades::available_upgrades(&self.ledger, &self.config).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn session(seed: u64) -> GameSession {
        GameSession::new(Arc::new(GameConfig::default_config()), seed)
    }

    #[test]
    fn clicking_to_arena_two_pays_its_reward() {
        let mut session = session(1);
        let mut unlocks = Vec::new();
        for _ in 0..1_000 {
            unlocks.extend(session.click().unlocks);
        }
        assert_eq!(unlocks.len(), 1);
        assert_eq!(unlocks[0].tier, 2);
        assert_eq!(unlocks[0].unlocked_chests, ["Silver Chest".to_string()]);
        assert_eq!(session.ledger().lifetime_earned_cents(), 100_000);
        assert_eq!(session.ledger().balance_cents(), 150_000);
        assert_eq!(session.ledger().current_tier(), 2);
    }

    #[test]
    fn same_seed_replays_identical_pulls() {
        let play = |seed| {
            let mut session = session(seed);
            for _ in 0..100 {
                session.click();
            }
            let pulls: Vec<Item> = (0..5)
                .map(|_| session.open_chest("Wooden Chest").unwrap())
                .collect();
            (pulls, session.loot_draws())
        };
        assert_eq!(play(42), play(42));
        assert!(play(42).1 > 0);
    }

    #[test]
    fn reset_requires_confirmation() {
        let mut session = session(3);
        session.click();
        assert_eq!(session.reset(false), Err(SessionError::ResetNotConfirmed));
        assert_eq!(session.ledger().counters().total_clicks, 1);

        session.reset(true).unwrap();
        assert_eq!(session.ledger(), &PlayerLedger::new(&session.config().starting));
    }

    #[test]
    fn passive_ticks_after_upgrade_drive_progression() {
        let mut session = session(9);
        for _ in 0..20 {
            session.click();
        }
        session.buy_upgrade("Auto Clicker I").unwrap();
        assert_eq!(session.ledger().money_per_second_cents(), 50);
        let outcome = session.tick(Duration::from_secs(2_000));
        assert_eq!(outcome.earned_cents, 100_000);
        assert_eq!(outcome.unlocks.len(), 1);
        assert_eq!(session.progress().current, 2);
    }

    #[test]
    fn shared_session_serialises_ticker_and_clicks() {
        let mut base = session(5);
        base.click();
        base.click();
        base.buy_upgrade("Auto Clicker I").unwrap_err();
        let shared = base.into_shared();
        {
            let mut guard = shared.lock();
            for _ in 0..18 {
                guard.click();
            }
            guard.buy_upgrade("Auto Clicker I").unwrap();
        }

        let ticker = {
            let shared = Arc::clone(&shared);
            thread::spawn(move || {
                for _ in 0..500 {
                    shared.lock().tick(Duration::from_secs(1));
                }
            })
        };
        for _ in 0..500 {
            shared.lock().click();
        }
        ticker.join().unwrap();

        let session = shared.lock();
        // 20 + 500 clicks at 100 cents, 500 seconds at 50 cents.
        assert_eq!(session.ledger().lifetime_earned_cents(), 52_000 + 25_000);
        assert_eq!(session.ledger().counters().total_clicks, 520);
    }
}
