//! Arena Chest Game Engine
//!
//! Platform-agnostic core for the arena clicker: weighted chest pulls, value
//! sampling within rarity bands, lifetime-earnings tier progression with
//! claimed-once rewards, upgrades and the player ledger. No UI or platform
//! dependencies; storage and config loading are supplied through traits.

pub mod chest;
pub mod config;
pub mod income;
pub mod ledger;
pub mod numbers;
pub mod picker;
pub mod rarity;
pub mod rewards;
pub mod rng;
pub mod sampler;
pub mod session;
pub mod tiers;
pub mod upgrades;

use std::sync::Arc;

use anyhow::Context;

// Re-export commonly used types
pub use chest::{ChestEngine, ChestError, available_chests};
pub use config::{ConfigError, GameConfig, StartingState};
pub use income::{click, tick};
pub use ledger::{Item, ItemId, LedgerCounters, LedgerError, PlayerLedger};
pub use numbers::format_cents;
pub use picker::{pick_rarity, roll_rarity};
pub use rarity::Rarity;
pub use rewards::{
    ChestDefinition, ChestOdds, RarityConfig, RarityWeight, RewardTable, ValueDistribution,
};
pub use rng::{CountingRng, derive_stream_seed};
pub use sampler::sample_value;
pub use session::{EarningOutcome, GameSession, SessionError, SharedSession};
pub use tiers::{
    TierDefinition, TierProgress, TierUnlockEvent, UnlockEvents, check_and_advance, tier_progress,
};
pub use upgrades::{
    UpgradeDefinition, UpgradeEffect, UpgradeError, available_upgrades, buy_upgrade,
};

/// Trait for abstracting configuration loading.
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the game configuration from the platform-specific source
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or fails validation.
    fn load_config(&self) -> Result<GameConfig, Self::Error>;
}

/// Serves the configuration compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedLoader;

impl DataLoader for EmbeddedLoader {
    type Error = ConfigError;

    fn load_config(&self) -> Result<GameConfig, Self::Error> {
        GameConfig::from_json(config::DEFAULT_GAME_DATA)
    }
}

/// Trait for abstracting save/load of ledger snapshots.
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a ledger snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    fn save_ledger(&self, save_name: &str, ledger: &PlayerLedger) -> Result<(), Self::Error>;

    /// Load a ledger snapshot, `None` if no save exists
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot exists but cannot be read.
    fn load_ledger(&self, save_name: &str) -> Result<Option<PlayerLedger>, Self::Error>;

    /// Delete a saved snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Main game engine pairing a config source with a save store
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Create a new game engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Start a fresh session with the specified seed
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub fn create_session(&self, seed: u64) -> Result<GameSession, L::Error> {
        let config = self.data_loader.load_config()?;
        Ok(GameSession::new(Arc::new(config), seed))
    }

    /// Persist the session's ledger
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be saved.
    pub fn save_session(&self, save_name: &str, session: &GameSession) -> Result<(), S::Error> {
        self.storage.save_ledger(save_name, session.ledger())
    }

    /// Restore a saved ledger into a new session
    ///
    /// The snapshot is validated against freshly loaded configuration before
    /// play resumes.
    ///
    /// # Errors
    ///
    /// Returns an error if loading fails or the snapshot is inconsistent with
    /// the configuration.
    pub fn load_session(&self, save_name: &str, seed: u64) -> anyhow::Result<Option<GameSession>>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        let Some(ledger) = self.storage.load_ledger(save_name).map_err(Into::into)? else {
            return Ok(None);
        };
        let config = self.data_loader.load_config().map_err(Into::into)?;
        if let Err(err) = ledger.validate_against(&config) {
            log::warn!("rejecting save '{save_name}': {err}");
            return Err(err).with_context(|| format!("save '{save_name}' does not match config"));
        }
        log::info!("loaded save '{save_name}'");
        Ok(Some(GameSession::from_ledger(Arc::new(config), ledger, seed)))
    }

    /// Delete a saved snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_save(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::convert::Infallible;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct MemoryStorage {
        saves: Rc<RefCell<HashMap<String, String>>>,
    }

    impl GameStorage for MemoryStorage {
        type Error = LedgerError;

        fn save_ledger(&self, save_name: &str, ledger: &PlayerLedger) -> Result<(), Self::Error> {
            self.saves
                .borrow_mut()
                .insert(save_name.to_string(), ledger.to_json()?);
            Ok(())
        }

        fn load_ledger(&self, save_name: &str) -> Result<Option<PlayerLedger>, Self::Error> {
            self.saves
                .borrow()
                .get(save_name)
                .map(|json| PlayerLedger::from_json(json))
                .transpose()
        }

        fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
            self.saves.borrow_mut().remove(save_name);
            Ok(())
        }
    }

    #[derive(Clone, Copy, Default)]
    struct TinyLoader;

    impl DataLoader for TinyLoader {
        type Error = Infallible;

        fn load_config(&self) -> Result<GameConfig, Self::Error> {
            let mut config = GameConfig::default_config();
            config.tiers.truncate(1);
            config.rewards.chests.retain(|chest| chest.unlock_tier == 1);
            Ok(config)
        }
    }

    #[test]
    fn engine_creates_and_roundtrips_sessions() {
        let engine = GameEngine::new(EmbeddedLoader, MemoryStorage::default());
        let mut session = engine.create_session(0xABCD).unwrap();
        for _ in 0..1_200 {
            session.click();
        }
        let item = session.open_chest("Silver Chest").unwrap();
        engine.save_session("slot-one", &session).unwrap();

        let loaded = engine
            .load_session("slot-one", 0xABCD)
            .unwrap()
            .expect("save exists");
        assert_eq!(loaded.ledger(), session.ledger());
        assert!(loaded.ledger().owns(item.id));
        assert!(engine.load_session("missing-slot", 1).unwrap().is_none());

        engine.delete_save("slot-one").unwrap();
        assert!(engine.load_session("slot-one", 1).unwrap().is_none());
    }

    #[test]
    fn load_rejects_snapshot_from_incompatible_config() {
        let storage = MemoryStorage::default();
        let writer = GameEngine::new(EmbeddedLoader, storage.clone());
        let mut session = writer.create_session(7).unwrap();
        for _ in 0..1_000 {
            session.click();
        }
        assert_eq!(session.ledger().current_tier(), 2);
        writer.save_session("slot", &session).unwrap();

        let reader = GameEngine::new(TinyLoader, storage);
        assert!(reader.load_session("slot", 7).is_err());
    }

    #[test]
    fn embedded_loader_serves_canonical_config() {
        let config = EmbeddedLoader.load_config().unwrap();
        assert_eq!(config, GameConfig::default_config());
    }
}
