use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use arena_game::{ConfigError, DataLoader, GameConfig, GameStorage, LedgerError, PlayerLedger};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("i/o on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Ledger snapshots stored as `<dir>/<name>.json`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path_for(&self, save_name: &str) -> PathBuf {
        self.dir.join(format!("{save_name}.json"))
    }
}

impl GameStorage for FileStorage {
    type Error = StorageError;

    fn save_ledger(&self, save_name: &str, ledger: &PlayerLedger) -> Result<(), Self::Error> {
        fs::create_dir_all(&self.dir).map_err(io_error(&self.dir))?;
        let path = self.path_for(save_name);
        fs::write(&path, ledger.to_json()?).map_err(io_error(&path))?;
        log::debug!("saved ledger to {}", path.display());
        Ok(())
    }

    fn load_ledger(&self, save_name: &str) -> Result<Option<PlayerLedger>, Self::Error> {
        let path = self.path_for(save_name);
        match fs::read_to_string(&path) {
            Ok(json) => Ok(Some(PlayerLedger::from_json(&json)?)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error(&path)(err)),
        }
    }

    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error> {
        let path = self.path_for(save_name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(&path)(err)),
        }
    }
}

/// Game configuration read from a JSON file on disk.
#[derive(Debug, Clone)]
pub struct FileLoader {
    path: PathBuf,
}

impl FileLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl DataLoader for FileLoader {
    type Error = StorageError;

    fn load_config(&self) -> Result<GameConfig, Self::Error> {
        let json = fs::read_to_string(&self.path).map_err(io_error(&self.path))?;
        Ok(GameConfig::from_json(&json)?)
    }
}
