//! Wallet snapshot persistence
//!
//! Keeps the ledger in a single JSON file between CLI invocations, along
//! with the last height the host saw and a SHA-256 checksum of the ledger.

use crate::wallet::{FamilyWallet, Height};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Snapshot format version written by this build
pub const SNAPSHOT_VERSION: u32 = 1;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Snapshot corrupted: checksum {actual} does not match {expected}")]
    Corrupted { expected: String, actual: String },
    #[error("Unsupported snapshot version: {0}")]
    UnsupportedVersion(u32),
    #[error("No wallet found at {0:?}")]
    NotInitialized(PathBuf),
    #[error("Wallet already exists at {0:?}")]
    AlreadyInitialized(PathBuf),
    #[error("Height {requested} is below the last seen height {last}")]
    HeightRegression { last: Height, requested: Height },
}

/// Storage configuration
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub wallet_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".family_wallet"),
            wallet_file: "wallet.json".to_string(),
        }
    }
}

/// Ledger state plus host bookkeeping, as written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    /// Last height an operation ran at
    pub height: Height,
    pub saved_at: DateTime<Utc>,
    /// Hex SHA-256 of the serialized wallet
    pub checksum: String,
    pub wallet: FamilyWallet,
}

impl Snapshot {
    pub fn new(wallet: FamilyWallet, height: Height) -> Result<Self, StorageError> {
        let checksum = wallet_checksum(&wallet)?;
        Ok(Self {
            version: SNAPSHOT_VERSION,
            height,
            saved_at: Utc::now(),
            checksum,
            wallet,
        })
    }

    /// Resolve the height for the next operation
    ///
    /// `None` reuses the last seen height. Heights never go backwards.
    pub fn advance(&mut self, requested: Option<Height>) -> Result<Height, StorageError> {
        let height = requested.unwrap_or(self.height);
        if height < self.height {
            return Err(StorageError::HeightRegression {
                last: self.height,
                requested: height,
            });
        }
        self.height = height;
        Ok(height)
    }

    /// Check the stored checksum against the wallet contents
    pub fn verify(&self) -> Result<(), StorageError> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StorageError::UnsupportedVersion(self.version));
        }

        let actual = wallet_checksum(&self.wallet)?;
        if actual != self.checksum {
            return Err(StorageError::Corrupted {
                expected: self.checksum.clone(),
                actual,
            });
        }
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), StorageError> {
        self.checksum = wallet_checksum(&self.wallet)?;
        self.saved_at = Utc::now();
        Ok(())
    }
}

/// Hex SHA-256 of the wallet's canonical JSON form
pub fn wallet_checksum(wallet: &FamilyWallet) -> Result<String, StorageError> {
    let bytes = serde_json::to_vec(wallet)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// Wallet snapshot store
pub struct Storage {
    config: StorageConfig,
}

impl Storage {
    /// Create a new storage manager
    pub fn new(config: StorageConfig) -> Result<Self, StorageError> {
        fs::create_dir_all(&config.data_dir)?;
        Ok(Self { config })
    }

    /// Get the snapshot file path
    pub fn wallet_path(&self) -> PathBuf {
        self.config.data_dir.join(&self.config.wallet_file)
    }

    fn temp_path(&self) -> PathBuf {
        self.config
            .data_dir
            .join(format!("{}.tmp", self.config.wallet_file))
    }

    /// Check if a saved wallet exists
    pub fn exists(&self) -> bool {
        self.wallet_path().exists()
    }

    /// Write a brand-new wallet, refusing to clobber an existing one
    pub fn create(&self, wallet: FamilyWallet, height: Height) -> Result<Snapshot, StorageError> {
        if self.exists() {
            return Err(StorageError::AlreadyInitialized(self.wallet_path()));
        }

        let mut snapshot = Snapshot::new(wallet, height)?;
        self.save(&mut snapshot)?;
        Ok(snapshot)
    }

    /// Save the snapshot to disk, refreshing its checksum and timestamp
    pub fn save(&self, snapshot: &mut Snapshot) -> Result<(), StorageError> {
        snapshot.refresh()?;
        let path = self.wallet_path();

        // Write to temporary file first
        let temp_path = self.temp_path();
        if let Err(e) = write_synced(&temp_path, snapshot) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }

        // Atomic rename, only once the temp file is fully on disk
        fs::rename(&temp_path, &path)?;

        log::debug!("Wallet saved to {:?} at height {}", path, snapshot.height);
        Ok(())
    }

    /// Load and verify the snapshot
    pub fn load(&self) -> Result<Snapshot, StorageError> {
        let path = self.wallet_path();

        if !path.exists() {
            return Err(StorageError::NotInitialized(path));
        }

        load_from_file(&path)
    }
}

/// Serialize, flush and fsync a snapshot to `path`
fn write_synced(path: &Path, snapshot: &Snapshot) -> Result<(), StorageError> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);

    serde_json::to_writer_pretty(&mut writer, snapshot)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// Load and verify a snapshot from a specific file path
pub fn load_from_file(path: &Path) -> Result<Snapshot, StorageError> {
    let file = fs::File::open(path)?;
    let reader = BufReader::new(file);
    let snapshot: Snapshot = serde_json::from_reader(reader)?;
    snapshot.verify()?;
    Ok(snapshot)
}
