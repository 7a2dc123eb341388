//! Storage module for wallet snapshots

pub mod persistence;

pub use persistence::{
    load_from_file, wallet_checksum, Snapshot, Storage, StorageConfig, StorageError,
    SNAPSHOT_VERSION,
};
