// Freedom Tracker - Core Library
// Profile store, wallet reconciliation, freedom score and backups.
// Exposes all modules for use in the CLI and tests.

pub mod error;            // Error taxonomy
pub mod config;           // Layered configuration (defaults → toml → env)
pub mod entities;         // BankAccount, Asset, Income, Obligation, Debt, Desire, Settings
pub mod snapshot;         // Whole-profile unit of persistence and backup
pub mod persistence;      // SQLite / in-memory snapshot storage + audit events
pub mod reconciliation;   // Synced-asset merge and wallet cleanup
pub mod sync;             // Wallet data provider fan-out + static price table
pub mod freedom;          // Freedom score calculator (pure)
pub mod backup;           // Versioned JSON backup codec
pub mod encrypted_backup; // Wallet-signature encrypted remote backups
pub mod store;            // Profile store (single source of truth)

// Re-export commonly used types
pub use error::{ErrorKind, Result, TrackerError};
pub use config::{ConfigError, TrackerConfig};
pub use entities::{
    Asset, AssetCategory, AssetDetails, CryptoHolding, DefiPosition,
    BankAccount, BankAccountPatch, BankAccountType,
    Income, IncomeSource,
    Debt, Desire, Frequency, Obligation,
    Settings,
};
pub use snapshot::{ProfileSnapshot, SCHEMA_VERSION};
pub use persistence::{MemoryPersistence, SnapshotPersistence, SqlitePersistence, StoreEvent};
pub use reconciliation::{AssetReconciler, MergeOutcome};
pub use sync::{
    PriceEntry, PriceTable, StaticWalletProvider, TokenAccountRecord,
    WalletDataProvider, WalletSynchronizer,
};
pub use freedom::{FreedomCalculator, FreedomPolicy, FreedomReport, FreedomState};
pub use backup::{export_backup, import_backup, parse_backup, BackupDocument};
pub use encrypted_backup::{
    BackupPhase, BlobStore, EncryptedBackupService, MemoryBlobStore, Signer,
};
pub use store::{ProfileStore, SyncSummary, WalletConnection};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
