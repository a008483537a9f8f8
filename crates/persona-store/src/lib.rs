//! Persona Store — durable ledger snapshots, configuration, and logging setup.

pub mod config;
pub mod logging;
pub mod storage;

pub use config::{LedgerConfig, LogFormat, LoggingConfig, StorageConfig};
pub use storage::LedgerStore;
