//! RocksDB storage backend for the Persona ledger.

use anyhow::Result;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;

use persona_core::Address;
use persona_protocol::{EventRecord, Ledger, LedgerSnapshot};

use crate::config::LedgerConfig;

/// Column family names for different data types.
const CF_WORLD: &str = "world";
const CF_EVENTS: &str = "events";
const CF_META: &str = "meta";

const KEY_SNAPSHOT: &[u8] = b"snapshot";
const KEY_SEQUENCE: &[u8] = b"sequence";
const KEY_EVENT_COUNT: &[u8] = b"event_count";

/// RocksDB-backed storage for ledger snapshots and the committed event log.
pub struct LedgerStore {
    db: DB,
}

impl LedgerStore {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path) -> Result<Self> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_WORLD, Options::default()),
            ColumnFamilyDescriptor::new(CF_EVENTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;

        Ok(Self { db })
    }

    /// Open the store configured in `config` and load its ledger, deploying a
    /// fresh one from `deployer` if the store is empty.
    pub fn open_or_deploy(config: &LedgerConfig, deployer: Address) -> Result<(Self, Ledger)> {
        let store = Self::open(&config.storage.data_dir)?;
        let ledger = match store.load_ledger()? {
            Some(ledger) => {
                tracing::info!(
                    path = %config.storage.data_dir.display(),
                    "ledger restored from storage"
                );
                ledger
            }
            None => {
                let ledger = Ledger::deploy(deployer, &config.registry)?;
                store.save_ledger(&ledger)?;
                ledger
            }
        };
        Ok((store, ledger))
    }

    fn cf(&self, cf_name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(cf_name)
            .ok_or_else(|| anyhow::anyhow!("column family '{}' not found", cf_name))
    }

    fn read_u64(&self, key: &[u8]) -> Result<Option<u64>> {
        let Some(bytes) = self.db.get_cf(self.cf(CF_META)?, key)? else {
            return Ok(None);
        };
        let array: [u8; 8] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| anyhow::anyhow!("corrupt meta value for {:?}", key))?;
        Ok(Some(u64::from_be_bytes(array)))
    }

    /// Sequence number of the last saved snapshot.
    pub fn stored_sequence(&self) -> Result<Option<u64>> {
        self.read_u64(KEY_SEQUENCE)
    }

    /// Number of events persisted so far.
    pub fn stored_event_count(&self) -> Result<u64> {
        Ok(self.read_u64(KEY_EVENT_COUNT)?.unwrap_or(0))
    }

    /// Persist a snapshot. Only events not yet stored are written; the world
    /// state, new events and counters go in a single write batch. A snapshot
    /// behind the stored one, by sequence or by event count, is refused.
    pub fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        if let Some(stored_sequence) = self.stored_sequence()? {
            if snapshot.sequence < stored_sequence {
                anyhow::bail!(
                    "snapshot at sequence {} is older than stored sequence {}",
                    snapshot.sequence,
                    stored_sequence
                );
            }
        }
        let stored_events = self.stored_event_count()?;
        let total_events = snapshot.events.len() as u64;
        if total_events < stored_events {
            anyhow::bail!(
                "snapshot has {} events but the store already holds {}",
                total_events,
                stored_events
            );
        }

        let cf_world = self.cf(CF_WORLD)?;
        let cf_events = self.cf(CF_EVENTS)?;
        let cf_meta = self.cf(CF_META)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(cf_world, KEY_SNAPSHOT, serde_json::to_vec(&snapshot.world)?);
        for (position, record) in snapshot
            .events
            .iter()
            .enumerate()
            .skip(stored_events as usize)
        {
            batch.put_cf(
                cf_events,
                (position as u64).to_be_bytes(),
                serde_json::to_vec(record)?,
            );
        }
        batch.put_cf(cf_meta, KEY_SEQUENCE, snapshot.sequence.to_be_bytes());
        batch.put_cf(cf_meta, KEY_EVENT_COUNT, total_events.to_be_bytes());
        self.db.write(batch)?;

        tracing::debug!(
            sequence = snapshot.sequence,
            new_events = total_events - stored_events,
            "ledger snapshot saved"
        );
        Ok(())
    }

    /// Persist the current state of `ledger`.
    pub fn save_ledger(&self, ledger: &Ledger) -> Result<()> {
        let snapshot = ledger.snapshot()?;
        self.save(&snapshot)
    }

    /// Load the last saved snapshot, if any.
    pub fn load(&self) -> Result<Option<LedgerSnapshot>> {
        let Some(world_bytes) = self.db.get_cf(self.cf(CF_WORLD)?, KEY_SNAPSHOT)? else {
            return Ok(None);
        };
        let world = serde_json::from_slice(&world_bytes)?;
        let sequence = self
            .stored_sequence()?
            .ok_or_else(|| anyhow::anyhow!("world snapshot present without sequence"))?;

        let mut events: Vec<EventRecord> = Vec::new();
        for item in self.db.iterator_cf(self.cf(CF_EVENTS)?, IteratorMode::Start) {
            let (_, value) = item?;
            events.push(serde_json::from_slice(&value)?);
        }

        Ok(Some(LedgerSnapshot {
            sequence,
            world,
            events,
        }))
    }

    /// Load the last saved ledger, if any.
    pub fn load_ledger(&self) -> Result<Option<Ledger>> {
        Ok(self.load()?.map(Ledger::restore))
    }
}
