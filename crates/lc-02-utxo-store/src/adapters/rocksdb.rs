//! # RocksDB Backend
//!
//! ## Column Families
//!
//! - `utxos` - `outpoint key (36 bytes)` → bincode `Utxo`
//! - `utxo_owners` - `owner (20 bytes) ++ outpoint key` → empty
//!
//! Outpoint keys are `tx_id ++ index_be`, so byte order matches `OutPoint`
//! order and a forward scan yields entries already sorted.

use crate::domain::entities::Utxo;
use crate::domain::errors::UtxoError;
use crate::ports::backend::UtxoBackend;
use rocksdb::{
    ColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch,
    WriteOptions, DB,
};
use shared_types::{Address, OutPoint};
use std::path::Path;

pub const CF_UTXOS: &str = "utxos";
pub const CF_OWNERS: &str = "utxo_owners";

const COLUMN_FAMILIES: &[&str] = &[CF_UTXOS, CF_OWNERS];

/// On-disk UTXO backend.
pub struct RocksDbBackend {
    db: DB,
    sync_writes: bool,
}

impl RocksDbBackend {
    /// Open or create a database at `path`.
    pub fn open(path: impl AsRef<Path>, sync_writes: bool) -> Result<Self, UtxoError> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_compression_type(rocksdb::DBCompressionType::Snappy);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(rocksdb::DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)
            .map_err(|e| UtxoError::Backend(format!("Failed to open RocksDB: {}", e)))?;

        tracing::info!(path = %path.as_ref().display(), "opened RocksDB UTXO backend");
        Ok(Self { db, sync_writes })
    }

    fn cf(&self, name: &'static str) -> Result<&ColumnFamily, UtxoError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| UtxoError::Backend(format!("missing column family {}", name)))
    }

    fn write(&self, batch: WriteBatch) -> Result<(), UtxoError> {
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.sync_writes);
        self.db
            .write_opt(batch, &write_opts)
            .map_err(|e| UtxoError::Backend(format!("RocksDB batch write failed: {}", e)))
    }

    fn owner_key(owner: &Address, outpoint: &OutPoint) -> Vec<u8> {
        let mut key = Vec::with_capacity(20 + 36);
        key.extend_from_slice(owner.as_bytes());
        key.extend_from_slice(&outpoint.to_key_bytes());
        key
    }

    fn decode(key: &[u8], value: &[u8]) -> Result<Utxo, UtxoError> {
        bincode::deserialize(value).map_err(|e| UtxoError::CorruptEntry {
            key: hex_key(key),
            message: e.to_string(),
        })
    }

    fn encode(utxo: &Utxo) -> Result<Vec<u8>, UtxoError> {
        bincode::serialize(utxo).map_err(|e| UtxoError::CorruptEntry {
            key: utxo.outpoint.to_string(),
            message: e.to_string(),
        })
    }

    fn scan_keys(&self, cf_name: &'static str) -> Result<Vec<Box<[u8]>>, UtxoError> {
        let cf = self.cf(cf_name)?;
        self.db
            .iterator_cf(cf, IteratorMode::Start)
            .map(|item| {
                item.map(|(key, _)| key)
                    .map_err(|e| UtxoError::Backend(format!("RocksDB scan failed: {}", e)))
            })
            .collect()
    }
}

impl UtxoBackend for RocksDbBackend {
    fn name(&self) -> &'static str {
        "rocksdb"
    }

    fn get(&self, outpoint: &OutPoint) -> Result<Option<Utxo>, UtxoError> {
        let key = outpoint.to_key_bytes();
        let value = self
            .db
            .get_cf(self.cf(CF_UTXOS)?, key)
            .map_err(|e| UtxoError::Backend(format!("RocksDB get failed: {}", e)))?;
        value.map(|bytes| Self::decode(&key, &bytes)).transpose()
    }

    fn put(&mut self, utxo: &Utxo) -> Result<(), UtxoError> {
        let previous = self.get(&utxo.outpoint)?;
        let utxos = self.cf(CF_UTXOS)?;
        let owners = self.cf(CF_OWNERS)?;

        let mut batch = WriteBatch::default();
        if let Some(previous) = previous.filter(|p| p.owner != utxo.owner) {
            batch.delete_cf(owners, Self::owner_key(&previous.owner, &previous.outpoint));
        }
        batch.put_cf(utxos, utxo.outpoint.to_key_bytes(), Self::encode(utxo)?);
        batch.put_cf(owners, Self::owner_key(&utxo.owner, &utxo.outpoint), b"");
        self.write(batch)
    }

    fn owned_by(&self, owner: &Address) -> Result<Vec<Utxo>, UtxoError> {
        let owners = self.cf(CF_OWNERS)?;
        let prefix: &[u8] = owner.as_bytes();
        let mut result = Vec::new();

        let iter = self
            .db
            .iterator_cf(owners, IteratorMode::From(prefix, Direction::Forward));
        for item in iter {
            let (key, _) =
                item.map_err(|e| UtxoError::Backend(format!("RocksDB scan failed: {}", e)))?;
            if !key.starts_with(prefix) {
                break;
            }
            let outpoint_key = &key[prefix.len()..];
            let value = self
                .db
                .get_cf(self.cf(CF_UTXOS)?, outpoint_key)
                .map_err(|e| UtxoError::Backend(format!("RocksDB get failed: {}", e)))?;
            match value {
                Some(bytes) => result.push(Self::decode(outpoint_key, &bytes)?),
                None => {
                    return Err(UtxoError::CorruptEntry {
                        key: hex_key(&key),
                        message: "owner index points at a missing entry".to_string(),
                    })
                }
            }
        }
        Ok(result)
    }

    fn all(&self) -> Result<Vec<Utxo>, UtxoError> {
        let utxos = self.cf(CF_UTXOS)?;
        self.db
            .iterator_cf(utxos, IteratorMode::Start)
            .map(|item| {
                let (key, value) =
                    item.map_err(|e| UtxoError::Backend(format!("RocksDB scan failed: {}", e)))?;
                Self::decode(&key, &value)
            })
            .collect()
    }

    fn replace_all(&mut self, entries: &[Utxo]) -> Result<(), UtxoError> {
        let stale_utxos = self.scan_keys(CF_UTXOS)?;
        let stale_owners = self.scan_keys(CF_OWNERS)?;
        let utxos = self.cf(CF_UTXOS)?;
        let owners = self.cf(CF_OWNERS)?;

        let mut batch = WriteBatch::default();
        for key in &stale_utxos {
            batch.delete_cf(utxos, key);
        }
        for key in &stale_owners {
            batch.delete_cf(owners, key);
        }
        for utxo in entries {
            batch.put_cf(utxos, utxo.outpoint.to_key_bytes(), Self::encode(utxo)?);
            batch.put_cf(owners, Self::owner_key(&utxo.owner, &utxo.outpoint), b"");
        }
        self.write(batch)
    }
}

fn hex_key(key: &[u8]) -> String {
    hex::encode(key)
}
