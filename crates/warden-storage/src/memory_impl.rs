//! In-process storage implementation.
//!
//! Column families are ordered maps over the same bincode key encoding the
//! RocksDB backend uses, so prefix scans and ordering behave identically.

use crate::{
    column_families::all_column_families,
    errors::{Result, StorageError},
    traits::{deserialize_value, serialize_key, serialize_value, Batch, Storage},
};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

type ColumnFamily = BTreeMap<Vec<u8>, Vec<u8>>;
type Tables = HashMap<String, ColumnFamily>;

/// In-memory storage implementation
#[derive(Clone)]
pub struct MemoryStorage {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStorage {
    /// Create an empty store with every known column family
    pub fn new() -> Self {
        let tables = all_column_families()
            .into_iter()
            .map(|cf| (cf.to_string(), ColumnFamily::new()))
            .collect();
        Self {
            tables: Arc::new(RwLock::new(tables)),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StorageError::Database("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StorageError::Database("memory store lock poisoned".to_string()))
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

fn table<'a>(tables: &'a Tables, cf: &str) -> Result<&'a ColumnFamily> {
    tables
        .get(cf)
        .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))
}

fn table_mut<'a>(tables: &'a mut Tables, cf: &str) -> Result<&'a mut ColumnFamily> {
    tables
        .get_mut(cf)
        .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn get<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let key_bytes = serialize_key(key)?;
        let tables = self.read()?;
        match table(&tables, cf)?.get(&key_bytes) {
            Some(bytes) => Ok(Some(deserialize_value(bytes)?)),
            None => Ok(None),
        }
    }

    async fn put<K, V>(&self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;
        let value_bytes = serialize_value(value)?;
        let mut tables = self.write()?;
        table_mut(&mut tables, cf)?.insert(key_bytes, value_bytes);
        Ok(())
    }

    async fn delete<K>(&self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;
        let mut tables = self.write()?;
        table_mut(&mut tables, cf)?.remove(&key_bytes);
        Ok(())
    }

    async fn exists<K>(&self, cf: &str, key: &K) -> Result<bool>
    where
        K: Serialize + Send + Sync,
    {
        let key_bytes = serialize_key(key)?;
        let tables = self.read()?;
        Ok(table(&tables, cf)?.contains_key(&key_bytes))
    }

    async fn get_by_prefix<K, V>(&self, cf: &str, prefix: &K) -> Result<Vec<(Vec<u8>, V)>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let prefix_bytes = serialize_key(prefix)?;
        let tables = self.read()?;

        let mut results = Vec::new();
        for (key, value) in table(&tables, cf)?.range(prefix_bytes.clone()..) {
            if !key.starts_with(&prefix_bytes) {
                break;
            }
            results.push((key.clone(), deserialize_value(value)?));
        }

        Ok(results)
    }

    async fn scan_all<V>(&self, cf: &str) -> Result<Vec<(Vec<u8>, V)>>
    where
        V: DeserializeOwned,
    {
        let tables = self.read()?;

        let mut results = Vec::new();
        for (key, value) in table(&tables, cf)? {
            results.push((key.clone(), deserialize_value(value)?));
        }

        Ok(results)
    }

    fn batch(&self) -> Box<dyn Batch> {
        Box::new(MemoryBatch {
            storage: self.clone(),
            ops: Vec::new(),
        })
    }
}

enum BatchOp {
    Put {
        cf: String,
        key: Vec<u8>,
        value: Vec<u8>,
    },
    Delete {
        cf: String,
        key: Vec<u8>,
    },
}

/// In-memory batch implementation
///
/// Operations are staged and applied under a single write lock on commit.
pub struct MemoryBatch {
    storage: MemoryStorage,
    ops: Vec<BatchOp>,
}

impl MemoryBatch {
    fn check_cf(&self, cf: &str) -> Result<()> {
        let tables = self.storage.read()?;
        table(&tables, cf).map(|_| ())
    }
}

#[async_trait]
impl Batch for MemoryBatch {
    fn put_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        self.check_cf(cf)?;
        self.ops.push(BatchOp::Put {
            cf: cf.to_string(),
            key,
            value,
        });
        Ok(())
    }

    fn delete_raw(&mut self, cf: &str, key: Vec<u8>) -> Result<()> {
        self.check_cf(cf)?;
        self.ops.push(BatchOp::Delete {
            cf: cf.to_string(),
            key,
        });
        Ok(())
    }

    fn len(&self) -> usize {
        self.ops.len()
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryBatch { storage, ops } = *self;
        let count = ops.len();
        let mut tables = storage.write()?;
        for op in ops {
            match op {
                BatchOp::Put { cf, key, value } => {
                    table_mut(&mut tables, &cf)?.insert(key, value);
                }
                BatchOp::Delete { cf, key } => {
                    table_mut(&mut tables, &cf)?.remove(&key);
                }
            }
        }

        debug!(ops = count, "Batch committed successfully");
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        debug!("Batch rolled back");
    }
}
