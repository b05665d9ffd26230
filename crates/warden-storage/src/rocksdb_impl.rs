//! RocksDB storage implementation.

use crate::{
    column_families::all_column_families,
    errors::{Result, StorageError},
    traits::{deserialize_value, serialize_key, serialize_value, Batch, Storage},
};
use async_trait::async_trait;
use rocksdb::{Options, WriteBatch, DB};
use serde::{de::DeserializeOwned, Serialize};
use std::{path::Path, sync::Arc};
use tracing::debug;

/// RocksDB storage implementation
pub struct RocksDbStorage {
    db: Arc<DB>,
    /// Keeps the directory of a test database alive as long as the handle
    _temp_dir: Option<tempfile::TempDir>,
}

impl RocksDbStorage {
    /// Open RocksDB database at the specified path
    ///
    /// Creates all required column families if they don't exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let db = DB::open_cf(&opts, &path, all_column_families())
            .map_err(|e| StorageError::Database(e.to_string()))?;

        debug!("Opened RocksDB at {:?}", path.as_ref());

        Ok(Self {
            db: Arc::new(db),
            _temp_dir: None,
        })
    }

    /// Open a RocksDB database in a fresh temporary directory
    ///
    /// The directory is removed when the storage is dropped.
    pub fn open_test() -> Result<Self> {
        let temp_dir = tempfile::TempDir::new().map_err(StorageError::IoError)?;
        let mut storage = Self::open(temp_dir.path())?;
        storage._temp_dir = Some(temp_dir);
        Ok(storage)
    }

    /// Get column family handle
    fn cf_handle(&self, cf: &str) -> Result<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))
    }
}

#[async_trait]
impl Storage for RocksDbStorage {
    async fn get<K, V>(&self, cf: &str, key: &K) -> Result<Option<V>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let cf_handle = self.cf_handle(cf)?;
        let key_bytes = serialize_key(key)?;

        let result = self
            .db
            .get_cf(cf_handle, &key_bytes)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        match result {
            Some(bytes) => {
                let value = deserialize_value(&bytes)?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn put<K, V>(&self, cf: &str, key: &K, value: &V) -> Result<()>
    where
        K: Serialize + Send + Sync,
        V: Serialize + Send + Sync,
    {
        let cf_handle = self.cf_handle(cf)?;
        let key_bytes = serialize_key(key)?;
        let value_bytes = serialize_value(value)?;

        self.db
            .put_cf(cf_handle, &key_bytes, &value_bytes)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete<K>(&self, cf: &str, key: &K) -> Result<()>
    where
        K: Serialize + Send + Sync,
    {
        let cf_handle = self.cf_handle(cf)?;
        let key_bytes = serialize_key(key)?;

        self.db
            .delete_cf(cf_handle, &key_bytes)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(())
    }

    async fn exists<K>(&self, cf: &str, key: &K) -> Result<bool>
    where
        K: Serialize + Send + Sync,
    {
        let cf_handle = self.cf_handle(cf)?;
        let key_bytes = serialize_key(key)?;

        let result = self
            .db
            .get_pinned_cf(cf_handle, &key_bytes)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        Ok(result.is_some())
    }

    async fn get_by_prefix<K, V>(&self, cf: &str, prefix: &K) -> Result<Vec<(Vec<u8>, V)>>
    where
        K: Serialize + Send + Sync,
        V: DeserializeOwned,
    {
        let cf_handle = self.cf_handle(cf)?;
        let prefix_bytes = serialize_key(prefix)?;

        let mut results = Vec::new();

        // Seek to the prefix; works without a prefix extractor configured
        let iter = self.db.iterator_cf(
            cf_handle,
            rocksdb::IteratorMode::From(&prefix_bytes, rocksdb::Direction::Forward),
        );

        for item in iter {
            let (key, value) = item.map_err(|e| StorageError::Database(e.to_string()))?;

            if key.starts_with(&prefix_bytes) {
                let deserialized_value = deserialize_value(&value)?;
                results.push((key.to_vec(), deserialized_value));
            } else {
                // Keys are sorted, so once we're past the prefix, we're done
                break;
            }
        }

        Ok(results)
    }

    async fn scan_all<V>(&self, cf: &str) -> Result<Vec<(Vec<u8>, V)>>
    where
        V: DeserializeOwned,
    {
        let cf_handle = self.cf_handle(cf)?;

        let mut results = Vec::new();
        let iter = self.db.iterator_cf(cf_handle, rocksdb::IteratorMode::Start);

        for item in iter {
            let (key, value) = item.map_err(|e| StorageError::Database(e.to_string()))?;
            let deserialized_value = deserialize_value(&value)?;
            results.push((key.to_vec(), deserialized_value));
        }

        Ok(results)
    }

    fn batch(&self) -> Box<dyn Batch> {
        Box::new(RocksDbBatch {
            db: Arc::clone(&self.db),
            write_batch: WriteBatch::default(),
            ops: 0,
        })
    }
}

/// RocksDB batch implementation
pub struct RocksDbBatch {
    db: Arc<DB>,
    write_batch: WriteBatch,
    ops: usize,
}

#[async_trait]
impl Batch for RocksDbBatch {
    fn put_raw(&mut self, cf: &str, key: Vec<u8>, value: Vec<u8>) -> Result<()> {
        let cf_handle = self
            .db
            .cf_handle(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))?;

        self.write_batch.put_cf(cf_handle, &key, &value);
        self.ops += 1;

        Ok(())
    }

    fn delete_raw(&mut self, cf: &str, key: Vec<u8>) -> Result<()> {
        let cf_handle = self
            .db
            .cf_handle(cf)
            .ok_or_else(|| StorageError::InvalidColumnFamily(cf.to_string()))?;

        self.write_batch.delete_cf(cf_handle, &key);
        self.ops += 1;

        Ok(())
    }

    fn len(&self) -> usize {
        self.ops
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let ops = self.ops;
        self.db
            .write(self.write_batch)
            .map_err(|e| StorageError::Database(e.to_string()))?;

        debug!(ops, "Batch committed successfully");
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        // WriteBatch is dropped, no commit
        debug!("Batch rolled back");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{traits::BatchExt, CF_USERS, CF_USERS_BY_EMAIL};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
    struct TestRecord {
        owner: String,
        name: String,
        created_at: u64,
    }

    fn record(owner: &str, name: &str) -> TestRecord {
        TestRecord {
            owner: owner.to_string(),
            name: name.to_string(),
            created_at: 42,
        }
    }

    fn key(r: &TestRecord) -> (String, String) {
        (r.owner.clone(), r.name.clone())
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let storage = RocksDbStorage::open_test().unwrap();
        let data = record("acme", "alice");

        storage.put(CF_USERS, &key(&data), &data).await.unwrap();

        let result: Option<TestRecord> = storage.get(CF_USERS, &key(&data)).await.unwrap();
        assert_eq!(result, Some(data));
    }

    #[tokio::test]
    async fn test_get_nonexistent() {
        let storage = RocksDbStorage::open_test().unwrap();

        let result: Option<TestRecord> = storage
            .get(CF_USERS, &("acme".to_string(), "nobody".to_string()))
            .await
            .unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_exists_and_delete() {
        let storage = RocksDbStorage::open_test().unwrap();
        let data = record("acme", "alice");

        assert!(!storage.exists(CF_USERS, &key(&data)).await.unwrap());
        storage.put(CF_USERS, &key(&data), &data).await.unwrap();
        assert!(storage.exists(CF_USERS, &key(&data)).await.unwrap());

        storage.delete(CF_USERS, &key(&data)).await.unwrap();
        assert!(!storage.exists(CF_USERS, &key(&data)).await.unwrap());
    }

    #[tokio::test]
    async fn test_batch_commit_spans_column_families() {
        let storage = RocksDbStorage::open_test().unwrap();
        let data = record("acme", "alice");
        let index_key = ("acme".to_string(), "alice@acme.io".to_string(), "alice".to_string());

        let mut batch = storage.batch();
        batch.put(CF_USERS, &key(&data), &data).unwrap();
        batch.put(CF_USERS_BY_EMAIL, &index_key, &data.name).unwrap();
        assert_eq!(batch.len(), 2);
        batch.commit().await.unwrap();

        let user: Option<TestRecord> = storage.get(CF_USERS, &key(&data)).await.unwrap();
        let name: Option<String> = storage.get(CF_USERS_BY_EMAIL, &index_key).await.unwrap();
        assert_eq!(user, Some(data));
        assert_eq!(name.as_deref(), Some("alice"));
    }

    #[tokio::test]
    async fn test_batch_rollback() {
        let storage = RocksDbStorage::open_test().unwrap();
        let data = record("acme", "alice");

        let mut batch = storage.batch();
        batch.put(CF_USERS, &key(&data), &data).unwrap();
        batch.rollback();

        let result: Option<TestRecord> = storage.get(CF_USERS, &key(&data)).await.unwrap();
        assert_eq!(result, None);
    }

    #[tokio::test]
    async fn test_get_by_prefix() {
        let storage = RocksDbStorage::open_test().unwrap();

        for r in [
            record("acme", "alice"),
            record("acme", "bob"),
            record("acme-labs", "carol"),
            record("globex", "dave"),
        ] {
            storage.put(CF_USERS, &key(&r), &r).await.unwrap();
        }

        let results: Vec<(Vec<u8>, TestRecord)> = storage
            .get_by_prefix(CF_USERS, &"acme".to_string())
            .await
            .unwrap();

        let names: Vec<_> = results.into_iter().map(|(_, r)| r.name).collect();
        assert_eq!(names, vec!["alice", "bob"]);

        let all: Vec<(Vec<u8>, TestRecord)> = storage.scan_all(CF_USERS).await.unwrap();
        assert_eq!(all.len(), 4);
    }

    #[tokio::test]
    async fn test_unknown_column_family() {
        let storage = RocksDbStorage::open_test().unwrap();
        let result: Result<Option<TestRecord>> = storage.get("sessions", &"x".to_string()).await;
        assert!(matches!(result, Err(StorageError::InvalidColumnFamily(_))));
    }
}
