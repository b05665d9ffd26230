//! # warden-storage
//!
//! Storage abstraction layer for warden.
//!
//! A column-family key/value interface with atomic batches, backed by
//! RocksDB (feature `rocksdb`, on by default) or by an in-process map.

#![warn(clippy::all)]

pub mod column_families;
pub mod errors;
pub mod memory_impl;
#[cfg(feature = "rocksdb")]
pub mod rocksdb_impl;
pub mod traits;

pub use column_families::*;
pub use errors::{Result, StorageError};
pub use memory_impl::MemoryStorage;
#[cfg(feature = "rocksdb")]
pub use rocksdb_impl::RocksDbStorage;
pub use traits::{Batch, BatchExt, Storage};
