//! In-memory storage backend implementation for the triage service.
//!
//! This module provides a memory-based implementation of the StorageInterface
//! trait, useful for testing and development scenarios where persistence is
//! not required.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use triage_types::{ConfigSchema, ImplementationRegistry, Schema, ValidationError};

/// In-memory storage implementation.
///
/// This implementation stores data in a HashMap in memory, providing fast
/// access but no persistence across restarts. Conditional writes are
/// serialized by the write lock, so compare-and-swap is atomic.
pub struct MemoryStorage {
	/// The in-memory store protected by a read-write lock.
	store: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
	/// Creates a new MemoryStorage instance.
	pub fn new() -> Self {
		Self {
			store: Arc::new(RwLock::new(HashMap::new())),
		}
	}
}

impl Default for MemoryStorage {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl StorageInterface for MemoryStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let store = self.store.read().await;
		store.get(key).cloned().ok_or(StorageError::NotFound)
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.insert(key.to_string(), value);
		Ok(())
	}

	async fn compare_and_swap_bytes(
		&self,
		key: &str,
		expected: &[u8],
		value: Vec<u8>,
	) -> Result<bool, StorageError> {
		let mut store = self.store.write().await;
		match store.get(key) {
			Some(current) if current.as_slice() == expected => {
				store.insert(key.to_string(), value);
				Ok(true)
			},
			_ => Ok(false),
		}
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let mut store = self.store.write().await;
		store.remove(key);
		Ok(())
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let store = self.store.read().await;
		Ok(store.contains_key(key))
	}

	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let store = self.store.read().await;
		Ok(store
			.keys()
			.filter(|key| key.starts_with(prefix))
			.cloned()
			.collect())
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryStorageSchema)
	}
}

/// Configuration schema for MemoryStorage.
pub struct MemoryStorageSchema;

impl ConfigSchema for MemoryStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		// Memory storage has no required configuration
		let schema = Schema::new(vec![], vec![]);
		schema.validate(config)
	}
}

/// Registry for the memory storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

/// Factory function to create a memory storage backend from configuration.
///
/// Configuration parameters:
/// - None required for memory storage
pub fn create_storage(_config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	Ok(Box::new(MemoryStorage::new()))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_basic_operations() {
		let storage = MemoryStorage::new();

		// Test set and get
		let key = "test_key";
		let value = b"test_value".to_vec();
		storage.set_bytes(key, value.clone()).await.unwrap();

		let retrieved = storage.get_bytes(key).await.unwrap();
		assert_eq!(retrieved, value);

		// Test exists
		assert!(storage.exists(key).await.unwrap());

		// Test delete
		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());

		// Test get after delete
		let result = storage.get_bytes(key).await;
		assert!(matches!(result, Err(StorageError::NotFound)));
	}

	#[tokio::test]
	async fn test_overwrite() {
		let storage = MemoryStorage::new();

		let key = "overwrite_key";
		let value1 = b"value1".to_vec();
		let value2 = b"value2".to_vec();

		// Set initial value
		storage.set_bytes(key, value1.clone()).await.unwrap();
		let retrieved = storage.get_bytes(key).await.unwrap();
		assert_eq!(retrieved, value1);

		// Overwrite with new value
		storage.set_bytes(key, value2.clone()).await.unwrap();
		let retrieved = storage.get_bytes(key).await.unwrap();
		assert_eq!(retrieved, value2);
	}

	#[tokio::test]
	async fn test_compare_and_swap() {
		let storage = MemoryStorage::new();

		let key = "cas_key";
		storage.set_bytes(key, b"v1".to_vec()).await.unwrap();

		// Swap succeeds when the expected bytes match
		let swapped = storage
			.compare_and_swap_bytes(key, b"v1", b"v2".to_vec())
			.await
			.unwrap();
		assert!(swapped);
		assert_eq!(storage.get_bytes(key).await.unwrap(), b"v2");

		// Swap fails against stale expectations and leaves the value alone
		let swapped = storage
			.compare_and_swap_bytes(key, b"v1", b"v3".to_vec())
			.await
			.unwrap();
		assert!(!swapped);
		assert_eq!(storage.get_bytes(key).await.unwrap(), b"v2");

		// Swap fails when the key is gone
		storage.delete(key).await.unwrap();
		let swapped = storage
			.compare_and_swap_bytes(key, b"v2", b"v3".to_vec())
			.await
			.unwrap();
		assert!(!swapped);
	}

	#[tokio::test]
	async fn test_list_keys_by_prefix() {
		let storage = MemoryStorage::new();

		storage
			.set_bytes("orders:1", b"a".to_vec())
			.await
			.unwrap();
		storage
			.set_bytes("orders:2", b"b".to_vec())
			.await
			.unwrap();
		storage
			.set_bytes("sessions:1", b"c".to_vec())
			.await
			.unwrap();

		let mut keys = storage.list_keys("orders:").await.unwrap();
		keys.sort();
		assert_eq!(keys, vec!["orders:1".to_string(), "orders:2".to_string()]);

		let keys = storage.list_keys("missing:").await.unwrap();
		assert!(keys.is_empty());
	}
}
