//! Storage module for the order triage system.
//!
//! This module provides abstractions for persisting triage documents,
//! supporting different backend implementations such as in-memory or
//! file-based storage. Documents are addressed by collection and id, and
//! every state change is a single-document write; the conditional-write
//! primitive lets callers detect concurrent modification instead of
//! overwriting it.

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use triage_types::{ConfigSchema, ImplementationRegistry};

/// Re-export implementations
pub mod implementations {
	pub mod file;
	pub mod memory;
}

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
	/// Error that occurs when a requested item is not found.
	#[error("Not found")]
	NotFound,
	/// Error that occurs when a conditional write observes a concurrent change.
	#[error("Conflict")]
	Conflict,
	/// Error that occurs during serialization/deserialization.
	#[error("Serialization error: {0}")]
	Serialization(String),
	/// Error that occurs in the storage backend.
	#[error("Backend error: {0}")]
	Backend(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the low-level interface for storage backends.
///
/// This trait must be implemented by any storage backend that wants to
/// integrate with the triage system. It provides byte-level key-value
/// operations plus the enumeration and conditional-write primitives the
/// typed layer builds on.
#[async_trait]
pub trait StorageInterface: Send + Sync {
	/// Retrieves raw bytes for the given key.
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError>;

	/// Stores raw bytes under the given key, creating or overwriting.
	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

	/// Stores raw bytes only if the current value equals `expected`.
	///
	/// Returns false without writing when the stored bytes differ from
	/// `expected` or the key has been removed in the meantime.
	async fn compare_and_swap_bytes(
		&self,
		key: &str,
		expected: &[u8],
		value: Vec<u8>,
	) -> Result<bool, StorageError>;

	/// Deletes the value associated with the given key.
	///
	/// Deleting a missing key is not an error.
	async fn delete(&self, key: &str) -> Result<(), StorageError>;

	/// Checks if a key exists in storage.
	async fn exists(&self, key: &str) -> Result<bool, StorageError>;

	/// Lists all keys starting with the given prefix.
	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

	/// Returns the configuration schema for validation.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;
}

/// Type alias for storage factory functions.
///
/// This is the function signature that all storage implementations must
/// provide to create instances of their storage interface.
pub type StorageFactory = fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>;

/// Registry trait for storage implementations.
///
/// This trait extends the base ImplementationRegistry to specify that
/// storage implementations must provide a StorageFactory.
pub trait StorageRegistry: ImplementationRegistry<Factory = StorageFactory> {}

/// Get all registered storage implementations.
///
/// Returns a vector of (name, factory) tuples for all available storage
/// implementations, used by the service binary to build its factory map.
pub fn get_all_implementations() -> Vec<(&'static str, StorageFactory)> {
	use implementations::{file, memory};

	vec![
		(file::Registry::NAME, file::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// A deserialized document together with the exact bytes it was read from.
///
/// Produced by [`StorageService::retrieve_snapshot`] and consumed by
/// [`StorageService::update_guarded`], which refuses to overwrite a
/// document that changed after the snapshot was taken.
pub struct Snapshot<T> {
	/// The deserialized document.
	pub value: T,
	bytes: Vec<u8>,
}

/// High-level storage service that provides typed operations.
///
/// The StorageService wraps a low-level storage backend and provides
/// convenient methods for storing and retrieving typed documents with
/// automatic serialization/deserialization. Keys are formed from a
/// collection namespace and a document id.
pub struct StorageService {
	/// The underlying storage backend implementation.
	backend: Box<dyn StorageInterface>,
}

impl StorageService {
	/// Creates a new StorageService with the specified backend.
	pub fn new(backend: Box<dyn StorageInterface>) -> Self {
		Self { backend }
	}

	/// Stores a serializable document, creating or overwriting.
	///
	/// The namespace and id are combined to form a unique key.
	/// The data is serialized to JSON before storage.
	pub async fn store<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = format!("{}:{}", namespace, id);
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&key, bytes).await
	}

	/// Retrieves and deserializes a document from storage.
	///
	/// The namespace and id are combined to form the lookup key.
	/// The retrieved bytes are deserialized from JSON.
	pub async fn retrieve<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<T, StorageError> {
		let key = format!("{}:{}", namespace, id);
		let bytes = self.backend.get_bytes(&key).await?;
		serde_json::from_slice(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))
	}

	/// Retrieves a document along with the bytes backing it.
	///
	/// Use together with [`update_guarded`](Self::update_guarded) when the
	/// write must not clobber a concurrent change to the same document.
	pub async fn retrieve_snapshot<T: DeserializeOwned>(
		&self,
		namespace: &str,
		id: &str,
	) -> Result<Snapshot<T>, StorageError> {
		let key = format!("{}:{}", namespace, id);
		let bytes = self.backend.get_bytes(&key).await?;
		let value = serde_json::from_slice(&bytes)
			.map_err(|e| StorageError::Serialization(e.to_string()))?;
		Ok(Snapshot { value, bytes })
	}

	/// Retrieves and deserializes every document in a namespace.
	///
	/// Documents removed between the key scan and the read are skipped.
	pub async fn retrieve_all<T: DeserializeOwned>(
		&self,
		namespace: &str,
	) -> Result<Vec<T>, StorageError> {
		let prefix = format!("{}:", namespace);
		let keys = self.backend.list_keys(&prefix).await?;
		let mut items = Vec::with_capacity(keys.len());
		for key in keys {
			match self.backend.get_bytes(&key).await {
				Ok(bytes) => {
					let item = serde_json::from_slice(&bytes)
						.map_err(|e| StorageError::Serialization(e.to_string()))?;
					items.push(item);
				},
				Err(StorageError::NotFound) => continue,
				Err(e) => return Err(e),
			}
		}
		Ok(items)
	}

	/// Removes a document from storage.
	///
	/// The namespace and id are combined to form the key to delete.
	/// Removing a missing document is not an error.
	pub async fn remove(&self, namespace: &str, id: &str) -> Result<(), StorageError> {
		let key = format!("{}:{}", namespace, id);
		self.backend.delete(&key).await
	}

	/// Updates an existing document in storage.
	///
	/// This method first checks if the key exists, then updates the value.
	/// Returns an error if the key doesn't exist, making it semantically
	/// different from store() which will create or overwrite.
	pub async fn update<T: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		data: &T,
	) -> Result<(), StorageError> {
		let key = format!("{}:{}", namespace, id);

		// Check if the key exists first
		if !self.backend.exists(&key).await? {
			return Err(StorageError::NotFound);
		}

		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		self.backend.set_bytes(&key, bytes).await
	}

	/// Updates a document only if it still matches the given snapshot.
	///
	/// Fails with [`StorageError::Conflict`] when the stored bytes no
	/// longer equal the ones the snapshot was read from.
	pub async fn update_guarded<T, U: Serialize>(
		&self,
		namespace: &str,
		id: &str,
		seen: &Snapshot<T>,
		data: &U,
	) -> Result<(), StorageError> {
		let key = format!("{}:{}", namespace, id);
		let bytes =
			serde_json::to_vec(data).map_err(|e| StorageError::Serialization(e.to_string()))?;
		if self
			.backend
			.compare_and_swap_bytes(&key, &seen.bytes, bytes)
			.await?
		{
			Ok(())
		} else {
			Err(StorageError::Conflict)
		}
	}

	/// Checks if a document exists in storage.
	///
	/// The namespace and id are combined to form the lookup key.
	/// Returns true if the key exists, false otherwise.
	pub async fn exists(&self, namespace: &str, id: &str) -> Result<bool, StorageError> {
		let key = format!("{}:{}", namespace, id);
		self.backend.exists(&key).await
	}
}

#[cfg(test)]
mod tests {
	use super::implementations::memory::MemoryStorage;
	use super::*;
	use serde::Deserialize;

	#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
	struct Doc {
		id: String,
		note: String,
	}

	fn service() -> StorageService {
		StorageService::new(Box::new(MemoryStorage::new()))
	}

	fn doc(id: &str, note: &str) -> Doc {
		Doc {
			id: id.to_string(),
			note: note.to_string(),
		}
	}

	#[tokio::test]
	async fn store_and_retrieve_round_trip() {
		let storage = service();
		let d = doc("d1", "hello");
		storage.store("docs", &d.id, &d).await.unwrap();

		let back: Doc = storage.retrieve("docs", "d1").await.unwrap();
		assert_eq!(back, d);
		assert!(storage.exists("docs", "d1").await.unwrap());
	}

	#[tokio::test]
	async fn update_requires_existing_document() {
		let storage = service();
		let d = doc("d1", "hello");

		let result = storage.update("docs", "d1", &d).await;
		assert!(matches!(result, Err(StorageError::NotFound)));

		storage.store("docs", "d1", &d).await.unwrap();
		storage
			.update("docs", "d1", &doc("d1", "changed"))
			.await
			.unwrap();
		let back: Doc = storage.retrieve("docs", "d1").await.unwrap();
		assert_eq!(back.note, "changed");
	}

	#[tokio::test]
	async fn guarded_update_detects_concurrent_write() {
		let storage = service();
		storage.store("docs", "d1", &doc("d1", "v1")).await.unwrap();

		let seen = storage.retrieve_snapshot::<Doc>("docs", "d1").await.unwrap();
		assert_eq!(seen.value.note, "v1");

		// Another writer lands before the guarded update.
		storage.store("docs", "d1", &doc("d1", "v2")).await.unwrap();

		let result = storage
			.update_guarded("docs", "d1", &seen, &doc("d1", "stale"))
			.await;
		assert!(matches!(result, Err(StorageError::Conflict)));

		let back: Doc = storage.retrieve("docs", "d1").await.unwrap();
		assert_eq!(back.note, "v2");
	}

	#[tokio::test]
	async fn guarded_update_applies_when_unchanged() {
		let storage = service();
		storage.store("docs", "d1", &doc("d1", "v1")).await.unwrap();

		let seen = storage.retrieve_snapshot::<Doc>("docs", "d1").await.unwrap();
		storage
			.update_guarded("docs", "d1", &seen, &doc("d1", "v2"))
			.await
			.unwrap();

		let back: Doc = storage.retrieve("docs", "d1").await.unwrap();
		assert_eq!(back.note, "v2");
	}

	#[tokio::test]
	async fn retrieve_all_scans_one_namespace() {
		let storage = service();
		storage.store("docs", "d1", &doc("d1", "a")).await.unwrap();
		storage.store("docs", "d2", &doc("d2", "b")).await.unwrap();
		storage
			.store("other", "x1", &doc("x1", "elsewhere"))
			.await
			.unwrap();

		let mut all: Vec<Doc> = storage.retrieve_all("docs").await.unwrap();
		all.sort_by(|a, b| a.id.cmp(&b.id));
		assert_eq!(all.len(), 2);
		assert_eq!(all[0].id, "d1");
		assert_eq!(all[1].id, "d2");
	}

	#[tokio::test]
	async fn remove_is_idempotent() {
		let storage = service();
		storage.store("docs", "d1", &doc("d1", "a")).await.unwrap();
		storage.remove("docs", "d1").await.unwrap();
		storage.remove("docs", "d1").await.unwrap();
		assert!(!storage.exists("docs", "d1").await.unwrap());
	}
}
