//! File-based storage backend implementation for the triage service.
//!
//! This module provides a filesystem implementation of the StorageInterface
//! trait. Each document is stored as a JSON file under a directory named
//! after its collection, so a namespace scan is a plain directory listing.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use triage_types::{ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError};

/// File-based storage implementation.
///
/// Documents live at `<base>/<namespace>/<id>.json`. Writes go through a
/// temporary file followed by a rename, so readers never observe a partial
/// document. All mutations are serialized through a mutex, which makes the
/// compare-and-swap sound for a single process; concurrent processes
/// sharing a directory are not coordinated.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
	/// Serializes mutations so conditional writes cannot interleave.
	write_lock: Mutex<()>,
}

impl FileStorage {
	/// Creates a new FileStorage instance rooted at the specified base path.
	pub fn new(base_path: PathBuf) -> Self {
		Self {
			base_path,
			write_lock: Mutex::new(()),
		}
	}

	/// Converts a storage key to a filesystem path.
	///
	/// Keys must have the form `namespace:id`; both parts are sanitized to
	/// be filesystem-safe.
	fn file_path(&self, key: &str) -> Result<PathBuf, StorageError> {
		let (namespace, id) = key
			.split_once(':')
			.ok_or_else(|| StorageError::Backend(format!("Key '{}' has no namespace", key)))?;
		let safe_namespace = namespace.replace(['/', ':'], "_");
		let safe_id = id.replace(['/', ':'], "_");
		Ok(self
			.base_path
			.join(safe_namespace)
			.join(format!("{}.json", safe_id)))
	}

	/// Reads the current bytes for a key, if the file exists.
	async fn read_current(&self, path: &PathBuf) -> Result<Option<Vec<u8>>, StorageError> {
		match fs::read(path).await {
			Ok(data) => Ok(Some(data)),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	/// Writes bytes atomically by writing to a temp file then renaming.
	async fn write_atomic(&self, path: &PathBuf, value: Vec<u8>) -> Result<(), StorageError> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.file_path(key)?;
		match self.read_current(&path).await? {
			Some(data) => Ok(data),
			None => Err(StorageError::NotFound),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.file_path(key)?;
		let _guard = self.write_lock.lock().await;
		self.write_atomic(&path, value).await
	}

	async fn compare_and_swap_bytes(
		&self,
		key: &str,
		expected: &[u8],
		value: Vec<u8>,
	) -> Result<bool, StorageError> {
		let path = self.file_path(key)?;
		let _guard = self.write_lock.lock().await;

		match self.read_current(&path).await? {
			Some(current) if current == expected => {
				self.write_atomic(&path, value).await?;
				Ok(true)
			},
			_ => Ok(false),
		}
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.file_path(key)?;
		let _guard = self.write_lock.lock().await;

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		let path = self.file_path(key)?;
		Ok(path.exists())
	}

	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let (namespace, id_prefix) = prefix
			.split_once(':')
			.ok_or_else(|| StorageError::Backend(format!("Prefix '{}' has no namespace", prefix)))?;
		let dir = self.base_path.join(namespace.replace(['/', ':'], "_"));

		let mut keys = Vec::new();
		let mut entries = match fs::read_dir(&dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(keys),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new("json")) {
				continue;
			}
			match path.file_stem().and_then(|s| s.to_str()) {
				Some(stem) if stem.starts_with(id_prefix) => {
					keys.push(format!("{}:{}", namespace, stem));
				},
				Some(_) => {},
				None => {
					tracing::debug!("Skipping file {:?}: non-UTF-8 name", path);
				},
			}
		}
		Ok(keys)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("storage_path", FieldType::String).with_validator(|value| {
					match value.as_str() {
						Some(path) if !path.trim().is_empty() => Ok(()),
						_ => Err("storage_path must not be empty".to_string()),
					}
				}),
			],
			vec![],
		);

		schema.validate(config)
	}
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

/// Factory function to create a file storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for document files (required)
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.ok_or_else(|| {
			StorageError::Configuration("file storage requires a storage_path".to_string())
		})?
		.to_string();

	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn storage_in(dir: &tempfile::TempDir) -> FileStorage {
		FileStorage::new(dir.path().to_path_buf())
	}

	#[tokio::test]
	async fn test_basic_operations() {
		let dir = tempfile::tempdir().unwrap();
		let storage = storage_in(&dir);

		let key = "orders:abc";
		let value = b"test_value".to_vec();
		storage.set_bytes(key, value.clone()).await.unwrap();

		let retrieved = storage.get_bytes(key).await.unwrap();
		assert_eq!(retrieved, value);
		assert!(storage.exists(key).await.unwrap());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));

		// Deleting again is fine
		storage.delete(key).await.unwrap();
	}

	#[tokio::test]
	async fn test_persists_across_instances() {
		let dir = tempfile::tempdir().unwrap();

		{
			let storage = storage_in(&dir);
			storage
				.set_bytes("orders:1", b"persisted".to_vec())
				.await
				.unwrap();
		}

		let storage = storage_in(&dir);
		let retrieved = storage.get_bytes("orders:1").await.unwrap();
		assert_eq!(retrieved, b"persisted");
	}

	#[tokio::test]
	async fn test_compare_and_swap() {
		let dir = tempfile::tempdir().unwrap();
		let storage = storage_in(&dir);

		let key = "orders:cas";
		storage.set_bytes(key, b"v1".to_vec()).await.unwrap();

		let swapped = storage
			.compare_and_swap_bytes(key, b"v1", b"v2".to_vec())
			.await
			.unwrap();
		assert!(swapped);

		let swapped = storage
			.compare_and_swap_bytes(key, b"v1", b"v3".to_vec())
			.await
			.unwrap();
		assert!(!swapped);
		assert_eq!(storage.get_bytes(key).await.unwrap(), b"v2");
	}

	#[tokio::test]
	async fn test_list_keys_by_namespace() {
		let dir = tempfile::tempdir().unwrap();
		let storage = storage_in(&dir);

		storage.set_bytes("orders:1", b"a".to_vec()).await.unwrap();
		storage.set_bytes("orders:2", b"b".to_vec()).await.unwrap();
		storage
			.set_bytes("sessions:1", b"c".to_vec())
			.await
			.unwrap();

		let mut keys = storage.list_keys("orders:").await.unwrap();
		keys.sort();
		assert_eq!(keys, vec!["orders:1".to_string(), "orders:2".to_string()]);

		// A namespace that was never written is just empty
		let keys = storage.list_keys("missing:").await.unwrap();
		assert!(keys.is_empty());
	}

	#[tokio::test]
	async fn test_rejects_unnamespaced_keys() {
		let dir = tempfile::tempdir().unwrap();
		let storage = storage_in(&dir);

		let result = storage.set_bytes("no-namespace", b"x".to_vec()).await;
		assert!(matches!(result, Err(StorageError::Backend(_))));
	}

	#[test]
	fn test_config_requires_storage_path() {
		let schema = FileStorageSchema;

		let config: toml::Value = toml::from_str("storage_path = \"./data\"").unwrap();
		schema.validate(&config).unwrap();

		let missing: toml::Value = toml::from_str("").unwrap();
		let err = schema.validate(&missing).unwrap_err();
		assert!(matches!(err, ValidationError::MissingField(f) if f == "storage_path"));

		let blank: toml::Value = toml::from_str("storage_path = \" \"").unwrap();
		let err = schema.validate(&blank).unwrap_err();
		assert!(matches!(
			err,
			ValidationError::InvalidValue { field, .. } if field == "storage_path"
		));
	}

	#[test]
	fn test_factory_requires_storage_path() {
		let empty: toml::Value = toml::from_str("").unwrap();
		let result = create_storage(&empty);
		assert!(matches!(result, Err(StorageError::Configuration(_))));

		let config: toml::Value = toml::from_str("storage_path = \"./data\"").unwrap();
		assert!(create_storage(&config).is_ok());
	}
}
