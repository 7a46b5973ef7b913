//! Configuration module for the order triage system.
//!
//! This module provides structures and utilities for managing service
//! configuration. It supports loading configuration from TOML files,
//! resolving environment variable references, and validating that all
//! required configuration values are properly set.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Extract just the message without the huge input dump
		let message = err.message().to_string();
		ConfigError::Parse(message)
	}
}

/// Main configuration structure for the triage service.
///
/// This structure contains all configuration sections required for the
/// service to operate: service identity, the storage backend, and the HTTP
/// API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Configuration specific to this service instance.
	pub service: ServiceConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for the HTTP API server.
	#[serde(default)]
	pub api: ApiConfig,
}

/// Configuration specific to a service instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this service instance.
	pub id: String,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// Maximum request size in bytes.
	#[serde(default = "default_max_request_size")]
	pub max_request_size: usize,
}

impl Default for ApiConfig {
	fn default() -> Self {
		Self {
			host: default_api_host(),
			port: default_api_port(),
			timeout_seconds: default_api_timeout(),
			max_request_size: default_max_request_size(),
		}
	}
}

/// Returns the default API host.
///
/// This provides a default host address of 127.0.0.1 (localhost) for the
/// API server when no explicit host is configured.
fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

/// Returns the default API port.
///
/// This provides a default port of 3000 for the API server when no
/// explicit port is configured.
fn default_api_port() -> u16 {
	3000
}

/// Returns the default API timeout in seconds.
///
/// This provides a default timeout of 30 seconds for API requests when no
/// explicit timeout is configured.
fn default_api_timeout() -> u64 {
	30
}

/// Returns the default maximum request size in bytes.
///
/// This provides a default maximum request size of 1MB (1024 * 1024 bytes)
/// when no explicit limit is configured.
fn default_max_request_size() -> usize {
	1024 * 1024 // 1MB
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to prevent ReDoS attacks.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	// Limit input size to prevent ReDoS attacks
	const MAX_INPUT_SIZE: usize = 1024 * 1024; // 1MB
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = input.to_string();
	let mut replacements = Vec::new();

	for cap in re.captures_iter(input) {
		let full_match = cap.get(0).unwrap();
		let var_name = cap.get(1).unwrap().as_str();
		let default_value = cap.get(2).map(|m| m.as_str());

		let value = match std::env::var(var_name) {
			Ok(v) => v,
			Err(_) => {
				if let Some(default) = default_value {
					default.to_string()
				} else {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name
					)));
				}
			},
		};

		replacements.push((full_match.start(), full_match.end(), value));
	}

	// Apply replacements in reverse order to maintain positions
	for (start, end, value) in replacements.iter().rev() {
		result.replace_range(start..end, value);
	}

	Ok(result)
}

impl Config {
	/// Loads configuration from a file with environment variable resolution.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let content = tokio::fs::read_to_string(path).await?;
		content.parse()
	}

	/// Validates the configuration to ensure all required fields are properly set.
	///
	/// This method performs validation across all configuration sections:
	/// - Ensures the service ID is not empty
	/// - Validates that a primary storage backend is specified and configured
	/// - Checks the API server settings for unusable values
	fn validate(&self) -> Result<(), ConfigError> {
		// Validate service config
		if self.service.id.is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		// Validate storage config
		if self.storage.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one storage implementation must be configured".into(),
			));
		}
		if self.storage.primary.is_empty() {
			return Err(ConfigError::Validation(
				"Storage primary implementation cannot be empty".into(),
			));
		}
		if !self
			.storage
			.implementations
			.contains_key(&self.storage.primary)
		{
			return Err(ConfigError::Validation(format!(
				"Primary storage '{}' not found in implementations",
				self.storage.primary
			)));
		}

		// Validate API config
		if self.api.port == 0 {
			return Err(ConfigError::Validation(
				"API port must be greater than 0".into(),
			));
		}
		if self.api.timeout_seconds == 0 {
			return Err(ConfigError::Validation(
				"API timeout_seconds must be greater than 0".into(),
			));
		}
		if self.api.max_request_size == 0 {
			return Err(ConfigError::Validation(
				"API max_request_size must be greater than 0".into(),
			));
		}

		Ok(())
	}
}

/// Implementation of FromStr trait for Config to enable parsing from string.
///
/// This allows configuration to be parsed from TOML strings using the
/// standard string parsing interface. Environment variables are resolved
/// and the configuration is automatically validated after parsing.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	const BASE_CONFIG: &str = r#"
[service]
id = "ops-triage"

[storage]
primary = "memory"
[storage.implementations.memory]
"#;

	#[test]
	fn test_env_var_resolution() {
		// Set up test environment variables
		std::env::set_var("TEST_HOST", "localhost");
		std::env::set_var("TEST_PORT", "5432");

		let input = "host = \"${TEST_HOST}:${TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "host = \"localhost:5432\"");

		// Clean up
		std::env::remove_var("TEST_HOST");
		std::env::remove_var("TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${MISSING_VAR:-default_value}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"default_value\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let input = "value = \"${MISSING_VAR}\"";
		let result = resolve_env_vars(input);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("MISSING_VAR"));
	}

	#[test]
	fn test_config_with_env_vars() {
		std::env::set_var("TEST_TRIAGE_ID", "triage-test");

		let config_str = r#"
[service]
id = "${TEST_TRIAGE_ID}"

[storage]
primary = "file"
[storage.implementations.file]
storage_path = "${TEST_TRIAGE_DATA:-./data/triage}"

[api]
port = 8080
"#;

		let config: Config = config_str.parse().unwrap();
		assert_eq!(config.service.id, "triage-test");
		assert_eq!(config.api.port, 8080);
		let file_config = &config.storage.implementations["file"];
		assert_eq!(
			file_config.get("storage_path").and_then(|v| v.as_str()),
			Some("./data/triage")
		);

		std::env::remove_var("TEST_TRIAGE_ID");
	}

	#[test]
	fn test_api_defaults_applied() {
		let config: Config = BASE_CONFIG.parse().unwrap();
		assert_eq!(config.api.host, "127.0.0.1");
		assert_eq!(config.api.port, 3000);
		assert_eq!(config.api.timeout_seconds, 30);
		assert_eq!(config.api.max_request_size, 1024 * 1024);
	}

	#[test]
	fn test_empty_service_id_rejected() {
		let config_str = r#"
[service]
id = ""

[storage]
primary = "memory"
[storage.implementations.memory]
"#;

		let result = Config::from_str(config_str);
		assert!(result.is_err());
		assert!(result
			.unwrap_err()
			.to_string()
			.contains("Service ID cannot be empty"));
	}

	#[test]
	fn test_unknown_primary_storage_rejected() {
		let config_str = r#"
[service]
id = "ops-triage"

[storage]
primary = "redis"
[storage.implementations.memory]
"#;

		let result = Config::from_str(config_str);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("redis"));
	}

	#[test]
	fn test_zero_port_rejected() {
		let config_str = r#"
[service]
id = "ops-triage"

[storage]
primary = "memory"
[storage.implementations.memory]

[api]
port = 0
"#;

		let result = Config::from_str(config_str);
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("port"));
	}

	#[tokio::test]
	async fn test_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(BASE_CONFIG.as_bytes()).unwrap();

		let config = Config::from_file(file.path().to_str().unwrap())
			.await
			.unwrap();
		assert_eq!(config.service.id, "ops-triage");
		assert_eq!(config.storage.primary, "memory");
	}
}
