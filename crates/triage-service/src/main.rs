//! Main entry point for the order triage service.
//!
//! This binary wires the configured storage backend into the triage state
//! machine and serves the HTTP API that the customer portal and the admin
//! dashboard speak.

use clap::Parser;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use triage_config::Config;
use triage_core::TriageService;
use triage_storage::{StorageFactory, StorageService};

mod apis;
mod server;

/// Command-line arguments for the triage service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

/// Main entry point for the triage service.
///
/// This function:
/// 1. Parses command-line arguments
/// 2. Initializes logging infrastructure
/// 3. Loads configuration from file
/// 4. Builds the storage backend and triage engine
/// 5. Serves the HTTP API until interrupted
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	// Initialize tracing with env filter
	use tracing_subscriber::{fmt, EnvFilter};

	// Create env filter with default from args
	let default_directive = args.log_level.to_string();
	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started triage service");

	// Load configuration
	let config = Config::from_file(&args.config.to_string_lossy()).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let storage = build_storage(&config)?;
	let triage = Arc::new(TriageService::new(Arc::new(storage)));

	// Serve until interrupted
	tokio::select! {
		result = server::start_server(config, triage) => {
			tracing::info!("API server finished");
			result?;
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Stopped triage service");
	Ok(())
}

/// Builds the storage service from the configured primary backend.
///
/// Backends self-register through the storage crate; the primary backend
/// named in configuration is constructed by its factory and its settings
/// are validated against the backend's own schema.
fn build_storage(config: &Config) -> Result<StorageService, Box<dyn std::error::Error>> {
	let factories: HashMap<String, StorageFactory> = triage_storage::get_all_implementations()
		.into_iter()
		.map(|(name, factory)| (name.to_string(), factory))
		.collect();

	let primary = config.storage.primary.as_str();
	let factory = factories
		.get(primary)
		.ok_or_else(|| format!("Unknown storage backend: {}", primary))?;
	let backend_config = config
		.storage
		.implementations
		.get(primary)
		.ok_or_else(|| format!("Missing configuration for storage backend: {}", primary))?;

	let backend = factory(backend_config)?;
	backend.config_schema().validate(backend_config)?;

	tracing::info!(
		component = "storage",
		implementation = %primary,
		"Loaded storage backend"
	);

	Ok(StorageService::new(backend))
}
