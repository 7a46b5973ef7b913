//! Registry trait for self-registering implementations.
//!
//! Backend modules expose a Registry struct implementing this trait so that
//! the service binary can assemble name-to-factory maps without hardcoding
//! every implementation at each call site.

/// Base trait for implementation registries.
///
/// Each implementation module must provide a Registry struct that implements
/// this trait, declaring its configuration name and factory function.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation.
	///
	/// This should match the key used in the TOML configuration, for example
	/// "memory" for `storage.implementations.memory`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
