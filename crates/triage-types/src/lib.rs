//! Common types module for the order triage system.
//!
//! This module defines the core data types and structures shared across
//! triage components. It provides a centralized location for the order
//! document model, actor identities, API shapes, and configuration
//! validation to ensure consistency across all services.

/// Actor identities resolved at the service boundary.
pub mod actor;
/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// Order documents, statuses, and the reassignment handshake record.
pub mod order;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Storage collection names for persistent data.
pub mod storage;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

// Re-export all types for convenient access
pub use actor::*;
pub use api::*;
pub use order::*;
pub use registry::*;
pub use storage::*;
pub use validation::*;
