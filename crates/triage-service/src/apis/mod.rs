//! API implementations for the order triage service.
//!
//! Each submodule implements one endpoint family of the HTTP surface.

pub mod orders;
