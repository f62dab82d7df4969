//! Configuration module for Flightline
//!
//! Configuration is read from the process environment; there is no
//! configuration file surface beyond an optional `.env` loaded at startup.

mod env;
mod types;

// Re-export types
pub use types::{Config, PipelineConfig, PortalConfig, SinkConfig};

// Re-export loader functions
pub use env::{load_from_env, validate};
