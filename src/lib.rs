//! Flightline: a session-backed incremental sync pipeline for flight ops data
//!
//! This crate repeatedly extracts operational flight data (arrivals, transfer
//! manifests, load-data messages, movement logs) from a legacy web portal and
//! reconciles it into a relational store with idempotent, classify-on-write
//! upserts, so downstream reporting always reflects the portal's latest state.

pub mod config;
pub mod extract;
pub mod normalize;
pub mod pipeline;
pub mod records;
pub mod reconcile;
pub mod session;
pub mod sink;

use thiserror::Error;

/// Main error type for Flightline operations
#[derive(Debug, Error)]
pub enum FlightlineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Session error: {0}")]
    Session(#[from] session::SessionError),

    #[error("Extraction error: {0}")]
    Extract(#[from] extract::ExtractError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),

    #[error("Invalid value for {var}: {message}")]
    InvalidValue { var: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Flightline operations
pub type Result<T> = std::result::Result<T, FlightlineError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use pipeline::{CyclePhase, CycleScheduler, Job};
pub use records::{FlightRecord, LoadMessage, MovementEntry, TransferManifestEntry};
pub use reconcile::{CycleStats, UpsertClass};
pub use session::{SessionDriver, WaitOutcome};
pub use sink::{Sink, WriteOutcome};
