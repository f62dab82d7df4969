//! Sink trait and error types
//!
//! The sink is the system of record. Its one non-negotiable contract is the
//! upsert: classification (inserted / updated / unchanged) must be derivable
//! from the engine's own write-outcome signal (rows matched vs rows actually
//! changed), never from a read-before-write, which would race under
//! concurrent cycles.

use crate::records::LdmCandidate;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use thiserror::Error;

/// Errors that can occur during sink operations
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// One idempotent insert-or-update request
///
/// `key` columns form the natural key the sink enforces uniqueness on;
/// `columns` are the mutable attributes compared and written.
pub struct UpsertSpec<'a> {
    pub table: &'a str,
    pub key: Vec<(&'a str, Value)>,
    pub columns: Vec<(&'a str, Value)>,
}

/// The sink's write-outcome signal for one upsert
///
/// - `matched`: rows that already carried the key (0 or 1 under a unique
///   natural key)
/// - `changed`: rows whose mutable columns actually changed
/// - `generated_id`: surrogate row id when the write was an insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    pub matched: u64,
    pub changed: u64,
    pub generated_id: Option<i64>,
}

/// Trait for sink backend implementations
///
/// Transactions are explicit: the arrivals reconciler wraps a whole cycle in
/// begin/commit/rollback; independent-keyed writers call `upsert` bare, each
/// statement its own atomic unit.
pub trait Sink {
    /// Performs one insert-or-update and reports the write-outcome signal
    ///
    /// Even when nothing differs, a write is still issued so the row's audit
    /// timestamp advances; that write reports `changed: 0`.
    fn upsert(&mut self, spec: &UpsertSpec) -> SinkResult<WriteOutcome>;

    /// Opens a transaction; all upserts until commit/rollback are one unit
    fn begin_transaction(&mut self) -> SinkResult<()>;

    /// Commits the open transaction
    fn commit(&mut self) -> SinkResult<()>;

    /// Rolls back the open transaction
    fn rollback(&mut self) -> SinkResult<()>;

    /// Movements eligible for LDM capture: departed (actual departure time
    /// present), within the recency window, and not yet obtained
    fn pending_ldm_candidates(
        &self,
        window_days: i64,
        now: NaiveDateTime,
    ) -> SinkResult<Vec<LdmCandidate>>;

    /// Sets the owning movement's obtained flag; monotonic, never cleared
    fn mark_ldm_obtained(&mut self, flight: &str, date: NaiveDate) -> SinkResult<()>;
}

/// Canonical TEXT rendering of a datetime column
pub fn datetime_value(value: Option<NaiveDateTime>) -> Value {
    match value {
        Some(dt) => Value::Text(dt.format("%Y-%m-%d %H:%M:%S").to_string()),
        None => Value::Null,
    }
}

/// Canonical TEXT rendering of a date column
pub fn date_value(value: NaiveDate) -> Value {
    Value::Text(value.format("%Y-%m-%d").to_string())
}

/// TEXT column from a string slice
pub fn text_value(value: &str) -> Value {
    Value::Text(value.to_string())
}

/// Nullable TEXT column
pub fn opt_text_value(value: Option<&str>) -> Value {
    match value {
        Some(s) => Value::Text(s.to_string()),
        None => Value::Null,
    }
}

/// Nullable INTEGER column
pub fn opt_int_value(value: Option<i32>) -> Value {
    match value {
        Some(n) => Value::Integer(n as i64),
        None => Value::Null,
    }
}
