//! Relational sink
//!
//! This module defines the sink interface the reconcilers write through and
//! a SQLite implementation of it.

mod schema;
mod sqlite;
mod traits;

pub use schema::{initialize_schema, SCHEMA_SQL};
pub use sqlite::SqliteSink;
pub use traits::{
    date_value, datetime_value, opt_int_value, opt_text_value, text_value, Sink, SinkError,
    SinkResult, UpsertSpec, WriteOutcome,
};
