//! SQLite sink implementation
//!
//! The upsert is issued as writes only, in three steps, so classification
//! falls out of the engine's own change counts:
//!
//! 1. A conditional UPDATE guarded by `column IS NOT ?` for every mutable
//!    column; it changes the row exactly when something differs (updated).
//! 2. Otherwise an audit-touch UPDATE of `updated_at` alone; it matches the
//!    row without changing data (unchanged, write still issued).
//! 3. Otherwise an INSERT (inserted).
//!
//! `IS NOT` is SQLite's null-safe inequality, so a NULL-to-value transition
//! counts as a difference like any other.

use crate::records::LdmCandidate;
use crate::sink::schema::initialize_schema;
use crate::sink::traits::{Sink, SinkError, SinkResult, UpsertSpec, WriteOutcome};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;

/// SQLite sink backend
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens (or creates) the database file and initializes the schema
    pub fn new(path: &Path) -> SinkResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Creates an in-memory database (for tests)
    pub fn new_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Read access to the underlying connection (for tests and ad-hoc
    /// inspection)
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn now_text() -> String {
        Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl Sink for SqliteSink {
    fn upsert(&mut self, spec: &UpsertSpec) -> SinkResult<WriteOutcome> {
        let now = Self::now_text();

        let set_clause = spec
            .columns
            .iter()
            .map(|(name, _)| format!("{} = ?", name))
            .collect::<Vec<_>>()
            .join(", ");
        // IS, not =: a nullable key column (inbound STA) must still match
        let key_clause = spec
            .key
            .iter()
            .map(|(name, _)| format!("{} IS ?", name))
            .collect::<Vec<_>>()
            .join(" AND ");
        let diff_clause = spec
            .columns
            .iter()
            .map(|(name, _)| format!("{} IS NOT ?", name))
            .collect::<Vec<_>>()
            .join(" OR ");

        // Step 1: update only when a mutable column actually differs
        let update_sql = format!(
            "UPDATE {} SET {}, updated_at = ? WHERE {} AND ({})",
            spec.table, set_clause, key_clause, diff_clause
        );
        let mut update_params: Vec<Value> =
            spec.columns.iter().map(|(_, v)| v.clone()).collect();
        update_params.push(Value::Text(now.clone()));
        update_params.extend(spec.key.iter().map(|(_, v)| v.clone()));
        update_params.extend(spec.columns.iter().map(|(_, v)| v.clone()));

        let changed = self
            .conn
            .execute(&update_sql, params_from_iter(update_params))
            .map_err(map_sqlite_error)?;
        if changed > 0 {
            return Ok(WriteOutcome {
                matched: changed as u64,
                changed: changed as u64,
                generated_id: None,
            });
        }

        // Step 2: audit touch, the row may exist with identical data
        let touch_sql = format!(
            "UPDATE {} SET updated_at = ? WHERE {}",
            spec.table, key_clause
        );
        let mut touch_params: Vec<Value> = vec![Value::Text(now.clone())];
        touch_params.extend(spec.key.iter().map(|(_, v)| v.clone()));

        let matched = self
            .conn
            .execute(&touch_sql, params_from_iter(touch_params))
            .map_err(map_sqlite_error)?;
        if matched > 0 {
            return Ok(WriteOutcome {
                matched: matched as u64,
                changed: 0,
                generated_id: None,
            });
        }

        // Step 3: no row carries the key, insert
        let mut names: Vec<&str> = spec.key.iter().map(|(name, _)| *name).collect();
        names.extend(spec.columns.iter().map(|(name, _)| *name));
        names.push("updated_at");
        let placeholders = vec!["?"; names.len()].join(", ");
        let insert_sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            spec.table,
            names.join(", "),
            placeholders
        );
        let mut insert_params: Vec<Value> = spec.key.iter().map(|(_, v)| v.clone()).collect();
        insert_params.extend(spec.columns.iter().map(|(_, v)| v.clone()));
        insert_params.push(Value::Text(now));

        self.conn
            .execute(&insert_sql, params_from_iter(insert_params))
            .map_err(map_sqlite_error)?;

        Ok(WriteOutcome {
            matched: 0,
            changed: 1,
            generated_id: Some(self.conn.last_insert_rowid()),
        })
    }

    fn begin_transaction(&mut self) -> SinkResult<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> SinkResult<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> SinkResult<()> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn pending_ldm_candidates(
        &self,
        window_days: i64,
        now: NaiveDateTime,
    ) -> SinkResult<Vec<LdmCandidate>> {
        let cutoff = (now - chrono::Duration::days(window_days))
            .date()
            .format("%Y-%m-%d")
            .to_string();

        let mut stmt = self.conn.prepare(
            "SELECT flight, date, origin, destination FROM movement_log
             WHERE ldm_obtained = 0 AND atd IS NOT NULL AND date >= ?1
             ORDER BY date, flight",
        )?;

        let candidates = stmt
            .query_map(params![cutoff], |row| {
                let date_text: String = row.get(1)?;
                let date = NaiveDate::parse_from_str(&date_text, "%Y-%m-%d").map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
                })?;
                Ok(LdmCandidate {
                    flight: row.get(0)?,
                    date,
                    origin: row.get(2)?,
                    destination: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(candidates)
    }

    fn mark_ldm_obtained(&mut self, flight: &str, date: NaiveDate) -> SinkResult<()> {
        self.conn.execute(
            "UPDATE movement_log SET ldm_obtained = 1, updated_at = ?1
             WHERE flight = ?2 AND date = ?3",
            params![
                Self::now_text(),
                flight,
                date.format("%Y-%m-%d").to_string()
            ],
        )?;
        Ok(())
    }
}

/// Maps constraint violations to their own variant so reconcilers can log
/// them distinctly from connection-level failures
fn map_sqlite_error(err: rusqlite::Error) -> SinkError {
    match &err {
        rusqlite::Error::SqliteFailure(e, message)
            if e.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            SinkError::ConstraintViolation(
                message.clone().unwrap_or_else(|| e.to_string()),
            )
        }
        _ => SinkError::Sqlite(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::traits::{date_value, text_value};

    fn arrival_spec<'a>(status: &str, stand: &str) -> UpsertSpec<'a> {
        UpsertSpec {
            table: "flight_arrivals",
            key: vec![
                ("flight", text_value("AB123")),
                ("date", date_value(NaiveDate::from_ymd_opt(2025, 1, 16).unwrap())),
            ],
            columns: vec![
                ("origin", text_value("OSL")),
                ("ac_reg", text_value("LNABC")),
                ("status", text_value(status)),
                ("sta", text_value("2025-01-16 12:34:00")),
                ("stand", text_value(stand)),
                ("bag_transfer_status", text_value("OK")),
            ],
        }
    }

    #[test]
    fn upsert_classifies_insert_then_unchanged_then_update() {
        let mut sink = SqliteSink::new_in_memory().unwrap();

        let first = sink.upsert(&arrival_spec("LND", "12")).unwrap();
        assert_eq!(first.matched, 0);
        assert_eq!(first.changed, 1);
        assert!(first.generated_id.is_some());

        let second = sink.upsert(&arrival_spec("LND", "12")).unwrap();
        assert_eq!(second.matched, 1);
        assert_eq!(second.changed, 0);
        assert_eq!(second.generated_id, None);

        let third = sink.upsert(&arrival_spec("LND", "14")).unwrap();
        assert_eq!(third.matched, 1);
        assert_eq!(third.changed, 1);
    }

    #[test]
    fn unchanged_upsert_still_advances_audit_timestamp() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        sink.upsert(&arrival_spec("LND", "12")).unwrap();

        sink.connection()
            .execute(
                "UPDATE flight_arrivals SET updated_at = '2000-01-01 00:00:00'",
                [],
            )
            .unwrap();

        sink.upsert(&arrival_spec("LND", "12")).unwrap();
        let updated_at: String = sink
            .connection()
            .query_row("SELECT updated_at FROM flight_arrivals", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_ne!(updated_at, "2000-01-01 00:00:00");
    }

    #[test]
    fn null_to_value_transition_counts_as_update() {
        let mut sink = SqliteSink::new_in_memory().unwrap();

        let mut spec = arrival_spec("LND", "12");
        spec.columns.push(("eta", Value::Null));
        sink.upsert(&spec).unwrap();

        let mut spec = arrival_spec("LND", "12");
        spec.columns
            .push(("eta", text_value("2025-01-16 12:40:00")));
        let outcome = sink.upsert(&spec).unwrap();
        assert_eq!(outcome.matched, 1);
        assert_eq!(outcome.changed, 1);
    }

    #[test]
    fn rollback_discards_writes() {
        let mut sink = SqliteSink::new_in_memory().unwrap();

        sink.begin_transaction().unwrap();
        sink.upsert(&arrival_spec("LND", "12")).unwrap();
        sink.rollback().unwrap();

        let count: i64 = sink
            .connection()
            .query_row("SELECT COUNT(*) FROM flight_arrivals", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn ldm_candidates_require_departure_and_recency() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 1, 16)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        let insert = "INSERT INTO movement_log
            (flight, date, origin, destination, ac_reg, atd, ldm_obtained, updated_at)
            VALUES (?1, ?2, 'OSL', 'CPH', 'LNABC', ?3, ?4, '2025-01-16 00:00:00')";

        // Departed, recent, pending: eligible
        sink.connection()
            .execute(
                insert,
                params!["AB100", "2025-01-15", "2025-01-15 10:00:00", 0],
            )
            .unwrap();
        // Not departed yet
        sink.connection()
            .execute(insert, params!["AB200", "2025-01-16", Value::Null, 0])
            .unwrap();
        // Too old
        sink.connection()
            .execute(
                insert,
                params!["AB300", "2025-01-10", "2025-01-10 10:00:00", 0],
            )
            .unwrap();
        // Already obtained
        sink.connection()
            .execute(
                insert,
                params!["AB400", "2025-01-15", "2025-01-15 10:00:00", 1],
            )
            .unwrap();

        let candidates = sink.pending_ldm_candidates(2, now).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].flight, "AB100");
    }

    #[test]
    fn mark_ldm_obtained_is_monotonic() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        let now = NaiveDate::from_ymd_opt(2025, 1, 16)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();

        sink.connection()
            .execute(
                "INSERT INTO movement_log
                 (flight, date, origin, destination, ac_reg, atd, updated_at)
                 VALUES ('AB100', '2025-01-15', 'OSL', 'CPH', 'LNABC',
                         '2025-01-15 10:00:00', '2025-01-16 00:00:00')",
                [],
            )
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        sink.mark_ldm_obtained("AB100", date).unwrap();
        assert!(sink.pending_ldm_candidates(2, now).unwrap().is_empty());

        // Marking again is a no-op, never a revert
        sink.mark_ldm_obtained("AB100", date).unwrap();
        assert!(sink.pending_ldm_candidates(2, now).unwrap().is_empty());
    }
}
