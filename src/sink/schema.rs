//! Database schema definitions
//!
//! Natural-key uniqueness is enforced here, not in application code: every
//! table carries a UNIQUE constraint over its business key, and the surrogate
//! id exists only because the engine wants one.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Arrivals scraped from the live transfer-info view
CREATE TABLE IF NOT EXISTS flight_arrivals (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    flight TEXT NOT NULL,
    date TEXT NOT NULL,
    origin TEXT NOT NULL,
    ac_reg TEXT NOT NULL,
    status TEXT NOT NULL,
    sta TEXT,
    eta TEXT,
    ata TEXT,
    stand TEXT NOT NULL,
    bag_transfer_status TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(flight, date)
);

-- Onward connections nested under an inbound arrival; the parent reference
-- is the inbound composite natural key, not a surrogate id
CREATE TABLE IF NOT EXISTS transfer_manifest (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    outbound_flight TEXT NOT NULL,
    destination TEXT NOT NULL,
    ac_reg TEXT NOT NULL,
    status TEXT NOT NULL,
    total_bags INTEGER NOT NULL DEFAULT 0,
    std_etd TEXT NOT NULL,
    connection_estimate TEXT NOT NULL,
    gate TEXT NOT NULL,
    stand TEXT NOT NULL,
    inbound_flight TEXT NOT NULL,
    inbound_ac_reg TEXT NOT NULL,
    inbound_sta TEXT,
    updated_at TEXT NOT NULL,
    UNIQUE(outbound_flight, inbound_flight, inbound_ac_reg, inbound_sta)
);

CREATE INDEX IF NOT EXISTS idx_transfer_inbound
    ON transfer_manifest(inbound_flight, inbound_ac_reg);

-- Bulk movement log rows; the LDM obtained flag lives on the owning movement
CREATE TABLE IF NOT EXISTS movement_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    flight TEXT NOT NULL,
    date TEXT NOT NULL,
    origin TEXT NOT NULL,
    destination TEXT NOT NULL,
    ac_reg TEXT NOT NULL,
    std TEXT,
    etd TEXT,
    atd TEXT,
    takeoff TEXT,
    touchdown TEXT,
    sta TEXT,
    eta TEXT,
    ata TEXT,
    dep_delay INTEGER,
    arr_delay INTEGER,
    taxi_out INTEGER,
    taxi_in INTEGER,
    delay_codes TEXT NOT NULL DEFAULT '',
    cancelled INTEGER NOT NULL DEFAULT 0,
    ldm_obtained INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL,
    UNIQUE(flight, date)
);

CREATE INDEX IF NOT EXISTS idx_movement_ldm_pending
    ON movement_log(ldm_obtained, date);

-- Captured load messages, one per flight occurrence
CREATE TABLE IF NOT EXISTS ldm_messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    unique_id TEXT NOT NULL,
    flight_id TEXT NOT NULL,
    flight_date TEXT NOT NULL,
    origin TEXT NOT NULL,
    destination TEXT NOT NULL,
    ldm_text TEXT,
    obtained INTEGER NOT NULL DEFAULT 0,
    obtained_at TEXT,
    updated_at TEXT NOT NULL,
    UNIQUE(unique_id)
);
"#;

/// Initializes the database schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn schema_initializes() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();
        assert!(initialize_schema(&conn).is_ok());
    }

    #[test]
    fn tables_exist_after_init() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        for table in [
            "flight_arrivals",
            "transfer_manifest",
            "movement_log",
            "ldm_messages",
        ] {
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 1, "Table {} should exist", table);
        }
    }

    #[test]
    fn natural_keys_are_unique() {
        let conn = Connection::open_in_memory().unwrap();
        initialize_schema(&conn).unwrap();

        conn.execute(
            "INSERT INTO flight_arrivals
             (flight, date, origin, ac_reg, status, stand, bag_transfer_status, updated_at)
             VALUES ('AB123', '2025-01-16', 'OSL', 'LNABC', 'LND', '12', 'OK', '2025-01-16 12:00:00')",
            [],
        )
        .unwrap();

        let duplicate = conn.execute(
            "INSERT INTO flight_arrivals
             (flight, date, origin, ac_reg, status, stand, bag_transfer_status, updated_at)
             VALUES ('AB123', '2025-01-16', 'BGO', 'LNXYZ', 'SKD', '14', '', '2025-01-16 13:00:00')",
            [],
        );
        assert!(duplicate.is_err());
    }
}
