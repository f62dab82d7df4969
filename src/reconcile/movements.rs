//! Movement-log reconciliation
//!
//! Movement rows are independently keyed, so the batch runs without a
//! transaction: one bad row is logged and counted as failed while the rest
//! of the export still lands. The LDM obtained flag is owned by the LDM
//! reconciler and is never written from here.

use crate::records::MovementEntry;
use crate::reconcile::{CycleStats, UpsertClass};
use crate::sink::{
    date_value, datetime_value, opt_int_value, text_value, Sink, SinkResult, UpsertSpec,
};
use rusqlite::types::Value;
use tracing::{debug, info, warn};

/// Reconciles one bulk export into the sink, record by record
pub fn reconcile_movements<S: Sink>(
    sink: &mut S,
    entries: &[MovementEntry],
) -> SinkResult<CycleStats> {
    let mut stats = CycleStats::new();

    for entry in entries {
        match sink.upsert(&movement_spec(entry)) {
            Ok(outcome) => {
                let class = UpsertClass::from_outcome(&outcome);
                debug!("Movement {}: {}", entry.key(), class);
                stats.record(class);
            }
            Err(err) => {
                warn!("Movement {} failed to reconcile: {}", entry.key(), err);
                stats.record_failure();
            }
        }
    }

    info!("Movements reconciled: {}", stats);
    Ok(stats)
}

fn movement_spec(entry: &MovementEntry) -> UpsertSpec<'static> {
    UpsertSpec {
        table: "movement_log",
        key: vec![
            ("flight", text_value(&entry.flight)),
            ("date", date_value(entry.date)),
        ],
        columns: vec![
            ("origin", text_value(&entry.origin)),
            ("destination", text_value(&entry.destination)),
            ("ac_reg", text_value(&entry.ac_reg)),
            ("std", datetime_value(entry.std)),
            ("etd", datetime_value(entry.etd)),
            ("atd", datetime_value(entry.atd)),
            ("takeoff", datetime_value(entry.takeoff)),
            ("touchdown", datetime_value(entry.touchdown)),
            ("sta", datetime_value(entry.sta)),
            ("eta", datetime_value(entry.eta)),
            ("ata", datetime_value(entry.ata)),
            ("dep_delay", opt_int_value(entry.dep_delay)),
            ("arr_delay", opt_int_value(entry.arr_delay)),
            ("taxi_out", opt_int_value(entry.taxi_out)),
            ("taxi_in", opt_int_value(entry.taxi_in)),
            ("delay_codes", text_value(&entry.delay_codes)),
            ("cancelled", Value::Integer(entry.cancelled as i64)),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::SqliteSink;
    use chrono::NaiveDate;

    fn entry(flight: &str) -> MovementEntry {
        let date = NaiveDate::from_ymd_opt(2025, 1, 16).unwrap();
        MovementEntry {
            flight: flight.to_string(),
            date,
            origin: "OSL".to_string(),
            destination: "CPH".to_string(),
            ac_reg: "LNABC".to_string(),
            std: date.and_hms_opt(9, 0, 0),
            etd: date.and_hms_opt(9, 10, 0),
            atd: date.and_hms_opt(9, 15, 0),
            takeoff: None,
            touchdown: None,
            sta: date.and_hms_opt(10, 10, 0),
            eta: None,
            ata: None,
            dep_delay: Some(15),
            arr_delay: None,
            taxi_out: Some(10),
            taxi_in: None,
            delay_codes: "93".to_string(),
            cancelled: false,
        }
    }

    #[test]
    fn repeated_export_is_unchanged() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        let batch = vec![entry("AB123"), entry("CD456")];

        let first = reconcile_movements(&mut sink, &batch).unwrap();
        assert_eq!(first.inserted, 2);

        let second = reconcile_movements(&mut sink, &batch).unwrap();
        assert_eq!(second.unchanged, 2);
        assert_eq!(second.failed, 0);
    }

    #[test]
    fn one_bad_row_does_not_stop_the_batch() {
        let mut sink = SqliteSink::new_in_memory().unwrap();

        sink.connection()
            .execute_batch(
                "CREATE TRIGGER reject_cd BEFORE INSERT ON movement_log
                 WHEN NEW.flight = 'CD456'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let batch = vec![entry("AB123"), entry("CD456"), entry("EF789")];
        let stats = reconcile_movements(&mut sink, &batch).unwrap();

        assert_eq!(stats.inserted, 2);
        assert_eq!(stats.failed, 1);

        let count: i64 = sink
            .connection()
            .query_row("SELECT COUNT(*) FROM movement_log", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn reconciling_does_not_touch_the_ldm_flag() {
        let mut sink = SqliteSink::new_in_memory().unwrap();
        reconcile_movements(&mut sink, &[entry("AB123")]).unwrap();

        sink.connection()
            .execute(
                "UPDATE movement_log SET ldm_obtained = 1 WHERE flight = 'AB123'",
                [],
            )
            .unwrap();

        // A later export cycle must leave the flag alone
        let mut changed = entry("AB123");
        changed.eta = NaiveDate::from_ymd_opt(2025, 1, 16)
            .unwrap()
            .and_hms_opt(10, 20, 0);
        reconcile_movements(&mut sink, &[changed]).unwrap();

        let flag: i64 = sink
            .connection()
            .query_row(
                "SELECT ldm_obtained FROM movement_log WHERE flight = 'AB123'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(flag, 1);
    }
}
