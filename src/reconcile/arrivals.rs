//! Arrivals reconciliation
//!
//! One extraction of the live view is reconciled as a single transaction:
//! parents and their nested manifest children land together or not at all. A
//! failure anywhere mid-batch rolls the whole cycle back and the next cycle
//! re-extracts from scratch.

use crate::records::{FlightRecord, TransferManifestEntry};
use crate::reconcile::{CycleStats, UpsertClass};
use crate::sink::{date_value, datetime_value, text_value, Sink, SinkResult, UpsertSpec};
use rusqlite::types::Value;
use tracing::{debug, info};

/// Reconciles one arrivals extraction into the sink, transactionally
pub fn reconcile_arrivals<S: Sink>(
    sink: &mut S,
    records: &[FlightRecord],
) -> SinkResult<CycleStats> {
    let mut stats = CycleStats::new();

    sink.begin_transaction()?;

    for record in records {
        match apply_flight(sink, record, &mut stats) {
            Ok(()) => {}
            Err(err) => {
                sink.rollback()?;
                return Err(err);
            }
        }
    }

    sink.commit()?;
    info!("Arrivals reconciled: {}", stats);
    Ok(stats)
}

fn apply_flight<S: Sink>(
    sink: &mut S,
    record: &FlightRecord,
    stats: &mut CycleStats,
) -> SinkResult<()> {
    let outcome = sink.upsert(&flight_spec(record))?;
    let class = UpsertClass::from_outcome(&outcome);
    debug!("Arrival {}: {}", record.key(), class);
    stats.record(class);

    for transfer in &record.transfers {
        let outcome = sink.upsert(&transfer_spec(record, transfer))?;
        let class = UpsertClass::from_outcome(&outcome);
        debug!(
            "Transfer {} under {}: {}",
            transfer.outbound_flight,
            record.key(),
            class
        );
        stats.record(class);
    }

    Ok(())
}

fn flight_spec(record: &FlightRecord) -> UpsertSpec<'static> {
    UpsertSpec {
        table: "flight_arrivals",
        key: vec![
            ("flight", text_value(&record.flight)),
            ("date", date_value(record.date)),
        ],
        columns: vec![
            ("origin", text_value(&record.origin)),
            ("ac_reg", text_value(&record.ac_reg)),
            ("status", text_value(&record.status)),
            ("sta", datetime_value(record.sta)),
            ("eta", datetime_value(record.eta)),
            ("ata", datetime_value(record.ata)),
            ("stand", text_value(&record.stand)),
            (
                "bag_transfer_status",
                text_value(&record.bag_transfer_status),
            ),
        ],
    }
}

fn transfer_spec(
    parent: &FlightRecord,
    transfer: &TransferManifestEntry,
) -> UpsertSpec<'static> {
    UpsertSpec {
        table: "transfer_manifest",
        key: vec![
            ("outbound_flight", text_value(&transfer.outbound_flight)),
            ("inbound_flight", text_value(&parent.flight)),
            ("inbound_ac_reg", text_value(&parent.ac_reg)),
            ("inbound_sta", datetime_value(parent.sta)),
        ],
        columns: vec![
            ("destination", text_value(&transfer.destination)),
            ("ac_reg", text_value(&transfer.ac_reg)),
            ("status", text_value(&transfer.status)),
            ("total_bags", Value::Integer(transfer.total_bags as i64)),
            (
                "std_etd",
                text_value(&transfer.std_etd.format("%H:%M:%S").to_string()),
            ),
            (
                "connection_estimate",
                text_value(&transfer.connection_estimate),
            ),
            ("gate", text_value(&transfer.gate)),
            ("stand", text_value(&transfer.stand)),
        ],
    }
}
