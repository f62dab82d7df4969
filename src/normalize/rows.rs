//! Mapping of raw rows into canonical records
//!
//! Sits between extraction and reconciliation: raw cells are looked up
//! through the declarative column maps and run through the parse functions.
//! A row missing its natural-key fields maps to None and the caller decides
//! how loudly to skip it; malformed attribute fields degrade per the parse
//! policies without losing the row.

use crate::extract::{RawFlightRow, RawRow, ARRIVAL_COLUMNS, MOVEMENT_COLUMNS, TRANSFER_COLUMNS};
use crate::normalize::{
    count_is_parsable, parse_clock_time, parse_clock_time_only, parse_count, parse_date,
};
use crate::records::{FlightRecord, MovementEntry, TransferManifestEntry};
use chrono::NaiveDate;

/// Maps one arrivals parent row (and its children) to a FlightRecord
///
/// Returns None when the flight designator or the operation date cannot be
/// read, since without the natural key the record cannot be reconciled.
pub fn normalize_flight_row(row: &RawFlightRow) -> Option<FlightRecord> {
    let map = &ARRIVAL_COLUMNS;
    let cells = &row.cells;

    let flight = cells.cell(map.index("flight"))?.to_string();
    let date = parse_date(cells.cell(map.index("date")).unwrap_or(""))?;

    let transfers = row
        .children
        .iter()
        .filter_map(normalize_transfer_row)
        .collect();

    Some(FlightRecord {
        flight,
        date,
        origin: cells.cell_or_empty(map.index("origin")),
        ac_reg: cells.cell_or_empty(map.index("ac_reg")),
        status: cells.cell_or_empty(map.index("status")),
        sta: clock_cell(cells, map.index("sta"), date),
        eta: clock_cell(cells, map.index("eta"), date),
        ata: clock_cell(cells, map.index("ata"), date),
        stand: cells.cell_or_empty(map.index("stand")),
        bag_transfer_status: cells.cell_or_empty(map.index("bag_transfer_status")),
        transfers,
    })
}

/// Maps one nested manifest row to a TransferManifestEntry
///
/// Returns None when the outbound designator is missing. An unparsable bag
/// count is stored as 0 per policy but logged so it is distinguishable from
/// a true zero in the cycle log.
pub fn normalize_transfer_row(row: &RawRow) -> Option<TransferManifestEntry> {
    let map = &TRANSFER_COLUMNS;

    let outbound_flight = row.cell(map.index("outbound_flight"))?.to_string();

    let raw_bags = row.cell_or_empty(map.index("total_bags"));
    if !count_is_parsable(&raw_bags) {
        tracing::warn!(
            "Unparsable bag count {:?} for outbound {}, storing 0",
            raw_bags,
            outbound_flight
        );
    }

    Some(TransferManifestEntry {
        outbound_flight,
        destination: row.cell_or_empty(map.index("destination")),
        ac_reg: row.cell_or_empty(map.index("ac_reg")),
        status: row.cell_or_empty(map.index("status")),
        total_bags: parse_count(&raw_bags),
        std_etd: parse_clock_time_only(&row.cell_or_empty(map.index("std_etd"))),
        connection_estimate: row.cell_or_empty(map.index("connection_estimate")),
        gate: row.cell_or_empty(map.index("gate")),
        stand: row.cell_or_empty(map.index("stand")),
    })
}

/// Maps one bulk-export row to a MovementEntry
///
/// Returns None when the flight designator or the operation date cannot be
/// read.
pub fn normalize_movement_row(row: &RawRow) -> Option<MovementEntry> {
    let map = &MOVEMENT_COLUMNS;

    let flight = row.cell(map.index("flight"))?.to_string();
    let date = parse_date(row.cell(map.index("date")).unwrap_or(""))?;

    Some(MovementEntry {
        flight,
        date,
        origin: row.cell_or_empty(map.index("origin")),
        destination: row.cell_or_empty(map.index("destination")),
        ac_reg: row.cell_or_empty(map.index("ac_reg")),
        std: clock_cell(row, map.index("std"), date),
        etd: clock_cell(row, map.index("etd"), date),
        atd: clock_cell(row, map.index("atd"), date),
        takeoff: clock_cell(row, map.index("takeoff"), date),
        touchdown: clock_cell(row, map.index("touchdown"), date),
        sta: clock_cell(row, map.index("sta"), date),
        eta: clock_cell(row, map.index("eta"), date),
        ata: clock_cell(row, map.index("ata"), date),
        dep_delay: int_cell(row, map.index("dep_delay")),
        arr_delay: int_cell(row, map.index("arr_delay")),
        taxi_out: int_cell(row, map.index("taxi_out")),
        taxi_in: int_cell(row, map.index("taxi_in")),
        delay_codes: row.cell_or_empty(map.index("delay_codes")),
        cancelled: flag_cell(row, map.index("cancelled")),
    })
}

fn clock_cell(row: &RawRow, index: usize, date: NaiveDate) -> Option<chrono::NaiveDateTime> {
    row.cell(index).and_then(|raw| parse_clock_time(raw, date))
}

fn int_cell(row: &RawRow, index: usize) -> Option<i32> {
    row.cell(index).and_then(|raw| raw.parse::<i32>().ok())
}

fn flag_cell(row: &RawRow, index: usize) -> bool {
    matches!(
        row.cell(index).map(str::to_ascii_lowercase).as_deref(),
        Some("1") | Some("true") | Some("y") | Some("yes") | Some("x")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn arrival_cells() -> Vec<String> {
        vec![
            "+", "AB123", "16/01/2025", "OSL", "LNABC", "LND", "1234", "1240", "1238", "12", "OK",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }

    #[test]
    fn flight_row_normalizes_times_against_date() {
        let row = RawFlightRow {
            cells: RawRow::new(arrival_cells()),
            children: vec![],
        };
        let record = normalize_flight_row(&row).unwrap();
        assert_eq!(record.flight, "AB123");
        assert_eq!(
            record.sta.unwrap().to_string(),
            "2025-01-16 12:34:00"
        );
        assert_eq!(record.eta.unwrap().hour(), 12);
        assert_eq!(record.ata.unwrap().minute(), 38);
    }

    #[test]
    fn flight_row_without_date_is_skipped() {
        let mut cells = arrival_cells();
        cells[2] = "not a date".to_string();
        let row = RawFlightRow {
            cells: RawRow::new(cells),
            children: vec![],
        };
        assert!(normalize_flight_row(&row).is_none());
    }

    #[test]
    fn transfer_row_defaults_bags_to_zero() {
        let row = RawRow::new(
            vec!["CD456", "CPH", "LNDEF", "SKD", "n/a", "1420", "0:45", "A12", "34"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        let entry = normalize_transfer_row(&row).unwrap();
        assert_eq!(entry.total_bags, 0);
        assert_eq!(entry.std_etd.hour(), 14);
        assert_eq!(entry.std_etd.minute(), 20);
    }

    #[test]
    fn movement_row_maps_all_positions() {
        let row = RawRow::new(
            vec![
                "AB123",
                "16/01/2025",
                "OSL",
                "CPH",
                "LNABC",
                "0900",
                "0910",
                "0915",
                "0925",
                "1005",
                "1010",
                "1015",
                "1012",
                "15",
                "2",
                "10",
                "5",
                "93",
                "0",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
        );
        let entry = normalize_movement_row(&row).unwrap();
        assert_eq!(entry.flight, "AB123");
        assert_eq!(entry.atd.unwrap().to_string(), "2025-01-16 09:15:00");
        assert_eq!(entry.dep_delay, Some(15));
        assert_eq!(entry.taxi_in, Some(5));
        assert_eq!(entry.delay_codes, "93");
        assert!(!entry.cancelled);
    }

    #[test]
    fn movement_row_tolerates_missing_trailing_fields() {
        let row = RawRow::new(
            vec!["AB123", "16/01/2025", "OSL"]
                .into_iter()
                .map(String::from)
                .collect(),
        );
        let entry = normalize_movement_row(&row).unwrap();
        assert_eq!(entry.destination, "");
        assert_eq!(entry.atd, None);
        assert_eq!(entry.dep_delay, None);
        assert!(!entry.cancelled);
    }

    #[test]
    fn cancellation_flag_accepts_portal_spellings() {
        for (raw, expected) in [("1", true), ("True", true), ("X", true), ("0", false), ("", false)]
        {
            let mut cells = vec![String::new(); 19];
            cells[0] = "AB123".to_string();
            cells[1] = "16/01/2025".to_string();
            cells[18] = raw.to_string();
            let entry = normalize_movement_row(&RawRow::new(cells)).unwrap();
            assert_eq!(entry.cancelled, expected, "raw {:?}", raw);
        }
    }
}
