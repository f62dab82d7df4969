//! Canonical record types produced by normalization
//!
//! Every record carries a business-meaningful natural key; the sink enforces
//! uniqueness on that key, never on a surrogate id. Records live only for the
//! duration of one cycle; the sink is the system of record across cycles.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// One scheduled flight movement scraped from the arrivals view
///
/// Natural key: `(flight, date)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightRecord {
    pub flight: String,
    pub date: NaiveDate,
    pub origin: String,
    pub ac_reg: String,
    pub status: String,
    /// Scheduled time of arrival
    pub sta: Option<NaiveDateTime>,
    /// Estimated time of arrival
    pub eta: Option<NaiveDateTime>,
    /// Actual time of arrival
    pub ata: Option<NaiveDateTime>,
    pub stand: String,
    pub bag_transfer_status: String,
    /// Onward-connection children scraped from the nested manifest table
    pub transfers: Vec<TransferManifestEntry>,
}

impl FlightRecord {
    /// Human-readable natural key, used in per-record failure logs
    pub fn key(&self) -> String {
        format!("{} {}", self.flight, self.date)
    }
}

/// One onward (outbound) connection nested under an inbound flight
///
/// The child is scraped independently of any inbound database identifier, so
/// it references its parent by the inbound composite natural key
/// `(inbound_flight, inbound_ac_reg, inbound_sta)` rather than a surrogate id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferManifestEntry {
    pub outbound_flight: String,
    pub destination: String,
    pub ac_reg: String,
    pub status: String,
    /// Bag count; 0 when the portal renders nothing parsable
    pub total_bags: u32,
    /// Scheduled/estimated departure, time-of-day only; the portal renders
    /// no date for the outbound leg
    pub std_etd: NaiveTime,
    pub connection_estimate: String,
    pub gate: String,
    pub stand: String,
}

/// A free-text cargo/load manifest for one flight occurrence
///
/// Keyed by a stable per-occurrence identifier derived from the owning
/// movement's natural key. Created unresolved by the movement feed;
/// transitions exactly once to resolved (text captured) or
/// resolved-unavailable (sentinel text, flag still set), and never reverts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadMessage {
    pub unique_id: String,
    pub flight_id: String,
    pub flight_date: NaiveDate,
    pub origin: String,
    pub destination: String,
    /// None until captured
    pub ldm_text: Option<String>,
    /// Monotonic: once true, the occurrence is never re-attempted
    pub obtained: bool,
}

/// A flight occurrence still awaiting its load message, as selected from the
/// sink by the eligibility join (departed, within the recency window, not
/// yet obtained)
#[derive(Debug, Clone, PartialEq)]
pub struct LdmCandidate {
    pub flight: String,
    pub date: NaiveDate,
    pub origin: String,
    pub destination: String,
}

impl LdmCandidate {
    /// Stable per-occurrence identifier for the captured message
    pub fn unique_id(&self) -> String {
        format!("{}_{}", self.flight, self.date)
    }

    /// Flight number without the two-letter carrier prefix, as the portal's
    /// search form expects it
    pub fn flight_number(&self) -> &str {
        match self.flight.get(2..) {
            Some(rest) if !rest.is_empty() => rest,
            // Too short, or a scraped designator whose byte 2 falls inside
            // a multi-byte character; searched as-is rather than mangled
            _ => &self.flight,
        }
    }

    /// Date in the `dd/mm/yyyy` format the portal's search form expects
    pub fn portal_date(&self) -> String {
        self.date.format("%d/%m/%Y").to_string()
    }
}

/// One exported row from the bulk movement log
///
/// Natural key: `(flight, date)`. Sourced only from the bulk-export strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovementEntry {
    pub flight: String,
    pub date: NaiveDate,
    pub origin: String,
    pub destination: String,
    pub ac_reg: String,
    /// Scheduled / estimated / actual departure
    pub std: Option<NaiveDateTime>,
    pub etd: Option<NaiveDateTime>,
    pub atd: Option<NaiveDateTime>,
    pub takeoff: Option<NaiveDateTime>,
    pub touchdown: Option<NaiveDateTime>,
    /// Scheduled / estimated / actual arrival
    pub sta: Option<NaiveDateTime>,
    pub eta: Option<NaiveDateTime>,
    pub ata: Option<NaiveDateTime>,
    /// Delay offsets in minutes; None when the export field is empty
    pub dep_delay: Option<i32>,
    pub arr_delay: Option<i32>,
    /// Taxi times in minutes
    pub taxi_out: Option<i32>,
    pub taxi_in: Option<i32>,
    pub delay_codes: String,
    pub cancelled: bool,
}

impl MovementEntry {
    /// Human-readable natural key, used in per-record failure logs
    pub fn key(&self) -> String {
        format!("{} {}", self.flight, self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(flight: &str) -> LdmCandidate {
        LdmCandidate {
            flight: flight.to_string(),
            date: NaiveDate::from_ymd_opt(2025, 1, 16).unwrap(),
            origin: "OSL".to_string(),
            destination: "CPH".to_string(),
        }
    }

    #[test]
    fn flight_number_strips_the_carrier_prefix() {
        assert_eq!(candidate("AB123").flight_number(), "123");
        assert_eq!(candidate("AB").flight_number(), "AB");
        assert_eq!(candidate("7").flight_number(), "7");
    }

    #[test]
    fn flight_number_survives_multibyte_designators() {
        assert_eq!(candidate("€123").flight_number(), "€123");
        assert_eq!(candidate("ÅB123").flight_number(), "B123");
    }

    #[test]
    fn unique_id_joins_flight_and_date() {
        assert_eq!(candidate("AB123").unique_id(), "AB123_2025-01-16");
    }

    #[test]
    fn portal_date_renders_day_first() {
        assert_eq!(candidate("AB123").portal_date(), "16/01/2025");
    }
}
