//! Load-message reconciliation
//!
//! Each candidate resolves independently: a captured message and a confirmed
//! absence both count as resolved, and both set the owning movement's
//! obtained flag so the candidate never comes back. The flag write and the
//! message write happen per candidate, outside any batch transaction.

use crate::records::{LdmCandidate, LoadMessage};
use crate::reconcile::UpsertClass;
use crate::sink::{date_value, opt_text_value, text_value, Sink, SinkResult, UpsertSpec};
use chrono::NaiveDateTime;
use rusqlite::types::Value;
use tracing::info;

/// How far back departed movements stay eligible for capture, in days
pub const LDM_RECENCY_WINDOW_DAYS: i64 = 2;

/// Sentinel text stored when the portal has no message for a departed flight
pub fn unavailable_text(now: NaiveDateTime) -> String {
    format!(
        "LDM not available at the time of capture ({})",
        now.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Builds the resolved message record for a candidate
///
/// Both resolution paths go through here: a real capture carries the portal
/// text, a confirmed absence carries the sentinel. Either way the message is
/// resolved and the obtained flag is set.
fn resolve(candidate: &LdmCandidate, text: String) -> LoadMessage {
    LoadMessage {
        unique_id: candidate.unique_id(),
        flight_id: candidate.flight.clone(),
        flight_date: candidate.date,
        origin: candidate.origin.clone(),
        destination: candidate.destination.clone(),
        ldm_text: Some(text),
        obtained: true,
    }
}

/// Records a captured load message and retires the candidate
pub fn record_ldm_capture<S: Sink>(
    sink: &mut S,
    candidate: &LdmCandidate,
    text: &str,
    now: NaiveDateTime,
) -> SinkResult<UpsertClass> {
    let message = resolve(candidate, text.to_string());
    let outcome = sink.upsert(&message_spec(&message, now))?;
    sink.mark_ldm_obtained(&candidate.flight, candidate.date)?;
    let class = UpsertClass::from_outcome(&outcome);
    info!("LDM captured for {}: {}", message.unique_id, class);
    Ok(class)
}

/// Records a confirmed absence and retires the candidate
///
/// The stored text is the sentinel, not NULL, so a reader can tell "we
/// looked and the portal had nothing" from "we have not looked yet".
pub fn record_ldm_unavailable<S: Sink>(
    sink: &mut S,
    candidate: &LdmCandidate,
    now: NaiveDateTime,
) -> SinkResult<UpsertClass> {
    let message = resolve(candidate, unavailable_text(now));
    let outcome = sink.upsert(&message_spec(&message, now))?;
    sink.mark_ldm_obtained(&candidate.flight, candidate.date)?;
    let class = UpsertClass::from_outcome(&outcome);
    info!("LDM unavailable for {}: {}", message.unique_id, class);
    Ok(class)
}

fn message_spec(message: &LoadMessage, now: NaiveDateTime) -> UpsertSpec<'static> {
    UpsertSpec {
        table: "ldm_messages",
        key: vec![("unique_id", text_value(&message.unique_id))],
        columns: vec![
            ("flight_id", text_value(&message.flight_id)),
            ("flight_date", date_value(message.flight_date)),
            ("origin", text_value(&message.origin)),
            ("destination", text_value(&message.destination)),
            ("ldm_text", opt_text_value(message.ldm_text.as_deref())),
            ("obtained", Value::Integer(message.obtained as i64)),
            (
                "obtained_at",
                text_value(&now.format("%Y-%m-%d %H:%M:%S").to_string()),
            ),
        ],
    }
}
