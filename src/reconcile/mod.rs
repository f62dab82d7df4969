//! Reconciliation of normalized records into the sink
//!
//! Three reconcilers with three isolation shapes: arrivals are transactional
//! (parents and children all-or-nothing), movements are per-record isolated,
//! and load messages resolve one candidate at a time. All three classify
//! writes from the sink's write-outcome signal alone.

mod arrivals;
mod classify;
mod ldm;
mod movements;

pub use arrivals::reconcile_arrivals;
pub use classify::{CycleStats, UpsertClass};
pub use ldm::{
    record_ldm_capture, record_ldm_unavailable, unavailable_text, LDM_RECENCY_WINDOW_DAYS,
};
pub use movements::reconcile_movements;
