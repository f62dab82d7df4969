//! Cycle orchestration
//!
//! A [`Job`] is one extract/normalize/reconcile pass; a [`CycleScheduler`]
//! drives one job on a fixed cadence with a single-flight guard.

mod jobs;
mod scheduler;

pub use jobs::{
    arrivals_cycle, ldm_cycle, movements_cycle, ArrivalsJob, Job, LdmJob, MovementsJob,
    EXPORT_BUTTON, FLIGHT_DATE_FIELD, FLIGHT_NO_FIELD, FLIGHT_SEARCH_LINK, LDM_TEXTAREA,
    MOVEMENTS_LINK, SEARCH_BUTTON, TRANSFER_INFO_LINK, VIEW_FLIGHTS_BUTTON, VIEW_LDM_BUTTON,
};
pub use scheduler::{CyclePhase, CycleScheduler};
