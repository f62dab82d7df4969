//! The three sync jobs
//!
//! Each job is one extract/normalize/reconcile pass over a portal view. A
//! job owns its sink; the portal session is acquired at cycle start and
//! closed on every exit path, success or failure. The cycle bodies are free
//! functions over the driver and sink traits so tests can drive them with a
//! scripted session and an in-memory sink.

use crate::config::Config;
use crate::extract::{
    await_download, clear_download_dir, extract_flight_rows, parse_export, MOVEMENTS_EXPORT_NAME,
    PARENT_ROW_SELECTOR,
};
use crate::normalize::{normalize_flight_row, normalize_movement_row};
use crate::pipeline::CyclePhase;
use crate::reconcile::{
    reconcile_arrivals, reconcile_movements, record_ldm_capture, record_ldm_unavailable,
    CycleStats, UpsertClass, LDM_RECENCY_WINDOW_DAYS,
};
use crate::records::LdmCandidate;
use crate::session::{Credentials, PortalSession, SessionDriver, SessionError, WaitOutcome};
use crate::sink::Sink;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Menu link to the transfer-info section
pub const TRANSFER_INFO_LINK: &str = "a[id$='lnkTransferInfo']";
/// Button that renders the live arrivals table
pub const VIEW_FLIGHTS_BUTTON: &str = "input[name='ctl00$body$btnViewFlights']";

/// Menu link to the flight-search section
pub const FLIGHT_SEARCH_LINK: &str = "a[id$='lnkFlightSearch']";
/// Search form fields and controls
pub const FLIGHT_NO_FIELD: &str = "input[name='ctl00$body$txtFlightNo']";
pub const FLIGHT_DATE_FIELD: &str = "input[name='ctl00$body$txtFlightDate']";
pub const SEARCH_BUTTON: &str = "input[name='ctl00$body$btnSearch']";
/// Per-result button that opens the load message, present only when the
/// portal has one
pub const VIEW_LDM_BUTTON: &str = "input[name$='btnViewLdm']";
pub const LDM_TEXTAREA: &str = "textarea[id$='txtLdm']";

/// Menu link to the movement-progress section
pub const MOVEMENTS_LINK: &str = "a[id$='lnkMovementProgress']";
pub const EXPORT_BUTTON: &str = "input[name='ctl00$body$btnExport']";

/// One scheduled sync job, drivable one cycle at a time
#[async_trait]
pub trait Job: Send {
    fn name(&self) -> &'static str;

    /// Cadence used when no interval override is configured
    fn default_interval(&self) -> Duration;

    /// Runs one full cycle, reporting phase transitions through `phase`
    async fn run_cycle(&mut self, phase: &mut CyclePhase) -> crate::Result<CycleStats>;
}

fn credentials(config: &Config) -> Credentials {
    Credentials {
        username: config.portal.username.clone(),
        password: config.portal.password.clone(),
    }
}

fn element_timeout(config: &Config) -> Duration {
    Duration::from_secs(config.pipeline.element_timeout_secs)
}

async fn establish<D: SessionDriver + ?Sized>(
    driver: &mut D,
    config: &Config,
    section_link: &str,
) -> crate::Result<()> {
    driver.open(&config.portal.login_url).await?;
    driver.authenticate(&credentials(config)).await?;
    driver.click(section_link).await?;
    Ok(())
}

/// Syncs the live arrivals table and its nested transfer manifests
pub struct ArrivalsJob<S> {
    config: Config,
    sink: S,
}

impl<S: Sink + Send> ArrivalsJob<S> {
    pub fn new(config: Config, sink: S) -> Self {
        Self { config, sink }
    }
}

#[async_trait]
impl<S: Sink + Send> Job for ArrivalsJob<S> {
    fn name(&self) -> &'static str {
        "arrivals"
    }

    fn default_interval(&self) -> Duration {
        Duration::from_secs(3 * 60)
    }

    async fn run_cycle(&mut self, phase: &mut CyclePhase) -> crate::Result<CycleStats> {
        let mut session = PortalSession::new(&self.config.portal)?;
        let result = arrivals_cycle(&mut session, &mut self.sink, &self.config, phase).await;
        if let Err(err) = session.close().await {
            warn!("Session close failed: {}", err);
        }
        result
    }
}

/// One arrivals cycle over an already-constructed driver and sink
pub async fn arrivals_cycle<D, S>(
    driver: &mut D,
    sink: &mut S,
    config: &Config,
    phase: &mut CyclePhase,
) -> crate::Result<CycleStats>
where
    D: SessionDriver + ?Sized,
    S: Sink,
{
    *phase = CyclePhase::SessionEstablishing;
    establish(driver, config, TRANSFER_INFO_LINK).await?;
    driver.click(VIEW_FLIGHTS_BUTTON).await?;

    *phase = CyclePhase::Extracting;
    match driver
        .wait_for(PARENT_ROW_SELECTOR, element_timeout(config))
        .await?
    {
        WaitOutcome::Found => {}
        WaitOutcome::Absent => {
            // The portal renders an empty table when nothing is inbound
            info!("No arrivals on the view, empty cycle");
            return Ok(CycleStats::new());
        }
        WaitOutcome::TimedOut => {
            return Err(SessionError::Timeout {
                locator: PARENT_ROW_SELECTOR.to_string(),
                timeout: element_timeout(config),
            }
            .into());
        }
    }

    let source = driver.view_source()?;
    let raw_rows = extract_flight_rows(&source)?;
    debug!("Extracted {} arrival rows", raw_rows.len());

    *phase = CyclePhase::Normalizing;
    let mut records = Vec::new();
    for row in &raw_rows {
        match normalize_flight_row(row) {
            Some(record) => records.push(record),
            None => warn!("Skipping arrival row without a usable flight/date"),
        }
    }

    *phase = CyclePhase::Reconciling;
    let stats = reconcile_arrivals(sink, &records)?;
    Ok(stats)
}

/// Captures load messages for departed movements that still lack one
pub struct LdmJob<S> {
    config: Config,
    sink: S,
}

impl<S: Sink + Send> LdmJob<S> {
    pub fn new(config: Config, sink: S) -> Self {
        Self { config, sink }
    }
}

#[async_trait]
impl<S: Sink + Send> Job for LdmJob<S> {
    fn name(&self) -> &'static str {
        "ldm"
    }

    fn default_interval(&self) -> Duration {
        Duration::from_secs(45 * 60)
    }

    async fn run_cycle(&mut self, phase: &mut CyclePhase) -> crate::Result<CycleStats> {
        let now = Utc::now().naive_utc();
        let candidates = self
            .sink
            .pending_ldm_candidates(LDM_RECENCY_WINDOW_DAYS, now)?;
        if candidates.is_empty() {
            debug!("No pending LDM candidates");
            return Ok(CycleStats::new());
        }

        let mut session = PortalSession::new(&self.config.portal)?;
        let result =
            ldm_cycle(&mut session, &mut self.sink, &self.config, &candidates, now, phase).await;
        if let Err(err) = session.close().await {
            warn!("Session close failed: {}", err);
        }
        result
    }
}

/// One LDM cycle over a known candidate set
///
/// Candidates resolve independently: a failure on one is logged with its
/// key and counted, and the rest are still attempted.
pub async fn ldm_cycle<D, S>(
    driver: &mut D,
    sink: &mut S,
    config: &Config,
    candidates: &[LdmCandidate],
    now: NaiveDateTime,
    phase: &mut CyclePhase,
) -> crate::Result<CycleStats>
where
    D: SessionDriver + ?Sized,
    S: Sink,
{
    *phase = CyclePhase::SessionEstablishing;
    establish(driver, config, FLIGHT_SEARCH_LINK).await?;

    let mut stats = CycleStats::new();
    for (index, candidate) in candidates.iter().enumerate() {
        *phase = CyclePhase::Extracting;
        if index > 0 {
            // The previous capture may have navigated off the search form
            // (opening a message lands on the detail view), so the form is
            // re-opened before every candidate after the first
            driver.click(FLIGHT_SEARCH_LINK).await?;
        }
        match capture_one(driver, sink, config, candidate, now, phase).await {
            Ok(class) => stats.record(class),
            Err(err) => {
                warn!("LDM capture for {} failed: {}", candidate.unique_id(), err);
                stats.record_failure();
            }
        }
    }

    info!("LDM cycle over {} candidates: {}", candidates.len(), stats);
    Ok(stats)
}

async fn capture_one<D, S>(
    driver: &mut D,
    sink: &mut S,
    config: &Config,
    candidate: &LdmCandidate,
    now: NaiveDateTime,
    phase: &mut CyclePhase,
) -> crate::Result<UpsertClass>
where
    D: SessionDriver + ?Sized,
    S: Sink,
{
    driver
        .type_text(FLIGHT_NO_FIELD, candidate.flight_number())
        .await?;
    driver
        .type_text(FLIGHT_DATE_FIELD, &candidate.portal_date())
        .await?;
    driver.click(SEARCH_BUTTON).await?;

    let timeout = element_timeout(config);
    match driver.wait_for(VIEW_LDM_BUTTON, timeout).await? {
        WaitOutcome::Found => {
            driver.click(VIEW_LDM_BUTTON).await?;
            match driver.wait_for(LDM_TEXTAREA, timeout).await? {
                WaitOutcome::Found => {
                    let text = driver.read_text(LDM_TEXTAREA).await?;
                    *phase = CyclePhase::Reconciling;
                    Ok(record_ldm_capture(sink, candidate, &text, now)?)
                }
                WaitOutcome::Absent => Err(SessionError::NotFound {
                    locator: LDM_TEXTAREA.to_string(),
                }
                .into()),
                WaitOutcome::TimedOut => Err(SessionError::Timeout {
                    locator: LDM_TEXTAREA.to_string(),
                    timeout,
                }
                .into()),
            }
        }
        // The view button only renders when the portal holds a message;
        // a rendered result without one is a confirmed absence
        WaitOutcome::Absent => {
            *phase = CyclePhase::Reconciling;
            Ok(record_ldm_unavailable(sink, candidate, now)?)
        }
        WaitOutcome::TimedOut => Err(SessionError::Timeout {
            locator: VIEW_LDM_BUTTON.to_string(),
            timeout,
        }
        .into()),
    }
}

/// Syncs the bulk movement-progress export
pub struct MovementsJob<S> {
    config: Config,
    sink: S,
}

impl<S: Sink + Send> MovementsJob<S> {
    pub fn new(config: Config, sink: S) -> Self {
        Self { config, sink }
    }
}

#[async_trait]
impl<S: Sink + Send> Job for MovementsJob<S> {
    fn name(&self) -> &'static str {
        "movements"
    }

    fn default_interval(&self) -> Duration {
        Duration::from_secs(10 * 60)
    }

    async fn run_cycle(&mut self, phase: &mut CyclePhase) -> crate::Result<CycleStats> {
        let mut session = PortalSession::new(&self.config.portal)?;
        let result = movements_cycle(&mut session, &mut self.sink, &self.config, phase).await;
        if let Err(err) = session.close().await {
            warn!("Session close failed: {}", err);
        }
        result
    }
}

/// One movements cycle: trigger the export, wait for the file, reconcile
pub async fn movements_cycle<D, S>(
    driver: &mut D,
    sink: &mut S,
    config: &Config,
    phase: &mut CyclePhase,
) -> crate::Result<CycleStats>
where
    D: SessionDriver + ?Sized,
    S: Sink,
{
    *phase = CyclePhase::SessionEstablishing;
    establish(driver, config, MOVEMENTS_LINK).await?;

    *phase = CyclePhase::Extracting;
    let dir = &config.pipeline.download_dir;
    clear_download_dir(dir)?;

    let download_timeout = Duration::from_secs(config.pipeline.download_timeout_secs);
    driver
        .trigger_download(EXPORT_BUTTON, dir, MOVEMENTS_EXPORT_NAME, download_timeout)
        .await?;
    let path = await_download(dir, MOVEMENTS_EXPORT_NAME, download_timeout).await?;

    let contents = tokio::fs::read_to_string(&path).await?;
    let raw_rows = parse_export(&contents);
    debug!("Export contains {} movement rows", raw_rows.len());

    *phase = CyclePhase::Normalizing;
    let mut entries = Vec::new();
    for row in &raw_rows {
        match normalize_movement_row(row) {
            Some(entry) => entries.push(entry),
            None => warn!("Skipping export row without a usable flight/date"),
        }
    }

    *phase = CyclePhase::Reconciling;
    let stats = reconcile_movements(sink, &entries)?;
    Ok(stats)
}
