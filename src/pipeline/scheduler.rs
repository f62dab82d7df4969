//! Cycle scheduling
//!
//! One scheduler drives one job: tick, run a full cycle, return to idle,
//! wait for the next tick. The interval is measured from cycle start; an
//! overrunning cycle delays the next tick rather than stacking a concurrent
//! one, so at most one cycle executes at a time. A failed cycle is logged
//! and absorbed; the next tick is the retry mechanism.

use crate::pipeline::Job;
use crate::reconcile::CycleStats;
use std::fmt;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Where a cycle currently is in its extract/normalize/reconcile pass
///
/// `Failed` is entered when any step errors, logged, and immediately
/// re-enters `Idle`; no phase is terminal for the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CyclePhase {
    Idle,
    SessionEstablishing,
    Extracting,
    Normalizing,
    Reconciling,
    Failed,
}

impl fmt::Display for CyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CyclePhase::Idle => "idle",
            CyclePhase::SessionEstablishing => "session-establishing",
            CyclePhase::Extracting => "extracting",
            CyclePhase::Normalizing => "normalizing",
            CyclePhase::Reconciling => "reconciling",
            CyclePhase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// Drives one job on a fixed cadence with a single-flight guard
///
/// `run_cycle` is public so tests can drive cycles manually instead of
/// waiting on a clock.
pub struct CycleScheduler<J: Job> {
    job: J,
    interval: Duration,
    phase: CyclePhase,
    cycles_run: u64,
    cycles_failed: u64,
}

impl<J: Job> CycleScheduler<J> {
    /// Creates a scheduler; `interval_override` takes precedence over the
    /// job's default cadence
    pub fn new(job: J, interval_override: Option<Duration>) -> Self {
        let interval = interval_override.unwrap_or_else(|| job.default_interval());
        Self {
            job,
            interval,
            phase: CyclePhase::Idle,
            cycles_run: 0,
            cycles_failed: 0,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn phase(&self) -> CyclePhase {
        self.phase
    }

    pub fn cycles_run(&self) -> u64 {
        self.cycles_run
    }

    pub fn cycles_failed(&self) -> u64 {
        self.cycles_failed
    }

    /// Runs exactly one cycle to completion and returns to idle
    ///
    /// Returns the cycle's stats, or None when the cycle failed. Failures
    /// are logged with the phase they occurred in; they never propagate.
    pub async fn run_cycle(&mut self) -> Option<CycleStats> {
        self.cycles_run += 1;
        self.phase = CyclePhase::SessionEstablishing;

        let result = self.job.run_cycle(&mut self.phase).await;
        match result {
            Ok(stats) => {
                info!("{} cycle complete: {}", self.job.name(), stats);
                self.phase = CyclePhase::Idle;
                Some(stats)
            }
            Err(err) => {
                self.cycles_failed += 1;
                let failed_in = self.phase;
                self.phase = CyclePhase::Failed;
                error!(
                    "{} cycle failed while {}: {}",
                    self.job.name(),
                    failed_in,
                    err
                );
                self.phase = CyclePhase::Idle;
                None
            }
        }
    }

    /// Runs cycles forever on the configured cadence
    ///
    /// The first cycle starts immediately. The loop only ends when the
    /// process is externally stopped.
    pub async fn run_forever(mut self) -> crate::Result<()> {
        info!(
            "Starting {} job, one cycle every {:?}",
            self.job.name(),
            self.interval
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            self.run_cycle().await;
        }
    }
}
