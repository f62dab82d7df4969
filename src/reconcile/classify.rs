//! Write-outcome classification and cycle statistics

use crate::sink::WriteOutcome;
use std::fmt;

/// How one upsert landed in the sink
///
/// Derived purely from the engine's write-outcome signal. No read precedes
/// the write, so the classification cannot race with concurrent cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertClass {
    /// No row carried the key before the write
    Inserted,
    /// The key existed and at least one mutable column differed
    Updated,
    /// The key existed and every mutable column already matched; the audit
    /// timestamp still advanced
    Unchanged,
}

impl UpsertClass {
    /// Classifies an upsert from its write outcome
    pub fn from_outcome(outcome: &WriteOutcome) -> Self {
        if outcome.matched == 0 {
            UpsertClass::Inserted
        } else if outcome.changed > 0 {
            UpsertClass::Updated
        } else {
            UpsertClass::Unchanged
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UpsertClass::Inserted => "inserted",
            UpsertClass::Updated => "updated",
            UpsertClass::Unchanged => "unchanged",
        }
    }
}

impl fmt::Display for UpsertClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-cycle reconciliation tally, emitted in the cycle summary log line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub inserted: u64,
    pub updated: u64,
    pub unchanged: u64,
    pub failed: u64,
}

impl CycleStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tallies one classified write
    pub fn record(&mut self, class: UpsertClass) {
        match class {
            UpsertClass::Inserted => self.inserted += 1,
            UpsertClass::Updated => self.updated += 1,
            UpsertClass::Unchanged => self.unchanged += 1,
        }
    }

    /// Tallies one record that failed to reconcile
    pub fn record_failure(&mut self) {
        self.failed += 1;
    }

    /// Total records the cycle attempted
    pub fn total(&self) -> u64 {
        self.inserted + self.updated + self.unchanged + self.failed
    }
}

impl fmt::Display for CycleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} inserted, {} updated, {} unchanged, {} failed",
            self.inserted, self.updated, self.unchanged, self.failed
        )
    }
}
