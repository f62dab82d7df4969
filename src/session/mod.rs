//! Portal session management
//!
//! This module contains:
//! - The [`SessionDriver`] capability interface the pipeline consumes
//! - A reqwest + scraper implementation for the HTTP-reachable portal

mod driver;
mod portal;

pub use driver::{Credentials, SessionDriver, SessionError, SessionResult, WaitOutcome};
pub use portal::{PortalSession, PASSWORD_FIELD, USERNAME_FIELD};
