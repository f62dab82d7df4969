use serde::Deserialize;
use std::path::PathBuf;

/// Main configuration structure for Flightline
///
/// Loaded from the process environment (a `.env` file is honored when
/// present). There is no configuration file beyond that.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub portal: PortalConfig,
    pub sink: SinkConfig,
    pub pipeline: PipelineConfig,
}

/// Connection details for the legacy web portal
#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    /// Base URL of the portal, used to resolve relative navigation links
    pub base_url: String,

    /// Full URL of the login page
    pub login_url: String,

    /// Portal account username
    pub username: String,

    /// Portal account password
    pub password: String,
}

/// Relational sink configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SinkConfig {
    /// Path to the SQLite database file
    pub database_path: String,
}

/// Pipeline cadence and workspace configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Per-job interval override in minutes; each job carries its own
    /// default cadence when this is not set
    pub interval_minutes: Option<u64>,

    /// Directory where bulk-export downloads land
    pub download_dir: PathBuf,

    /// Bounded wait for portal elements, in seconds
    pub element_timeout_secs: u64,

    /// Bounded wait for export-file downloads, in seconds
    pub download_timeout_secs: u64,
}
