//! TOML configuration for nxfdash.
//!
//! Every section has compiled-in defaults, so an empty file (or no file at
//! all) is a valid configuration. The config path can be overridden with the
//! `NXFDASH_CONFIG` environment variable.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::history::{RunStatus, TimeWindow};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "NXFDASH_CONFIG";

const SYSTEM_CONFIG_PATH: &str = "/etc/nxfdash/nxfdash.toml";

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default)]
    pub warehouse: WarehouseConfig,
    #[serde(default)]
    pub dashboard: ViewConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl DashboardConfig {
    /// Load configuration from a TOML file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))?;
        info!(path = %path.display(), "loaded dashboard configuration");
        Ok(config)
    }

    /// Try, in order: `NXFDASH_CONFIG`, the system path, compiled-in defaults.
    pub fn load_or_default() -> Self {
        if let Ok(env_path) = std::env::var(CONFIG_ENV) {
            let path = Path::new(&env_path);
            match Self::load(path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %path.display(),
                        error = %e,
                        "NXFDASH_CONFIG set but file could not be loaded, trying fallback"
                    );
                }
            }
        }

        let system_path = Path::new(SYSTEM_CONFIG_PATH);
        if system_path.exists() {
            match Self::load(system_path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    warn!(
                        path = %system_path.display(),
                        error = %e,
                        "system config file exists but could not be loaded, using defaults"
                    );
                }
            }
        }

        debug!("no config file found, using compiled-in defaults");
        Self::default()
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("failed to serialize configuration")
    }
}

// ---------------------------------------------------------------------------
// Warehouse
// ---------------------------------------------------------------------------

/// Names of warehouse objects the fetching side reads from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    /// Table holding Nextflow pipeline execution history.
    pub history_table: String,
    /// Stage holding per-run work directories (reports, timelines, traces).
    pub workdir_stage: String,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            history_table: "NXF_EXECUTION_HISTORY".to_string(),
            workdir_stage: "NXF_WORKDIR".to_string(),
        }
    }
}

/// Files Nextflow leaves in a run's work directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunArtifact {
    Report,
    Timeline,
    Trace,
}

impl RunArtifact {
    pub const ALL: [RunArtifact; 3] = [Self::Report, Self::Timeline, Self::Trace];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Report => "report",
            Self::Timeline => "timeline",
            Self::Trace => "trace",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Report => "report.html",
            Self::Timeline => "timeline.html",
            Self::Trace => "trace.txt",
        }
    }
}

impl WarehouseConfig {
    /// Stage path of an artifact, e.g. `@NXF_WORKDIR/r017n26s/report.html`.
    pub fn stage_path(&self, run_name: &str, artifact: RunArtifact) -> String {
        format!(
            "@{}/{}/{}",
            self.workdir_stage,
            run_name.trim_matches('/'),
            artifact.file_name()
        )
    }

    /// Stage paths of every artifact a run produces.
    pub fn artifact_paths(&self, run_name: &str) -> Vec<ArtifactPath> {
        RunArtifact::ALL
            .iter()
            .map(|a| ArtifactPath {
                artifact: a.name(),
                file: a.file_name(),
                path: self.stage_path(run_name, *a),
            })
            .collect()
    }
}

/// Where one run artifact lives in the workdir stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactPath {
    pub artifact: &'static str,
    pub file: &'static str,
    pub path: String,
}

// ---------------------------------------------------------------------------
// Dashboard view defaults
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Lookback used when a request does not name one.
    pub default_window: TimeWindow,
    /// Status label counted as a successful run in summaries.
    pub success_status: String,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_window: TimeWindow::default(),
            success_status: "SUCCESS".to_string(),
        }
    }
}

impl ViewConfig {
    pub fn success_status(&self) -> RunStatus {
        RunStatus::new(&self.success_status)
    }
}

// ---------------------------------------------------------------------------
// Server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: "127.0.0.1:8080".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Json,
}
