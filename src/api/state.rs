use std::sync::Arc;

use crate::config::DashboardConfig;
use crate::history::RawRunRow;

/// Shared, read-only state: the loaded history export and the configuration.
#[derive(Clone)]
pub struct AppState {
    pub rows: Arc<Vec<RawRunRow>>,
    pub config: Arc<DashboardConfig>,
}

impl AppState {
    pub fn new(rows: Vec<RawRunRow>, config: DashboardConfig) -> Self {
        Self {
            rows: Arc::new(rows),
            config: Arc::new(config),
        }
    }
}
