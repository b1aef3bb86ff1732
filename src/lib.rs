//! nxfdash -- execution analytics for Nextflow pipeline runs.
//!
//! This crate turns exported warehouse query-history rows into filtered,
//! human-readable run listings and summary metrics, and serves them over a
//! small JSON API for a rendering front end.

pub mod api;
pub mod config;
pub mod duration;
pub mod history;
pub mod source;

use anyhow::Result;

use crate::config::DashboardConfig;
use crate::history::RawRunRow;

/// Serve the run history API over `bind` until the process is stopped.
pub async fn serve(bind: &str, rows: Vec<RawRunRow>, config: DashboardConfig) -> Result<()> {
    let addr: std::net::SocketAddr = bind.parse()?;
    let app = api::router(api::state::AppState::new(rows, config));

    tracing::info!(%addr, "nxfdash listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
