//! Loading exported query-history rows.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::history::RawRunRow;

/// Read a JSON array of query-history rows.
///
/// Rows are kept raw; validation happens per row when filtering so that a
/// single bad row does not reject the whole export.
pub fn load_rows(path: &Path) -> Result<Vec<RawRunRow>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read run history: {}", path.display()))?;
    let rows: Vec<RawRunRow> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse run history: {}", path.display()))?;
    info!(path = %path.display(), rows = rows.len(), "loaded run history");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("runs.json");
        std::fs::write(
            &path,
            r#"[
                {"QUERY_ID": "q1", "START_TIME": "2025-03-01 10:00:00", "END_TIME": "2025-03-01 10:00:30", "EXECUTION_STATUS": "SUCCESS"},
                {"QUERY_ID": "q2", "EXECUTION_STATUS": "FAILED"}
            ]"#,
        )
        .unwrap();
        let rows = load_rows(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].label(), "q2");
        assert!(rows[1].start_time.is_none());
    }

    #[test]
    fn test_load_rows_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_rows(&dir.path().join("missing.json")).is_err());

        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        let err = load_rows(&path).unwrap_err();
        assert!(err.to_string().contains("failed to parse run history"));
    }
}
