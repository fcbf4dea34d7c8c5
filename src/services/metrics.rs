//! Query metrics recorded in SQLite.

use std::path::Path;

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS query_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    latency_ms INTEGER NOT NULL,
    answered INTEGER NOT NULL,
    success INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_query_log_timestamp ON query_log(timestamp);
"#;

/// Per-query log of latency and outcome. Best-effort: recording failures
/// never surface to the caller.
pub struct MetricsStore {
    conn: Connection,
}

impl MetricsStore {
    pub fn open(path: &Path) -> Result<Self, rusqlite::Error> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// `answered` is false both for "no relevant information" and for
    /// failures; `success` is false only for failures.
    pub fn record(&self, latency_ms: u64, answered: bool, success: bool) {
        let _ = self.conn.execute(
            "INSERT INTO query_log (timestamp, latency_ms, answered, success)
             VALUES (datetime('now'), ?1, ?2, ?3)",
            params![latency_ms as i64, answered as i32, success as i32],
        );
    }

    pub fn get_summary(&self) -> MetricsSummary {
        self.conn
            .query_row(
                r#"
                SELECT
                    COUNT(*) as total_queries,
                    COALESCE(AVG(latency_ms), 0) as avg_latency_ms,
                    COALESCE(SUM(answered), 0) as answered,
                    COALESCE(SUM(CASE WHEN success = 0 THEN 1 ELSE 0 END) * 100.0 / NULLIF(COUNT(*), 0), 0) as error_rate
                FROM query_log
                "#,
                [],
                |row| {
                    Ok(MetricsSummary {
                        total_queries: row.get::<_, i64>(0)? as u64,
                        avg_latency_ms: row.get::<_, f64>(1)? as u64,
                        answered: row.get::<_, i64>(2)? as u64,
                        error_rate: row.get::<_, f64>(3)? as f32,
                    })
                },
            )
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_queries: u64,
    pub avg_latency_ms: u64,
    pub answered: u64,
    pub error_rate: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_summarize() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetricsStore::open(&dir.path().join("metrics.db")).unwrap();

        store.record(100, true, true);
        store.record(300, false, true);
        store.record(200, false, false);

        let summary = store.get_summary();
        assert_eq!(summary.total_queries, 3);
        assert_eq!(summary.answered, 1);
        assert_eq!(summary.avg_latency_ms, 200);
        assert!(summary.error_rate > 30.0 && summary.error_rate < 35.0);
    }

    #[test]
    fn test_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        let store = MetricsStore::open(&dir.path().join("metrics.db")).unwrap();
        let summary = store.get_summary();
        assert_eq!(summary.total_queries, 0);
        assert_eq!(summary.error_rate, 0.0);
    }
}
