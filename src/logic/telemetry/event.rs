//! Telemetry Stats & Events
//!
//! Named statistics published to the monitoring system, wrapped in
//! timestamped events for the append-only log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// STAT NAMES
// ============================================================================

pub const PREDICTIONS_COUNT: &str = "Predictions Count";
pub const DISTRIBUTION_TABLE: &str = "Prediction Distribution Table";
pub const DISTRIBUTION_BAR_GRAPH: &str = "Prediction Distribution Bar Graph";
pub const LOW_CONFIDENCE_COUNT: &str = "Low Confidence Predictions";
pub const MEAN_RECENT_CONFIDENCE: &str = "Mean Recent Confidence";
pub const INPUT_DISTRIBUTION: &str = "Input Pixel Distribution";
pub const CONFIDENCE_ALERT: &str = "Prediction Confidence Degraded";

// ============================================================================
// STAT
// ============================================================================

/// One table row, keyed by the running prediction total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub key: String,
    pub values: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stat {
    /// Named counter / gauge
    Scalar { name: String, value: f64 },
    /// Named table; rows accumulate over the run
    Table {
        name: String,
        columns: Vec<String>,
        rows: Vec<TableRow>,
    },
    /// Named count vector, one bar per column
    BarGraph {
        name: String,
        columns: Vec<String>,
        values: Vec<u64>,
    },
    /// Health alert
    Alert { title: String, description: String },
    /// Lifecycle marker (run start / stop)
    Marker {
        name: String,
        metadata: serde_json::Value,
    },
}

impl Stat {
    pub fn scalar(name: &str, value: f64) -> Self {
        Stat::Scalar { name: name.to_string(), value }
    }

    pub fn bar_graph(name: &str, columns: &[String], values: Vec<u64>) -> Self {
        Stat::BarGraph {
            name: name.to_string(),
            columns: columns.to_vec(),
            values,
        }
    }

    pub fn table(name: &str, columns: &[String], rows: Vec<TableRow>) -> Self {
        Stat::Table {
            name: name.to_string(),
            columns: columns.to_vec(),
            rows,
        }
    }

    pub fn alert(title: &str, description: String) -> Self {
        Stat::Alert { title: title.to_string(), description }
    }

    pub fn marker(name: &str, metadata: serde_json::Value) -> Self {
        Stat::Marker { name: name.to_string(), metadata }
    }

    pub fn name(&self) -> &str {
        match self {
            Stat::Scalar { name, .. }
            | Stat::Table { name, .. }
            | Stat::BarGraph { name, .. }
            | Stat::Marker { name, .. } => name,
            Stat::Alert { title, .. } => title,
        }
    }

    pub fn is_alert(&self) -> bool {
        matches!(self, Stat::Alert { .. })
    }
}

// ============================================================================
// TELEMETRY EVENT
// ============================================================================

/// Immutable, timestamped wrapper written to the telemetry log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryEvent {
    /// Unique event ID
    pub id: String,
    /// When the stat was published (UTC)
    pub timestamp: DateTime<Utc>,
    /// Run ID (for correlating events of the same run)
    pub session_id: String,
    pub stat: Stat,
}

impl TelemetryEvent {
    pub fn new(session_id: &str, stat: Stat) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now(),
            session_id: session_id.to_string(),
            stat,
        }
    }

    /// Convert to JSONL line (for append-only log)
    pub fn to_jsonl(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stat_tagging() {
        let stat = Stat::scalar(PREDICTIONS_COUNT, 100.0);
        let json = serde_json::to_value(&stat).unwrap();
        assert_eq!(json["kind"], "scalar");
        assert_eq!(json["name"], PREDICTIONS_COUNT);
    }

    #[test]
    fn test_stat_name() {
        let labels = vec!["0".to_string(), "1".to_string()];
        assert_eq!(Stat::bar_graph(DISTRIBUTION_BAR_GRAPH, &labels, vec![1, 2]).name(), DISTRIBUTION_BAR_GRAPH);
        assert_eq!(Stat::alert(CONFIDENCE_ALERT, "x".into()).name(), CONFIDENCE_ALERT);
        assert!(Stat::alert(CONFIDENCE_ALERT, "x".into()).is_alert());
    }

    #[test]
    fn test_event_to_jsonl() {
        let event = TelemetryEvent::new("run-1", Stat::scalar("x", 1.0));
        let jsonl = event.to_jsonl();
        assert!(!jsonl.contains('\n'));

        let back: TelemetryEvent = serde_json::from_str(&jsonl).unwrap();
        assert_eq!(back.session_id, "run-1");
        assert_eq!(back.stat, Stat::scalar("x", 1.0));
    }
}
