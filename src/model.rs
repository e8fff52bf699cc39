//! Wire and display model for comparison results and report metadata.
//!
//! Everything here mirrors the server contract: shapes are decoded once per
//! remote call and held immutably by the UI afterwards.

use serde::{Deserialize, Serialize};

/// Outcome status of one requirement/schema comparison row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    #[serde(rename = "MATCHED")]
    Matched,
    #[serde(rename = "MISMATCH")]
    Mismatch,
    #[serde(rename = "MISSING")]
    Missing,
    #[serde(rename = "POSSIBLE_MATCH")]
    PossibleMatch,
}

impl StatusKind {
    /// Wire/display label, identical to the serialized form.
    pub fn label(self) -> &'static str {
        match self {
            Self::Matched => "MATCHED",
            Self::Mismatch => "MISMATCH",
            Self::Missing => "MISSING",
            Self::PossibleMatch => "POSSIBLE_MATCH",
        }
    }
}

/// One comparison row. Identity is positional (row index); rows are never
/// mutated after decode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub req_id: String,
    pub field_key: String,
    pub status: StatusKind,
    #[serde(default)]
    pub best_match_key: Option<String>,
    #[serde(default)]
    pub raw_snippet: Option<String>,
    #[serde(default)]
    pub expected_type: Option<String>,
    #[serde(default)]
    pub expected_required: Option<bool>,
}

impl ComparisonRow {
    /// Display form of `best_match_key`; absent values render as "-" so the
    /// column never collapses.
    pub fn best_match_display(&self) -> &str {
        self.best_match_key.as_deref().unwrap_or("-")
    }
}

/// Per-status row counts reported alongside a comparison result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(rename = "MATCHED", default)]
    pub matched: usize,
    #[serde(rename = "MISMATCH", default)]
    pub mismatch: usize,
    #[serde(rename = "MISSING", default)]
    pub missing: usize,
    #[serde(rename = "POSSIBLE_MATCH", default)]
    pub possible_match: usize,
}

impl StatusCounts {
    pub fn total(&self) -> usize {
        self.matched + self.mismatch + self.missing + self.possible_match
    }

    pub fn get(&self, status: StatusKind) -> usize {
        match status {
            StatusKind::Matched => self.matched,
            StatusKind::Mismatch => self.mismatch,
            StatusKind::Missing => self.missing,
            StatusKind::PossibleMatch => self.possible_match,
        }
    }

    /// Rounded percentage of `status` over the total; 0 when the total is 0.
    pub fn percent(&self, status: StatusKind) -> u32 {
        let total = self.total();
        if total == 0 {
            return 0;
        }
        ((self.get(status) as f64 / total as f64) * 100.0).round() as u32
    }

    /// Counts must partition the row set when both are present in one result.
    pub fn partitions(&self, row_count: usize) -> bool {
        self.total() == row_count
    }
}

/// Pointer to the generated report file for a comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRef {
    pub path: String,
    pub url: String,
}

/// Full result of one comparator invocation. Replaced wholesale on each new
/// comparison; there is no incremental merge.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonResult {
    #[serde(default)]
    pub rows: Vec<ComparisonRow>,
    #[serde(default)]
    pub counts: StatusCounts,
    #[serde(default)]
    pub report: Option<ReportRef>,
}

/// A previously generated report as listed by the report store.
/// Identity is `path`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub name: String,
    pub path: String,
    /// Unix timestamp (seconds) of last modification.
    #[serde(default)]
    pub modified: i64,
    /// Size in bytes.
    #[serde(default)]
    pub size: u64,
}

impl ReportEntry {
    /// "2026-08-07 14:02 • 1234 bytes" line for list rendering.
    pub fn meta_line(&self) -> String {
        let when = chrono::DateTime::from_timestamp(self.modified, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        format!("{when} \u{2022} {} bytes", self.size)
    }
}

/// Highlighted example row inside a structured analysis payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisExample {
    #[serde(default)]
    pub req_id: Option<String>,
    #[serde(default)]
    pub field_key: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub raw_snippet: Option<String>,
}

/// Structured portion of a generative analysis. The server may attach
/// arbitrary extra keys; they round-trip through `extra` for the copy-JSON
/// action.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StructuredAnalysis {
    #[serde(default)]
    pub examples: Vec<AnalysisExample>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Generative full-text analysis of a report. Transient: held only while
/// the analysis surface is open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis: String,
    #[serde(default)]
    pub structured: Option<StructuredAnalysis>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: StatusKind) -> ComparisonRow {
        ComparisonRow {
            req_id: "R1".into(),
            field_key: "age".into(),
            status,
            best_match_key: None,
            raw_snippet: Some("int32".into()),
            expected_type: Some("integer".into()),
            expected_required: Some(true),
        }
    }

    #[test]
    fn counts_partition_row_set() {
        let counts = StatusCounts {
            matched: 2,
            mismatch: 1,
            missing: 1,
            possible_match: 0,
        };
        assert_eq!(counts.total(), 4);
        assert!(counts.partitions(4));
        assert!(!counts.partitions(5));
    }

    #[test]
    fn single_mismatch_renders_hundred_percent() {
        let counts = StatusCounts {
            mismatch: 1,
            ..StatusCounts::default()
        };
        assert_eq!(counts.percent(StatusKind::Mismatch), 100);
        assert_eq!(counts.percent(StatusKind::Matched), 0);
    }

    #[test]
    fn percent_is_zero_when_empty() {
        let counts = StatusCounts::default();
        for status in [
            StatusKind::Matched,
            StatusKind::Mismatch,
            StatusKind::Missing,
            StatusKind::PossibleMatch,
        ] {
            assert_eq!(counts.percent(status), 0);
        }
    }

    #[test]
    fn missing_best_match_renders_placeholder() {
        let r = row(StatusKind::Mismatch);
        assert_eq!(r.best_match_display(), "-");
    }

    #[test]
    fn status_kind_decodes_wire_names() {
        let s: StatusKind = serde_json::from_str("\"POSSIBLE_MATCH\"").unwrap();
        assert_eq!(s, StatusKind::PossibleMatch);
        assert_eq!(s.label(), "POSSIBLE_MATCH");
    }

    #[test]
    fn comparison_result_decodes_with_nullable_fields() {
        let json = r#"{
            "rows": [{
                "req_id": "R1",
                "field_key": "age",
                "status": "MISMATCH",
                "best_match_key": null,
                "raw_snippet": "int32"
            }],
            "counts": {"MATCHED": 0, "MISMATCH": 1, "MISSING": 0, "POSSIBLE_MATCH": 0},
            "report": {"path": "reports/r1.xlsx", "url": "/download?path=reports%2Fr1.xlsx"}
        }"#;
        let result: ComparisonResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert!(result.counts.partitions(result.rows.len()));
        assert_eq!(result.rows[0].expected_type, None);
        assert!(result.report.is_some());
    }

    #[test]
    fn structured_analysis_keeps_extra_keys() {
        let json = r#"{"examples": [], "mismatch_rate": 0.25}"#;
        let s: StructuredAnalysis = serde_json::from_str(json).unwrap();
        assert!(s.examples.is_empty());
        assert!(s.extra.contains_key("mismatch_rate"));
    }
}
