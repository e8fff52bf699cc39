//! Row detail projections.
//!
//! Selecting a row derives an "expected" and an "implemented" projection;
//! both replace whatever the detail pane held before. Each projection keeps
//! its own serialized text so the copy actions never re-derive it.

use serde::Serialize;

use crate::model::{ComparisonRow, StatusKind};

/// Placeholder shown (and copied) when a row carries no schema snippet.
pub const NO_SNIPPET_PLACEHOLDER: &str = "No snippet";

/// What the requirement expected, serialized for display.
#[derive(Debug, Serialize)]
struct ExpectedProjection<'a> {
    field_key: &'a str,
    expected_type: Option<&'a str>,
    expected_required: Option<bool>,
    req_id: &'a str,
}

/// Detail-pane content for exactly one row; last-selected wins.
#[derive(Debug, Clone)]
pub struct RowDetail {
    pub field_key: String,
    pub status: StatusKind,
    pub best_match: String,
    /// Pretty-printed expected projection; the "Copy expected" payload.
    pub expected: String,
    /// Raw schema snippet or the placeholder; the "Copy implemented" payload.
    pub implemented: String,
}

impl RowDetail {
    pub fn from_row(row: &ComparisonRow) -> Self {
        let projection = ExpectedProjection {
            field_key: &row.field_key,
            expected_type: row.expected_type.as_deref(),
            expected_required: row.expected_required,
            req_id: &row.req_id,
        };
        let expected =
            serde_json::to_string_pretty(&projection).unwrap_or_else(|_| "{}".to_string());
        let implemented = row
            .raw_snippet
            .clone()
            .unwrap_or_else(|| NO_SNIPPET_PLACEHOLDER.to_string());
        Self {
            field_key: row.field_key.clone(),
            status: row.status,
            best_match: row.best_match_display().to_string(),
            expected,
            implemented,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> ComparisonRow {
        ComparisonRow {
            req_id: "R1".into(),
            field_key: "age".into(),
            status: StatusKind::Mismatch,
            best_match_key: None,
            raw_snippet: Some("int32".into()),
            expected_type: Some("integer".into()),
            expected_required: Some(true),
        }
    }

    #[test]
    fn expected_projection_serializes_all_fields() {
        let detail = RowDetail::from_row(&sample_row());
        assert!(detail.expected.contains("\"field_key\": \"age\""));
        assert!(detail.expected.contains("\"expected_type\": \"integer\""));
        assert!(detail.expected.contains("\"expected_required\": true"));
        assert!(detail.expected.contains("\"req_id\": \"R1\""));
    }

    #[test]
    fn missing_snippet_uses_placeholder() {
        let mut row = sample_row();
        row.raw_snippet = None;
        let detail = RowDetail::from_row(&row);
        assert_eq!(detail.implemented, NO_SNIPPET_PLACEHOLDER);
    }

    #[test]
    fn missing_best_match_keeps_column_alignment() {
        let detail = RowDetail::from_row(&sample_row());
        assert_eq!(detail.best_match, "-");
    }

    #[test]
    fn absent_expected_fields_serialize_as_null() {
        let mut row = sample_row();
        row.expected_type = None;
        row.expected_required = None;
        let detail = RowDetail::from_row(&row);
        assert!(detail.expected.contains("\"expected_type\": null"));
        assert!(detail.expected.contains("\"expected_required\": null"));
    }
}
