//! Diff compilation for audit records
//!
//! Turns the prior values a tracking session collected into the
//! `oldValue`/`newValue` map stored in the audit record, and renders that
//! map for humans.

use std::collections::BTreeMap;

use super::entry::{AuditData, FieldDiff};

/// Build the audit diff from a session's prior values and a field snapshot
///
/// Only fields written during the session appear. A field that is missing
/// from the snapshot gets an empty new value.
pub fn compile_diff(
    modified: &BTreeMap<String, String>,
    snapshot: &[(&'static str, String)],
) -> AuditData {
    modified
        .iter()
        .map(|(field, old_value)| {
            let new_value = snapshot
                .iter()
                .find(|(name, _)| name == field)
                .map(|(_, value)| value.clone())
                .unwrap_or_default();

            (
                field.clone(),
                FieldDiff {
                    old_value: old_value.clone(),
                    new_value,
                },
            )
        })
        .collect()
}

/// Generate a human-readable summary of an audit diff
///
/// Returns `None` when nothing changed.
pub fn summarize_diff(data: &AuditData) -> Option<String> {
    if data.is_empty() {
        return None;
    }

    let changes: Vec<String> = data
        .iter()
        .map(|(field, diff)| {
            format!(
                "{}: {} -> {}",
                field,
                format_value(&diff.old_value),
                format_value(&diff.new_value)
            )
        })
        .collect();

    Some(changes.join(", "))
}

/// Format a field value for display
fn format_value(value: &str) -> String {
    if value.is_empty() {
        return "(empty)".to_string();
    }

    // Truncate long strings
    if value.chars().count() > 50 {
        let head: String = value.chars().take(47).collect();
        format!("\"{}...\"", head)
    } else {
        format!("\"{}\"", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modified(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_only_modified_fields_included() {
        let snapshot = vec![
            ("customer", "ACME".to_string()),
            ("status", "SHIPPED".to_string()),
        ];
        let data = compile_diff(&modified(&[("status", "PENDING")]), &snapshot);

        assert_eq!(data.len(), 1);
        assert_eq!(data["status"].old_value, "PENDING");
        assert_eq!(data["status"].new_value, "SHIPPED");
        assert!(!data.contains_key("customer"));
    }

    #[test]
    fn test_missing_snapshot_value_is_empty() {
        let data = compile_diff(&modified(&[("gone", "x")]), &[]);
        assert_eq!(data["gone"].new_value, "");
    }

    #[test]
    fn test_summary() {
        let snapshot = vec![("notes", String::new()), ("status", "PAID".to_string())];
        let data = compile_diff(
            &modified(&[("notes", "call first"), ("status", "PENDING")]),
            &snapshot,
        );

        assert_eq!(
            summarize_diff(&data).unwrap(),
            "notes: \"call first\" -> (empty), status: \"PENDING\" -> \"PAID\""
        );
        assert!(summarize_diff(&AuditData::new()).is_none());
    }

    #[test]
    fn test_long_values_truncated() {
        let long = "x".repeat(100);
        let formatted = format_value(&long);
        assert!(formatted.ends_with("...\""));
        assert_eq!(formatted.chars().count(), 52);
    }
}
