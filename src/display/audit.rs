//! Audit log display formatting

use crate::audit::AuditLogRecord;

/// Format audit records, one human-readable block each
pub fn format_audit_list(records: &[AuditLogRecord]) -> String {
    if records.is_empty() {
        return "No audit entries found.\n".to_string();
    }

    let mut output = String::new();
    for record in records {
        output.push_str(&record.format_human_readable());
        if !output.ends_with('\n') {
            output.push('\n');
        }
    }
    let noun = if records.len() == 1 { "entry" } else { "entries" };
    output.push_str(&format!("\n{} {}\n", records.len(), noun));
    output
}
