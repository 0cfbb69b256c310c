//! Tax rate display formatting

use super::format_optional_time;
use crate::models::TaxRate;
use crate::tracking::Entity;
use crate::versioning::Versioned;

/// Format the latest version of each rate as a table
pub fn format_rate_list(rates: &[TaxRate]) -> String {
    if rates.is_empty() {
        return "No tax rates found.\n".to_string();
    }

    let code_width = rates
        .iter()
        .map(|r| r.code().len())
        .max()
        .unwrap_or(4)
        .max(4);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<code_width$}  {:>8}  {:<8}  {:<23}  {}\n",
        "Code",
        "Rate",
        "Status",
        "Effective",
        "Description",
        code_width = code_width,
    ));
    output.push_str(&format!(
        "{:-<code_width$}  {:->8}  {:-<8}  {:-<23}  {:-<11}\n",
        "",
        "",
        "",
        "",
        "",
        code_width = code_width,
    ));

    for rate in rates {
        output.push_str(&format!(
            "{:<code_width$}  {:>8}  {:<8}  {:<23}  {}\n",
            rate.code(),
            rate.format_percent(),
            rate.status().to_string(),
            format_optional_time(rate.effective_time()),
            rate.description().unwrap_or(""),
            code_width = code_width,
        ));
    }

    output
}

/// Format every version of one rate, oldest first
pub fn format_rate_history(versions: &[TaxRate]) -> String {
    let Some(first) = versions.first() else {
        return "No versions found.\n".to_string();
    };

    let mut output = String::new();
    output.push_str(&format!(
        "History of {} ({} version(s))\n",
        first.code(),
        versions.len()
    ));
    output.push_str(&format!(
        "  {:>6}  {:<23}  {:>8}  {:<8}  {}\n",
        "Row", "Effective", "Rate", "Status", "Created By"
    ));

    for version in versions {
        output.push_str(&format!(
            "  {:>6}  {:<23}  {:>8}  {:<8}  {}\n",
            version.row_id().map(|id| id.to_string()).unwrap_or_default(),
            format_optional_time(version.effective_time()),
            version.format_percent(),
            version.status().to_string(),
            version
                .created_by()
                .map(|a| a.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ));
    }

    output
}

/// Format a single rate version
pub fn format_rate_details(rate: &TaxRate) -> String {
    let mut output = String::new();

    output.push_str(&format!("Tax rate: {}\n", rate.code()));
    output.push_str(&format!("  Rate:         {}\n", rate.format_percent()));
    output.push_str(&format!("  Status:       {}\n", rate.status()));
    if let Some(description) = rate.description() {
        output.push_str(&format!("  Description:  {}\n", description));
    }
    output.push_str(&format!(
        "  Effective:    {}\n",
        format_optional_time(rate.effective_time())
    ));
    output.push_str(&format!(
        "  Version Row:  {}\n",
        rate.row_id().map(|id| id.to_string()).unwrap_or_default()
    ));
    output.push_str(&format!(
        "  Created:      {}\n",
        format_optional_time(rate.created_on())
    ));

    output
}
