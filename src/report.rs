//! Report rendering
//!
//! Produces the two export documents consumed by the presentation layer: a
//! JSON document and a plain-text report with markdown-style headings.
//! Rendering takes the generation timestamp as a parameter so both outputs
//! are pure functions of their inputs.

use crate::analysis::{AnalysisBundle, AnalysisKind};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

/// The JSON export document:
/// `{company, timestamp, overview, pricing, features, swot}`
pub fn export_json(
    company_name: &str,
    bundle: &AnalysisBundle,
    generated_at: DateTime<Utc>,
) -> Value {
    json!({
        "company": company_name,
        "timestamp": generated_at.to_rfc3339(),
        "overview": bundle.get(AnalysisKind::Overview),
        "pricing": bundle.get(AnalysisKind::Pricing),
        "features": bundle.get(AnalysisKind::Features),
        "swot": bundle.get(AnalysisKind::Swot),
    })
}

/// Pretty-printed JSON export
pub fn export_json_string(
    company_name: &str,
    bundle: &AnalysisBundle,
    generated_at: DateTime<Utc>,
) -> Result<String> {
    Ok(serde_json::to_string_pretty(&export_json(
        company_name,
        bundle,
        generated_at,
    ))?)
}

/// Plain-text report with the same sections under markdown headings
pub fn export_text(
    company_name: &str,
    bundle: &AnalysisBundle,
    generated_at: DateTime<Utc>,
) -> String {
    let mut report = String::new();

    report.push_str(&format!("# {} - Competitive Research Report\n\n", company_name));

    let sections = [
        ("Competitive Overview", AnalysisKind::Overview),
        ("Pricing Comparison", AnalysisKind::Pricing),
        ("Feature Comparison", AnalysisKind::Features),
        ("SWOT Analysis", AnalysisKind::Swot),
    ];

    for (heading, kind) in sections {
        report.push_str(&format!("## {}\n{}\n\n", heading, bundle.get(kind)));
    }

    report.push_str("---\n");
    report.push_str(&format!(
        "Generated on: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    report
}

/// Sanitize a company name into a safe report file stem
pub fn report_file_stem(company_name: &str) -> String {
    let sanitized: String = company_name
        .to_lowercase()
        .replace([' ', '.'], "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect();

    let sanitized = sanitized.trim_matches('-').to_string();
    if sanitized.is_empty() {
        "unknown".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bundle() -> AnalysisBundle {
        AnalysisBundle::from_sections([
            (AnalysisKind::Overview, "the overview".to_string()),
            (AnalysisKind::Pricing, "the pricing".to_string()),
            (AnalysisKind::Features, "the features".to_string()),
            (AnalysisKind::Swot, "the swot".to_string()),
            (AnalysisKind::TableData, "[]".to_string()),
            (AnalysisKind::StructuredAnalysis, "rows".to_string()),
        ])
    }

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap()
    }

    #[test]
    fn json_export_has_exactly_the_six_keys() {
        let value = export_json("Stripe", &bundle(), fixed_time());
        let object = value.as_object().unwrap();

        let mut keys: Vec<&str> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["company", "features", "overview", "pricing", "swot", "timestamp"]
        );

        assert_eq!(object["company"], "Stripe");
        assert_eq!(object["overview"], "the overview");
        assert_eq!(object["timestamp"], "2024-05-01T12:30:00+00:00");
    }

    #[test]
    fn json_export_is_deterministic_for_fixed_timestamp() {
        let a = export_json_string("Stripe", &bundle(), fixed_time()).unwrap();
        let b = export_json_string("Stripe", &bundle(), fixed_time()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn text_report_carries_headings_and_timestamp() {
        let report = export_text("Stripe", &bundle(), fixed_time());
        assert!(report.starts_with("# Stripe - Competitive Research Report"));
        for heading in [
            "## Competitive Overview",
            "## Pricing Comparison",
            "## Feature Comparison",
            "## SWOT Analysis",
        ] {
            assert!(report.contains(heading));
        }
        assert!(report.contains("Generated on: 2024-05-01 12:30:00"));
    }

    #[test]
    fn file_stem_is_filesystem_safe() {
        assert_eq!(report_file_stem("Acme Rocket Labs"), "acme-rocket-labs");
        assert_eq!(report_file_stem("Unknown Company"), "unknown-company");
        assert_eq!(report_file_stem("***"), "unknown");
    }
}
