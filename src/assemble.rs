//! Competitive content assembly
//!
//! Merges the target's scraped record and every competitor's record into
//! one textual bundle used as the content section of every analysis
//! prompt. Pure function of its inputs: identical records in identical
//! order produce byte-identical output.

use crate::company::CompanyIdentity;
use crate::record::{ScrapeOutcome, ScrapedRecord};

/// Hard cap on the assembled bundle, applied before prompt interpolation
/// so content-heavy sites cannot blow past model context limits.
pub const MAX_CONTENT_LEN: usize = 15_000;

const TRUNCATION_SUFFIX: &str = "... [truncated]";

/// Assemble the prompt content bundle for one run.
///
/// `competitor_records` must be in a fixed order (discovery order) for the
/// output to be deterministic across runs.
pub fn assemble_content(
    target: &CompanyIdentity,
    target_record: &ScrapeOutcome,
    competitor_records: &[(String, ScrapeOutcome)],
) -> String {
    let mut content = format!("TARGET COMPANY: {}\n\n", target.name);

    match target_record {
        ScrapeOutcome::Scraped(record) => push_target_sections(&mut content, record),
        ScrapeOutcome::Failed { error } => {
            content.push_str(&format!("TARGET DATA UNAVAILABLE: {}\n\n", error));
        }
    }

    if !competitor_records.is_empty() {
        content.push_str("COMPETITORS:\n");
        for (name, outcome) in competitor_records {
            content.push_str(&format!("{}:\n{}\n\n", name, outcome.prompt_summary()));
        }
    }

    cap_content(&content)
}

fn push_target_sections(content: &mut String, record: &ScrapedRecord) {
    content.push_str(&format!(
        "TARGET HOMEPAGE:\n{}\n\n",
        record.prompt_summary()
    ));

    if let Some(tiers) = &record.pricing {
        let rendered: Vec<String> = tiers
            .iter()
            .map(|t| format!("{} at {}", t.name, t.price))
            .collect();
        content.push_str(&format!("TARGET PRICING: {}\n\n", rendered.join("; ")));
    }

    if let Some(features) = &record.features {
        content.push_str(&format!("TARGET FEATURES: {}\n\n", features.join("; ")));
    }
}

fn cap_content(content: &str) -> String {
    if content.len() <= MAX_CONTENT_LEN {
        return content.to_string();
    }
    format!(
        "{}{}",
        truncate_utf8(content, MAX_CONTENT_LEN),
        TRUNCATION_SUFFIX
    )
}

/// Truncate to at most `max_bytes`, backing off to a char boundary
pub(crate) fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    &s[..end]
}
