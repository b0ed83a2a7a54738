//! Scraped-content data structures
//!
//! One `ScrapeOutcome` exists per company by the end of the scraping phase.
//! Absence of a sub-page is a valid terminal state for its field; only a
//! failed root fetch collapses the whole record into the `Failed` variant.

use serde::{Deserialize, Serialize};

/// Result of scraping one company's site.
///
/// A tagged variant rather than a field-per-state mapping, so downstream
/// code cannot treat an error record as valid data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScrapeOutcome {
    /// The root page was fetched; sub-page fields may still be absent
    Scraped(ScrapedRecord),
    /// The root fetch itself failed; nothing was extracted
    Failed { error: String },
}

impl ScrapeOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, ScrapeOutcome::Failed { .. })
    }

    /// Compact text rendering used when assembling LLM prompt content.
    /// Failed outcomes are preserved and shown, not silently dropped.
    pub fn prompt_summary(&self) -> String {
        match self {
            ScrapeOutcome::Scraped(record) => record.prompt_summary(),
            ScrapeOutcome::Failed { error } => format!("Scrape failed: {}", error),
        }
    }
}

/// Normalized content extracted from one company's website
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScrapedRecord {
    pub homepage: HomepageContent,
    /// Pricing tiers from a dedicated pricing page, absent when no candidate
    /// sub-page yielded any tier
    pub pricing: Option<Vec<PricingTier>>,
    /// Feature list from a dedicated features page
    pub features: Option<Vec<String>>,
    /// About-page content
    pub about: Option<AboutContent>,
}

impl ScrapedRecord {
    pub fn prompt_summary(&self) -> String {
        let mut lines = Vec::new();
        let homepage = self.homepage.prompt_summary();
        if !homepage.is_empty() {
            lines.push(homepage);
        }
        if let Some(tiers) = &self.pricing {
            let rendered: Vec<String> = tiers
                .iter()
                .map(|t| format!("{} at {}", t.name, t.price))
                .collect();
            lines.push(format!("Pricing: {}", rendered.join("; ")));
        }
        if let Some(features) = &self.features {
            lines.push(format!("Features: {}", features.join("; ")));
        }
        if let Some(about) = &self.about {
            let rendered = about.prompt_summary();
            if !rendered.is_empty() {
                lines.push(rendered);
            }
        }
        lines.join("\n")
    }
}

/// Key homepage content. All fields default to empty, never null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HomepageContent {
    pub title: String,
    pub headline: String,
    pub subheadline: String,
    pub description: String,
    /// Feature snippets found on the homepage itself (at most 10)
    pub features: Vec<String>,
}

impl HomepageContent {
    fn prompt_summary(&self) -> String {
        let mut lines = Vec::new();
        for (label, value) in [
            ("Title", &self.title),
            ("Headline", &self.headline),
            ("Subheadline", &self.subheadline),
            ("Description", &self.description),
        ] {
            if !value.is_empty() {
                lines.push(format!("{}: {}", label, value));
            }
        }
        if !self.features.is_empty() {
            lines.push(format!("Homepage features: {}", self.features.join("; ")));
        }
        lines.join("\n")
    }
}

/// A single pricing tier. Kept only when both name and price are non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingTier {
    pub name: String,
    pub price: String,
}

/// About-page content
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AboutContent {
    pub description: String,
    pub mission: String,
    pub team_info: String,
}

impl AboutContent {
    pub fn is_empty(&self) -> bool {
        self.description.is_empty() && self.mission.is_empty() && self.team_info.is_empty()
    }

    fn prompt_summary(&self) -> String {
        let mut lines = Vec::new();
        for (label, value) in [
            ("About", &self.description),
            ("Mission", &self.mission),
            ("Team", &self.team_info),
        ] {
            if !value.is_empty() {
                lines.push(format!("{}: {}", label, value));
            }
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_outcome_summary_carries_the_error() {
        let outcome = ScrapeOutcome::Failed {
            error: "connection refused".to_string(),
        };
        assert!(outcome.is_failed());
        assert_eq!(outcome.prompt_summary(), "Scrape failed: connection refused");
    }

    #[test]
    fn empty_record_summarizes_to_empty_string() {
        let outcome = ScrapeOutcome::Scraped(ScrapedRecord::default());
        assert!(!outcome.is_failed());
        assert_eq!(outcome.prompt_summary(), "");
    }

    #[test]
    fn summary_skips_absent_fields() {
        let record = ScrapedRecord {
            homepage: HomepageContent {
                title: "Acme".to_string(),
                headline: "Rockets for everyone".to_string(),
                ..Default::default()
            },
            pricing: Some(vec![PricingTier {
                name: "Pro".to_string(),
                price: "$29/mo".to_string(),
            }]),
            features: None,
            about: None,
        };
        let summary = record.prompt_summary();
        assert!(summary.contains("Title: Acme"));
        assert!(summary.contains("Headline: Rockets for everyone"));
        assert!(summary.contains("Pricing: Pro at $29/mo"));
        assert!(!summary.contains("Subheadline"));
        assert!(!summary.contains("Features:"));
    }
}
