//! Site scraper for fetching and extracting marketing content
//!
//! Every extraction step is independently fault-tolerant: a missing
//! sub-page or unmatched selector degrades that field to absent, and only
//! failure to fetch the root page collapses the record to a `Failed`
//! outcome.

use crate::error::{ResearchError, Result};
use crate::record::{AboutContent, HomepageContent, PricingTier, ScrapeOutcome, ScrapedRecord};
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::sync::OnceLock;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Candidate sub-paths probed for each optional section
const PRICING_PATHS: &[&str] = &["pricing", "plans", "price"];
const FEATURE_PATHS: &[&str] = &["features", "products", "solutions"];
const ABOUT_PATHS: &[&str] = &["about"];

/// Prioritized selector lists per homepage field; first non-empty match wins
const HEADLINE_SELECTORS: &[&str] = &["h1", ".hero-title", ".main-headline"];
const SUBHEADLINE_SELECTORS: &[&str] = &["h2", ".hero-subtitle", ".main-subtitle"];
const DESCRIPTION_SELECTORS: &[&str] = &["p", ".description", ".intro"];

const TIER_NAME_SELECTORS: &[&str] = &[".tier-name", ".plan-name", "h3", "h4"];
const TIER_PRICE_SELECTORS: &[&str] = &[".price", ".cost", ".amount"];

const ABOUT_DESCRIPTION_SELECTORS: &[&str] = &[".about-text", ".company-description", "p"];
const ABOUT_MISSION_SELECTORS: &[&str] = &[".mission", ".vision"];
const ABOUT_TEAM_SELECTORS: &[&str] = &[".team", ".leadership"];

const MAX_HOMEPAGE_FEATURES: usize = 10;
const MAX_HOMEPAGE_FEATURE_LEN: usize = 100;
const MAX_PAGE_FEATURES: usize = 20;
const MAX_PAGE_FEATURE_LEN: usize = 150;

fn feature_class_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"feature|benefit|capability").unwrap())
}

fn pricing_class_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"pricing|plan|tier").unwrap())
}

/// Configuration for the site scraper
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// Connection timeout (default: 10 seconds)
    pub connect_timeout: Duration,
    /// Request timeout for the root page (default: 10 seconds)
    pub root_timeout: Duration,
    /// Request timeout for pricing/features/about sub-pages (default: 5 seconds)
    pub subpage_timeout: Duration,
    /// Attempts for the root fetch (default: 2)
    pub max_attempts: u32,
    /// Delay between root-fetch attempts (default: 500 ms)
    pub retry_delay: Duration,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            root_timeout: Duration::from_secs(10),
            subpage_timeout: Duration::from_secs(5),
            max_attempts: 2,
            retry_delay: Duration::from_millis(500),
        }
    }
}

/// Scraper for extracting a company's marketing content
pub struct Scraper {
    client: Client,
    config: ScraperConfig,
}

impl Scraper {
    /// Create a new scraper with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(ScraperConfig::default())
    }

    /// Create a new scraper with custom configuration
    pub fn with_config(config: ScraperConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ResearchError::FetchError {
                url: "client_init".to_string(),
                source: e,
            })?;

        Ok(Self { client, config })
    }

    /// Scrape one company's site into a normalized record.
    ///
    /// Never returns an error: a failed root fetch yields the `Failed`
    /// variant, and failed sub-page probes leave their field absent.
    pub async fn scrape(&self, url: &str, display_name: &str) -> ScrapeOutcome {
        info!("Scraping {} ({})", display_name, url);

        let html = match self.fetch_root(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!("Root fetch failed for {}: {}", display_name, e);
                return ScrapeOutcome::Failed {
                    error: format!("Failed to scrape {}: {}", url, e),
                };
            }
        };

        let homepage = extract_homepage(&html);
        let pricing = self.scrape_pricing(url).await;
        let features = self.scrape_features(url).await;
        let about = self.scrape_about(url).await;

        debug!(
            "Scraped {}: {} homepage features, pricing={}, features={}, about={}",
            display_name,
            homepage.features.len(),
            pricing.is_some(),
            features.is_some(),
            about.is_some()
        );

        ScrapeOutcome::Scraped(ScrapedRecord {
            homepage,
            pricing,
            features,
            about,
        })
    }

    /// Fetch the root URL, retrying transient failures a couple of times
    async fn fetch_root(&self, url: &str) -> Result<String> {
        let mut last_error = String::new();

        for attempt in 0..self.config.max_attempts {
            if attempt > 0 {
                warn!(
                    "Retry attempt {}/{} for {}",
                    attempt, self.config.max_attempts, url
                );
                sleep(self.config.retry_delay).await;
            }

            match self.fetch_once(url, self.config.root_timeout).await {
                Ok(html) => return Ok(html),
                Err(e) => {
                    last_error = e.to_string();

                    // Don't retry on client errors (4xx) except 429 (rate limit)
                    if let ResearchError::HttpStatusError { status, .. } = &e {
                        if (400..500).contains(status) && *status != 429 {
                            return Err(e);
                        }
                    }
                }
            }
        }

        Err(ResearchError::RetryExhausted {
            url: url.to_string(),
            attempts: self.config.max_attempts,
            last_error,
        })
    }

    /// Single fetch attempt
    async fn fetch_once(&self, url: &str, timeout: Duration) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| ResearchError::FetchError {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResearchError::HttpStatusError {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| ResearchError::FetchError {
                url: url.to_string(),
                source: e,
            })?;

        debug!("Fetched {} bytes from {}", html.len(), url);
        Ok(html)
    }

    /// Try each candidate pricing path until one yields at least one tier
    async fn scrape_pricing(&self, base_url: &str) -> Option<Vec<PricingTier>> {
        for path in PRICING_PATHS {
            let url = join_path(base_url, path);
            if let Ok(html) = self.fetch_once(&url, self.config.subpage_timeout).await {
                let tiers = extract_pricing_tiers(&html);
                if !tiers.is_empty() {
                    return Some(tiers);
                }
            }
        }
        None
    }

    /// Try each candidate features path until one yields a non-empty list
    async fn scrape_features(&self, base_url: &str) -> Option<Vec<String>> {
        for path in FEATURE_PATHS {
            let url = join_path(base_url, path);
            if let Ok(html) = self.fetch_once(&url, self.config.subpage_timeout).await {
                let features = extract_page_features(&html);
                if !features.is_empty() {
                    return Some(features);
                }
            }
        }
        None
    }

    /// Fetch the about page; absent when unreachable or entirely empty
    async fn scrape_about(&self, base_url: &str) -> Option<AboutContent> {
        for path in ABOUT_PATHS {
            let url = join_path(base_url, path);
            if let Ok(html) = self.fetch_once(&url, self.config.subpage_timeout).await {
                let about = extract_about(&html);
                if !about.is_empty() {
                    return Some(about);
                }
            }
        }
        None
    }
}

fn join_path(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Extract homepage fields from raw HTML
pub(crate) fn extract_homepage(html: &str) -> HomepageContent {
    let document = Html::parse_document(html);

    HomepageContent {
        title: first_text_by_selectors(&document, &["title"]),
        headline: first_text_by_selectors(&document, HEADLINE_SELECTORS),
        subheadline: first_text_by_selectors(&document, SUBHEADLINE_SELECTORS),
        description: first_text_by_selectors(&document, DESCRIPTION_SELECTORS),
        features: extract_homepage_features(&document),
    }
}

fn extract_homepage_features(document: &Html) -> Vec<String> {
    let selector = Selector::parse("li, div").unwrap();
    let pattern = feature_class_pattern();

    let mut features = Vec::new();
    for element in document.select(&selector) {
        if !class_matches(&element, pattern) {
            continue;
        }
        let text = element_text(&element);
        if !text.is_empty() && text.chars().count() < MAX_HOMEPAGE_FEATURE_LEN {
            features.push(text);
        }
        if features.len() >= MAX_HOMEPAGE_FEATURES {
            break;
        }
    }

    features
}

/// Extract pricing tiers from a pricing page.
///
/// An element contributes a tier only when both a name and a price
/// selector match non-empty text.
pub(crate) fn extract_pricing_tiers(html: &str) -> Vec<PricingTier> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div, tr").unwrap();
    let pattern = pricing_class_pattern();

    let mut tiers = Vec::new();
    for element in document.select(&selector) {
        if !class_matches(&element, pattern) {
            continue;
        }
        let name = first_text_in_element(&element, TIER_NAME_SELECTORS);
        let price = first_text_in_element(&element, TIER_PRICE_SELECTORS);
        if !name.is_empty() && !price.is_empty() {
            tiers.push(PricingTier { name, price });
        }
    }

    tiers
}

/// Extract the feature list from a dedicated features page
pub(crate) fn extract_page_features(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse("div, li").unwrap();
    let pattern = feature_class_pattern();

    let mut features = Vec::new();
    for element in document.select(&selector) {
        if !class_matches(&element, pattern) {
            continue;
        }
        let text = element_text(&element);
        if !text.is_empty() && text.chars().count() < MAX_PAGE_FEATURE_LEN {
            features.push(text);
        }
        if features.len() >= MAX_PAGE_FEATURES {
            break;
        }
    }

    features
}

/// Extract about-page content
pub(crate) fn extract_about(html: &str) -> AboutContent {
    let document = Html::parse_document(html);

    AboutContent {
        description: first_text_by_selectors(&document, ABOUT_DESCRIPTION_SELECTORS),
        mission: first_text_by_selectors(&document, ABOUT_MISSION_SELECTORS),
        team_info: first_text_by_selectors(&document, ABOUT_TEAM_SELECTORS),
    }
}

/// First selector in the list whose first match yields non-empty text
fn first_text_by_selectors(document: &Html, selectors: &[&str]) -> String {
    for raw in selectors {
        if let Ok(selector) = Selector::parse(raw) {
            if let Some(element) = document.select(&selector).next() {
                let text = element_text(&element);
                if !text.is_empty() {
                    return text;
                }
            }
        }
    }
    String::new()
}

/// Same fallback rule, scoped to the descendants of one element
fn first_text_in_element(element: &ElementRef, selectors: &[&str]) -> String {
    for raw in selectors {
        if let Ok(selector) = Selector::parse(raw) {
            if let Some(found) = element.select(&selector).next() {
                let text = element_text(&found);
                if !text.is_empty() {
                    return text;
                }
            }
        }
    }
    String::new()
}

fn element_text(element: &ElementRef) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn class_matches(element: &ElementRef, pattern: &Regex) -> bool {
    element
        .value()
        .attr("class")
        .map(|classes| pattern.is_match(classes))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headline_falls_back_through_selector_list() {
        let html = r#"<html><body><div class="hero-title">Ship faster</div></body></html>"#;
        let homepage = extract_homepage(html);
        assert_eq!(homepage.headline, "Ship faster");

        let html = r#"<html><body><h1>Primary</h1><div class="hero-title">Secondary</div></body></html>"#;
        let homepage = extract_homepage(html);
        assert_eq!(homepage.headline, "Primary");
    }

    #[test]
    fn page_without_matching_selectors_yields_empty_fields() {
        let homepage = extract_homepage("<html><body><span>nothing here</span></body></html>");
        assert_eq!(homepage.title, "");
        assert_eq!(homepage.headline, "");
        assert_eq!(homepage.subheadline, "");
        assert_eq!(homepage.description, "");
        assert!(homepage.features.is_empty());
    }

    #[test]
    fn empty_h1_falls_through_to_next_selector() {
        let html = r#"<html><body><h1>   </h1><div class="hero-title">Real headline</div></body></html>"#;
        let homepage = extract_homepage(html);
        assert_eq!(homepage.headline, "Real headline");
    }

    #[test]
    fn homepage_features_respect_class_pattern_and_caps() {
        let mut html = String::from("<html><body><ul>");
        for i in 0..15 {
            html.push_str(&format!(r#"<li class="feature-item">Feature {}</li>"#, i));
        }
        html.push_str(r#"<li class="nav-item">Not a feature</li>"#);
        html.push_str(&format!(
            r#"<li class="benefit">{}</li>"#,
            "x".repeat(150)
        ));
        html.push_str("</ul></body></html>");

        let homepage = extract_homepage(&html);
        assert_eq!(homepage.features.len(), MAX_HOMEPAGE_FEATURES);
        assert!(homepage.features.iter().all(|f| f.starts_with("Feature")));
    }

    #[test]
    fn pricing_tier_requires_both_name_and_price() {
        let html = r#"<html><body>
            <div class="pricing-card">
                <h3>Starter</h3>
                <span class="price">$9/mo</span>
            </div>
            <div class="plan">
                <h3>Nameless price missing</h3>
            </div>
            <div class="tier">
                <span class="price">$99/mo</span>
            </div>
        </body></html>"#;

        let tiers = extract_pricing_tiers(html);
        assert_eq!(
            tiers,
            vec![PricingTier {
                name: "Starter".to_string(),
                price: "$9/mo".to_string(),
            }]
        );
    }

    #[test]
    fn tier_name_prefers_dedicated_class_over_heading() {
        let html = r#"<html><body>
            <div class="plan">
                <h3>Heading</h3>
                <span class="plan-name">Team</span>
                <span class="cost">$49</span>
            </div>
        </body></html>"#;

        let tiers = extract_pricing_tiers(html);
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].name, "Team");
        assert_eq!(tiers[0].price, "$49");
    }

    #[test]
    fn page_features_use_longer_limit_and_larger_cap() {
        let long_but_ok = "y".repeat(120);
        let html = format!(
            r#"<html><body>
                <div class="capability">{}</div>
                <div class="capability">{}</div>
            </body></html>"#,
            long_but_ok,
            "z".repeat(200)
        );

        let features = extract_page_features(&html);
        assert_eq!(features, vec![long_but_ok]);
    }

    #[test]
    fn about_extraction_uses_selector_fallbacks() {
        let html = r#"<html><body>
            <p>We build rockets.</p>
            <div class="mission">To the stars</div>
        </body></html>"#;

        let about = extract_about(html);
        assert_eq!(about.description, "We build rockets.");
        assert_eq!(about.mission, "To the stars");
        assert_eq!(about.team_info, "");
        assert!(!about.is_empty());
    }

    #[test]
    fn join_path_tolerates_trailing_slash() {
        assert_eq!(join_path("https://acme.com/", "pricing"), "https://acme.com/pricing");
        assert_eq!(join_path("https://acme.com", "about"), "https://acme.com/about");
    }

    #[test]
    fn scraper_config_default_values() {
        let config = ScraperConfig::default();
        assert_eq!(config.root_timeout, Duration::from_secs(10));
        assert_eq!(config.subpage_timeout, Duration::from_secs(5));
        assert_eq!(config.max_attempts, 2);
    }
}
