//! Competitive Research - a Rust service for competitor discovery and analysis
//!
//! Given a company's website URL, this service discovers plausible
//! competitors via web-search APIs, scrapes marketing content from the
//! target and each competitor, and asks a chat-completion LLM to produce
//! a structured competitive analysis bundle (overview, structured
//! breakdown, positioning table, pricing, features, SWOT).
//!
//! Every stage is best-effort: missing credentials, unreachable sites, and
//! unparseable markup degrade individual fields rather than failing the
//! run. Only the top-level caller surfaces hard failures.

pub mod analysis;
pub mod assemble;
pub mod company;
pub mod discovery;
pub mod error;
pub mod record;
pub mod report;
pub mod scrape;

pub use analysis::{AnalysisBundle, AnalysisKind, AnalysisRunner, LlmConfig, PositioningTable};
pub use assemble::assemble_content;
pub use company::{company_name_from_url, CompanyIdentity};
pub use discovery::{
    CompetitorCandidate, CompetitorDiscovery, CompetitorSource, GoogleSearchCredentials,
    SearchBackends, SerpApiCredentials,
};
pub use error::{ResearchError, Result};
pub use record::{AboutContent, HomepageContent, PricingTier, ScrapeOutcome, ScrapedRecord};
pub use scrape::{Scraper, ScraperConfig};

use tracing::{info, warn};

/// Configuration for a research run. Passed explicitly into each
/// component; nothing is read from process-global state.
#[derive(Debug, Clone)]
pub struct ResearchConfig {
    pub llm: LlmConfig,
    pub search: SearchBackends,
    pub scraper: ScraperConfig,
}

impl ResearchConfig {
    pub fn new(llm: LlmConfig) -> Self {
        Self {
            llm,
            search: SearchBackends::default(),
            scraper: ScraperConfig::default(),
        }
    }

    /// Build configuration from environment variables.
    ///
    /// `OPENAI_API_KEY` is required; `SERPAPI_KEY` and
    /// `GOOGLE_SEARCH_API_KEY` + `GOOGLE_SEARCH_ENGINE_ID` are optional
    /// and discovery degrades as each is withheld.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| ResearchError::ConfigError("OPENAI_API_KEY not set".to_string()))?;

        Ok(Self {
            llm: LlmConfig::new(api_key),
            search: search_backends_from_env(),
            scraper: ScraperConfig::default(),
        })
    }
}

/// Read optional search-backend credentials from the environment
pub fn search_backends_from_env() -> SearchBackends {
    let mut search = SearchBackends::default();

    if let Ok(key) = std::env::var("SERPAPI_KEY") {
        if !key.is_empty() {
            search.serpapi = Some(SerpApiCredentials::new(key));
        }
    }

    if let (Ok(key), Ok(engine_id)) = (
        std::env::var("GOOGLE_SEARCH_API_KEY"),
        std::env::var("GOOGLE_SEARCH_ENGINE_ID"),
    ) {
        if !key.is_empty() && !engine_id.is_empty() {
            search.google = Some(GoogleSearchCredentials::new(key, engine_id));
        }
    }

    search
}

/// Everything one research run produces
#[derive(Debug, Clone)]
pub struct ResearchOutput {
    pub company: CompanyIdentity,
    pub competitors: Vec<CompetitorCandidate>,
    pub target_record: ScrapeOutcome,
    /// One record per discovered competitor, in discovery order
    pub competitor_records: Vec<(String, ScrapeOutcome)>,
    pub analyses: AnalysisBundle,
}

/// Run the full research pipeline for one target company.
///
/// The display name is derived from the URL when not provided. Individual
/// stage failures degrade their output; this function only errors on
/// configuration-level problems such as HTTP client construction.
pub async fn run_research(
    url: &str,
    display_name: Option<&str>,
    config: &ResearchConfig,
) -> Result<ResearchOutput> {
    let company = CompanyIdentity::from_url(url, display_name);
    info!("Step 1: Researching competitors for: {}", company.name);

    info!("Step 2: Discovering competitors...");
    if config.search.is_empty() {
        warn!("No search credentials configured; skipping competitor discovery");
    }
    let discovery = CompetitorDiscovery::new(config.search.clone());
    let competitors = discovery.discover(&company).await;

    info!("Step 3: Scraping target company...");
    let scraper = Scraper::with_config(config.scraper.clone())?;
    let target_record = scraper.scrape(&company.url, &company.name).await;

    info!("Step 4: Scraping {} competitor(s)...", competitors.len());
    let mut competitor_records = Vec::with_capacity(competitors.len());
    for competitor in &competitors {
        let outcome = scraper.scrape(&competitor.url, &competitor.name).await;
        if outcome.is_failed() {
            warn!("Could not scrape {}; keeping the failure record", competitor.name);
        }
        competitor_records.push((competitor.name.clone(), outcome));
    }

    info!("Step 5: Running competitive analysis...");
    let content = assemble_content(&company, &target_record, &competitor_records);
    let competitor_names: Vec<String> = competitors.iter().map(|c| c.name.clone()).collect();
    let runner = AnalysisRunner::new(config.llm.clone());
    let analyses = runner
        .analyze(&company.name, &competitor_names, &content)
        .await;

    info!("✓ Competitive research complete for {}", company.name);

    Ok(ResearchOutput {
        company,
        competitors,
        target_record,
        competitor_records,
        analyses,
    })
}
