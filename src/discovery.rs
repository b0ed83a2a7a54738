//! Competitor discovery via pluggable web-search backends
//!
//! Issues a fixed set of query templates against SerpApi and Google
//! Programmable Search, extracts plausible competitor names from result
//! titles and related questions, and returns at most five deduplicated
//! candidates. Backend failures are logged and absorbed; `discover` never
//! raises.

use crate::company::CompanyIdentity;
use crate::error::{ResearchError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Maximum number of candidates returned per run
pub const MAX_COMPETITORS: usize = 5;

/// Query templates tried in order; `{name}` is replaced with the company name
const QUERY_TEMPLATES: &[&str] = &[
    "\"{name}\" competitors alternatives",
    "\"{name}\" vs competitors comparison",
    "best alternatives to {name}",
    "companies like {name}",
    "{name} competitors list",
    "{name} vs",
    "{name} alternative software",
    "{name} similar companies",
    "\"{name}\" market competitors",
    "\"{name}\" industry rivals",
];

/// How many templates each backend gets
const SERPAPI_QUERY_LIMIT: usize = 3;
const GOOGLE_QUERY_LIMIT: usize = 2;

/// Google Search is only consulted when SerpApi produced fewer raw candidates
const GOOGLE_FALLBACK_THRESHOLD: usize = 3;

const SEARCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a candidate was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitorSource {
    #[serde(rename = "serpapi")]
    SerpApi,
    GoogleSearch,
    RelatedQuestion,
}

impl std::fmt::Display for CompetitorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CompetitorSource::SerpApi => write!(f, "serpapi"),
            CompetitorSource::GoogleSearch => write!(f, "google_search"),
            CompetitorSource::RelatedQuestion => write!(f, "related_question"),
        }
    }
}

/// A company hypothesized to compete with the target, with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorCandidate {
    pub name: String,
    pub url: String,
    pub source: CompetitorSource,
}

/// SerpApi credentials
#[derive(Debug, Clone)]
pub struct SerpApiCredentials {
    pub api_key: String,
    pub endpoint: String,
}

impl SerpApiCredentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: "https://serpapi.com/search".to_string(),
        }
    }
}

/// Google Programmable Search credentials
#[derive(Debug, Clone)]
pub struct GoogleSearchCredentials {
    pub api_key: String,
    pub engine_id: String,
    pub endpoint: String,
}

impl GoogleSearchCredentials {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            endpoint: "https://www.googleapis.com/customsearch/v1".to_string(),
        }
    }
}

/// Optional credentials for the two search backends. Discovery degrades
/// gracefully as each is withheld.
#[derive(Debug, Clone, Default)]
pub struct SearchBackends {
    pub serpapi: Option<SerpApiCredentials>,
    pub google: Option<GoogleSearchCredentials>,
}

impl SearchBackends {
    pub fn is_empty(&self) -> bool {
        self.serpapi.is_none() && self.google.is_none()
    }
}

/// Competitor discovery over the configured search backends
pub struct CompetitorDiscovery {
    client: Client,
    backends: SearchBackends,
}

impl CompetitorDiscovery {
    pub fn new(backends: SearchBackends) -> Self {
        Self {
            client: Client::new(),
            backends,
        }
    }

    /// Discover up to five competitors for the target company.
    ///
    /// Tries SerpApi with the first templates, then Google Search when
    /// SerpApi yielded too little. Returns an empty list when every
    /// backend is unavailable or fails.
    pub async fn discover(&self, company: &CompanyIdentity) -> Vec<CompetitorCandidate> {
        let mut raw: Vec<CompetitorCandidate> = Vec::new();

        if let Some(serpapi) = &self.backends.serpapi {
            for template in QUERY_TEMPLATES.iter().take(SERPAPI_QUERY_LIMIT) {
                let query = render_query(template, &company.name);
                match self.search_serpapi(serpapi, &query, &company.name).await {
                    Ok(found) => {
                        debug!("SerpApi query {:?} yielded {} candidates", query, found.len());
                        raw.extend(found);
                    }
                    Err(e) => warn!("SerpApi search failed: {}", e),
                }
                if raw.len() >= MAX_COMPETITORS {
                    break;
                }
            }
        }

        if raw.len() < GOOGLE_FALLBACK_THRESHOLD {
            if let Some(google) = &self.backends.google {
                for template in QUERY_TEMPLATES.iter().take(GOOGLE_QUERY_LIMIT) {
                    let query = render_query(template, &company.name);
                    match self.search_google(google, &query, &company.name).await {
                        Ok(found) => {
                            debug!("Google query {:?} yielded {} candidates", query, found.len());
                            raw.extend(found);
                        }
                        Err(e) => warn!("Google search failed: {}", e),
                    }
                    if raw.len() >= MAX_COMPETITORS {
                        break;
                    }
                }
            }
        }

        let competitors = dedupe_and_cap(raw);
        info!(
            "Discovered {} competitor(s) for {}",
            competitors.len(),
            company.name
        );
        competitors
    }

    async fn search_serpapi(
        &self,
        credentials: &SerpApiCredentials,
        query: &str,
        company_name: &str,
    ) -> Result<Vec<CompetitorCandidate>> {
        #[derive(Deserialize)]
        struct SerpApiResponse {
            #[serde(default)]
            organic_results: Vec<OrganicResult>,
            #[serde(default, alias = "people_also_ask")]
            related_questions: Vec<RelatedQuestion>,
        }

        #[derive(Deserialize)]
        struct OrganicResult {
            #[serde(default)]
            title: String,
            #[serde(default)]
            link: String,
        }

        #[derive(Deserialize)]
        struct RelatedQuestion {
            #[serde(default)]
            question: String,
        }

        let response = self
            .client
            .get(&credentials.endpoint)
            .timeout(SEARCH_TIMEOUT)
            .query(&[
                ("api_key", credentials.api_key.as_str()),
                ("q", query),
                ("engine", "google"),
                ("num", "5"),
            ])
            .send()
            .await
            .map_err(|e| ResearchError::SearchError {
                backend: "serpapi",
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ResearchError::SearchError {
                backend: "serpapi",
                message: format!("HTTP {}", response.status()),
            });
        }

        let parsed: SerpApiResponse =
            response
                .json()
                .await
                .map_err(|e| ResearchError::SearchError {
                    backend: "serpapi",
                    message: e.to_string(),
                })?;

        let mut candidates = Vec::new();

        for result in parsed.organic_results {
            if result.link.is_empty() || contains_ignore_case(&result.title, company_name) {
                continue;
            }
            if let Some(name) = competitor_name_from_title(&result.title, company_name) {
                candidates.push(CompetitorCandidate {
                    name,
                    url: result.link,
                    source: CompetitorSource::SerpApi,
                });
            }
        }

        for question in parsed.related_questions {
            let lower = question.question.to_lowercase();
            if lower.contains(" vs ") || lower.contains("alternative") {
                candidates.extend(competitors_from_question(&question.question, company_name));
            }
        }

        Ok(candidates)
    }

    async fn search_google(
        &self,
        credentials: &GoogleSearchCredentials,
        query: &str,
        company_name: &str,
    ) -> Result<Vec<CompetitorCandidate>> {
        #[derive(Deserialize)]
        struct GoogleSearchResponse {
            #[serde(default)]
            items: Vec<GoogleSearchItem>,
        }

        #[derive(Deserialize)]
        struct GoogleSearchItem {
            #[serde(default)]
            title: String,
            #[serde(default)]
            link: String,
        }

        let response = self
            .client
            .get(&credentials.endpoint)
            .timeout(SEARCH_TIMEOUT)
            .query(&[
                ("key", credentials.api_key.as_str()),
                ("cx", credentials.engine_id.as_str()),
                ("q", query),
                ("num", "5"),
            ])
            .send()
            .await
            .map_err(|e| ResearchError::SearchError {
                backend: "google_search",
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(ResearchError::SearchError {
                backend: "google_search",
                message: format!("HTTP {}", response.status()),
            });
        }

        let parsed: GoogleSearchResponse =
            response
                .json()
                .await
                .map_err(|e| ResearchError::SearchError {
                    backend: "google_search",
                    message: e.to_string(),
                })?;

        let mut candidates = Vec::new();
        for item in parsed.items {
            if item.link.is_empty() || contains_ignore_case(&item.title, company_name) {
                continue;
            }
            if let Some(name) = competitor_name_from_title(&item.title, company_name) {
                candidates.push(CompetitorCandidate {
                    name,
                    url: item.link,
                    source: CompetitorSource::GoogleSearch,
                });
            }
        }

        Ok(candidates)
    }
}

fn render_query(template: &str, company_name: &str) -> String {
    template.replace("{name}", company_name)
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Keep the first occurrence of each exact name, in discovery order,
/// truncated to `MAX_COMPETITORS`
pub(crate) fn dedupe_and_cap(raw: Vec<CompetitorCandidate>) -> Vec<CompetitorCandidate> {
    let mut unique: Vec<CompetitorCandidate> = Vec::new();
    for candidate in raw {
        if unique.len() >= MAX_COMPETITORS {
            break;
        }
        if unique.iter().all(|c| c.name != candidate.name) {
            unique.push(candidate);
        }
    }
    unique
}

/// Title separators that mark a "Company A vs Company B" comparison
const VS_SEPARATORS: &[&str] = &[" vs. ", " vs ", " VS. ", " VS ", " Vs. ", " Vs "];

/// Name-extraction heuristic applied to a search-result title
pub(crate) type NameRule = fn(&str, &str) -> Option<String>;

/// Ordered rule table; the first rule producing a name wins. The output is
/// approximate, never authoritative.
pub(crate) const NAME_RULES: &[(&str, NameRule)] = &[
    ("vs-split", vs_split_rule),
    ("leading-tokens", leading_tokens_rule),
];

/// Extract a competitor name guess from a search-result title
pub(crate) fn competitor_name_from_title(title: &str, company_name: &str) -> Option<String> {
    NAME_RULES
        .iter()
        .find_map(|(_, rule)| rule(title, company_name))
}

/// "A vs B" titles: take the side that is not the target company
fn vs_split_rule(title: &str, company_name: &str) -> Option<String> {
    let separator = VS_SEPARATORS.iter().find(|sep| title.contains(*sep))?;
    title
        .split(separator)
        .map(clean_name_fragment)
        .find(|part| !part.is_empty() && !part.eq_ignore_ascii_case(company_name))
}

/// Fallback: first two whitespace-delimited tokens of the title
fn leading_tokens_rule(title: &str, _company_name: &str) -> Option<String> {
    let cleaned = title.replace(" - ", " ").replace(" | ", " ");
    let tokens: Vec<&str> = cleaned.split_whitespace().take(2).collect();
    if tokens.is_empty() {
        None
    } else {
        Some(tokens.join(" "))
    }
}

fn clean_name_fragment(part: &str) -> String {
    part.trim()
        .trim_matches(|c| c == '?' || c == '"')
        .trim()
        .to_string()
}

/// Extract every non-target side of a "A vs B" related question, with a
/// synthesized homepage URL per name
pub(crate) fn competitors_from_question(
    question: &str,
    company_name: &str,
) -> Vec<CompetitorCandidate> {
    let Some(separator) = VS_SEPARATORS.iter().find(|sep| question.contains(*sep)) else {
        return Vec::new();
    };

    question
        .split(separator)
        .map(clean_name_fragment)
        .filter(|part| !part.is_empty() && !part.eq_ignore_ascii_case(company_name))
        .map(|name| {
            let url = format!("https://www.{}.com", name.to_lowercase().replace(' ', ""));
            CompetitorCandidate {
                name,
                url,
                source: CompetitorSource::RelatedQuestion,
            }
        })
        .collect()
}
