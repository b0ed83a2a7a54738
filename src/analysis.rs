//! LLM analysis runner
//!
//! Renders a fixed set of templated prompts against the assembled content
//! and issues one chat-completion request per analysis kind. The six
//! requests are independent and side-effect-free, so they run
//! concurrently; results stay keyed by kind. Call failures become in-band
//! error strings and never propagate past this layer.

use crate::error::{ResearchError, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs},
    Client,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Placeholder shown for positioning fields that could not be parsed yet
pub const ANALYZING_PLACEHOLDER: &str = "Analyzing...";

/// The fixed set of analyses produced per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AnalysisKind {
    Overview,
    StructuredAnalysis,
    TableData,
    Pricing,
    Features,
    Swot,
}

impl AnalysisKind {
    pub const ALL: [AnalysisKind; 6] = [
        AnalysisKind::Overview,
        AnalysisKind::StructuredAnalysis,
        AnalysisKind::TableData,
        AnalysisKind::Pricing,
        AnalysisKind::Features,
        AnalysisKind::Swot,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            AnalysisKind::Overview => "overview",
            AnalysisKind::StructuredAnalysis => "structured_analysis",
            AnalysisKind::TableData => "table_data",
            AnalysisKind::Pricing => "pricing",
            AnalysisKind::Features => "features",
            AnalysisKind::Swot => "swot",
        }
    }
}

impl std::fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// The six analysis texts, keyed by kind. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct AnalysisBundle {
    sections: BTreeMap<AnalysisKind, String>,
}

impl AnalysisBundle {
    pub fn from_sections(sections: impl IntoIterator<Item = (AnalysisKind, String)>) -> Self {
        Self {
            sections: sections.into_iter().collect(),
        }
    }

    /// Text for one analysis kind; empty when the kind was never produced
    pub fn get(&self, kind: AnalysisKind) -> &str {
        self.sections.get(&kind).map(String::as_str).unwrap_or("")
    }

    pub fn iter(&self) -> impl Iterator<Item = (AnalysisKind, &str)> {
        self.sections.iter().map(|(kind, text)| (*kind, text.as_str()))
    }
}

/// Chat-completion settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl LlmConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: "gpt-4o".to_string(),
            temperature: 0.3,
            max_tokens: 1500,
        }
    }
}

/// Runner that produces the analysis bundle via chat completions
pub struct AnalysisRunner {
    client: Client<OpenAIConfig>,
    config: LlmConfig,
}

impl AnalysisRunner {
    pub fn new(config: LlmConfig) -> Self {
        let openai_config = OpenAIConfig::new().with_api_key(config.api_key.clone());
        Self {
            client: Client::with_config(openai_config),
            config,
        }
    }

    /// Run all six analyses over the assembled content.
    ///
    /// Never returns an error: a failed call stores an `Error: ...` string
    /// at its key.
    pub async fn analyze(
        &self,
        company_name: &str,
        competitor_names: &[String],
        content: &str,
    ) -> AnalysisBundle {
        info!(
            "Running {} analyses for {}",
            AnalysisKind::ALL.len(),
            company_name
        );

        let tasks = AnalysisKind::ALL.iter().map(|kind| async move {
            let prompt = build_prompt(*kind, company_name, competitor_names, content);
            debug!("{} prompt length: {} chars", kind, prompt.len());

            let text = match self.complete(&prompt).await {
                Ok(text) => text,
                Err(e) => {
                    warn!("Analysis {} failed: {}", kind, e);
                    format!("Error: {}", e)
                }
            };
            (*kind, text)
        });

        AnalysisBundle::from_sections(join_all(tasks).await)
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(self.config.model.as_str())
            .messages([ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into()])
            .temperature(self.config.temperature)
            .max_tokens(self.config.max_tokens)
            .build()?;

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .ok_or_else(|| ResearchError::LlmError("No content in completion response".to_string()))
    }
}

fn build_prompt(
    kind: AnalysisKind,
    company_name: &str,
    competitor_names: &[String],
    content: &str,
) -> String {
    let competitors = competitor_names.join(", ");

    match kind {
        AnalysisKind::Overview => format!(
            r#"Create a comprehensive competitive landscape analysis comparing {company} with all competitors:

TARGET COMPANY: {company}
COMPETITORS: {competitors}
CONTENT: {content}

**COMPETITIVE LANDSCAPE OVERVIEW:**

1. **Market Analysis**: What is the overall market these companies operate in?
2. **Company Profiles**: Brief description of what each company does
3. **Competitive Positioning**: How does each company position itself differently?
4. **Key Differentiators**: What makes each company unique?
5. **Market Share Insights**: Which companies appear to be market leaders?
6. **Competitive Advantages**: What advantages does each company have?
7. **Strategic Recommendations**: What should {company} focus on to compete better?

Include a side-by-side markdown table comparing target market, value proposition, pricing strategy, key features, and market position for each company."#,
            company = company_name,
            competitors = competitors,
            content = content,
        ),

        AnalysisKind::StructuredAnalysis => format!(
            r#"Provide structured competitive analysis for each company:

TARGET COMPANY: {company}
COMPETITORS: {competitors}

CONTENT: {content}

For each company ({company} and {competitors}), provide:

1. Target Persona/Audience: Who is their primary customer base? (2-3 sentences)
2. Market Positioning: How do they position themselves in the market? (2-3 sentences)
3. Tone/Messaging: What messaging tone do they use on their homepage? (1-2 sentences)
4. Differentiation: How are they positioned differently from competitors? (2-3 sentences)

Format as:
**COMPANY NAME**
- Target Persona: [analysis]
- Market Positioning: [analysis]
- Tone/Messaging: [analysis]
- Differentiation: [analysis]"#,
            company = company_name,
            competitors = competitors,
            content = content,
        ),

        AnalysisKind::TableData => format!(
            r#"Create structured table data for competitive analysis including {company} and all competitors:

TARGET COMPANY: {company}
COMPETITORS: {competitors}

CONTENT: {content}

For EACH COMPANY (including {company} and all competitors), provide a JSON object with these exact fields:
{{
    "company_name": "Company Name",
    "target_persona": "Brief description of their target audience (1-2 sentences)",
    "market_positioning": "How they position themselves in the market (1-2 sentences)",
    "tone_messaging": "Messaging tone and style they use (1 sentence)",
    "differentiation": "How they differentiate from other companies in this space (1-2 sentences)"
}}

Return as a JSON array with ALL companies (target + competitors)."#,
            company = company_name,
            competitors = competitors,
            content = content,
        ),

        AnalysisKind::Pricing => format!(
            r#"Create a comprehensive pricing comparison table for this competitive landscape:

TARGET COMPANY: {company}
COMPETITORS: {competitors}
CONTENT: {content}

For each company, provide a markdown table with columns: Company, Pricing Tiers, Price Range, Billing Model, Target Market, Key Features.

Then analyze:
1. Pricing Strategy Comparison: How do pricing strategies differ?
2. Value Proposition: Which company offers best value for money?
3. Market Positioning: How do prices position each company in the market?
4. Competitive Advantages: What pricing advantages does each have?"#,
            company = company_name,
            competitors = competitors,
            content = content,
        ),

        AnalysisKind::Features => format!(
            r#"Create a comprehensive feature comparison for this competitive landscape:

TARGET COMPANY: {company}
COMPETITORS: {competitors}
CONTENT: {content}

Provide a markdown feature comparison table covering core features, integrations, target market, and unique features for each company.

Then analyze:
1. Feature Gaps: What features does each competitor have that others don't?
2. Common Features: What features are standard across all competitors?
3. Unique Differentiators: What makes each company unique?
4. Feature Quality: Which company has the most comprehensive feature set?"#,
            company = company_name,
            competitors = competitors,
            content = content,
        ),

        AnalysisKind::Swot => format!(
            r#"Perform comprehensive competitive SWOT analysis for all companies:

TARGET COMPANY: {company}
COMPETITORS: {competitors}
CONTENT: {content}

For each company ({company} and {competitors}), list Strengths, Weaknesses, Opportunities, and Threats, each rated 1-5 with supporting evidence.

Then compare:
1. **Market Leader**: Which company has the strongest overall position?
2. **Biggest Threats**: Which company poses the greatest threat to others?
3. **Growth Potential**: Which company has the best opportunities?
4. **Vulnerabilities**: Which company has the most weaknesses?
5. **Strategic Recommendations**: What should each company focus on?"#,
            company = company_name,
            competitors = competitors,
            content = content,
        ),
    }
}

/// Per-company positioning row requested by the `table_data` prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyPositioning {
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub target_persona: String,
    #[serde(default)]
    pub market_positioning: String,
    #[serde(default)]
    pub tone_messaging: String,
    #[serde(default)]
    pub differentiation: String,
}

impl CompanyPositioning {
    /// Row shown while no parsed data exists for a company
    pub fn placeholder(company_name: &str) -> Self {
        Self {
            company_name: company_name.to_string(),
            target_persona: ANALYZING_PLACEHOLDER.to_string(),
            market_positioning: ANALYZING_PLACEHOLDER.to_string(),
            tone_messaging: ANALYZING_PLACEHOLDER.to_string(),
            differentiation: ANALYZING_PLACEHOLDER.to_string(),
        }
    }
}

/// Best-effort parsed result of the `table_data` analysis
#[derive(Debug, Clone, Default)]
pub struct PositioningTable {
    rows: Vec<CompanyPositioning>,
}

impl PositioningTable {
    /// Locate the first `[...]` bracketed substring of the response and
    /// parse it as a JSON array. Total parse failure yields an empty table.
    pub fn from_response(response: &str) -> Self {
        let rows = extract_json_array(response)
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default();
        Self { rows }
    }

    pub fn rows(&self) -> &[CompanyPositioning] {
        &self.rows
    }

    /// The row for a company (matched case-insensitively), or a
    /// placeholder row when no parsed data exists for it
    pub fn row_for(&self, company_name: &str) -> CompanyPositioning {
        self.rows
            .iter()
            .find(|row| row.company_name.eq_ignore_ascii_case(company_name))
            .cloned()
            .unwrap_or_else(|| CompanyPositioning::placeholder(company_name))
    }
}

/// The substring from the first `[` to the last `]`, if any
fn extract_json_array(response: &str) -> Option<&str> {
    let start = response.find('[')?;
    let end = response.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&response[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_kinds_have_unique_keys() {
        let keys: std::collections::BTreeSet<&str> =
            AnalysisKind::ALL.iter().map(|k| k.key()).collect();
        assert_eq!(keys.len(), AnalysisKind::ALL.len());
    }

    #[test]
    fn bundle_is_keyed_not_positional() {
        let bundle = AnalysisBundle::from_sections([
            (AnalysisKind::Swot, "swot text".to_string()),
            (AnalysisKind::Overview, "overview text".to_string()),
        ]);
        assert_eq!(bundle.get(AnalysisKind::Overview), "overview text");
        assert_eq!(bundle.get(AnalysisKind::Swot), "swot text");
        assert_eq!(bundle.get(AnalysisKind::Pricing), "");
        assert_eq!(bundle.iter().count(), 2);
    }

    #[test]
    fn prompts_interpolate_company_competitors_and_content() {
        let competitors = vec!["Adyen".to_string(), "Square".to_string()];
        for kind in AnalysisKind::ALL {
            let prompt = build_prompt(kind, "Stripe", &competitors, "THE CONTENT");
            assert!(prompt.contains("Stripe"), "{} misses company", kind);
            assert!(prompt.contains("Adyen, Square"), "{} misses competitors", kind);
            assert!(prompt.contains("THE CONTENT"), "{} misses content", kind);
        }
    }

    #[test]
    fn table_data_prompt_requests_the_row_schema() {
        let prompt = build_prompt(AnalysisKind::TableData, "Stripe", &[], "c");
        for field in [
            "company_name",
            "target_persona",
            "market_positioning",
            "tone_messaging",
            "differentiation",
        ] {
            assert!(prompt.contains(field));
        }
    }

    #[test]
    fn positioning_parses_embedded_json_array() {
        let response = r#"here is data: [{"company_name":"Acme","target_persona":"SMBs","market_positioning":"cheap","tone_messaging":"casual","differentiation":"price"}] thanks"#;
        let table = PositioningTable::from_response(response);
        assert_eq!(table.rows().len(), 1);

        let row = table.row_for("ACME");
        assert_eq!(row.company_name, "Acme");
        assert_eq!(row.target_persona, "SMBs");
        assert_eq!(row.differentiation, "price");
    }

    #[test]
    fn garbage_response_falls_back_to_placeholders() {
        let table = PositioningTable::from_response("no json here at all");
        assert!(table.rows().is_empty());

        let row = table.row_for("Acme");
        assert_eq!(row.company_name, "Acme");
        assert_eq!(row.target_persona, ANALYZING_PLACEHOLDER);
        assert_eq!(row.market_positioning, ANALYZING_PLACEHOLDER);
        assert_eq!(row.tone_messaging, ANALYZING_PLACEHOLDER);
        assert_eq!(row.differentiation, ANALYZING_PLACEHOLDER);
    }

    #[test]
    fn malformed_array_is_tolerated() {
        let table = PositioningTable::from_response("data: [{\"company_name\": } oops]");
        assert!(table.rows().is_empty());
    }

    #[test]
    fn rows_tolerate_missing_fields() {
        let table = PositioningTable::from_response(r#"[{"company_name":"Acme"}]"#);
        assert_eq!(table.rows().len(), 1);
        assert_eq!(table.rows()[0].target_persona, "");
    }
}
