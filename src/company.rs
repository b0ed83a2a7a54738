//! Company identity and name normalization

use serde::{Deserialize, Serialize};
use url::Url;

/// Sentinel returned when a URL cannot be parsed into a display name
pub const UNKNOWN_COMPANY: &str = "Unknown Company";

/// A company under analysis: the research target or a discovered competitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyIdentity {
    /// Human-readable display name
    pub name: String,
    /// Website root URL
    pub url: String,
}

impl CompanyIdentity {
    /// Build an identity from a URL, deriving the display name when none is given
    pub fn from_url(url: &str, name: Option<&str>) -> Self {
        let name = name
            .map(|n| n.to_string())
            .unwrap_or_else(|| company_name_from_url(url));
        Self {
            name,
            url: url.to_string(),
        }
    }
}

/// Derive a best-effort display name from a company URL.
///
/// Takes the left-most DNS label of the host (after stripping a leading
/// `www.`), replaces `-`/`_` separators with spaces, and title-cases each
/// word. Returns "Unknown Company" when the URL does not parse. The result
/// is a heuristic, not round-trip-safe.
pub fn company_name_from_url(url: &str) -> String {
    let host = match Url::parse(url).ok().and_then(|u| u.host_str().map(|h| h.to_lowercase())) {
        Some(h) => h,
        None => return UNKNOWN_COMPANY.to_string(),
    };

    let host = host.strip_prefix("www.").unwrap_or(&host);
    let label = host.split('.').next().unwrap_or(host);
    if label.is_empty() {
        return UNKNOWN_COMPANY.to_string();
    }

    title_case(&label.replace(['-', '_'], " "))
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scheme_www_and_suffix() {
        assert_eq!(company_name_from_url("https://www.sonarsource.com"), "Sonarsource");
        assert_eq!(company_name_from_url("https://stripe.com/pricing"), "Stripe");
    }

    #[test]
    fn separators_become_spaces_and_words_are_title_cased() {
        assert_eq!(
            company_name_from_url("https://acme-rocket_labs.io"),
            "Acme Rocket Labs"
        );
    }

    #[test]
    fn unparseable_url_yields_sentinel() {
        assert_eq!(company_name_from_url("not a url"), UNKNOWN_COMPANY);
        assert_eq!(company_name_from_url(""), UNKNOWN_COMPANY);
    }

    #[test]
    fn name_never_contains_www_or_dots() {
        for url in ["https://www.netflix.com", "http://www.example.co.uk"] {
            let name = company_name_from_url(url);
            assert!(!name.is_empty());
            assert!(!name.contains("www"));
            assert!(!name.contains('.'));
        }
    }

    #[test]
    fn identity_prefers_explicit_name() {
        let identity = CompanyIdentity::from_url("https://stripe.com", Some("Stripe Inc"));
        assert_eq!(identity.name, "Stripe Inc");
        let derived = CompanyIdentity::from_url("https://stripe.com", None);
        assert_eq!(derived.name, "Stripe");
    }
}
