// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// Path and asset markers that never lead to document content
const EXCLUDE_PATTERNS: &[&str] = &[
    "/login",
    "/signin",
    "/register",
    "/cart",
    "/checkout",
    ".css",
    ".js",
    ".jpg",
    ".png",
    ".gif",
    ".svg",
    ".ico",
    "ad.doubleclick",
    "googleads",
    "facebook.net",
];

/// Markers of technical content
const PREFER_PATTERNS: &[&str] = &[
    ".pdf",
    "technical",
    "engineering",
    "design",
    "specification",
    "manual",
    "guide",
    "datasheet",
    "journal",
    "research",
    "article",
    "paper",
    "study",
];

/// URLs shorter than this pass even without a marker
const SHORT_URL_LIMIT: usize = 200;

/// URL relevance filter shared by every discovery backend.
///
/// Exclusion wins first: excluded-domain substrings and non-content markers
/// reject the URL. Otherwise it is kept when it hits a priority domain, a
/// technical-content marker, or is shorter than 200 characters.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    priority_domains: Vec<String>,
    exclude_domains: Vec<String>,
}

impl UrlFilter {
    pub fn new<P, E>(priority_domains: P, exclude_domains: E) -> Self
    where
        P: IntoIterator,
        P::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let normalize = |d: &str| d.trim().to_lowercase();
        Self {
            priority_domains: priority_domains
                .into_iter()
                .map(|d| normalize(d.as_ref()))
                .filter(|d| !d.is_empty())
                .collect(),
            exclude_domains: exclude_domains
                .into_iter()
                .map(|d| normalize(d.as_ref()))
                .filter(|d| !d.is_empty())
                .collect(),
        }
    }

    /// Whether the URL contains one of the priority-domain substrings
    pub fn is_priority(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();
        self.priority_domains
            .iter()
            .any(|domain| url_lower.contains(domain.as_str()))
    }

    pub fn is_relevant_url(&self, url: &str) -> bool {
        let url_lower = url.to_lowercase();

        if self
            .exclude_domains
            .iter()
            .any(|domain| url_lower.contains(domain.as_str()))
        {
            return false;
        }

        if EXCLUDE_PATTERNS
            .iter()
            .any(|pattern| url_lower.contains(pattern))
        {
            return false;
        }

        let is_priority = self
            .priority_domains
            .iter()
            .any(|domain| url_lower.contains(domain.as_str()));
        let has_preferred = PREFER_PATTERNS
            .iter()
            .any(|pattern| url_lower.contains(pattern));

        is_priority || has_preferred || url.chars().count() < SHORT_URL_LIMIT
    }
}
