// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine as _;
use std::collections::HashMap;
use url::Url;

use crate::domain::search::engine::{SearchError, SearchHit, SourceAdapter};
use crate::infrastructure::search::source::SourceContext;

const DEFAULT_ENDPOINT: &str = "https://www.bing.com/search";

/// Bing caps a single call at one results page
pub const BING_MAX_RESULTS: usize = 10;

/// Bing backend scraping the public results page.
///
/// This implementation provides:
/// - Cookie-based region and language settings
/// - Base64 URL decoding for Bing redirect URLs
/// - HTML parsing with cached regex patterns
pub struct BingSource {
    context: SourceContext,
    endpoint: String,
    // Cached regex patterns for performance
    result_regex: regex::Regex,
    title_regex: regex::Regex,
    link_regex: regex::Regex,
    snippet_regex: regex::Regex,
    html_clean_regex: regex::Regex,
}

impl BingSource {
    pub fn new(context: SourceContext) -> Self {
        // Pre-compile regex patterns for better performance
        let result_regex = regex::Regex::new(r#"(?s)<li class="b_algo"[^>]*>(.*?)</li>"#)
            .expect("Failed to compile result regex");
        let title_regex =
            regex::Regex::new(r#"(?s)<h2[^>]*>(.*?)</h2>"#).expect("Failed to compile title regex");
        let link_regex = regex::Regex::new(r#"<a[^>]*href="([^"]*)"[^>]*>"#)
            .expect("Failed to compile link regex");
        let snippet_regex =
            regex::Regex::new(r#"(?s)<p[^>]*>(.*?)</p>"#).expect("Failed to compile snippet regex");
        let html_clean_regex =
            regex::Regex::new(r#"<[^>]+>"#).expect("Failed to compile HTML clean regex");

        Self {
            context,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            result_regex,
            title_regex,
            link_regex,
            snippet_regex,
            html_clean_regex,
        }
    }

    /// Point the backend at another endpoint (used against mock servers)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Construct Bing cookies for region and language settings
    ///
    /// - `_EDGE_CD`: Controls display language and region
    /// - `_EDGE_S`: Controls market and UI language
    pub fn get_bing_cookies(&self, lang: &str, region: &str) -> HashMap<String, String> {
        let mut cookies = HashMap::new();
        cookies.insert("_EDGE_CD".to_string(), format!("m={}&u={}", region, lang));
        cookies.insert("_EDGE_S".to_string(), format!("mkt={}&ui={}", region, lang));
        cookies
    }

    pub fn build_bing_url(&self, query: &str, count: usize) -> String {
        let params = vec![("q", query.to_string()), ("count", count.to_string())];
        format!(
            "{}?{}",
            self.endpoint,
            serde_urlencoded::to_string(&params).unwrap_or_default()
        )
    }

    /// Decode Bing redirect URLs that are Base64 encoded
    ///
    /// Returns the original URL if no encoding is detected
    pub fn decode_bing_url(&self, url: &str) -> String {
        if url.starts_with("https://www.bing.com/ck/a?") {
            if let Ok(parsed_url) = Url::parse(url) {
                if let Some(u_param) = parsed_url.query_pairs().find(|(key, _)| key == "u") {
                    // Strip the 'a1' prefix
                    if let Some(encoded) = u_param.1.get(2..) {
                        let padding = "=".repeat((4 - encoded.len() % 4) % 4);
                        let padded_encoded = format!("{}{}", encoded, padding);

                        if let Ok(decoded_bytes) = URL_SAFE.decode(padded_encoded) {
                            if let Ok(decoded_str) = String::from_utf8(decoded_bytes) {
                                return decoded_str;
                            }
                        }
                    }
                }
            }
        }
        url.to_string()
    }

    /// Clean HTML tags from text and decode HTML entities
    pub fn clean_html_text(&self, html: &str) -> String {
        let cleaned = self.html_clean_regex.replace_all(html, "");
        let decoded = html_escape::decode_html_entities(&cleaned);
        decoded.trim().to_string()
    }

    pub fn parse_search_results(&self, html: &str) -> Result<Vec<SearchHit>, SearchError> {
        // Anti-bot interstitial
        if html.contains("<title>Robot Check</title>") || html.contains("captcha") {
            return Err(SearchError::Parse("bot challenge page".to_string()));
        }

        let mut hits = Vec::new();
        for result_match in self.result_regex.find_iter(html) {
            let result_html = result_match.as_str();

            let title_html = self
                .title_regex
                .captures(result_html)
                .and_then(|cap| cap.get(1))
                .map(|m| m.as_str())
                .unwrap_or_default();

            let url = self
                .link_regex
                .captures(title_html)
                .and_then(|cap| cap.get(1))
                .map(|m| self.decode_bing_url(&html_escape::decode_html_entities(m.as_str())))
                .unwrap_or_default();

            if url.is_empty() || !url.starts_with("http") {
                continue;
            }

            let title = self.clean_html_text(title_html);
            let snippet = self
                .snippet_regex
                .captures(result_html)
                .and_then(|cap| cap.get(1))
                .map(|m| self.clean_html_text(m.as_str()))
                .filter(|s| !s.is_empty());

            let mut hit = SearchHit::new(url);
            hit.title = Some(title).filter(|t| !t.is_empty());
            hit.snippet = snippet;
            hits.push(hit);
        }

        Ok(hits)
    }

    async fn fetch_hits(&self, query: &str, count: usize) -> Result<Vec<SearchHit>, SearchError> {
        let html = self
            .context
            .get_html_with_cookies(
                &self.build_bing_url(query, count),
                &self.get_bing_cookies("en", "US"),
            )
            .await?;
        self.parse_search_results(&html)
    }
}

#[async_trait]
impl SourceAdapter for BingSource {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        let count = max_results.min(BING_MAX_RESULTS);
        let outcome = self.fetch_hits(query, count).await;
        let hits = self.context.absorb(self.name(), query, outcome, count);
        self.context.pace(self.context.delay()).await;
        hits
    }

    fn name(&self) -> &'static str {
        "bing"
    }
}
