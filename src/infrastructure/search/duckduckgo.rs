// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

use crate::domain::search::engine::{SearchError, SearchHit, SourceAdapter};
use crate::infrastructure::search::source::SourceContext;

const DEFAULT_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

static RESULT_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.result").expect("valid result selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__a").expect("valid link selector"));
static SNIPPET_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".result__snippet").expect("valid snippet selector"));

/// DuckDuckGo backend using the JavaScript-free HTML endpoint.
///
/// Always queried by the aggregator; honours the configured per-query result cap.
pub struct DuckDuckGoSource {
    context: SourceContext,
    endpoint: String,
}

impl DuckDuckGoSource {
    pub fn new(context: SourceContext) -> Self {
        Self {
            context,
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    /// Point the backend at another endpoint (used against mock servers)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn build_url(&self, query: &str) -> String {
        let params = [("q", query), ("kl", "us-en")];
        format!(
            "{}?{}",
            self.endpoint,
            serde_urlencoded::to_string(params).unwrap_or_default()
        )
    }

    /// Unwrap `//duckduckgo.com/l/?uddg=<target>` redirect links
    pub fn decode_redirect(href: &str) -> String {
        let absolute = if href.starts_with("//") {
            format!("https:{}", href)
        } else {
            href.to_string()
        };

        if let Ok(parsed) = Url::parse(&absolute) {
            if parsed.path().starts_with("/l/") {
                if let Some((_, target)) = parsed.query_pairs().find(|(key, _)| key == "uddg") {
                    return target.into_owned();
                }
            }
        }
        absolute
    }

    pub fn parse_results(html: &str) -> Vec<SearchHit> {
        let document = Html::parse_document(html);
        document
            .select(&RESULT_SELECTOR)
            .filter_map(|result| {
                let link = result.select(&LINK_SELECTOR).next()?;
                let url = Self::decode_redirect(link.value().attr("href")?);
                if !url.starts_with("http") {
                    return None;
                }
                let title = link.text().collect::<String>().trim().to_string();
                let snippet = result
                    .select(&SNIPPET_SELECTOR)
                    .next()
                    .map(|s| s.text().collect::<String>().trim().to_string());

                let mut hit = SearchHit::new(url).with_title(title);
                hit.snippet = snippet.filter(|s| !s.is_empty());
                Some(hit)
            })
            .collect()
    }

    async fn fetch_hits(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let html = self.context.get_html(&self.build_url(query)).await?;
        if html.contains("anomaly-modal") {
            return Err(SearchError::Parse("bot challenge page".to_string()));
        }
        Ok(Self::parse_results(&html))
    }
}

#[async_trait]
impl SourceAdapter for DuckDuckGoSource {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        let outcome = self.fetch_hits(query).await;
        let hits = self.context.absorb(self.name(), query, outcome, max_results);
        self.context.pace(self.context.delay()).await;
        hits
    }

    fn name(&self) -> &'static str {
        "duckduckgo"
    }
}
