// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use std::time::Duration;

use crate::domain::search::engine::{SearchError, SearchHit, SourceAdapter};
use crate::infrastructure::search::source::SourceContext;

const DEFAULT_ENDPOINT: &str = "https://scholar.google.com/scholar";

/// Scholar returns one page of ten results
pub const SCHOLAR_MAX_RESULTS: usize = 10;

/// Scholar is the most rate-limited backend and never waits less than this
pub const SCHOLAR_MIN_DELAY: Duration = Duration::from_secs(3);

/// Default number of collected URLs above which Scholar is skipped
pub const DEFAULT_SCHOLAR_CUTOFF: usize = 15;

static DOCUMENT_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"<a href="(https?://[^"]+\.(?:pdf|htm|html)[^"]*)""#)
        .expect("Failed to compile document link regex")
});

/// Scholar backend: only direct document links (pdf/htm/html) are kept.
///
/// Expensive, so the aggregator stops calling it once a topic has
/// collected `cutoff` URLs.
pub struct ScholarSource {
    context: SourceContext,
    endpoint: String,
    delay: Duration,
    cutoff: usize,
}

impl ScholarSource {
    pub fn new(context: SourceContext) -> Self {
        let delay = context.delay().max(SCHOLAR_MIN_DELAY);
        Self {
            context,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            delay,
            cutoff: DEFAULT_SCHOLAR_CUTOFF,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_cutoff(mut self, cutoff: usize) -> Self {
        self.cutoff = cutoff;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn build_url(&self, query: &str) -> String {
        let num = SCHOLAR_MAX_RESULTS.to_string();
        let params = [("q", query), ("hl", "en"), ("num", num.as_str())];
        format!(
            "{}?{}",
            self.endpoint,
            serde_urlencoded::to_string(params).unwrap_or_default()
        )
    }

    pub fn parse_results(html: &str) -> Vec<SearchHit> {
        DOCUMENT_LINK
            .captures_iter(html)
            .filter_map(|cap| cap.get(1))
            .map(|m| SearchHit::new(html_escape::decode_html_entities(m.as_str()).into_owned()))
            .collect()
    }

    async fn fetch_hits(&self, query: &str) -> Result<Vec<SearchHit>, SearchError> {
        let html = self.context.get_html(&self.build_url(query)).await?;
        Ok(Self::parse_results(&html))
    }
}

#[async_trait]
impl SourceAdapter for ScholarSource {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit> {
        let cap = max_results.min(SCHOLAR_MAX_RESULTS);
        let outcome = self.fetch_hits(query).await;
        let hits = self.context.absorb(self.name(), query, outcome, cap);
        self.context.pace(self.delay).await;
        hits
    }

    fn collect_ceiling(&self) -> Option<usize> {
        Some(self.cutoff)
    }

    fn name(&self) -> &'static str {
        "scholar"
    }
}
