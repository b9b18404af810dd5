// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::search::engine::{SearchError, SearchHit};
use crate::infrastructure::search::url_filter::UrlFilter;

/// Timeout for a single backend request
pub const SEARCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Plumbing shared by the search backends: HTTP client, relevance filter
/// and the politeness delay applied after every call.
#[derive(Clone)]
pub struct SourceContext {
    client: reqwest::Client,
    filter: Arc<UrlFilter>,
    delay: Duration,
}

impl SourceContext {
    pub fn new(user_agent: &str, filter: Arc<UrlFilter>, delay: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(SEARCH_TIMEOUT)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            filter,
            delay,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn filter(&self) -> &UrlFilter {
        &self.filter
    }

    /// GET a results page and return its body; anything but 200 is an error
    pub async fn get_html(&self, url: &str) -> Result<String, SearchError> {
        self.send(self.client.get(url)).await
    }

    /// Same as [`get_html`](Self::get_html) with a `Cookie` header built from `cookies`
    pub async fn get_html_with_cookies(
        &self,
        url: &str,
        cookies: &HashMap<String, String>,
    ) -> Result<String, SearchError> {
        let mut pairs: Vec<String> = cookies.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        pairs.sort();
        self.send(self.client.get(url).header(reqwest::header::COOKIE, pairs.join("; ")))
            .await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<String, SearchError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        if status != 200 {
            return Err(SearchError::HttpStatus(status));
        }
        Ok(response.text().await?)
    }

    /// Apply the relevance filter, dedup by URL and cap the hit count.
    ///
    /// A backend error is logged and absorbed as an empty result.
    pub fn absorb(
        &self,
        source: &str,
        query: &str,
        outcome: Result<Vec<SearchHit>, SearchError>,
        max_results: usize,
    ) -> Vec<SearchHit> {
        let raw = match outcome {
            Ok(raw) => raw,
            Err(e) => {
                warn!("{} search failed for '{}': {}", source, query, e);
                return Vec::new();
            }
        };

        let mut seen = HashSet::new();
        let hits: Vec<SearchHit> = raw
            .into_iter()
            .filter(|hit| self.filter.is_relevant_url(&hit.url))
            .filter(|hit| seen.insert(hit.url.clone()))
            .take(max_results)
            .collect();

        info!("{} '{}': {} relevant URLs", source, query, hits.len());
        hits
    }

    /// Sleep for the politeness delay
    pub async fn pace(&self, delay: Duration) {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}
