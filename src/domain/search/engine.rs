// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use thiserror::Error;

/// A single hit returned by a search backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub title: Option<String>,
    pub snippet: Option<String>,
}

impl SearchHit {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: None,
            snippet: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

#[derive(Debug, Error, Clone)]
pub enum SearchError {
    #[error("Network error: {0}")]
    NetworkError(String),
    #[error("Unexpected HTTP status: {0}")]
    HttpStatus(u16),
    #[error("Failed to parse results: {0}")]
    Parse(String),
    #[error("Timeout")]
    Timeout,
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else {
            SearchError::NetworkError(e.to_string())
        }
    }
}

/// A discovery backend: turns a query into a candidate URL set.
///
/// Implementations own their pacing and failure isolation. `search` never
/// fails; any backend error yields an empty list.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Run a query and return relevant hits, deduplicated by URL
    async fn search(&self, query: &str, max_results: usize) -> Vec<SearchHit>;

    /// Skip this adapter once a topic has collected this many URLs
    fn collect_ceiling(&self) -> Option<usize> {
        None
    }

    /// Get the name of the search backend
    fn name(&self) -> &'static str;
}
