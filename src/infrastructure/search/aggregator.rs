// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::counter;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{error, info};

use crate::domain::models::discovery::{
    DiscoveredUrl, DiscoveryResult, PRIORITY_DEFAULT, PRIORITY_MATCH,
};
use crate::domain::models::topic::Topic;
use crate::domain::search::engine::SourceAdapter;
use crate::infrastructure::metrics::{DISCOVERY_TOPICS_FAILED_TOTAL, DISCOVERY_URLS_TOTAL};
use crate::infrastructure::search::queries::build_search_queries;
use crate::infrastructure::search::url_filter::UrlFilter;
use crate::utils::errors::DiscoveryError;

/// Discovery limits
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Result cap passed to each backend call
    pub max_results_per_query: usize,
    /// Maximum queries issued per topic
    pub max_queries_per_topic: usize,
    /// Stop querying once a topic has this many unique URLs
    pub target_urls_per_topic: usize,
    /// Topics discovered concurrently
    pub max_concurrent: usize,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_results_per_query: 20,
            max_queries_per_topic: 8,
            target_urls_per_topic: 30,
            max_concurrent: 10,
        }
    }
}

/// Outcome of a discovery run over many topics
#[derive(Debug, Default)]
pub struct DiscoveryOutcome {
    /// Successful topics keyed by topic id
    pub results: BTreeMap<String, DiscoveryResult>,
    /// Ids of topics whose task failed
    pub failed: Vec<i64>,
}

impl DiscoveryOutcome {
    pub fn total_urls(&self) -> usize {
        self.results.values().map(|r| r.count).sum()
    }
}

/// Multi-source discovery aggregator.
///
/// Per topic: walk the query plan in order, ask every active backend,
/// merge hits into a URL-keyed set and stop early at the target size.
/// Backends are picked by configuration when the aggregator is built.
pub struct DiscoveryAggregator {
    sources: Vec<Arc<dyn SourceAdapter>>,
    filter: Arc<UrlFilter>,
    config: DiscoveryConfig,
    permits: Arc<Semaphore>,
}

impl DiscoveryAggregator {
    pub fn new(
        sources: Vec<Arc<dyn SourceAdapter>>,
        filter: Arc<UrlFilter>,
        config: DiscoveryConfig,
    ) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_concurrent.max(1)));
        Self {
            sources,
            filter,
            config,
            permits,
        }
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Discover candidate URLs for a single topic
    pub async fn discover_topic(&self, topic: &Topic) -> Result<DiscoveryResult, DiscoveryError> {
        if topic.name.trim().is_empty() {
            return Err(DiscoveryError::InvalidTopic(format!(
                "topic {} has no name",
                topic.id
            )));
        }

        info!("[Topic {:03}] Starting discovery: {}", topic.id, topic.name);

        let queries = build_search_queries(topic, self.config.max_queries_per_topic);
        let mut collected: HashMap<String, DiscoveredUrl> = HashMap::new();

        for query in &queries {
            for source in &self.sources {
                if let Some(ceiling) = source.collect_ceiling() {
                    if collected.len() >= ceiling {
                        continue;
                    }
                }

                let hits = source
                    .search(query, self.config.max_results_per_query)
                    .await;

                for hit in hits {
                    let priority_rank = if self.filter.is_priority(&hit.url) {
                        PRIORITY_MATCH
                    } else {
                        PRIORITY_DEFAULT
                    };
                    collected
                        .entry(hit.url.clone())
                        .or_insert_with(|| DiscoveredUrl {
                            url: hit.url,
                            title: hit.title,
                            snippet: hit.snippet,
                            source_query: query.clone(),
                            topic_id: topic.id,
                            priority_rank,
                        });
                }
            }

            if collected.len() >= self.config.target_urls_per_topic {
                break;
            }
        }

        let result = DiscoveryResult::new(
            topic.id,
            topic.name.clone(),
            topic.category.clone(),
            collected.into_values().collect(),
        );

        info!("[Topic {:03}] Found {} URLs", topic.id, result.count);
        Ok(result)
    }

    /// Discover all topics concurrently, bounded by `max_concurrent`.
    ///
    /// A failing or panicking topic is logged and left out of the results.
    pub async fn discover_all(self: &Arc<Self>, topics: &[Topic]) -> DiscoveryOutcome {
        info!(
            "Starting discovery for {} topics ({} parallel, sources: {:?})",
            topics.len(),
            self.config.max_concurrent,
            self.source_names()
        );

        let handles: Vec<_> = topics
            .iter()
            .cloned()
            .map(|topic| {
                let aggregator = Arc::clone(self);
                let topic_id = topic.id;
                let handle = tokio::spawn(async move {
                    let _permit = aggregator
                        .permits
                        .clone()
                        .acquire_owned()
                        .await
                        .map_err(|e| DiscoveryError::TaskFailed(e.to_string()))?;
                    aggregator.discover_topic(&topic).await
                });
                (topic_id, handle)
            })
            .collect();

        let mut outcome = DiscoveryOutcome::default();
        for (topic_id, handle) in handles {
            let joined = handle
                .await
                .map_err(|e| DiscoveryError::TaskFailed(e.to_string()))
                .and_then(|result| result);
            match joined {
                Ok(result) => {
                    counter!(DISCOVERY_URLS_TOTAL).increment(result.count as u64);
                    outcome.results.insert(result.tech_id.to_string(), result);
                }
                Err(e) => {
                    error!("[Topic {:03}] Discovery failed: {}", topic_id, e);
                    counter!(DISCOVERY_TOPICS_FAILED_TOTAL).increment(1);
                    outcome.failed.push(topic_id);
                }
            }
        }

        outcome
    }
}

#[cfg(test)]
#[path = "aggregator_test.rs"]
mod tests;
