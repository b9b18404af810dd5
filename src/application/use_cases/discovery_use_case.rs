// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::config::settings::Settings;
use crate::domain::models::topic::Topic;
use crate::domain::search::engine::SourceAdapter;
use crate::infrastructure::search::aggregator::{DiscoveryAggregator, DiscoveryOutcome};
use crate::infrastructure::search::bing::BingSource;
use crate::infrastructure::search::duckduckgo::DuckDuckGoSource;
use crate::infrastructure::search::scholar::ScholarSource;
use crate::infrastructure::search::source::SourceContext;
use crate::infrastructure::search::url_filter::UrlFilter;
use crate::infrastructure::storage::CrawlStorage;
use crate::utils::errors::DiscoveryError;

/// 按配置组装搜索源
///
/// DuckDuckGo始终启用，Bing与Scholar由开关控制
pub fn build_sources(settings: &Settings, filter: Arc<UrlFilter>) -> Vec<Arc<dyn SourceAdapter>> {
    let context = SourceContext::new(&settings.user_agent, filter, settings.per_query_delay());

    let mut sources: Vec<Arc<dyn SourceAdapter>> =
        vec![Arc::new(DuckDuckGoSource::new(context.clone()))];
    if settings.discovery.enable_bing {
        sources.push(Arc::new(BingSource::new(context.clone())));
    }
    if settings.discovery.enable_scholar {
        sources.push(Arc::new(
            ScholarSource::new(context).with_cutoff(settings.discovery.scholar_cutoff),
        ));
    }
    sources
}

/// 主题发现用例
///
/// 对所有主题运行发现聚合器，结束后一次性写出增强发现文件
pub struct DiscoveryUseCase {
    aggregator: Arc<DiscoveryAggregator>,
    storage: CrawlStorage,
}

impl DiscoveryUseCase {
    pub fn new(aggregator: Arc<DiscoveryAggregator>, storage: CrawlStorage) -> Self {
        Self {
            aggregator,
            storage,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        let filter = Arc::new(settings.url_filter());
        let sources = build_sources(settings, filter.clone());
        let aggregator = DiscoveryAggregator::new(sources, filter, settings.discovery_config());
        Self::new(Arc::new(aggregator), settings.storage())
    }

    /// 发现所有主题的候选URL并写出结果文件
    ///
    /// # 参数
    ///
    /// * `topics` - 主题列表
    ///
    /// # 返回值
    ///
    /// * `Ok(DiscoveryOutcome)` - 成功主题的结果与失败主题ID
    /// * `Err(DiscoveryError)` - 结果文件写入失败
    pub async fn discover_all_topics(
        &self,
        topics: &[Topic],
    ) -> Result<DiscoveryOutcome, DiscoveryError> {
        let started = Instant::now();
        let outcome = self.aggregator.discover_all(topics).await;
        let path = self.storage.save_discovery(&outcome.results).await?;

        let succeeded = outcome.results.len();
        let total_urls = outcome.total_urls();
        let average = if succeeded == 0 {
            0.0
        } else {
            total_urls as f64 / succeeded as f64
        };

        info!(
            succeeded,
            failed = outcome.failed.len(),
            total_urls,
            "Discovery complete: {}/{} topics, {} URLs ({:.1} per topic) in {:.1} minutes, saved to {}",
            succeeded,
            topics.len(),
            total_urls,
            average,
            started.elapsed().as_secs_f64() / 60.0,
            path.display()
        );

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::engine::SearchHit;
    use crate::infrastructure::search::aggregator::DiscoveryConfig;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct StaticSource;

    #[async_trait]
    impl SourceAdapter for StaticSource {
        async fn search(&self, query: &str, _max_results: usize) -> Vec<SearchHit> {
            vec![SearchHit::new(format!(
                "https://docs.test/{}",
                query.replace(' ', "-")
            ))]
        }

        fn name(&self) -> &'static str {
            "static"
        }
    }

    #[tokio::test]
    async fn test_discovery_writes_enhanced_file() {
        let temp = TempDir::new().unwrap();
        let storage = CrawlStorage::new(temp.path());
        let aggregator = DiscoveryAggregator::new(
            vec![Arc::new(StaticSource)],
            Arc::new(UrlFilter::new(["docs.test"], Vec::<String>::new())),
            DiscoveryConfig {
                max_queries_per_topic: 2,
                ..DiscoveryConfig::default()
            },
        );
        let use_case = DiscoveryUseCase::new(Arc::new(aggregator), storage.clone());

        let outcome = use_case
            .discover_all_topics(&[Topic::new(3, "Heat Pumps").with_category("hvac")])
            .await
            .unwrap();
        assert_eq!(outcome.total_urls(), 2);

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(storage.enhanced_discovery_path()).unwrap())
                .unwrap();
        let entry = &raw["3"];
        assert_eq!(entry["tech_id"], 3);
        assert_eq!(entry["tech_name"], "Heat Pumps");
        assert_eq!(entry["category"], "hvac");
        assert_eq!(entry["count"], 2);
        assert_eq!(entry["urls"][0]["priority"], 100);
        assert!(entry["urls"][0]["query"].is_string());
        assert!(entry["discovered_at"].is_string());
    }
}
