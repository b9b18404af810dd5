// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use bytes::Bytes;
use futures::future::join_all;
use metrics::histogram;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::domain::models::discovery::DiscoveredUrl;
use crate::domain::models::fetch_result::FetchResult;
use crate::domain::models::topic::Topic;
use crate::engines::fetcher::Fetcher;
use crate::infrastructure::metrics::CRAWL_TOPIC_DURATION_SECONDS;
use crate::infrastructure::storage::CrawlStorage;
use crate::utils::content::{decode_body, extract_links, relevance_score};
use crate::utils::errors::CrawlError;

/// 一条待抓取的种子
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlSeed {
    pub url: String,
    pub topic_name: String,
}

impl CrawlSeed {
    pub fn new(url: impl Into<String>, topic_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            topic_name: topic_name.into(),
        }
    }
}

/// 单个主题的爬取统计
#[derive(Debug, Clone, PartialEq)]
pub struct TopicCrawlSummary {
    pub topic_id: i64,
    pub topic_name: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub from_cache: usize,
    pub metadata_written: usize,
    pub cache_hit_rate: f64,
    pub average_relevance: f64,
    /// 本主题页面中出现的不同外链数
    pub outbound_links: usize,
    pub output_dir: PathBuf,
}

/// 整次运行的爬取统计
#[derive(Debug, Clone, Default)]
pub struct CrawlRunSummary {
    pub discovery_file: PathBuf,
    pub topics: Vec<TopicCrawlSummary>,
    pub skipped: Vec<i64>,
    pub failed: Vec<i64>,
    pub total_attempted: usize,
    pub total_succeeded: usize,
    pub elapsed: Duration,
}

/// 批量爬取器
///
/// 把一组 (URL, 主题) 并发交给抓取器，只保留成功结果，
/// 并把每条结果的元数据写入主题目录
pub struct BatchCrawler {
    fetcher: Arc<Fetcher>,
    storage: CrawlStorage,
}

impl BatchCrawler {
    pub fn new(fetcher: Arc<Fetcher>, storage: CrawlStorage) -> Self {
        Self { fetcher, storage }
    }

    pub fn fetcher(&self) -> &Arc<Fetcher> {
        &self.fetcher
    }

    pub fn storage(&self) -> &CrawlStorage {
        &self.storage
    }

    /// 并发抓取一批种子
    ///
    /// 并发度由抓取器的许可池限制，与批大小无关。失败的URL被静默丢弃，
    /// 不在批次层面重试；只有缓存IO错误会向上传播
    ///
    /// # 参数
    ///
    /// * `seeds` - 待抓取的种子列表
    ///
    /// # 返回值
    ///
    /// 成功抓取的结果（无序）
    pub async fn crawl_batch(&self, seeds: &[CrawlSeed]) -> Result<Vec<FetchResult>, CrawlError> {
        let outcomes = join_all(
            seeds
                .iter()
                .map(|seed| self.fetcher.fetch(&seed.url, &seed.topic_name)),
        )
        .await;

        let mut results = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            if let Some(result) = outcome? {
                results.push(result);
            }
        }
        Ok(results)
    }

    /// 持久化一批结果的元数据
    ///
    /// 同一批中重复的文件键只保留第一条记录
    pub async fn persist_results(
        &self,
        topic: &Topic,
        results: &[FetchResult],
    ) -> Result<usize, CrawlError> {
        let mut seen = HashSet::with_capacity(results.len());
        let mut written = 0;

        for result in results {
            let metadata = result.metadata();
            let key = CrawlStorage::metadata_file_name(&metadata);
            if !seen.insert(key.clone()) {
                warn!(
                    "[Topic {:03}] Metadata key collision for {}: {}",
                    topic.id, result.url, key
                );
                continue;
            }
            self.storage.save_metadata(topic, &metadata).await?;
            written += 1;
        }

        Ok(written)
    }

    /// 爬取单个主题的已发现URL
    ///
    /// # 参数
    ///
    /// * `topic` - 主题
    /// * `discovered` - 该主题已发现的URL（按优先级排序）
    /// * `max_urls` - 最多爬取的URL数量
    pub async fn crawl_topic(
        &self,
        topic: &Topic,
        discovered: &[DiscoveredUrl],
        max_urls: usize,
    ) -> Result<TopicCrawlSummary, CrawlError> {
        info!("Starting crawl for: {} (ID: {})", topic.name, topic.id);

        let seeds: Vec<CrawlSeed> = discovered
            .iter()
            .take(max_urls)
            .map(|entry| CrawlSeed::new(entry.url.clone(), topic.name.clone()))
            .collect();

        let output_dir = self.storage.topic_dir(topic);
        if seeds.is_empty() {
            warn!("No URLs found for {}, skipping", topic.name);
            return Ok(TopicCrawlSummary {
                topic_id: topic.id,
                topic_name: topic.name.clone(),
                attempted: 0,
                succeeded: 0,
                from_cache: 0,
                metadata_written: 0,
                cache_hit_rate: self.fetcher.cache().stats().hit_rate,
                average_relevance: 0.0,
                outbound_links: 0,
                output_dir,
            });
        }

        info!("Crawling {} discovered URLs", seeds.len());

        let started = Instant::now();
        let results = self.crawl_batch(&seeds).await?;
        let metadata_written = self.persist_results(topic, &results).await?;

        histogram!(CRAWL_TOPIC_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

        let analysis = analyze_pages(&results, &topic.keywords).await;
        let stats = self.fetcher.cache().stats();
        let summary = TopicCrawlSummary {
            topic_id: topic.id,
            topic_name: topic.name.clone(),
            attempted: seeds.len(),
            succeeded: results.len(),
            from_cache: results.iter().filter(|r| r.from_cache).count(),
            metadata_written,
            cache_hit_rate: stats.hit_rate,
            average_relevance: analysis.average_relevance,
            outbound_links: analysis.outbound_links,
            output_dir,
        };

        info!(
            topic = %summary.topic_name,
            crawled = summary.succeeded,
            attempted = summary.attempted,
            cache_hits = stats.hits,
            cache_misses = stats.misses,
            outbound_links = summary.outbound_links,
            "Topic crawl finished: {}/{} URLs, cache hit rate {:.1}%, avg relevance {:.2}, data saved to {}",
            summary.succeeded,
            summary.attempted,
            summary.cache_hit_rate * 100.0,
            summary.average_relevance,
            summary.output_dir.display()
        );

        Ok(summary)
    }

    /// 爬取所有主题
    ///
    /// 优先读取增强发现文件，回退到基础文件。单个主题的失败只记录日志，
    /// 不影响其余主题；运行结束后刷新缓存索引
    pub async fn crawl_all_topics(
        &self,
        topics: &[Topic],
        max_urls_per_topic: usize,
    ) -> Result<CrawlRunSummary, CrawlError> {
        info!(
            "Starting crawl for {} topics (max {} URLs per topic, storage: {})",
            topics.len(),
            max_urls_per_topic,
            self.storage.base_path().display()
        );

        let loaded = self
            .storage
            .load_discovery()
            .await?
            .ok_or_else(|| CrawlError::MissingDiscovery(self.storage.enhanced_discovery_path()))?;
        info!("Loading discovered URLs from {}", loaded.path.display());

        let started = Instant::now();
        let mut summary = CrawlRunSummary {
            discovery_file: loaded.path.clone(),
            ..Default::default()
        };

        for topic in topics {
            let urls = match loaded.topic_urls(topic.id) {
                Some(Ok(urls)) => urls,
                Some(Err(e)) => {
                    error!("Invalid discovery entry for {}: {}", topic.name, e);
                    summary.failed.push(topic.id);
                    continue;
                }
                None => {
                    warn!("No discovered URLs for {}", topic.name);
                    summary.skipped.push(topic.id);
                    continue;
                }
            };

            info!("Found {} URLs for {}", urls.len(), topic.name);
            match self
                .crawl_topic(topic, &urls, max_urls_per_topic)
                .await
            {
                Ok(topic_summary) => {
                    summary.total_attempted += topic_summary.attempted;
                    summary.total_succeeded += topic_summary.succeeded;
                    summary.topics.push(topic_summary);
                }
                Err(e) => {
                    error!("Failed to crawl {}: {}", topic.name, e);
                    summary.failed.push(topic.id);
                }
            }
        }

        self.fetcher.cache().flush_index().await?;
        summary.elapsed = started.elapsed();

        info!(
            "Crawl complete: {} URLs crawled of {} attempted in {:.1} minutes, results saved to {}",
            summary.total_succeeded,
            summary.total_attempted,
            summary.elapsed.as_secs_f64() / 60.0,
            self.storage.raw_dir().display()
        );

        Ok(summary)
    }
}

/// PDF文件头，这类内容不做HTML解析
const PDF_MAGIC: &[u8] = b"%PDF-";

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct PageAnalysis {
    average_relevance: f64,
    outbound_links: usize,
}

/// 在阻塞线程池中解析页面，计算平均相关性与外链数
async fn analyze_pages(results: &[FetchResult], keywords: &[String]) -> PageAnalysis {
    if results.is_empty() {
        return PageAnalysis::default();
    }
    let pages: Vec<(String, Bytes)> = results
        .iter()
        .map(|result| (result.final_url.clone(), result.content.clone()))
        .collect();
    let keywords = keywords.to_vec();

    match tokio::task::spawn_blocking(move || analyze_blocking(&pages, &keywords)).await {
        Ok(analysis) => analysis,
        Err(e) => {
            warn!("Page analysis failed: {}", e);
            PageAnalysis::default()
        }
    }
}

fn analyze_blocking(pages: &[(String, Bytes)], keywords: &[String]) -> PageAnalysis {
    let mut total = 0.0;
    let mut links = HashSet::new();

    for (url, content) in pages {
        if content.starts_with(PDF_MAGIC) {
            continue;
        }
        let html = decode_body(content);
        total += relevance_score(&html, keywords);
        links.extend(extract_links(&html, url));
    }

    PageAnalysis {
        average_relevance: total / pages.len() as f64,
        outbound_links: links.len(),
    }
}
