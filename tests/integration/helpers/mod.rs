// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use topicrawl::application::use_cases::crawl_use_case::BatchCrawler;
use topicrawl::engines::fetcher::{Fetcher, FetcherConfig};
use topicrawl::engines::reqwest_engine::ReqwestEngine;
use topicrawl::infrastructure::cache::content_cache::ContentCache;
use topicrawl::infrastructure::storage::CrawlStorage;
use topicrawl::utils::retry_policy::RetryPolicy;

/// 使用真实HTTP引擎、短超时与毫秒级退避的爬取器
pub async fn create_test_crawler(output_dir: &Path) -> BatchCrawler {
    let storage = CrawlStorage::new(output_dir);
    let cache = ContentCache::open(storage.cache_dir(), true)
        .await
        .expect("cache dir");
    let engine = ReqwestEngine::new("topicrawl-test", 4).expect("http client");
    let config = FetcherConfig {
        concurrency: 8,
        per_host_connections: 4,
        rate_limit: Duration::ZERO,
        timeout: Duration::from_millis(500),
        retry: RetryPolicy::new(2, 2.0).with_backoff_unit(Duration::from_millis(10)),
    };
    let fetcher = Fetcher::new(Arc::new(engine), Arc::new(cache), config);
    BatchCrawler::new(Arc::new(fetcher), storage)
}

/// 读取目录下所有JSON文件名
pub fn json_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .filter(|name| name.ends_with(".json"))
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}
