// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::domain::models::fetch_result::FetchResult;
use crate::engines::rate_limiter::{host_key, HostPermits, HostRateLimiter};
use crate::engines::traits::{EngineError, ScrapeRequest, ScraperEngine};
use crate::infrastructure::cache::content_cache::ContentCache;
use crate::infrastructure::metrics::{FETCH_REQUESTS_TOTAL, FETCH_RETRIES_TOTAL};
use crate::utils::errors::FetchError;
use crate::utils::retry_policy::RetryPolicy;

/// 抓取器配置
#[derive(Debug, Clone)]
pub struct FetcherConfig {
    /// 全局最大并发抓取数
    pub concurrency: usize,
    /// 每主机最大并发连接数
    pub per_host_connections: usize,
    /// 同一主机请求的最小间隔
    pub rate_limit: Duration,
    /// 单次尝试超时
    pub timeout: Duration,
    /// 重试策略
    pub retry: RetryPolicy,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            concurrency: 100,
            per_host_connections: 10,
            rate_limit: Duration::from_millis(500),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }
}

/// 有界并发抓取器
///
/// 单个URL的处理顺序：
/// 1. 查询内容缓存，命中则直接返回，跳过限速与重试
/// 2. 获取全局并发许可
/// 3. 等待每主机限速
/// 4. 最多尝试 `max_retries` 次；200写入缓存并返回，其他状态码立即失败，
///    超时与传输错误按指数退避后重试
pub struct Fetcher {
    engine: Arc<dyn ScraperEngine>,
    cache: Arc<ContentCache>,
    rate_limiter: HostRateLimiter,
    host_permits: HostPermits,
    permits: Arc<Semaphore>,
    timeout: Duration,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(
        engine: Arc<dyn ScraperEngine>,
        cache: Arc<ContentCache>,
        config: FetcherConfig,
    ) -> Self {
        Self {
            engine,
            cache,
            rate_limiter: HostRateLimiter::new(config.rate_limit),
            host_permits: HostPermits::new(config.per_host_connections),
            permits: Arc::new(Semaphore::new(config.concurrency.max(1))),
            timeout: config.timeout,
            retry: config.retry,
        }
    }

    pub fn cache(&self) -> &Arc<ContentCache> {
        &self.cache
    }

    /// 抓取单个URL
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    /// * `topic_name` - 所属主题名称
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(FetchResult))` - 抓取成功或缓存命中
    /// * `Ok(None)` - 非200响应或重试耗尽
    /// * `Err(FetchError)` - 缓存读写失败
    pub async fn fetch(&self, url: &str, topic_name: &str) -> Result<Option<FetchResult>, FetchError> {
        if let Some(hit) = self.cache.lookup(url).await? {
            counter!(FETCH_REQUESTS_TOTAL, "outcome" => "cache_hit").increment(1);
            return Ok(Some(FetchResult {
                url: url.to_string(),
                final_url: url.to_string(),
                content_hash: hit.content_hash,
                topic_name: topic_name.to_string(),
                timestamp: Utc::now(),
                status_code: 200,
                from_cache: true,
                content: hit.content,
            }));
        }

        let _permit = self.permits.acquire().await?;
        let host = host_key(url);
        let _host_permit = self.host_permits.acquire(&host).await?;
        self.rate_limiter.wait(&host).await;

        let request = ScrapeRequest::new(url, self.timeout);
        let max_retries = self.retry.max_retries;

        for attempt in 0..max_retries {
            let outcome = match tokio::time::timeout(self.timeout, self.engine.scrape(&request)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(EngineError::Timeout),
            };

            match outcome {
                Ok(response) if response.status_code == 200 => {
                    let content_hash = self.cache.store(url, &response.content).await?;
                    counter!(FETCH_REQUESTS_TOTAL, "outcome" => "ok").increment(1);
                    info!(
                        "[OK] Fetched: {} ({} bytes, {}, {} ms)",
                        url,
                        response.content.len(),
                        response.content_type,
                        response.response_time_ms
                    );
                    return Ok(Some(FetchResult {
                        url: url.to_string(),
                        final_url: response.final_url,
                        content_hash,
                        topic_name: topic_name.to_string(),
                        timestamp: Utc::now(),
                        status_code: response.status_code,
                        from_cache: false,
                        content: response.content,
                    }));
                }
                Ok(response) => {
                    warn!("[FAIL] HTTP {}: {}", response.status_code, url);
                    counter!(FETCH_REQUESTS_TOTAL, "outcome" => "http_error").increment(1);
                    return Ok(None);
                }
                Err(e) => {
                    match &e {
                        EngineError::Timeout => warn!(
                            "[TIMEOUT] Attempt {}/{}: {}",
                            attempt + 1,
                            max_retries,
                            url
                        ),
                        other => error!("[ERROR] Fetching {}: {}", url, other),
                    }
                    if !e.is_retryable() {
                        counter!(FETCH_REQUESTS_TOTAL, "outcome" => "error").increment(1);
                        return Ok(None);
                    }
                    if self.retry.should_retry(attempt) {
                        counter!(FETCH_RETRIES_TOTAL).increment(1);
                        tokio::time::sleep(self.retry.calculate_backoff(attempt)).await;
                    }
                }
            }
        }

        counter!(FETCH_REQUESTS_TOTAL, "outcome" => "exhausted").increment(1);
        Ok(None)
    }
}

#[cfg(test)]
#[path = "fetcher_test.rs"]
mod tests;
