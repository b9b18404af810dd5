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

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::domain::models::topic::Topic;
use crate::engines::fetcher::FetcherConfig;
use crate::engines::reqwest_engine::DEFAULT_USER_AGENT;
use crate::infrastructure::search::aggregator::DiscoveryConfig;
use crate::infrastructure::search::url_filter::UrlFilter;
use crate::infrastructure::storage::CrawlStorage;
use crate::utils::retry_policy::RetryPolicy;

/// 配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "CRAWLER_CONFIG";
/// 默认配置文件路径
pub const DEFAULT_CONFIG_PATH: &str = "config/crawler_config.yaml";
/// 与配置文件同目录的域名列表文件
pub const DOMAINS_FILE_NAME: &str = "domains_priority.yaml";

/// 配置加载错误
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    #[error("配置中没有任何主题")]
    NoTopics,
}

/// 应用程序配置设置
///
/// 包含抓取、缓存、发现、域名过滤和主题列表等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据输出目录
    pub output_dir: PathBuf,
    /// 日志级别
    pub log_level: String,
    /// 全局并发抓取数
    pub concurrency: usize,
    /// 每主机最大连接数
    pub per_host_connections: usize,
    /// 同一主机请求的最小间隔（秒）
    pub rate_limit: f64,
    /// 单次请求超时（秒）
    pub timeout: u64,
    /// 最大尝试次数
    pub max_retries: u32,
    /// 退避因子
    pub backoff_factor: f64,
    /// User-Agent
    pub user_agent: String,
    /// 每个主题最多爬取的URL数
    pub max_urls_per_topic: usize,
    /// Prometheus导出器监听地址，未设置时不导出
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
    /// 缓存配置
    pub cache: CacheSettings,
    /// 发现配置
    pub discovery: DiscoverySettings,
    /// 域名配置
    #[serde(default)]
    pub domains: DomainSettings,
    #[serde(rename = "topics", default)]
    topic_entries: Vec<TopicSettings>,
    #[serde(skip)]
    topics: Vec<Topic>,
}

/// 缓存配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    /// 是否持久化URL到哈希的索引
    pub persist_index: bool,
}

/// 发现配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoverySettings {
    /// 每次查询的结果上限
    pub max_results_per_query: usize,
    /// 每个主题的查询上限
    pub max_queries_per_topic: usize,
    /// 是否启用Bing
    pub enable_bing: bool,
    /// 是否启用Google Scholar
    pub enable_scholar: bool,
    /// 并发发现的主题数
    pub max_concurrent: usize,
    /// 每次搜索后的等待时间（秒）
    pub per_query_delay_seconds: f64,
    /// 达到该URL数后停止查询
    pub target_urls_per_topic: usize,
    /// 已收集URL数超过该值后跳过Scholar
    pub scholar_cutoff: usize,
}

/// 域名配置设置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DomainSettings {
    #[serde(default)]
    pub priority_domains: Vec<String>,
    #[serde(default)]
    pub exclude_domains: Vec<String>,
}

/// 配置文件中的原始主题条目
#[derive(Debug, Clone, Deserialize)]
struct TopicSettings {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    vendors: Vec<String>,
    #[serde(default)]
    category: Option<String>,
}

impl Settings {
    /// 加载配置
    ///
    /// 顺序：内置默认值 → YAML配置文件 → 同目录的域名列表文件 → `TOPICRAWL__*` 环境变量
    ///
    /// # 参数
    ///
    /// * `path` - 配置文件路径；为空时依次尝试 `CRAWLER_CONFIG` 与默认路径
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(SettingsError)` - 配置加载失败或没有主题
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let (config_path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => match std::env::var(CONFIG_PATH_ENV) {
                Ok(p) if !p.trim().is_empty() => (PathBuf::from(p), true),
                _ => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
            },
        };

        let builder = Config::builder()
            .set_default("output_dir", "crawl_data")?
            .set_default("log_level", "info")?
            .set_default("concurrency", 100)?
            .set_default("per_host_connections", 10)?
            .set_default("rate_limit", 0.5)?
            .set_default("timeout", 30)?
            .set_default("max_retries", 3)?
            .set_default("backoff_factor", 2.0)?
            .set_default("user_agent", DEFAULT_USER_AGENT)?
            .set_default("max_urls_per_topic", 50)?
            .set_default("cache.persist_index", false)?
            .set_default("discovery.max_results_per_query", 20)?
            .set_default("discovery.max_queries_per_topic", 8)?
            .set_default("discovery.enable_bing", true)?
            .set_default("discovery.enable_scholar", false)?
            .set_default("discovery.max_concurrent", 10)?
            .set_default("discovery.per_query_delay_seconds", 2.0)?
            .set_default("discovery.target_urls_per_topic", 30)?
            .set_default("discovery.scholar_cutoff", 15)?
            .add_source(File::from(config_path.as_path()).required(required))
            .add_source(Environment::with_prefix("TOPICRAWL").separator("__"));

        let mut settings: Settings = builder.build()?.try_deserialize()?;

        let domains_path = config_path
            .parent()
            .map(|dir| dir.join(DOMAINS_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DOMAINS_FILE_NAME));
        let extra: DomainSettings = Config::builder()
            .add_source(File::from(domains_path.as_path()).required(false))
            .build()?
            .try_deserialize()?;
        settings.domains.priority_domains.extend(extra.priority_domains);
        settings.domains.exclude_domains.extend(extra.exclude_domains);

        settings.topics = normalize_topics(&settings.topic_entries);
        if settings.topics.is_empty() {
            return Err(SettingsError::NoTopics);
        }

        Ok(settings)
    }

    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    pub fn storage(&self) -> CrawlStorage {
        CrawlStorage::new(&self.output_dir)
    }

    pub fn url_filter(&self) -> UrlFilter {
        UrlFilter::new(&self.domains.priority_domains, &self.domains.exclude_domains)
    }

    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig {
            concurrency: self.concurrency.max(1),
            per_host_connections: self.per_host_connections.max(1),
            rate_limit: seconds(self.rate_limit),
            timeout: Duration::from_secs(self.timeout),
            retry: RetryPolicy::new(self.max_retries, self.backoff_factor),
        }
    }

    pub fn discovery_config(&self) -> DiscoveryConfig {
        DiscoveryConfig {
            max_results_per_query: self.discovery.max_results_per_query,
            max_queries_per_topic: self.discovery.max_queries_per_topic,
            target_urls_per_topic: self.discovery.target_urls_per_topic,
            max_concurrent: self.discovery.max_concurrent.max(1),
        }
    }

    pub fn per_query_delay(&self) -> Duration {
        seconds(self.discovery.per_query_delay_seconds)
    }
}

fn seconds(value: f64) -> Duration {
    Duration::try_from_secs_f64(value.max(0.0)).unwrap_or(Duration::ZERO)
}

/// 主题从1开始编号，缺失或非整数的ID回退为位置序号
fn normalize_topics(entries: &[TopicSettings]) -> Vec<Topic> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let position = index as i64 + 1;
            let id = entry
                .id
                .as_deref()
                .and_then(|raw| raw.trim().parse::<i64>().ok())
                .unwrap_or(position);
            let name = entry
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Topic {}", position));

            Topic::new(id, name)
                .with_keywords(entry.keywords.iter().cloned())
                .with_vendors(entry.vendors.iter().cloned())
                .with_category(entry.category.clone().unwrap_or_default())
        })
        .collect()
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
