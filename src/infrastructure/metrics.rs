// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use tracing::{info, warn};

/// 抓取请求计数，按 `outcome` 区分
pub const FETCH_REQUESTS_TOTAL: &str = "fetch_requests_total";
/// 抓取重试次数
pub const FETCH_RETRIES_TOTAL: &str = "fetch_retries_total";
/// 缓存查询计数，按 `result` 区分 hit/miss
pub const CACHE_LOOKUPS_TOTAL: &str = "cache_lookups_total";
/// 单个主题的爬取耗时
pub const CRAWL_TOPIC_DURATION_SECONDS: &str = "crawl_topic_duration_seconds";
/// 发现阶段收集的URL数
pub const DISCOVERY_URLS_TOTAL: &str = "discovery_urls_total";
/// 发现失败的主题数
pub const DISCOVERY_TOPICS_FAILED_TOTAL: &str = "discovery_topics_failed_total";

/// 初始化指标系统
///
/// 配置了监听地址时安装Prometheus导出器；未安装时指标调用为空操作
pub fn init_metrics(listen: Option<SocketAddr>) {
    let Some(addr) = listen else {
        return;
    };

    if let Err(e) = PrometheusBuilder::new().with_http_listener(addr).install() {
        warn!(
            "Failed to install Prometheus recorder: {}. This might happen if the port is already in use.",
            e
        );
        return;
    }
    info!("Metrics exporter listening on {}", addr);

    describe_counter!(FETCH_REQUESTS_TOTAL, "Fetch outcomes by kind");
    describe_counter!(FETCH_RETRIES_TOTAL, "Retries issued after transient failures");
    describe_counter!(CACHE_LOOKUPS_TOTAL, "Content cache lookups by result");
    describe_histogram!(
        CRAWL_TOPIC_DURATION_SECONDS,
        "Duration of a topic crawl in seconds"
    );
    describe_counter!(DISCOVERY_URLS_TOTAL, "URLs collected during discovery");
    describe_counter!(
        DISCOVERY_TOPICS_FAILED_TOTAL,
        "Topics whose discovery task failed"
    );
}
