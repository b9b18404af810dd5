// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 优先域名命中的URL优先级
pub const PRIORITY_MATCH: u8 = 100;
/// 普通URL的默认优先级
pub const PRIORITY_DEFAULT: u8 = 50;

/// 发现阶段产出的候选URL
///
/// 在同一主题的结果集中按URL字符串精确去重
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredUrl {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
    /// 产生该URL的查询语句
    #[serde(rename = "query", default)]
    pub source_query: String,
    #[serde(skip)]
    pub topic_id: i64,
    /// 排序优先级，优先域名为 [`PRIORITY_MATCH`]
    #[serde(rename = "priority", default = "default_priority")]
    pub priority_rank: u8,
}

fn default_priority() -> u8 {
    PRIORITY_DEFAULT
}

impl DiscoveredUrl {
    pub fn is_priority(&self) -> bool {
        self.priority_rank >= PRIORITY_MATCH
    }
}

/// 单个主题的发现结果
///
/// 排序不变式：优先域名的URL在前，其余按URL字典序
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    pub tech_id: i64,
    pub tech_name: String,
    #[serde(default)]
    pub category: String,
    pub count: usize,
    pub urls: Vec<DiscoveredUrl>,
    pub discovered_at: DateTime<Utc>,
}

impl DiscoveryResult {
    pub fn new(
        tech_id: i64,
        tech_name: String,
        category: String,
        mut urls: Vec<DiscoveredUrl>,
    ) -> Self {
        sort_by_priority(&mut urls);
        for entry in urls.iter_mut() {
            entry.topic_id = tech_id;
        }
        Self {
            tech_id,
            tech_name,
            category,
            count: urls.len(),
            urls,
            discovered_at: Utc::now(),
        }
    }
}

/// 优先域名在前，其余按URL字典序
pub fn sort_by_priority(urls: &mut [DiscoveredUrl]) {
    urls.sort_by(|a, b| {
        b.is_priority()
            .cmp(&a.is_priority())
            .then_with(|| a.url.cmp(&b.url))
    });
}
