// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个URL的成功抓取结果
///
/// 每个最终成功（直接抓取或命中缓存）的URL恰好产生一个结果，创建后不再修改
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// 请求的URL
    pub url: String,
    /// 重定向后的最终URL
    pub final_url: String,
    /// 内容的SHA-256摘要（64位十六进制）
    pub content_hash: String,
    /// 所属主题名称
    pub topic_name: String,
    /// 结果产生时间
    pub timestamp: DateTime<Utc>,
    /// HTTP状态码（缓存命中时为200）
    pub status_code: u16,
    /// 是否来自缓存
    pub from_cache: bool,
    /// 响应内容
    pub content: Bytes,
}

impl FetchResult {
    /// 生成持久化用的元数据记录
    pub fn metadata(&self) -> FetchMetadata {
        FetchMetadata {
            url: self.url.clone(),
            final_url: self.final_url.clone(),
            content_hash: self.content_hash.clone(),
            topic_name: self.topic_name.clone(),
            timestamp: self.timestamp,
            content_length: self.content.len(),
            from_cache: self.from_cache,
        }
    }
}

/// 原始结果元数据文件内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchMetadata {
    pub url: String,
    pub final_url: String,
    pub content_hash: String,
    pub topic_name: String,
    pub timestamp: DateTime<Utc>,
    pub content_length: usize,
    pub from_cache: bool,
}
