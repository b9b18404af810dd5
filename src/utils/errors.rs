// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 内容缓存错误类型
///
/// 仅包含文件系统相关的失败，直接向调用方传播
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("缓存IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("缓存索引序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 抓取错误类型
///
/// 网络失败在抓取器内部被吸收为 `None`，只有存储失败会逃逸
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("缓存错误: {0}")]
    Cache(#[from] CacheError),

    #[error("并发许可池已关闭")]
    PermitsClosed(#[from] tokio::sync::AcquireError),
}

/// 结果持久化错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("存储IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 批量爬取错误类型
#[derive(Error, Debug)]
pub enum CrawlError {
    #[error("抓取错误: {0}")]
    Fetch(#[from] FetchError),

    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),

    #[error("缓存错误: {0}")]
    Cache(#[from] CacheError),

    #[error("未找到发现结果文件: {}", .0.display())]
    MissingDiscovery(std::path::PathBuf),
}

/// 主题发现错误类型
#[derive(Error, Debug)]
pub enum DiscoveryError {
    #[error("无效主题: {0}")]
    InvalidTopic(String),

    #[error("发现任务失败: {0}")]
    TaskFailed(String),

    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
}
