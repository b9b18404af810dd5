// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{AcquireError, OwnedSemaphorePermit, Semaphore};
use tokio::time::Instant;
use url::Url;

/// 提取URL的主机部分（忽略协议与端口）
///
/// 无法解析的URL整体作为键，保证仍然受到限速
pub fn host_key(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|h| h.to_lowercase()))
        .unwrap_or_else(|| url.to_string())
}

/// 每主机最小间隔限速器
///
/// 对同一主机的请求发出时间至少相隔 `interval`。
/// 下一个时间槽在map条目锁内原子预留，多线程运行时下依然成立。
#[derive(Debug)]
pub struct HostRateLimiter {
    interval: Duration,
    last_request: DashMap<String, Instant>,
}

impl HostRateLimiter {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_request: DashMap::new(),
        }
    }

    /// 预留主机的下一个请求时间槽，返回需要等待的时长
    fn reserve(&self, host: &str) -> Duration {
        let now = Instant::now();
        match self.last_request.entry(host.to_string()) {
            Entry::Occupied(mut entry) => {
                let start = (*entry.get() + self.interval).max(now);
                entry.insert(start);
                start - now
            }
            Entry::Vacant(entry) => {
                entry.insert(now);
                Duration::ZERO
            }
        }
    }

    /// 等待直到可以向该主机发出请求
    ///
    /// # 返回值
    ///
    /// 实际等待的时长
    pub async fn wait(&self, host: &str) -> Duration {
        let delay = self.reserve(host);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        delay
    }
}

/// 每主机并发许可管理器
///
/// 为每个主机提供一个独立的信号量，限制同时进行的连接数
#[derive(Clone, Debug)]
pub struct HostPermits {
    semaphores: Arc<DashMap<String, Arc<Semaphore>>>,
    permits_per_host: usize,
}

impl HostPermits {
    pub fn new(permits_per_host: usize) -> Self {
        Self {
            semaphores: Arc::new(DashMap::new()),
            permits_per_host: permits_per_host.max(1),
        }
    }

    /// 获取指定主机的许可
    pub async fn acquire(&self, host: &str) -> Result<OwnedSemaphorePermit, AcquireError> {
        self.get_or_create(host).acquire_owned().await
    }

    fn get_or_create(&self, host: &str) -> Arc<Semaphore> {
        self.semaphores
            .entry(host.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.permits_per_host)))
            .clone()
    }
}
