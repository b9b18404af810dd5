// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use bytes::Bytes;
use dashmap::DashMap;
use metrics::counter;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::infrastructure::metrics::CACHE_LOOKUPS_TOTAL;
use crate::utils::errors::CacheError;

/// 持久化索引文件名
pub const INDEX_FILE_NAME: &str = "index.json";

/// 缓存命中结果
#[derive(Debug, Clone)]
pub struct CacheHit {
    pub content_hash: String,
    pub content: Bytes,
}

/// 缓存统计
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub total: u64,
    /// 命中率（0.0-1.0），无请求时为0
    pub hit_rate: f64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedIndex {
    urls: HashMap<String, String>,
}

/// 内容寻址缓存
///
/// 载荷按内容摘要存放在 `<dir>/<hash[0..2]>/<hash[2..4]>/<hash>`，
/// 相同内容无论对应多少个URL都只写入一次。
/// URL到摘要的索引默认只存在于内存中，开启 `persist_index` 后
/// 会从 `index.json` 加载并在 [`ContentCache::flush_index`] 时写回。
pub struct ContentCache {
    cache_dir: PathBuf,
    url_to_hash: DashMap<String, String>,
    hits: AtomicU64,
    misses: AtomicU64,
    /// 每个摘要一把写锁，不同内容的写入互不阻塞
    write_locks: DashMap<String, Arc<Mutex<()>>>,
    persist_index: bool,
}

impl ContentCache {
    /// 打开缓存目录
    ///
    /// # 参数
    ///
    /// * `cache_dir` - 缓存根目录，不存在时会被创建
    /// * `persist_index` - 是否跨进程保留URL索引
    ///
    /// # 返回值
    ///
    /// * `Ok(ContentCache)` - 缓存实例
    /// * `Err(CacheError)` - 目录创建或索引读取失败
    pub async fn open(
        cache_dir: impl Into<PathBuf>,
        persist_index: bool,
    ) -> Result<Self, CacheError> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).await?;

        let url_to_hash = DashMap::new();
        if persist_index {
            let index_path = cache_dir.join(INDEX_FILE_NAME);
            match fs::read(&index_path).await {
                Ok(raw) => {
                    let index: PersistedIndex = serde_json::from_slice(&raw)?;
                    debug!("Loaded {} cached URLs from {:?}", index.urls.len(), index_path);
                    for (url, hash) in index.urls {
                        url_to_hash.insert(url, hash);
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::Io(e)),
            }
        }

        Ok(Self {
            cache_dir,
            url_to_hash,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            write_locks: DashMap::new(),
            persist_index,
        })
    }

    /// 计算内容的SHA-256十六进制摘要
    pub fn hash_content(content: &[u8]) -> String {
        hex::encode(Sha256::digest(content))
    }

    /// 摘要对应的载荷路径
    pub fn cache_path(&self, content_hash: &str) -> PathBuf {
        let first = content_hash.get(..2).unwrap_or("__");
        let second = content_hash.get(2..4).unwrap_or("__");
        self.cache_dir.join(first).join(second).join(content_hash)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// URL当前映射到的摘要
    pub fn hash_for(&self, url: &str) -> Option<String> {
        self.url_to_hash.get(url).map(|entry| entry.value().clone())
    }

    /// 查询URL是否已缓存
    ///
    /// 只有本实例（或已加载的持久化索引）记录过的URL才算命中，
    /// 每次调用都会增加命中或未命中计数
    pub async fn lookup(&self, url: &str) -> Result<Option<CacheHit>, CacheError> {
        if let Some(content_hash) = self.hash_for(url) {
            match fs::read(self.cache_path(&content_hash)).await {
                Ok(data) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    counter!(CACHE_LOOKUPS_TOTAL, "result" => "hit").increment(1);
                    debug!("Cache HIT: {}", url);
                    return Ok(Some(CacheHit {
                        content_hash,
                        content: Bytes::from(data),
                    }));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(CacheError::Io(e)),
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        counter!(CACHE_LOOKUPS_TOTAL, "result" => "miss").increment(1);
        Ok(None)
    }

    /// 存储内容并返回其摘要
    ///
    /// 载荷文件已存在时不会再次写入
    pub async fn store(&self, url: &str, content: &[u8]) -> Result<String, CacheError> {
        let content_hash = Self::hash_content(content);
        let path = self.cache_path(&content_hash);

        {
            let lock = self.payload_lock(&content_hash);
            let _guard = lock.lock().await;
            if fs::try_exists(&path).await? {
                debug!("Content already cached (duplicate): {}", &content_hash[..8]);
            } else {
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).await?;
                }
                fs::write(&path, content).await?;
                debug!("Cached: {} -> {}", url, &content_hash[..8]);
            }
        }

        self.url_to_hash.insert(url.to_string(), content_hash.clone());
        Ok(content_hash)
    }

    fn payload_lock(&self, content_hash: &str) -> Arc<Mutex<()>> {
        self.write_locks
            .entry(content_hash.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        let hit_rate = if total > 0 {
            hits as f64 / total as f64
        } else {
            0.0
        };
        CacheStats {
            hits,
            misses,
            total,
            hit_rate,
        }
    }

    /// 将URL索引写回 `index.json`（未开启持久化时为空操作）
    pub async fn flush_index(&self) -> Result<(), CacheError> {
        if !self.persist_index {
            return Ok(());
        }
        let index = PersistedIndex {
            urls: self
                .url_to_hash
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().clone()))
                .collect(),
        };
        let raw = serde_json::to_vec_pretty(&index)?;
        fs::write(self.cache_dir.join(INDEX_FILE_NAME), raw).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "content_cache_test.rs"]
mod tests;
