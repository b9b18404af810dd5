// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::domain::models::discovery::{DiscoveredUrl, DiscoveryResult, PRIORITY_DEFAULT};
use crate::domain::models::fetch_result::FetchMetadata;
use crate::domain::models::topic::Topic;
use crate::utils::errors::StorageError;

/// 增强发现结果文件名
pub const ENHANCED_DISCOVERY_FILE: &str = "discovered_urls_enhanced.json";
/// 基础发现结果文件名（回退）
pub const BASIC_DISCOVERY_FILE: &str = "discovered_urls.json";
/// 原始结果元数据目录
pub const RAW_DIR: &str = "raw";
/// 内容缓存目录
pub const CACHE_DIR: &str = "cache";

/// 元数据文件名中每段哈希的长度
const KEY_PREFIX_LEN: usize = 16;

/// 从发现文件中读取的单个主题条目
///
/// 两种文件格式都包含 `urls` 列表，其余字段忽略。列表元素既可以是
/// 完整的URL记录，也可以是纯URL字符串
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredTopicUrls {
    #[serde(default, deserialize_with = "deserialize_urls")]
    pub urls: Vec<DiscoveredUrl>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoredUrl {
    Plain(String),
    Full(DiscoveredUrl),
}

impl From<StoredUrl> for DiscoveredUrl {
    fn from(stored: StoredUrl) -> Self {
        match stored {
            StoredUrl::Full(entry) => entry,
            StoredUrl::Plain(url) => DiscoveredUrl {
                url,
                title: None,
                snippet: None,
                source_query: String::new(),
                topic_id: 0,
                priority_rank: PRIORITY_DEFAULT,
            },
        }
    }
}

fn deserialize_urls<'de, D>(deserializer: D) -> Result<Vec<DiscoveredUrl>, D::Error>
where
    D: Deserializer<'de>,
{
    let stored = Vec::<StoredUrl>::deserialize(deserializer)?;
    Ok(stored.into_iter().map(DiscoveredUrl::from).collect())
}

/// 已加载的发现文件
///
/// 主题条目保持原始JSON，逐个主题解析，单个条目损坏不影响其他主题
#[derive(Debug, Clone)]
pub struct LoadedDiscovery {
    pub path: PathBuf,
    pub topics: BTreeMap<String, Value>,
}

impl LoadedDiscovery {
    /// 解析某个主题的URL列表
    ///
    /// # 返回值
    ///
    /// * `None` - 文件中没有该主题
    /// * `Some(Err(_))` - 该主题的条目格式错误
    pub fn topic_urls(&self, topic_id: i64) -> Option<Result<Vec<DiscoveredUrl>, StorageError>> {
        self.topics.get(&topic_id.to_string()).map(|entry| {
            StoredTopicUrls::deserialize(entry)
                .map(|stored| stored.urls)
                .map_err(StorageError::from)
        })
    }
}

/// 本地文件系统上的爬取数据存储
///
/// 目录布局：
/// - `<output_dir>/discovered_urls_enhanced.json`
/// - `<output_dir>/raw/topic_<id>/<content16>_<url16>.json`
/// - `<output_dir>/cache/`
#[derive(Debug, Clone)]
pub struct CrawlStorage {
    base_path: PathBuf,
}

impl CrawlStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn raw_dir(&self) -> PathBuf {
        self.base_path.join(RAW_DIR)
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.base_path.join(CACHE_DIR)
    }

    pub fn topic_dir(&self, topic: &Topic) -> PathBuf {
        self.raw_dir().join(topic.dir_name())
    }

    pub fn enhanced_discovery_path(&self) -> PathBuf {
        self.base_path.join(ENHANCED_DISCOVERY_FILE)
    }

    pub fn basic_discovery_path(&self) -> PathBuf {
        self.base_path.join(BASIC_DISCOVERY_FILE)
    }

    /// 元数据文件名：内容哈希前16位 + URL哈希前16位
    ///
    /// 不同URL即使内容相同也不会相互覆盖
    pub fn metadata_file_name(metadata: &FetchMetadata) -> String {
        let url_hash = hex::encode(Sha256::digest(metadata.url.as_bytes()));
        let content_prefix = metadata
            .content_hash
            .get(..KEY_PREFIX_LEN)
            .unwrap_or(&metadata.content_hash);
        format!(
            "{}_{}.json",
            content_prefix,
            &url_hash[..KEY_PREFIX_LEN]
        )
    }

    pub fn metadata_path(&self, topic: &Topic, metadata: &FetchMetadata) -> PathBuf {
        self.topic_dir(topic)
            .join(Self::metadata_file_name(metadata))
    }

    /// 写入单条原始结果元数据
    ///
    /// # 参数
    ///
    /// * `topic` - 所属主题
    /// * `metadata` - 元数据记录
    ///
    /// # 返回值
    ///
    /// 写入的文件路径
    pub async fn save_metadata(
        &self,
        topic: &Topic,
        metadata: &FetchMetadata,
    ) -> Result<PathBuf, StorageError> {
        let path = self.metadata_path(topic, metadata);
        let body = serde_json::to_vec_pretty(metadata)?;
        write_file(&path, &body).await?;
        debug!("Saved result: {}", path.display());
        Ok(path)
    }

    /// 写入增强发现结果文件
    pub async fn save_discovery(
        &self,
        results: &BTreeMap<String, DiscoveryResult>,
    ) -> Result<PathBuf, StorageError> {
        let path = self.enhanced_discovery_path();
        let body = serde_json::to_vec_pretty(results)?;
        write_file(&path, &body).await?;
        Ok(path)
    }

    /// 加载发现结果文件
    ///
    /// 优先读取增强文件，不存在时回退到基础文件；两者都不存在时返回 `None`
    pub async fn load_discovery(&self) -> Result<Option<LoadedDiscovery>, StorageError> {
        for path in [self.enhanced_discovery_path(), self.basic_discovery_path()] {
            match fs::read(&path).await {
                Ok(data) => {
                    let topics = serde_json::from_slice(&data)?;
                    return Ok(Some(LoadedDiscovery { path, topics }));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(StorageError::Io(e)),
            }
        }
        Ok(None)
    }
}

async fn write_file(path: &Path, data: &[u8]) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }

    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn metadata(url: &str, content_hash: &str) -> FetchMetadata {
        FetchMetadata {
            url: url.to_string(),
            final_url: url.to_string(),
            content_hash: content_hash.to_string(),
            topic_name: "Heat Pumps".to_string(),
            timestamp: Utc::now(),
            content_length: 12,
            from_cache: false,
        }
    }

    #[test]
    fn test_same_content_different_urls_do_not_collide() {
        let hash = "ab".repeat(32);
        let a = CrawlStorage::metadata_file_name(&metadata("https://a.test/x", &hash));
        let b = CrawlStorage::metadata_file_name(&metadata("https://b.test/x", &hash));

        assert_ne!(a, b);
        assert!(a.starts_with(&hash[..16]));
        assert_eq!(a.len(), 16 + 1 + 16 + ".json".len());
    }

    #[tokio::test]
    async fn test_save_metadata_writes_under_topic_dir() {
        let temp = TempDir::new().unwrap();
        let storage = CrawlStorage::new(temp.path());
        let topic = Topic::new(7, "Heat Pumps");
        let record = metadata("https://a.test/x", &"cd".repeat(32));

        let path = storage.save_metadata(&topic, &record).await.unwrap();

        assert!(path.starts_with(temp.path().join("raw").join("topic_007")));
        let stored: FetchMetadata =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored, record);
    }

    #[tokio::test]
    async fn test_load_discovery_prefers_enhanced_file() {
        let temp = TempDir::new().unwrap();
        let storage = CrawlStorage::new(temp.path());

        std::fs::write(
            storage.basic_discovery_path(),
            r#"{"1": {"topic_name": "Basic", "count": 1, "urls": [{"url": "https://basic.test/", "topic_id": 1, "priority": 50}]}}"#,
        )
        .unwrap();

        let loaded = storage.load_discovery().await.unwrap().unwrap();
        assert_eq!(loaded.path, storage.basic_discovery_path());
        let urls = loaded.topic_urls(1).unwrap().unwrap();
        assert_eq!(urls[0].url, "https://basic.test/");

        let mut results = BTreeMap::new();
        results.insert(
            "1".to_string(),
            DiscoveryResult::new(1, "Enhanced".into(), "hvac".into(), Vec::new()),
        );
        storage.save_discovery(&results).await.unwrap();

        let loaded = storage.load_discovery().await.unwrap().unwrap();
        assert_eq!(loaded.path, storage.enhanced_discovery_path());
        assert!(loaded.topic_urls(1).unwrap().unwrap().is_empty());
        assert!(loaded.topic_urls(2).is_none());
    }

    #[tokio::test]
    async fn test_topic_entries_parse_independently() {
        let temp = TempDir::new().unwrap();
        let storage = CrawlStorage::new(temp.path());

        std::fs::write(
            storage.enhanced_discovery_path(),
            r#"{
                "1": {"tech_name": "Plain", "urls": ["https://x.test/a", "https://x.test/b"]},
                "2": {"tech_name": "Broken", "urls": [{"url": "https://x.test/c", "query": null}]},
                "3": {"tech_name": "Full", "urls": [{"url": "https://x.test/d", "priority": 100}]}
            }"#,
        )
        .unwrap();

        let loaded = storage.load_discovery().await.unwrap().unwrap();

        let plain = loaded.topic_urls(1).unwrap().unwrap();
        assert_eq!(plain.len(), 2);
        assert_eq!(plain[1].url, "https://x.test/b");
        assert_eq!(plain[0].priority_rank, PRIORITY_DEFAULT);

        assert!(matches!(
            loaded.topic_urls(2),
            Some(Err(StorageError::Serialization(_)))
        ));

        let full = loaded.topic_urls(3).unwrap().unwrap();
        assert!(full[0].is_priority());
    }

    #[tokio::test]
    async fn test_load_discovery_missing_files() {
        let temp = TempDir::new().unwrap();
        let storage = CrawlStorage::new(temp.path().join("nothing-here"));

        assert!(storage.load_discovery().await.unwrap().is_none());
    }
}
