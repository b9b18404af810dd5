// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_crawler, json_files};
use serde_json::json;
use std::collections::HashSet;
use std::time::Duration;
use tempfile::TempDir;
use topicrawl::domain::models::fetch_result::FetchMetadata;
use topicrawl::domain::models::topic::Topic;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SHARED_BODY: &str = "<html><body>heat pump design manual</body></html>";

async fn mount_pages(server: &MockServer) {
    for page in ["/same-a", "/same-b"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(ResponseTemplate::new(200).set_body_string(SHARED_BODY))
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path("/unique"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html>heat pump sizing calculation</html>"),
        )
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(server)
        .await;
}

fn cached_payloads(dir: &std::path::Path) -> usize {
    let mut count = 0;
    let mut stack = vec![dir.to_path_buf()];
    while let Some(current) = stack.pop() {
        for entry in std::fs::read_dir(&current).unwrap().flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.file_name().map_or(false, |n| n != "index.json") {
                count += 1;
            }
        }
    }
    count
}

#[tokio::test]
async fn test_crawl_all_topics_end_to_end() {
    let server = MockServer::start().await;
    mount_pages(&server).await;
    let temp = TempDir::new().unwrap();

    let urls: Vec<_> = ["/same-a", "/same-b", "/unique", "/missing", "/broken", "/slow"]
        .iter()
        .map(|p| json!({"url": format!("{}{}", server.uri(), p), "priority": 50}))
        .collect();
    std::fs::write(
        temp.path().join("discovered_urls.json"),
        serde_json::to_vec(&json!({"1": {"topic_name": "Heat Pumps", "count": urls.len(), "urls": urls}}))
            .unwrap(),
    )
    .unwrap();

    let topics = vec![
        Topic::new(1, "Heat Pumps").with_keywords(["heat pump"]),
        Topic::new(2, "Never Discovered"),
    ];

    let crawler = create_test_crawler(temp.path()).await;
    let summary = crawler.crawl_all_topics(&topics, 50).await.unwrap();

    assert_eq!(summary.skipped, vec![2]);
    assert!(summary.failed.is_empty());
    assert_eq!(summary.total_attempted, 6);
    assert_eq!(summary.total_succeeded, 3);
    assert!(summary.topics[0].average_relevance > 0.0);

    // Distinct URLs never share a metadata file, even with identical content
    let topic_dir = temp.path().join("raw").join("topic_001");
    let files = json_files(&topic_dir);
    assert_eq!(files.len(), 3);
    assert_eq!(files.iter().collect::<HashSet<_>>().len(), 3);

    let records: Vec<FetchMetadata> = files
        .iter()
        .map(|name| serde_json::from_slice(&std::fs::read(topic_dir.join(name)).unwrap()).unwrap())
        .collect();
    let recorded_urls: HashSet<&str> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(recorded_urls.len(), 3);
    assert!(records.iter().all(|r| !r.from_cache));

    let shared: Vec<&FetchMetadata> = records
        .iter()
        .filter(|r| r.content_length == SHARED_BODY.len())
        .collect();
    assert_eq!(shared.len(), 2);
    assert_eq!(shared[0].content_hash, shared[1].content_hash);

    // Non-2xx responses are final; successes are fetched exactly once
    let requests = server.received_requests().await.unwrap();
    let hits_for = |p: &str| requests.iter().filter(|r| r.url.path() == p).count();
    assert_eq!(hits_for("/broken"), 1);
    assert_eq!(hits_for("/missing"), 1);
    assert_eq!(hits_for("/same-a"), 1);
    assert_eq!(hits_for("/slow"), 2);

    // Identical content is stored once
    assert_eq!(cached_payloads(&temp.path().join("cache")), 2);
    assert!(temp.path().join("cache").join("index.json").exists());
}

#[tokio::test]
async fn test_warm_cache_serves_second_run() {
    let server = MockServer::start().await;
    mount_pages(&server).await;
    let temp = TempDir::new().unwrap();

    let urls: Vec<_> = ["/same-a", "/same-b", "/unique"]
        .iter()
        .map(|p| json!({"url": format!("{}{}", server.uri(), p)}))
        .collect();
    std::fs::write(
        temp.path().join("discovered_urls_enhanced.json"),
        serde_json::to_vec(&json!({"4": {"tech_id": 4, "tech_name": "Heat Pumps", "count": 3, "urls": urls}}))
            .unwrap(),
    )
    .unwrap();
    let topics = vec![Topic::new(4, "Heat Pumps")];

    let first = create_test_crawler(temp.path()).await;
    let summary = first.crawl_all_topics(&topics, 50).await.unwrap();
    assert_eq!(summary.total_succeeded, 3);

    // A fresh crawler loads the persisted index and never touches the network
    let second = create_test_crawler(temp.path()).await;
    let summary = second.crawl_all_topics(&topics, 50).await.unwrap();

    assert_eq!(summary.total_succeeded, 3);
    assert_eq!(summary.topics[0].from_cache, 3);
    let stats = second.fetcher().cache().stats();
    assert_eq!(stats.hits, 3);
    assert_eq!(stats.misses, 0);
    assert_eq!(json_files(&temp.path().join("raw").join("topic_004")).len(), 3);

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn test_max_urls_caps_each_topic() {
    let server = MockServer::start().await;
    mount_pages(&server).await;
    let temp = TempDir::new().unwrap();

    let urls: Vec<_> = ["/same-a", "/unique", "/same-b"]
        .iter()
        .map(|p| json!({"url": format!("{}{}", server.uri(), p)}))
        .collect();
    std::fs::write(
        temp.path().join("discovered_urls_enhanced.json"),
        serde_json::to_vec(&json!({"1": {"urls": urls}})).unwrap(),
    )
    .unwrap();

    let crawler = create_test_crawler(temp.path()).await;
    let summary = crawler
        .crawl_all_topics(&[Topic::new(1, "Heat Pumps")], 2)
        .await
        .unwrap();

    assert_eq!(summary.total_attempted, 2);
    assert_eq!(summary.total_succeeded, 2);

    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.url.path() != "/same-b"));
}
