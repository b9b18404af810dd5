// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{create_test_crawler, json_files};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use topicrawl::application::use_cases::discovery_use_case::DiscoveryUseCase;
use topicrawl::domain::models::topic::Topic;
use topicrawl::domain::search::engine::SourceAdapter;
use topicrawl::infrastructure::search::aggregator::{DiscoveryAggregator, DiscoveryConfig};
use topicrawl::infrastructure::search::bing::BingSource;
use topicrawl::infrastructure::search::duckduckgo::DuckDuckGoSource;
use topicrawl::infrastructure::search::source::SourceContext;
use topicrawl::infrastructure::search::url_filter::UrlFilter;
use topicrawl::infrastructure::storage::CrawlStorage;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn results_page(base: &str) -> String {
    format!(
        r#"<html><body>
        <div class="result"><a class="result__a" href="{base}/docs/spec">Spec</a>
          <a class="result__snippet">Rated capacity tables.</a></div>
        <div class="result"><a class="result__a" href="{base}/docs/guide">Guide</a></div>
        <div class="result"><a class="result__a" href="https://shop.test/cart">Cart</a></div>
        </body></html>"#
    )
}

#[tokio::test]
async fn test_discover_then_crawl() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/html/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(results_page(&server.uri())))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/bing"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    for page in ["/docs/spec", "/docs/guide"] {
        Mock::given(method("GET"))
            .and(path(page))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(format!("<html>{} design guide</html>", page)),
            )
            .mount(&server)
            .await;
    }

    let temp = TempDir::new().unwrap();
    let filter = Arc::new(UrlFilter::new(["/docs/spec"], ["shop.test"]));
    let context = SourceContext::new("topicrawl-test", filter.clone(), Duration::ZERO);
    let sources: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(DuckDuckGoSource::new(context.clone()).with_endpoint(format!("{}/html/", server.uri()))),
        Arc::new(BingSource::new(context).with_endpoint(format!("{}/bing", server.uri()))),
    ];
    let aggregator = DiscoveryAggregator::new(
        sources,
        filter,
        DiscoveryConfig {
            max_queries_per_topic: 3,
            ..DiscoveryConfig::default()
        },
    );
    let use_case = DiscoveryUseCase::new(Arc::new(aggregator), CrawlStorage::new(temp.path()));

    let topics = vec![Topic::new(5, "Heat Pumps").with_category("hvac"), Topic::new(6, "")];
    let outcome = use_case.discover_all_topics(&topics).await.unwrap();

    assert_eq!(outcome.failed, vec![6]);
    let result = &outcome.results["5"];
    assert_eq!(result.count, 2);
    assert_eq!(result.urls[0].url, format!("{}/docs/spec", server.uri()));
    assert!(result.urls[0].is_priority());
    assert_eq!(result.urls[0].snippet.as_deref(), Some("Rated capacity tables."));
    assert!(temp.path().join("discovered_urls_enhanced.json").exists());

    let crawler = create_test_crawler(temp.path()).await;
    let summary = crawler.crawl_all_topics(&topics, 50).await.unwrap();

    assert_eq!(summary.total_succeeded, 2);
    assert_eq!(summary.skipped, vec![6]);
    assert_eq!(json_files(&temp.path().join("raw").join("topic_005")).len(), 2);
}
