// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde_json::json;
use topicrawl::domain::models::discovery::{DiscoveredUrl, DiscoveryResult, PRIORITY_DEFAULT};

#[test]
fn test_basic_discovery_entry_deserializes() {
    // Basic files carry topic_id/topic_name per entry and may omit priority
    let raw = json!({
        "url": "https://example.com/guide",
        "title": "Guide",
        "snippet": null,
        "query": "heat pump design guide",
        "topic_id": 3,
        "topic_name": "Heat Pumps"
    });

    let entry: DiscoveredUrl = serde_json::from_value(raw).unwrap();

    assert_eq!(entry.url, "https://example.com/guide");
    assert_eq!(entry.title.as_deref(), Some("Guide"));
    assert!(entry.snippet.is_none());
    assert_eq!(entry.source_query, "heat pump design guide");
    assert_eq!(entry.priority_rank, PRIORITY_DEFAULT);
    assert!(!entry.is_priority());
}

#[test]
fn test_discovery_result_file_shape() {
    let result = DiscoveryResult::new(12, "Solar PV".to_string(), "energy".to_string(), Vec::new());

    let value = serde_json::to_value(&result).unwrap();

    for key in ["tech_id", "tech_name", "category", "count", "urls", "discovered_at"] {
        assert!(value.get(key).is_some(), "missing {}", key);
    }
    assert_eq!(value["count"], 0);

    let back: DiscoveryResult = serde_json::from_value(value).unwrap();
    assert_eq!(back.tech_id, 12);
    assert_eq!(back.discovered_at, result.discovered_at);
}
