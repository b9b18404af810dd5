// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use topicrawl::utils::content::{decode_body, extract_links, relevance_score};

#[test]
fn test_decode_body_handles_non_utf8() {
    let text = "Le café est très chaud, même à Paris en été.";
    let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(text);
    assert!(std::str::from_utf8(&bytes).is_err());

    assert_eq!(decode_body(&bytes), text);
    assert_eq!(decode_body("plain".as_bytes()), "plain");
}

#[test]
fn test_relevance_score_caps_each_keyword_and_total() {
    let html = format!(
        "<html><body>{} design sizing calculation specification installation performance case study manual</body></html>",
        "heat pump ".repeat(20)
    );
    let keywords = vec!["heat pump".to_string(), "".to_string()];

    let score = relevance_score(&html, &keywords);

    // 0.3 keyword cap + 8 indicators * 0.05
    assert!((score - 0.7).abs() < 1e-9);

    let many: Vec<String> = ["heat", "pump", "design", "manual"].iter().map(|s| s.to_string()).collect();
    assert!(relevance_score(&html, &many) <= 1.0);
}

#[test]
fn test_relevance_score_of_unrelated_page_is_zero() {
    assert_eq!(
        relevance_score("<p>weather today</p>", &["turbine".to_string()]),
        0.0
    );
}

#[test]
fn test_extract_links_deduplicates() {
    let html = r#"<a href="/a">1</a><a href="/a#x">2</a><a href="javascript:void(0)">3</a>"#;

    let links = extract_links(html, "https://example.com/");

    assert_eq!(links.len(), 1);
    assert!(links.contains("https://example.com/a"));
}
