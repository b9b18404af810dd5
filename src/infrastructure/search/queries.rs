// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::topic::Topic;

/// Name-based query templates, issued first and in this order
const NAME_TEMPLATES: &[&str] = &[
    "technical specification",
    "design guide",
    "installation manual",
    "datasheet",
    "case study",
    "performance evaluation",
    "research paper",
    "troubleshooting",
];

const KEYWORD_TEMPLATES: &[&str] = &["technical paper", "implementation guide"];

const MAX_KEYWORDS: usize = 3;
const MAX_VENDORS: usize = 2;

/// Build the ordered query list for a topic, truncated to `max_queries`.
///
/// Name templates come first, then two queries for each of the first three
/// keywords, then a site-restricted query for each of the first two vendors.
pub fn build_search_queries(topic: &Topic, max_queries: usize) -> Vec<String> {
    let name = topic.name.trim();

    let by_name = NAME_TEMPLATES
        .iter()
        .map(|template| format!("{} {}", name, template));

    let by_keyword = topic.keywords.iter().take(MAX_KEYWORDS).flat_map(|keyword| {
        KEYWORD_TEMPLATES
            .iter()
            .map(move |template| format!("{} {}", keyword, template))
    });

    let by_vendor = topic
        .vendors
        .iter()
        .take(MAX_VENDORS)
        .map(|vendor| format!("{} site:{}", name, vendor));

    by_name
        .chain(by_keyword)
        .chain(by_vendor)
        .take(max_queries)
        .collect()
}
