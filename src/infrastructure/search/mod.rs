// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 发现服务模块
///
/// 提供DuckDuckGo、Bing、Google Scholar等搜索源的适配实现
/// 以及按主题聚合候选URL的发现聚合器
pub mod aggregator;
pub mod bing;
pub mod duckduckgo;
pub mod queries;
pub mod scholar;
pub mod source;
pub mod url_filter;

pub use aggregator::{DiscoveryAggregator, DiscoveryConfig, DiscoveryOutcome};
pub use url_filter::UrlFilter;
