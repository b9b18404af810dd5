// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// 包含发现与批量爬取两个业务流程
pub mod crawl_use_case;
pub mod discovery_use_case;
