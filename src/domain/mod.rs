// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务概念，包括：
/// - 领域模型（models）：主题、抓取结果、发现结果
/// - 搜索（search）：发现阶段的搜索后端接口
///
/// 领域层不依赖于任何外部实现。
pub mod models;
pub mod search;
