// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 主题（topic）：一次运行中要覆盖的技术主题
/// - 发现结果（discovery）：搜索阶段产出的候选URL集合
/// - 抓取结果（fetch_result）：成功抓取的页面及其元数据
pub mod discovery;
pub mod fetch_result;
pub mod topic;
