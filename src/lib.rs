// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 包含发现与批量爬取用例
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含主题、抓取结果、发现结果等核心实体与搜索后端接口
pub mod domain;

/// 引擎模块
///
/// HTTP抓取引擎、每主机限速与有界并发抓取器
pub mod engines;

/// 基础设施模块
///
/// 提供内容缓存、搜索源适配与本地存储
pub mod infrastructure;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
