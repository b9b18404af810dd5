// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节，负责与文件系统和外部搜索服务交互。
///
/// 包含的子模块：
/// - 缓存（cache）：按内容哈希寻址的本地内容缓存
/// - 指标（metrics）：抓取与发现的运行指标
/// - 搜索（search）：搜索源适配、URL过滤与发现聚合
/// - 存储（storage）：发现文件与原始结果元数据的持久化
pub mod cache;
pub mod metrics;
pub mod search;
pub mod storage;
