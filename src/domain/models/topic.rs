// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};

/// 爬取主题
///
/// 由外部配置一次性创建，在一次运行中保持不变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// 主题ID（唯一且稳定）
    pub id: i64,
    /// 主题名称
    pub name: String,
    /// 关键词列表（有序）
    pub keywords: Vec<String>,
    /// 厂商域名列表（有序）
    pub vendors: Vec<String>,
    /// 分类
    pub category: String,
}

impl Topic {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            keywords: Vec::new(),
            vendors: Vec::new(),
            category: String::new(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_vendors<I, S>(mut self, vendors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vendors = vendors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// 主题原始数据目录名，例如 `topic_007`
    pub fn dir_name(&self) -> String {
        format!("topic_{:03}", self.id)
    }
}
