// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::time::Duration;

/// 重试策略配置
///
/// 第 k 次尝试（从0开始，k≥1）之前等待 `backoff_unit * backoff_factor^(k-1)`
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 最大尝试次数
    pub max_retries: u32,
    /// 退避基本单位
    pub backoff_unit: Duration,
    /// 退避乘数
    pub backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff_unit: Duration::from_secs(1),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff_factor: f64) -> Self {
        Self {
            max_retries,
            backoff_factor,
            ..Self::default()
        }
    }

    pub fn with_backoff_unit(mut self, unit: Duration) -> Self {
        self.backoff_unit = unit;
        self
    }

    /// 计算第 `failed_attempt` 次尝试（从0开始）失败后的退避时间
    pub fn calculate_backoff(&self, failed_attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(failed_attempt as i32);
        self.backoff_unit.mul_f64(factor.max(0.0))
    }

    /// 失败后是否还有下一次尝试
    pub fn should_retry(&self, failed_attempt: u32) -> bool {
        failed_attempt + 1 < self.max_retries
    }
}
