// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// 默认日志过滤指令
///
/// `RUST_LOG` 未设置时使用配置中的日志级别
pub fn default_directive(level: &str) -> String {
    let level = level.trim().to_lowercase();
    let level = if level.is_empty() { "info".to_string() } else { level };
    format!("{},topicrawl={}", level, level)
}

pub fn init_telemetry(level: &str) {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive(level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_lowercases_level() {
        assert_eq!(default_directive("INFO"), "info,topicrawl=info");
        assert_eq!(default_directive(""), "info,topicrawl=info");
    }

    #[test]
    fn test_init_telemetry_twice_is_harmless() {
        init_telemetry("debug");
        init_telemetry("debug");
    }
}
