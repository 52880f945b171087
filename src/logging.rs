//! # 日志配置模块
//!
//! 初始化 tracing 订阅器。捕获记录以 `http_capture::capture` 为 target 输出，
//! 可以通过 `RUST_LOG` 单独调整。

use std::env;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::handlers::CAPTURE_LOG_TARGET;

/// 默认过滤规则：全局级别 + 本库调试日志
#[must_use]
pub fn default_filter(log_level: Option<&str>) -> String {
    let level = log_level.unwrap_or("info");
    format!("{level},http_capture=debug")
}

/// 初始化日志系统，`RUST_LOG` 优先于参数
///
/// 订阅器已经存在时（例如测试中重复调用）静默返回。
pub fn init_logging(log_level: Option<&str>) {
    let log_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_filter(log_level));

    let result = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| log_filter.into()))
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(false)
                .with_thread_names(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .try_init();

    if result.is_ok() {
        tracing::debug!(capture_target = CAPTURE_LOG_TARGET, "Logging initialized");
    }
}

/// 环境变量设置指南
pub fn print_logging_help() {
    println!("日志配置指南:");
    println!("  RUST_LOG=info                          # 标准日志级别");
    println!("  RUST_LOG=info,http_capture=debug       # 查看捕获分发过程");
    println!("  RUST_LOG=warn,http_capture::capture=info  # 只输出捕获记录");
    println!("  RUST_LOG=info,http_capture::capture=off   # 关闭捕获记录");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_enables_crate_debug() {
        assert_eq!(default_filter(None), "info,http_capture=debug");
        assert_eq!(default_filter(Some("warn")), "warn,http_capture=debug");
    }

    #[test]
    fn repeated_initialization_is_harmless() {
        init_logging(Some("debug"));
        init_logging(Some("debug"));
    }
}
