//! # 捕获处理器
//!
//! 处理器接收捕获记录并决定如何落地（写日志、转发到日志聚合等）。

use async_trait::async_trait;
use std::sync::Arc;

use crate::capture::{CaptureOptions, RequestCapture, ResponseCapture};
use crate::config::CaptureConfig;
use crate::error::{Context, Result};

/// 日志输出函数
pub type LogFn = Arc<dyn Fn(&str) + Send + Sync>;

/// 日志输出函数工厂，每条记录调用一次
pub type LogFnFactory = Arc<dyn Fn() -> LogFn + Send + Sync>;

/// 默认日志处理器使用的 tracing target
pub const CAPTURE_LOG_TARGET: &str = "http_capture::capture";

/// 捕获处理器 trait
///
/// 记录只在调用期间有效，处理器需要保留时自行复制。
#[async_trait]
pub trait CaptureHandler: Send + Sync {
    /// 处理器名称，用于日志和错误
    fn name(&self) -> &str;

    /// 处理请求捕获
    async fn capture_request(&self, request: &RequestCapture) -> Result<()>;

    /// 处理响应捕获
    async fn capture_response(&self, response: &ResponseCapture) -> Result<()>;
}

/// 序列化为 JSON 后交给日志函数的处理器
#[derive(Clone)]
pub struct LoggingHandler {
    options: CaptureOptions,
    log_fn_factory: LogFnFactory,
}

impl std::fmt::Debug for LoggingHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingHandler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl LoggingHandler {
    /// 使用固定的日志函数
    pub fn with_log_fn<F>(log_fn: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let log_fn: LogFn = Arc::new(log_fn);
        Self::with_log_fn_factory(move || log_fn.clone())
    }

    /// 使用日志函数工厂，每条记录时重新获取日志函数
    pub fn with_log_fn_factory<F>(factory: F) -> Self
    where
        F: Fn() -> LogFn + Send + Sync + 'static,
    {
        Self {
            options: CaptureOptions::default(),
            log_fn_factory: Arc::new(factory),
        }
    }

    /// 写入 tracing 的 info 级别
    #[must_use]
    pub fn tracing() -> Self {
        Self::with_log_fn(|record| {
            tracing::info!(target: CAPTURE_LOG_TARGET, "{record}");
        })
    }

    /// 覆盖序列化参数
    #[must_use]
    pub fn with_options(mut self, options: CaptureOptions) -> Self {
        self.options = options;
        self
    }

    /// 当前序列化参数
    #[must_use]
    pub const fn options(&self) -> &CaptureOptions {
        &self.options
    }

    fn emit(&self, record: &str) {
        (self.log_fn_factory)()(record);
    }
}

#[async_trait]
impl CaptureHandler for LoggingHandler {
    fn name(&self) -> &str {
        "logging"
    }

    async fn capture_request(&self, request: &RequestCapture) -> Result<()> {
        let record = request
            .as_json(&self.options)
            .context("序列化请求捕获失败")?;
        self.emit(&record);
        Ok(())
    }

    async fn capture_response(&self, response: &ResponseCapture) -> Result<()> {
        let record = response
            .as_json(&self.options)
            .context("序列化响应捕获失败")?;
        self.emit(&record);
        Ok(())
    }
}

/// 默认处理器列表：写入 tracing 的日志处理器
#[must_use]
pub fn default_handlers() -> Vec<Arc<dyn CaptureHandler>> {
    vec![Arc::new(LoggingHandler::tracing())]
}

/// 按配置中的脱敏参数构造默认处理器列表
#[must_use]
pub fn handlers_from_config(config: &CaptureConfig) -> Vec<Arc<dyn CaptureHandler>> {
    vec![Arc::new(
        LoggingHandler::tracing().with_options(config.capture_options()),
    )]
}
