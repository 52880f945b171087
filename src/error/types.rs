//! # 错误类型定义

use thiserror::Error;

use super::ErrorCategory;

/// 捕获管道主要错误类型
#[derive(Debug, Error)]
pub enum CaptureError {
    /// 读取请求/响应体或表单失败
    #[error("捕获读取错误: {message}")]
    CaptureRead {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 序列化错误
    #[error("序列化错误: {message}")]
    Serialization {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: anyhow::Error,
    },

    /// 处理器（sink）执行失败
    #[error("处理器错误 [{handler}]: {message}")]
    Sink {
        /// 处理器名称
        handler: String,
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 配置相关错误
    #[error("配置错误: {message}")]
    Config {
        /// 错误描述
        message: String,
        /// 底层错误
        #[source]
        source: Option<anyhow::Error>,
    },

    /// 带上下文的错误
    #[error("{context}: {source}")]
    Context {
        /// 上下文说明
        context: String,
        /// 底层错误
        #[source]
        source: Box<CaptureError>,
    },
}

impl CaptureError {
    /// 错误分类，用于日志字段
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::CaptureRead { .. } | Self::Serialization { .. } => ErrorCategory::Capture,
            Self::Sink { .. } => ErrorCategory::Sink,
            Self::Config { .. } => ErrorCategory::Config,
            Self::Context { source, .. } => source.category(),
        }
    }

    /// 创建捕获读取错误
    pub fn capture_read<T: Into<String>>(message: T) -> Self {
        Self::CaptureRead {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的捕获读取错误
    pub fn capture_read_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::CaptureRead {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建序列化错误
    pub fn serialization<T: Into<String>, E: Into<anyhow::Error>>(message: T, source: E) -> Self {
        Self::Serialization {
            message: message.into(),
            source: source.into(),
        }
    }

    /// 创建处理器错误
    pub fn sink<H: Into<String>, T: Into<String>>(handler: H, message: T) -> Self {
        Self::Sink {
            handler: handler.into(),
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的处理器错误
    pub fn sink_with_source<H: Into<String>, T: Into<String>, E: Into<anyhow::Error>>(
        handler: H,
        message: T,
        source: E,
    ) -> Self {
        Self::Sink {
            handler: handler.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// 创建配置错误
    pub fn config<T: Into<String>>(message: T) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// 创建带来源的配置错误
    pub fn config_with_source<T: Into<String>, E: Into<anyhow::Error>>(
        message: T,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<serde_json::Error> for CaptureError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("JSON序列化失败", err)
    }
}

impl From<toml::de::Error> for CaptureError {
    fn from(err: toml::de::Error) -> Self {
        Self::config_with_source("TOML解析失败", err)
    }
}

impl From<std::io::Error> for CaptureError {
    fn from(err: std::io::Error) -> Self {
        Self::config_with_source("文件操作失败", err)
    }
}
