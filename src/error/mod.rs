//! The unified error handling system for the capture pipeline.

pub use types::CaptureError;

/// A unified `Result` type for the entire crate.
pub type Result<T> = std::result::Result<T, CaptureError>;

pub mod types;

/// 为任意可转换为 [`CaptureError`] 的错误附加上下文说明
///
/// 上下文错误的分类沿用内层错误。
pub trait Context<T, E> {
    /// 附加固定的上下文
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display;

    /// 仅在出错时计算上下文
    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E> Context<T, E> for std::result::Result<T, E>
where
    E: Into<CaptureError>,
{
    #[track_caller]
    fn context<C>(self, context: C) -> Result<T>
    where
        C: std::fmt::Display,
    {
        self.with_context(|| context)
    }

    #[track_caller]
    fn with_context<C, F>(self, context: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => Err(CaptureError::Context {
                context: context().to_string(),
                source: Box::new(error.into()),
            }),
        }
    }
}

/// Error category for log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Reading or serializing a capture failed. Never surfaces to the client.
    Capture,
    /// A capture handler failed. Isolated from other handlers.
    Sink,
    /// Invalid configuration, surfaced at startup.
    Config,
}

impl ErrorCategory {
    /// Stable name used as a structured log value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Capture => "capture",
            Self::Sink => "sink",
            Self::Config => "config",
        }
    }
}
