//! # HTTP Capture Library
//!
//! 为 axum 服务捕获每个请求和响应的结构化记录，脱敏后分发给可插拔的处理器。
//!
//! ```no_run
//! use std::sync::Arc;
//! use axum::{Router, routing::get};
//! use http_capture::{CaptureConfig, CapturePipeline, register};
//!
//! # fn build() -> http_capture::Result<Router> {
//! let pipeline = CapturePipeline::with_default_handlers(CaptureConfig::default())?;
//! let app = register(Router::new().route("/", get(|| async { "ok" })), Arc::new(pipeline));
//! # Ok(app)
//! # }
//! ```

pub mod capture;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod middleware;

// Re-export commonly used types
pub use capture::{
    CaptureOptions, ClientAddress, EndpointDescriptor, RequestCapture, ResponseCapture,
    SkipBodyCapture,
};
pub use config::CaptureConfig;
pub use error::{CaptureError, Result};
pub use handlers::{CaptureHandler, LoggingHandler, default_handlers};
pub use middleware::{CapturePipeline, register};
