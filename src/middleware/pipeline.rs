//! # 捕获分发管道
//!
//! 每个请求两个阶段：处理前构造请求捕获并分发给全部处理器；响应产生后构造响应捕获，
//! 并发调用全部处理器并等待它们结束。处理器失败相互隔离，也不影响请求本身。

use axum::extract::Request;
use axum::response::Response;
use futures::FutureExt;
use futures::future::join_all;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::capture::{EndpointDescriptor, RequestCapture, ResponseCapture, normalize_url};
use crate::config::CaptureConfig;
use crate::error::{CaptureError, Result};
use crate::handlers::{CaptureHandler, handlers_from_config};

/// 捕获分发管道
///
/// 配置与处理器列表在启动时确定，之后只读，可在多个请求间共享。
pub struct CapturePipeline {
    handlers: Vec<Arc<dyn CaptureHandler>>,
    config: CaptureConfig,
}

impl std::fmt::Debug for CapturePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.handlers.iter().map(|h| h.name()).collect();
        f.debug_struct("CapturePipeline")
            .field("handlers", &names)
            .field("config", &self.config)
            .finish()
    }
}

impl CapturePipeline {
    /// 创建分发管道，处理器列表不能为空
    pub fn new(handlers: Vec<Arc<dyn CaptureHandler>>, config: CaptureConfig) -> Result<Self> {
        if handlers.is_empty() {
            return Err(CaptureError::config("至少需要配置一个捕获处理器"));
        }
        config.validate().map_err(CaptureError::config)?;

        info!(
            handlers = handlers.len(),
            include_body = config.include_body,
            include_form = config.include_form,
            masking = config.masking.enabled,
            "Initializing capture pipeline"
        );
        Ok(Self { handlers, config })
    }

    /// 使用默认日志处理器（按配置脱敏）
    pub fn with_default_handlers(config: CaptureConfig) -> Result<Self> {
        Self::new(handlers_from_config(&config), config)
    }

    /// 当前配置
    #[must_use]
    pub const fn config(&self) -> &CaptureConfig {
        &self.config
    }

    /// 已注册的处理器
    #[must_use]
    pub fn handlers(&self) -> &[Arc<dyn CaptureHandler>] {
        &self.handlers
    }

    /// 处理前阶段：构造请求捕获并分发，返回交给业务处理的请求
    pub async fn handle_request(&self, request: Request) -> Request {
        let url = normalize_url(request.uri());
        let (request, capture) =
            RequestCapture::from_request(request, self.config.read_options()).await;
        debug!(method = %capture.method(), url = %url, "Dispatching request capture");

        self.dispatch_request(&capture).await;
        request
    }

    /// 处理后阶段：构造响应捕获并分发，返回交给传输层的响应
    pub async fn handle_response(
        &self,
        endpoint: Option<EndpointDescriptor>,
        response: Response,
    ) -> Response {
        let (response, capture) =
            ResponseCapture::from_response(response, self.config.include_body, endpoint).await;
        debug!(status = capture.status_code(), "Dispatching response capture");

        self.dispatch_response(&capture).await;
        response
    }

    /// 把请求捕获交给全部处理器，返回失败列表
    pub async fn dispatch_request(&self, capture: &RequestCapture) -> Vec<CaptureError> {
        let tasks = self.handlers.iter().map(|handler| {
            run_isolated(handler.name(), "request", handler.capture_request(capture))
        });
        join_all(tasks).await.into_iter().flatten().collect()
    }

    /// 并发地把响应捕获交给全部处理器，全部结束后返回失败列表
    pub async fn dispatch_response(&self, capture: &ResponseCapture) -> Vec<CaptureError> {
        let tasks = self.handlers.iter().map(|handler| {
            run_isolated(handler.name(), "response", handler.capture_response(capture))
        });
        join_all(tasks).await.into_iter().flatten().collect()
    }
}

// 处理器返回错误或 panic 都只记录日志，不向外传播
async fn run_isolated<F>(handler: &str, phase: &'static str, task: F) -> Option<CaptureError>
where
    F: Future<Output = Result<()>>,
{
    let err = match AssertUnwindSafe(task).catch_unwind().await {
        Ok(Ok(())) => return None,
        Ok(Err(err)) => {
            CaptureError::sink_with_source(handler, format!("{phase} capture failed"), err)
        }
        Err(panic) => CaptureError::sink(
            handler,
            format!("{phase} capture panicked: {}", panic_message(panic.as_ref())),
        ),
    };
    warn!(
        handler,
        phase,
        category = err.category().as_str(),
        error = %err,
        "Capture handler failed"
    );
    Some(err)
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}
