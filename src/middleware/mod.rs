//! # 捕获中间件
//!
//! 请求钩子只挂在已声明的路由上（`route_layer`），在业务处理前执行；
//! 响应钩子挂在整个路由器上（`layer`），对所有请求（包括 404）在响应返回前执行。

pub mod pipeline;

pub use pipeline::CapturePipeline;

use axum::Router;
use axum::extract::{Request, State};
use axum::middleware::{self, Next};
use axum::response::Response;
use std::sync::Arc;

use crate::capture::EndpointDescriptor;

/// 请求钩子：处理前构造并分发请求捕获
pub async fn request_hook(
    State(pipeline): State<Arc<CapturePipeline>>,
    request: Request,
    next: Next,
) -> Response {
    let request = pipeline.handle_request(request).await;
    next.run(request).await
}

/// 响应钩子：响应产生后构造并分发响应捕获
pub async fn response_hook(
    State(pipeline): State<Arc<CapturePipeline>>,
    request: Request,
    next: Next,
) -> Response {
    let endpoint = EndpointDescriptor::from_request(&request);
    let response = next.run(request).await;
    pipeline.handle_response(Some(endpoint), response).await
}

/// 把捕获管道注册到路由器
///
/// 需要在全部路由声明之后调用：之后再添加的路由不会触发请求钩子。
/// 路由器中至少要有一个路由（`route_layer` 的要求）。
pub fn register<S>(router: Router<S>, pipeline: Arc<CapturePipeline>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .route_layer(middleware::from_fn_with_state(pipeline.clone(), request_hook))
        .layer(middleware::from_fn_with_state(pipeline, response_hook))
}
