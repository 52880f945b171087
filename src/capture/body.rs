//! # 消息体读取
//!
//! 读取请求/响应体用于捕获，并用同样的帧序列重建一个新的消息体交还给传输层，
//! 保证下游收到的字节与原始字节完全一致。
//!
//! 注意：流式响应会被完整读入内存。无界流（如长连接 SSE）不要开启消息体捕获，
//! 否则捕获会一直等待流结束。

use axum::body::{Body, HttpBody};
use axum::extract::Request;
use axum::response::Response;
use bytes::{Bytes, BytesMut};
use futures::stream;
use http_body_util::{BodyExt, StreamBody};
use tracing::{debug, warn};

use crate::error::{CaptureError, Result};

/// 响应扩展标记：该响应的消息体不参与捕获（例如文件下载）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkipBodyCapture;

/// 读取后的消息体
#[derive(Debug)]
pub struct DrainedBody {
    /// 交还给传输层的替换消息体
    pub body: Body,
    /// 读到的全部数据；读取中途失败时为错误
    pub bytes: Result<Bytes>,
}

/// 读取整个消息体并生成等价的替换消息体
///
/// 已缓冲的消息体（大小已知且只有数据帧）替换为 `Body::from(bytes)`；
/// 其余情况按原始帧逐个回放，包括 trailers。读取中途出错时，替换消息体会先回放
/// 已读到的帧，再返回同一个错误，传输层看到的失败与原来一致。
pub async fn drain_body(mut body: Body) -> DrainedBody {
    let buffered = body.size_hint().exact().is_some();
    let mut frames = Vec::new();
    let mut collected = BytesMut::new();
    let mut data_only = true;
    let mut failure = None;

    while let Some(next) = body.frame().await {
        match next {
            Ok(frame) => {
                match frame.data_ref() {
                    Some(data) => collected.extend_from_slice(data),
                    None => data_only = false,
                }
                frames.push(Ok(frame));
            }
            Err(err) => {
                failure = Some(CaptureError::capture_read(format!(
                    "body stream failed after {} bytes: {err}",
                    collected.len()
                )));
                frames.push(Err(err));
                break;
            }
        }
    }

    let bytes = collected.freeze();
    debug!(
        buffered,
        frames = frames.len(),
        size = bytes.len(),
        "Drained message body for capture"
    );

    if let Some(err) = failure {
        return DrainedBody {
            body: Body::new(StreamBody::new(stream::iter(frames))),
            bytes: Err(err),
        };
    }

    let body = if buffered && data_only {
        Body::from(bytes.clone())
    } else {
        Body::new(StreamBody::new(stream::iter(frames)))
    };
    DrainedBody {
        body,
        bytes: Ok(bytes),
    }
}

/// 提取响应体
///
/// 返回重建后的响应与捕获到的数据。带有 [`SkipBodyCapture`] 标记的响应原样返回，
/// 读取失败时数据为空：消息体捕获是尽力而为的。
pub async fn extract_response_body(response: Response) -> (Response, Option<Bytes>) {
    if response.extensions().get::<SkipBodyCapture>().is_some() {
        debug!("Response body capture skipped by marker");
        return (response, None);
    }

    let (parts, body) = response.into_parts();
    let drained = drain_body(body).await;
    let bytes = match drained.bytes {
        Ok(bytes) => Some(bytes),
        Err(err) => {
            warn!(error = %err, category = err.category().as_str(), "Failed to read response body");
            None
        }
    };
    (Response::from_parts(parts, drained.body), bytes)
}

/// 读取请求体，返回重建后的请求
pub async fn read_request_body(request: Request) -> (Request, Result<Bytes>) {
    let (parts, body) = request.into_parts();
    let drained = drain_body(body).await;
    (Request::from_parts(parts, drained.body), drained.bytes)
}

/// 按 UTF-8 解码捕获到的字节（非法序列有损替换）
#[must_use]
pub fn body_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
