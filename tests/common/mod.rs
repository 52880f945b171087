//! 集成测试共用的处理器与路由工具

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, Bytes},
    extract::Request,
    middleware::{self, Next},
};
use http_body_util::BodyExt;
use serde_json::Value;

use http_capture::{
    CaptureError, CaptureHandler, CaptureOptions, ClientAddress, RequestCapture, ResponseCapture,
    Result, capture::CaptureDict,
};

/// 把每条捕获投影后保存下来的处理器
#[derive(Default)]
pub struct RecordingHandler {
    options: CaptureOptions,
    requests: Mutex<Vec<CaptureDict>>,
    responses: Mutex<Vec<CaptureDict>>,
}

impl RecordingHandler {
    pub fn new(options: CaptureOptions) -> Arc<Self> {
        Arc::new(Self {
            options,
            ..Self::default()
        })
    }

    pub fn requests(&self) -> Vec<CaptureDict> {
        self.requests.lock().unwrap().clone()
    }

    pub fn responses(&self) -> Vec<CaptureDict> {
        self.responses.lock().unwrap().clone()
    }
}

#[async_trait]
impl CaptureHandler for RecordingHandler {
    fn name(&self) -> &str {
        "recording"
    }

    async fn capture_request(&self, request: &RequestCapture) -> Result<()> {
        self.requests.lock().unwrap().push(request.as_dict(&self.options));
        Ok(())
    }

    async fn capture_response(&self, response: &ResponseCapture) -> Result<()> {
        self.responses.lock().unwrap().push(response.as_dict(&self.options));
        Ok(())
    }
}

/// 每次调用都失败的处理器
pub struct FailingHandler;

#[async_trait]
impl CaptureHandler for FailingHandler {
    fn name(&self) -> &str {
        "failing"
    }

    async fn capture_request(&self, _request: &RequestCapture) -> Result<()> {
        Err(CaptureError::sink("failing", "request sink is down"))
    }

    async fn capture_response(&self, _response: &ResponseCapture) -> Result<()> {
        Err(CaptureError::sink("failing", "response sink is down"))
    }
}

/// 在最外层注入固定的客户端地址
pub fn with_client_address(router: Router, address: ClientAddress) -> Router {
    router.layer(middleware::from_fn(
        move |mut request: Request, next: Next| {
            let address = address.clone();
            async move {
                request.extensions_mut().insert(address);
                next.run(request).await
            }
        },
    ))
}

pub async fn body_bytes(body: Body) -> Bytes {
    body.collect().await.unwrap().to_bytes()
}

pub fn keys(dict: &CaptureDict) -> Vec<&str> {
    dict.keys().map(String::as_str).collect()
}

pub fn field<'a>(dict: &'a CaptureDict, key: &str) -> &'a Value {
    dict.get(key).unwrap_or_else(|| panic!("missing key {key}"))
}
