//! # 捕获中间件集成测试
//!
//! 通过 `tower::ServiceExt::oneshot` 驱动完整的 axum 路由器

mod common;

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, Bytes},
    http::{Request, StatusCode, header},
    response::IntoResponse,
    routing::{get, post},
};
use futures::stream;
use pretty_assertions::assert_eq;
use serde_json::json;
use tower::ServiceExt;

use common::{FailingHandler, RecordingHandler, body_bytes, field, keys, with_client_address};
use http_capture::{
    CaptureConfig, CaptureHandler, CaptureOptions, CapturePipeline, ClientAddress,
    SkipBodyCapture, register,
};

fn capture_config(include_body: bool, include_form: bool) -> CaptureConfig {
    CaptureConfig {
        include_body,
        include_form,
        ..CaptureConfig::default()
    }
}

fn app(handlers: Vec<Arc<dyn CaptureHandler>>, config: CaptureConfig) -> Router {
    let routes = Router::new()
        .route("/api/v1/test-exporting", post(|body: Bytes| async move { body }))
        .route("/api/v1/stream", get(streaming))
        .route("/api/v1/secret", get(secret))
        .route("/api/v1/form", post(|body: Bytes| async move { body }));
    let pipeline = CapturePipeline::new(handlers, config).unwrap();
    let router = register(routes, Arc::new(pipeline));
    with_client_address(router, ClientAddress::new("testclient", 50000))
}

async fn streaming() -> Body {
    let chunks = ["alpha-", "beta-", "gamma"]
        .into_iter()
        .map(|chunk| Ok::<_, std::io::Error>(Bytes::from_static(chunk.as_bytes())));
    Body::from_stream(stream::iter(chunks))
}

async fn secret() -> impl IntoResponse {
    let mut response = "top secret payload".into_response();
    response.extensions_mut().insert(SkipBodyCapture);
    response
}

#[tokio::test]
async fn request_capture_matches_exporting_scenario() {
    let recorder = RecordingHandler::new(CaptureOptions::default());
    let app = app(vec![recorder.clone()], capture_config(true, false));

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/test-exporting?param_list=list_item1&param_list=list_item2")
        .header(header::CONTENT_TYPE, "application/json")
        .header("request-header1", "request_header_value1")
        .body(Body::from(r#"{"request_body": "ok"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(response.into_body()).await,
        Bytes::from_static(br#"{"request_body": "ok"}"#)
    );

    let requests = recorder.requests();
    assert_eq!(requests.len(), 1);
    let capture = &requests[0];
    assert_eq!(
        keys(capture),
        ["type", "method", "path", "query_params", "headers", "client_address", "body"]
    );
    assert_eq!(field(capture, "type"), &json!("Request"));
    assert_eq!(field(capture, "method"), &json!("POST"));
    assert_eq!(field(capture, "path"), &json!("/api/v1/test-exporting"));
    assert_eq!(
        field(capture, "query_params"),
        &json!("param_list=list_item1&param_list=list_item2")
    );
    assert_eq!(
        field(capture, "headers")["request-header1"],
        json!("request_header_value1")
    );
    assert_eq!(
        field(capture, "client_address"),
        &json!({"host": "testclient", "port": 50000})
    );
    assert_eq!(field(capture, "body"), &json!(r#"{"request_body": "ok"}"#));

    let responses = recorder.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(
        keys(&responses[0]),
        ["type", "status_code", "headers", "request", "body"]
    );
    assert_eq!(field(&responses[0], "status_code"), &json!(200));
    assert_eq!(
        field(&responses[0], "request"),
        &json!({"method": "POST", "path": "/api/v1/test-exporting"})
    );
}

#[tokio::test]
async fn sensitive_values_are_masked_by_default() {
    let recorder = RecordingHandler::new(CaptureOptions::default());
    let app = app(vec![recorder.clone()], CaptureConfig::default());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/test-exporting?token=secret&authorization=abc123&visible=ok")
        .header("Authorization", "Bearer abc")
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap();

    let capture = &recorder.requests()[0];
    assert_eq!(
        field(capture, "query_params"),
        &json!("token=MASKED&authorization=MASKED&visible=ok")
    );
    assert_eq!(field(capture, "headers")["authorization"], json!("MASKED"));
    // 未开启消息体捕获时不输出 body
    assert!(!capture.contains_key("body"));
}

#[tokio::test]
async fn streaming_response_is_delivered_unchanged() {
    let recorder = RecordingHandler::new(CaptureOptions::default());
    let app = app(vec![recorder.clone()], capture_config(true, false));

    let request = Request::get("/api/v1/stream").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(response.into_body()).await,
        Bytes::from_static(b"alpha-beta-gamma")
    );
    assert_eq!(
        field(&recorder.responses()[0], "body"),
        &json!("alpha-beta-gamma")
    );
}

#[tokio::test]
async fn skip_marker_keeps_body_out_of_capture() {
    let recorder = RecordingHandler::new(CaptureOptions::default());
    let app = app(vec![recorder.clone()], capture_config(true, false));

    let request = Request::get("/api/v1/secret").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(
        body_bytes(response.into_body()).await,
        Bytes::from_static(b"top secret payload")
    );
    assert!(!recorder.responses()[0].contains_key("body"));
}

#[tokio::test]
async fn failing_sink_does_not_affect_other_sinks_or_client() {
    let recorder = RecordingHandler::new(CaptureOptions::default());
    let app = app(
        vec![Arc::new(FailingHandler) as Arc<dyn CaptureHandler>, recorder.clone()],
        capture_config(true, false),
    );

    let request = Request::post("/api/v1/test-exporting")
        .body(Body::from("payload"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_bytes(response.into_body()).await,
        Bytes::from_static(b"payload")
    );
    assert_eq!(recorder.requests().len(), 1);
    assert_eq!(recorder.responses().len(), 1);
}

#[tokio::test]
async fn unmatched_route_only_produces_response_capture() {
    let recorder = RecordingHandler::new(CaptureOptions::default());
    let app = app(vec![recorder.clone()], CaptureConfig::default());

    let request = Request::get("/api/v1/missing").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(recorder.requests().is_empty());
    let responses = recorder.responses();
    assert_eq!(responses.len(), 1);
    assert_eq!(field(&responses[0], "status_code"), &json!(404));
    assert_eq!(
        field(&responses[0], "request"),
        &json!({"method": "GET", "path": "/api/v1/missing"})
    );
}

#[tokio::test]
async fn urlencoded_form_replaces_body() {
    let recorder = RecordingHandler::new(CaptureOptions::default());
    let app = app(vec![recorder.clone()], capture_config(true, true));

    let request = Request::post("/api/v1/form")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from("name=alice&tag=a&tag=b"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    // 业务处理仍然能读到原始表单
    assert_eq!(
        body_bytes(response.into_body()).await,
        Bytes::from_static(b"name=alice&tag=a&tag=b")
    );
    let capture = &recorder.requests()[0];
    assert!(!capture.contains_key("body"));
    assert_eq!(
        field(capture, "form"),
        &json!([["name", "alice"], ["tag", "a"], ["tag", "b"]])
    );
}

#[tokio::test]
async fn unmasked_sink_sees_raw_values() {
    let masked = RecordingHandler::new(CaptureOptions::default());
    let raw = RecordingHandler::new(CaptureOptions::unmasked());
    let app = app(vec![masked.clone(), raw.clone()], CaptureConfig::default());

    let request = Request::get("/api/v1/stream?token=abc")
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap();

    assert_eq!(field(&masked.requests()[0], "query_params"), &json!("token=MASKED"));
    assert_eq!(field(&raw.requests()[0], "query_params"), &json!("token=abc"));
}
