//! # HTTP Capture 演示服务
//!
//! 启动一个带捕获中间件的 axum 服务，捕获记录输出到日志

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use axum::{
    Json, Router,
    body::{Body, Bytes},
    routing::{get, post},
};
use clap::Parser;
use futures::stream;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use http_capture::{CapturePipeline, config, logging, register};

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "http-capture-demo", version, about = "HTTP capture middleware demo server")]
struct Args {
    /// 监听地址
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,

    /// 配置文件路径（未指定时读取 HTTP_CAPTURE_CONFIG）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 日志级别
    #[arg(long)]
    log_level: Option<String>,

    /// 打印日志配置指南后退出
    #[arg(long)]
    logging_help: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if args.logging_help {
        logging::print_logging_help();
        return Ok(());
    }

    logging::init_logging(args.log_level.as_deref());

    let config = config::resolve_config(args.config.as_deref()).context("加载捕获配置失败")?;
    let pipeline = CapturePipeline::with_default_handlers(config).context("初始化捕获管道失败")?;

    let app = register(routes(), Arc::new(pipeline))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = tokio::net::TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("监听 {} 失败", args.bind))?;
    info!(bind = %args.bind, "Demo server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("服务运行失败")?;

    info!("Demo server stopped");
    Ok(())
}

fn routes() -> Router {
    Router::new()
        .route("/api/v1/echo", post(echo))
        .route("/api/v1/stream", get(stream_chunks))
}

async fn echo(Json(payload): Json<Value>) -> Json<Value> {
    Json(json!({ "echo": payload }))
}

async fn stream_chunks() -> Body {
    let chunks = ["first,", "second,", "third"]
        .into_iter()
        .map(|chunk| Ok::<_, std::io::Error>(Bytes::from_static(chunk.as_bytes())));
    Body::from_stream(stream::iter(chunks))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for shutdown signal");
    }
}
