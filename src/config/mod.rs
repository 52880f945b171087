//! # 配置管理模块
//!
//! 处理捕获配置的加载与验证

mod app_config;

pub use app_config::{CaptureConfig, MaskingConfig};

use std::env;
use std::path::Path;

use crate::error::{CaptureError, Context, Result};

/// 指定配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "HTTP_CAPTURE_CONFIG";

/// 从文件加载配置
pub fn load_config(path: impl AsRef<Path>) -> Result<CaptureConfig> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CaptureError::config(format!(
            "配置文件不存在: {}",
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))?;

    CaptureConfig::from_toml_str(&content)
}

/// 按优先级加载配置：显式路径 > 环境变量 > 默认值
pub fn resolve_config(path: Option<&Path>) -> Result<CaptureConfig> {
    if let Some(path) = path {
        return load_config(path);
    }
    match env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => load_config(path),
        _ => Ok(CaptureConfig::default()),
    }
}
