//! # 捕获配置结构定义

use serde::{Deserialize, Serialize};

use crate::capture::{CaptureOptions, DEFAULT_MASKED_NAMES, MaskedNames, ReadOptions};

/// 捕获主配置结构
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// 是否读取请求/响应体
    ///
    /// 流式响应会被完整读入内存，不要在无界流的路由上开启。
    pub include_body: bool,
    /// 表单请求是否以字段列表代替消息体
    pub include_form: bool,
    /// 脱敏配置
    pub masking: MaskingConfig,
}

/// 脱敏配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaskingConfig {
    /// 是否脱敏
    pub enabled: bool,
    /// 脱敏字段名称（不区分大小写）
    pub masked_names: Vec<String>,
    /// 是否省略空字段
    pub omit_nulls: bool,
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            masked_names: DEFAULT_MASKED_NAMES.iter().map(ToString::to_string).collect(),
            omit_nulls: true,
        }
    }
}

impl CaptureConfig {
    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> crate::error::Result<Self> {
        let config: Self = toml::from_str(content)?;
        config
            .validate()
            .map_err(crate::error::CaptureError::config)?;
        Ok(config)
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<(), String> {
        for name in &self.masking.masked_names {
            if name.trim().is_empty() {
                return Err("masking.masked_names 不能包含空名称".to_string());
            }
            if name.chars().any(char::is_whitespace) {
                return Err(format!("脱敏字段名称不能包含空白字符: {name:?}"));
            }
        }
        Ok(())
    }

    /// 消息体读取参数
    #[must_use]
    pub const fn read_options(&self) -> ReadOptions {
        ReadOptions {
            include_body: self.include_body,
            include_form: self.include_form,
        }
    }

    /// 序列化参数
    #[must_use]
    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            mask_private_data: self.masking.enabled,
            masked_names: MaskedNames::new(&self.masking.masked_names),
            omit_nulls: self.masking.omit_nulls,
        }
    }
}
