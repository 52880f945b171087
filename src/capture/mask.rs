//! # 隐私字段脱敏
//!
//! 按名称（不区分大小写的精确匹配）把查询参数和请求头的值替换为 `MASKED`。
//! 脱敏总是生成新的容器，不修改原值。

use std::collections::BTreeSet;

use super::normalize::FieldValue;
use super::types::{FormField, FormValue, HeaderMultimap, QueryParams};

/// 替换值
pub const MASKED_VALUE: &str = "MASKED";

/// 默认脱敏名称
pub const DEFAULT_MASKED_NAMES: [&str; 2] = ["authorization", "token"];

/// 需要脱敏的字段名称集合（统一小写）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedNames {
    names: BTreeSet<String>,
}

impl MaskedNames {
    /// 空集合：不脱敏任何字段
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            names: BTreeSet::new(),
        }
    }

    /// 由任意名称构造，名称会被转为小写
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::empty().with_names(names)
    }

    /// 在当前集合基础上追加名称
    #[must_use]
    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.names
            .extend(names.into_iter().map(|name| name.as_ref().to_lowercase()));
        self
    }

    /// `key` 小写后是否命中
    #[must_use]
    pub fn matches(&self, key: &str) -> bool {
        self.names.contains(&key.to_lowercase())
    }

    /// 按字典序遍历名称
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// 是否没有任何脱敏名称
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for MaskedNames {
    fn default() -> Self {
        Self::new(DEFAULT_MASKED_NAMES)
    }
}

/// 可脱敏的容器
pub trait Mask: Sized {
    /// 返回脱敏后的副本，键与顺序不变
    #[must_use]
    fn mask(&self, masked_names: &MaskedNames) -> Self;
}

impl Mask for QueryParams {
    fn mask(&self, masked_names: &MaskedNames) -> Self {
        self.multi_items()
            .map(|(key, value)| {
                if masked_names.matches(key) {
                    (key, MASKED_VALUE)
                } else {
                    (key, value)
                }
            })
            .collect()
    }
}

impl Mask for HeaderMultimap {
    fn mask(&self, masked_names: &MaskedNames) -> Self {
        self.iter()
            .map(|(name, value)| {
                if masked_names.matches(name) {
                    (name, MASKED_VALUE.to_string())
                } else {
                    (name, value.to_string())
                }
            })
            .collect()
    }
}

impl Mask for FormField {
    fn mask(&self, masked_names: &MaskedNames) -> Self {
        match &self.value {
            FormValue::Text(_) => self.clone(),
            // 上传文件的分段头也可能携带凭据
            FormValue::File(summary) => {
                let mut summary = summary.clone();
                summary.headers = summary.headers.mask(masked_names);
                Self::file(self.name.clone(), summary)
            }
        }
    }
}

impl Mask for FieldValue {
    fn mask(&self, masked_names: &MaskedNames) -> Self {
        match self {
            Self::Query(params) => Self::Query(params.mask(masked_names)),
            Self::Headers(headers) => Self::Headers(headers.mask(masked_names)),
            Self::Form(fields) => {
                Self::Form(fields.iter().map(|field| field.mask(masked_names)).collect())
            }
            other => other.clone(),
        }
    }
}
