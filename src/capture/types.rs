//! # 捕获字段的值类型
//!
//! 有序多值映射（查询参数、请求头）、客户端地址与表单字段

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// 查询参数：保持插入顺序，允许重复键
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    items: Vec<(String, String)>,
}

impl QueryParams {
    /// 空参数集
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// 解析原始查询串（`a=1&b=2`），按 `application/x-www-form-urlencoded` 规则解码
    #[must_use]
    pub fn parse(query: &str) -> Self {
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// 追加一对键值
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.items.push((key.into(), value.into()));
    }

    /// 按原始顺序遍历全部键值对（包括重复键）
    pub fn multi_items(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 指定键的全部取值
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.items
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 键值对数量（含重复键）
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// 请求头多值映射
///
/// 键统一小写存储，查找不区分大小写；保持原始顺序与重复项。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMultimap {
    items: Vec<(String, String)>,
}

impl HeaderMultimap {
    /// 空头集合
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// 追加一个头（名称转为小写）
    pub fn append(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        self.items
            .push((name.as_ref().to_ascii_lowercase(), value.into()));
    }

    /// 第一个匹配的值
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.items
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// 按原始顺序遍历（包括重复名称）
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.items.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// 请求头条目数量（含重复项）
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// 是否为空
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderMultimap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Self::new();
        for (name, value) in iter {
            headers.append(name, value);
        }
        headers
    }
}

impl From<&HeaderMap> for HeaderMultimap {
    fn from(map: &HeaderMap) -> Self {
        // 非 UTF-8 的头值按有损方式解码，不丢弃
        map.iter()
            .map(|(name, value)| {
                (
                    name.as_str(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect()
    }
}

/// 客户端地址
///
/// 可作为请求扩展注入，用于覆盖连接层看到的对端地址（例如反向代理后的逻辑主机名）。
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClientAddress {
    /// 主机名或 IP
    pub host: String,
    /// 端口
    pub port: u16,
}

impl ClientAddress {
    /// 由已知字段构造
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl From<SocketAddr> for ClientAddress {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

/// 上传文件摘要，不保留文件内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    /// 客户端提交的文件名
    pub file_name: String,
    /// 分段头
    pub headers: HeaderMultimap,
    /// 文件字节数
    pub size: usize,
}

/// 表单字段的值
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    /// 普通文本字段
    Text(String),
    /// 文件字段
    File(UploadSummary),
}

/// 表单字段（按提交顺序，名称可重复）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormField {
    /// 字段名
    pub name: String,
    /// 字段值
    pub value: FormValue,
}

impl FormField {
    /// 文本字段
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FormValue::Text(value.into()),
        }
    }

    /// 文件字段
    #[must_use]
    pub fn file(name: impl Into<String>, summary: UploadSummary) -> Self {
        Self {
            name: name.into(),
            value: FormValue::File(summary),
        }
    }
}
