//! # 字段规范化
//!
//! 把框架原生的线上类型（URI、查询参数、请求头、对端地址）投影为可序列化的
//! 字符串 / 映射形式。全部为纯函数。

use axum::http::Uri;
use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use super::model::EndpointDescriptor;
use super::types::{ClientAddress, FormField, FormValue, HeaderMultimap, QueryParams};

/// URI 的文本形式，保持原始的路径与查询结构
#[must_use]
pub fn normalize_url(uri: &Uri) -> String {
    uri.to_string()
}

/// 查询参数编码为 `k=v&k=v`，保持插入顺序与重复键
#[must_use]
pub fn normalize_query_params(params: &QueryParams) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params.multi_items() {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

/// 请求头投影为普通映射
///
/// 重复的头名称只保留最后一个值（位置取第一次出现处）。
#[must_use]
pub fn normalize_headers(headers: &HeaderMultimap) -> IndexMap<String, String> {
    let mut map = IndexMap::with_capacity(headers.len());
    for (name, value) in headers.iter() {
        map.insert(name.to_string(), value.to_string());
    }
    map
}

/// 对端地址拆分为 `{host, port}`
#[must_use]
pub fn normalize_address(address: &ClientAddress) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("host".to_string(), Value::String(address.host.clone()));
    map.insert("port".to_string(), Value::from(address.port));
    map
}

/// 捕获记录中单个字段的值
///
/// 每个变体在构造时就确定了投影方式，无需运行时类型检查。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// 原样输出的字符串
    Text(String),
    /// 整数（状态码）
    Integer(i64),
    /// 查询参数，输出为查询串
    Query(QueryParams),
    /// 请求头，输出为对象
    Headers(HeaderMultimap),
    /// 客户端地址，输出为 `{host, port}`
    Address(ClientAddress),
    /// 端点描述，输出为 `{method, path}`
    Endpoint(EndpointDescriptor),
    /// 表单字段列表
    Form(Vec<FormField>),
}

impl FieldValue {
    /// 投影为 JSON 值
    #[must_use]
    pub fn project(&self) -> Value {
        match self {
            Self::Text(text) => Value::String(text.clone()),
            Self::Integer(number) => Value::from(*number),
            Self::Query(params) => Value::String(normalize_query_params(params)),
            Self::Headers(headers) => headers_value(headers),
            Self::Address(address) => Value::Object(normalize_address(address)),
            Self::Endpoint(endpoint) => json!({
                "method": endpoint.method,
                "path": endpoint.path,
            }),
            Self::Form(fields) => Value::Array(fields.iter().map(form_field_value).collect()),
        }
    }
}

fn headers_value(headers: &HeaderMultimap) -> Value {
    Value::Object(
        normalize_headers(headers)
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect(),
    )
}

// 表单字段序列化为 [name, value] 二元组
fn form_field_value(field: &FormField) -> Value {
    let value = match &field.value {
        FormValue::Text(text) => Value::String(text.clone()),
        FormValue::File(summary) => json!({
            "file_name": summary.file_name,
            "headers": headers_value(&summary.headers),
            "size": summary.size,
        }),
    };
    Value::Array(vec![Value::String(field.name.clone()), value])
}
