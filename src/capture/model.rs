//! # 捕获记录
//!
//! 请求 / 响应 / 端点描述的类型化记录，以及按固定顺序投影为字典和 JSON 的逻辑。
//! 记录构造后不再修改：脱敏总是返回新的记录。

use axum::body::Body;
use axum::extract::{ConnectInfo, FromRequest, Multipart, OriginalUri, Request};
use axum::http::header::CONTENT_TYPE;
use axum::response::Response;
use bytes::Bytes;
use serde_json::{Map, Value};
use std::net::SocketAddr;
use tracing::warn;

use super::body::{body_text, extract_response_body, read_request_body};
use super::mask::{Mask, MaskedNames};
use super::normalize::FieldValue;
use super::types::{ClientAddress, FormField, HeaderMultimap, QueryParams, UploadSummary};
use crate::error::{CaptureError, Result};

/// 有序的捕获字典
pub type CaptureDict = Map<String, Value>;

/// `as_dict` / `as_json` 的参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureOptions {
    /// 是否脱敏（默认开启）
    ///
    /// 关闭后会输出原始的敏感值，这是有意提供的逃生口。
    pub mask_private_data: bool,
    /// 需要脱敏的字段名称
    pub masked_names: MaskedNames,
    /// 是否省略空字段（默认开启）
    pub omit_nulls: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            mask_private_data: true,
            masked_names: MaskedNames::default(),
            omit_nulls: true,
        }
    }
}

impl CaptureOptions {
    /// 不做脱敏
    #[must_use]
    pub fn unmasked() -> Self {
        Self {
            mask_private_data: false,
            ..Self::default()
        }
    }

    /// 替换脱敏名称集合
    #[must_use]
    pub fn with_masked_names(mut self, masked_names: MaskedNames) -> Self {
        self.masked_names = masked_names;
        self
    }

    /// 空字段输出为 `null`
    #[must_use]
    pub const fn keep_nulls(mut self) -> Self {
        self.omit_nulls = false;
        self
    }
}

/// 从实时请求读取哪些内容
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
    /// 读取并缓冲消息体
    pub include_body: bool,
    /// 表单请求以字段列表代替消息体
    pub include_form: bool,
}

// 按固定顺序把字段投影为字典
fn project_fields(fields: Vec<(&'static str, Option<FieldValue>)>, options: &CaptureOptions) -> CaptureDict {
    let mut dict = Map::with_capacity(fields.len());
    for (key, value) in fields {
        match value {
            Some(value) => {
                let value = if options.mask_private_data {
                    value.mask(&options.masked_names)
                } else {
                    value
                };
                dict.insert(key.to_string(), value.project());
            }
            None if !options.omit_nulls => {
                dict.insert(key.to_string(), Value::Null);
            }
            None => {}
        }
    }
    dict
}

fn to_json(dict: CaptureDict) -> Result<String> {
    serde_json::to_string(&Value::Object(dict))
        .map_err(|err| CaptureError::serialization("无法序列化捕获记录", err))
}

/// 请求路径（不含查询串）；嵌套路由下优先使用原始 URI
fn request_path(request: &Request) -> String {
    request
        .extensions()
        .get::<OriginalUri>()
        .map_or_else(|| request.uri().path(), |original| original.0.path())
        .to_string()
}

fn client_address(request: &Request) -> Option<ClientAddress> {
    if let Some(address) = request.extensions().get::<ClientAddress>() {
        return Some(address.clone());
    }
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| ClientAddress::from(*addr))
}

/// 端点描述：关联响应与其原始请求的最小键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointDescriptor {
    /// 请求方法
    pub method: String,
    /// 请求路径（不含查询串）
    pub path: String,
}

impl EndpointDescriptor {
    /// 由方法与路径构造
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }

    /// 从实时请求提取方法与路径
    #[must_use]
    pub fn from_request(request: &Request) -> Self {
        Self::new(request.method().as_str(), request_path(request))
    }

    /// 投影为 `{method, path}` 字典，不做脱敏
    #[must_use]
    pub fn as_dict(&self) -> CaptureDict {
        project_fields(
            vec![
                ("method", Some(FieldValue::Text(self.method.clone()))),
                ("path", Some(FieldValue::Text(self.path.clone()))),
            ],
            &CaptureOptions::unmasked(),
        )
    }
}

/// 入站请求的捕获记录
///
/// 字段输出顺序固定：`type, method, path, query_params, headers, client_address, body, form`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestCapture {
    method: String,
    path: String,
    query_params: QueryParams,
    headers: HeaderMultimap,
    client_address: Option<ClientAddress>,
    body: Option<String>,
    form: Option<Vec<FormField>>,
}

impl RequestCapture {
    /// 记录类型标签
    pub const KIND: &'static str = "Request";

    /// 由已知字段直接构造
    #[must_use]
    pub fn new(
        method: impl Into<String>,
        path: impl Into<String>,
        query_params: QueryParams,
        headers: HeaderMultimap,
    ) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            query_params,
            headers,
            client_address: None,
            body: None,
            form: None,
        }
    }

    /// 设置客户端地址
    #[must_use]
    pub fn with_client_address(mut self, address: ClientAddress) -> Self {
        self.client_address = Some(address);
        self
    }

    /// 设置解码后的请求体文本
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// 设置表单字段，输出时代替 body
    #[must_use]
    pub fn with_form(mut self, form: Vec<FormField>) -> Self {
        self.form = Some(form);
        self
    }

    /// 从实时请求构造
    ///
    /// 需要读取消息体时会完整读取传输流，并把等价的消息体放回请求中返回。
    /// 读取失败不向上传播：对应字段留空。
    pub async fn from_request(request: Request, options: ReadOptions) -> (Request, Self) {
        let mut capture = Self::new(
            request.method().as_str(),
            request_path(&request),
            request.uri().query().map(QueryParams::parse).unwrap_or_default(),
            HeaderMultimap::from(request.headers()),
        );
        capture.client_address = client_address(&request);

        let form_kind = if options.include_form {
            FormKind::of(&capture.headers)
        } else {
            None
        };
        if form_kind.is_none() && !options.include_body {
            return (request, capture);
        }

        let (request, bytes) = read_request_body(request).await;
        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %err, path = %capture.path, "Failed to read request body");
                return (request, capture);
            }
        };

        match form_kind {
            Some(kind) => match kind.parse(&capture.headers, bytes).await {
                Ok(fields) => capture.form = Some(fields),
                Err(err) => warn!(error = %err, path = %capture.path, "Failed to read request form"),
            },
            None => capture.body = Some(body_text(&bytes)),
        }
        (request, capture)
    }

    /// 返回脱敏后的副本
    #[must_use]
    pub fn mask_private_data(&self, masked_names: &MaskedNames) -> Self {
        Self {
            query_params: self.query_params.mask(masked_names),
            headers: self.headers.mask(masked_names),
            form: self
                .form
                .as_ref()
                .map(|fields| fields.iter().map(|field| field.mask(masked_names)).collect()),
            ..self.clone()
        }
    }

    fn fields(&self) -> Vec<(&'static str, Option<FieldValue>)> {
        vec![
            ("type", Some(FieldValue::Text(Self::KIND.to_string()))),
            ("method", Some(FieldValue::Text(self.method.clone()))),
            ("path", Some(FieldValue::Text(self.path.clone()))),
            ("query_params", Some(FieldValue::Query(self.query_params.clone()))),
            ("headers", Some(FieldValue::Headers(self.headers.clone()))),
            ("client_address", self.client_address.clone().map(FieldValue::Address)),
            // 表单占据 body 的位置，两者只输出其一
            match &self.form {
                Some(form) => ("form", Some(FieldValue::Form(form.clone()))),
                None => ("body", self.body.clone().map(FieldValue::Text)),
            },
        ]
    }

    /// 投影为有序字典：先脱敏，再规范化
    #[must_use]
    pub fn as_dict(&self, options: &CaptureOptions) -> CaptureDict {
        project_fields(self.fields(), options)
    }

    /// 投影为紧凑的 JSON 字符串
    pub fn as_json(&self, options: &CaptureOptions) -> Result<String> {
        to_json(self.as_dict(options))
    }

    /// 请求方法
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// 请求路径
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// 查询参数（未脱敏）
    #[must_use]
    pub const fn query_params(&self) -> &QueryParams {
        &self.query_params
    }

    /// 头部（未脱敏）
    #[must_use]
    pub const fn headers(&self) -> &HeaderMultimap {
        &self.headers
    }

    /// 客户端地址
    #[must_use]
    pub const fn client_address(&self) -> Option<&ClientAddress> {
        self.client_address.as_ref()
    }

    /// 消息体文本
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    /// 表单字段
    #[must_use]
    pub fn form(&self) -> Option<&[FormField]> {
        self.form.as_deref()
    }
}

/// 出站响应的捕获记录
///
/// 字段输出顺序固定：`type, status_code, headers, request, body`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCapture {
    status_code: u16,
    headers: HeaderMultimap,
    request: Option<EndpointDescriptor>,
    body: Option<String>,
}

impl ResponseCapture {
    /// 记录类型标签
    pub const KIND: &'static str = "Response";

    /// 由已知字段直接构造
    #[must_use]
    pub const fn new(status_code: u16, headers: HeaderMultimap) -> Self {
        Self {
            status_code,
            headers,
            request: None,
            body: None,
        }
    }

    /// 关联发起请求的端点
    #[must_use]
    pub fn with_request(mut self, endpoint: EndpointDescriptor) -> Self {
        self.request = Some(endpoint);
        self
    }

    /// 设置解码后的消息体文本
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// 从实时响应构造，返回（可能被重建的）响应
    pub async fn from_response(
        response: Response,
        include_body: bool,
        endpoint: Option<EndpointDescriptor>,
    ) -> (Response, Self) {
        let mut capture = Self::new(
            response.status().as_u16(),
            HeaderMultimap::from(response.headers()),
        );
        capture.request = endpoint;

        if !include_body {
            return (response, capture);
        }
        let (response, bytes) = extract_response_body(response).await;
        capture.body = bytes.map(|bytes| body_text(&bytes));
        (response, capture)
    }

    /// 返回脱敏后的副本
    #[must_use]
    pub fn mask_private_data(&self, masked_names: &MaskedNames) -> Self {
        Self {
            headers: self.headers.mask(masked_names),
            ..self.clone()
        }
    }

    fn fields(&self) -> Vec<(&'static str, Option<FieldValue>)> {
        vec![
            ("type", Some(FieldValue::Text(Self::KIND.to_string()))),
            ("status_code", Some(FieldValue::Integer(i64::from(self.status_code)))),
            ("headers", Some(FieldValue::Headers(self.headers.clone()))),
            ("request", self.request.clone().map(FieldValue::Endpoint)),
            ("body", self.body.clone().map(FieldValue::Text)),
        ]
    }

    /// 投影为有序字典：先脱敏，再规范化
    #[must_use]
    pub fn as_dict(&self, options: &CaptureOptions) -> CaptureDict {
        project_fields(self.fields(), options)
    }

    /// 投影为紧凑的 JSON 字符串
    pub fn as_json(&self, options: &CaptureOptions) -> Result<String> {
        to_json(self.as_dict(options))
    }

    /// 状态码
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        self.status_code
    }

    /// 头部（未脱敏）
    #[must_use]
    pub const fn headers(&self) -> &HeaderMultimap {
        &self.headers
    }

    /// 关联的请求端点
    #[must_use]
    pub const fn request(&self) -> Option<&EndpointDescriptor> {
        self.request.as_ref()
    }

    /// 消息体文本
    #[must_use]
    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }
}

/// 可解析的表单编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormKind {
    Multipart,
    UrlEncoded,
}

impl FormKind {
    fn of(headers: &HeaderMultimap) -> Option<Self> {
        let content_type = headers.get(CONTENT_TYPE.as_str())?.to_ascii_lowercase();
        if content_type.starts_with("multipart/form-data") {
            Some(Self::Multipart)
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            Some(Self::UrlEncoded)
        } else {
            None
        }
    }

    async fn parse(self, headers: &HeaderMultimap, bytes: Bytes) -> Result<Vec<FormField>> {
        match self {
            Self::UrlEncoded => Ok(url::form_urlencoded::parse(&bytes)
                .into_owned()
                .map(|(name, value)| FormField::text(name, value))
                .collect()),
            Self::Multipart => {
                let content_type = headers.get(CONTENT_TYPE.as_str()).unwrap_or_default();
                parse_multipart(content_type, bytes).await
            }
        }
    }
}

// 用缓冲后的字节重新构造一个仅带 content-type 的请求交给 Multipart 解析
async fn parse_multipart(content_type: &str, bytes: Bytes) -> Result<Vec<FormField>> {
    let request = Request::builder()
        .header(CONTENT_TYPE, content_type)
        .body(Body::from(bytes))
        .map_err(|err| CaptureError::capture_read_with_source("invalid multipart content type", err))?;
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| CaptureError::capture_read(rejection.body_text()))?;

    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| CaptureError::capture_read_with_source("malformed multipart body", err))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if let Some(file_name) = field.file_name().map(str::to_string) {
            let headers = HeaderMultimap::from(field.headers());
            let data = field
                .bytes()
                .await
                .map_err(|err| CaptureError::capture_read_with_source("failed to read upload", err))?;
            fields.push(FormField::file(
                name,
                UploadSummary {
                    file_name,
                    headers,
                    size: data.len(),
                },
            ));
        } else {
            let text = field
                .text()
                .await
                .map_err(|err| CaptureError::capture_read_with_source("failed to read form field", err))?;
            fields.push(FormField::text(name, text));
        }
    }
    Ok(fields)
}
