//! # 请求/响应捕获
//!
//! 规范化、脱敏、捕获记录与消息体读取

pub mod body;
pub mod mask;
pub mod model;
pub mod normalize;
pub mod types;

pub use body::{DrainedBody, SkipBodyCapture, drain_body, extract_response_body, read_request_body};
pub use mask::{DEFAULT_MASKED_NAMES, MASKED_VALUE, Mask, MaskedNames};
pub use model::{
    CaptureDict, CaptureOptions, EndpointDescriptor, ReadOptions, RequestCapture, ResponseCapture,
};
pub use normalize::{
    FieldValue, normalize_address, normalize_headers, normalize_query_params, normalize_url,
};
pub use types::{ClientAddress, FormField, FormValue, HeaderMultimap, QueryParams, UploadSummary};
