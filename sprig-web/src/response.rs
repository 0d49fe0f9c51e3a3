//! 响应模型
//!
//! 处理方法既可以返回普通值（按 200 输出），也可以返回完整的 [`Response`]

use std::collections::HashMap;

use bytes::Bytes;
use http::StatusCode;

/// 响应体
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Text(String),
    Json(serde_json::Value),
    Binary(Bytes),
}

impl Body {
    /// 序列化后的字节
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Body::Text(text) => Bytes::from(text.clone()),
            Body::Json(value) => Bytes::from(value.to_string()),
            Body::Binary(bytes) => bytes.clone(),
        }
    }

    /// 默认的 Content-Type
    pub fn content_type(&self) -> &'static str {
        match self {
            Body::Text(_) => "text/plain; charset=utf-8",
            Body::Json(_) => "application/json",
            Body::Binary(_) => "application/octet-stream",
        }
    }

    /// 文本内容（JSON 会被序列化）
    pub fn as_text(&self) -> Option<String> {
        match self {
            Body::Text(text) => Some(text.clone()),
            Body::Json(value) => Some(value.to_string()),
            Body::Binary(bytes) => std::str::from_utf8(bytes).ok().map(str::to_string),
        }
    }
}

/// 可以作为响应体的值
pub trait IntoBody {
    fn into_body(self) -> Option<Body>;
}

impl IntoBody for Body {
    fn into_body(self) -> Option<Body> {
        Some(self)
    }
}

impl IntoBody for () {
    fn into_body(self) -> Option<Body> {
        None
    }
}

impl IntoBody for String {
    fn into_body(self) -> Option<Body> {
        Some(Body::Text(self))
    }
}

impl<'a> IntoBody for &'a str {
    fn into_body(self) -> Option<Body> {
        Some(Body::Text(self.to_string()))
    }
}

impl IntoBody for serde_json::Value {
    fn into_body(self) -> Option<Body> {
        Some(Body::Json(self))
    }
}

impl IntoBody for Bytes {
    fn into_body(self) -> Option<Body> {
        Some(Body::Binary(self))
    }
}

impl IntoBody for Vec<u8> {
    fn into_body(self) -> Option<Body> {
        Some(Body::Binary(Bytes::from(self)))
    }
}

impl<T: IntoBody> IntoBody for Option<T> {
    fn into_body(self) -> Option<Body> {
        self.and_then(IntoBody::into_body)
    }
}

macro_rules! display_body {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoBody for $ty {
                fn into_body(self) -> Option<Body> {
                    Some(Body::Text(self.to_string()))
                }
            }
        )*
    };
}

display_body!(bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);

/// HTTP 响应
///
/// 状态码由 [`StatusCode`] 保证在 100..=999 之间
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    body: Option<Body>,
    headers: HashMap<String, String>,
}

impl Response {
    /// 创建一个空响应
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            body: None,
            headers: HashMap::new(),
        }
    }

    /// 从数值状态码创建，小于 100 或大于 999 时返回 `None`
    pub fn from_status_code(code: u16) -> Option<Self> {
        StatusCode::from_u16(code).ok().map(Self::new)
    }

    /// 创建构建器
    pub fn builder(status: StatusCode) -> ResponseBuilder {
        ResponseBuilder {
            response: Self::new(status),
        }
    }

    /// 创建一个 200 OK 响应
    pub fn ok(body: impl IntoBody) -> Self {
        Self::new(StatusCode::OK).body(body)
    }

    /// 创建一个 201 Created 响应
    pub fn created(body: impl IntoBody) -> Self {
        Self::new(StatusCode::CREATED).body(body)
    }

    /// 创建一个 204 No Content 响应
    pub fn no_content() -> Self {
        Self::new(StatusCode::NO_CONTENT)
    }

    /// 创建一个 400 Bad Request 响应
    pub fn bad_request(body: impl IntoBody) -> Self {
        Self::new(StatusCode::BAD_REQUEST).body(body)
    }

    /// 创建一个 404 Not Found 响应（空响应体）
    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND)
    }

    /// 创建一个 500 Internal Server Error 响应
    pub fn internal_error() -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR).body("Internal Server Error")
    }

    /// 设置响应体
    pub fn body(mut self, body: impl IntoBody) -> Self {
        self.body = body.into_body();
        self
    }

    /// 添加响应头
    ///
    /// 名称不区分大小写，统一存为小写，同名的后一次设置覆盖前一次
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    /// 设置状态码
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn body_ref(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// 响应头，名称均为小写
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// 按名称查找响应头（不区分大小写）
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// 响应体字节，没有响应体时为空
    pub fn body_bytes(&self) -> Bytes {
        self.body.as_ref().map(Body::to_bytes).unwrap_or_default()
    }

    /// 响应体文本，主要用于测试和日志
    pub fn body_text(&self) -> Option<String> {
        self.body.as_ref().and_then(Body::as_text)
    }

    /// 拆分为 (状态码, 响应体, 响应头)
    pub fn into_parts(self) -> (StatusCode, Option<Body>, HashMap<String, String>) {
        (self.status, self.body, self.headers)
    }
}

/// Response 构建器
#[derive(Debug)]
pub struct ResponseBuilder {
    response: Response,
}

impl ResponseBuilder {
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.response = self.response.header(name, value);
        self
    }

    pub fn body(mut self, body: impl IntoBody) -> Self {
        self.response = self.response.body(body);
        self
    }

    pub fn build(self) -> Response {
        self.response
    }
}

/// 处理方法的返回结果
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// 普通值，按 200 输出
    Value(Option<Body>),
    /// 完整响应，原样转发
    Response(Response),
}

impl Reply {
    pub fn into_response(self) -> Response {
        match self {
            Reply::Value(body) => Response {
                status: StatusCode::OK,
                body,
                headers: HashMap::new(),
            },
            Reply::Response(response) => response,
        }
    }
}

/// 可以作为处理方法返回值的类型
///
/// `Err` 会被当作处理失败，由分发器转换为 500
pub trait IntoReply {
    fn into_reply(self) -> anyhow::Result<Reply>;
}

impl IntoReply for Response {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Response(self))
    }
}

impl IntoReply for Reply {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(self)
    }
}

impl<T: IntoBody> IntoReply for T {
    fn into_reply(self) -> anyhow::Result<Reply> {
        Ok(Reply::Value(self.into_body()))
    }
}

impl<T, E> IntoReply for Result<T, E>
where
    T: IntoReply,
    E: Into<anyhow::Error>,
{
    fn into_reply(self) -> anyhow::Result<Reply> {
        match self {
            Ok(value) => value.into_reply(),
            Err(error) => Err(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_code_lower_bound() {
        assert!(Response::from_status_code(99).is_none());
        assert!(Response::from_status_code(100).is_some());
        assert_eq!(Response::from_status_code(418).unwrap().status_code(), 418);
    }

    #[test]
    fn test_builder() {
        let response = Response::builder(StatusCode::CREATED)
            .header("Location", "/users/1")
            .body(json!({"id": 1}))
            .build();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.header_value("Location"), Some("/users/1"));
        assert_eq!(response.body_text().as_deref(), Some(r#"{"id":1}"#));
        assert_eq!(response.body_ref().map(Body::content_type), Some("application/json"));
    }

    #[test]
    fn test_header_names_are_case_insensitive() {
        let response = Response::ok("ok").header("X-A", "1").header("x-a", "2");

        assert_eq!(response.headers().len(), 1);
        assert_eq!(response.headers().get("x-a").map(String::as_str), Some("2"));
        assert_eq!(response.header_value("X-A"), Some("2"));
        assert!(response.header_value("X-B").is_none());
    }

    #[test]
    fn test_headers_default_to_empty() {
        let response = Response::new(StatusCode::OK);
        assert!(response.headers().is_empty());
        assert!(response.body_bytes().is_empty());
    }

    #[test]
    fn test_plain_values_become_ok_replies() {
        let reply = "ALO".into_reply().unwrap();
        let response = reply.into_response();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body_text().as_deref(), Some("ALO"));
        assert!(response.headers().is_empty());

        assert_eq!(42u32.into_reply().unwrap().into_response().body_text().as_deref(), Some("42"));
        assert!(().into_reply().unwrap().into_response().body_ref().is_none());
        assert!(None::<String>.into_reply().unwrap().into_response().body_ref().is_none());
    }

    #[test]
    fn test_responses_are_forwarded() {
        let original = Response::new(StatusCode::ACCEPTED).header("X-Trace", "1").body("queued");
        let forwarded = original.clone().into_reply().unwrap().into_response();
        assert_eq!(forwarded, original);
    }

    #[test]
    fn test_results() {
        let ok: Result<&str, std::io::Error> = Ok("fine");
        assert_eq!(ok.into_reply().unwrap().into_response().body_text().as_deref(), Some("fine"));

        let failed: anyhow::Result<Response> = Err(anyhow::anyhow!("broken"));
        assert_eq!(failed.into_reply().err().unwrap().to_string(), "broken");
    }

    #[test]
    fn test_internal_error_body() {
        let response = Response::internal_error();
        assert_eq!(response.status_code(), 500);
        assert_eq!(response.body_text().as_deref(), Some("Internal Server Error"));
    }
}
