//! 中间件模块
//!
//! 通过 `axum::middleware::from_fn` 挂到路由上

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use std::time::Instant;

use crate::constants::REQUEST_ID_HEADER;

/// 请求日志中间件
pub async fn request_logging(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let elapsed = start.elapsed();
    let status = response.status();

    if status.is_server_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed = ?elapsed,
            "Request completed with error status"
        );
    } else {
        tracing::info!(
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            elapsed = ?elapsed,
            "Request completed"
        );
    }

    response
}

/// 请求 ID 中间件
///
/// 请求已携带 `X-Request-ID` 时沿用，否则生成一个 UUID v4
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let existing = req.headers().get(REQUEST_ID_HEADER).cloned();
    let request_id = match existing {
        Some(existing) => existing,
        None => {
            let generated = uuid::Uuid::new_v4().to_string();
            match HeaderValue::from_str(&generated) {
                Ok(value) => {
                    req.headers_mut().insert(REQUEST_ID_HEADER, value.clone());
                    value
                }
                Err(_) => return next.run(req).await,
            }
        }
    };

    let mut response = next.run(req).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, request_id);
    response
}
