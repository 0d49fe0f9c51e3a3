//! 请求分发
//!
//! 把 (方法, 路径) 交给路由表中的处理方法，并把结果统一转换为 [`Response`]。
//! 分发器从不向调用方抛出错误：未匹配返回 404，处理失败返回 500。

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use http::StatusCode;
use sprig_core::utils::panic_message;

use crate::error::{FrameworkError, RoutingError};
use crate::response::Response;
use crate::route_table::{RouteEntry, RouteTable};

/// 请求分发器
#[derive(Debug, Clone)]
pub struct Dispatcher {
    routes: Arc<RouteTable>,
}

impl Dispatcher {
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &Arc<RouteTable> {
        &self.routes
    }

    /// 处理一个请求
    pub fn handle(&self, verb: &str, path: &str) -> Response {
        match self.execute(verb, path) {
            Ok(response) => response,
            Err(FrameworkError::Routing(RoutingError::RouteNotFound { verb, path })) => {
                tracing::debug!("No route for {} {}", verb, path);
                Response::not_found()
            }
            Err(FrameworkError::RequestHandlingFailed {
                handler,
                suggested_status,
                cause,
            }) => {
                tracing::error!(
                    verb = %verb,
                    path = %path,
                    handler = %handler,
                    status = suggested_status.as_u16(),
                    "Request processing failed: {}",
                    cause
                );
                let reason = suggested_status
                    .canonical_reason()
                    .unwrap_or("Internal Server Error");
                Response::new(suggested_status).body(reason)
            }
            Err(other) => {
                tracing::error!(verb = %verb, path = %path, "Request processing failed: {}", other);
                Response::internal_error()
            }
        }
    }

    fn execute(&self, verb: &str, path: &str) -> Result<Response, FrameworkError> {
        let entry = self.routes.lookup(verb, path)?;
        tracing::trace!("Dispatching {} {} to {}", verb, path, entry.handler_name());
        Self::invoke(entry)
    }

    fn invoke(entry: &RouteEntry) -> Result<Response, FrameworkError> {
        let failed = |cause: sprig_core::BoxError| FrameworkError::RequestHandlingFailed {
            handler: entry.handler_name(),
            suggested_status: StatusCode::INTERNAL_SERVER_ERROR,
            cause,
        };

        match catch_unwind(AssertUnwindSafe(|| entry.invoke())) {
            Ok(Ok(reply)) => Ok(reply.into_response()),
            Ok(Err(cause)) => Err(failed(cause.into())),
            Err(panic) => Err(failed(
                format!("handler panicked: {}", panic_message(panic.as_ref())).into(),
            )),
        }
    }
}
