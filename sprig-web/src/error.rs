//! Web 层错误定义

use http::StatusCode;
use sprig_core::{
    ApplicationError, BoxError, ContainerError, RegistrationError, ResolutionError, TypeRef,
};
use thiserror::Error;

/// 路由错误
#[derive(Debug, Error)]
pub enum RoutingError {
    /// 两个处理方法映射到同一个 (方法, 路径)
    #[error("Route collision on {verb} {path}: '{existing_handler}' and '{new_handler}'")]
    RouteCollision {
        verb: String,
        path: String,
        existing_handler: String,
        new_handler: String,
    },

    /// 注册表中带控制器标记的类型没有实例
    #[error("Controller bean '{0}' not found in registry")]
    ControllerBeanNotFound(TypeRef),

    /// 处理方法的 HTTP 方法或路径无法被分发
    #[error("Invalid route definition for '{handler}': {reason}")]
    InvalidRouteDefinition { handler: String, reason: String },

    /// 请求没有匹配的路由
    #[error("No route for {verb} {path}")]
    RouteNotFound { verb: String, path: String },
}

/// 框架错误
///
/// 覆盖启动（解析、注册、路由构建）和请求处理两个阶段
#[derive(Debug, Error)]
pub enum FrameworkError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),

    #[error(transparent)]
    Routing(#[from] RoutingError),

    /// 处理方法执行失败
    #[error("Request handling failed in '{handler}': {cause}")]
    RequestHandlingFailed {
        handler: String,
        suggested_status: StatusCode,
        #[source]
        cause: BoxError,
    },
}

impl From<ContainerError> for FrameworkError {
    fn from(error: ContainerError) -> Self {
        match error {
            ContainerError::Resolution(e) => FrameworkError::Resolution(e),
            ContainerError::Registration(e) => FrameworkError::Registration(e),
        }
    }
}

/// 应用启动错误
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error(transparent)]
    Boot(#[from] FrameworkError),

    #[error("Failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

pub type FrameworkResult<T> = std::result::Result<T, FrameworkError>;
