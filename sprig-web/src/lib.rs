//! # Sprig Web
//!
//! 注解驱动的路由与请求分发，基于 Axum 提供 HTTP 传输
//!
//! ## 核心特性
//!
//! - **控制器扫描** - `#[controller]` 宏在编译期注册处理方法
//! - **路由表** - 启动时一次性构建，冲突直接报错
//! - **分发器** - 同步调用处理方法，失败统一转换为 500
//! - **中间件支持** - 请求日志与请求 ID

pub mod app;
pub mod constants;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod middleware;
pub mod response;
pub mod route_table;
pub mod server;

pub use app::{BootedApplication, SprigApplication};
pub use controller::{
    Controller, ControllerRegistration, HandlerCatalog, HandlerMethod, RequestMapping,
};
pub use dispatcher::Dispatcher;
pub use error::{FrameworkError, FrameworkResult, RoutingError, StartupError};
pub use response::{Body, IntoBody, IntoReply, Reply, Response, ResponseBuilder};
pub use route_table::{RouteEntry, RouteKey, RouteTable, RouteTableBuilder};
pub use server::{ServerProperties, WebServer};

// 供宏生成的代码使用
pub use inventory;
pub use sprig_core;

pub mod prelude {
    //! 预导入模块

    pub use crate::app::{BootedApplication, SprigApplication};
    pub use crate::controller::{Controller, RequestMapping};
    pub use crate::dispatcher::Dispatcher;
    pub use crate::error::{FrameworkError, RoutingError, StartupError};
    pub use crate::response::{Body, IntoReply, Response};
    pub use crate::server::{ServerProperties, WebServer};

    pub use http::StatusCode;
    pub use sprig_core::prelude::*;
}
