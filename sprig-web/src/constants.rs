//! Web 配置常量定义
//!
//! 定义 Web 层使用的配置键名称

// ==================== Server 配置 ====================

/// 服务器监听地址
pub const SERVER_HOST: &str = "server.host";

/// 服务器监听端口
pub const SERVER_PORT: &str = "server.port";

/// 是否启用请求日志
pub const SERVER_ENABLE_REQUEST_LOGGING: &str = "server.enable-request-logging";

/// 默认监听地址
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// 默认监听端口
pub const DEFAULT_PORT: u16 = 8080;

/// 请求 ID 头
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";
