//! Web 服务器模块
//!
//! 基于 Axum 的传输层：所有请求都落到 fallback，再交给同步的 [`Dispatcher`]

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, Method, Uri},
    middleware::from_fn,
    response::IntoResponse,
    Router,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use sprig_core::Environment;
use tokio::net::TcpListener;

use crate::constants::{
    DEFAULT_HOST, DEFAULT_PORT, SERVER_ENABLE_REQUEST_LOGGING, SERVER_HOST, SERVER_PORT,
};
use crate::dispatcher::Dispatcher;
use crate::error::StartupError;
use crate::middleware::{request_id, request_logging};
use crate::response::Response;

/// Web 服务器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerProperties {
    /// 服务器监听地址
    pub host: String,

    /// 服务器监听端口
    pub port: u16,

    /// 是否启用请求日志
    pub enable_request_logging: bool,
}

impl Default for ServerProperties {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            enable_request_logging: true,
        }
    }
}

impl ServerProperties {
    /// 从 Environment 加载配置
    pub fn from_environment(env: &Environment) -> Self {
        let port = match env.get_i64(SERVER_PORT) {
            Some(port) => u16::try_from(port).unwrap_or_else(|_| {
                tracing::warn!("Invalid {} '{}', using {}", SERVER_PORT, port, DEFAULT_PORT);
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        Self {
            host: env.get_string_or(SERVER_HOST, DEFAULT_HOST),
            port,
            enable_request_logging: env.get_bool_or(SERVER_ENABLE_REQUEST_LOGGING, true),
        }
    }

    /// 获取服务器地址
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let (status, body, headers) = self.into_parts();

        let mut header_map = HeaderMap::with_capacity(headers.len() + 1);
        for (name, value) in headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    header_map.insert(name, value);
                }
                _ => tracing::warn!("Skipping invalid response header '{}'", name),
            }
        }

        let bytes = match body {
            Some(body) => {
                if !header_map.contains_key(CONTENT_TYPE) {
                    header_map.insert(CONTENT_TYPE, HeaderValue::from_static(body.content_type()));
                }
                body.to_bytes()
            }
            None => Bytes::new(),
        };

        (status, header_map, bytes).into_response()
    }
}

/// 所有请求的入口，分发器在阻塞线程池中执行
async fn dispatch(
    State(dispatcher): State<Dispatcher>,
    method: Method,
    uri: Uri,
) -> axum::response::Response {
    let verb = method.as_str().to_string();
    let path = uri.path().to_string();

    match tokio::task::spawn_blocking(move || dispatcher.handle(&verb, &path)).await {
        Ok(response) => response.into_response(),
        Err(e) => {
            tracing::error!("Dispatch task failed: {}", e);
            Response::internal_error().into_response()
        }
    }
}

/// 构建 Axum 路由
pub fn router(dispatcher: Dispatcher, properties: &ServerProperties) -> Router {
    let mut router = Router::new()
        .fallback(dispatch)
        .with_state(dispatcher)
        .layer(from_fn(request_id));

    if properties.enable_request_logging {
        router = router.layer(from_fn(request_logging));
    }

    router
}

/// Sprig Web 服务器
pub struct WebServer {
    /// 服务器配置
    properties: ServerProperties,

    /// 请求分发器
    dispatcher: Dispatcher,
}

impl WebServer {
    /// 创建新的 Web 服务器
    pub fn new(properties: ServerProperties, dispatcher: Dispatcher) -> Self {
        Self {
            properties,
            dispatcher,
        }
    }

    pub fn properties(&self) -> &ServerProperties {
        &self.properties
    }

    /// 构建路由
    pub fn router(&self) -> Router {
        router(self.dispatcher.clone(), &self.properties)
    }

    /// 绑定监听地址
    pub async fn bind(&self) -> Result<TcpListener, StartupError> {
        let address = self.properties.address();
        TcpListener::bind(&address)
            .await
            .map_err(|source| StartupError::Bind { address, source })
    }

    /// 启动服务器
    pub async fn run(self) -> Result<(), StartupError> {
        tracing::info!("Starting Sprig web server on {}", self.properties.address());
        let listener = self.bind().await?;
        self.serve(listener).await
    }

    /// 在已绑定的监听器上提供服务
    pub async fn serve(self, listener: TcpListener) -> Result<(), StartupError> {
        if let Ok(local) = listener.local_addr() {
            tracing::info!("Server listening on http://{}", local);
        }

        let app = self.router().into_make_service();
        axum::serve(listener, app).await.map_err(StartupError::Serve)
    }
}
