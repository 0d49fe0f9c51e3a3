//! 控制器支持
//!
//! 提供类似 Spring MVC 的控制器元数据：每个控制器声明若干个无参处理方法，
//! 每个方法绑定一个 HTTP 方法和路径

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use anyhow::anyhow;
use sprig_core::{Instance, TypeRef};

use crate::response::Reply;

/// 支持的 HTTP 方法
pub const SUPPORTED_VERBS: &[&str] = &["GET", "POST", "PUT", "DELETE", "PATCH"];

/// 单个请求映射
///
/// 由 `#[controller]` 宏为每个 `#[get_mapping]`、`#[post_mapping]` 等方法生成
pub struct RequestMapping<T> {
    verb: &'static str,
    path: String,
    method_name: &'static str,
    handler: fn(&T) -> anyhow::Result<Reply>,
}

impl<T> RequestMapping<T> {
    pub fn new(
        verb: &'static str,
        path: impl Into<String>,
        method_name: &'static str,
        handler: fn(&T) -> anyhow::Result<Reply>,
    ) -> Self {
        Self {
            verb,
            path: path.into(),
            method_name,
            handler,
        }
    }

    pub fn verb(&self) -> &'static str {
        self.verb
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method_name(&self) -> &'static str {
        self.method_name
    }
}

/// 控制器 trait
///
/// 通常由 `#[controller]` 宏在 impl 块上自动实现
pub trait Controller: Any + Send + Sync + Sized {
    /// 所有请求映射
    fn request_mappings() -> Vec<RequestMapping<Self>>;

    /// 擦除类型后的处理方法
    fn handler_methods() -> Vec<HandlerMethod> {
        Self::request_mappings()
            .into_iter()
            .map(HandlerMethod::from_mapping)
            .collect()
    }
}

type InvokeFn = dyn Fn(&Instance) -> anyhow::Result<Reply> + Send + Sync;

/// 擦除了控制器类型的处理方法
#[derive(Clone)]
pub struct HandlerMethod {
    owner: TypeRef,
    verb: &'static str,
    path: String,
    method_name: &'static str,
    invoke: Arc<InvokeFn>,
}

impl HandlerMethod {
    /// 从类型化的映射创建
    pub fn from_mapping<T: Any + Send + Sync>(mapping: RequestMapping<T>) -> Self {
        let handler = mapping.handler;
        Self {
            owner: TypeRef::of::<T>(),
            verb: mapping.verb,
            path: mapping.path,
            method_name: mapping.method_name,
            invoke: Arc::new(move |instance: &Instance| {
                let controller = instance
                    .downcast_ref::<T>()
                    .ok_or_else(|| anyhow!("bean is not an instance of '{}'", type_name::<T>()))?;
                handler(controller)
            }),
        }
    }

    pub fn owner(&self) -> TypeRef {
        self.owner
    }

    pub fn verb(&self) -> &'static str {
        self.verb
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method_name(&self) -> &'static str {
        self.method_name
    }

    /// `Controller::method` 形式的名称，用于日志和错误信息
    pub fn qualified_name(&self) -> String {
        format!("{}::{}", self.owner.simple_name(), self.method_name)
    }

    /// 在控制器实例上调用
    pub fn invoke(&self, instance: &Instance) -> anyhow::Result<Reply> {
        (self.invoke)(instance)
    }
}

impl fmt::Debug for HandlerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMethod")
            .field("verb", &self.verb)
            .field("path", &self.path)
            .field("handler", &self.qualified_name())
            .finish()
    }
}

/// 控制器注册信息
///
/// 用于自动发现控制器的处理方法
pub struct ControllerRegistration {
    /// 控制器类型名称
    pub type_name: &'static str,

    /// 控制器类型
    pub type_ref: fn() -> TypeRef,

    /// 处理方法列表
    pub handlers: fn() -> Vec<HandlerMethod>,
}

// 使用 inventory 收集所有控制器
sprig_core::inventory::collect!(ControllerRegistration);

/// 获取所有注册的控制器
pub fn get_all_controllers() -> impl Iterator<Item = &'static ControllerRegistration> {
    sprig_core::inventory::iter::<ControllerRegistration>()
}

/// 控制器类型到处理方法的目录
///
/// 路由表构建时按控制器类型查找处理方法
#[derive(Debug, Clone, Default)]
pub struct HandlerCatalog {
    handlers: HashMap<TypeRef, Vec<HandlerMethod>>,
}

impl HandlerCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 收集所有通过 `#[controller]` 注册的控制器
    pub fn scan() -> Self {
        let mut catalog = Self::new();
        for registration in get_all_controllers() {
            tracing::debug!("Discovered controller '{}'", registration.type_name);
            catalog.insert((registration.type_ref)(), (registration.handlers)());
        }
        catalog
    }

    /// 注册一个控制器类型
    pub fn register<T: Controller>(&mut self) -> &mut Self {
        self.insert(TypeRef::of::<T>(), T::handler_methods());
        self
    }

    /// 直接注册处理方法
    pub fn insert(&mut self, owner: TypeRef, handlers: Vec<HandlerMethod>) {
        self.handlers.insert(owner, handlers);
    }

    /// 合并另一个目录，同一控制器以 `other` 为准
    pub fn merge(&mut self, other: HandlerCatalog) {
        self.handlers.extend(other.handlers);
    }

    /// 控制器的处理方法
    pub fn handlers_for(&self, owner: &TypeRef) -> &[HandlerMethod] {
        self.handlers.get(owner).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, owner: &TypeRef) -> bool {
        self.handlers.contains_key(owner)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// 拼接控制器基础路径和方法路径
///
/// 结果总是以 `/` 开头
pub fn join_path(base: &str, path: &str) -> String {
    let base = base.trim_matches('/');
    let path = path.trim_start_matches('/');

    let mut joined = String::with_capacity(base.len() + path.len() + 2);
    joined.push('/');
    joined.push_str(base);
    if !base.is_empty() && !path.is_empty() {
        joined.push('/');
    }
    joined.push_str(path);
    joined
}

/// HTTP 方法是否在 [`SUPPORTED_VERBS`] 中（不区分大小写）
pub fn is_supported_verb(verb: &str) -> bool {
    SUPPORTED_VERBS.iter().any(|v| v.eq_ignore_ascii_case(verb))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::IntoReply;

    struct PingController {
        reply: &'static str,
    }

    impl PingController {
        fn ping(&self) -> &'static str {
            self.reply
        }
    }

    impl Controller for PingController {
        fn request_mappings() -> Vec<RequestMapping<Self>> {
            vec![RequestMapping::new(
                "GET",
                join_path("/api", "/ping"),
                "ping",
                |this: &Self| this.ping().into_reply(),
            )]
        }
    }

    #[test]
    fn test_handler_methods_are_erased() {
        let handlers = PingController::handler_methods();
        assert_eq!(handlers.len(), 1);

        let handler = &handlers[0];
        assert_eq!(handler.verb(), "GET");
        assert_eq!(handler.path(), "/api/ping");
        assert_eq!(handler.owner(), TypeRef::of::<PingController>());
        assert_eq!(handler.qualified_name(), "PingController::ping");

        let instance: Instance = Arc::new(PingController { reply: "pong" });
        let response = handler.invoke(&instance).unwrap().into_response();
        assert_eq!(response.body_text().as_deref(), Some("pong"));
    }

    #[test]
    fn test_invoke_on_wrong_instance_fails() {
        let handler = &PingController::handler_methods()[0];
        let instance: Instance = Arc::new(7u8);
        assert!(handler.invoke(&instance).is_err());
    }

    #[test]
    fn test_catalog() {
        let mut catalog = HandlerCatalog::new();
        catalog.register::<PingController>();

        assert!(catalog.contains(&TypeRef::of::<PingController>()));
        assert_eq!(catalog.handlers_for(&TypeRef::of::<PingController>()).len(), 1);
        assert!(catalog.handlers_for(&TypeRef::of::<String>()).is_empty());
    }

    #[test]
    fn test_join_path() {
        assert_eq!(join_path("", "/hello"), "/hello");
        assert_eq!(join_path("/api", "/hello"), "/api/hello");
        assert_eq!(join_path("/api/", "hello"), "/api/hello");
        assert_eq!(join_path("/api", ""), "/api");
        assert_eq!(join_path("", "hello"), "/hello");
        assert_eq!(join_path("api", "hello/"), "/api/hello/");
        assert_eq!(join_path("", ""), "/");
    }

    #[test]
    fn test_supported_verbs() {
        assert!(is_supported_verb("GET"));
        assert!(is_supported_verb("patch"));
        assert!(!is_supported_verb("FROB"));
        assert!(!is_supported_verb(""));
    }
}
