//! 路由表
//!
//! 从注册表中带控制器标记的 Bean 和它们的处理方法构建不可变的路由表，
//! 重复的 (方法, 路径) 会使构建失败

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;

use sprig_core::{Instance, ListableBeanFactory, Tag, TypeRef, CONTROLLER};

use crate::controller::{is_supported_verb, HandlerCatalog, HandlerMethod, SUPPORTED_VERBS};
use crate::error::RoutingError;
use crate::response::Reply;

/// 路由键：(HTTP 方法, 路径)
///
/// 方法统一为大写，路径精确匹配、区分大小写
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey {
    verb: String,
    path: String,
}

impl RouteKey {
    pub fn new(verb: &str, path: impl Into<String>) -> Self {
        Self {
            verb: verb.to_ascii_uppercase(),
            path: path.into(),
        }
    }

    pub fn verb(&self) -> &str {
        &self.verb
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.verb, self.path)
    }
}

/// 路由条目：控制器实例和要调用的处理方法
#[derive(Clone)]
pub struct RouteEntry {
    key: RouteKey,
    owner: TypeRef,
    instance: Instance,
    method: HandlerMethod,
}

impl RouteEntry {
    pub fn key(&self) -> &RouteKey {
        &self.key
    }

    pub fn owner(&self) -> TypeRef {
        self.owner
    }

    pub fn method(&self) -> &HandlerMethod {
        &self.method
    }

    pub fn handler_name(&self) -> String {
        self.method.qualified_name()
    }

    /// 在控制器实例上调用处理方法
    pub fn invoke(&self) -> anyhow::Result<Reply> {
        self.method.invoke(&self.instance)
    }
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("key", &self.key)
            .field("handler", &self.handler_name())
            .finish()
    }
}

/// 不可变路由表
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<RouteKey, RouteEntry>,
}

impl RouteTable {
    /// 查找路由
    pub fn lookup(&self, verb: &str, path: &str) -> Result<&RouteEntry, RoutingError> {
        self.routes
            .get(&RouteKey::new(verb, path))
            .ok_or_else(|| RoutingError::RouteNotFound {
                verb: verb.to_ascii_uppercase(),
                path: path.to_string(),
            })
    }

    pub fn contains(&self, verb: &str, path: &str) -> bool {
        self.routes.contains_key(&RouteKey::new(verb, path))
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// 所有路由，按 (方法, 路径) 排序
    pub fn routes(&self) -> Vec<&RouteEntry> {
        let mut entries: Vec<&RouteEntry> = self.routes.values().collect();
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        entries
    }
}

/// 路由表构建器
pub struct RouteTableBuilder<'a, F: ListableBeanFactory + ?Sized> {
    factory: &'a F,
    catalog: &'a HandlerCatalog,
    controller_tag: Tag,
}

impl<'a, F: ListableBeanFactory + ?Sized> RouteTableBuilder<'a, F> {
    pub fn new(factory: &'a F, catalog: &'a HandlerCatalog) -> Self {
        Self {
            factory,
            catalog,
            controller_tag: CONTROLLER,
        }
    }

    /// 设置控制器标记（默认 `CONTROLLER`）
    pub fn controller_tag(mut self, tag: Tag) -> Self {
        self.controller_tag = tag;
        self
    }

    /// 构建路由表
    ///
    /// 控制器按类型名顺序处理，第一个非法映射或冲突即终止
    pub fn build(self) -> Result<RouteTable, RoutingError> {
        let mut routes: HashMap<RouteKey, RouteEntry> = HashMap::new();

        for owner in self.factory.get_beans_with_tag(&self.controller_tag) {
            let instance = self
                .factory
                .get_bean(&owner)
                .ok_or(RoutingError::ControllerBeanNotFound(owner))?;

            let handlers = self.catalog.handlers_for(&owner);
            if handlers.is_empty() {
                tracing::warn!("Controller '{}' declares no request mappings", owner);
            }

            for method in handlers {
                validate(method)?;
                let key = RouteKey::new(method.verb(), method.path());
                match routes.entry(key) {
                    Entry::Occupied(existing) => {
                        let existing = existing.get();
                        return Err(RoutingError::RouteCollision {
                            verb: existing.key.verb.clone(),
                            path: existing.key.path.clone(),
                            existing_handler: existing.handler_name(),
                            new_handler: method.qualified_name(),
                        });
                    }
                    Entry::Vacant(slot) => {
                        let key = slot.key().clone();
                        tracing::info!("Mapped {} onto {}", key, method.qualified_name());
                        slot.insert(RouteEntry {
                            key,
                            owner,
                            instance: Instance::clone(&instance),
                            method: method.clone(),
                        });
                    }
                }
            }
        }

        Ok(RouteTable { routes })
    }
}

/// 检查处理方法能否被分发：方法受支持，路径以 `/` 开头
fn validate(method: &HandlerMethod) -> Result<(), RoutingError> {
    let reason = if !is_supported_verb(method.verb()) {
        format!(
            "unsupported HTTP method '{}', expected one of {}",
            method.verb(),
            SUPPORTED_VERBS.join(", ")
        )
    } else if !method.path().starts_with('/') {
        format!("path '{}' must start with '/'", method.path())
    } else {
        return Ok(());
    };

    Err(RoutingError::InvalidRouteDefinition {
        handler: method.qualified_name(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{join_path, Controller, RequestMapping};
    use crate::response::{IntoReply, Response};
    use sprig_core::{resolve, BeanFactory, BeanRegistry, CandidateType, COMPONENT};
    use std::sync::Arc;

    struct HelloController;
    struct OtherController;
    struct ConflictingController;
    struct DuplicateController;
    struct UnknownVerbController;
    struct RelativePathController;
    struct Helper;

    impl HelloController {
        fn hello(&self) -> &'static str {
            "hello"
        }

        fn conflict(&self) -> Response {
            Response::ok("first")
        }
    }

    impl ConflictingController {
        fn conflict(&self) -> &'static str {
            "second"
        }
    }

    impl Controller for HelloController {
        fn request_mappings() -> Vec<RequestMapping<Self>> {
            vec![
                RequestMapping::new("GET", "/hello", "hello", |this: &Self| this.hello().into_reply()),
                RequestMapping::new("get", "/conflict", "conflict", |this: &Self| this.conflict().into_reply()),
            ]
        }
    }

    impl Controller for OtherController {
        fn request_mappings() -> Vec<RequestMapping<Self>> {
            vec![RequestMapping::new(
                "POST",
                join_path("/other", "/hello"),
                "hello",
                |_: &Self| "other".into_reply(),
            )]
        }
    }

    impl Controller for ConflictingController {
        fn request_mappings() -> Vec<RequestMapping<Self>> {
            vec![RequestMapping::new(
                "GET",
                "/conflict",
                "conflict",
                |this: &Self| this.conflict().into_reply(),
            )]
        }
    }

    impl Controller for DuplicateController {
        fn request_mappings() -> Vec<RequestMapping<Self>> {
            vec![
                RequestMapping::new("GET", "/x", "first", |_: &Self| "first".into_reply()),
                RequestMapping::new("GET", "/x", "second", |_: &Self| "second".into_reply()),
            ]
        }
    }

    impl Controller for UnknownVerbController {
        fn request_mappings() -> Vec<RequestMapping<Self>> {
            vec![RequestMapping::new("FROB", "/frob", "frob", |_: &Self| ().into_reply())]
        }
    }

    impl Controller for RelativePathController {
        fn request_mappings() -> Vec<RequestMapping<Self>> {
            vec![RequestMapping::new("GET", "hello", "hello", |_: &Self| "hello".into_reply())]
        }
    }

    fn controller<T: Send + Sync + 'static>(make: fn() -> T) -> CandidateType {
        CandidateType::builder::<T>()
            .tag(CONTROLLER)
            .constructor(move |_| Ok(make()))
    }

    fn catalog() -> HandlerCatalog {
        let mut catalog = HandlerCatalog::new();
        catalog
            .register::<HelloController>()
            .register::<OtherController>()
            .register::<ConflictingController>();
        catalog
    }

    fn registry(candidates: Vec<CandidateType>) -> BeanRegistry {
        BeanRegistry::register(resolve(&candidates).unwrap()).unwrap()
    }

    #[test]
    fn test_build_route_table() {
        let registry = registry(vec![
            controller(|| HelloController),
            controller(|| OtherController),
            CandidateType::builder::<Helper>().tag(COMPONENT).constructor(|_| Ok(Helper)),
        ]);
        let catalog = catalog();
        let table = RouteTableBuilder::new(&registry, &catalog).build().unwrap();

        assert_eq!(table.len(), 3);
        assert!(table.contains("GET", "/hello"));
        assert!(table.contains("get", "/conflict"));
        assert!(table.contains("POST", "/other/hello"));
        assert!(!table.contains("GET", "/other/hello"));

        let entry = table.lookup("GET", "/hello").unwrap();
        assert_eq!(entry.owner(), TypeRef::of::<HelloController>());
        assert_eq!(entry.handler_name(), "HelloController::hello");
        let response = entry.invoke().unwrap().into_response();
        assert_eq!(response.body_text().as_deref(), Some("hello"));
    }

    #[test]
    fn test_paths_are_case_sensitive() {
        let registry = registry(vec![controller(|| HelloController)]);
        let catalog = catalog();
        let table = RouteTableBuilder::new(&registry, &catalog).build().unwrap();

        assert!(table.lookup("GET", "/Hello").is_err());
        match table.lookup("delete", "/hello") {
            Err(RoutingError::RouteNotFound { verb, path }) => {
                assert_eq!(verb, "DELETE");
                assert_eq!(path, "/hello");
            }
            other => panic!("expected route not found, got {:?}", other),
        }
    }

    #[test]
    fn test_route_collision() {
        let registry = registry(vec![
            controller(|| HelloController),
            controller(|| ConflictingController),
        ]);
        let catalog = catalog();

        match RouteTableBuilder::new(&registry, &catalog).build() {
            Err(RoutingError::RouteCollision {
                verb,
                path,
                existing_handler,
                new_handler,
            }) => {
                assert_eq!(verb, "GET");
                assert_eq!(path, "/conflict");
                // controllers are visited in type-name order
                assert_eq!(existing_handler, "ConflictingController::conflict");
                assert_eq!(new_handler, "HelloController::conflict");
            }
            other => panic!("expected route collision, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_collision_within_one_controller() {
        let registry = registry(vec![controller(|| DuplicateController)]);
        let mut catalog = HandlerCatalog::new();
        catalog.register::<DuplicateController>();

        match RouteTableBuilder::new(&registry, &catalog).build() {
            Err(RoutingError::RouteCollision {
                verb,
                path,
                existing_handler,
                new_handler,
            }) => {
                assert_eq!(verb, "GET");
                assert_eq!(path, "/x");
                assert_eq!(existing_handler, "DuplicateController::first");
                assert_eq!(new_handler, "DuplicateController::second");
            }
            other => panic!("expected route collision, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_unsupported_verb_is_rejected() {
        let registry = registry(vec![controller(|| UnknownVerbController)]);
        let mut catalog = HandlerCatalog::new();
        catalog.register::<UnknownVerbController>();

        match RouteTableBuilder::new(&registry, &catalog).build() {
            Err(RoutingError::InvalidRouteDefinition { handler, reason }) => {
                assert_eq!(handler, "UnknownVerbController::frob");
                assert!(reason.contains("FROB"), "{}", reason);
            }
            other => panic!("expected invalid route, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_relative_path_is_rejected() {
        let registry = registry(vec![controller(|| RelativePathController)]);
        let mut catalog = HandlerCatalog::new();
        catalog.register::<RelativePathController>();

        match RouteTableBuilder::new(&registry, &catalog).build() {
            Err(RoutingError::InvalidRouteDefinition { handler, reason }) => {
                assert_eq!(handler, "RelativePathController::hello");
                assert!(reason.contains("'hello'"), "{}", reason);
            }
            other => panic!("expected invalid route, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_joined_paths_are_reachable() {
        struct BareController;

        impl Controller for BareController {
            fn request_mappings() -> Vec<RequestMapping<Self>> {
                vec![RequestMapping::new("GET", join_path("", "hello"), "hello", |_: &Self| {
                    "bare".into_reply()
                })]
            }
        }

        let registry = registry(vec![controller(|| BareController)]);
        let mut catalog = HandlerCatalog::new();
        catalog.register::<BareController>();
        let table = RouteTableBuilder::new(&registry, &catalog).build().unwrap();

        assert!(table.contains("GET", "/hello"));
    }

    /// Factory reporting a controller type it holds no instance for.
    struct TaggedButEmpty;

    impl BeanFactory for TaggedButEmpty {
        fn get_bean(&self, _type_ref: &TypeRef) -> Option<Instance> {
            None
        }
    }

    impl ListableBeanFactory for TaggedButEmpty {
        fn get_beans_with_tag(&self, tag: &Tag) -> Vec<TypeRef> {
            if tag.implies(&CONTROLLER) {
                vec![TypeRef::of::<HelloController>()]
            } else {
                Vec::new()
            }
        }

        fn get_bean_types(&self) -> Vec<TypeRef> {
            vec![TypeRef::of::<HelloController>()]
        }

        fn get_bean_types_for(&self, _type_ref: &TypeRef) -> Vec<TypeRef> {
            Vec::new()
        }

        fn get_bean_count(&self) -> usize {
            1
        }
    }

    #[test]
    fn test_controller_bean_not_found() {
        let catalog = catalog();
        match RouteTableBuilder::new(&TaggedButEmpty, &catalog).build() {
            Err(RoutingError::ControllerBeanNotFound(type_ref)) => {
                assert_eq!(type_ref, TypeRef::of::<HelloController>());
            }
            other => panic!("expected missing controller bean, got {:?}", other.map(|t| t.len())),
        }
    }

    #[test]
    fn test_custom_controller_tag() {
        const API: Tag = Tag::annotated("api", &[CONTROLLER]);

        let registry = registry(vec![
            CandidateType::builder::<HelloController>()
                .tag(API)
                .constructor(|_| Ok(HelloController)),
            controller(|| OtherController),
        ]);
        let catalog = catalog();
        let table = RouteTableBuilder::new(&registry, &catalog)
            .controller_tag(API)
            .build()
            .unwrap();

        assert_eq!(table.len(), 2);
        assert!(!table.contains("POST", "/other/hello"));
    }

    #[test]
    fn test_controller_without_mappings_contributes_nothing() {
        let registry = registry(vec![controller(|| Helper)]);
        let table = RouteTableBuilder::new(&registry, &HandlerCatalog::new())
            .build()
            .unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_routes_are_listed_in_order() {
        let registry = registry(vec![
            controller(|| HelloController),
            controller(|| OtherController),
        ]);
        let catalog = catalog();
        let table = RouteTableBuilder::new(&registry, &catalog).build().unwrap();

        let keys: Vec<String> = table.routes().iter().map(|e| e.key().to_string()).collect();
        assert_eq!(keys, vec!["GET /conflict", "GET /hello", "POST /other/hello"]);
    }

    #[test]
    fn test_route_table_is_shareable() {
        let registry = registry(vec![controller(|| HelloController)]);
        let catalog = catalog();
        let table = Arc::new(RouteTableBuilder::new(&registry, &catalog).build().unwrap());

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let table = Arc::clone(&table);
                std::thread::spawn(move || table.lookup("GET", "/hello").is_ok())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
