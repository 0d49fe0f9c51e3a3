use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::bean_factory::{BeanFactory, BeanFactoryExt, BeanRegistry, ListableBeanFactory};
use crate::candidate::{CandidateType, Instance};
use crate::component::{scan_components, Component};
use crate::config::{Environment, PropertySource};
use crate::error::ContainerResult;
use crate::resolver::DependencyResolver;
use crate::tag::Tag;
use crate::type_ref::TypeRef;

/// 应用上下文
///
/// 持有只读的 BeanRegistry 和 Environment，启动完成后可以在线程间共享
pub struct ApplicationContext {
    /// 应用名称
    name: String,

    /// Bean 注册表
    registry: Arc<BeanRegistry>,

    /// 配置环境
    environment: Arc<Environment>,
}

impl ApplicationContext {
    /// 创建构建器
    pub fn builder() -> ApplicationContextBuilder {
        ApplicationContextBuilder::new()
    }

    /// 应用名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 获取 Bean 注册表
    pub fn registry(&self) -> &Arc<BeanRegistry> {
        &self.registry
    }

    /// 获取 Environment
    pub fn environment(&self) -> &Arc<Environment> {
        &self.environment
    }

    /// 通过类型获取 Bean
    pub fn get_bean_by_type<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.registry.get_bean_by_type::<T>()
    }

    /// 获取所有 Bean 的名称
    pub fn get_bean_names(&self) -> Vec<String> {
        self.registry.bean_names()
    }
}

impl BeanFactory for ApplicationContext {
    fn get_bean(&self, type_ref: &TypeRef) -> Option<Instance> {
        self.registry.get_bean(type_ref)
    }

    fn contains_bean(&self, type_ref: &TypeRef) -> bool {
        self.registry.contains_bean(type_ref)
    }
}

impl ListableBeanFactory for ApplicationContext {
    fn get_beans_with_tag(&self, tag: &Tag) -> Vec<TypeRef> {
        self.registry.get_beans_with_tag(tag)
    }

    fn get_bean_types(&self) -> Vec<TypeRef> {
        self.registry.get_bean_types()
    }

    fn get_bean_types_for(&self, type_ref: &TypeRef) -> Vec<TypeRef> {
        self.registry.get_bean_types_for(type_ref)
    }

    fn get_bean_count(&self) -> usize {
        self.registry.get_bean_count()
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("name", &self.name)
            .field("beans", &self.registry.get_bean_count())
            .finish()
    }
}

/// ApplicationContext 构建器
///
/// 收集组件描述和配置源，`build` 时一次性完成解析和注册
pub struct ApplicationContextBuilder {
    name: String,
    candidates: BTreeMap<TypeRef, CandidateType>,
    scan: bool,
    environment: Environment,
}

impl ApplicationContextBuilder {
    pub fn new() -> Self {
        Self {
            name: "application".to_string(),
            candidates: BTreeMap::new(),
            scan: false,
            environment: Environment::new(),
        }
    }

    /// 设置应用名称
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// 添加组件描述，同一类型后添加的覆盖先添加的
    pub fn candidate(mut self, candidate: CandidateType) -> Self {
        self.add_candidate_mut(candidate);
        self
    }

    /// 批量添加组件描述
    pub fn candidates(mut self, candidates: impl IntoIterator<Item = CandidateType>) -> Self {
        for candidate in candidates {
            self.add_candidate_mut(candidate);
        }
        self
    }

    /// 添加实现了 Component 的类型
    pub fn component<T: Component>(self) -> Self {
        self.candidate(T::candidate())
    }

    /// 是否在构建时扫描 #[derive(Component)] 标记的类型
    pub fn scan_components(mut self, scan: bool) -> Self {
        self.scan = scan;
        self
    }

    /// 使用已准备好的配置环境，替换之前添加的配置源
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// 添加配置源
    pub fn add_property_source(self, source: Box<dyn PropertySource>) -> Self {
        self.environment.add_property_source(source);
        self
    }

    /// 添加配置源（可变引用版本）
    pub fn add_property_source_mut(&mut self, source: Box<dyn PropertySource>) {
        self.environment.add_property_source(source);
    }

    /// 设置激活的 profiles
    pub fn set_active_profiles(self, profiles: Vec<String>) -> Self {
        self.environment.set_active_profiles(profiles);
        self
    }

    fn add_candidate_mut(&mut self, candidate: CandidateType) {
        if let Some(previous) = self.candidates.insert(candidate.identity(), candidate) {
            tracing::debug!("Overriding component descriptor for '{}'", previous.identity());
        }
    }

    /// 构建 ApplicationContext
    ///
    /// 解析全部组件并装入注册表，任何一步失败都不会产出上下文
    pub fn build(self) -> ContainerResult<ApplicationContext> {
        let Self {
            name,
            mut candidates,
            scan,
            environment,
        } = self;

        if scan {
            for candidate in scan_components() {
                candidates.entry(candidate.identity()).or_insert(candidate);
            }
        }

        let candidates: Vec<CandidateType> = candidates.into_values().collect();
        tracing::info!("Resolving {} component(s) for '{}'", candidates.len(), name);

        let graph = DependencyResolver::resolve(&candidates).map_err(|e| {
            tracing::error!("Dependency resolution failed: {}", e);
            e
        })?;
        let registry = BeanRegistry::register(graph)?;

        tracing::info!(
            "ApplicationContext '{}' initialized with {} bean(s)",
            name,
            registry.get_bean_count()
        );

        Ok(ApplicationContext {
            name,
            registry: Arc::new(registry),
            environment: Arc::new(environment),
        })
    }
}

impl Default for ApplicationContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConfigValue, MapPropertySource};
    use crate::constants::{CONTROLLER, SERVICE};
    use crate::error::{ContainerError, ResolutionError};

    struct HelloService;
    struct HelloController {
        service: Arc<HelloService>,
    }

    impl Component for HelloService {
        fn candidate() -> CandidateType {
            CandidateType::builder::<Self>()
                .tag(SERVICE)
                .constructor(|_| Ok(HelloService))
        }
    }

    fn controller() -> CandidateType {
        CandidateType::builder::<HelloController>()
            .tag(CONTROLLER)
            .depends_on::<HelloService>()
            .constructor(|args| {
                Ok(HelloController {
                    service: args.next()?,
                })
            })
    }

    #[test]
    fn test_build_context() {
        let context = ApplicationContext::builder()
            .name("test")
            .component::<HelloService>()
            .candidate(controller())
            .add_property_source(Box::new(
                MapPropertySource::new("test").with_property("app.greeting", ConfigValue::String("hi".into())),
            ))
            .build()
            .unwrap();

        assert_eq!(context.name(), "test");
        assert_eq!(context.get_bean_count(), 2);
        let controller = context.get_bean_by_type::<HelloController>().unwrap();
        let service = context.get_bean_by_type::<HelloService>().unwrap();
        assert!(Arc::ptr_eq(&controller.service, &service));
        assert_eq!(
            context.get_beans_with_tag(&CONTROLLER),
            vec![TypeRef::of::<HelloController>()]
        );
        assert_eq!(
            context.environment().get_string("app.greeting").as_deref(),
            Some("hi")
        );

        let names = context.get_bean_names();
        assert!(names.contains(&"helloController".to_string()));
    }

    #[test]
    fn test_duplicate_candidates_are_merged() {
        let context = ApplicationContext::builder()
            .component::<HelloService>()
            .component::<HelloService>()
            .build()
            .unwrap();
        assert_eq!(context.get_bean_count(), 1);
    }

    #[test]
    fn test_failed_resolution_produces_no_context() {
        let result = ApplicationContext::builder().candidate(controller()).build();
        assert!(matches!(
            result,
            Err(ContainerError::Resolution(ResolutionError::MissingDependency { .. }))
        ));
    }
}
