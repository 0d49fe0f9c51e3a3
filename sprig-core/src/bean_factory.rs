//! Bean Factory - 核心容器接口
//!
//! 参考 Spring 的 BeanFactory 架构设计。注册表在构建完成后不可变，
//! 读操作无需加锁，可以在多个线程间共享。

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::{
    candidate::Instance,
    error::RegistrationError,
    resolver::{ResolvedBean, ResolvedGraph},
    tag::Tag,
    type_ref::TypeRef,
    utils::naming::to_camel_case,
};

/// BeanFactory - 最基础的容器接口
///
/// 注意：此 trait 不包含泛型方法，因此可以作为 trait object 使用
pub trait BeanFactory: Send + Sync {
    /// 通过类型获取 Bean
    fn get_bean(&self, type_ref: &TypeRef) -> Option<Instance>;

    /// 检查是否包含指定类型的 Bean
    fn contains_bean(&self, type_ref: &TypeRef) -> bool {
        self.get_bean(type_ref).is_some()
    }
}

/// BeanFactoryExt - BeanFactory 的扩展 trait
///
/// 提供泛型方法，不能作为 trait object 使用
pub trait BeanFactoryExt: BeanFactory {
    /// 通过类型获取 Bean
    fn get_bean_by_type<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.get_bean(&TypeRef::of::<T>())?.downcast::<T>().ok()
    }

    /// 检查是否包含指定类型的 Bean
    fn contains_bean_by_type<T: Any + Send + Sync>(&self) -> bool {
        self.contains_bean(&TypeRef::of::<T>())
    }
}

impl<F: BeanFactory + ?Sized> BeanFactoryExt for F {}

/// ListableBeanFactory - 可列举的 Bean 工厂
pub trait ListableBeanFactory: BeanFactory {
    /// 获取携带指定标记（含元标记）的所有 Bean 类型，按类型名排序
    fn get_beans_with_tag(&self, tag: &Tag) -> Vec<TypeRef>;

    /// 获取所有 Bean 类型，按类型名排序
    fn get_bean_types(&self) -> Vec<TypeRef>;

    /// 获取可以注入为 `type_ref` 的所有 Bean 类型
    fn get_bean_types_for(&self, type_ref: &TypeRef) -> Vec<TypeRef>;

    /// 获取 Bean 的数量
    fn get_bean_count(&self) -> usize;
}

/// 已注册的 Bean
struct RegisteredBean {
    instance: Instance,
    tags: Vec<Tag>,
    exposed_types: Vec<TypeRef>,
}

impl From<ResolvedBean> for RegisteredBean {
    fn from(bean: ResolvedBean) -> Self {
        Self {
            instance: Instance::clone(bean.instance()),
            tags: bean.tags().to_vec(),
            exposed_types: bean.exposed_types().to_vec(),
        }
    }
}

/// BeanRegistry - BeanFactory 的默认实现
///
/// 通过 [`BeanRegistryBuilder`] 一次性装入，之后只读
pub struct BeanRegistry {
    beans: HashMap<TypeRef, RegisteredBean>,
}

impl BeanRegistry {
    /// 创建构建器
    pub fn builder() -> BeanRegistryBuilder {
        BeanRegistryBuilder::default()
    }

    /// 用一个解析结果直接构建注册表
    pub fn register(graph: ResolvedGraph) -> Result<Self, RegistrationError> {
        let mut builder = Self::builder();
        builder.register(graph)?;
        Ok(builder.build())
    }

    /// 所有 Bean 的名称（类型简单名的 camelCase 形式）
    pub fn bean_names(&self) -> Vec<String> {
        self.get_bean_types()
            .iter()
            .map(|t| to_camel_case(t.simple_name()))
            .collect()
    }

    /// 获取 Bean 的标记
    pub fn tags_of(&self, type_ref: &TypeRef) -> Option<&[Tag]> {
        self.beans.get(type_ref).map(|b| b.tags.as_slice())
    }

    fn sorted_types<P>(&self, predicate: P) -> Vec<TypeRef>
    where
        P: Fn(&RegisteredBean) -> bool,
    {
        let mut types: Vec<TypeRef> = self
            .beans
            .iter()
            .filter(|(_, bean)| predicate(bean))
            .map(|(type_ref, _)| *type_ref)
            .collect();
        types.sort();
        types
    }
}

impl BeanFactory for BeanRegistry {
    fn get_bean(&self, type_ref: &TypeRef) -> Option<Instance> {
        self.beans.get(type_ref).map(|b| Instance::clone(&b.instance))
    }

    fn contains_bean(&self, type_ref: &TypeRef) -> bool {
        self.beans.contains_key(type_ref)
    }
}

impl ListableBeanFactory for BeanRegistry {
    fn get_beans_with_tag(&self, tag: &Tag) -> Vec<TypeRef> {
        self.sorted_types(|bean| crate::tag::carries(&bean.tags, tag))
    }

    fn get_bean_types(&self) -> Vec<TypeRef> {
        self.sorted_types(|_| true)
    }

    fn get_bean_types_for(&self, type_ref: &TypeRef) -> Vec<TypeRef> {
        self.sorted_types(|bean| bean.exposed_types.contains(type_ref))
    }

    fn get_bean_count(&self) -> usize {
        self.beans.len()
    }
}

impl std::fmt::Debug for BeanRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanRegistry")
            .field("beans", &self.get_bean_types())
            .finish()
    }
}

/// BeanRegistry 构建器
///
/// 可以多次 `register`，每次要么整体成功，要么不做任何修改
#[derive(Default)]
pub struct BeanRegistryBuilder {
    beans: HashMap<TypeRef, RegisteredBean>,
}

impl BeanRegistryBuilder {
    /// 装入一个解析结果
    ///
    /// 任何类型已存在时返回 `DuplicateBean`，此时构建器保持不变
    pub fn register(&mut self, graph: ResolvedGraph) -> Result<&mut Self, RegistrationError> {
        if let Some(duplicate) = graph.types().find(|t| self.beans.contains_key(t)) {
            tracing::warn!("Bean '{}' is already registered", duplicate);
            return Err(RegistrationError::DuplicateBean(duplicate));
        }

        for (type_ref, bean) in graph {
            tracing::debug!("Registering bean '{}'", type_ref);
            self.beans.insert(type_ref, bean.into());
        }
        Ok(self)
    }

    /// 当前已装入的数量
    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    /// 冻结为只读注册表
    pub fn build(self) -> BeanRegistry {
        tracing::debug!("Bean registry frozen with {} bean(s)", self.beans.len());
        BeanRegistry { beans: self.beans }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::CandidateType;
    use crate::constants::{COMPONENT, CONTROLLER, SERVICE};
    use crate::resolver::resolve;

    trait Greeter: Send + Sync {}

    struct HelloService;
    struct HelloController;
    struct Plain;

    impl Greeter for HelloService {}

    fn graph() -> ResolvedGraph {
        let candidates = vec![
            CandidateType::builder::<HelloService>()
                .tag(SERVICE)
                .provides::<dyn Greeter>(|it| it as Arc<dyn Greeter>)
                .constructor(|_| Ok(HelloService)),
            CandidateType::builder::<HelloController>()
                .tag(CONTROLLER)
                .constructor(|_| Ok(HelloController)),
            CandidateType::builder::<Plain>().constructor(|_| Ok(Plain)),
        ];
        resolve(&candidates).unwrap()
    }

    #[test]
    fn test_get_bean() {
        let registry = BeanRegistry::register(graph()).unwrap();

        assert_eq!(registry.get_bean_count(), 3);
        assert!(registry.get_bean(&TypeRef::of::<HelloService>()).is_some());
        assert!(registry.get_bean_by_type::<HelloController>().is_some());
        assert!(registry.contains_bean_by_type::<Plain>());
        assert!(registry.get_bean(&TypeRef::of::<String>()).is_none());
        // trait views are not registry keys
        assert!(!registry.contains_bean(&TypeRef::of::<dyn Greeter>()));
    }

    #[test]
    fn test_same_instance_on_every_read() {
        let registry = BeanRegistry::register(graph()).unwrap();
        let first = registry.get_bean_by_type::<HelloService>().unwrap();
        let second = registry.get_bean_by_type::<HelloService>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_get_beans_with_tag_honors_meta_tags() {
        let registry = BeanRegistry::register(graph()).unwrap();

        assert_eq!(
            registry.get_beans_with_tag(&CONTROLLER),
            vec![TypeRef::of::<HelloController>()]
        );
        let components = registry.get_beans_with_tag(&COMPONENT);
        assert_eq!(components.len(), 2);
        assert!(components.contains(&TypeRef::of::<HelloService>()));
        assert!(!components.contains(&TypeRef::of::<Plain>()));
    }

    #[test]
    fn test_get_bean_types_for_trait() {
        let registry = BeanRegistry::register(graph()).unwrap();
        assert_eq!(
            registry.get_bean_types_for(&TypeRef::of::<dyn Greeter>()),
            vec![TypeRef::of::<HelloService>()]
        );
    }

    #[test]
    fn test_bean_names() {
        let registry = BeanRegistry::register(graph()).unwrap();
        let names = registry.bean_names();
        assert!(names.contains(&"helloService".to_string()));
        assert!(names.contains(&"helloController".to_string()));
        assert!(names.contains(&"plain".to_string()));
    }

    #[test]
    fn test_duplicate_registration_is_rejected() {
        let mut builder = BeanRegistry::builder();
        builder.register(graph()).unwrap();
        assert_eq!(builder.len(), 3);

        match builder.register(graph()) {
            Err(RegistrationError::DuplicateBean(type_ref)) => {
                assert!(graph().contains(&type_ref));
            }
            Ok(_) => panic!("expected duplicate bean"),
        }
        assert_eq!(builder.len(), 3);
    }

    #[test]
    fn test_disjoint_graphs_can_be_combined() {
        struct Extra;
        let extra = resolve(&[CandidateType::builder::<Extra>().constructor(|_| Ok(Extra))]).unwrap();

        let mut builder = BeanRegistry::builder();
        builder.register(graph()).unwrap().register(extra).unwrap();
        let registry = builder.build();
        assert_eq!(registry.get_bean_count(), 4);
    }

    #[test]
    fn test_registry_is_shareable() {
        let registry = Arc::new(BeanRegistry::register(graph()).unwrap());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get_bean_by_type::<HelloService>().is_some())
            })
            .collect();
        for handle in handles {
            assert!(handle.join().unwrap());
        }
    }
}
