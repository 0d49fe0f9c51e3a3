//! CandidateType - 组件描述
//!
//! 扫描阶段产出的组件元数据：身份类型、构造参数、标记、可注入的父类型视图
//! 以及构造函数。描述一经构建即不可变。

use std::any::{type_name, Any};
use std::collections::VecDeque;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use anyhow::anyhow;

use crate::tag::{self, Tag};
use crate::type_ref::TypeRef;

/// 容器中的实例句柄
pub type Instance = Arc<dyn Any + Send + Sync>;

type ConstructorFn = dyn Fn(&mut Arguments) -> anyhow::Result<Instance> + Send + Sync;
type UpcastFn = dyn Fn(&Instance) -> Option<Instance> + Send + Sync;

/// 组件可以被注入为的类型，以及从实例得到对应视图的方式
#[derive(Clone)]
struct Exposure {
    type_ref: TypeRef,
    upcast: Arc<UpcastFn>,
}

/// 组件描述
#[derive(Clone)]
pub struct CandidateType {
    identity: TypeRef,
    constructor_params: Vec<TypeRef>,
    tags: Vec<Tag>,
    exposures: Vec<Exposure>,
    constructor: Arc<ConstructorFn>,
}

impl CandidateType {
    /// 为类型 `T` 创建描述构建器
    pub fn builder<T: Any + Send + Sync>() -> CandidateBuilder<T> {
        CandidateBuilder::new()
    }

    /// 组件自身的类型
    pub fn identity(&self) -> TypeRef {
        self.identity
    }

    /// 构造参数类型（按声明顺序）
    pub fn constructor_params(&self) -> &[TypeRef] {
        &self.constructor_params
    }

    /// 组件上的标记
    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    /// 是否携带（包括通过元标记携带）指定标记
    pub fn carries(&self, tag: &Tag) -> bool {
        tag::carries(&self.tags, tag)
    }

    /// 组件可被注入为的所有类型，第一个总是自身类型
    pub fn exposed_types(&self) -> impl Iterator<Item = TypeRef> + '_ {
        self.exposures.iter().map(|e| e.type_ref)
    }

    /// 是否可以满足对 `type_ref` 的依赖
    pub fn is_assignable_to(&self, type_ref: &TypeRef) -> bool {
        self.exposures.iter().any(|e| e.type_ref == *type_ref)
    }

    /// 把实例转换为 `as_type` 视图，用于注入
    pub(crate) fn view(&self, instance: &Instance, as_type: &TypeRef) -> Option<Instance> {
        self.exposures
            .iter()
            .find(|e| e.type_ref == *as_type)
            .and_then(|e| (e.upcast)(instance))
    }

    /// 调用构造函数
    pub(crate) fn construct(&self, args: &mut Arguments) -> anyhow::Result<Instance> {
        (self.constructor)(args)
    }
}

impl PartialEq for CandidateType {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for CandidateType {}

impl Hash for CandidateType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Debug for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CandidateType")
            .field("identity", &self.identity)
            .field("constructor_params", &self.constructor_params)
            .field("tags", &self.tags)
            .field("exposed_types", &self.exposed_types().collect::<Vec<_>>())
            .finish()
    }
}

/// CandidateType 构建器
///
/// ```
/// use std::sync::Arc;
/// use sprig_core::{CandidateType, SERVICE};
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct Repository;
/// struct HelloService {
///     repository: Arc<Repository>,
/// }
///
/// impl Greeter for HelloService {
///     fn greet(&self) -> String {
///         "hello".to_string()
///     }
/// }
///
/// let candidate = CandidateType::builder::<HelloService>()
///     .tag(SERVICE)
///     .depends_on::<Repository>()
///     .provides::<dyn Greeter>(|it| it as Arc<dyn Greeter>)
///     .constructor(|args| {
///         Ok(HelloService {
///             repository: args.next::<Repository>()?,
///         })
///     });
///
/// assert_eq!(candidate.constructor_params().len(), 1);
/// ```
pub struct CandidateBuilder<T> {
    identity: TypeRef,
    constructor_params: Vec<TypeRef>,
    tags: Vec<Tag>,
    exposures: Vec<Exposure>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> CandidateBuilder<T> {
    fn new() -> Self {
        let identity = Exposure {
            type_ref: TypeRef::of::<T>(),
            upcast: Arc::new(|instance: &Instance| {
                let concrete = Arc::clone(instance).downcast::<T>().ok()?;
                Some(Arc::new(concrete) as Instance)
            }),
        };
        Self {
            identity: TypeRef::of::<T>(),
            constructor_params: Vec::new(),
            tags: Vec::new(),
            exposures: vec![identity],
            _marker: PhantomData,
        }
    }

    /// 追加一个构造参数
    pub fn depends_on<D: ?Sized + 'static>(mut self) -> Self {
        self.constructor_params.push(TypeRef::of::<D>());
        self
    }

    /// 追加一个标记
    pub fn tag(mut self, tag: Tag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// 声明组件可以注入为 `I`（通常是 trait object）
    pub fn provides<I: ?Sized + Send + Sync + 'static>(mut self, upcast: fn(Arc<T>) -> Arc<I>) -> Self {
        let type_ref = TypeRef::of::<I>();
        if self.exposures.iter().any(|e| e.type_ref == type_ref) {
            return self;
        }
        self.exposures.push(Exposure {
            type_ref,
            upcast: Arc::new(move |instance: &Instance| {
                let concrete = Arc::clone(instance).downcast::<T>().ok()?;
                Some(Arc::new(upcast(concrete)) as Instance)
            }),
        });
        self
    }

    /// 设置构造函数并完成构建
    pub fn constructor<F>(self, constructor: F) -> CandidateType
    where
        F: Fn(&mut Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        CandidateType {
            identity: self.identity,
            constructor_params: self.constructor_params,
            tags: self.tags,
            exposures: self.exposures,
            constructor: Arc::new(move |args: &mut Arguments| {
                let instance = constructor(args)?;
                Ok(Arc::new(instance) as Instance)
            }),
        }
    }
}

impl<T: Any + Send + Sync + Default> CandidateBuilder<T> {
    /// 使用 `Default` 作为构造函数
    pub fn with_default(self) -> CandidateType {
        self.constructor(|_| Ok(T::default()))
    }
}

/// 已解析的构造参数
///
/// 按声明顺序依次通过 [`Arguments::next`] 取出
pub struct Arguments {
    owner: TypeRef,
    values: VecDeque<(TypeRef, Instance)>,
}

impl Arguments {
    pub(crate) fn new(owner: TypeRef, values: Vec<(TypeRef, Instance)>) -> Self {
        Self {
            owner,
            values: values.into(),
        }
    }

    /// 取出下一个参数
    pub fn next<D: ?Sized + Send + Sync + 'static>(&mut self) -> anyhow::Result<Arc<D>> {
        let (declared, value) = self.values.pop_front().ok_or_else(|| {
            anyhow!(
                "constructor of '{}' requested more arguments than it declared",
                self.owner
            )
        })?;
        value.downcast_ref::<Arc<D>>().cloned().ok_or_else(|| {
            anyhow!(
                "constructor argument of '{}' is declared as '{}' but was requested as '{}'",
                self.owner,
                declared,
                type_name::<D>()
            )
        })
    }

    /// 剩余参数数量
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
