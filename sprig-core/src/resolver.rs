//! 依赖解析
//!
//! 把一组 [`CandidateType`] 构建成完整装配的单例图。
//! 每个候选类型都是根，每个具体类型最多实例化一次，失败统一报告为 [`ResolutionError`]

use std::collections::{BTreeMap, HashMap};
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::candidate::{Arguments, CandidateType, Instance};
use crate::error::ResolutionError;
use crate::tag::{self, Tag};
use crate::type_ref::TypeRef;
use crate::utils::{dependency::CreationTracker, panic_message};

/// 已构建的单例及注册表需要的元数据
#[derive(Clone)]
pub struct ResolvedBean {
    type_ref: TypeRef,
    instance: Instance,
    tags: Vec<Tag>,
    exposed_types: Vec<TypeRef>,
}

impl ResolvedBean {
    pub fn type_ref(&self) -> TypeRef {
        self.type_ref
    }

    pub fn instance(&self) -> &Instance {
        &self.instance
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn carries(&self, tag: &Tag) -> bool {
        tag::carries(&self.tags, tag)
    }

    /// 可以注入为的类型，自身类型在前
    pub fn exposed_types(&self) -> &[TypeRef] {
        &self.exposed_types
    }
}

impl std::fmt::Debug for ResolvedBean {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedBean")
            .field("type_ref", &self.type_ref)
            .field("tags", &self.tags)
            .finish()
    }
}

/// 解析结果：每个具体候选类型一个 Bean
#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    beans: BTreeMap<TypeRef, ResolvedBean>,
}

impl ResolvedGraph {
    pub fn get(&self, type_ref: &TypeRef) -> Option<&ResolvedBean> {
        self.beans.get(type_ref)
    }

    pub fn contains(&self, type_ref: &TypeRef) -> bool {
        self.beans.contains_key(type_ref)
    }

    pub fn len(&self) -> usize {
        self.beans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }

    /// 按升序排列的 Bean 类型
    pub fn types(&self) -> impl Iterator<Item = TypeRef> + '_ {
        self.beans.keys().copied()
    }

    pub fn beans(&self) -> impl Iterator<Item = &ResolvedBean> {
        self.beans.values()
    }
}

impl IntoIterator for ResolvedGraph {
    type Item = (TypeRef, ResolvedBean);
    type IntoIter = std::collections::btree_map::IntoIter<TypeRef, ResolvedBean>;

    fn into_iter(self) -> Self::IntoIter {
        self.beans.into_iter()
    }
}

/// 依赖解析器
///
/// 解析状态（已创建的实例和创建中的类型）只在一次 [`DependencyResolver::resolve`] 调用内有效
pub struct DependencyResolver<'a> {
    candidates: Vec<&'a CandidateType>,
    built: HashMap<TypeRef, Instance>,
    tracker: CreationTracker,
}

impl<'a> DependencyResolver<'a> {
    /// 解析所有候选类型
    ///
    /// 按 [`TypeRef`] 顺序访问，相同输入总是得到相同的错误；任一失败则不返回任何 Bean
    pub fn resolve(candidates: &'a [CandidateType]) -> Result<ResolvedGraph, ResolutionError> {
        let mut sorted: Vec<&CandidateType> = candidates.iter().collect();
        sorted.sort_by_key(|c| c.identity());

        tracing::debug!("Resolving {} candidate type(s)", sorted.len());

        let mut resolver = DependencyResolver {
            candidates: sorted,
            built: HashMap::new(),
            tracker: CreationTracker::new(),
        };

        let roots: Vec<&CandidateType> = resolver.candidates.clone();
        for root in &roots {
            resolver.resolve_type(root.identity(), None)?;
        }

        let beans = roots
            .iter()
            .filter_map(|candidate| {
                let instance = resolver.built.get(&candidate.identity())?;
                Some((
                    candidate.identity(),
                    ResolvedBean {
                        type_ref: candidate.identity(),
                        instance: Instance::clone(instance),
                        tags: candidate.tags().to_vec(),
                        exposed_types: candidate.exposed_types().collect(),
                    },
                ))
            })
            .collect::<BTreeMap<_, _>>();

        tracing::debug!("Resolved {} bean(s)", beans.len());
        Ok(ResolvedGraph { beans })
    }

    /// 解析 `requested`，返回以该类型视角的实例
    fn resolve_type(
        &mut self,
        requested: TypeRef,
        required_by: Option<TypeRef>,
    ) -> Result<Instance, ResolutionError> {
        let candidate = self.find_unique(&requested, required_by)?;
        let instance = self.instantiate(candidate)?;
        candidate
            .view(&instance, &requested)
            .ok_or_else(|| ResolutionError::BeanInstantiationFailed {
                type_ref: candidate.identity(),
                cause: format!("instance cannot be viewed as '{}'", requested).into(),
            })
    }

    fn find_unique(
        &self,
        requested: &TypeRef,
        required_by: Option<TypeRef>,
    ) -> Result<&'a CandidateType, ResolutionError> {
        let mut matches = self
            .candidates
            .iter()
            .copied()
            .filter(|c| c.is_assignable_to(requested));

        match (matches.next(), matches.next()) {
            (None, _) => Err(ResolutionError::MissingDependency {
                dependency: *requested,
                required_by,
            }),
            (Some(candidate), None) => Ok(candidate),
            (Some(first), Some(second)) => {
                let candidates = [first, second]
                    .into_iter()
                    .chain(matches)
                    .map(CandidateType::identity)
                    .collect();
                Err(ResolutionError::AmbiguousDependency {
                    dependency: *requested,
                    candidates,
                })
            }
        }
    }

    fn instantiate(&mut self, candidate: &'a CandidateType) -> Result<Instance, ResolutionError> {
        let identity = candidate.identity();

        if let Some(instance) = self.built.get(&identity) {
            tracing::trace!("Returning cached instance of singleton bean '{}'", identity);
            return Ok(Instance::clone(instance));
        }

        if !self.tracker.start_creating(identity) {
            let chain = self.tracker.cycle_to(&identity);
            tracing::debug!("Circular dependency detected while creating '{}'", identity);
            return Err(ResolutionError::CircularDependencyDetected {
                type_ref: identity,
                chain,
            });
        }

        let result = self.create(candidate);
        self.tracker.finish_creating(&identity);

        let instance = result?;
        self.built.insert(identity, Instance::clone(&instance));
        Ok(instance)
    }

    fn create(&mut self, candidate: &'a CandidateType) -> Result<Instance, ResolutionError> {
        let identity = candidate.identity();
        tracing::debug!("Creating shared instance of singleton bean '{}'", identity);

        let mut values = Vec::with_capacity(candidate.constructor_params().len());
        for param in candidate.constructor_params() {
            let value = self.resolve_type(*param, Some(identity))?;
            values.push((*param, value));
        }

        let mut args = Arguments::new(identity, values);
        match catch_unwind(AssertUnwindSafe(|| candidate.construct(&mut args))) {
            Ok(Ok(instance)) => Ok(instance),
            Ok(Err(cause)) => Err(ResolutionError::BeanInstantiationFailed {
                type_ref: identity,
                cause: cause.into(),
            }),
            Err(panic) => Err(ResolutionError::BeanInstantiationFailed {
                type_ref: identity,
                cause: format!("constructor panicked: {}", panic_message(panic.as_ref())).into(),
            }),
        }
    }
}

/// [`DependencyResolver::resolve`] 的简写
pub fn resolve(candidates: &[CandidateType]) -> Result<ResolvedGraph, ResolutionError> {
    DependencyResolver::resolve(candidates)
}
