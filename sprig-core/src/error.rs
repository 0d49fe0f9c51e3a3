//! 容器错误定义

use crate::type_ref::TypeRef;
use thiserror::Error;

/// 构造函数或处理方法抛出的底层错误
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// 依赖解析错误
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("{}", missing_message(.dependency, .required_by))]
    MissingDependency {
        dependency: TypeRef,
        required_by: Option<TypeRef>,
    },

    #[error("Dependency '{dependency}' is ambiguous, candidates: {}", join_types(.candidates, ", "))]
    AmbiguousDependency {
        dependency: TypeRef,
        candidates: Vec<TypeRef>,
    },

    #[error("Circular dependency detected: {}", join_types(.chain, " -> "))]
    CircularDependencyDetected {
        type_ref: TypeRef,
        chain: Vec<TypeRef>,
    },

    #[error("Failed to instantiate bean '{type_ref}': {cause}")]
    BeanInstantiationFailed {
        type_ref: TypeRef,
        #[source]
        cause: BoxError,
    },
}

impl ResolutionError {
    /// 出错的类型
    pub fn type_ref(&self) -> TypeRef {
        match self {
            Self::MissingDependency { dependency, .. } => *dependency,
            Self::AmbiguousDependency { dependency, .. } => *dependency,
            Self::CircularDependencyDetected { type_ref, .. } => *type_ref,
            Self::BeanInstantiationFailed { type_ref, .. } => *type_ref,
        }
    }
}

/// Bean 注册错误
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("Bean of type '{0}' is already registered")]
    DuplicateBean(TypeRef),
}

/// 容器启动错误
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// 应用启动错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),

    #[error("Failed to load configuration from '{path}': {message}")]
    ConfigLoadFailed { path: String, message: String },

    #[error(transparent)]
    Container(#[from] ContainerError),
}

pub type ContainerResult<T> = std::result::Result<T, ContainerError>;
pub type ApplicationResult<T> = std::result::Result<T, ApplicationError>;

fn join_types(types: &[TypeRef], separator: &str) -> String {
    types
        .iter()
        .map(TypeRef::name)
        .collect::<Vec<_>>()
        .join(separator)
}

fn missing_message(dependency: &TypeRef, required_by: &Option<TypeRef>) -> String {
    match required_by {
        Some(owner) => format!(
            "No candidate satisfies dependency '{}' required by '{}'",
            dependency, owner
        ),
        None => format!("No candidate satisfies dependency '{}'", dependency),
    }
}
