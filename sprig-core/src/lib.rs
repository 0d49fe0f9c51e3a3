// sprig-core: 构造函数注入的依赖注入容器
//
// 提供：
// - 组件描述（CandidateType）与类型标识（TypeRef）
// - 递归、记忆化、带循环检测的依赖解析
// - 只读的 Bean 注册表，按类型和标记查询
// - 配置环境与日志初始化

pub mod bean_factory;
pub mod candidate;
pub mod component;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod logging;
pub mod resolver;
pub mod tag;
pub mod type_ref;
pub mod utils;

// 重新导出常用类型
pub use bean_factory::{
    BeanFactory, BeanFactoryExt, BeanRegistry, BeanRegistryBuilder, ListableBeanFactory,
};
pub use candidate::{Arguments, CandidateBuilder, CandidateType, Instance};
pub use component::{scan_components, Component, ComponentRegistration};
pub use config::{
    ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, PropertySource,
    TomlPropertySource,
};
pub use constants::*;
pub use context::{ApplicationContext, ApplicationContextBuilder};
pub use error::{
    ApplicationError, ApplicationResult, BoxError, ContainerError, ContainerResult,
    RegistrationError, ResolutionError,
};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use resolver::{resolve, DependencyResolver, ResolvedBean, ResolvedGraph};
pub use tag::Tag;
pub use type_ref::TypeRef;

// 导出 anyhow 和 inventory，供宏使用
pub use anyhow;
pub use inventory;

/// Prelude 模块，包含常用的 traits 和类型
pub mod prelude {
    pub use crate::bean_factory::{BeanFactory, BeanFactoryExt, BeanRegistry, ListableBeanFactory};
    pub use crate::candidate::{Arguments, CandidateType, Instance};
    pub use crate::component::Component;
    pub use crate::config::{self, ConfigValue, Environment, PropertySource};
    pub use crate::constants::{COMPONENT, CONTROLLER, REPOSITORY, SERVICE};
    pub use crate::context::ApplicationContext;
    pub use crate::error::{ApplicationError, ContainerError, RegistrationError, ResolutionError};
    pub use crate::logging::{LogFormat, LogLevel, LoggingConfig};
    pub use crate::tag::Tag;
    pub use crate::type_ref::TypeRef;
    pub use crate::utils;
    pub use anyhow::{anyhow, Context};
}
