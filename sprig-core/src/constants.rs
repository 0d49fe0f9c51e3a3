//! 核心常量定义
//!
//! 内置标记与配置键统一在这里定义，宏和容器使用同一套标识

use crate::tag::Tag;

/// 普通组件
pub const COMPONENT: Tag = Tag::new("component");

/// 业务服务组件
pub const SERVICE: Tag = Tag::annotated("service", &[COMPONENT]);

/// 数据访问组件
pub const REPOSITORY: Tag = Tag::annotated("repository", &[COMPONENT]);

/// 控制器组件，路由表只从带有该标记的 Bean 中构建
pub const CONTROLLER: Tag = Tag::annotated("controller", &[COMPONENT]);

/// 默认的环境变量前缀
pub const DEFAULT_ENV_PREFIX: &str = "SPRIG_";

/// 默认的配置文件
pub const DEFAULT_CONFIG_FILE: &str = "application.toml";

/// 日志配置键
pub const LOGGING_LEVEL: &str = "logging.level";
pub const LOGGING_FORMAT: &str = "logging.format";

/// 激活的 profile 配置键
pub const PROFILES_ACTIVE: &str = "profiles.active";
