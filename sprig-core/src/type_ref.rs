//! TypeRef - 类型标识
//!
//! 以 `TypeId` 作为身份，类型名只用于日志和错误信息

use std::any::{type_name, TypeId};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 组件类型的名义标识
///
/// 既可以指向具体类型，也可以指向 trait object（例如 `dyn Greeter`）
#[derive(Clone, Copy)]
pub struct TypeRef {
    id: TypeId,
    name: &'static str,
}

impl TypeRef {
    /// 获取类型 `T` 的标识
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// 完整类型名，例如 `my_app::service::UserService`
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 不带模块路径和泛型参数的类型名，例如 `UserService`
    pub fn simple_name(&self) -> &'static str {
        let base = self.name.split(['<', '+']).next().unwrap_or(self.name);
        base.rsplit("::").next().unwrap_or(base).trim()
    }

    /// 底层 `TypeId`
    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for TypeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeRef {}

impl Hash for TypeRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for TypeRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Sorted by name first so traversal order is stable between runs.
impl Ord for TypeRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(other.name)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Debug for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
