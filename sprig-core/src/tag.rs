//! Tag - 组件标记
//!
//! 相当于 Spring 的 stereotype 注解，可以通过元标记组合，
//! 例如 `CONTROLLER` 同时也是 `COMPONENT`

use std::fmt;
use std::hash::{Hash, Hasher};

/// 组件上的标记
#[derive(Clone, Copy)]
pub struct Tag {
    name: &'static str,
    meta: &'static [Tag],
}

impl Tag {
    /// 创建不带元标记的标记
    pub const fn new(name: &'static str) -> Self {
        Self { name, meta: &[] }
    }

    /// 创建带元标记的标记
    pub const fn annotated(name: &'static str, meta: &'static [Tag]) -> Self {
        Self { name, meta }
    }

    /// 标记名
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 直接元标记
    pub fn meta_tags(&self) -> &'static [Tag] {
        self.meta
    }

    /// 是否就是 `other`，或者通过元标记（递归）携带了 `other`
    pub fn implies(&self, other: &Tag) -> bool {
        self == other || self.meta.iter().any(|meta| meta.implies(other))
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 判断一组标记中是否有标记携带了 `tag`
pub fn carries(tags: &[Tag], tag: &Tag) -> bool {
    tags.iter().any(|t| t.implies(tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COMPONENT, CONTROLLER, REPOSITORY, SERVICE};

    const AUDITED: Tag = Tag::new("audited");
    const REST_CONTROLLER: Tag = Tag::annotated("restController", &[CONTROLLER, AUDITED]);

    #[test]
    fn test_direct_and_meta_tags() {
        assert!(COMPONENT.implies(&COMPONENT));
        assert!(CONTROLLER.implies(&COMPONENT));
        assert!(SERVICE.implies(&COMPONENT));
        assert!(REPOSITORY.implies(&COMPONENT));
        assert!(!COMPONENT.implies(&CONTROLLER));
        assert!(!SERVICE.implies(&CONTROLLER));
    }

    #[test]
    fn test_meta_tags_are_transitive() {
        assert!(REST_CONTROLLER.implies(&CONTROLLER));
        assert!(REST_CONTROLLER.implies(&COMPONENT));
        assert!(REST_CONTROLLER.implies(&AUDITED));
        assert!(!CONTROLLER.implies(&AUDITED));
    }

    #[test]
    fn test_carries() {
        let tags = [SERVICE];
        assert!(carries(&tags, &COMPONENT));
        assert!(!carries(&tags, &CONTROLLER));
        assert!(!carries(&[], &COMPONENT));
    }
}
