//! Utility functions for the container
//!
//! Naming helpers for bean names, creation tracking for cycle detection and
//! panic payload formatting shared by the resolver and the dispatcher.

/// Naming convention utilities for bean names
pub mod naming {
    /// Converts a PascalCase type name to camelCase for bean naming.
    ///
    /// `UserService` becomes `userService`, the same default Spring uses.
    ///
    /// # Examples
    ///
    /// ```
    /// use sprig_core::utils::naming::to_camel_case;
    ///
    /// assert_eq!(to_camel_case("UserService"), "userService");
    /// assert_eq!(to_camel_case("A"), "a");
    /// assert_eq!(to_camel_case(""), "");
    /// ```
    pub fn to_camel_case(s: &str) -> String {
        let mut chars = s.chars();
        match chars.next() {
            None => String::new(),
            Some(first) => {
                let mut result = String::with_capacity(s.len());
                result.extend(first.to_lowercase());
                result.push_str(chars.as_str());
                result
            }
        }
    }
}

/// Dependency resolution utilities
pub mod dependency {
    use crate::type_ref::TypeRef;
    use std::collections::HashSet;

    /// Tracks types currently being constructed to detect circular dependencies.
    ///
    /// Besides the membership set it keeps the creation path in order, so a
    /// detected cycle can be reported as `A -> B -> A`.
    #[derive(Debug, Default)]
    pub struct CreationTracker {
        creating: HashSet<TypeRef>,
        path: Vec<TypeRef>,
    }

    impl CreationTracker {
        /// Creates a new empty creation tracker.
        pub fn new() -> Self {
            Self::default()
        }

        /// Checks if a type is currently being created.
        pub fn is_creating(&self, type_ref: &TypeRef) -> bool {
            self.creating.contains(type_ref)
        }

        /// Marks a type as being created.
        ///
        /// Returns `false` if it was already in the creating set (circular
        /// dependency detected); the path is left untouched in that case.
        pub fn start_creating(&mut self, type_ref: TypeRef) -> bool {
            if !self.creating.insert(type_ref) {
                return false;
            }
            self.path.push(type_ref);
            true
        }

        /// Marks a type as finished being created.
        pub fn finish_creating(&mut self, type_ref: &TypeRef) {
            if self.creating.remove(type_ref) {
                if let Some(pos) = self.path.iter().rposition(|t| t == type_ref) {
                    self.path.remove(pos);
                }
            }
        }

        /// The cycle closed by requesting `type_ref` again, starting at its
        /// first occurrence on the creation path.
        pub fn cycle_to(&self, type_ref: &TypeRef) -> Vec<TypeRef> {
            let start = self
                .path
                .iter()
                .position(|t| t == type_ref)
                .unwrap_or(0);
            let mut cycle = self.path[start..].to_vec();
            cycle.push(*type_ref);
            cycle
        }

        /// Current creation path, outermost first.
        pub fn current_path(&self) -> &[TypeRef] {
            &self.path
        }
    }
}

/// Extracts a readable message from a caught panic payload.
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic occurred".to_string()
    }
}
