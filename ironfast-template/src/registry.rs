/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Name-to-type lookup for template definitions.

use crate::types::FastType;
use ironfast_core::{FastError, Result};
use std::collections::BTreeMap;

/// Immutable table mapping registered type names to [`FastType`]s.
///
/// Built once and passed by reference to whatever resolves type names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    types: BTreeMap<&'static str, FastType>,
}

impl TypeRegistry {
    /// Creates a registry holding every standard FAST type.
    #[must_use]
    pub fn standard() -> Self {
        Self {
            types: FastType::ALL.iter().map(|t| (t.name(), *t)).collect(),
        }
    }

    /// Looks up a type by name.
    ///
    /// # Errors
    /// Returns `FastError::UnknownType` listing the known names if `name` is
    /// not registered.
    pub fn get(&self, name: &str) -> Result<FastType> {
        self.types
            .get(name)
            .copied()
            .ok_or_else(|| FastError::UnknownType {
                name: name.to_string(),
                known: self.known_names(),
            })
    }

    /// Returns true if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }

    /// Returns an iterator over `(name, type)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, FastType)> + '_ {
        self.types.iter().map(|(name, t)| (*name, *t))
    }

    /// Returns the number of registered types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no type is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    fn known_names(&self) -> String {
        let names: Vec<&str> = self.names().collect();
        format!("{{{}}}", names.join(","))
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_is_complete() {
        let registry = TypeRegistry::standard();
        assert_eq!(registry.len(), 13);
        for t in FastType::ALL {
            assert_eq!(registry.get(t.name()).unwrap(), t);
        }
        assert_eq!(registry.get("byteVector").unwrap(), FastType::ByteVector);
    }

    #[test]
    fn test_integer_types_present() {
        let registry = TypeRegistry::default();
        for t in FastType::INTEGER_TYPES {
            assert!(registry.contains(t.name()));
            assert!(t.is_integer());
        }
    }

    #[test]
    fn test_unknown_type_lists_known_names() {
        let registry = TypeRegistry::standard();
        let err = registry.get("float").unwrap_err();
        match err {
            FastError::UnknownType { name, known } => {
                assert_eq!(name, "float");
                assert!(known.starts_with('{'));
                assert!(known.ends_with('}'));
                assert!(known.contains("u32"));
                assert!(known.contains("byteVector"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
