/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Operator state dictionaries.
//!
//! Copy, increment, delta and tail fields remember the previous value of
//! each key. A dictionary's scope decides whether two fields with the same
//! key share an entry: globally, only within one template, or only within
//! one application type.

use crate::group::Group;
use ironfast_core::{QName, ScalarValue};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// State for a dictionary entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DictionaryValue {
    /// No value has been set.
    #[default]
    Undefined,
    /// Value is explicitly empty/null.
    Empty,
    /// A value has been set.
    Assigned(ScalarValue),
}

impl DictionaryValue {
    /// Returns true if the value is undefined.
    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Returns true if the value is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the assigned value, if any.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&ScalarValue> {
        match self {
            Self::Assigned(v) => Some(v),
            _ => None,
        }
    }
}

impl From<Option<ScalarValue>> for DictionaryValue {
    fn from(value: Option<ScalarValue>) -> Self {
        value.map_or(Self::Empty, Self::Assigned)
    }
}

/// Dictionary scope for operator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DictionaryScope {
    /// Global dictionary shared across all templates.
    #[default]
    Global,
    /// Template-specific dictionary.
    Template,
    /// Type-specific dictionary.
    Type,
}

impl DictionaryScope {
    /// Returns the qualifier that separates entries of this scope.
    ///
    /// The type scope falls back to the template name when the template
    /// declares no application type.
    #[must_use]
    pub fn qualifier<'a>(&self, template: &'a Group) -> Option<&'a QName> {
        match self {
            Self::Global => None,
            Self::Template => Some(template.name()),
            Self::Type => Some(template.type_reference().unwrap_or(template.name())),
        }
    }
}

/// Storage for previous values, looked up by template and key.
pub trait Dictionary: fmt::Debug + Send {
    /// Returns the entry for `key` as seen from `template`.
    fn lookup(&self, template: &Group, key: &QName) -> DictionaryValue;

    /// Replaces the entry for `key` as seen from `template`.
    fn store(&mut self, template: &Group, key: &QName, value: DictionaryValue);

    /// Returns every entry to [`DictionaryValue::Undefined`].
    fn reset(&mut self);
}

/// A [`Dictionary`] whose entries are partitioned by a [`DictionaryScope`].
#[derive(Debug, Clone, Default)]
pub struct ScopedDictionary {
    scope: DictionaryScope,
    entries: HashMap<(Option<QName>, QName), DictionaryValue>,
}

impl ScopedDictionary {
    /// Creates an empty dictionary with the given scope.
    #[must_use]
    pub fn new(scope: DictionaryScope) -> Self {
        Self {
            scope,
            entries: HashMap::new(),
        }
    }

    /// Returns the scope of the dictionary.
    #[must_use]
    pub const fn scope(&self) -> DictionaryScope {
        self.scope
    }

    /// Returns the number of entries ever stored since the last reset.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been stored since the last reset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry_key(&self, template: &Group, key: &QName) -> (Option<QName>, QName) {
        (self.scope.qualifier(template).cloned(), key.clone())
    }
}

impl Dictionary for ScopedDictionary {
    fn lookup(&self, template: &Group, key: &QName) -> DictionaryValue {
        self.entries
            .get(&self.entry_key(template, key))
            .cloned()
            .unwrap_or_default()
    }

    fn store(&mut self, template: &Group, key: &QName, value: DictionaryValue) {
        let entry_key = self.entry_key(template, key);
        self.entries.insert(entry_key, value);
    }

    fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(name: &str) -> Group {
        Group::new(name, Vec::new(), false)
    }

    #[test]
    fn test_dictionary_value() {
        let undefined = DictionaryValue::default();
        assert!(undefined.is_undefined());

        assert!(DictionaryValue::from(None).is_empty());
        let assigned = DictionaryValue::from(Some(ScalarValue::Integer(42)));
        assert_eq!(assigned.as_scalar(), Some(&ScalarValue::Integer(42)));
    }

    #[test]
    fn test_global_scope_shares_entries() {
        let mut dict = ScopedDictionary::new(DictionaryScope::Global);
        let key = QName::new("price");
        dict.store(
            &template("a"),
            &key,
            DictionaryValue::Assigned(ScalarValue::Integer(1)),
        );
        assert_eq!(
            dict.lookup(&template("b"), &key),
            DictionaryValue::Assigned(ScalarValue::Integer(1))
        );
    }

    #[test]
    fn test_template_scope_isolates_entries() {
        let mut dict = ScopedDictionary::new(DictionaryScope::Template);
        let key = QName::new("price");
        dict.store(
            &template("a"),
            &key,
            DictionaryValue::Assigned(ScalarValue::Integer(1)),
        );
        assert!(dict.lookup(&template("b"), &key).is_undefined());
        assert!(!dict.lookup(&template("a"), &key).is_undefined());
    }

    #[test]
    fn test_type_scope_uses_type_reference() {
        let mut dict = ScopedDictionary::new(DictionaryScope::Type);
        let key = QName::new("price");
        let quote_a = template("a").with_type_reference(QName::new("Quote"));
        let quote_b = template("b").with_type_reference(QName::new("Quote"));
        dict.store(&quote_a, &key, DictionaryValue::Empty);
        assert!(dict.lookup(&quote_b, &key).is_empty());
        assert!(dict.lookup(&template("c"), &key).is_undefined());
    }

    #[test]
    fn test_reset_clears_entries() {
        let mut dict = ScopedDictionary::new(DictionaryScope::Global);
        dict.store(&template("a"), &QName::new("k"), DictionaryValue::Empty);
        assert_eq!(dict.len(), 1);
        dict.reset();
        assert!(dict.is_empty());
        assert!(dict.lookup(&template("a"), &QName::new("k")).is_undefined());
    }
}
