/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Qualified names.
//!
//! A [`QName`] identifies fields, templates, dictionary keys and attributes.
//! Two names are equal when both the namespace and the local name match.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QName {
    namespace: String,
    name: String,
}

impl QName {
    /// Creates a name in the default (empty) namespace.
    ///
    /// # Arguments
    /// * `name` - The local name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            namespace: String::new(),
            name: name.into(),
        }
    }

    /// Creates a name in the given namespace.
    ///
    /// # Arguments
    /// * `namespace` - The namespace URI
    /// * `name` - The local name
    #[must_use]
    pub fn with_namespace(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Returns the local name.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the namespace (empty for the default namespace).
    #[inline]
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

impl From<&str> for QName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for QName {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.namespace, self.name)
        }
    }
}
