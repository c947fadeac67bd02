/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Coding context.
//!
//! A [`Context`] owns the dictionaries of one encoding or decoding stream
//! together with its configuration. Encoder and decoder must each hold their
//! own context and reset them at the same points in the stream.

use crate::dictionary::{Dictionary, DictionaryScope, DictionaryValue, ScopedDictionary};
use crate::group::Group;
use ironfast_core::QName;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// Name of the dictionary shared by every template.
pub const GLOBAL_DICTIONARY: &str = "global";
/// Name of the per-template dictionary.
pub const TEMPLATE_DICTIONARY: &str = "template";
/// Name of the per-application-type dictionary.
pub const TYPE_DICTIONARY: &str = "type";

/// Configuration for a coding context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Whether values are checked against their type before encoding and
    /// after decoding.
    pub validate_values: bool,
    /// Largest sequence length accepted when decoding.
    pub max_sequence_length: u32,
    /// Largest encoded message accepted, in bytes.
    pub max_message_size: usize,
}

impl ContextConfig {
    /// Creates a configuration with default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether values are validated.
    #[must_use]
    pub const fn with_validate_values(mut self, validate: bool) -> Self {
        self.validate_values = validate;
        self
    }

    /// Sets the maximum decoded sequence length.
    #[must_use]
    pub const fn with_max_sequence_length(mut self, length: u32) -> Self {
        self.max_sequence_length = length;
        self
    }

    /// Sets the maximum message size.
    #[must_use]
    pub const fn with_max_message_size(mut self, size: usize) -> Self {
        self.max_message_size = size;
        self
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            validate_values: true,
            max_sequence_length: 65_536,
            max_message_size: 1024 * 1024, // 1MB
        }
    }
}

/// Dictionaries and configuration of one coding stream.
#[derive(Debug)]
pub struct Context {
    config: ContextConfig,
    dictionaries: HashMap<String, Box<dyn Dictionary>>,
    last_template_id: Option<u32>,
}

impl Context {
    /// Creates a context with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ContextConfig::default())
    }

    /// Creates a context with the global, template and type dictionaries.
    #[must_use]
    pub fn with_config(config: ContextConfig) -> Self {
        let mut dictionaries: HashMap<String, Box<dyn Dictionary>> = HashMap::new();
        for (name, scope) in [
            (GLOBAL_DICTIONARY, DictionaryScope::Global),
            (TEMPLATE_DICTIONARY, DictionaryScope::Template),
            (TYPE_DICTIONARY, DictionaryScope::Type),
        ] {
            dictionaries.insert(name.to_string(), Box::new(ScopedDictionary::new(scope)));
        }

        Self {
            config,
            dictionaries,
            last_template_id: None,
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Installs a dictionary under `name`, replacing any existing one.
    pub fn add_dictionary(&mut self, name: impl Into<String>, dictionary: Box<dyn Dictionary>) {
        self.dictionaries.insert(name.into(), dictionary);
    }

    /// Returns true if a dictionary called `name` exists.
    #[must_use]
    pub fn has_dictionary(&self, name: &str) -> bool {
        self.dictionaries.contains_key(name)
    }

    /// Looks up the prior value of `key` in the named dictionary.
    ///
    /// A dictionary that was never written to reads as undefined.
    #[must_use]
    pub fn lookup(&self, dictionary: &str, template: &Group, key: &QName) -> DictionaryValue {
        self.dictionaries
            .get(dictionary)
            .map(|d| d.lookup(template, key))
            .unwrap_or_default()
    }

    /// Stores the value of `key` in the named dictionary.
    ///
    /// Unknown dictionary names are created on first use with global scope.
    pub fn store(&mut self, dictionary: &str, template: &Group, key: &QName, value: DictionaryValue) {
        self.dictionaries
            .entry(dictionary.to_string())
            .or_insert_with(|| {
                debug!(dictionary, "creating application dictionary");
                Box::new(ScopedDictionary::new(DictionaryScope::Global))
            })
            .store(template, key, value);
    }

    /// Returns the id of the template last coded in this stream.
    #[must_use]
    pub const fn last_template_id(&self) -> Option<u32> {
        self.last_template_id
    }

    /// Records the id of the template just coded.
    pub fn set_last_template_id(&mut self, id: u32) {
        self.last_template_id = Some(id);
    }

    /// Returns every dictionary entry to undefined and forgets the last
    /// template id.
    pub fn reset(&mut self) {
        for dictionary in self.dictionaries.values_mut() {
            dictionary.reset();
        }
        self.last_template_id = None;
        debug!(dictionaries = self.dictionaries.len(), "context reset");
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
