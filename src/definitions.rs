//! Definition registries and their configuration errors.
//!
//! A [`Registry`] maps codes to [`Definition`]s. It is supplied by the
//! consuming service, read-only once built, and usually shared between
//! factories behind an `Arc`.
//!
//! # Sources
//!
//! - In code: [`define_errors!`](crate::define_errors) or
//!   [`Registry::from_definitions`]
//! - From configuration: [`Registry::from_json_str`] / [`Registry::from_value`]
//!
//! Loading from JSON is the only place where a registry can be malformed.
//! Such failures are configuration errors ([`ConfigError`]) surfaced at load
//! time, never at error-construction time.
//!
//! ```rust
//! use service_errors::Registry;
//!
//! let registry = Registry::from_json_str(r#"{
//!     "E_FAIL": { "code": "E_FAIL", "name": "FailError", "message": "Fail %s" }
//! }"#).unwrap();
//!
//! assert!(registry.contains("E_FAIL"));
//! assert!(Registry::from_json_str("null").is_err());
//! ```

use crate::{Definition, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::collections::btree_map;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration error raised while building a registry or factory.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No registry was supplied to the factory.
    #[error("invalid registry: no registry was supplied")]
    MissingRegistry,

    /// The registry source is not an object-shaped mapping.
    #[error("invalid registry: expected an object mapping codes to definitions, found {found}")]
    InvalidRegistry {
        /// JSON kind that was found instead.
        found: &'static str,
    },

    /// One registry entry does not describe a valid definition.
    #[error("invalid registry: definition `{key}` is malformed: {source}")]
    MalformedDefinition {
        /// Registry key of the offending entry.
        key: String,
        /// Underlying deserialization failure.
        #[source]
        source: serde_json::Error,
    },

    /// The registry source is not valid JSON.
    #[error("invalid registry: {0}")]
    Parse(#[from] serde_json::Error),
}

/// JSON kind label for diagnostics.
pub(crate) const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Mapping from code to [`Definition`].
///
/// Keys are normally the definitions' own codes. Registries loaded from JSON
/// keep the keys as written; resolution always validates a candidate by its
/// `code` field against the keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Registry {
    definitions: BTreeMap<String, Definition>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry keyed by each definition's code.
    ///
    /// Later definitions replace earlier ones with the same code.
    pub fn from_definitions<'a>(definitions: impl IntoIterator<Item = &'a Definition>) -> Self {
        definitions.into_iter().cloned().collect()
    }

    /// Build a registry from a JSON value.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidRegistry`] if `value` is not an object
    /// - [`ConfigError::MalformedDefinition`] if an entry is not a definition
    pub fn from_value(value: &Value) -> Result<Self> {
        let Value::Object(entries) = value else {
            return Err(ConfigError::InvalidRegistry {
                found: json_kind(value),
            });
        };

        let mut definitions = BTreeMap::new();
        for (key, entry) in entries {
            let definition = Definition::deserialize(entry).map_err(|source| {
                ConfigError::MalformedDefinition {
                    key: key.clone(),
                    source,
                }
            })?;
            definitions.insert(key.clone(), definition);
        }

        Ok(Self { definitions })
    }

    /// Parse a registry from JSON text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for invalid JSON, otherwise as
    /// [`from_value`](Self::from_value).
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(&value)
    }

    /// Add a definition under its own code, returning the one it replaced.
    pub fn insert(&mut self, definition: Definition) -> Option<Definition> {
        self.definitions
            .insert(definition.code().to_owned(), definition)
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, definition: Definition) -> Self {
        self.insert(definition);
        self
    }

    /// Look up a definition by key.
    #[inline]
    pub fn get(&self, code: &str) -> Option<&Definition> {
        self.definitions.get(code)
    }

    /// Whether `code` is a key of this registry.
    #[inline]
    pub fn contains(&self, code: &str) -> bool {
        self.definitions.contains_key(code)
    }

    /// Number of definitions.
    #[inline]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry has no definitions.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registered keys, in order.
    pub fn codes(&self) -> impl Iterator<Item = &str> {
        self.definitions.keys().map(String::as_str)
    }

    /// Iterate over `(key, definition)` pairs, in key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Definition> {
        self.definitions.iter()
    }
}

impl FromIterator<Definition> for Registry {
    fn from_iter<I: IntoIterator<Item = Definition>>(iter: I) -> Self {
        let mut registry = Self::new();
        registry.extend(iter);
        registry
    }
}

impl Extend<Definition> for Registry {
    fn extend<I: IntoIterator<Item = Definition>>(&mut self, iter: I) {
        for definition in iter {
            self.insert(definition);
        }
    }
}

impl<'a> IntoIterator for &'a Registry {
    type Item = (&'a String, &'a Definition);
    type IntoIter = btree_map::Iter<'a, String, Definition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

// ============================================================================
// Tests
// ============================================================================
