//! Factories: resolve a code or definition against a registry and construct
//! an error from it.
//!
//! # Resolution
//!
//! | Lookup                                 | Candidate                          |
//! |----------------------------------------|------------------------------------|
//! | `Lookup::Code` / JSON string           | registry entry for the code        |
//! | `Lookup::Definition` / JSON object     | the definition itself              |
//! | `Lookup::Missing` / JSON `null`        | none                               |
//! | `Lookup::Error`                        | invalid, kept as the cause         |
//! | any other JSON value                   | invalid, kept as raw value         |
//!
//! A candidate is valid when its `code` is a key of the registry. Anything
//! else resolves to [`DEFAULT_ERROR`]:
//!
//! - with no candidate (missing input, unknown code) the caller's arguments
//!   are passed through untouched
//! - with an invalid candidate, it takes the caller's first argument slot:
//!   an error-like input becomes the inner error, anything else stays
//!   visible in `data` as JSON
//!
//! [`Factory::create`] never fails for bad per-call input. Only building the
//! factory can fail, with a [`ConfigError`](crate::ConfigError).

use crate::{
    Arg, DEFAULT_ERROR, Definition, ErrorLike, ForeignError, GenericError, Registry, Result,
    ServiceError,
};
use serde::Deserialize;
use serde_json::Value;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Constructor bound into a factory at creation time.
pub type Constructor<E> = fn(&Definition, Vec<Arg>) -> E;

// ============================================================================
// Variant Capability
// ============================================================================

/// Capability of types a factory can produce.
///
/// Implemented by [`ServiceError`] itself and by every wrapper declared with
/// [`service_error_variant!`](crate::service_error_variant). Produced values
/// satisfy both their own type and the base error (`AsRef<ServiceError>`).
pub trait ServiceErrorVariant: ErrorLike + AsRef<ServiceError> + Sized {
    /// Build a value from a resolved definition and the call arguments.
    fn construct(definition: &Definition, args: Vec<Arg>) -> Self;

    /// Factory producing this type.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingRegistry`](crate::ConfigError::MissingRegistry)
    /// when `registry` is `None`.
    fn factory(registry: Option<Arc<Registry>>) -> Result<Factory<Self>> {
        Factory::with_constructor(registry, Self::construct)
    }
}

impl ServiceErrorVariant for ServiceError {
    fn construct(definition: &Definition, args: Vec<Arg>) -> Self {
        ServiceError::new(definition, args)
    }
}

impl AsRef<ServiceError> for ServiceError {
    fn as_ref(&self) -> &ServiceError {
        self
    }
}

// ============================================================================
// Lookup
// ============================================================================

/// What a caller asks a factory for.
#[derive(Debug, Clone)]
pub enum Lookup {
    /// Nothing was supplied.
    Missing,
    /// A registry code.
    Code(String),
    /// A definition used directly, if its code is registered.
    Definition(Definition),
    /// Untyped input, classified at resolution time.
    Value(Value),
    /// An error passed where a code was expected; it becomes the cause.
    Error(Arc<dyn ErrorLike>),
}

impl Lookup {
    /// Wrap an error-like value.
    pub fn error<E: ErrorLike>(error: E) -> Self {
        Self::Error(Arc::new(error))
    }
}

impl From<&str> for Lookup {
    fn from(code: &str) -> Self {
        Self::Code(code.to_owned())
    }
}

impl From<String> for Lookup {
    fn from(code: String) -> Self {
        Self::Code(code)
    }
}

impl From<&String> for Lookup {
    fn from(code: &String) -> Self {
        Self::Code(code.clone())
    }
}

impl From<Definition> for Lookup {
    fn from(definition: Definition) -> Self {
        Self::Definition(definition)
    }
}

impl From<&Definition> for Lookup {
    fn from(definition: &Definition) -> Self {
        Self::Definition(definition.clone())
    }
}

impl From<Value> for Lookup {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Arc<dyn ErrorLike>> for Lookup {
    fn from(error: Arc<dyn ErrorLike>) -> Self {
        Self::Error(error)
    }
}

impl From<GenericError> for Lookup {
    fn from(error: GenericError) -> Self {
        Self::error(error)
    }
}

impl From<ForeignError> for Lookup {
    fn from(error: ForeignError) -> Self {
        Self::error(error)
    }
}

impl<T: Into<Lookup>> From<Option<T>> for Lookup {
    fn from(lookup: Option<T>) -> Self {
        lookup.map_or(Self::Missing, Into::into)
    }
}

/// Outcome of resolving a [`Lookup`].
#[derive(Debug, Clone)]
pub struct Resolution<'r> {
    /// Definition the error will be built from.
    pub definition: Cow<'r, Definition>,
    /// Invalid candidate that displaces the first argument.
    pub rejected: Option<Arg>,
    /// Whether resolution fell back to [`DEFAULT_ERROR`].
    pub fell_back: bool,
}

impl Resolution<'_> {
    fn resolved(definition: Cow<'_, Definition>) -> Resolution<'_> {
        Resolution {
            definition,
            rejected: None,
            fell_back: false,
        }
    }

    /// The rejected candidate, when it is plain data.
    pub fn rejected_value(&self) -> Option<&Value> {
        match &self.rejected {
            Some(Arg::Value(value)) => Some(value),
            _ => None,
        }
    }

    /// The rejected candidate, when it is error-like.
    pub fn rejected_error(&self) -> Option<&Arc<dyn ErrorLike>> {
        match &self.rejected {
            Some(Arg::Error(error)) => Some(error),
            _ => None,
        }
    }

    fn fallback(rejected: Option<Arg>) -> Resolution<'static> {
        Resolution {
            definition: Cow::Borrowed(&DEFAULT_ERROR),
            rejected,
            fell_back: true,
        }
    }
}

// ============================================================================
// Factory
// ============================================================================

/// Builds errors of type `E` by code against one shared registry.
///
/// ```rust
/// use service_errors::{args, Definition, Factory, Registry};
/// use std::sync::Arc;
///
/// let registry = Registry::new().with(Definition::new("E_FAIL", "FailError", "Fail %s"));
/// let factory = Factory::new(Some(Arc::new(registry))).unwrap();
///
/// assert_eq!(factory.create("E_FAIL", args!["x"]).message(), "Fail x");
/// assert!(factory.create("E_NOPE", args![]).is_internal());
/// assert!(Factory::new(None).is_err());
/// ```
pub struct Factory<E = ServiceError> {
    registry: Arc<Registry>,
    constructor: Constructor<E>,
}

impl Factory<ServiceError> {
    /// Factory producing [`ServiceError`].
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingRegistry`](crate::ConfigError::MissingRegistry)
    /// when `registry` is `None`.
    pub fn new(registry: Option<Arc<Registry>>) -> Result<Self> {
        Self::with_constructor(registry, ServiceError::construct)
    }

    /// Factory over a registry loaded from JSON.
    ///
    /// # Errors
    ///
    /// As [`Registry::from_value`].
    pub fn from_value(value: &Value) -> Result<Self> {
        let registry = Registry::from_value(value)?;
        Self::new(Some(Arc::new(registry)))
    }
}

impl<E> Factory<E> {
    /// Factory with an explicit constructor.
    ///
    /// # Errors
    ///
    /// [`ConfigError::MissingRegistry`](crate::ConfigError::MissingRegistry)
    /// when `registry` is `None`.
    pub fn with_constructor(
        registry: Option<Arc<Registry>>,
        constructor: Constructor<E>,
    ) -> Result<Self> {
        let registry = registry.ok_or(crate::ConfigError::MissingRegistry)?;
        Ok(Self {
            registry,
            constructor,
        })
    }

    /// The registry this factory resolves against.
    #[inline]
    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    /// Definition used when resolution fails.
    #[inline]
    pub fn default_definition(&self) -> &'static Definition {
        &DEFAULT_ERROR
    }

    /// Resolve a lookup to the definition an error would be built from.
    pub fn resolve(&self, lookup: impl Into<Lookup>) -> Resolution<'_> {
        match lookup.into() {
            Lookup::Missing => self.miss("<missing>", None),
            Lookup::Code(code) => self.resolve_code(code),
            Lookup::Definition(definition) => self.validate(Cow::Owned(definition), None),
            Lookup::Value(value) => self.resolve_value(value),
            Lookup::Error(error) => {
                let requested = error.error_name().into_owned();
                self.miss(&requested, Some(Arg::Error(error)))
            }
        }
    }

    /// Resolve `lookup` and construct an error from it and `args`.
    pub fn create(&self, lookup: impl Into<Lookup>, args: impl IntoIterator<Item = Arg>) -> E {
        let Resolution {
            definition,
            rejected,
            ..
        } = self.resolve(lookup);

        let mut args: Vec<Arg> = args.into_iter().collect();
        if let Some(rejected) = rejected {
            match args.first_mut() {
                Some(first) => *first = rejected,
                None => args.push(rejected),
            }
        }

        (self.constructor)(&definition, args)
    }

    fn resolve_code(&self, code: String) -> Resolution<'_> {
        match self.registry.get(&code) {
            Some(definition) => self.validate(Cow::Borrowed(definition), None),
            None => self.miss(&code, None),
        }
    }

    fn resolve_value(&self, value: Value) -> Resolution<'_> {
        match value {
            Value::Null => self.miss("null", None),
            Value::String(code) => self.resolve_code(code),
            Value::Object(_) => match Definition::deserialize(&value) {
                Ok(definition) => self.validate(Cow::Owned(definition), Some(value)),
                Err(_) => self.miss(&value.to_string(), Some(Arg::Value(value))),
            },
            other => self.miss(&other.to_string(), Some(Arg::Value(other))),
        }
    }

    /// Accept `definition` if its code is registered, else reject it into
    /// the first argument slot.
    fn validate<'r>(
        &'r self,
        definition: Cow<'r, Definition>,
        raw: Option<Value>,
    ) -> Resolution<'r> {
        if self.registry.contains(definition.code()) {
            return Resolution::resolved(definition);
        }

        let rejected = raw.unwrap_or_else(|| {
            serde_json::to_value(definition.as_ref()).unwrap_or(Value::Null)
        });
        self.miss(definition.code(), Some(Arg::Value(rejected)))
    }

    fn miss(&self, requested: &str, rejected: Option<Arg>) -> Resolution<'static> {
        tracing::debug!(
            requested,
            rejected = rejected.is_some(),
            fallback = DEFAULT_ERROR.code(),
            "error definition not registered"
        );
        Resolution::fallback(rejected)
    }
}

impl<E> Clone for Factory<E> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            constructor: self.constructor,
        }
    }
}

impl<E> fmt::Debug for Factory<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factory")
            .field("produces", &std::any::type_name::<E>())
            .field("registry_len", &self.registry.len())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
