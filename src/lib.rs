//! # Service Errors
//!
//! Registry-driven typed errors with stable codes.
//!
//! ## Design Philosophy
//!
//! 1. **Errors are raised by code**, never by ad-hoc strings
//! 2. **Codes are stable** so callers can branch on them reliably
//! 3. **Messages stay readable** through positional template binding
//! 4. **Causal chains are never lost**, in structured or display form
//! 5. **Bad input degrades, never fails**: unknown codes become `E_INTERNAL`
//!
//! ## Anatomy of an Error
//!
//! | Field         | Source                                             |
//! |---------------|----------------------------------------------------|
//! | `code`        | definition                                         |
//! | `name`        | definition (variants may override)                 |
//! | `message`     | definition template bound to the leading arguments |
//! | `raw_message` | definition template, unsubstituted                 |
//! | `data`        | every positional argument, bound or not            |
//! | `inner_error` | an error-like first argument                       |
//! | backtrace     | captured at construction (`RUST_BACKTRACE`)        |
//!
//! ## Quick Start
//!
//! ```rust
//! use service_errors::{define_errors, service_error, ErrorLike, Factory, GenericError};
//! use std::sync::Arc;
//!
//! define_errors! {
//!     pub fn registry() => {
//!         E_FAIL = ("FailError", "Fail %s: %d"),
//!         E_NOT_FOUND = ("NotFoundError", "%s not found", 404),
//!     }
//! }
//!
//! let factory = Factory::new(Some(Arc::new(registry()))).unwrap();
//!
//! let err = service_error!(factory, "E_FAIL", "x", 1, "extra");
//! assert_eq!(err.code(), "E_FAIL");
//! assert_eq!(err.message(), "Fail x: 1");
//! assert_eq!(err.data().len(), 3);
//!
//! // Unknown codes degrade to the internal error instead of failing.
//! let err = service_error!(factory, "E_UNKNOWN");
//! assert_eq!(err.code(), "E_INTERNAL");
//!
//! // An error-like first argument becomes the cause.
//! let err = service_error!(factory, "E_NOT_FOUND", GenericError::new("boom"), "user");
//! assert_eq!(err.inner_error().map(|e| e.error_message().into_owned()), Some("boom".into()));
//! assert_eq!(err.message(), "user not found");
//! assert_eq!(err.status_code(), 404);
//! ```
//!
//! ## Serialization
//!
//! - [`ServiceError::to_structured`] (and `serde::Serialize`) produce the
//!   machine-readable form with nested `innerError` mappings.
//! - [`ServiceError::to_display_string`] (and `{:#}`) produce a deep,
//!   multi-line rendering including the stacks of every error in the chain.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::fmt;
use std::result;
use std::sync::Arc;

pub mod binding;
pub mod codes;
pub mod context;
pub mod convenience;
pub mod definitions;
pub mod factory;
pub mod logging;
pub mod models;

pub use codes::*;
pub use context::*;
pub use definitions::*;
pub use factory::*;
pub use logging::*;
pub use models::*;

#[doc(hidden)]
pub use serde;

/// Type alias for Results of registry and factory configuration.
pub type Result<T> = result::Result<T, ConfigError>;

/// Status reported when neither the definition nor the cause carries one.
pub const DEFAULT_STATUS: u16 = 500;

/// Typed error built from a [`Definition`] and runtime arguments.
///
/// # Key Properties
///
/// - `code` and `name` are copied from the definition at construction and
///   never re-derived; only `name` can be changed, through [`set_name`]
/// - `message` is the template bound to the leading arguments
/// - `data` keeps every argument, bound or not
/// - the inner error is shared (`Arc`), never cloned
///
/// [`set_name`]: ServiceError::set_name
#[must_use = "errors should be returned, logged or inspected"]
pub struct ServiceError {
    code: Cow<'static, str>,
    name: Cow<'static, str>,
    message: String,
    raw_message: Cow<'static, str>,
    data: Vec<Value>,
    inner_error: Option<Arc<dyn ErrorLike>>,
    status: Option<u16>,
    backtrace: Backtrace,
}

impl ServiceError {
    /// Build an error directly from a definition.
    ///
    /// If the first argument is error-like it becomes the inner error and is
    /// excluded from `data`. Otherwise every argument is positional data and
    /// there is no inner error.
    ///
    /// ```rust
    /// use service_errors::{args, Definition, ServiceError};
    ///
    /// let def = Definition::const_new("E_FAIL", "FailError", "Fail %s: %d");
    /// let err = ServiceError::new(&def, args!["x", 1, "extra"]);
    ///
    /// assert_eq!(err.message(), "Fail x: 1");
    /// assert_eq!(err.raw_message(), "Fail %s: %d");
    /// assert!(err.inner_error().is_none());
    /// ```
    pub fn new(definition: &Definition, args: impl IntoIterator<Item = Arg>) -> Self {
        let mut inner_error = None;
        let mut data = Vec::new();

        for (index, arg) in args.into_iter().enumerate() {
            match arg {
                Arg::Error(error) if index == 0 => inner_error = Some(error),
                other => data.push(other.into_value()),
            }
        }

        let message = binding::bind_message(definition.message(), &data)
            .message
            .into_owned();

        Self {
            code: definition.code_cow(),
            name: definition.name_cow(),
            message,
            raw_message: definition.message_cow(),
            data,
            inner_error,
            status: definition.status(),
            backtrace: Backtrace::capture(),
        }
    }

    /// Build an error that wraps an explicit cause.
    pub fn wrap(
        definition: &Definition,
        cause: impl ErrorLike,
        args: impl IntoIterator<Item = Arg>,
    ) -> Self {
        let cause: Arc<dyn ErrorLike> = Arc::new(cause);
        Self::new(definition, std::iter::once(Arg::Error(cause)).chain(args))
    }

    /// The built-in internal-error definition.
    #[inline]
    pub fn default_definition() -> &'static Definition {
        &DEFAULT_ERROR
    }

    /// Stable machine-readable code.
    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Display name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Override the display name (for wrapper variants).
    pub fn set_name(&mut self, name: impl Into<Cow<'static, str>>) {
        self.name = name.into();
    }

    /// Bound message.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Unsubstituted template.
    #[inline]
    pub fn raw_message(&self) -> &str {
        &self.raw_message
    }

    /// Every positional argument, bound or not.
    #[inline]
    pub fn data(&self) -> &[Value] {
        &self.data
    }

    /// Shared causal error.
    #[inline]
    pub fn inner_error(&self) -> Option<&Arc<dyn ErrorLike>> {
        self.inner_error.as_ref()
    }

    /// Backtrace captured at construction.
    #[inline]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// Status from the definition, else from the cause, else `500`.
    pub fn status_code(&self) -> u16 {
        ErrorLike::status(self).unwrap_or(DEFAULT_STATUS)
    }

    /// Whether this error was built from `definition` (compared by code).
    #[inline]
    pub fn is(&self, definition: &Definition) -> bool {
        self.code == definition.code()
    }

    /// Whether this error is the internal fallback.
    #[inline]
    pub fn is_internal(&self) -> bool {
        self.code == INTERNAL_CODE
    }

    /// Causal chain from this error down to its root cause.
    pub fn chain(&self) -> CauseChain<'_> {
        CauseChain::new(self)
    }

    /// Machine-readable form, recursing through the causal chain.
    pub fn to_structured(&self) -> StructuredError {
        StructuredError {
            code: self.code.to_string(),
            name: self.name.to_string(),
            message: self.message.clone(),
            raw_message: self.raw_message.to_string(),
            data: self.data.clone(),
            inner_error: self
                .inner_error
                .as_deref()
                .map(|inner| Box::new(StructuredInner::from_error(inner))),
        }
    }

    /// Deep, multi-line rendering including every stack in the chain.
    pub fn to_display_string(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = DisplayLog::new(self).write_to(&mut out);
        out
    }
}

impl fmt::Debug for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("ServiceError");
        d.field("code", &self.code);
        d.field("name", &self.name);
        d.field("message", &self.message);
        d.field("data", &self.data);
        if let Some(ref inner) = self.inner_error {
            d.field("inner_error", inner);
        }
        if let Some(status) = self.status {
            d.field("status", &status);
        }
        d.finish()
    }
}

impl fmt::Display for ServiceError {
    /// `Name: message`, or the deep display form with `{:#}`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            DisplayLog::new(self).write_to(f)
        } else {
            write!(f, "{}: {}", self.name, self.message)
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner_error
            .as_deref()
            .map(|inner| inner as &(dyn std::error::Error + 'static))
    }
}

impl ErrorLike for ServiceError {
    fn error_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn error_message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }

    fn error_code(&self) -> Option<&str> {
        Some(&self.code)
    }

    fn status(&self) -> Option<u16> {
        self.status
            .or_else(|| self.inner_error.as_deref().and_then(|inner| inner.status()))
    }

    fn stack(&self) -> Option<String> {
        models::captured_stack(&self.backtrace)
    }

    fn as_service_error(&self) -> Option<&ServiceError> {
        Some(self)
    }
}

impl Serialize for ServiceError {
    fn serialize<S: Serializer>(&self, serializer: S) -> result::Result<S::Ok, S::Error> {
        self.to_structured().serialize(serializer)
    }
}
