//! Error definitions - the static identity of an error kind.
//!
//! A [`Definition`] pairs a stable machine-readable code with a display name
//! and a message template. Services declare their definitions once (usually
//! through [`define_errors!`](crate::define_errors)) and raise errors by code
//! from then on.
//!
//! # Identity vs. Runtime Data
//!
//! - **Identity** (`code`, `name`, `message` template, optional `status`):
//!   frozen in the definition, copied into every error built from it
//! - **Runtime data** (arguments, inner error, backtrace): supplied per call,
//!   owned by the constructed [`ServiceError`](crate::ServiceError)
//!
//! # Storage
//!
//! Fields are `Cow<'static, str>` so that definitions can be declared as
//! statics with zero allocation (`Cow::Borrowed`) and still be loaded from
//! configuration at runtime (`Cow::Owned`).
//!
//! # Example
//!
//! ```rust
//! use service_errors::{Definition, DEFAULT_ERROR};
//!
//! static E_TIMEOUT: Definition =
//!     Definition::const_new("E_TIMEOUT", "TimeoutError", "Timed out after %d ms");
//!
//! assert_eq!(E_TIMEOUT.code(), "E_TIMEOUT");
//! assert_eq!(E_TIMEOUT.placeholder_count(), 1);
//! assert_eq!(DEFAULT_ERROR.code(), "E_INTERNAL");
//! ```

use crate::binding;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Code of the built-in fallback definition.
pub const INTERNAL_CODE: &str = "E_INTERNAL";

/// The built-in internal-error definition.
///
/// Used by the factory whenever a code or definition cannot be resolved
/// against its registry. Never mutated.
pub static DEFAULT_ERROR: Definition =
    Definition::const_new(INTERNAL_CODE, "InternalError", "Internal error");

// ============================================================================
// Definition
// ============================================================================

/// Static description of an error kind: code, display name, message template.
///
/// The template may contain positional placeholders (`%s`, `%d`, `%j`) that
/// are bound to the leading construction arguments. See [`crate::binding`].
///
/// Definitions are immutable once built. Code uniqueness within a registry
/// is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Definition {
    code: Cow<'static, str>,
    name: Cow<'static, str>,
    message: Cow<'static, str>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    status: Option<u16>,
}

impl Definition {
    /// Create a definition from string literals (usable in `const`/`static`).
    #[inline]
    pub const fn const_new(code: &'static str, name: &'static str, message: &'static str) -> Self {
        Self {
            code: Cow::Borrowed(code),
            name: Cow::Borrowed(name),
            message: Cow::Borrowed(message),
            status: None,
        }
    }

    /// Create a definition with a status hint from string literals.
    #[inline]
    pub const fn const_with_status(
        code: &'static str,
        name: &'static str,
        message: &'static str,
        status: u16,
    ) -> Self {
        Self {
            code: Cow::Borrowed(code),
            name: Cow::Borrowed(name),
            message: Cow::Borrowed(message),
            status: Some(status),
        }
    }

    /// Create a definition at runtime.
    pub fn new(
        code: impl Into<Cow<'static, str>>,
        name: impl Into<Cow<'static, str>>,
        message: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Attach a status hint (HTTP-style) to a runtime definition.
    #[inline]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Stable machine-readable code.
    #[inline]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Display / category label.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Message template, placeholders unsubstituted.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Optional status hint carried into constructed errors.
    #[inline]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Number of positional placeholders in the template.
    pub fn placeholder_count(&self) -> usize {
        binding::count_placeholders(&self.message)
    }

    /// Whether this is the built-in internal-error definition.
    #[inline]
    pub fn is_internal(&self) -> bool {
        self.code == INTERNAL_CODE
    }

    #[inline]
    pub(crate) fn code_cow(&self) -> Cow<'static, str> {
        self.code.clone()
    }

    #[inline]
    pub(crate) fn name_cow(&self) -> Cow<'static, str> {
        self.name.clone()
    }

    #[inline]
    pub(crate) fn message_cow(&self) -> Cow<'static, str> {
        self.message.clone()
    }
}

impl fmt::Display for Definition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.code, self.name)
    }
}

// ============================================================================
// Tests
// ============================================================================
