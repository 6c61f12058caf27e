//! Shared model types: the error-like capability, construction arguments and
//! the structured (JSON) form of an error chain.
//!
//! # Error-Like Capability
//!
//! Any value that can sit in the causal slot of a [`ServiceError`] implements
//! [`ErrorLike`]. The contract is structural - a name and a message, plus
//! optional code, status, extra fields and a stack - so the crate's own
//! [`ServiceError`], the ad-hoc [`GenericError`] and any adapted
//! `std::error::Error` ([`ForeignError`]) all qualify without a common base
//! type.
//!
//! # Arguments
//!
//! Construction arguments are [`Arg`] values: either plain JSON data or a
//! shared error-like value. Only an error in the *first* position is treated
//! as the inner error; everything else becomes positional data.

use crate::ServiceError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

// ============================================================================
// Error-Like Capability
// ============================================================================

/// Capability of values that can act as a causal error.
///
/// Only [`error_name`](ErrorLike::error_name) has no sensible default for
/// most types; every other method has a conservative default.
pub trait ErrorLike: std::error::Error + Send + Sync + 'static {
    /// Display / category label (e.g. `"TimeoutError"`).
    fn error_name(&self) -> Cow<'_, str> {
        Cow::Borrowed("Error")
    }

    /// Human-readable message. Defaults to the `Display` output.
    fn error_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    /// Machine-readable code, when the error carries one.
    fn error_code(&self) -> Option<&str> {
        None
    }

    /// Status hint, when the error carries one.
    fn status(&self) -> Option<u16> {
        None
    }

    /// Additional own fields exposed in the structured and display forms.
    fn fields(&self) -> Map<String, Value> {
        Map::new()
    }

    /// Rendered stack trace, when one was captured.
    fn stack(&self) -> Option<String> {
        None
    }

    /// Access the underlying typed error, for errors built by this crate.
    fn as_service_error(&self) -> Option<&ServiceError> {
        None
    }

    /// Structured form, for errors that have one.
    fn structured(&self) -> Option<StructuredError> {
        self.as_service_error().map(ServiceError::to_structured)
    }
}

/// Render a backtrace only when it was actually captured.
pub(crate) fn captured_stack(backtrace: &Backtrace) -> Option<String> {
    match backtrace.status() {
        BacktraceStatus::Captured => Some(backtrace.to_string()),
        _ => None,
    }
}

// ============================================================================
// Generic Error
// ============================================================================

/// A plain named error with optional code, status and extra fields.
///
/// The lightweight counterpart of [`ServiceError`] for causes that do not come
/// from a registry.
///
/// ```rust
/// use service_errors::{ErrorLike, GenericError};
///
/// let err = GenericError::new("connection refused")
///     .with_code("ECONNREFUSED")
///     .with_field("port", 5432);
///
/// assert_eq!(err.error_name(), "Error");
/// assert_eq!(err.error_code(), Some("ECONNREFUSED"));
/// assert_eq!(err.fields()["port"], 5432);
/// ```
#[derive(Clone)]
pub struct GenericError {
    name: Cow<'static, str>,
    message: String,
    code: Option<String>,
    status: Option<u16>,
    fields: Map<String, Value>,
    backtrace: Arc<Backtrace>,
}

impl GenericError {
    /// Create an error named `"Error"`.
    pub fn new(message: impl Into<String>) -> Self {
        Self::named("Error", message)
    }

    /// Create an error with an explicit name.
    pub fn named(name: impl Into<Cow<'static, str>>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
            code: None,
            status: None,
            fields: Map::new(),
            backtrace: Arc::new(Backtrace::capture()),
        }
    }

    /// Attach a machine-readable code.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach a status hint.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach an extra field.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialisation
    /// fails, the field is silently skipped. Reserved keys (`name`,
    /// `message`, `code`, `rawMessage`, `data`, `innerError`) are ignored.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        let key = key.into();
        if is_reserved_key(&key) {
            return self;
        }
        if let Ok(v) = serde_json::to_value(value) {
            self.fields.insert(key, v);
        }
        self
    }
}

impl fmt::Debug for GenericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("GenericError");
        d.field("name", &self.name);
        d.field("message", &self.message);
        if let Some(ref code) = self.code {
            d.field("code", code);
        }
        if !self.fields.is_empty() {
            d.field("fields", &self.fields);
        }
        d.finish()
    }
}

impl fmt::Display for GenericError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl std::error::Error for GenericError {}

impl ErrorLike for GenericError {
    fn error_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn error_message(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.message)
    }

    fn error_code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    fn status(&self) -> Option<u16> {
        self.status
    }

    fn fields(&self) -> Map<String, Value> {
        self.fields.clone()
    }

    fn stack(&self) -> Option<String> {
        captured_stack(&self.backtrace)
    }
}

// ============================================================================
// Foreign Error Adapter
// ============================================================================

/// Adapter that lets any `std::error::Error` sit in the causal slot.
///
/// The name defaults to the error's short type name (`io::Error` becomes
/// `"Error"`, `ParseIntError` stays `"ParseIntError"`).
///
/// ```rust
/// use service_errors::{ErrorLike, ForeignError};
///
/// let parse = "x".parse::<u8>().unwrap_err();
/// let adapted = ForeignError::new(parse);
/// assert_eq!(adapted.error_name(), "ParseIntError");
/// ```
pub struct ForeignError {
    name: Cow<'static, str>,
    error: Box<dyn std::error::Error + Send + Sync>,
    backtrace: Backtrace,
}

impl ForeignError {
    /// Adapt an error, naming it after its type.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::named(short_type_name::<E>(), error)
    }

    /// Adapt an error under an explicit name.
    pub fn named<E>(name: impl Into<Cow<'static, str>>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            error: Box::new(error),
            backtrace: Backtrace::capture(),
        }
    }

    /// Backtrace captured when the error was adapted.
    #[inline]
    pub fn backtrace(&self) -> &Backtrace {
        &self.backtrace
    }

    /// The wrapped error.
    #[inline]
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.error.as_ref()
    }
}

fn short_type_name<E>() -> &'static str {
    let full = std::any::type_name::<E>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

impl fmt::Debug for ForeignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForeignError")
            .field("name", &self.name)
            .field("error", &self.error)
            .finish()
    }
}

impl fmt::Display for ForeignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl std::error::Error for ForeignError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.error.source()
    }
}

impl ErrorLike for ForeignError {
    fn error_name(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.name)
    }

    fn stack(&self) -> Option<String> {
        captured_stack(&self.backtrace)
    }
}

// ============================================================================
// Construction Arguments
// ============================================================================

/// One positional construction argument.
#[derive(Debug, Clone)]
pub enum Arg {
    /// Plain data, substituted into the template and kept in `data`.
    Value(Value),
    /// An error-like value; becomes the inner error in first position.
    Error(Arc<dyn ErrorLike>),
}

impl Arg {
    /// Convert any serializable value. Serialization failure yields `null`.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        Self::Value(serde_json::to_value(value).unwrap_or(Value::Null))
    }

    /// Wrap an error-like value.
    pub fn error<E: ErrorLike>(error: E) -> Self {
        Self::Error(Arc::new(error))
    }

    /// Whether this argument satisfies the error-like capability.
    #[inline]
    pub const fn is_error_like(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    /// Project into positional data. Errors are projected to their
    /// structured form.
    pub fn into_value(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::Error(error) => {
                serde_json::to_value(StructuredInner::from_error(error.as_ref())).unwrap_or(Value::Null)
            }
        }
    }
}

macro_rules! impl_arg_from_value {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for Arg {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )+
    };
}

impl_arg_from_value!(&str, String, bool, i8, i16, i32, i64, u8, u16, u32, u64, usize, isize, f32, f64);

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Self::Value(Value::String(value.clone()))
    }
}

impl From<Value> for Arg {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl<T: Into<Arg>> From<Option<T>> for Arg {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Value(Value::Null), Into::into)
    }
}

impl From<Arc<dyn ErrorLike>> for Arg {
    fn from(error: Arc<dyn ErrorLike>) -> Self {
        Self::Error(error)
    }
}

impl From<GenericError> for Arg {
    fn from(error: GenericError) -> Self {
        Self::error(error)
    }
}

impl From<ForeignError> for Arg {
    fn from(error: ForeignError) -> Self {
        Self::error(error)
    }
}

impl From<ServiceError> for Arg {
    fn from(error: ServiceError) -> Self {
        Self::error(error)
    }
}

// ============================================================================
// Structured Form
// ============================================================================

/// Machine-readable form of a [`ServiceError`].
///
/// Serializes with camelCase keys: `code, name, message, rawMessage, data,
/// innerError`. `innerError` is `null` when there is no cause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredError {
    /// Stable code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Bound message.
    pub message: String,
    /// Unsubstituted template.
    pub raw_message: String,
    /// Positional arguments.
    pub data: Vec<Value>,
    /// Structured cause.
    pub inner_error: Option<Box<StructuredInner>>,
}

impl StructuredError {
    /// Number of errors in the chain, this one included.
    pub fn depth(&self) -> usize {
        let mut depth = 1;
        let mut next = self.inner_error.as_deref();
        while let Some(inner) = next {
            depth += 1;
            next = inner.inner();
        }
        depth
    }
}

/// Structured form of a cause: either a nested typed error or a projection
/// of a foreign error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StructuredInner {
    /// A cause that exposes its own structured form.
    Typed(Box<StructuredError>),
    /// A projected foreign cause.
    Foreign(ForeignRecord),
}

impl StructuredInner {
    /// Build the structured form of any error-like value.
    pub fn from_error(error: &dyn ErrorLike) -> Self {
        match error.structured() {
            Some(structured) => Self::Typed(Box::new(structured)),
            None => Self::Foreign(ForeignRecord::project(error)),
        }
    }

    /// Code of this cause, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Typed(typed) => Some(&typed.code),
            Self::Foreign(record) => record.code.as_deref(),
        }
    }

    /// Name of this cause.
    pub fn name(&self) -> &str {
        match self {
            Self::Typed(typed) => &typed.name,
            Self::Foreign(record) => &record.name,
        }
    }

    /// Message of this cause.
    pub fn message(&self) -> &str {
        match self {
            Self::Typed(typed) => &typed.message,
            Self::Foreign(record) => &record.message,
        }
    }

    /// The next cause down the chain. Foreign projections end the chain.
    pub fn inner(&self) -> Option<&StructuredInner> {
        match self {
            Self::Typed(typed) => typed.inner_error.as_deref(),
            Self::Foreign(_) => None,
        }
    }
}

/// Projection of an error without a structured form: name, message, code
/// and the error's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignRecord {
    /// Error name.
    pub name: String,
    /// Error message.
    pub message: String,
    /// Error code, omitted when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Own fields of the projected error.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ForeignRecord {
    /// Project an error-like value.
    pub fn project(error: &dyn ErrorLike) -> Self {
        let mut fields = error.fields();
        fields.retain(|key, _| !is_reserved_key(key));
        Self {
            name: error.error_name().into_owned(),
            message: error.error_message().into_owned(),
            code: error.error_code().map(str::to_owned),
            fields,
        }
    }
}

/// Keys owned by the structured forms. A projected field with one of these
/// names would make a foreign record read back as a typed error.
fn is_reserved_key(key: &str) -> bool {
    matches!(
        key,
        "name" | "message" | "code" | "rawMessage" | "data" | "innerError"
    )
}
