//! Convenience macros for declaring definitions and raising errors.
//!
//! # Usage
//!
//! ```rust
//! use service_errors::{define_errors, service_error, Factory};
//! use std::sync::Arc;
//!
//! define_errors! {
//!     pub fn registry() => {
//!         E_TIMEOUT = ("TimeoutError", "Timed out after %d ms", 504),
//!         E_CONFLICT = ("ConflictError", "%s already exists"),
//!     }
//! }
//!
//! let factory = Factory::new(Some(Arc::new(registry()))).unwrap();
//! let err = service_error!(factory, &E_TIMEOUT, 3000);
//! assert_eq!(err.message(), "Timed out after 3000 ms");
//! ```
//!
//! The code of each definition is the identifier itself (`E_TIMEOUT` above),
//! so a definition can never drift from the name it is declared under.

/// Declare a single definition as a `pub static`.
///
/// ```rust
/// # use service_errors::define_error;
/// define_error!(E_GONE, "GoneError", "%s is gone", 410);
/// assert_eq!(E_GONE.code(), "E_GONE");
/// assert_eq!(E_GONE.status(), Some(410));
/// ```
#[macro_export]
macro_rules! define_error {
    ($name:ident, $err_name:expr, $message:expr) => {
        pub static $name: $crate::Definition =
            $crate::Definition::const_new(stringify!($name), $err_name, $message);
    };
    ($name:ident, $err_name:expr, $message:expr, $status:expr) => {
        pub static $name: $crate::Definition =
            $crate::Definition::const_with_status(stringify!($name), $err_name, $message, $status);
    };
}

/// Declare multiple definitions, optionally with a function returning a
/// [`Registry`](crate::Registry) of all of them.
///
/// ```rust
/// # use service_errors::define_errors;
/// define_errors! {
///     E_READ = ("ReadError", "Cannot read %s"),
///     E_WRITE = ("WriteError", "Cannot write %s"),
/// }
/// assert_eq!(E_WRITE.name(), "WriteError");
/// ```
#[macro_export]
macro_rules! define_errors {
    ($vis:vis fn $registry:ident() => {
        $( $name:ident = ($err_name:expr, $message:expr $(, $status:expr)?) ),+ $(,)?
    }) => {
        $(
            $crate::define_error!($name, $err_name, $message $(, $status)?);
        )+

        /// Registry of every definition declared alongside this function.
        $vis fn $registry() -> $crate::Registry {
            $crate::Registry::from_definitions([$( &$name ),+])
        }
    };
    ($( $name:ident = ($err_name:expr, $message:expr $(, $status:expr)?) ),+ $(,)?) => {
        $(
            $crate::define_error!($name, $err_name, $message $(, $status)?);
        )+
    };
}

/// Build a `Vec<Arg>` from heterogeneous values.
///
/// Each element is converted with `Arg::from`, so strings, numbers, booleans,
/// JSON values and error types can be mixed freely.
///
/// ```rust
/// # use service_errors::{args, Arg, GenericError};
/// let list = args![GenericError::new("cause"), "x", 1, true];
/// assert!(list[0].is_error_like());
/// assert_eq!(list.len(), 4);
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::Arg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$( $crate::Arg::from($arg) ),+]
    };
}

/// Create an error through a factory: `service_error!(factory, code, args...)`.
///
/// The lookup can be anything convertible into a [`Lookup`](crate::Lookup):
/// a code string, a `&Definition`, a JSON value.
#[macro_export]
macro_rules! service_error {
    ($factory:expr, $lookup:expr $(,)?) => {
        $factory.create($lookup, $crate::args![])
    };
    ($factory:expr, $lookup:expr, $($arg:expr),+ $(,)?) => {
        $factory.create($lookup, $crate::args![$($arg),+])
    };
}

/// Declare a named wrapper variant around [`ServiceError`](crate::ServiceError).
///
/// The variant gets its own factory (`Variant::factory(registry)`), derefs to
/// the base error and implements every capability the base error does, so it
/// satisfies checks against both types.
///
/// ```rust
/// use service_errors::{args, service_error_variant, Definition, Registry, ServiceError, ServiceErrorVariant};
/// use std::sync::Arc;
///
/// service_error_variant! {
///     /// Errors raised by the billing service.
///     pub struct BillingError, name = "BillingError";
/// }
///
/// let registry = Registry::from_definitions([&Definition::const_new("E_CARD", "CardError", "Card declined")]);
/// let factory = BillingError::factory(Some(Arc::new(registry))).unwrap();
///
/// let err: BillingError = factory.create("E_CARD", args![]);
/// let base: &ServiceError = err.as_ref();
/// assert_eq!(base.code(), "E_CARD");
/// assert_eq!(err.name(), "BillingError");
/// ```
#[macro_export]
macro_rules! service_error_variant {
    ($(#[$meta:meta])* $vis:vis struct $variant:ident $(, name = $name:expr)? ;) => {
        $(#[$meta])*
        #[derive(Debug)]
        $vis struct $variant($crate::ServiceError);

        impl $crate::ServiceErrorVariant for $variant {
            fn construct(
                definition: &$crate::Definition,
                args: ::std::vec::Vec<$crate::Arg>,
            ) -> Self {
                #[allow(unused_mut)]
                let mut error = $crate::ServiceError::new(definition, args);
                $( error.set_name($name); )?
                Self(error)
            }
        }

        impl ::std::convert::AsRef<$crate::ServiceError> for $variant {
            fn as_ref(&self) -> &$crate::ServiceError {
                &self.0
            }
        }

        impl ::std::ops::Deref for $variant {
            type Target = $crate::ServiceError;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl ::std::convert::From<$variant> for $crate::ServiceError {
            fn from(variant: $variant) -> Self {
                variant.0
            }
        }

        impl ::std::convert::From<$variant> for $crate::Arg {
            fn from(variant: $variant) -> Self {
                $crate::Arg::error(variant)
            }
        }

        impl ::std::fmt::Display for $variant {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                ::std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl ::std::error::Error for $variant {
            fn source(&self) -> ::std::option::Option<&(dyn ::std::error::Error + 'static)> {
                ::std::error::Error::source(&self.0)
            }
        }

        impl $crate::ErrorLike for $variant {
            fn error_name(&self) -> ::std::borrow::Cow<'_, str> {
                $crate::ErrorLike::error_name(&self.0)
            }

            fn error_message(&self) -> ::std::borrow::Cow<'_, str> {
                $crate::ErrorLike::error_message(&self.0)
            }

            fn error_code(&self) -> ::std::option::Option<&str> {
                $crate::ErrorLike::error_code(&self.0)
            }

            fn status(&self) -> ::std::option::Option<u16> {
                $crate::ErrorLike::status(&self.0)
            }

            fn stack(&self) -> ::std::option::Option<::std::string::String> {
                $crate::ErrorLike::stack(&self.0)
            }

            fn as_service_error(&self) -> ::std::option::Option<&$crate::ServiceError> {
                ::std::option::Option::Some(&self.0)
            }
        }

        impl $crate::serde::Serialize for $variant {
            fn serialize<S: $crate::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::std::result::Result<S::Ok, S::Error> {
                $crate::serde::Serialize::serialize(&self.0, serializer)
            }
        }
    };
}

// ============================================================================
// Tests
// ============================================================================
