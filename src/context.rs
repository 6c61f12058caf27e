//! Causal chain traversal.
//!
//! A [`ServiceError`](crate::ServiceError) may wrap an inner error, which may
//! itself be a typed error wrapping another, and so on. [`CauseChain`]
//! borrows every link of that chain, from the error itself down to the root
//! cause.
//!
//! Traversal follows typed errors only. A foreign cause (a [`GenericError`]
//! or adapted `std::error::Error`) is always the last link.
//!
//! # Example
//!
//! ```rust
//! use service_errors::{args, Definition, ErrorLike, GenericError, ServiceError};
//!
//! static E_QUERY: Definition = Definition::const_new("E_QUERY", "QueryError", "Query failed");
//! static E_REPORT: Definition = Definition::const_new("E_REPORT", "ReportError", "Report %s failed");
//!
//! let query = ServiceError::new(&E_QUERY, args![GenericError::new("connection refused")]);
//! let report = ServiceError::new(&E_REPORT, args![query, "weekly"]);
//!
//! let chain = report.chain();
//! assert_eq!(chain.depth(), 3);
//! assert_eq!(chain.root().error_message(), "connection refused");
//! assert_eq!(chain.summary(), "Report weekly failed → Query failed → connection refused");
//! ```
//!
//! [`GenericError`]: crate::GenericError

use crate::ErrorLike;
use smallvec::SmallVec;

/// Borrowed view over a causal chain, from head (the outermost error) to
/// root (the innermost cause).
///
/// Never empty: the head is always present.
pub struct CauseChain<'a> {
    /// Index 0 is the head, last index is the root cause.
    links: SmallVec<[&'a dyn ErrorLike; 4]>,
}

impl<'a> CauseChain<'a> {
    /// Collect the chain starting at `head`.
    pub fn new(head: &'a dyn ErrorLike) -> Self {
        let mut links: SmallVec<[&'a dyn ErrorLike; 4]> = SmallVec::new();
        let mut next = Some(head);

        while let Some(link) = next {
            links.push(link);
            next = link
                .as_service_error()
                .and_then(|typed| typed.inner_error())
                .map(|inner| inner.as_ref());
        }

        Self { links }
    }

    /// The outermost error.
    #[inline]
    pub fn head(&self) -> &'a dyn ErrorLike {
        self.links[0]
    }

    /// The innermost cause (the head itself when there is no cause).
    #[inline]
    pub fn root(&self) -> &'a dyn ErrorLike {
        self.links[self.links.len() - 1]
    }

    /// Number of errors in the chain, head included.
    #[inline]
    pub fn depth(&self) -> usize {
        self.links.len()
    }

    /// Iterate from head to root.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &'a dyn ErrorLike> + '_ {
        self.links.iter().copied()
    }

    /// Codes along the chain; links without a code are skipped.
    pub fn codes(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.iter().filter_map(|link| link.error_code())
    }

    /// One-line narrative of the chain's messages, head first.
    pub fn summary(&self) -> String {
        let separator = " → ";
        let messages: SmallVec<[_; 4]> = self.iter().map(|link| link.error_message()).collect();

        let capacity = messages.iter().map(|m| m.len()).sum::<usize>()
            + messages.len().saturating_sub(1) * separator.len();
        let mut result = String::with_capacity(capacity);

        for (i, message) in messages.iter().enumerate() {
            if i > 0 {
                result.push_str(separator);
            }
            result.push_str(message);
        }

        result
    }
}

impl std::fmt::Debug for CauseChain<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.iter().map(|link| link.error_name()))
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use crate::{Definition, ErrorLike, GenericError, ServiceError, args};

    static E_LOW: Definition = Definition::const_new("E_LOW", "LowError", "low");
    static E_MID: Definition = Definition::const_new("E_MID", "MidError", "mid %s");
    static E_TOP: Definition = Definition::const_new("E_TOP", "TopError", "top");

    fn three_levels() -> ServiceError {
        let low = ServiceError::new(&E_LOW, args![GenericError::new("disk full").with_code("ENOSPC")]);
        let mid = ServiceError::new(&E_MID, args![low, "write"]);
        ServiceError::new(&E_TOP, args![mid])
    }

    #[test]
    fn single_error_chain() {
        let err = ServiceError::new(&E_LOW, args![]);
        let chain = err.chain();
        assert_eq!(chain.depth(), 1);
        assert_eq!(chain.head().error_code(), Some("E_LOW"));
        assert_eq!(chain.root().error_code(), Some("E_LOW"));
        assert_eq!(chain.summary(), "low");
    }

    #[test]
    fn chain_walks_to_foreign_root() {
        let err = three_levels();
        let chain = err.chain();

        assert_eq!(chain.depth(), 4);
        assert_eq!(chain.root().error_name(), "Error");
        assert_eq!(chain.root().error_message(), "disk full");
        assert_eq!(
            chain.codes().collect::<Vec<_>>(),
            vec!["E_TOP", "E_MID", "E_LOW", "ENOSPC"]
        );
    }

    #[test]
    fn iteration_is_head_first() {
        let err = three_levels();
        let names: Vec<String> = err
            .chain()
            .iter()
            .map(|link| link.error_name().into_owned())
            .collect();
        assert_eq!(names, ["TopError", "MidError", "LowError", "Error"]);
    }

    #[test]
    fn summary_joins_messages() {
        let err = three_levels();
        assert_eq!(err.chain().summary(), "top → mid write → low → disk full");
    }

    #[test]
    fn debug_lists_names() {
        let err = three_levels();
        assert_eq!(
            format!("{:?}", err.chain()),
            r#"["TopError", "MidError", "LowError", "Error"]"#
        );
    }
}
