//! Runtime error channel for the value layer.
//!
//! Every fallible core operation returns [`RunResult`]. The interpreter (or
//! [`crate::Vm::call_function`]) converts an `Err` into the wire contract: a
//! string written into the running fiber's error slot. The message text is
//! the contract; [`ErrorKind`] exists so hosts and tests can classify
//! failures without parsing messages.

use strum::{Display, IntoStaticStr};

use crate::resource::ResourceError;

/// Result type alias for operations that can produce a runtime error.
pub type RunResult<T> = Result<T, RunError>;

/// Classification of a runtime failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum ErrorKind {
    /// Operand or argument of the wrong kind.
    Type,
    /// Index outside a container's bounds.
    Range,
    /// Missing attribute or map key.
    Lookup,
    /// Write to an immutable attribute or object.
    Immutable,
    /// No operator definition for the operand types.
    UnsupportedOperand,
    /// `assert` builtin failure.
    Assertion,
    /// Reserved behavior that has no definition yet.
    NotImplemented,
    /// A heap allocation exceeded a configured budget.
    Resource,
}

/// A runtime error: a classification plus the exact message that ends up in
/// the fiber's error slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunError {
    kind: ErrorKind,
    message: String,
}

impl RunError {
    /// Creates an error with an explicit kind and message.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// The error classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The message written into the fiber error slot.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// `<role> must be a numeric value.`
    pub(crate) fn numeric_required(role: &str) -> Self {
        Self::new(ErrorKind::Type, format!("{role} must be a numeric value."))
    }

    /// `<role> must be an integer.`
    pub(crate) fn integer_required(role: &str) -> Self {
        Self::new(ErrorKind::Type, format!("{role} must be an integer."))
    }

    /// `<type> is not subscriptable.`
    pub(crate) fn not_subscriptable(type_name: &str) -> Self {
        Self::new(ErrorKind::Type, format!("{type_name} is not subscriptable."))
    }

    /// `<type> is not hashable.`
    pub(crate) fn not_hashable(type_name: &str) -> Self {
        Self::new(ErrorKind::Type, format!("{type_name} is not hashable."))
    }

    /// `<type> is not iterable.`
    pub(crate) fn not_iterable(type_name: &str) -> Self {
        Self::new(ErrorKind::Type, format!("{type_name} is not iterable."))
    }

    /// `<container> index out of range.`
    pub(crate) fn index_out_of_range(container: &str) -> Self {
        Self::new(ErrorKind::Range, format!("{container} index out of range."))
    }

    /// `'<kind>' objects has no attribute named '<name>'.`
    ///
    /// The grammar is preserved verbatim from the language's diagnostics.
    pub(crate) fn no_attribute(kind: &str, name: &str) -> Self {
        Self::new(
            ErrorKind::Lookup,
            format!("'{kind}' objects has no attribute named '{name}'."),
        )
    }

    /// `Key '<k>' not exists.`
    pub(crate) fn key_not_exists(key_repr: &str) -> Self {
        Self::new(ErrorKind::Lookup, format!("Key '{key_repr}' not exists."))
    }

    /// `Key ("<k>") not exists.` — the attribute-access spelling.
    pub(crate) fn attr_key_not_exists(key: &str) -> Self {
        Self::new(ErrorKind::Lookup, format!("Key (\"{key}\") not exists."))
    }

    /// `Invalid key '<k>'.`
    pub(crate) fn invalid_key(key_repr: &str) -> Self {
        Self::new(ErrorKind::Lookup, format!("Invalid key '{key_repr}'."))
    }

    /// `'<name>' attribute is immutable.`
    pub(crate) fn attribute_immutable(name: &str) -> Self {
        Self::new(ErrorKind::Immutable, format!("'{name}' attribute is immutable."))
    }

    /// `String objects are immutable.`
    pub(crate) fn string_immutable() -> Self {
        Self::new(ErrorKind::Immutable, "String objects are immutable.")
    }

    /// `Unsupported operand types for '<op>' <lhs> and <rhs>`
    pub(crate) fn unsupported_operands(op: &str, lhs: &str, rhs: &str) -> Self {
        Self::new(
            ErrorKind::UnsupportedOperand,
            format!("Unsupported operand types for '{op}' {lhs} and {rhs}"),
        )
    }

    /// `Assertion failed.` or `Assertion failed: '<msg>'.`
    pub(crate) fn assertion(message: Option<&str>) -> Self {
        match message {
            Some(msg) => Self::new(ErrorKind::Assertion, format!("Assertion failed: '{msg}'.")),
            None => Self::new(ErrorKind::Assertion, "Assertion failed."),
        }
    }

    /// `Expected a <kind> at argument <i>.`
    pub(crate) fn expected_argument(kind: &str, index: usize) -> Self {
        Self::new(ErrorKind::Type, format!("Expected a {kind} at argument {index}."))
    }

    /// Reserved `String %` formatting path.
    pub(crate) fn string_format_unimplemented() -> Self {
        Self::new(ErrorKind::NotImplemented, "String formatting is not yet implemented.")
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for RunError {}

impl From<ResourceError> for RunError {
    fn from(err: ResourceError) -> Self {
        Self::new(ErrorKind::Resource, err.to_string())
    }
}
