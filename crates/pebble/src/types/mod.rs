//! Heap object kinds and their payload types.

pub(crate) mod fiber;
pub(crate) mod list;
pub(crate) mod map;
pub(crate) mod module;
pub(crate) mod range;
pub(crate) mod str;

pub use self::{
    fiber::Fiber,
    list::List,
    map::Map,
    module::Module,
    range::Range,
    str::Str,
};

/// Discriminates the kinds of heap objects.
///
/// The `Display` spellings are the ones used in diagnostics, e.g.
/// `Unsupported operand types for '+' String and Num`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::IntoStaticStr)]
pub enum ObjectKind {
    #[strum(serialize = "String")]
    Str,
    List,
    Map,
    Range,
    #[strum(serialize = "Func")]
    Function,
    Module,
    Fiber,
    UserObj,
}

/// An opaque host-defined object.
///
/// The payload is a host-managed token; it round-trips between host and VM
/// without the VM attaching any intrinsic attributes or operators to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UserObj {
    token: u64,
}

impl UserObj {
    /// Wraps a host token.
    #[must_use]
    pub fn new(token: u64) -> Self {
        Self { token }
    }

    /// Returns the host token.
    #[must_use]
    pub fn token(&self) -> u64 {
        self.token
    }
}
