//! Immutable string objects.

use crate::hash::hash_str;

/// An immutable string with its content hash cached at construction.
///
/// Strings are byte-indexed (a stated non-goal rules out code-point
/// indexing). The cached hash is what maps rely on, so any native that
/// produces a transformed string must go through [`Str::new`], which
/// computes the hash for the new content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Str {
    text: String,
    hash: u64,
}

impl Str {
    /// Creates a string, computing and caching its content hash.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let hash = hash_str(&text);
        Self { text, hash }
    }

    /// Creates a one-byte string from the byte at some offset of another
    /// string. Bytes above 0x7f surface as the corresponding Latin-1 code
    /// point; ASCII content round-trips exactly.
    #[must_use]
    pub fn from_byte(byte: u8) -> Self {
        Self::new(char::from(byte).to_string())
    }

    /// The string content.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    /// Whether the string is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The byte at `index`. Callers must have bounds-checked.
    #[must_use]
    pub fn byte_at(&self, index: usize) -> u8 {
        self.text.as_bytes()[index]
    }

    /// The cached content hash.
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Estimated heap footprint in bytes.
    #[must_use]
    pub(crate) fn estimate_size(&self) -> usize {
        std::mem::size_of::<Self>() + self.text.capacity()
    }
}

impl From<&str> for Str {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// The hash is cached at construction and matches recomputation.
    #[test]
    fn hash_cached_on_construction() {
        let s = Str::new("hello");
        assert_eq!(s.hash(), crate::hash::hash_str("hello"));
        assert_eq!(Str::new("hello").hash(), s.hash());
        assert_ne!(Str::new("HELLO").hash(), s.hash());
    }

    /// One-byte strings round-trip ASCII bytes.
    #[test]
    fn from_byte_ascii() {
        let s = Str::from_byte(b'x');
        assert_eq!(s.as_str(), "x");
        assert_eq!(s.len(), 1);
    }
}
