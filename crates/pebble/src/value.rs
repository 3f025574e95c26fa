//! The tagged dynamic value and its coercion rules.

use crate::{
    heap::{Heap, HeapData, HeapId},
    resource::ResourceTracker,
    types::ObjectKind,
};

/// Maximum container nesting depth rendered by [`to_repr_string`] before
/// eliding with `[...]`/`{...}`. Also the cycle guard: self-referential
/// containers bottom out here instead of recursing forever.
const MAX_REPR_DEPTH: usize = 8;

/// Primary value type representing script values at runtime.
///
/// Small immediate values are stored inline; heap objects are stored in the
/// arena and referenced via `Ref(HeapId)`. The whole enum is `Copy`:
/// ownership of heap objects belongs to the collector, and reachability is
/// what keeps them alive.
///
/// `Undef` is a container-internal sentinel (an empty map slot) and must
/// never escape to user code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// 64-bit IEEE-754 float; integers are the values with `trunc(x) == x`.
    Num(f64),
    /// Reference to a heap object.
    Ref(HeapId),
    /// Internal empty-slot sentinel. Never user-visible.
    Undef,
}

impl Value {
    /// Whether this is the null singleton.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this is a boolean.
    #[must_use]
    pub fn is_bool(&self) -> bool {
        matches!(self, Self::Bool(_))
    }

    /// Whether this is a number.
    #[must_use]
    pub fn is_num(&self) -> bool {
        matches!(self, Self::Num(_))
    }

    /// Whether this references a heap object.
    #[must_use]
    pub fn is_ref(&self) -> bool {
        matches!(self, Self::Ref(_))
    }

    /// Whether this references a heap object of the given kind.
    #[must_use]
    pub fn is_kind<T: ResourceTracker>(&self, kind: ObjectKind, heap: &Heap<T>) -> bool {
        self.kind(heap) == Some(kind)
    }

    /// The object kind, or `None` for primitives.
    #[must_use]
    pub fn kind<T: ResourceTracker>(&self, heap: &Heap<T>) -> Option<ObjectKind> {
        match self {
            Self::Ref(id) => Some(heap.get(*id).kind()),
            _ => None,
        }
    }

    /// Truth value: null and `false` are false, `0.0` is false, every other
    /// number is true, every heap object is true.
    #[must_use]
    pub fn truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => *b,
            Self::Num(n) => *n != 0.0,
            Self::Ref(_) => true,
            Self::Undef => unreachable!("Undef must never reach truthiness"),
        }
    }

    /// Numeric coercion: booleans coerce to `0`/`1`, numbers pass through,
    /// everything else is not numeric. This single rule backs every
    /// arithmetic operator.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Bool(b) => Some(f64::from(u8::from(*b))),
            Self::Num(n) => Some(*n),
            _ => None,
        }
    }

    /// Integer coercion: numeric coercion plus a `trunc(x) == x` check.
    #[must_use]
    pub fn as_integer(&self) -> Option<i64> {
        let n = self.as_number()?;
        if n.trunc() == n && n >= i64::MIN as f64 && n <= i64::MAX as f64 {
            Some(n as i64)
        } else {
            None
        }
    }

    /// The diagnostic type name (`Null`, `Bool`, `Num`, or the object
    /// kind's spelling).
    #[must_use]
    pub fn type_name<T: ResourceTracker>(&self, heap: &Heap<T>) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Bool(_) => "Bool",
            Self::Num(_) => "Num",
            Self::Ref(id) => heap.get(*id).type_name(),
            Self::Undef => unreachable!("Undef must never be named in diagnostics"),
        }
    }
}

/// Holds iff `0 <= index < len`.
#[must_use]
pub(crate) fn index_in_range(index: i64, len: usize) -> bool {
    index >= 0 && (index as u64) < len as u64
}

/// Formats a number the way scripts see it: integral values print without a
/// fractional part, non-integral values through `ryu`, and the non-finite
/// values as `inf`, `-inf`, and `nan`.
#[must_use]
pub fn fmt_number(n: f64) -> String {
    if n.is_nan() {
        return "nan".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf".to_owned() } else { "-inf".to_owned() };
    }
    if n.trunc() == n && n.abs() < 1e16 {
        return format!("{}", n as i64);
    }
    ryu::Buffer::new().format(n).to_owned()
}

/// Produces the string form of any value.
///
/// With `quote` set, string payloads are wrapped in double quotes — the form
/// used in diagnostics. Strings nested inside containers are always quoted.
#[must_use]
pub fn to_repr_string<T: ResourceTracker>(heap: &Heap<T>, value: Value, quote: bool) -> String {
    let mut out = String::new();
    repr_into(heap, value, quote, MAX_REPR_DEPTH, &mut out);
    out
}

fn repr_into<T: ResourceTracker>(heap: &Heap<T>, value: Value, quote: bool, depth: usize, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Num(n) => out.push_str(&fmt_number(n)),
        Value::Ref(id) => match heap.get(id) {
            HeapData::Str(s) => {
                if quote {
                    out.push('"');
                    out.push_str(s.as_str());
                    out.push('"');
                } else {
                    out.push_str(s.as_str());
                }
            }
            HeapData::List(list) => {
                if depth == 0 {
                    out.push_str("[...]");
                    return;
                }
                out.push('[');
                for (i, element) in list.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    repr_into(heap, element, true, depth - 1, out);
                }
                out.push(']');
            }
            HeapData::Map(map) => {
                if depth == 0 {
                    out.push_str("{...}");
                    return;
                }
                out.push('{');
                for (i, (key, entry_value)) in map.entries().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    repr_into(heap, key, true, depth - 1, out);
                    out.push(':');
                    repr_into(heap, entry_value, true, depth - 1, out);
                }
                out.push('}');
            }
            HeapData::Range(range) => {
                out.push('[');
                out.push_str(&fmt_number(range.from));
                out.push_str("..");
                out.push_str(&fmt_number(range.to));
                out.push(']');
            }
            HeapData::Function(function) => {
                out.push_str("[Func:");
                out.push_str(function.name());
                out.push(']');
            }
            HeapData::Module(module) => {
                out.push_str("[Module:");
                out.push_str(module.name());
                out.push(']');
            }
            HeapData::Fiber(_) => out.push_str("[Fiber]"),
            HeapData::UserObj(_) => out.push_str("[UserObj]"),
        },
        Value::Undef => unreachable!("Undef must never be rendered"),
    }
}
