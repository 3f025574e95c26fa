//! Function objects: scripted bytecode bodies and native callbacks.

use crate::value::Value;

/// Index into the VM's native-callback table.
///
/// Callbacks are host `fn` pointers; the heap stores only this index, so
/// heap data stays plain and the same function object shape carries either
/// body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeId(pub(crate) u32);

impl NativeId {
    #[must_use]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// A compiled bytecode body. The compiler (an external collaborator) fills
/// this in; the value layer only owns the constants for GC tracing.
#[derive(Debug, Default, Clone)]
pub struct Code {
    /// Constant pool referenced by the opcodes.
    pub constants: Vec<Value>,
    /// Raw opcode stream.
    pub ops: Vec<u8>,
}

/// What a function executes when called.
#[derive(Debug, Clone)]
pub enum FnKind {
    /// A host callback, dispatched through the VM's native table.
    Native(NativeId),
    /// A compiled bytecode body, executed by the external interpreter.
    Bytecode(Code),
}

/// Arity marker for variadic functions.
pub const ARITY_VARIADIC: i32 = -1;

/// A callable function object.
#[derive(Debug, Clone)]
pub struct Function {
    name: String,
    /// Fixed positional count, or [`ARITY_VARIADIC`].
    arity: i32,
    kind: FnKind,
}

impl Function {
    /// Creates a function backed by a native callback.
    pub fn native(name: impl Into<String>, arity: i32, native: NativeId) -> Self {
        Self {
            name: name.into(),
            arity,
            kind: FnKind::Native(native),
        }
    }

    /// Creates a function backed by a bytecode body.
    pub fn bytecode(name: impl Into<String>, arity: i32, code: Code) -> Self {
        Self {
            name: name.into(),
            arity,
            kind: FnKind::Bytecode(code),
        }
    }

    /// The function name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared arity; [`ARITY_VARIADIC`] means any count.
    #[must_use]
    pub fn arity(&self) -> i32 {
        self.arity
    }

    /// Whether the function accepts any argument count.
    #[must_use]
    pub fn is_variadic(&self) -> bool {
        self.arity == ARITY_VARIADIC
    }

    /// The function body.
    #[must_use]
    pub fn kind(&self) -> &FnKind {
        &self.kind
    }

    /// Whether the body is a native callback.
    #[must_use]
    pub fn is_native(&self) -> bool {
        matches!(self.kind, FnKind::Native(_))
    }

    /// Estimated heap footprint in bytes.
    #[must_use]
    pub(crate) fn estimate_size(&self) -> usize {
        let body = match &self.kind {
            FnKind::Native(_) => 0,
            FnKind::Bytecode(code) => {
                code.constants.capacity() * std::mem::size_of::<Value>() + code.ops.capacity()
            }
        };
        std::mem::size_of::<Self>() + self.name.capacity() + body
    }
}
