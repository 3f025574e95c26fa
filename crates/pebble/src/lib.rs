#![doc = include_str!("../../../README.md")]
#![expect(clippy::cast_possible_truncation, reason = "numeric narrowing is checked")]
#![expect(clippy::cast_sign_loss, reason = "index casts are bounds-checked first")]
#![expect(clippy::cast_possible_wrap, reason = "hash lanes reinterpret bit patterns")]
#![expect(clippy::float_cmp, reason = "integer checks require exact float comparison")]
#![expect(clippy::unnecessary_wraps, reason = "native callback signatures are uniform")]

mod args;
pub mod attrs;
mod builtins;
mod error;
mod function;
mod hash;
mod heap;
mod io;
pub mod iter;
mod modules;
pub mod ops;
mod resource;
mod tracer;
mod types;
mod value;
mod vm;

pub use crate::{
    error::{ErrorKind, RunError, RunResult},
    function::{ARITY_VARIADIC, Code, FnKind, Function, NativeId},
    heap::{Heap, HeapData, HeapId, HeapStats},
    io::{CollectStringWrite, NoWrite, StdWrite, WriteHook},
    resource::{LimitedTracker, NoLimitTracker, ResourceError, ResourceLimits, ResourceTracker},
    tracer::{NoopTracer, RecordingTracer, TraceEvent, VmTracer},
    types::{Fiber, List, Map, Module, ObjectKind, Range, Str, UserObj},
    value::{Value, fmt_number, to_repr_string},
    vm::{NativeFn, Vm},
};
