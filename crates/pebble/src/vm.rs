//! The virtual machine: heap, registries, and native dispatch.

use indexmap::IndexMap;

use crate::{
    builtins,
    error::{ErrorKind, RunError, RunResult},
    function::{FnKind, Function, NativeId},
    heap::{Heap, HeapData, HeapId},
    io::WriteHook,
    modules,
    resource::{NoLimitTracker, ResourceTracker},
    types::{Fiber, Str},
    tracer::{NoopTracer, VmTracer},
    value::Value,
};

/// A native function callback.
///
/// The callback reads its arguments through the accessors on [`Vm`]
/// (`argc`, `arg_number`, ...) and either writes a return value through the
/// `return_*` setters or fails with an error. A callback that does neither
/// returns null implicitly; the result slot is pre-initialized.
pub type NativeFn<T> = fn(&mut Vm<T>) -> RunResult<()>;

/// A virtual machine instance. Owns all script-visible state.
///
/// All state is per-instance; there is no global mutable state in the value
/// layer. The interpreter and the host both drive the VM through `&mut`
/// access, so execution is single-threaded and cooperative.
pub struct Vm<T: ResourceTracker = NoLimitTracker> {
    heap: Heap<T>,
    /// Registered modules by name, in registration order.
    modules: IndexMap<String, HeapId>,
    /// The flat built-in namespace, seeded at construction. These names are
    /// reserved; scripts cannot shadow them.
    builtins: IndexMap<String, HeapId>,
    /// Host callbacks referenced by `FnKind::Native` ids.
    natives: Vec<NativeFn<T>>,
    /// The currently running fiber.
    fiber: HeapId,
    write: Option<Box<dyn WriteHook>>,
    tracer: Box<dyn VmTracer>,
}

impl Vm<NoLimitTracker> {
    /// Creates a VM with no resource limits, seeding the built-in namespace
    /// and the `lang` module.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tracker(NoLimitTracker)
    }
}

impl Default for Vm<NoLimitTracker> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ResourceTracker> Vm<T> {
    /// Creates a VM whose heap enforces the given tracker's budgets.
    ///
    /// # Panics
    /// Panics if the tracker rejects the VM's own bootstrap allocations
    /// (the root fiber, the built-in table, the `lang` module); a budget
    /// that tight is an embedder configuration bug.
    pub fn with_tracker(tracker: T) -> Self {
        let mut heap = Heap::new(tracker);
        let fiber = heap
            .allocate(HeapData::Fiber(Fiber::new()))
            .expect("Vm bootstrap: root fiber allocation rejected");
        let mut vm = Self {
            heap,
            modules: IndexMap::new(),
            builtins: IndexMap::new(),
            natives: Vec::new(),
            fiber,
            write: None,
            tracer: Box::new(NoopTracer),
        };
        builtins::register_core(&mut vm);
        modules::lang::register(&mut vm);
        vm
    }

    /// The heap.
    #[must_use]
    pub fn heap(&self) -> &Heap<T> {
        &self.heap
    }

    /// Mutable access to the heap.
    pub fn heap_mut(&mut self) -> &mut Heap<T> {
        &mut self.heap
    }

    /// The currently running fiber's heap id.
    #[must_use]
    pub fn fiber_id(&self) -> HeapId {
        self.fiber
    }

    /// Switches the running fiber. The scheduler (external) decides when.
    ///
    /// # Panics
    /// Panics if `fiber` does not reference a fiber object.
    pub fn set_fiber(&mut self, fiber: HeapId) {
        assert!(
            matches!(self.heap.get(fiber), HeapData::Fiber(_)),
            "set_fiber: not a fiber object"
        );
        self.fiber = fiber;
    }

    /// The currently running fiber.
    #[must_use]
    pub fn fiber(&self) -> &Fiber {
        match self.heap.get(self.fiber) {
            HeapData::Fiber(fiber) => fiber,
            _ => unreachable!("current fiber slot does not hold a fiber"),
        }
    }

    /// Mutable access to the currently running fiber.
    pub fn fiber_mut(&mut self) -> &mut Fiber {
        match self.heap.get_mut(self.fiber) {
            HeapData::Fiber(fiber) => fiber,
            _ => unreachable!("current fiber slot does not hold a fiber"),
        }
    }

    /// Registers the output hook used by `print` and `write`. Without a
    /// hook, output is silently discarded.
    pub fn set_write_hook(&mut self, hook: Box<dyn WriteHook>) {
        self.write = Some(hook);
    }

    /// Registers an execution tracer.
    pub fn set_tracer(&mut self, tracer: Box<dyn VmTracer>) {
        self.tracer = tracer;
    }

    /// Allocates a string value.
    pub fn new_string(&mut self, text: &str) -> RunResult<Value> {
        let id = self.heap.allocate(HeapData::Str(Str::new(text)))?;
        Ok(Value::Ref(id))
    }

    /// Creates and registers a module, returning its handle.
    ///
    /// # Panics
    /// Panics if a module with this name is already registered — duplicate
    /// registration is an embedder bug, not a script error.
    pub fn new_module(&mut self, name: &str) -> HeapId {
        assert!(
            !self.modules.contains_key(name),
            "module '{name}' is already registered"
        );
        let id = self
            .heap
            .allocate(HeapData::Module(crate::types::Module::new(name)))
            .expect("module allocation rejected by resource tracker");
        self.modules.insert(name.to_owned(), id);
        id
    }

    /// Looks up a registered module by name.
    #[must_use]
    pub fn get_module(&self, name: &str) -> Option<HeapId> {
        self.modules.get(name).copied()
    }

    /// Adds a native function to a module.
    ///
    /// `arity` is the fixed positional count, or [`crate::ARITY_VARIADIC`].
    ///
    /// # Panics
    /// Panics if `module` is not a module handle, or if `name` already
    /// names a function or a global on that module (functions and globals
    /// share one flat namespace).
    pub fn module_add_function(&mut self, module: HeapId, name: &str, callback: NativeFn<T>, arity: i32) {
        let native = self.intern_native(callback);
        let function = self
            .heap
            .allocate(HeapData::Function(Function::native(name, arity, native)))
            .expect("function allocation rejected by resource tracker");
        match self.heap.get_mut(module) {
            HeapData::Module(m) => m.insert_function(name, function),
            _ => panic!("module_add_function: not a module handle"),
        }
    }

    /// Defines a global variable on a module. Scripts read and assign it
    /// through the attribute engine.
    ///
    /// # Panics
    /// Panics if `module` is not a module handle, or if `name` already
    /// names a function or a global on that module.
    pub fn module_add_global(&mut self, module: HeapId, name: &str, value: Value) {
        match self.heap.get_mut(module) {
            HeapData::Module(m) => m.define_global(name, value),
            _ => panic!("module_add_global: not a module handle"),
        }
    }

    /// Adds a function to the flat built-in namespace.
    ///
    /// # Panics
    /// Panics if `name` is already a built-in; built-in names are reserved.
    pub fn register_builtin(&mut self, name: &str, callback: NativeFn<T>, arity: i32) {
        assert!(
            !self.builtins.contains_key(name),
            "builtin '{name}' is already registered"
        );
        let native = self.intern_native(callback);
        let function = self
            .heap
            .allocate(HeapData::Function(Function::native(name, arity, native)))
            .expect("builtin allocation rejected by resource tracker");
        self.builtins.insert(name.to_owned(), function);
    }

    /// Looks up a built-in by name.
    #[must_use]
    pub fn find_builtin(&self, name: &str) -> Option<Value> {
        self.builtins.get(name).copied().map(Value::Ref)
    }

    /// Iterates the built-in namespace in registration order.
    pub fn builtin_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.builtins.keys().map(String::as_str)
    }

    fn intern_native(&mut self, callback: NativeFn<T>) -> NativeId {
        let id = NativeId(u32::try_from(self.natives.len()).expect("native table overflow"));
        self.natives.push(callback);
        id
    }

    /// Calls a function value with the given arguments.
    ///
    /// Opens a frame on the running fiber (result slot pre-initialized to
    /// null, arguments after it), dispatches the native callback, and pops
    /// the frame. On failure the error message is also written into the
    /// fiber's error slot, which is the channel the interpreter unwinds on.
    pub fn call_function(&mut self, function: Value, args: &[Value]) -> RunResult<Value> {
        let function_id = match function {
            Value::Ref(id) if matches!(self.heap.get(id), HeapData::Function(_)) => id,
            other => {
                let err = RunError::new(
                    ErrorKind::Type,
                    format!("{} is not callable.", other.type_name(&self.heap)),
                );
                self.store_fiber_error(&err);
                return Err(err);
            }
        };

        let (name, arity, kind) = match self.heap.get(function_id) {
            HeapData::Function(f) => (f.name().to_owned(), f.arity(), f.kind().clone()),
            _ => unreachable!("function vanished during call setup"),
        };

        if arity >= 0 && args.len() != arity as usize {
            let err = RunError::new(ErrorKind::Type, format!("Expected exactly {arity} argument(s)."));
            self.store_fiber_error(&err);
            return Err(err);
        }

        let FnKind::Native(native) = kind else {
            let err = RunError::new(
                ErrorKind::NotImplemented,
                "Bytecode functions require the interpreter.",
            );
            self.store_fiber_error(&err);
            return Err(err);
        };
        let callback = self.natives[native.index()];

        self.tracer.on_native_call(&name, args.len());
        let saved_ret = self.fiber_mut().begin_frame(args);
        let outcome = callback(self);
        let result = self.fiber_mut().end_frame(saved_ret);
        match outcome {
            Ok(()) => Ok(result),
            Err(err) => {
                self.store_fiber_error(&err);
                Err(err)
            }
        }
    }

    /// Writes an error message into the running fiber's error slot. An
    /// already-failing fiber keeps its first error.
    fn store_fiber_error(&mut self, err: &RunError) {
        let message = match self.heap.allocate(HeapData::Str(Str::new(err.message()))) {
            Ok(id) => Value::Ref(id),
            // Out of budget while reporting: fall back to the bare flag so
            // the interpreter still sees a failing fiber.
            Err(_) => Value::Bool(true),
        };
        self.fiber_mut().set_error(message);
    }

    /// Runs a mark-sweep collection. Roots are the module registry, the
    /// built-in table, the running fiber, and the heap's temporary-root
    /// stack. Returns the estimated number of bytes reclaimed.
    pub fn run_gc(&mut self) -> usize {
        let mut roots: Vec<HeapId> = Vec::with_capacity(self.modules.len() + self.builtins.len() + 1);
        roots.extend(self.modules.values().copied());
        roots.extend(self.builtins.values().copied());
        roots.push(self.fiber);
        let freed = self.heap.collect_garbage(&roots);
        self.tracer.on_gc_pass(self.heap.live_objects(), freed);
        freed
    }

    /// Writes a chunk of text through the output hook, if one is set.
    pub(crate) fn write_output(&mut self, output: &str) {
        if let Some(hook) = self.write.as_mut() {
            hook.write_str(output);
        }
    }

    /// Writes a separator or terminator through the output hook.
    pub(crate) fn write_output_char(&mut self, ch: char) {
        if let Some(hook) = self.write.as_mut() {
            hook.write_char(ch);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        function::ARITY_VARIADIC,
        tracer::{RecordingTracer, TraceEvent},
    };

    fn return_argc(vm: &mut Vm) -> RunResult<()> {
        let argc = vm.argc();
        vm.return_number(argc as f64);
        Ok(())
    }

    /// A registered module function is callable and sees its arguments.
    #[test]
    fn module_function_roundtrip() {
        let mut vm = Vm::new();
        let module = vm.new_module("host");
        vm.module_add_function(module, "count", return_argc, ARITY_VARIADIC);

        let function = crate::attrs::get_attr(vm.heap(), Value::Ref(module), "count").unwrap();
        let result = vm
            .call_function(function, &[Value::Num(1.0), Value::Null, Value::Bool(true)])
            .unwrap();
        assert_eq!(result, Value::Num(3.0));
        assert!(!vm.fiber().has_error());
    }

    /// Duplicate module registration is an embedder bug.
    #[test]
    #[should_panic(expected = "already registered")]
    fn duplicate_module_panics() {
        let mut vm = Vm::new();
        vm.new_module("twice");
        vm.new_module("twice");
    }

    /// Duplicate function names within a module are an embedder bug.
    #[test]
    #[should_panic(expected = "duplicate name")]
    fn duplicate_function_panics() {
        let mut vm = Vm::new();
        let module = vm.new_module("host");
        vm.module_add_function(module, "f", return_argc, 0);
        vm.module_add_function(module, "f", return_argc, 0);
    }

    /// Fixed arity is enforced before the callback runs.
    #[test]
    fn arity_enforced() {
        let mut vm = Vm::new();
        let module = vm.new_module("host");
        vm.module_add_function(module, "two", return_argc, 2);
        let function = crate::attrs::get_attr(vm.heap(), Value::Ref(module), "two").unwrap();

        let err = vm.call_function(function, &[Value::Null]).unwrap_err();
        assert_eq!(err.message(), "Expected exactly 2 argument(s).");
        assert!(vm.fiber().has_error());
    }

    /// A callback that writes nothing returns null implicitly.
    #[test]
    fn implicit_null_return() {
        fn noop(_vm: &mut Vm) -> RunResult<()> {
            Ok(())
        }
        let mut vm = Vm::new();
        let module = vm.new_module("host");
        vm.module_add_function(module, "noop", noop, 0);
        let function = crate::attrs::get_attr(vm.heap(), Value::Ref(module), "noop").unwrap();
        assert_eq!(vm.call_function(function, &[]).unwrap(), Value::Null);
    }

    /// Calling a non-function is a type error that also marks the fiber.
    #[test]
    fn calling_non_function_fails() {
        let mut vm = Vm::new();
        let err = vm.call_function(Value::Num(1.0), &[]).unwrap_err();
        assert_eq!(err.message(), "Num is not callable.");
        assert!(vm.fiber().has_error());
    }

    /// The tracer observes native calls and GC passes.
    #[test]
    fn tracer_observes_events() {
        let recorder = RecordingTracer::new();
        let mut vm = Vm::new();
        vm.set_tracer(Box::new(recorder.clone()));

        let module = vm.new_module("host");
        vm.module_add_function(module, "count", return_argc, ARITY_VARIADIC);
        let function = crate::attrs::get_attr(vm.heap(), Value::Ref(module), "count").unwrap();
        vm.call_function(function, &[Value::Null]).unwrap();
        vm.run_gc();

        let events = recorder.events();
        assert!(matches!(
            &events[0],
            TraceEvent::NativeCall { name, argc: 1 } if name == "count"
        ));
        assert!(matches!(events[1], TraceEvent::GcPass { .. }));
    }

    /// GC keeps everything reachable from the registries and reclaims the
    /// rest.
    #[test]
    fn gc_respects_registry_roots() {
        let mut vm = Vm::new();
        let module = vm.new_module("host");
        let keep = vm.new_string("keep").unwrap();
        let Value::Ref(keep_id) = keep else { unreachable!() };
        match vm.heap_mut().get_mut(module) {
            HeapData::Module(m) => m.define_global("kept", keep),
            _ => unreachable!("module handle must hold a module"),
        }

        let stray = vm.new_string("stray").unwrap();
        let Value::Ref(stray_id) = stray else { unreachable!() };

        let freed = vm.run_gc();
        assert!(freed > 0);
        assert!(vm.heap().get_if_live(keep_id).is_some());
        assert!(vm.heap().get_if_live(stray_id).is_none());
    }
}
