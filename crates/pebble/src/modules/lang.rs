//! The `lang` standard module: `clock`, `gc`, `write`.

use std::{
    sync::OnceLock,
    time::Instant,
};

use crate::{
    error::RunResult,
    function::ARITY_VARIADIC,
    resource::ResourceTracker,
    value::to_repr_string,
    vm::Vm,
};

/// Zero point of `lang.clock()`. Pinned at first module registration so
/// readings measure host process time.
static PROCESS_START: OnceLock<Instant> = OnceLock::new();

/// Creates and registers the `lang` module.
pub(crate) fn register<T: ResourceTracker>(vm: &mut Vm<T>) {
    PROCESS_START.get_or_init(Instant::now);
    let module = vm.new_module("lang");
    vm.module_add_function(module, "clock", clock, 0);
    vm.module_add_function(module, "gc", gc, 0);
    vm.module_add_function(module, "write", write, ARITY_VARIADIC);
}

/// `lang.clock()`: seconds of host process time as a number.
fn clock<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    let start = PROCESS_START.get_or_init(Instant::now);
    vm.return_number(start.elapsed().as_secs_f64());
    Ok(())
}

/// `lang.gc()`: runs a collection pass and returns the bytes reclaimed.
fn gc<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    let freed = vm.run_gc();
    vm.return_number(freed as f64);
    Ok(())
}

/// `lang.write(...)`: arguments written back-to-back with no separators and
/// no trailing newline.
fn write<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    for index in 1..=vm.argc() {
        let text = to_repr_string(vm.heap(), vm.arg(index), false);
        vm.write_output(&text);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{
        attrs::get_attr,
        io::CollectStringWrite,
        value::Value,
        vm::Vm,
    };

    fn lang_function(vm: &Vm, name: &str) -> Value {
        let module = vm.get_module("lang").unwrap();
        get_attr(vm.heap(), Value::Ref(module), name).unwrap()
    }

    /// `clock` yields a non-negative, monotonically non-decreasing number.
    #[test]
    fn clock_monotonic() {
        let mut vm = Vm::new();
        let clock = lang_function(&vm, "clock");
        let Value::Num(first) = vm.call_function(clock, &[]).unwrap() else {
            panic!("clock must return a number")
        };
        let Value::Num(second) = vm.call_function(clock, &[]).unwrap() else {
            panic!("clock must return a number")
        };
        assert!(first >= 0.0);
        assert!(second >= first);
    }

    /// `gc` reclaims unreachable objects and reports bytes freed.
    #[test]
    fn gc_reports_bytes() {
        let mut vm = Vm::new();
        let stray = vm.new_string("stray but sizable").unwrap();
        let Value::Ref(stray_id) = stray else { unreachable!() };

        let gc = lang_function(&vm, "gc");
        let Value::Num(freed) = vm.call_function(gc, &[]).unwrap() else {
            panic!("gc must return a number")
        };
        assert!(freed > 0.0);
        assert!(vm.heap().get_if_live(stray_id).is_none());
    }

    /// `write` emits no separators and no newline.
    #[test]
    fn write_is_raw() {
        let collector = CollectStringWrite::new();
        let mut vm = Vm::new();
        vm.set_write_hook(Box::new(collector.clone()));

        let write = lang_function(&vm, "write");
        let s = vm.new_string("ab").unwrap();
        vm.call_function(write, &[s, Value::Num(1.0), Value::Bool(false)]).unwrap();
        assert_eq!(collector.output(), "ab1false");
    }
}
