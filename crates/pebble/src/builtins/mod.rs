//! The flat built-in namespace seeded at VM startup.
//!
//! Built-ins are ordinary native functions registered through the same path
//! the host uses for its own modules; each submodule implements one family.

mod predicates;
mod print;
mod str_ops;

use crate::{
    error::{ErrorKind, RunError, RunResult},
    function::ARITY_VARIADIC,
    hash::value_hash,
    resource::ResourceTracker,
    value::to_repr_string,
    vm::Vm,
};

/// Seeds the built-in table. Called once from VM construction; the names
/// registered here are reserved and cannot be shadowed by scripts.
pub(crate) fn register_core<T: ResourceTracker>(vm: &mut Vm<T>) {
    predicates::register(vm);
    vm.register_builtin("assert", assert_builtin, ARITY_VARIADIC);
    vm.register_builtin("hash", hash_builtin, 1);
    vm.register_builtin("to_string", to_string_builtin, 1);
    vm.register_builtin("print", print::print_builtin, ARITY_VARIADIC);
    str_ops::register(vm);
}

/// `assert(cond)` / `assert(cond, msg)`.
fn assert_builtin<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    let argc = vm.argc();
    if argc == 0 || argc > 2 {
        return Err(RunError::new(ErrorKind::Type, "Expected either 1 or 2 argument(s)."));
    }
    if vm.arg(1).truthy() {
        return Ok(());
    }
    if argc == 2 {
        let message = vm.arg_string(2)?;
        Err(RunError::assertion(Some(&message)))
    } else {
        Err(RunError::assertion(None))
    }
}

/// `hash(v)`: the value's hash as a number, or null for non-hashable
/// objects.
fn hash_builtin<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    match value_hash(vm.arg(1), vm.heap()) {
        Some(hash) => vm.return_number(hash as f64),
        None => vm.return_null(),
    }
    Ok(())
}

/// `to_string(v)`: a fresh string rendering of any value.
fn to_string_builtin<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    let text = to_repr_string(vm.heap(), vm.arg(1), false);
    vm.return_string(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{heap::HeapData, value::Value};

    fn call_builtin(vm: &mut Vm, name: &str, args: &[Value]) -> RunResult<Value> {
        let function = vm.find_builtin(name).expect("builtin must be registered");
        vm.call_function(function, args)
    }

    /// `assert` passes truthy values through and fails falsy ones.
    #[test]
    fn assert_semantics() {
        let mut vm = Vm::new();
        assert_eq!(call_builtin(&mut vm, "assert", &[Value::Num(1.0)]).unwrap(), Value::Null);

        let err = call_builtin(&mut vm, "assert", &[Value::Bool(false)]).unwrap_err();
        assert_eq!(err.message(), "Assertion failed.");

        vm.fiber_mut().clear_error();
        let msg = vm.new_string("broken invariant").unwrap();
        let err = call_builtin(&mut vm, "assert", &[Value::Num(0.0), msg]).unwrap_err();
        assert_eq!(err.message(), "Assertion failed: 'broken invariant'.");
    }

    /// `hash` returns equal numbers for equal values and null for
    /// unhashable objects.
    #[test]
    fn hash_builtin_surface() {
        let mut vm = Vm::new();
        let h1 = call_builtin(&mut vm, "hash", &[Value::Num(1.0)]).unwrap();
        let h2 = call_builtin(&mut vm, "hash", &[Value::Bool(true)]).unwrap();
        assert_eq!(h1, h2);

        let list = Value::Ref(
            vm.heap_mut()
                .allocate(HeapData::List(crate::types::List::new()))
                .unwrap(),
        );
        assert_eq!(call_builtin(&mut vm, "hash", &[list]).unwrap(), Value::Null);
    }

    /// `to_string` renders any value as a fresh string.
    #[test]
    fn to_string_builtin_surface() {
        let mut vm = Vm::new();
        let result = call_builtin(&mut vm, "to_string", &[Value::Num(3.5)]).unwrap();
        let Value::Ref(id) = result else { panic!("expected a string") };
        let HeapData::Str(s) = vm.heap().get(id) else { panic!("expected a string") };
        assert_eq!(s.as_str(), "3.5");
    }

    /// All reserved names are present after startup.
    #[test]
    fn reserved_names_seeded() {
        let vm = Vm::new();
        for name in [
            "is_null",
            "is_bool",
            "is_num",
            "is_string",
            "is_list",
            "is_map",
            "is_range",
            "is_function",
            "is_script",
            "is_userobj",
            "assert",
            "hash",
            "to_string",
            "print",
            "str_lower",
            "str_upper",
            "str_strip",
        ] {
            assert!(vm.find_builtin(name).is_some(), "missing builtin {name}");
        }
    }
}
