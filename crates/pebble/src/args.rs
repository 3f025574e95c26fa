//! Argument and return marshalling for native callbacks.
//!
//! During a native call the fiber's `ret` points at the callee's result
//! slot; positional arguments occupy `ret+1 ..= ret+argc` with
//! `argc = sp - ret - 1`. Argument indices are 1-based.
//!
//! The validated getters return `Err` exactly when they produce no value;
//! an out-of-range index, by contrast, is a bug in the native itself and
//! panics.

use crate::{
    error::{RunError, RunResult},
    heap::HeapData,
    resource::ResourceTracker,
    types::ObjectKind,
    value::Value,
    vm::Vm,
};

impl<T: ResourceTracker> Vm<T> {
    /// Number of arguments in the current native call frame.
    #[must_use]
    pub fn argc(&self) -> usize {
        self.fiber().argc()
    }

    /// The `index`-th argument (1-based).
    ///
    /// # Panics
    /// Panics when `index` is outside `1 ..= argc()`; natives must respect
    /// their declared arity (or check [`Vm::argc`] when variadic).
    #[must_use]
    pub fn arg(&self, index: usize) -> Value {
        let argc = self.argc();
        assert!(
            index >= 1 && index <= argc,
            "native argument {index} out of range (argc {argc})"
        );
        let fiber = self.fiber();
        fiber.slot(fiber.ret() + index)
    }

    /// The `index`-th argument coerced to a number (booleans coerce to
    /// `0`/`1`).
    pub fn arg_number(&self, index: usize) -> RunResult<f64> {
        self.arg(index)
            .as_number()
            .ok_or_else(|| RunError::expected_argument("number", index))
    }

    /// The `index`-th argument as a boolean.
    pub fn arg_bool(&self, index: usize) -> RunResult<bool> {
        match self.arg(index) {
            Value::Bool(b) => Ok(b),
            _ => Err(RunError::expected_argument("boolean", index)),
        }
    }

    /// The `index`-th argument validated to reference an object of `kind`.
    pub fn arg_value(&self, index: usize, kind: ObjectKind) -> RunResult<Value> {
        let value = self.arg(index);
        if value.is_kind(kind, self.heap()) {
            Ok(value)
        } else {
            let kind_name: &'static str = kind.into();
            Err(RunError::expected_argument(kind_name, index))
        }
    }

    /// The `index`-th argument's string content, validated and copied out.
    pub fn arg_string(&self, index: usize) -> RunResult<String> {
        let value = self.arg_value(index, ObjectKind::Str)?;
        let Value::Ref(id) = value else {
            unreachable!("validated string argument must be a heap reference")
        };
        let HeapData::Str(s) = self.heap().get(id) else {
            unreachable!("validated string argument must hold a string")
        };
        Ok(s.as_str().to_owned())
    }

    /// Writes null into the result slot.
    pub fn return_null(&mut self) {
        self.return_value(Value::Null);
    }

    /// Writes a boolean into the result slot.
    pub fn return_bool(&mut self, value: bool) {
        self.return_value(Value::Bool(value));
    }

    /// Writes a number into the result slot.
    pub fn return_number(&mut self, value: f64) {
        self.return_value(Value::Num(value));
    }

    /// Writes a value into the result slot.
    pub fn return_value(&mut self, value: Value) {
        let fiber = self.fiber_mut();
        let ret = fiber.ret();
        fiber.set_slot(ret, value);
    }

    /// Allocates a string and writes it into the result slot.
    pub fn return_string(&mut self, text: &str) -> RunResult<()> {
        let value = self.new_string(text)?;
        self.return_value(value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::ARITY_VARIADIC;

    fn call(vm: &mut Vm, callback: crate::vm::NativeFn<crate::resource::NoLimitTracker>, args: &[Value]) -> RunResult<Value> {
        let module_id = match vm.get_module("argtest") {
            Some(id) => id,
            None => vm.new_module("argtest"),
        };
        let name = format!("f{}", vm.heap().stats().total_slots);
        vm.module_add_function(module_id, &name, callback, ARITY_VARIADIC);
        let function = crate::attrs::get_attr(vm.heap(), Value::Ref(module_id), &name).unwrap();
        vm.call_function(function, args)
    }

    /// Validated getters succeed on matching kinds.
    #[test]
    fn validated_getters() {
        fn native(vm: &mut Vm) -> RunResult<()> {
            assert_eq!(vm.argc(), 3);
            assert_eq!(vm.arg_number(1)?, 1.0);
            assert!(vm.arg_bool(2)?);
            assert_eq!(vm.arg_string(3)?, "s");
            vm.return_bool(true);
            Ok(())
        }
        let mut vm = Vm::new();
        let s = vm.new_string("s").unwrap();
        let result = call(&mut vm, native, &[Value::Bool(true), Value::Bool(true), s]).unwrap();
        assert_eq!(result, Value::Bool(true));
    }

    /// A type mismatch reports the expected kind and the argument index.
    #[test]
    fn mismatch_reports_kind_and_index() {
        fn wants_number(vm: &mut Vm) -> RunResult<()> {
            vm.arg_number(1)?;
            Ok(())
        }
        fn wants_string(vm: &mut Vm) -> RunResult<()> {
            vm.arg_string(2)?;
            Ok(())
        }
        let mut vm = Vm::new();
        let err = call(&mut vm, wants_number, &[Value::Null]).unwrap_err();
        assert_eq!(err.message(), "Expected a number at argument 1.");

        vm.fiber_mut().clear_error();
        let err = call(&mut vm, wants_string, &[Value::Null, Value::Num(1.0)]).unwrap_err();
        assert_eq!(err.message(), "Expected a String at argument 2.");
    }

    /// The result slot defaults to null and takes the last write.
    #[test]
    fn return_setters() {
        fn native(vm: &mut Vm) -> RunResult<()> {
            vm.return_number(1.0);
            vm.return_string("final")?;
            Ok(())
        }
        let mut vm = Vm::new();
        let result = call(&mut vm, native, &[]).unwrap();
        let Value::Ref(id) = result else { panic!("expected a string result") };
        let HeapData::Str(s) = vm.heap().get(id) else { panic!("expected a string result") };
        assert_eq!(s.as_str(), "final");
    }
}
