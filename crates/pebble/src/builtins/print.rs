//! The `print` builtin.

use crate::{
    error::RunResult,
    resource::ResourceTracker,
    value::to_repr_string,
    vm::Vm,
};

/// `print(...)`: arguments separated by single spaces, followed by a
/// newline, through the VM's write hook. With no hook registered the call
/// is a silent no-op aside from evaluating its arguments.
pub(super) fn print_builtin<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    // Render the whole line first so output is atomic per call.
    let mut line = String::new();
    for index in 1..=vm.argc() {
        if index > 1 {
            line.push(' ');
        }
        line.push_str(&to_repr_string(vm.heap(), vm.arg(index), false));
    }
    vm.write_output(&line);
    vm.write_output_char('\n');
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{io::CollectStringWrite, value::Value, vm::Vm};

    fn print_args(vm: &mut Vm, args: &[Value]) {
        let function = vm.find_builtin("print").unwrap();
        vm.call_function(function, args).unwrap();
    }

    /// Arguments are space-separated with a trailing newline.
    #[test]
    fn space_separated_line() {
        let collector = CollectStringWrite::new();
        let mut vm = Vm::new();
        vm.set_write_hook(Box::new(collector.clone()));

        let s = vm.new_string("x").unwrap();
        print_args(&mut vm, &[Value::Num(1.0), s, Value::Bool(true)]);
        assert_eq!(collector.output(), "1 x true\n");

        print_args(&mut vm, &[]);
        assert_eq!(collector.output(), "1 x true\n\n");
    }

    /// Without a write hook, print is silent and still succeeds.
    #[test]
    fn silent_without_hook() {
        let mut vm = Vm::new();
        print_args(&mut vm, &[Value::Num(1.0)]);
        assert!(!vm.fiber().has_error());
    }
}
