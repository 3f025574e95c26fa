//! Type-predicate builtins (`is_null`, `is_string`, ...).

use crate::{
    error::RunResult,
    resource::ResourceTracker,
    types::ObjectKind,
    vm::Vm,
};

pub(super) fn register<T: ResourceTracker>(vm: &mut Vm<T>) {
    vm.register_builtin("is_null", is_null, 1);
    vm.register_builtin("is_bool", is_bool, 1);
    vm.register_builtin("is_num", is_num, 1);
    vm.register_builtin("is_string", is_string, 1);
    vm.register_builtin("is_list", is_list, 1);
    vm.register_builtin("is_map", is_map, 1);
    vm.register_builtin("is_range", is_range, 1);
    vm.register_builtin("is_function", is_function, 1);
    // The module predicate keeps its reserved historical name.
    vm.register_builtin("is_script", is_script, 1);
    vm.register_builtin("is_userobj", is_userobj, 1);
}

fn is_null<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    let result = vm.arg(1).is_null();
    vm.return_bool(result);
    Ok(())
}

fn is_bool<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    let result = vm.arg(1).is_bool();
    vm.return_bool(result);
    Ok(())
}

fn is_num<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    let result = vm.arg(1).is_num();
    vm.return_bool(result);
    Ok(())
}

fn is_string<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    kind_predicate(vm, ObjectKind::Str)
}

fn is_list<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    kind_predicate(vm, ObjectKind::List)
}

fn is_map<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    kind_predicate(vm, ObjectKind::Map)
}

fn is_range<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    kind_predicate(vm, ObjectKind::Range)
}

fn is_function<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    kind_predicate(vm, ObjectKind::Function)
}

fn is_script<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    kind_predicate(vm, ObjectKind::Module)
}

fn is_userobj<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    kind_predicate(vm, ObjectKind::UserObj)
}

fn kind_predicate<T: ResourceTracker>(vm: &mut Vm<T>, kind: ObjectKind) -> RunResult<()> {
    let result = vm.arg(1).is_kind(kind, vm.heap());
    vm.return_bool(result);
    Ok(())
}
