//! String-transform builtins: `str_lower`, `str_upper`, `str_strip`.
//!
//! Case mapping and whitespace trimming are ASCII-only; non-ASCII bytes
//! pass through unchanged. Each result is a fresh string, which re-hashes
//! the content by construction — maps rely on the cached hash.

use crate::{
    error::RunResult,
    resource::ResourceTracker,
    vm::Vm,
};

pub(super) fn register<T: ResourceTracker>(vm: &mut Vm<T>) {
    vm.register_builtin("str_lower", str_lower, 1);
    vm.register_builtin("str_upper", str_upper, 1);
    vm.register_builtin("str_strip", str_strip, 1);
}

/// `str_lower(s)`: ASCII lowercase copy.
fn str_lower<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    let text = vm.arg_string(1)?;
    vm.return_string(&text.to_ascii_lowercase())
}

/// `str_upper(s)`: ASCII uppercase copy.
fn str_upper<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    let text = vm.arg_string(1)?;
    vm.return_string(&text.to_ascii_uppercase())
}

/// `str_strip(s)`: copy with leading and trailing ASCII whitespace removed.
fn str_strip<T: ResourceTracker>(vm: &mut Vm<T>) -> RunResult<()> {
    let text = vm.arg_string(1)?;
    vm.return_string(text.trim_matches(|c: char| c.is_ascii_whitespace()))
}
