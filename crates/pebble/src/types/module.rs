//! Module objects: named namespaces of functions and global variables.

use indexmap::IndexMap;

use crate::{heap::HeapId, value::Value};

/// A named namespace of functions and global variables.
///
/// Functions and globals share one flat name space: no entry may appear in
/// both tables. Reads prefer the function table; writes assign through to an
/// existing global and treat function names as immutable.
#[derive(Debug)]
pub struct Module {
    name: String,
    /// Ordered function table: name to the function's heap object.
    functions: IndexMap<String, HeapId>,
    /// Ordered global-variable table.
    globals: IndexMap<String, Value>,
}

impl Module {
    /// Creates an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: IndexMap::new(),
            globals: IndexMap::new(),
        }
    }

    /// The module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether `name` is taken by a function or a global.
    #[must_use]
    pub fn has_name(&self, name: &str) -> bool {
        self.functions.contains_key(name) || self.globals.contains_key(name)
    }

    /// Installs a function. The caller is responsible for the flat-namespace
    /// check ([`Module::has_name`]); a duplicate insert here would corrupt
    /// the namespace invariant, so it is rejected loudly.
    ///
    /// # Panics
    /// Panics if `name` is already taken.
    pub fn insert_function(&mut self, name: impl Into<String>, function: HeapId) {
        let name = name.into();
        assert!(
            !self.has_name(&name),
            "duplicate name '{name}' in module '{}'",
            self.name
        );
        self.functions.insert(name, function);
    }

    /// Defines a global variable. Same namespace rules as
    /// [`Module::insert_function`].
    ///
    /// # Panics
    /// Panics if `name` is already taken.
    pub fn define_global(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        assert!(
            !self.has_name(&name),
            "duplicate name '{name}' in module '{}'",
            self.name
        );
        self.globals.insert(name, value);
    }

    /// Looks up a function by name.
    #[must_use]
    pub fn get_function(&self, name: &str) -> Option<HeapId> {
        self.functions.get(name).copied()
    }

    /// Whether `name` is a function.
    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Looks up a global by name.
    #[must_use]
    pub fn get_global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).copied()
    }

    /// Assigns an existing global. Returns false if `name` is not a global.
    pub fn set_global(&mut self, name: &str, value: Value) -> bool {
        match self.globals.get_mut(name) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Iterates the function table in insertion order.
    pub fn functions(&self) -> impl Iterator<Item = (&str, HeapId)> + '_ {
        self.functions.iter().map(|(name, id)| (name.as_str(), *id))
    }

    /// Iterates the global table in insertion order.
    pub fn globals(&self) -> impl Iterator<Item = (&str, Value)> + '_ {
        self.globals.iter().map(|(name, value)| (name.as_str(), *value))
    }

    /// Estimated heap footprint in bytes.
    #[must_use]
    pub(crate) fn estimate_size(&self) -> usize {
        std::mem::size_of::<Self>()
            + self
                .functions
                .keys()
                .chain(self.globals.keys())
                .map(|name| name.capacity() + std::mem::size_of::<Value>())
                .sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Functions and globals share one flat namespace.
    #[test]
    #[should_panic(expected = "duplicate name 'x'")]
    fn flat_namespace_rejects_collision() {
        let mut module = Module::new("m");
        module.define_global("x", Value::Num(1.0));
        module.insert_function("x", HeapId::for_test(0));
    }

    /// Globals assign through; unknown names do not.
    #[test]
    fn set_global_only_assigns_existing() {
        let mut module = Module::new("m");
        module.define_global("g", Value::Num(1.0));
        assert!(module.set_global("g", Value::Num(2.0)));
        assert_eq!(module.get_global("g"), Some(Value::Num(2.0)));
        assert!(!module.set_global("missing", Value::Null));
    }
}
