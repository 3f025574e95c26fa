//! Attribute and subscript access over heterogeneous object kinds.
//!
//! `get_attr`/`set_attr` work by name, `get_subscript`/`set_subscript` by
//! key value. All four are total over `Value`: primitives fail with a
//! not-subscriptable error, and each object kind applies its own
//! readable/writable surface and immutability rules.

use crate::{
    error::{RunError, RunResult},
    hash::value_hash,
    heap::{Heap, HeapData},
    resource::ResourceTracker,
    types::Str,
    value::{Value, index_in_range, to_repr_string},
};

/// Reads an attribute by name.
pub fn get_attr<T: ResourceTracker>(heap: &Heap<T>, on: Value, name: &str) -> RunResult<Value> {
    let Value::Ref(id) = on else {
        return Err(RunError::not_subscriptable(on.type_name(heap)));
    };
    match heap.get(id) {
        HeapData::Str(s) => match name {
            "length" => Ok(Value::Num(s.len() as f64)),
            _ => Err(RunError::no_attribute("String", name)),
        },
        HeapData::List(list) => match name {
            "length" => Ok(Value::Num(list.len() as f64)),
            _ => Err(RunError::no_attribute("List", name)),
        },
        // Attribute names on a map read as string keys.
        HeapData::Map(map) => map
            .get_by_str(name, heap)
            .ok_or_else(|| RunError::attr_key_not_exists(name)),
        HeapData::Module(module) => {
            if let Some(function) = module.get_function(name) {
                Ok(Value::Ref(function))
            } else if let Some(global) = module.get_global(name) {
                Ok(global)
            } else {
                Err(RunError::no_attribute("Module", name))
            }
        }
        data => Err(RunError::no_attribute(data.type_name(), name)),
    }
}

/// Writes an attribute by name.
pub fn set_attr<T: ResourceTracker>(heap: &mut Heap<T>, on: Value, name: &str, value: Value) -> RunResult<()> {
    let Value::Ref(id) = on else {
        return Err(RunError::not_subscriptable(on.type_name(heap)));
    };
    match heap.get_mut(id) {
        data @ (HeapData::Str(_) | HeapData::List(_)) => match name {
            "length" => Err(RunError::attribute_immutable("length")),
            _ => Err(RunError::no_attribute(data.type_name(), name)),
        },
        // Map attribute assignment is reserved.
        HeapData::Map(_) => Err(RunError::no_attribute("Map", name)),
        HeapData::Module(module) => {
            if module.set_global(name, value) {
                Ok(())
            } else if module.has_function(name) {
                Err(RunError::attribute_immutable(name))
            } else {
                Err(RunError::no_attribute("Module", name))
            }
        }
        data => Err(RunError::no_attribute(data.type_name(), name)),
    }
}

/// Reads an element by key.
pub fn get_subscript<T: ResourceTracker>(heap: &mut Heap<T>, on: Value, key: Value) -> RunResult<Value> {
    let Value::Ref(id) = on else {
        return Err(RunError::not_subscriptable(on.type_name(heap)));
    };
    match heap.get(id) {
        HeapData::Str(s) => {
            let index = checked_index(key, s.len(), "String")?;
            let byte = s.byte_at(index);
            let element = heap.allocate(HeapData::Str(Str::from_byte(byte)))?;
            Ok(Value::Ref(element))
        }
        HeapData::List(list) => {
            let index = checked_index(key, list.len(), "List")?;
            Ok(list.get(index))
        }
        HeapData::Map(map) => {
            let Some(key_hash) = value_hash(key, heap) else {
                return Err(RunError::invalid_key(&to_repr_string(heap, key, false)));
            };
            map.get(key, key_hash, heap)
                .ok_or_else(|| RunError::key_not_exists(&to_repr_string(heap, key, false)))
        }
        data => Err(RunError::not_subscriptable(data.type_name())),
    }
}

/// Writes an element by key.
pub fn set_subscript<T: ResourceTracker>(heap: &mut Heap<T>, on: Value, key: Value, value: Value) -> RunResult<()> {
    let Value::Ref(id) = on else {
        return Err(RunError::not_subscriptable(on.type_name(heap)));
    };
    match heap.get(id) {
        HeapData::Str(_) => Err(RunError::string_immutable()),
        HeapData::List(list) => {
            let index = checked_index(key, list.len(), "List")?;
            let HeapData::List(list) = heap.get_mut(id) else {
                unreachable!("list vanished between probe and commit")
            };
            list.set(index, value);
            Ok(())
        }
        HeapData::Map(_) => {
            let Some(key_hash) = value_hash(key, heap) else {
                return Err(RunError::not_hashable(key.type_name(heap)));
            };
            let HeapData::Map(map) = heap.get_mut(id) else {
                unreachable!("map vanished between probe and commit")
            };
            map.reserve_for_insert();
            let probe = {
                let HeapData::Map(map) = heap.get(id) else {
                    unreachable!("map vanished between probe and commit")
                };
                map.probe(key, key_hash, heap)
            };
            let HeapData::Map(map) = heap.get_mut(id) else {
                unreachable!("map vanished between probe and commit")
            };
            map.commit(probe, key_hash, key, value);
            Ok(())
        }
        data => Err(RunError::not_subscriptable(data.type_name())),
    }
}

/// Validates a subscript index: integer-coercible and within `[0, len)`.
fn checked_index(key: Value, len: usize, container: &str) -> RunResult<usize> {
    let Some(index) = key.as_integer() else {
        return Err(RunError::integer_required(&format!("{container} index")));
    };
    if !index_in_range(index, len) {
        return Err(RunError::index_out_of_range(container));
    }
    Ok(index as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        function::{Function, NativeId},
        resource::NoLimitTracker,
        types::{List, Map, Module, Range},
    };

    fn heap() -> Heap<NoLimitTracker> {
        Heap::new(NoLimitTracker)
    }

    fn str_value(heap: &mut Heap<NoLimitTracker>, text: &str) -> Value {
        Value::Ref(heap.allocate(HeapData::Str(Str::new(text))).unwrap())
    }

    /// String and list expose an immutable `length`.
    #[test]
    fn length_attribute() {
        let mut heap = heap();
        let hello = str_value(&mut heap, "hello");
        assert_eq!(get_attr(&heap, hello, "length").unwrap(), Value::Num(5.0));

        let err = set_attr(&mut heap, hello, "length", Value::Num(7.0)).unwrap_err();
        assert_eq!(err.message(), "'length' attribute is immutable.");
        // The failed write leaves the attribute unchanged.
        assert_eq!(get_attr(&heap, hello, "length").unwrap(), Value::Num(5.0));

        let err = get_attr(&heap, hello, "size").unwrap_err();
        assert_eq!(err.message(), "'String' objects has no attribute named 'size'.");
    }

    /// Attribute access on a primitive is not subscriptable.
    #[test]
    fn primitive_attr_fails() {
        let heap = heap();
        let err = get_attr(&heap, Value::Num(1.0), "length").unwrap_err();
        assert_eq!(err.message(), "Num is not subscriptable.");
    }

    /// Map attribute reads go through string keys; writes are reserved.
    #[test]
    fn map_attr_as_string_key() {
        let mut heap = heap();
        let map_id = heap.allocate(HeapData::Map(Map::new())).unwrap();
        let map = Value::Ref(map_id);
        let key = str_value(&mut heap, "answer");
        set_subscript(&mut heap, map, key, Value::Num(42.0)).unwrap();

        assert_eq!(get_attr(&heap, map, "answer").unwrap(), Value::Num(42.0));
        let err = get_attr(&heap, map, "question").unwrap_err();
        assert_eq!(err.message(), "Key (\"question\") not exists.");
        let err = set_attr(&mut heap, map, "answer", Value::Null).unwrap_err();
        assert_eq!(err.message(), "'Map' objects has no attribute named 'answer'.");
    }

    /// Module reads prefer functions; writes assign through to globals and
    /// treat function names as immutable.
    #[test]
    fn module_namespace_rules() {
        let mut heap = heap();
        let function = heap
            .allocate(HeapData::Function(Function::native("f", 0, NativeId(0))))
            .unwrap();
        let mut module = Module::new("m");
        module.insert_function("f", function);
        module.define_global("g", Value::Num(1.0));
        let module = Value::Ref(heap.allocate(HeapData::Module(module)).unwrap());

        assert_eq!(get_attr(&heap, module, "f").unwrap(), Value::Ref(function));
        assert_eq!(get_attr(&heap, module, "g").unwrap(), Value::Num(1.0));

        set_attr(&mut heap, module, "g", Value::Num(2.0)).unwrap();
        assert_eq!(get_attr(&heap, module, "g").unwrap(), Value::Num(2.0));

        let err = set_attr(&mut heap, module, "f", Value::Null).unwrap_err();
        assert_eq!(err.message(), "'f' attribute is immutable.");
        let err = get_attr(&heap, module, "missing").unwrap_err();
        assert_eq!(err.message(), "'Module' objects has no attribute named 'missing'.");
    }

    /// List subscripts read, write, and bounds-check.
    #[test]
    fn list_subscripts() {
        let mut heap = heap();
        let list = Value::Ref(
            heap.allocate(HeapData::List(List::from(vec![
                Value::Num(10.0),
                Value::Num(20.0),
                Value::Num(30.0),
            ])))
            .unwrap(),
        );

        assert_eq!(get_subscript(&mut heap, list, Value::Num(1.0)).unwrap(), Value::Num(20.0));

        let err = get_subscript(&mut heap, list, Value::Num(3.0)).unwrap_err();
        assert_eq!(err.message(), "List index out of range.");
        let err = get_subscript(&mut heap, list, Value::Num(0.5)).unwrap_err();
        assert_eq!(err.message(), "List index must be an integer.");

        set_subscript(&mut heap, list, Value::Num(0.0), Value::Num(99.0)).unwrap();
        assert_eq!(get_subscript(&mut heap, list, Value::Num(0.0)).unwrap(), Value::Num(99.0));
    }

    /// String subscripts yield fresh one-byte strings; writes are rejected.
    #[test]
    fn string_subscripts() {
        let mut heap = heap();
        let hello = str_value(&mut heap, "hello");
        let Value::Ref(byte_id) = get_subscript(&mut heap, hello, Value::Num(1.0)).unwrap() else {
            panic!("expected a heap result")
        };
        let HeapData::Str(byte) = heap.get(byte_id) else {
            panic!("expected a string")
        };
        assert_eq!(byte.as_str(), "e");

        let err = set_subscript(&mut heap, hello, Value::Num(0.0), Value::Null).unwrap_err();
        assert_eq!(err.message(), "String objects are immutable.");
    }

    /// Map subscripts insert, overwrite, and validate hashability.
    #[test]
    fn map_subscripts() {
        let mut heap = heap();
        let map = Value::Ref(heap.allocate(HeapData::Map(Map::new())).unwrap());
        let key = str_value(&mut heap, "k");

        set_subscript(&mut heap, map, key, Value::Num(1.0)).unwrap();
        assert_eq!(get_subscript(&mut heap, map, key).unwrap(), Value::Num(1.0));
        set_subscript(&mut heap, map, key, Value::Num(2.0)).unwrap();
        assert_eq!(get_subscript(&mut heap, map, key).unwrap(), Value::Num(2.0));

        // A content-equal string is the same key.
        let key_again = str_value(&mut heap, "k");
        assert_eq!(get_subscript(&mut heap, map, key_again).unwrap(), Value::Num(2.0));

        let list_key = Value::Ref(heap.allocate(HeapData::List(List::new())).unwrap());
        let err = set_subscript(&mut heap, map, list_key, Value::Null).unwrap_err();
        assert_eq!(err.message(), "List is not hashable.");
        let err = get_subscript(&mut heap, map, list_key).unwrap_err();
        assert_eq!(err.message(), "Invalid key '[]'.");

        let missing = str_value(&mut heap, "missing");
        let err = get_subscript(&mut heap, map, missing).unwrap_err();
        assert_eq!(err.message(), "Key 'missing' not exists.");
    }

    /// Growth past the initial slot array rehashes without losing entries.
    #[test]
    fn map_growth_preserves_entries() {
        let mut heap = heap();
        let map = Value::Ref(heap.allocate(HeapData::Map(Map::new())).unwrap());
        let keys: Vec<Value> = (0..20).map(|i| str_value(&mut heap, &format!("key{i}"))).collect();
        for (i, key) in keys.iter().enumerate() {
            set_subscript(&mut heap, map, *key, Value::Num(i as f64)).unwrap();
        }

        for (i, key) in keys.iter().enumerate() {
            assert_eq!(get_subscript(&mut heap, map, *key).unwrap(), Value::Num(i as f64));
        }

        let mut state = Value::Null;
        let mut out = Value::Null;
        let mut yielded = 0;
        while crate::iter::iterate(&mut heap, map, &mut state, &mut out).unwrap() {
            yielded += 1;
        }
        assert_eq!(yielded, 20);
    }

    /// Ranges and other reserved kinds are not subscriptable.
    #[test]
    fn reserved_kinds() {
        let mut heap = heap();
        let range = Value::Ref(heap.allocate(HeapData::Range(Range::new(0.0, 3.0))).unwrap());
        let err = get_subscript(&mut heap, range, Value::Num(0.0)).unwrap_err();
        assert_eq!(err.message(), "Range is not subscriptable.");
        let err = get_attr(&heap, range, "from").unwrap_err();
        assert_eq!(err.message(), "'Range' objects has no attribute named 'from'.");
    }
}
