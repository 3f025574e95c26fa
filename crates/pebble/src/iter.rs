//! The iteration protocol shared by strings, lists, maps, and ranges.
//!
//! A single stepping operation drives every `for` loop:
//!
//! ```text
//! iterate(seq, state, out) -> more?
//! ```
//!
//! `state` is Null on the first call and a non-negative number after; the
//! integer it carries is opaque to callers. For maps in particular it
//! indexes the raw backing slot array (skipping empty slots), so it is not
//! a stable insertion position and iteration order is slot order.
//!
//! Iteration state is a plain index rather than a Rust iterator so stepping
//! can take `&mut Heap` and allocate (the one-byte string case) without
//! holding a borrow of the sequence across calls.

use crate::{
    error::{RunError, RunResult},
    heap::{Heap, HeapData},
    resource::ResourceTracker,
    types::Str,
    value::Value,
};

/// Advances an iteration over `seq`.
///
/// On success writes the next element into `out`, advances `state`, and
/// returns `Ok(true)`; returns `Ok(false)` when the sequence is exhausted
/// (leaving `out` untouched).
///
/// # Panics
/// Panics if `state` is neither Null nor the non-negative number written by
/// a previous step; that is an interpreter bug, not a script error.
pub fn iterate<T: ResourceTracker>(
    heap: &mut Heap<T>,
    seq: Value,
    state: &mut Value,
    out: &mut Value,
) -> RunResult<bool> {
    let index = match *state {
        Value::Null => 0,
        Value::Num(n) if n >= 0.0 && n.trunc() == n => n as usize,
        _ => panic!("invalid iterator state: {state:?}"),
    };

    let id = match seq {
        Value::Null => return Err(RunError::not_iterable("Null")),
        Value::Bool(_) => return Err(RunError::not_iterable("Boolean")),
        Value::Num(_) => return Err(RunError::not_iterable("Number")),
        Value::Ref(id) => id,
        Value::Undef => unreachable!("Undef must never be iterated"),
    };

    match heap.get(id) {
        HeapData::Str(s) => {
            if index >= s.len() {
                return Ok(false);
            }
            let byte = s.byte_at(index);
            let element = heap.allocate(HeapData::Str(Str::from_byte(byte)))?;
            *out = Value::Ref(element);
            *state = Value::Num((index + 1) as f64);
            Ok(true)
        }
        HeapData::List(list) => {
            if index >= list.len() {
                return Ok(false);
            }
            *out = list.get(index);
            *state = Value::Num((index + 1) as f64);
            Ok(true)
        }
        HeapData::Map(map) => {
            // Walk the raw slot array, skipping empty slots.
            let mut slot_index = index;
            while let Some(slot) = map.slot(slot_index) {
                if slot.is_occupied() {
                    *out = slot.key();
                    *state = Value::Num((slot_index + 1) as f64);
                    return Ok(true);
                }
                slot_index += 1;
            }
            Ok(false)
        }
        HeapData::Range(range) => {
            let range = *range;
            if range.is_empty() {
                return Ok(false);
            }
            let value = if range.is_ascending() {
                range.from + index as f64
            } else {
                range.from - index as f64
            };
            let exhausted = if range.is_ascending() {
                value >= range.to
            } else {
                value <= range.to
            };
            if exhausted {
                return Ok(false);
            }
            *out = Value::Num(value);
            *state = Value::Num((index + 1) as f64);
            Ok(true)
        }
        data => Err(RunError::not_iterable(data.type_name())),
    }
}
