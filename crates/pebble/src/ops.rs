//! Binary arithmetic and comparison operators.
//!
//! Every operator follows the same promotion ladder: if the left operand is
//! numerically coercible the right one must be too and the result is
//! computed in IEEE-754; otherwise both operands must be heap objects and
//! dispatch goes by the left operand's kind; anything left over is an
//! unsupported-operand error naming both types.

use crate::{
    error::{RunError, RunResult},
    heap::{Heap, HeapData},
    resource::ResourceTracker,
    types::Str,
    value::Value,
};

/// The `+` operator: numeric addition or string concatenation.
pub fn add<T: ResourceTracker>(heap: &mut Heap<T>, lhs: Value, rhs: Value) -> RunResult<Value> {
    if let Some(result) = numeric_op(lhs, rhs, |a, b| a + b)? {
        return Ok(result);
    }
    if let (Value::Ref(lhs_id), Value::Ref(rhs_id)) = (lhs, rhs)
        && let (HeapData::Str(left), HeapData::Str(right)) = (heap.get(lhs_id), heap.get(rhs_id))
    {
        let mut text = String::with_capacity(left.len() + right.len());
        text.push_str(left.as_str());
        text.push_str(right.as_str());
        let id = heap.allocate(HeapData::Str(Str::new(text)))?;
        return Ok(Value::Ref(id));
    }
    Err(unsupported(heap, "+", lhs, rhs))
}

/// The `-` operator.
pub fn subtract<T: ResourceTracker>(heap: &mut Heap<T>, lhs: Value, rhs: Value) -> RunResult<Value> {
    match numeric_op(lhs, rhs, |a, b| a - b)? {
        Some(result) => Ok(result),
        None => Err(unsupported(heap, "-", lhs, rhs)),
    }
}

/// The `*` operator.
pub fn multiply<T: ResourceTracker>(heap: &mut Heap<T>, lhs: Value, rhs: Value) -> RunResult<Value> {
    match numeric_op(lhs, rhs, |a, b| a * b)? {
        Some(result) => Ok(result),
        None => Err(unsupported(heap, "*", lhs, rhs)),
    }
}

/// The `/` operator. Division by zero follows IEEE-754 (infinities, NaN).
pub fn divide<T: ResourceTracker>(heap: &mut Heap<T>, lhs: Value, rhs: Value) -> RunResult<Value> {
    match numeric_op(lhs, rhs, |a, b| a / b)? {
        Some(result) => Ok(result),
        None => Err(unsupported(heap, "/", lhs, rhs)),
    }
}

/// The `%` operator: floating-point remainder with the sign of the
/// dividend. `String % args` formatting is reserved and fails explicitly
/// until it is defined.
pub fn modulo<T: ResourceTracker>(heap: &mut Heap<T>, lhs: Value, rhs: Value) -> RunResult<Value> {
    if let Some(result) = numeric_op(lhs, rhs, |a, b| a % b)? {
        return Ok(result);
    }
    if let Value::Ref(lhs_id) = lhs
        && matches!(heap.get(lhs_id), HeapData::Str(_))
    {
        return Err(RunError::string_format_unimplemented());
    }
    Err(unsupported(heap, "%", lhs, rhs))
}

/// The `>` comparison. Only numeric ordering is defined.
pub fn greater_than<T: ResourceTracker>(heap: &Heap<T>, lhs: Value, rhs: Value) -> RunResult<bool> {
    numeric_compare(heap, ">", lhs, rhs).map(|ordering| ordering == std::cmp::Ordering::Greater)
}

/// The `<` comparison. Only numeric ordering is defined.
pub fn less_than<T: ResourceTracker>(heap: &Heap<T>, lhs: Value, rhs: Value) -> RunResult<bool> {
    numeric_compare(heap, "<", lhs, rhs).map(|ordering| ordering == std::cmp::Ordering::Less)
}

/// Numeric fast path shared by every operator: `Ok(Some(..))` when both
/// operands coerced, `Ok(None)` when the left one is not numeric, and an
/// error when only the right one fails to coerce.
fn numeric_op(lhs: Value, rhs: Value, apply: impl Fn(f64, f64) -> f64) -> RunResult<Option<Value>> {
    let Some(left) = lhs.as_number() else {
        return Ok(None);
    };
    let Some(right) = rhs.as_number() else {
        return Err(RunError::numeric_required("Right operand"));
    };
    Ok(Some(Value::Num(apply(left, right))))
}

fn numeric_compare<T: ResourceTracker>(
    heap: &Heap<T>,
    op: &str,
    lhs: Value,
    rhs: Value,
) -> RunResult<std::cmp::Ordering> {
    let Some(left) = lhs.as_number() else {
        return Err(unsupported(heap, op, lhs, rhs));
    };
    let Some(right) = rhs.as_number() else {
        return Err(RunError::numeric_required("Right operand"));
    };
    Ok(left.partial_cmp(&right).unwrap_or(std::cmp::Ordering::Equal))
}

fn unsupported<T: ResourceTracker>(heap: &Heap<T>, op: &str, lhs: Value, rhs: Value) -> RunError {
    RunError::unsupported_operands(op, lhs.type_name(heap), rhs.type_name(heap))
}
