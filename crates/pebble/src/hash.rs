//! Deterministic hashing for map keys.
//!
//! Pebble hashes string content with SipHash-1-3 under a zero key so that
//! hash values are stable across processes and platforms; map layout (and
//! therefore slot-order iteration) is reproducible. Numbers hash through a
//! Mersenne-prime modular scheme so that every pair of equal numeric values
//! hashes equal, including booleans coerced to `0`/`1` and integral floats.

use crate::{
    heap::{Heap, HeapData},
    resource::ResourceTracker,
    value::Value,
};

/// Hash of the `null` singleton. An arbitrary odd constant, fixed forever.
const NULL_HASH: u64 = 0x9e37_79b9_7f4a_7c15;

/// Mersenne prime used for numeric hashing: `2^61 - 1`.
///
/// All numeric values hash modulo this prime so equal values across the
/// bool/number coercion boundary produce identical hashes.
const MODULUS: i64 = (1 << 61) - 1;

/// Hashes raw bytes with SipHash-1-3 under a zero key.
///
/// Two conventions apply: empty input hashes to `0`, and a computed hash of
/// `-1` (as a signed value) is remapped to `-2` so `-1` stays free as an
/// error sentinel for embedders that need one.
#[must_use]
pub(crate) fn hash_bytes(bytes: &[u8]) -> u64 {
    if bytes.is_empty() {
        return 0;
    }

    let raw = siphash13(bytes);
    let signed = i64::from_ne_bytes(raw.to_ne_bytes());
    let adjusted = if signed == -1 { -2 } else { signed };
    u64::from_ne_bytes(adjusted.to_ne_bytes())
}

/// Hashes UTF-8 string content.
#[must_use]
pub(crate) fn hash_str(value: &str) -> u64 {
    hash_bytes(value.as_bytes())
}

/// Hashes a signed 64-bit integer: `n % MODULUS`, sign preserving, with the
/// `-1 -> -2` remap.
#[must_use]
pub(crate) fn hash_int(value: i64) -> u64 {
    u64::from_ne_bytes(hash_int_signed(value).to_ne_bytes())
}

fn hash_int_signed(value: i64) -> i64 {
    if value == 0 {
        return 0;
    }

    let sign: i64 = if value < 0 { -1 } else { 1 };
    // i64::MIN's absolute value overflows i64, so widen before taking it.
    let abs_val = i128::from(value).unsigned_abs() as u64;
    let remainder = (abs_val % MODULUS as u64) as i64;

    let result = sign * remainder;
    if result == -1 { -2 } else { result }
}

/// Hashes an `f64` such that integral values hash identically to the
/// corresponding integer (`hash(1.0) == hash(1)`), which keeps map keys
/// consistent under the bool/number coercion rule.
///
/// Special values: `+inf -> 314159`, `-inf -> -314159`, `NaN -> 0`.
#[must_use]
pub(crate) fn hash_number(value: f64) -> u64 {
    u64::from_ne_bytes(hash_number_signed(value).to_ne_bytes())
}

fn hash_number_signed(value: f64) -> i64 {
    if value.is_infinite() {
        return if value > 0.0 { 314_159 } else { -314_159 };
    }
    if value.is_nan() {
        return 0;
    }

    let truncated = value.trunc();
    if value == truncated && truncated >= i64::MIN as f64 && truncated <= i64::MAX as f64 {
        return hash_int_signed(truncated as i64);
    }

    // Non-integral (or out of i64 range): frexp decomposition accumulated
    // modulo the Mersenne prime, 28 mantissa bits at a time.
    let (frac, exp) = frexp(value);
    let mut m = frac;
    let mut e = exp;

    let sign: i64 = if m < 0.0 {
        m = -m;
        -1
    } else {
        1
    };

    let mut x: u64 = 0;
    while m > 0.0 {
        x = ((x << 28) & (MODULUS as u64)) | (x >> 33);
        m *= 268_435_456.0; // 2^28
        e -= 28;
        let w = m as u64;
        m -= w as f64;
        x = x.wrapping_add(w);
        if x >= MODULUS as u64 {
            x -= MODULUS as u64;
        }
    }

    e %= 61;
    if e < 0 {
        e += 61;
    }
    x = ((x << e as u32) & (MODULUS as u64)) | (x >> (61 - e) as u32);

    let result = (sign * x as i64) % MODULUS;
    if result == -1 { -2 } else { result }
}

/// Hashes a range by its endpoints, so ranges with equal endpoints are
/// interchangeable map keys.
#[must_use]
pub(crate) fn hash_range(from: f64, to: f64) -> u64 {
    let mut buf = [0_u8; 16];
    buf[..8].copy_from_slice(&hash_number(from).to_le_bytes());
    buf[8..].copy_from_slice(&hash_number(to).to_le_bytes());
    hash_bytes(&buf)
}

/// Hashes any value, returning `None` for non-hashable object kinds.
///
/// Primitives are always hashable. Among heap objects only strings (by
/// content, cached at construction) and ranges (by endpoints) are hashable.
#[must_use]
pub(crate) fn value_hash<T: ResourceTracker>(value: Value, heap: &Heap<T>) -> Option<u64> {
    match value {
        Value::Null => Some(NULL_HASH),
        Value::Bool(b) => Some(hash_int(i64::from(b))),
        Value::Num(n) => Some(hash_number(n)),
        Value::Ref(id) => match heap.get(id) {
            HeapData::Str(s) => Some(s.hash()),
            HeapData::Range(r) => Some(hash_range(r.from, r.to)),
            _ => None,
        },
        Value::Undef => unreachable!("Undef must never be hashed"),
    }
}

/// Returns `(frac, exp)` such that `value == frac * 2^exp` with
/// `0.5 <= |frac| < 1.0`, equivalent to C's `frexp()`.
fn frexp(value: f64) -> (f64, i32) {
    if value == 0.0 || value.is_nan() || value.is_infinite() {
        return (value, 0);
    }
    let bits = value.to_bits();
    let exponent = ((bits >> 52) & 0x7ff) as i32;
    if exponent == 0 {
        // Subnormal: normalize first, then rescale the exponent.
        let normalized = value * (1_u64 << 63) as f64 * 2.0;
        let (frac, exp) = frexp(normalized);
        return (frac, exp - 64);
    }
    let frac_bits = (bits & 0x800F_FFFF_FFFF_FFFF) | 0x3FE0_0000_0000_0000;
    let frac = f64::from_bits(frac_bits);
    (frac, exponent - 1022)
}

/// SipHash-1-3 with a zero key.
#[must_use]
fn siphash13(bytes: &[u8]) -> u64 {
    let mut v0 = 0x736f_6d65_7073_6575_u64;
    let mut v1 = 0x646f_7261_6e64_6f6d_u64;
    let mut v2 = 0x6c79_6765_6e65_7261_u64;
    let mut v3 = 0x7465_6462_7974_6573_u64;

    let mut chunks = bytes.chunks_exact(8);
    for chunk in &mut chunks {
        let mut block = [0_u8; 8];
        block.copy_from_slice(chunk);
        let message = u64::from_le_bytes(block);
        v3 ^= message;
        sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
        v0 ^= message;
    }

    let mut tail = (bytes.len() as u64) << 56;
    for (index, byte) in chunks.remainder().iter().copied().enumerate() {
        tail |= u64::from(byte) << (index * 8);
    }

    v3 ^= tail;
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    v0 ^= tail;
    v2 ^= 0xff;
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);
    sip_round(&mut v0, &mut v1, &mut v2, &mut v3);

    v0 ^ v1 ^ v2 ^ v3
}

fn sip_round(v0: &mut u64, v1: &mut u64, v2: &mut u64, v3: &mut u64) {
    *v0 = v0.wrapping_add(*v1);
    *v1 = v1.rotate_left(13);
    *v1 ^= *v0;
    *v0 = v0.rotate_left(32);

    *v2 = v2.wrapping_add(*v3);
    *v3 = v3.rotate_left(16);
    *v3 ^= *v2;

    *v0 = v0.wrapping_add(*v3);
    *v3 = v3.rotate_left(21);
    *v3 ^= *v0;

    *v2 = v2.wrapping_add(*v1);
    *v1 = v1.rotate_left(17);
    *v1 ^= *v2;
    *v2 = v2.rotate_left(32);
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Empty input hashes to zero; non-empty input does not.
    #[test]
    fn bytes_hash_conventions() {
        assert_eq!(hash_bytes(b""), 0);
        assert_ne!(hash_bytes(b"pebble"), 0);
        assert_eq!(hash_bytes(b"pebble"), hash_str("pebble"));
    }

    /// Equal numeric values hash equal across representations.
    #[test]
    fn numeric_hash_consistency() {
        assert_eq!(hash_number(1.0), hash_int(1));
        assert_eq!(hash_number(0.0), hash_int(0));
        assert_eq!(hash_number(-0.0), hash_number(0.0));
        assert_eq!(hash_number(42.0), hash_int(42));
        assert_ne!(hash_number(1.5), hash_number(2.5));
    }

    /// Non-finite values use fixed sentinel hashes.
    #[test]
    fn special_float_hashes() {
        assert_eq!(hash_number(f64::INFINITY), u64::from_ne_bytes(314_159_i64.to_ne_bytes()));
        assert_eq!(hash_number(f64::NEG_INFINITY), u64::from_ne_bytes((-314_159_i64).to_ne_bytes()));
        assert_eq!(hash_number(f64::NAN), 0);
    }

    /// Ranges hash by endpoint values, independent of identity.
    #[test]
    fn range_hash_by_endpoints() {
        assert_eq!(hash_range(0.0, 5.0), hash_range(0.0, 5.0));
        assert_ne!(hash_range(0.0, 5.0), hash_range(5.0, 0.0));
    }
}
