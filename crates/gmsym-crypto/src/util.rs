//! Byte helpers shared by the modes: constant-time XOR, buffer overlap
//! detection and constant-time equality.

use subtle::ConstantTimeEq;

/// XOR `x` and `y` into `dst`, returning the number of bytes written
/// (`min(x.len(), y.len())`).
///
/// Runs in time that depends only on the lengths.
///
/// # Panics
///
/// Panics if `dst` is shorter than the number of bytes to write.
pub fn xor_bytes(dst: &mut [u8], x: &[u8], y: &[u8]) -> usize {
    let n = x.len().min(y.len());
    assert!(dst.len() >= n, "util: dst too short for xor");
    for ((d, a), b) in dst[..n].iter_mut().zip(&x[..n]).zip(&y[..n]) {
        *d = a ^ b;
    }
    n
}

/// XOR `src` into `dst` in place, over `min(dst.len(), src.len())` bytes.
pub fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

/// Whether `x` and `y` share any memory.
pub fn any_overlap(x: &[u8], y: &[u8]) -> bool {
    if x.is_empty() || y.is_empty() {
        return false;
    }
    let (xs, ys) = (x.as_ptr() as usize, y.as_ptr() as usize);
    xs < ys + y.len() && ys < xs + x.len()
}

/// Whether `x` and `y` share memory at non-corresponding offsets.
///
/// Exact overlap (both start at the same address) is allowed for in-place
/// processing; any other overlap would corrupt the output.
pub fn inexact_overlap(x: &[u8], y: &[u8]) -> bool {
    if x.is_empty() || y.is_empty() || x.as_ptr() == y.as_ptr() {
        return false;
    }
    any_overlap(x, y)
}

/// Constant-time equality of two byte strings.
///
/// Returns `false` immediately for differing lengths; the lengths are public.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.ct_eq(b).unwrap_u8() == 1
}

/// Common precondition check for modes: `dst` must hold at least
/// `src.len()` bytes and the two must not overlap inexactly.
///
/// # Panics
///
/// Panics with a message prefixed by `mode` when either condition fails.
pub(crate) fn check_buffers(mode: &str, dst: &[u8], src: &[u8]) {
    if dst.len() < src.len() {
        panic!("{mode}: output smaller than input");
    }
    if inexact_overlap(&dst[..src.len()], src) {
        panic!("{mode}: invalid buffer overlap");
    }
}
