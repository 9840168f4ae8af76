//! Loops with a tunable unroll degree.
//!
//! The body is always called with increasing indices, so unrolling never changes the order in
//! which a unit accumulates its products.

use crate::components::Unroll;

/// Call `body(index)` for every index in `0..len`.
#[inline(always)]
pub fn unrolled<F: FnMut(usize)>(len: usize, unroll: Unroll, body: F) {
    match unroll.step(len) {
        0 | 1 => sequential(len, body),
        2..4 => chunked::<2, F>(len, body),
        4..8 => chunked::<4, F>(len, body),
        8..16 => chunked::<8, F>(len, body),
        16..32 => chunked::<16, F>(len, body),
        32..64 => chunked::<32, F>(len, body),
        _ => chunked::<64, F>(len, body),
    }
}

#[inline(always)]
fn sequential<F: FnMut(usize)>(len: usize, mut body: F) {
    for index in 0..len {
        body(index);
    }
}

// Steps that aren't a power of two are rounded down to one.
#[inline(always)]
fn chunked<const U: usize, F: FnMut(usize)>(len: usize, mut body: F) {
    let mut start = 0;

    while start + U <= len {
        for offset in 0..U {
            body(start + offset);
        }
        start += U;
    }

    for index in start..len {
        body(index);
    }
}
