//! Shift/mask bit routines used by the micro-triangle index bijection
//!
//! Both routines treat a `u32` as two independent 16-bit halves, which is all
//! the index math needs for subdivision levels up to 12.

/// Cumulative XOR scan from the most significant bit downwards, applied to
/// each 16-bit half independently.
///
/// After the fold, bit `i` of each half holds the XOR of bits `i..16` of the
/// input half. The masks stop bits from crossing the halfword boundary.
#[inline]
pub const fn prefix_xor_fold(mut x: u32) -> u32 {
    x ^= (x >> 1) & 0x7fff_7fff;
    x ^= (x >> 2) & 0x3fff_3fff;
    x ^= (x >> 4) & 0x0fff_0fff;
    x ^= (x >> 8) & 0x00ff_00ff;
    x
}

/// Spread the low 16 bits of `x` onto the even bit positions of the result.
#[inline]
pub const fn spread_even_bits(x: u32) -> u32 {
    let mut x = x & 0x0000_ffff;
    x = (x | (x << 8)) & 0x00ff_00ff;
    x = (x | (x << 4)) & 0x0f0f_0f0f;
    x = (x | (x << 2)) & 0x3333_3333;
    x = (x | (x << 1)) & 0x5555_5555;
    x
}

/// Interleave two 16-bit values: `even` lands on bits 0, 2, 4, ..., `odd` on
/// bits 1, 3, 5, ...
#[inline]
pub const fn interleave_bits(even: u32, odd: u32) -> u32 {
    spread_even_bits(even) | (spread_even_bits(odd) << 1)
}
