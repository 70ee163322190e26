//! Unsigned 8-bit arithmetic shared by the ALU operations.
//!
//! Registers are `u8` throughout, so comparisons are always unsigned. Results that need a
//! ninth bit are computed in `u16` and masked back down.

/// The value VF takes for a set or unset flag.
pub fn flag(set: bool) -> u8 {
    if set {
        0x1
    } else {
        0x0
    }
}

/// The 9-bit sum of `x` and `y`.
pub fn add_with_overflow(x: u8, y: u8) -> u16 {
    u16::from(x) + u16::from(y)
}

/// `x + y` mod 256 and whether the sum carried out of bit 7.
pub fn add(x: u8, y: u8) -> (u8, bool) {
    let sum = add_with_overflow(x, y);
    ((sum & 0x00FF) as u8, sum > 0xFF)
}

/// `x - y` mod 256 and whether `x` was strictly greater than `y`.
pub fn subtract(x: u8, y: u8) -> (u8, bool) {
    (x.wrapping_sub(y), gt(x, y))
}

pub fn gt(x: u8, y: u8) -> bool {
    x > y
}

/// Binary-coded decimal digits of `value`: hundreds, tens, ones.
pub fn bcd(value: u8) -> [u8; 3] {
    [value / 100, value / 10 % 10, value % 10]
}
