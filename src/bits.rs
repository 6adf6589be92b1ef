//! Bit arithmetic shared by the layout and access builders.
//!
//! All masks are computed on `u64`, the widest container a target can have.
//! Widths are always one of the native unsigned integer sizes (8, 16, 32, 64).

use crate::config::{MAX_CONTAINER_WIDTH, MIN_CONTAINER_WIDTH};
use crate::error::{Error, Result};

/// Smallest native container (power of two, at least 8 bits) able to hold
/// `bits` bits, or `None` if it would exceed 64 bits.
///
/// ```
/// use can_comgen::bits::base_container_width;
///
/// assert_eq!(base_container_width(3), Some(8));
/// assert_eq!(base_container_width(9), Some(16));
/// assert_eq!(base_container_width(24), Some(32));
/// assert_eq!(base_container_width(65), None);
/// ```
pub fn base_container_width(bits: u32) -> Option<u32> {
    let width = bits.max(1).checked_next_power_of_two()?.max(MIN_CONTAINER_WIDTH);
    (width <= MAX_CONTAINER_WIDTH).then_some(width)
}

/// Same as [`base_container_width`] but bounded by a target's widest integer.
pub fn container_width_within(bits: u32, max_width: u32) -> Option<u32> {
    base_container_width(bits).filter(|&w| w <= max_width)
}

/// `n` low bits set.
#[inline]
pub fn low_mask(n: u32) -> u64 {
    if n >= 64 { u64::MAX } else { (1u64 << n) - 1 }
}

/// Build a mask with bits `[start_bit, start_bit + n_of_bits)` set.
///
/// With `inverse` the selected range is cleared and every other bit of the
/// container is set. The container width is the base container of
/// `total_width`, or of `start_bit + n_of_bits` when not given. Returns `None`
/// when the range does not fit in that container or the container would
/// exceed 64 bits.
///
/// ```
/// use can_comgen::bits::bit_mask;
///
/// assert_eq!(bit_mask(4, 4, false, None), Some(0xF0));
/// assert_eq!(bit_mask(2, 2, true, None), Some(0xF3));
/// assert_eq!(bit_mask(10, 0, true, Some(16)), Some(0xFC00));
/// ```
pub fn bit_mask(n_of_bits: u32, start_bit: u32, inverse: bool, total_width: Option<u32>) -> Option<u64> {
    let end = start_bit.checked_add(n_of_bits)?;
    let width = base_container_width(total_width.unwrap_or(end))?;
    if end > width {
        return None;
    }
    let ones = if n_of_bits == 0 { 0 } else { low_mask(n_of_bits) << start_bit };
    Some(if inverse { low_mask(width) & !ones } else { ones })
}

/// Integer suffix used by the generated C code for a container width.
fn suffix_for(width: u32) -> &'static str {
    match width {
        0..=16 => "u",
        17..=32 => "ul",
        _ => "ull",
    }
}

/// Render `value` as a hex literal with an unsigned suffix.
///
/// The suffix (and zero padding) follows the smaller native width holding
/// both the value and the optional declared width. Values or declared widths
/// beyond 64 bits are rejected.
///
/// ```
/// use can_comgen::bits::hex_literal;
///
/// assert_eq!(hex_literal(0x3ff, None).unwrap(), "0x3ffu");
/// assert_eq!(hex_literal(0x3, Some(8)).unwrap(), "0x03u");
/// assert_eq!(hex_literal(0xff, Some(32)).unwrap(), "0x00fful");
/// assert!(hex_literal(1 << 64, None).is_err());
/// ```
pub fn hex_literal(value: u128, declared_bits: Option<u32>) -> Result<String> {
    let value_bits = 128 - value.leading_zeros();
    let needed = value_bits.max(declared_bits.unwrap_or(0));
    let width = base_container_width(needed).ok_or_else(|| Error::Range {
        name: format!("{value:#x}"),
        reason: format!("literal needs {needed} bits, more than 64"),
    })?;
    let literal = match width {
        8 | 16 => format!("0x{value:02x}"),
        32 => format!("0x{value:04x}"),
        _ => format!("0x{value:08x}"),
    };
    Ok(literal + suffix_for(width))
}

/// Render a shift amount with the unsigned suffix matching its magnitude.
pub fn shift_literal(bits: u32) -> String {
    format!("{bits}{}", suffix_for(bits))
}

/// C99 `<stdint.h>` name of the unsigned type of the given width.
pub fn c_uint_type(width: u32) -> Option<&'static str> {
    match width {
        8 => Some("uint8_t"),
        16 => Some("uint16_t"),
        32 => Some("uint32_t"),
        64 => Some("uint64_t"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_widths() {
        assert_eq!(base_container_width(0), Some(8));
        assert_eq!(base_container_width(1), Some(8));
        assert_eq!(base_container_width(8), Some(8));
        assert_eq!(base_container_width(16), Some(16));
        assert_eq!(base_container_width(17), Some(32));
        assert_eq!(base_container_width(33), Some(64));
        assert_eq!(base_container_width(64), Some(64));
        assert_eq!(base_container_width(u32::MAX), None);
    }

    #[test]
    fn container_bounded_by_profile() {
        assert_eq!(container_width_within(20, 32), Some(32));
        assert_eq!(container_width_within(40, 32), None);
    }

    #[test]
    fn masks() {
        assert_eq!(bit_mask(4, 0, false, None), Some(0x0F));
        assert_eq!(bit_mask(4, 4, true, None), Some(0x0F));
        assert_eq!(bit_mask(10, 0, false, Some(16)), Some(0x3FF));
        assert_eq!(bit_mask(64, 0, false, None), Some(u64::MAX));
        assert_eq!(bit_mask(64, 0, true, None), Some(0));
        assert_eq!(bit_mask(8, 4, false, Some(8)), None);
        assert_eq!(bit_mask(1, 70, false, None), None);
    }

    #[test]
    fn mask_default_width_is_minimal_container() {
        // 3 bits starting at bit 6 need 9 bits -> 16-bit container.
        assert_eq!(bit_mask(3, 6, true, None), Some(0xFE3F));
    }

    #[test]
    fn hex_literals() {
        assert_eq!(hex_literal(0x0c, None).unwrap(), "0x0cu");
        assert_eq!(hex_literal(0xfc00, Some(16)).unwrap(), "0xfc00u");
        assert_eq!(hex_literal(0x1_0000, None).unwrap(), "0x10000ul");
        assert_eq!(hex_literal(u64::MAX as u128, None).unwrap(), "0xffffffffffffffffull");
        assert_eq!(hex_literal(1, Some(64)).unwrap(), "0x00000001ull");
        assert!(hex_literal(1, Some(65)).is_err());
    }

    #[test]
    fn shift_literals() {
        assert_eq!(shift_literal(2), "2u");
        assert_eq!(shift_literal(24), "24ul");
        assert_eq!(shift_literal(40), "40ull");
    }

    #[test]
    fn c_types() {
        assert_eq!(c_uint_type(16), Some("uint16_t"));
        assert_eq!(c_uint_type(24), None);
    }
}
