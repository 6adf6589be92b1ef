//! Splitting of bit ranges into container-sized fragments.

use crate::error::{Error, Result};

/// Result of [`split`]: fragment sizes in bits for each segment kind.
///
/// A segment is `None` when no fragment of that kind exists, which keeps
/// "nothing here" apart from a list of fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fragments {
    /// Bits from the start up to the end of the first leading unit.
    pub leading: Option<Vec<u32>>,
    /// Whole nominal-width fragments.
    pub nominal: Option<Vec<u32>>,
    /// Trailing-width fragments plus the final partial one.
    pub trailing: Option<Vec<u32>>,
}

impl Fragments {
    /// All fragment sizes in leading, nominal, trailing order.
    pub fn sizes(&self) -> impl Iterator<Item = u32> + '_ {
        [&self.leading, &self.nominal, &self.trailing]
            .into_iter()
            .flatten()
            .flatten()
            .copied()
    }

    /// Sum of all fragment sizes.
    pub fn total_bits(&self) -> u32 {
        self.sizes().sum()
    }

    /// True when the range is exactly one nominal fragment.
    pub fn is_single_nominal(&self) -> bool {
        self.leading.is_none()
            && self.trailing.is_none()
            && self.nominal.as_ref().is_some_and(|n| n.len() == 1)
    }

    /// True when everything landed in the leading segment.
    pub fn is_leading_only(&self) -> bool {
        self.leading.is_some() && self.nominal.is_none() && self.trailing.is_none()
    }
}

fn non_empty(v: Vec<u32>) -> Option<Vec<u32>> {
    (!v.is_empty()).then_some(v)
}

/// Split the inclusive bit range `[abs_start_bit, abs_end_bit]` into fragments.
///
/// The leading fragment runs from the start to the end of the
/// `leading_width` unit containing it, unless the start is already aligned on
/// that unit and the range covers it entirely. The rest is cut into as many
/// `nominal_width` fragments as fit, then into `trailing_width` fragments and
/// a final partial one.
///
/// ```
/// use can_comgen::fragment::split;
///
/// let f = split(3, 30, 8, 8, 8).unwrap();
/// assert_eq!(f.leading, Some(vec![5]));
/// assert_eq!(f.nominal, Some(vec![8, 8]));
/// assert_eq!(f.trailing, Some(vec![7]));
///
/// let aligned = split(8, 15, 8, 8, 8).unwrap();
/// assert_eq!(aligned.leading, None);
/// assert_eq!(aligned.nominal, Some(vec![8]));
/// assert_eq!(aligned.trailing, None);
/// ```
pub fn split(
    abs_start_bit: u32,
    abs_end_bit: u32,
    nominal_width: u32,
    leading_width: u32,
    trailing_width: u32,
) -> Result<Fragments> {
    if abs_end_bit < abs_start_bit {
        return Err(Error::Range {
            name: format!("bits {abs_start_bit}..={abs_end_bit}"),
            reason: "end bit is lower than start bit".into(),
        });
    }
    if nominal_width == 0 || leading_width == 0 || trailing_width == 0 {
        return Err(Error::Range {
            name: format!("bits {abs_start_bit}..={abs_end_bit}"),
            reason: "fragment widths must be non-zero".into(),
        });
    }

    let total = abs_end_bit - abs_start_bit + 1;
    let unit_start = abs_start_bit / leading_width * leading_width;

    let lead = if abs_start_bit == unit_start && total >= leading_width {
        0
    } else {
        (unit_start + leading_width - abs_start_bit).min(total)
    };
    let mut remaining = total - lead;

    let nominal_count = remaining / nominal_width;
    remaining -= nominal_count * nominal_width;

    let mut trailing = vec![trailing_width; (remaining / trailing_width) as usize];
    if remaining % trailing_width > 0 {
        trailing.push(remaining % trailing_width);
    }

    Ok(Fragments {
        leading: (lead > 0).then(|| vec![lead]),
        nominal: non_empty(vec![nominal_width; nominal_count as usize]),
        trailing: non_empty(trailing),
    })
}

/// [`split`] with the same width for all three segment kinds.
pub fn split_uniform(abs_start_bit: u32, abs_end_bit: u32, width: u32) -> Result<Fragments> {
    split(abs_start_bit, abs_end_bit, width, width, width)
}
