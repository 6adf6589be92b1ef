use core::fmt;
use core::ops::Range;

/// Longest signal, in bits.
pub const MAX_SIGNAL_LEN: u32 = 64;

/// How a signal's bits are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DataKind {
    /// Plain unsigned integer
    #[default]
    Scalar,
    /// Byte array, always byte aligned
    Array,
    /// Value of an enumerated type
    Enum,
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DataKind::Scalar => "scalar",
            DataKind::Array => "array",
            DataKind::Enum => "enum",
        })
    }
}

/// Position of a signal inside its message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    /// Byte holding the signal's least significant bit
    pub start_byte: u32,
    /// Bit within `start_byte` (0..8)
    pub start_bit: u32,
}

impl Layout {
    pub fn new(start_byte: u32, start_bit: u32) -> Self {
        Self {
            start_byte,
            start_bit,
        }
    }

    /// Bit offset from the start of the message, saturating at `u32::MAX`.
    #[inline]
    pub fn abs_start_bit(&self) -> u32 {
        self.start_byte.saturating_mul(8).saturating_add(self.start_bit)
    }
}

/// A signal definition.
///
/// The data kind, the enumerated type and the placement are managed by the
/// owning [`crate::Network`]; everything else is plain data.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Signal {
    pub name: String,
    /// Length in bits (1..=64)
    pub len: u32,
    pub description: Option<String>,
    /// Initial value, numeric literal or enumerated symbol.
    pub init_value: Option<String>,
    /// Fail-safe value, numeric literal or enumerated symbol.
    pub fail_value: Option<String>,
    /// Physical value = raw * resolution + offset
    pub offset: f64,
    pub resolution: f64,
    pub unit: Option<String>,
    pub(crate) data_kind: DataKind,
    pub(crate) enum_type: Option<String>,
    pub(crate) message: Option<String>,
    pub(crate) layout: Option<Layout>,
}

impl Signal {
    pub fn new(name: impl Into<String>, len: u32) -> Self {
        Self {
            name: name.into(),
            len,
            description: None,
            init_value: None,
            fail_value: None,
            offset: 0.0,
            resolution: 1.0,
            unit: None,
            data_kind: DataKind::Scalar,
            enum_type: None,
            message: None,
            layout: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_scaling(mut self, offset: f64, resolution: f64) -> Self {
        self.offset = offset;
        self.resolution = resolution;
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    pub fn with_init_value(mut self, value: impl Into<String>) -> Self {
        self.init_value = Some(value.into());
        self
    }

    pub fn with_fail_value(mut self, value: impl Into<String>) -> Self {
        self.fail_value = Some(value.into());
        self
    }

    pub fn data_kind(&self) -> DataKind {
        self.data_kind
    }

    /// Name of the enumerated type, for [`DataKind::Enum`] signals.
    pub fn enum_type(&self) -> Option<&str> {
        self.enum_type.as_deref()
    }

    /// Name of the message conveying this signal.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn layout(&self) -> Option<Layout> {
        self.layout
    }

    pub fn abs_start_bit(&self) -> Option<u32> {
        self.layout.map(|l| l.abs_start_bit())
    }

    /// Inclusive index of the last bit.
    ///
    /// `None` when unplaced, empty or past the addressable range.
    pub fn abs_end_bit(&self) -> Option<u32> {
        let s = self.abs_start_bit()?;
        s.checked_add(self.len.checked_sub(1)?)
    }

    /// Half-open absolute bit range occupied in the message.
    pub fn bit_range(&self) -> Option<Range<u32>> {
        let s = self.abs_start_bit()?;
        s.checked_add(self.len).map(|e| s..e)
    }

    /// Start and length are both multiples of 8.
    pub fn is_byte_aligned(&self) -> bool {
        self.len % 8 == 0 && self.abs_start_bit().is_some_and(|s| s % 8 == 0)
    }

    /// Convert a raw value to its physical value.
    #[inline]
    pub fn raw_to_physical(&self, raw: u64) -> f64 {
        self.offset + self.resolution * (raw as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ranges() {
        let mut s = Signal::new("S", 10);
        assert_eq!(s.bit_range(), None);
        assert!(!s.is_byte_aligned());

        s.layout = Some(Layout::new(2, 3));
        assert_eq!(s.abs_start_bit(), Some(19));
        assert_eq!(s.abs_end_bit(), Some(28));
        assert_eq!(s.bit_range(), Some(19..29));
    }

    #[test]
    fn far_placements_do_not_overflow() {
        let mut s = Signal::new("S", 8);
        s.layout = Some(Layout::new(0x2000_0000, 0));
        assert_eq!(s.abs_start_bit(), Some(u32::MAX));
        assert_eq!(s.bit_range(), None);
        assert_eq!(s.abs_end_bit(), None);

        let mut empty = Signal::new("E", 0);
        empty.layout = Some(Layout::new(0, 0));
        assert_eq!(empty.abs_end_bit(), None);
        assert_eq!(empty.bit_range(), Some(0..0));
    }

    #[test]
    fn alignment() {
        let mut s = Signal::new("S", 16);
        s.layout = Some(Layout::new(1, 0));
        assert!(s.is_byte_aligned());
        s.layout = Some(Layout::new(1, 4));
        assert!(!s.is_byte_aligned());
    }

    #[test]
    fn scaling() {
        let s = Signal::new("Speed", 16).with_scaling(-40.0, 0.5).with_unit("km/h");
        assert_eq!(s.raw_to_physical(100), 10.0);
        assert_eq!(s.unit.as_deref(), Some("km/h"));
    }
}
