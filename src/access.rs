//! Read and write recipes for individual signals.
//!
//! A [`SignalAccess`] describes, piece by piece, how to move a signal's value
//! between a caller-provided integer and the message byte buffer. Each
//! [`PieceAccess`] touches one native container (8, 16, 32 or 64 bits read
//! little-endian at a byte offset). Pieces are ordered from the least
//! significant byte to the most significant one.
//!
//! # Piece semantics
//!
//! Read, for each piece, then OR all results:
//!
//! ```text
//! part = container
//! part &= inner_mask        (if any)
//! part >>= inner_shift      (if any)
//! part &= outer_mask        (if any)
//! part <<= outer_shift      (if any)
//! ```
//!
//! Write, for each piece:
//!
//! ```text
//! part = data << inner_shift   (first piece)
//! part = data >> inner_shift   (following pieces)
//! part &= outer_mask           (if any)
//! container = (container & inner_mask) | part   (or just part without inner_mask)
//! ```

use core::fmt;

use crate::bits::{bit_mask, container_width_within, low_mask};
use crate::config::CompilerProfile;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::{DataKind, Network, Signal};

/// Whether a recipe extracts or inserts a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AccessDirection {
    Read,
    Write,
}

impl fmt::Display for AccessDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccessDirection::Read => "read",
            AccessDirection::Write => "write",
        })
    }
}

/// One container-sized step of a signal access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PieceAccess {
    /// Container width in bits (8, 16, 32 or 64)
    pub container_width: u32,
    /// Absolute byte offset of the container in the message buffer
    pub byte_offset: u32,
    /// Number of signal bits carried by this piece
    pub bits: u32,
    pub inner_shift: Option<u32>,
    pub outer_shift: Option<u32>,
    pub inner_mask: Option<u64>,
    pub outer_mask: Option<u64>,
}

impl PieceAccess {
    fn container_bytes(&self) -> usize {
        (self.container_width / 8) as usize
    }

    fn load(&self, buffer: &[u8]) -> Result<u64> {
        let start = self.byte_offset as usize;
        let end = start + self.container_bytes();
        let bytes = buffer.get(start..end).ok_or(Error::BufferTooShort {
            actual: buffer.len(),
            expected: end,
        })?;
        let mut raw = [0u8; 8];
        raw[..bytes.len()].copy_from_slice(bytes);
        Ok(u64::from_le_bytes(raw))
    }

    fn store(&self, buffer: &mut [u8], value: u64) -> Result<()> {
        let start = self.byte_offset as usize;
        let end = start + self.container_bytes();
        let len = buffer.len();
        let bytes = buffer.get_mut(start..end).ok_or(Error::BufferTooShort {
            actual: len,
            expected: end,
        })?;
        bytes.copy_from_slice(&value.to_le_bytes()[..end - start]);
        Ok(())
    }
}

/// The ordered pieces needed to read or write one signal.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalAccess {
    pub signal_name: String,
    /// Signal length in bits
    pub length: u32,
    /// Smallest container able to hold the whole value
    pub base_width: u32,
    pub direction: AccessDirection,
    pub data_kind: DataKind,
    pub pieces: Vec<PieceAccess>,
}

impl SignalAccess {
    /// Total number of message bytes the recipe touches.
    pub fn span_bytes(&self) -> u32 {
        self.pieces.iter().map(|p| p.container_width / 8).sum()
    }

    /// Apply a read recipe to a message buffer.
    ///
    /// ```
    /// use can_comgen::{CompilerProfile, Signal};
    /// use can_comgen::access::build_read;
    ///
    /// let signal = Signal::new("Mode", 3);
    /// let recipe = build_read(&signal, 5, 2, &CompilerProfile::default()).unwrap();
    /// let mut buffer = [0u8; 8];
    /// buffer[5] = 0b0001_0100;
    /// assert_eq!(recipe.extract(&buffer).unwrap(), 0b101);
    /// ```
    pub fn extract(&self, buffer: &[u8]) -> Result<u64> {
        let mut value = 0u64;
        for piece in &self.pieces {
            let mut part = piece.load(buffer)?;
            if let Some(mask) = piece.inner_mask {
                part &= mask;
            }
            if let Some(shift) = piece.inner_shift {
                part >>= shift;
            }
            if let Some(mask) = piece.outer_mask {
                part &= mask;
            }
            if let Some(shift) = piece.outer_shift {
                part <<= shift;
            }
            value |= part;
        }
        Ok(value & low_mask(self.length))
    }

    /// Apply a write recipe to a message buffer, leaving bits outside the
    /// signal untouched.
    pub fn insert(&self, buffer: &mut [u8], data: u64) -> Result<()> {
        for (index, piece) in self.pieces.iter().enumerate() {
            let mut part = match (index, piece.inner_shift) {
                (_, None) => data,
                (0, Some(shift)) => data << shift,
                (_, Some(shift)) => data >> shift,
            };
            if let Some(mask) = piece.outer_mask {
                part &= mask;
            }
            let container = match piece.inner_mask {
                Some(mask) => (piece.load(buffer)? & mask) | part,
                None => part,
            };
            piece.store(buffer, container)?;
        }
        Ok(())
    }
}

/// Greedy container choice: the largest power-of-two byte count not above
/// `remaining` nor the profile's widest integer.
fn next_container_bytes(remaining: u32, max_bytes: u32) -> u32 {
    let limit = remaining.min(max_bytes).max(1);
    1 << (31 - limit.leading_zeros())
}

fn build(
    signal: &Signal,
    start_byte: u32,
    start_bit: u32,
    profile: &CompilerProfile,
    direction: AccessDirection,
) -> Result<SignalAccess> {
    let len = signal.len;
    let base_width =
        container_width_within(len, profile.max_int_width).ok_or_else(|| Error::Capacity {
            signal: signal.name.clone(),
            bits: len,
            max: profile.max_int_width,
        })?;

    let max_bytes = profile.max_int_width / 8;
    let span = (start_bit + len).div_ceil(8);
    let mut pieces = Vec::new();
    let mut byte_offset = start_byte;
    let mut remaining_bytes = span;
    let mut consumed = 0;

    while consumed < len {
        // A span of 1, 2, 4 or 8 bytes within the profile is a single piece.
        let bytes = next_container_bytes(remaining_bytes, max_bytes);
        let width = bytes * 8;
        let first = consumed == 0;
        let offset = if first { start_bit } else { 0 };
        let bits = (width - offset).min(len - consumed);
        let partial = bits < width;

        let piece = match direction {
            AccessDirection::Read => PieceAccess {
                container_width: width,
                byte_offset,
                bits,
                inner_shift: (offset > 0).then_some(offset),
                outer_shift: (consumed > 0).then_some(consumed),
                inner_mask: None,
                outer_mask: partial.then(|| bit_mask(bits, 0, false, Some(width))).flatten(),
            },
            AccessDirection::Write => {
                let inner_shift = if first { offset } else { consumed };
                PieceAccess {
                    container_width: width,
                    byte_offset,
                    bits,
                    inner_shift: (inner_shift > 0).then_some(inner_shift),
                    outer_shift: None,
                    inner_mask: partial
                        .then(|| bit_mask(bits, offset, true, Some(width)))
                        .flatten(),
                    outer_mask: partial
                        .then(|| bit_mask(bits, offset, false, Some(width)))
                        .flatten(),
                }
            }
        };
        pieces.push(piece);

        consumed += bits;
        byte_offset += bytes;
        remaining_bytes = remaining_bytes.saturating_sub(bytes);
    }

    Ok(SignalAccess {
        signal_name: signal.name.clone(),
        length: len,
        base_width,
        direction,
        data_kind: signal.data_kind(),
        pieces,
    })
}

/// Read recipe for a signal placed at `(start_byte, start_bit)`.
///
/// Fails with [`Error::Capacity`] when the value does not fit the profile's
/// widest integer.
pub fn build_read(
    signal: &Signal,
    start_byte: u32,
    start_bit: u32,
    profile: &CompilerProfile,
) -> Result<SignalAccess> {
    build(signal, start_byte, start_bit, profile, AccessDirection::Read)
}

/// Write recipe for a signal placed at `(start_byte, start_bit)`.
pub fn build_write(
    signal: &Signal,
    start_byte: u32,
    start_bit: u32,
    profile: &CompilerProfile,
) -> Result<SignalAccess> {
    build(signal, start_byte, start_bit, profile, AccessDirection::Write)
}

impl Network {
    fn signal_access(
        &self,
        name: &str,
        ctx: &Context,
        direction: AccessDirection,
    ) -> Option<SignalAccess> {
        let result = self
            .signal(name)
            .ok_or_else(|| Error::UnknownReference {
                kind: "Signal",
                name: name.to_string(),
            })
            .and_then(|signal| {
                let layout = signal.layout().ok_or_else(|| {
                    Error::InvalidDefinition(format!(r#"signal "{name}" is not placed in any message"#))
                })?;
                build(signal, layout.start_byte, layout.start_bit, &ctx.profile, direction)
            });
        let access = ctx.check("access", result)?;
        ctx.diagnostics.debug(
            "access",
            format!(
                "{direction} recipe for \"{name}\": {} piece(s) over {} byte(s)",
                access.pieces.len(),
                access.span_bytes()
            ),
        );
        Some(access)
    }

    /// Read recipe of a placed signal, `None` (reported) when it cannot be built.
    pub fn get_signal_abstract_read(&self, signal: &str, ctx: &Context) -> Option<SignalAccess> {
        self.signal_access(signal, ctx, AccessDirection::Read)
    }

    /// Write recipe of a placed signal, `None` (reported) when it cannot be built.
    pub fn get_signal_abstract_write(&self, signal: &str, ctx: &Context) -> Option<SignalAccess> {
        self.signal_access(signal, ctx, AccessDirection::Write)
    }
}
