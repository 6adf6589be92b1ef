//! Per-message member layout.
//!
//! A [`MessageStructure`] lists, in bit order, the members a generated C
//! structure needs to overlay a message buffer: real signals (or fragments
//! of them) and synthesized reserved fillers covering every unused bit.
//!
//! Canonical messages use plain byte-multiple members. Other messages use
//! bitfields over a base container chosen from the message length, and
//! signals crossing a container boundary are split into fragments.

use crate::context::Context;
use crate::error::Error;
use crate::fragment::{Fragments, split_uniform};
use crate::model::{DataKind, Message, Network, Signal};

/// One member of a message structure.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SignalStructure {
    /// Signal the member belongs to, `None` for reserved fillers.
    pub signal_name: Option<String>,
    /// Member name in the generated structure.
    pub fragment_name: String,
    /// Member size in bits.
    pub size_bits: u32,
    pub is_reserved: bool,
    /// Member is a whole array signal (canonical messages only).
    pub is_array: bool,
}

impl SignalStructure {
    fn reserved(name: String, size_bits: u32) -> Self {
        Self {
            signal_name: None,
            fragment_name: name,
            size_bits,
            is_reserved: true,
            is_array: false,
        }
    }

    fn signal(signal: &str, fragment_name: String, size_bits: u32) -> Self {
        Self {
            signal_name: Some(signal.to_string()),
            fragment_name,
            size_bits,
            is_reserved: false,
            is_array: false,
        }
    }
}

/// Ordered members of one message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageStructure {
    pub name: String,
    /// Message length in bytes
    pub len: u32,
    /// Bitfield container width, only for non-canonical messages.
    pub base_width: Option<u32>,
    pub is_canonical: bool,
    pub signals: Vec<SignalStructure>,
}

impl MessageStructure {
    /// Sum of all member sizes; equals the message size in bits.
    pub fn total_bits(&self) -> u32 {
        self.signals.iter().map(|s| s.size_bits).sum()
    }

    /// Members belonging to a given signal.
    pub fn fragments_of<'a>(&'a self, signal: &'a str) -> impl Iterator<Item = &'a SignalStructure> {
        self.signals
            .iter()
            .filter(move |s| s.signal_name.as_deref() == Some(signal))
    }
}

/// Bitfield container width for a non-canonical message of `message_len`
/// bytes: 8 for odd lengths, 16 for 2 and 6, 32 for 4 and 8, never wider
/// than the target's widest integer.
pub fn bitfield_base_width(message_len: u32, max_int_width: u32) -> u32 {
    let width = match message_len {
        n if n % 2 == 1 => 8,
        2 | 6 => 16,
        _ => 32,
    };
    width.min(max_int_width)
}

/// Name of the `index`-th fragment of `signal`, avoiding the names in
/// `taken` (the real signals of the same message).
///
/// Prefixes from the configuration are tried in order; once all of them
/// collide the disruptive prefix is used and a warning is reported so that a
/// human renames the fragment.
pub(crate) fn unique_fragment_name(
    ctx: &Context,
    taken: &[&str],
    signal: &str,
    index: usize,
) -> String {
    let config = &ctx.config;
    let prefixes = &config.part_prefixes;
    for (attempt, prefix) in prefixes.iter().enumerate() {
        let candidate = format!("{signal}_{prefix}{index}");
        if !taken.contains(&candidate.as_str()) {
            return candidate;
        }
        if let Some(next) = prefixes.get(attempt + 1) {
            ctx.diagnostics.info(
                "layout",
                format!(
                    r#"Signal part "{candidate}" of signal "{signal}" duplicates an existing signal in the same message, trying prefix "{next}""#
                ),
            );
        }
    }
    let fragment = format!("{signal}_{}{index}", config.disruptive_prefix);
    ctx.report(
        "layout",
        &Error::FragmentNameCollision {
            fragment: fragment.clone(),
            signal: signal.to_string(),
        },
    );
    fragment
}

/// Builds the structures of one message, keeping track of reserved member
/// numbering and of the names already taken by real signals.
struct StructureBuilder<'a> {
    ctx: &'a Context,
    message: &'a Message,
    taken: Vec<&'a str>,
    members: Vec<SignalStructure>,
    reserved_counter: u32,
}

impl<'a> StructureBuilder<'a> {
    fn new(ctx: &'a Context, message: &'a Message, signals: &[&'a Signal]) -> Self {
        Self {
            ctx,
            message,
            taken: signals.iter().map(|s| s.name.as_str()).collect(),
            members: Vec::new(),
            reserved_counter: 0,
        }
    }

    fn push_reserved(&mut self, size_bits: u32) {
        let ctx = self.ctx;
        let name = unique_fragment_name(
            ctx,
            &self.taken,
            &ctx.config.reserved_name,
            self.reserved_counter as usize,
        );
        self.reserved_counter += 1;
        self.members.push(SignalStructure::reserved(name, size_bits));
    }

    fn fragment_name(&self, signal: &str, index: usize) -> String {
        unique_fragment_name(self.ctx, &self.taken, signal, index)
    }

    fn push_fragments(&mut self, signal: &str, sizes: impl Iterator<Item = u32>) {
        for (index, size) in sizes.enumerate() {
            let name = self.fragment_name(signal, index);
            self.members.push(SignalStructure::signal(signal, name, size));
        }
    }

    fn canonical(mut self, signals: &[&Signal]) -> MessageStructure {
        let mut next_byte = 0;
        for signal in signals {
            let Some(layout) = signal.layout() else { continue };
            for _ in next_byte..layout.start_byte {
                self.push_reserved(8);
            }
            let mut member = SignalStructure::signal(&signal.name, signal.name.clone(), signal.len);
            member.is_array = signal.data_kind() == DataKind::Array;
            self.members.push(member);
            next_byte = layout.start_byte + signal.len / 8;
        }
        for _ in next_byte..self.message.len {
            self.push_reserved(8);
        }
        self.finish(None, true)
    }

    fn bitfield(mut self, signals: &[&Signal]) -> MessageStructure {
        let base = bitfield_base_width(self.message.len, self.ctx.profile.max_int_width);
        let mut next_bit = 0;
        for signal in signals {
            let (Some(start), Some(end)) = (signal.abs_start_bit(), signal.abs_end_bit()) else {
                continue;
            };
            if start > next_bit {
                self.fill(next_bit, start - 1, base);
            }

            if signal.data_kind() == DataKind::Array {
                self.push_fragments(&signal.name, core::iter::repeat_n(8, (signal.len / 8) as usize));
            } else {
                let parts = self
                    .ctx
                    .check("layout", split_uniform(start, end, base))
                    .unwrap_or_default();
                if parts.is_single_nominal() {
                    self.members
                        .push(SignalStructure::signal(&signal.name, signal.name.clone(), signal.len));
                } else if parts.is_leading_only() {
                    // Fits one container: a single bitfield, no fragment suffix.
                    self.members.push(SignalStructure::signal(
                        &signal.name,
                        signal.name.clone(),
                        parts.total_bits(),
                    ));
                } else {
                    self.push_fragments(&signal.name, parts.sizes());
                }
            }
            next_bit = end + 1;
        }
        let total = self.message.bit_len();
        if next_bit < total {
            self.fill(next_bit, total - 1, base);
        }
        self.finish(Some(base), false)
    }

    /// Reserved members covering `[start, end]`.
    fn fill(&mut self, start: u32, end: u32, base: u32) {
        let parts: Fragments = self
            .ctx
            .check("layout", split_uniform(start, end, base))
            .unwrap_or_default();
        for size in parts.sizes() {
            self.push_reserved(size);
        }
    }

    fn finish(self, base_width: Option<u32>, is_canonical: bool) -> MessageStructure {
        MessageStructure {
            name: self.message.name.clone(),
            len: self.message.len,
            base_width,
            is_canonical,
            signals: self.members,
        }
    }
}

impl Network {
    /// Structure of one message, `None` when it has no placed signal.
    pub fn message_structure(&self, message: &str, ctx: &Context) -> Option<MessageStructure> {
        let msg = self.message(message)?;
        let mut signals = self.signals_of_message(message);
        if signals.is_empty() {
            return None;
        }
        signals.sort_by_key(|s| s.layout());

        let builder = StructureBuilder::new(ctx, msg, &signals);
        let structure = if signals.iter().all(|s| s.is_byte_aligned()) {
            builder.canonical(&signals)
        } else {
            builder.bitfield(&signals)
        };
        ctx.diagnostics.debug(
            "layout",
            format!(
                "message \"{}\": {} members, canonical: {}",
                structure.name,
                structure.signals.len(),
                structure.is_canonical
            ),
        );
        Some(structure)
    }

    /// Structures of every message with at least one placed signal, in
    /// message name order.
    pub fn get_messages_structures(&self, ctx: &Context) -> Vec<MessageStructure> {
        let mut names: Vec<&str> = self
            .sorted_signals_by_layout()
            .into_iter()
            .filter_map(|s| s.message())
            .collect();
        names.dedup();
        names
            .into_iter()
            .filter_map(|name| self.message_structure(name, ctx))
            .collect()
    }
}
