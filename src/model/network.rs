use std::collections::BTreeMap;

use super::message::Message;
use super::node::Node;
use super::signal::{DataKind, Layout, MAX_SIGNAL_LEN, Signal};
use super::{EnumType, check_identifier, parse_symbol_list};
use crate::context::Context;
use crate::error::{Error, Result};

/// Direction of a message as seen from a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// The node publishes the message
    Tx,
    /// The node subscribes to the message
    Rx,
}

/// A CAN network: every entity and the relations between them.
///
/// Entities are stored by name in sorted maps so that iteration, and
/// therefore everything derived from a network, is deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Network {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
    enum_types: BTreeMap<String, EnumType>,
    nodes: BTreeMap<String, Node>,
    messages: BTreeMap<String, Message>,
    signals: BTreeMap<String, Signal>,
}

fn unknown(kind: &'static str, name: &str) -> Error {
    Error::UnknownReference {
        kind,
        name: name.to_string(),
    }
}

fn ranges_overlap(a: &core::ops::Range<u32>, b: &core::ops::Range<u32>) -> bool {
    a.start < b.end && b.start < a.end
}

impl Network {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    // Lookups

    pub fn enum_type(&self, name: &str) -> Option<&EnumType> {
        self.enum_types.get(name)
    }

    pub fn node(&self, name: &str) -> Option<&Node> {
        self.nodes.get(name)
    }

    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.get(name)
    }

    pub fn signal(&self, name: &str) -> Option<&Signal> {
        self.signals.get(name)
    }

    pub fn enum_types(&self) -> impl Iterator<Item = &EnumType> {
        self.enum_types.values()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn messages(&self) -> impl Iterator<Item = &Message> {
        self.messages.values()
    }

    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }

    /// Find a message by identifier.
    pub fn message_by_id(&self, id: u32, extended: bool) -> Option<&Message> {
        self.messages
            .values()
            .find(|m| m.id == id && m.extended == extended)
    }

    // Enumerated types and nodes

    pub fn add_enum_type(&mut self, enum_type: EnumType) -> Result<()> {
        enum_type.validate()?;
        if self.enum_types.contains_key(&enum_type.name) {
            return Err(Error::Duplicate {
                kind: "enumerated type",
                name: enum_type.name,
            });
        }
        self.enum_types.insert(enum_type.name.clone(), enum_type);
        Ok(())
    }

    /// Remove an enumerated type no signal uses anymore.
    pub fn remove_enum_type(&mut self, name: &str) -> Result<EnumType> {
        if let Some(user) = self.signals.values().find(|s| s.enum_type() == Some(name)) {
            return Err(Error::Conflict(format!(
                r#"enumerated type "{name}" is still used by signal "{}""#,
                user.name
            )));
        }
        self.enum_types
            .remove(name)
            .ok_or_else(|| unknown("Enumerated type", name))
    }

    pub fn add_node(&mut self, node: Node) -> Result<()> {
        check_identifier("node", &node.name)?;
        if self.nodes.contains_key(&node.name) {
            return Err(Error::Duplicate {
                kind: "node",
                name: node.name,
            });
        }
        if let Some(missing) = node
            .subscriptions
            .keys()
            .find(|m| !self.messages.contains_key(*m))
        {
            return Err(unknown("Message", missing));
        }
        self.nodes.insert(node.name.clone(), node);
        Ok(())
    }

    /// Remove a node, dropping it as publisher of its messages.
    pub fn remove_node(&mut self, name: &str) -> Result<Node> {
        let node = self.nodes.remove(name).ok_or_else(|| unknown("Node", name))?;
        for message in self.messages.values_mut() {
            if message.publisher.as_deref() == Some(name) {
                message.publisher = None;
            }
        }
        Ok(node)
    }

    // Messages

    pub fn add_message(&mut self, message: Message) -> Result<()> {
        check_identifier("message", &message.name)?;
        message.validate()?;
        if self.messages.contains_key(&message.name) {
            return Err(Error::Duplicate {
                kind: "message",
                name: message.name,
            });
        }
        // Ids are unique across both identifier spaces.
        if let Some(existing) = self.messages.values().find(|m| m.id == message.id) {
            return Err(Error::DuplicateMessageId {
                id: message.id,
                existing: existing.name.clone(),
            });
        }
        if let Some(publisher) = message.publisher() {
            if !self.nodes.contains_key(publisher) {
                return Err(unknown("Node", publisher));
            }
        }
        self.messages.insert(message.name.clone(), message);
        Ok(())
    }

    /// Set the node publishing a message.
    ///
    /// A message has at most one publisher, and a node cannot publish a
    /// message it subscribes to.
    pub fn set_publisher(&mut self, message: &str, node: &str) -> Result<()> {
        let subscriber = self.nodes.get(node).ok_or_else(|| unknown("Node", node))?;
        if subscriber.subscribes_to(message) {
            return Err(Error::Conflict(format!(
                r#"node "{node}" already subscribes to message "{message}""#
            )));
        }
        let msg = self
            .messages
            .get_mut(message)
            .ok_or_else(|| unknown("Message", message))?;
        if let Some(current) = msg.publisher.as_deref() {
            if current != node {
                return Err(Error::Conflict(format!(
                    r#"message "{message}" is already published by "{current}""#
                )));
            }
        }
        msg.publisher = Some(node.to_string());
        Ok(())
    }

    /// Subscribe a node to a message, with an optional timeout in ms.
    pub fn add_subscription(&mut self, node: &str, message: &str, timeout_ms: Option<u32>) -> Result<()> {
        let msg = self
            .messages
            .get(message)
            .ok_or_else(|| unknown("Message", message))?;
        if msg.publisher() == Some(node) {
            return Err(Error::Conflict(format!(
                r#"node "{node}" publishes message "{message}" and cannot subscribe to it"#
            )));
        }
        let target = self.nodes.get_mut(node).ok_or_else(|| unknown("Node", node))?;
        target.subscriptions.insert(message.to_string(), timeout_ms);
        Ok(())
    }

    /// Subscribe every node of a list such as `"ECU_A (100), ECU_B"` to a
    /// message; the value in parentheses is the timeout in ms.
    ///
    /// Either all subscriptions are made or none.
    pub fn add_rx_message_to_subscribers(&mut self, message: &str, subscribers: &str) -> Result<()> {
        let entries = parse_symbol_list(subscribers)?;
        let mut parsed = Vec::with_capacity(entries.len());
        for (node, timeout) in entries {
            let timeout = timeout
                .map(|t| {
                    u32::try_from(t).map_err(|_| Error::Range {
                        name: format!("{node}/{message}"),
                        reason: format!("timeout {t} is not a valid number of milliseconds"),
                    })
                })
                .transpose()?;
            if !self.nodes.contains_key(&node) {
                return Err(unknown("Node", &node));
            }
            parsed.push((node, timeout));
        }
        let msg = self
            .messages
            .get(message)
            .ok_or_else(|| unknown("Message", message))?;
        if let Some((publisher, _)) = parsed.iter().find(|(n, _)| msg.publisher() == Some(n.as_str())) {
            return Err(Error::Conflict(format!(
                r#"node "{publisher}" publishes message "{message}" and cannot subscribe to it"#
            )));
        }
        for (node, timeout) in parsed {
            self.add_subscription(&node, message, timeout)?;
        }
        Ok(())
    }

    /// Nodes subscribed to a message, with their timeouts.
    pub fn subscribers_of(&self, message: &str) -> Vec<(&str, Option<u32>)> {
        self.nodes
            .values()
            .filter_map(|n| n.timeout_of(message).map(|t| (n.name.as_str(), t)))
            .collect()
    }

    /// Whether `node` publishes or subscribes to `message`.
    pub fn message_direction(&self, node: &str, message: &str) -> Option<Direction> {
        let msg = self.messages.get(message)?;
        if msg.publisher() == Some(node) {
            return Some(Direction::Tx);
        }
        self.nodes
            .get(node)
            .filter(|n| n.subscribes_to(message))
            .map(|_| Direction::Rx)
    }

    // Signals

    /// Add an unplaced signal.
    pub fn add_signal(&mut self, mut signal: Signal) -> Result<()> {
        check_identifier("signal", &signal.name)?;
        if !(1..=MAX_SIGNAL_LEN).contains(&signal.len) {
            return Err(Error::Range {
                name: signal.name,
                reason: format!("length {} is outside 1..={MAX_SIGNAL_LEN} bits", signal.len),
            });
        }
        if self.signals.contains_key(&signal.name) {
            return Err(Error::Duplicate {
                kind: "signal",
                name: signal.name,
            });
        }
        signal.message = None;
        signal.layout = None;
        if let Some(enum_type) = signal.enum_type.as_deref() {
            if !self.enum_types.contains_key(enum_type) {
                return Err(unknown("Enumerated type", enum_type));
            }
        }
        self.signals.insert(signal.name.clone(), signal);
        Ok(())
    }

    /// Set a signal's data type: `"scalar"`, `"array"` or the name of an
    /// enumerated type.
    pub fn set_signal_data_type(&mut self, signal: &str, data_type: &str) -> Result<()> {
        let (kind, enum_type) = match data_type.trim() {
            "scalar" => (DataKind::Scalar, None),
            "array" => (DataKind::Array, None),
            name if self.enum_types.contains_key(name) => (DataKind::Enum, Some(name.to_string())),
            name => return Err(unknown("Enumerated type", name)),
        };
        let sig = self
            .signals
            .get_mut(signal)
            .ok_or_else(|| unknown("Signal", signal))?;
        if kind == DataKind::Array && sig.layout.is_some() && !sig.is_byte_aligned() {
            return Err(Error::Alignment {
                signal: signal.to_string(),
            });
        }
        if kind == DataKind::Array && sig.len % 8 != 0 {
            return Err(Error::Alignment {
                signal: signal.to_string(),
            });
        }
        sig.data_kind = kind;
        sig.enum_type = enum_type;
        Ok(())
    }

    /// Place a signal in a message at `(start_byte, start_bit)`.
    ///
    /// Rejected when the signal does not fit the message, overlaps another
    /// signal of the same message, is a misaligned array or is already
    /// conveyed by another message. Re-placing a signal inside its own
    /// message is allowed.
    pub fn add_signal_to_message(&mut self, message: &str, signal: &str, start_byte: u32, start_bit: u32) -> Result<()> {
        let msg = self
            .messages
            .get(message)
            .ok_or_else(|| unknown("Message", message))?;
        let sig = self.signals.get(signal).ok_or_else(|| unknown("Signal", signal))?;

        if let Some(current) = sig.message() {
            if current != message {
                return Err(Error::Conflict(format!(
                    r#"signal "{signal}" is already conveyed by message "{current}""#
                )));
            }
        }
        if start_bit >= 8 {
            return Err(Error::Range {
                name: signal.to_string(),
                reason: format!("start bit {start_bit} is outside 0..8"),
            });
        }
        if start_byte >= msg.len {
            return Err(Error::Range {
                name: signal.to_string(),
                reason: format!(
                    "start byte {start_byte} is outside the {} bytes of message \"{message}\"",
                    msg.len
                ),
            });
        }

        let layout = Layout::new(start_byte, start_bit);
        let start = layout.abs_start_bit();
        let range = start..start.saturating_add(sig.len);
        if range.end > msg.bit_len() {
            return Err(Error::Range {
                name: signal.to_string(),
                reason: format!(
                    "bits {}..{} do not fit in the {} bytes of message \"{message}\"",
                    range.start, range.end, msg.len
                ),
            });
        }
        if sig.data_kind() == DataKind::Array && (start % 8 != 0 || sig.len % 8 != 0) {
            return Err(Error::Alignment {
                signal: signal.to_string(),
            });
        }
        if let Some(other) = self.signals.values().find(|s| {
            s.name != signal
                && s.message() == Some(message)
                && s.bit_range().is_some_and(|r| ranges_overlap(&r, &range))
        }) {
            return Err(Error::LayoutOverlap {
                signal: signal.to_string(),
                other: other.name.clone(),
            });
        }

        if let Some(sig) = self.signals.get_mut(signal) {
            sig.message = Some(message.to_string());
            sig.layout = Some(layout);
        }
        Ok(())
    }

    /// Signals placed in a message, by name.
    pub fn signals_of_message(&self, message: &str) -> Vec<&Signal> {
        self.signals
            .values()
            .filter(|s| s.message() == Some(message) && s.layout.is_some())
            .collect()
    }

    /// Message conveying a signal.
    pub fn signal_conveyor_message(&self, signal: &str) -> Option<&Message> {
        self.signals
            .get(signal)
            .and_then(|s| s.message())
            .and_then(|m| self.messages.get(m))
    }

    /// Whether every signal of a message is byte aligned with a whole
    /// number of bytes. `None` when the message has no placed signal.
    pub fn message_layout_is_cannonical(&self, message: &str) -> Option<bool> {
        let signals = self.signals_of_message(message);
        if signals.is_empty() {
            return None;
        }
        Some(signals.iter().all(|s| s.is_byte_aligned()))
    }

    /// Every placed signal, sorted by message name then start byte then
    /// start bit, so that each message's signals are contiguous.
    pub fn sorted_signals_by_layout(&self) -> Vec<&Signal> {
        let mut signals: Vec<&Signal> = self.signals.values().filter(|s| s.layout.is_some()).collect();
        signals.sort_by(|a, b| (a.message(), a.layout).cmp(&(b.message(), b.layout)));
        signals
    }

    // Whole-network checks

    /// Re-check every cross-entity invariant.
    ///
    /// A network built through the mutators always passes; this is for
    /// networks coming from interchange files.
    pub fn layout_errors(&self) -> Vec<Error> {
        let mut errors = Vec::new();
        for enum_type in self.enum_types.values() {
            if let Err(e) = enum_type.validate() {
                errors.push(e);
            }
        }
        for node in self.nodes.values() {
            if let Err(e) = check_identifier("node", &node.name) {
                errors.push(e);
            }
            for message in node.subscriptions.keys() {
                if !self.messages.contains_key(message) {
                    errors.push(unknown("Message", message));
                }
            }
        }

        let messages: Vec<&Message> = self.messages.values().collect();
        for (i, message) in messages.iter().enumerate() {
            if let Err(e) = check_identifier("message", &message.name).and_then(|()| message.validate()) {
                errors.push(e);
            }
            if let Some(existing) = messages[..i].iter().find(|m| m.id == message.id) {
                errors.push(Error::DuplicateMessageId {
                    id: message.id,
                    existing: existing.name.clone(),
                });
            }
            if let Some(publisher) = message.publisher() {
                if !self.nodes.contains_key(publisher) {
                    errors.push(unknown("Node", publisher));
                }
            }
        }

        for signal in self.signals.values() {
            if let Err(e) = check_identifier("signal", &signal.name) {
                errors.push(e);
            }
            if !(1..=MAX_SIGNAL_LEN).contains(&signal.len) {
                errors.push(Error::Range {
                    name: signal.name.clone(),
                    reason: format!("length {} is outside 1..={MAX_SIGNAL_LEN} bits", signal.len),
                });
                continue;
            }
            if let Some(enum_type) = signal.enum_type() {
                if !self.enum_types.contains_key(enum_type) {
                    errors.push(unknown("Enumerated type", enum_type));
                }
            }
            let (Some(message), Some(layout)) = (signal.message(), signal.layout()) else {
                continue;
            };
            let Some(msg) = self.messages.get(message) else {
                errors.push(unknown("Message", message));
                continue;
            };
            let fits = layout.start_bit < 8
                && layout.start_byte < msg.len
                && signal.bit_range().is_some_and(|r| r.end <= msg.bit_len());
            if !fits {
                errors.push(Error::Range {
                    name: signal.name.clone(),
                    reason: format!("does not fit in message \"{message}\""),
                });
                continue;
            }
            if signal.data_kind() == DataKind::Array && !signal.is_byte_aligned() {
                errors.push(Error::Alignment {
                    signal: signal.name.clone(),
                });
            }
        }

        for message in self.messages.keys() {
            let signals = self.signals_of_message(message);
            for (i, a) in signals.iter().enumerate() {
                for b in &signals[i + 1..] {
                    if let (Some(ra), Some(rb)) = (a.bit_range(), b.bit_range()) {
                        if ranges_overlap(&ra, &rb) {
                            errors.push(Error::LayoutOverlap {
                                signal: b.name.clone(),
                                other: a.name.clone(),
                            });
                        }
                    }
                }
            }
        }
        errors
    }

    /// Report every invariant violation and enumerated type with duplicated
    /// values. Returns `true` when no violation was found.
    pub fn validate(&self, ctx: &Context) -> bool {
        for enum_type in self.enum_types.values() {
            for (value, symbols) in enum_type.duplicate_values() {
                ctx.diagnostics.warning(
                    "model",
                    format!(
                        r#"enumerated type "{}" resolves {} to value {value}"#,
                        enum_type.name,
                        symbols.join(", ")
                    ),
                );
            }
        }
        let errors = self.layout_errors();
        for err in &errors {
            ctx.report("model", err);
        }
        errors.is_empty()
    }
}
