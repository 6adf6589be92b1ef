//! Tabular network definitions.
//!
//! A network description arrives as flat rows (one per node, enumerated type,
//! message and signal), typically exported from a spreadsheet as JSON.
//! [`Network::from_rows`] applies them in dependency order and reports every
//! rejected row instead of stopping at the first one.

use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::{EnumType, Message, Network, Node, Signal, TxType};

/// One node definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NodeRow {
    pub name: String,
    pub description: Option<String>,
}

/// One enumerated type, its symbols given as `"OFF (0), ON, ERROR (0x0F)"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EnumTypeRow {
    pub name: String,
    pub definition: String,
    pub description: Option<String>,
}

/// One message with its publisher and subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MessageRow {
    pub name: String,
    pub id: u32,
    pub extended: bool,
    /// Payload length in bytes
    pub len: u32,
    /// `spontan`, `cyclic`, `cyclic_spontan` or `BAF`; spontaneous when absent
    pub tx_type: Option<String>,
    pub period_ms: Option<u32>,
    pub baf_repeats: Option<u32>,
    pub publisher: Option<String>,
    /// Subscriber list such as `"ECU_A (100), ECU_B"`, timeouts in ms
    pub subscribers: Option<String>,
    pub description: Option<String>,
}

/// One signal with its data type, placement and physical attributes.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SignalRow {
    pub name: String,
    /// Length in bits
    pub len: u32,
    /// `scalar`, `array` or the name of an enumerated type
    pub data_type: Option<String>,
    pub message: Option<String>,
    pub start_byte: Option<u32>,
    pub start_bit: Option<u32>,
    pub init_value: Option<String>,
    pub fail_value: Option<String>,
    pub offset: Option<f64>,
    pub resolution: Option<f64>,
    pub unit: Option<String>,
    pub description: Option<String>,
}

/// Every row of a network definition.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NetworkRows {
    pub description: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
    pub nodes: Vec<NodeRow>,
    pub enum_types: Vec<EnumTypeRow>,
    pub messages: Vec<MessageRow>,
    pub signals: Vec<SignalRow>,
}

impl NetworkRows {
    /// Parse rows from a JSON document.
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::Json(format!("network rows deserialization failed: {e}")))
    }
}

impl MessageRow {
    fn to_message(&self) -> Result<Message> {
        let tx_type = match self.tx_type.as_deref() {
            Some(text) => text.parse::<TxType>()?,
            None => TxType::Spontaneous,
        };
        let mut message = Message::new(&self.name, self.id, self.len).with_tx(tx_type, self.period_ms);
        message.extended = self.extended;
        message.baf_repeats = self.baf_repeats;
        message.description = self.description.clone();
        Ok(message)
    }
}

impl SignalRow {
    fn to_signal(&self) -> Signal {
        let mut signal = Signal::new(&self.name, self.len);
        signal.description = self.description.clone();
        signal.init_value = self.init_value.clone();
        signal.fail_value = self.fail_value.clone();
        signal.offset = self.offset.unwrap_or(0.0);
        signal.resolution = self.resolution.unwrap_or(1.0);
        signal.unit = self.unit.clone();
        signal
    }

    fn placement(&self) -> Option<Result<(&str, u32, u32)>> {
        let message = self.message.as_deref()?;
        Some(match (self.start_byte, self.start_bit) {
            (Some(byte), Some(bit)) => Ok((message, byte, bit)),
            _ => Err(Error::InvalidDefinition(format!(
                r#"signal "{}" is mapped to message "{message}" without a start byte and bit"#,
                self.name
            ))),
        })
    }
}

impl Network {
    /// Build a network from rows, applying nodes, enumerated types, messages
    /// and signals in that order.
    ///
    /// A rejected row is reported through `ctx` and skipped; the rows after it
    /// are still applied.
    ///
    /// ```
    /// use can_comgen::{Context, Network};
    /// use can_comgen::rows::{MessageRow, NetworkRows, SignalRow};
    ///
    /// let rows = NetworkRows {
    ///     messages: vec![MessageRow { name: "DOORS".into(), id: 0x120, len: 1, ..Default::default() }],
    ///     signals: vec![SignalRow {
    ///         name: "LockReq".into(),
    ///         len: 2,
    ///         message: Some("DOORS".into()),
    ///         start_byte: Some(0),
    ///         start_bit: Some(2),
    ///         ..Default::default()
    ///     }],
    ///     ..Default::default()
    /// };
    /// let ctx = Context::default();
    /// let network = Network::from_rows("Body", &rows, &ctx);
    /// assert_eq!(network.signal_conveyor_message("LockReq").unwrap().name, "DOORS");
    /// ```
    pub fn from_rows(name: impl Into<String>, rows: &NetworkRows, ctx: &Context) -> Network {
        let mut network = Network::new(name);
        network.description = rows.description.clone();
        network.version = rows.version.clone();
        network.date = rows.date.clone();

        for row in &rows.nodes {
            let mut node = Node::new(&row.name);
            node.description = row.description.clone();
            ctx.check("loader", network.add_node(node));
        }

        for row in &rows.enum_types {
            let result = EnumType::parse(&row.name, &row.definition).and_then(|mut enum_type| {
                enum_type.description = row.description.clone();
                network.add_enum_type(enum_type)
            });
            ctx.check("loader", result);
        }

        for row in &rows.messages {
            network.apply_message_row(row, ctx);
        }

        for row in &rows.signals {
            network.apply_signal_row(row, ctx);
        }

        ctx.diagnostics.info(
            "loader",
            format!(
                "network \"{}\": {} node(s), {} enumerated type(s), {} message(s), {} signal(s)",
                network.name,
                network.nodes().count(),
                network.enum_types().count(),
                network.messages().count(),
                network.signals().count()
            ),
        );
        network
    }

    fn apply_message_row(&mut self, row: &MessageRow, ctx: &Context) {
        let Some(message) = ctx.check("loader", row.to_message()) else {
            return;
        };
        if !message.tx_type.is_periodic() && message.period_ms.is_some() {
            ctx.diagnostics.warning(
                "loader",
                format!(r#"period of spontaneous message "{}" is ignored"#, row.name),
            );
        }
        if ctx.check("loader", self.add_message(message)).is_none() {
            return;
        }
        if let Some(publisher) = row.publisher.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            ctx.check("loader", self.set_publisher(&row.name, publisher));
        }
        if let Some(subscribers) = row.subscribers.as_deref() {
            ctx.check("loader", self.add_rx_message_to_subscribers(&row.name, subscribers));
        }
    }

    fn apply_signal_row(&mut self, row: &SignalRow, ctx: &Context) {
        if ctx.check("loader", self.add_signal(row.to_signal())).is_none() {
            return;
        }
        if let Some(data_type) = row.data_type.as_deref() {
            if ctx
                .check("loader", self.set_signal_data_type(&row.name, data_type))
                .is_none()
            {
                return;
            }
        }
        if let Some(placement) = row.placement() {
            let result =
                placement.and_then(|(message, byte, bit)| self.add_signal_to_message(message, &row.name, byte, bit));
            ctx.check("loader", result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DataKind;

    fn rows() -> NetworkRows {
        NetworkRows {
            version: Some("1.2".into()),
            nodes: vec![
                NodeRow { name: "BCM".into(), ..Default::default() },
                NodeRow { name: "DCU".into(), ..Default::default() },
                NodeRow { name: "bad node".into(), ..Default::default() },
            ],
            enum_types: vec![EnumTypeRow {
                name: "Lock".into(),
                definition: "UNLOCKED, LOCKED".into(),
                ..Default::default()
            }],
            messages: vec![
                MessageRow {
                    name: "DOORS".into(),
                    id: 0x120,
                    len: 2,
                    tx_type: Some("cyclic".into()),
                    period_ms: Some(100),
                    publisher: Some("BCM".into()),
                    subscribers: Some("DCU (500)".into()),
                    ..Default::default()
                },
                MessageRow {
                    name: "CLONE".into(),
                    id: 0x120,
                    len: 2,
                    ..Default::default()
                },
            ],
            signals: vec![
                SignalRow {
                    name: "LockReq".into(),
                    len: 2,
                    data_type: Some("Lock".into()),
                    message: Some("DOORS".into()),
                    start_byte: Some(0),
                    start_bit: Some(0),
                    resolution: Some(0.5),
                    ..Default::default()
                },
                SignalRow {
                    name: "Overlapping".into(),
                    len: 4,
                    message: Some("DOORS".into()),
                    start_byte: Some(0),
                    start_bit: Some(1),
                    ..Default::default()
                },
                SignalRow {
                    name: "Unplaced".into(),
                    len: 4,
                    message: Some("DOORS".into()),
                    ..Default::default()
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn rejected_rows_are_reported_and_skipped() {
        let ctx = Context::default();
        let n = Network::from_rows("Body", &rows(), &ctx);

        assert_eq!(n.version.as_deref(), Some("1.2"));
        assert_eq!(n.nodes().count(), 2);
        assert!(n.message("CLONE").is_none());
        assert_eq!(n.message("DOORS").unwrap().publisher(), Some("BCM"));
        assert_eq!(n.subscribers_of("DOORS"), [("DCU", Some(500))]);

        let lock = n.signal("LockReq").unwrap();
        assert_eq!(lock.data_kind(), DataKind::Enum);
        assert_eq!(lock.resolution, 0.5);
        assert!(n.signal("Overlapping").unwrap().layout().is_none());
        assert!(n.signal("Unplaced").unwrap().layout().is_none());

        // bad node name, duplicate id, overlap, missing placement
        assert_eq!(ctx.diagnostics.counts().warning, 4);
    }

    #[test]
    fn spontaneous_period_is_a_warning() {
        let rows = NetworkRows {
            messages: vec![MessageRow {
                name: "M".into(),
                id: 1,
                len: 8,
                period_ms: Some(10),
                ..Default::default()
            }],
            ..Default::default()
        };
        let ctx = Context::default();
        let n = Network::from_rows("N", &rows, &ctx);
        assert!(n.message("M").is_some());
        assert_eq!(ctx.diagnostics.counts().warning, 1);
    }

    #[test]
    fn unknown_tx_type_rejects_the_message() {
        let rows = NetworkRows {
            messages: vec![MessageRow {
                name: "M".into(),
                id: 1,
                len: 8,
                tx_type: Some("burst".into()),
                ..Default::default()
            }],
            ..Default::default()
        };
        let ctx = Context::default();
        assert!(Network::from_rows("N", &rows, &ctx).message("M").is_none());
    }

    #[cfg(feature = "serde_json")]
    #[test]
    fn rows_from_json() {
        let json = r#"{
            "nodes": [{"name": "BCM"}],
            "messages": [{"name": "M", "id": 291, "len": 8, "publisher": "BCM"}],
            "signals": [{"name": "S", "len": 12, "message": "M", "start_byte": 1, "start_bit": 4}]
        }"#;
        let rows = NetworkRows::from_json(json).unwrap();
        let ctx = Context::default();
        let n = Network::from_rows("N", &rows, &ctx);
        assert_eq!(n.signal("S").unwrap().abs_start_bit(), Some(12));
        assert!(!ctx.diagnostics.counts().has_errors());

        assert!(matches!(NetworkRows::from_json("{"), Err(Error::Json(_))));
    }
}
