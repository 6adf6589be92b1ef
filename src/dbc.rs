//! Import of DBC databases into a [`Network`].
//!
//! Senders become nodes, frames become messages and little-endian (Intel)
//! signals are placed at `(start_bit / 8, start_bit % 8)` with their scaling
//! and unit. Big-endian (Motorola) signals have no counterpart in the
//! Intel-ordered layout model and are reported then skipped.
//!
//! # Example
//!
//! ```
//! use can_comgen::Context;
//! use can_comgen::dbc::import_dbc_str;
//!
//! let dbc = r#"VERSION "1.0"
//!
//! BU_: ECM
//!
//! BO_ 256 Engine : 8 ECM
//!  SG_ RPM : 0|16@1+ (0.25,0) [0|8000] "rpm" Vector__XXX
//! "#;
//!
//! let ctx = Context::default();
//! let network = import_dbc_str(dbc, "Powertrain", &ctx).unwrap();
//! let rpm = network.signal("RPM").unwrap();
//! assert_eq!(rpm.resolution, 0.25);
//! assert_eq!(network.message("Engine").unwrap().publisher(), Some("ECM"));
//! ```

use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::{EXTENDED_ID_MAX, Message, Network, Node, Signal};

/// Placeholder DBC uses for "no node".
const NO_NODE: &str = "Vector__XXX";

/// Flag bit marking an extended identifier in DBC message ids.
const EXTENDED_FLAG: u32 = 0x8000_0000;

/// Build a network from a parsed DBC database.
///
/// Entities the model rejects (duplicate signal names across frames,
/// payloads longer than 8 bytes, big-endian signals) are reported through
/// `ctx` and skipped.
pub fn import_dbc(dbc: &dbc_rs::Dbc, name: &str, ctx: &Context) -> Network {
    let mut network = Network::new(name);

    for message in dbc.messages().iter() {
        let sender = message.sender();
        if sender != NO_NODE && network.node(sender).is_none() {
            ctx.check("dbc", network.add_node(Node::new(sender)));
        }

        let raw_id = message.id();
        let extended = raw_id & EXTENDED_FLAG != 0;
        let id = if extended { raw_id & EXTENDED_ID_MAX } else { raw_id };
        let mut msg = Message::new(message.name(), id, u32::from(message.dlc()));
        msg.extended = extended;
        if ctx.check("dbc", network.add_message(msg)).is_none() {
            continue;
        }
        if network.node(sender).is_some() {
            ctx.check("dbc", network.set_publisher(message.name(), sender));
        }

        for signal in message.signals().iter() {
            import_signal(&mut network, message.name(), signal, ctx);
        }
    }

    ctx.diagnostics.info(
        "dbc",
        format!(
            "imported network \"{name}\": {} message(s), {} signal(s)",
            network.messages().count(),
            network.signals().count()
        ),
    );
    network
}

fn import_signal(network: &mut Network, message: &str, signal: &dbc_rs::Signal, ctx: &Context) {
    if signal.byte_order() != dbc_rs::ByteOrder::LittleEndian {
        ctx.report(
            "dbc",
            &Error::InvalidDefinition(format!(
                r#"signal "{}" of message "{message}" is big-endian and was not imported"#,
                signal.name()
            )),
        );
        return;
    }
    if !signal.is_unsigned() {
        ctx.diagnostics.info(
            "dbc",
            format!(r#"signal "{}" is signed, imported as unsigned raw value"#, signal.name()),
        );
    }

    let mut imported = Signal::new(signal.name(), u32::from(signal.length()))
        .with_scaling(signal.offset(), signal.factor());
    if let Some(unit) = signal.unit().filter(|u| !u.is_empty()) {
        imported = imported.with_unit(unit);
    }
    if ctx.check("dbc", network.add_signal(imported)).is_none() {
        return;
    }

    let start = u32::from(signal.start_bit());
    ctx.check(
        "dbc",
        network.add_signal_to_message(message, signal.name(), start / 8, start % 8),
    );
}

/// Parse DBC text, then import it with [`import_dbc`].
pub fn import_dbc_str(content: &str, name: &str, ctx: &Context) -> Result<Network> {
    let dbc = dbc_rs::Dbc::parse(content).map_err(|e| Error::DbcParse(format!("{e:?}")))?;
    Ok(import_dbc(&dbc, name, ctx))
}
