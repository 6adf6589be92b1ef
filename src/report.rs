//! JSON interchange of networks and derived layouts.
//!
//! A [`Network`] can be saved and reloaded as JSON. A [`LayoutReport`]
//! bundles every message structure and every signal recipe of a network so
//! that an external template engine can render code without linking this
//! crate.
//!
//! # Example
//!
//! ```no_run
//! use can_comgen::{Context, LayoutReport, Network};
//!
//! fn main() -> Result<(), can_comgen::Error> {
//!     let network = Network::load_from_file("body.json")?;
//!     let ctx = Context::default();
//!     let report = LayoutReport::build(&network, &ctx);
//!     report.save_to_file("body_layout.json")?;
//!     Ok(())
//! }
//! ```

use crate::access::SignalAccess;
use crate::context::Context;
use crate::diagnostics::SeverityCounts;
use crate::model::Network;
use crate::structure::MessageStructure;

#[cfg(feature = "serde_json")]
use crate::error::{Error, Result};

#[cfg(feature = "serde_json")]
impl Network {
    /// Serialize the network to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Json(format!("network serialization failed: {e}")))
    }

    /// Deserialize a network from JSON.
    ///
    /// The relations stored in the document are re-checked; the first
    /// violation found rejects the whole network.
    pub fn from_json(json: &str) -> Result<Self> {
        let network: Network = serde_json::from_str(json)
            .map_err(|e| Error::Json(format!("network deserialization failed: {e}")))?;
        match network.layout_errors().into_iter().next() {
            Some(err) => Err(err),
            None => Ok(network),
        }
    }

    /// Save the network to a JSON file.
    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(Error::IOError)?;
        Ok(())
    }

    /// Load a network from a JSON file.
    pub fn load_from_file(path: &str) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(Error::IOError)?;
        Self::from_json(&json)
    }
}

/// Every derived object of a network.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutReport {
    pub network: String,
    pub structures: Vec<MessageStructure>,
    /// Read recipes of every placed signal, in layout order
    pub reads: Vec<SignalAccess>,
    /// Write recipes of every placed signal, in layout order
    pub writes: Vec<SignalAccess>,
    /// Diagnostics summary at the time the report was built
    pub diagnostics: SeverityCounts,
}

impl LayoutReport {
    /// Derive structures and recipes for every placed signal. Signals whose
    /// recipes cannot be built are reported through `ctx` and left out.
    pub fn build(network: &Network, ctx: &Context) -> Self {
        let structures = network.get_messages_structures(ctx);
        let mut reads = Vec::new();
        let mut writes = Vec::new();
        for signal in network.sorted_signals_by_layout() {
            reads.extend(network.get_signal_abstract_read(&signal.name, ctx));
            writes.extend(network.get_signal_abstract_write(&signal.name, ctx));
        }
        Self {
            network: network.name.clone(),
            structures,
            reads,
            writes,
            diagnostics: ctx.diagnostics.counts(),
        }
    }

    /// Structure of a message, by name.
    pub fn structure(&self, message: &str) -> Option<&MessageStructure> {
        self.structures.iter().find(|s| s.name == message)
    }

    /// Read recipe of a signal, by name.
    pub fn read(&self, signal: &str) -> Option<&SignalAccess> {
        self.reads.iter().find(|a| a.signal_name == signal)
    }

    /// Write recipe of a signal, by name.
    pub fn write(&self, signal: &str) -> Option<&SignalAccess> {
        self.writes.iter().find(|a| a.signal_name == signal)
    }
}

#[cfg(feature = "serde_json")]
impl LayoutReport {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| Error::Json(format!("layout report serialization failed: {e}")))
    }

    pub fn save_to_file(&self, path: &str) -> Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json).map_err(Error::IOError)?;
        Ok(())
    }
}
