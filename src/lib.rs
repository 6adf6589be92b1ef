#![forbid(unsafe_code)]

//! # can-comgen
//!
//! A Rust library for modelling CAN networks and generating the C code that
//! packs and unpacks their signals.
//!
//! A network is made of nodes, messages (frames of 1 to 8 bytes) and signals
//! (bit fields of 1 to 64 bits placed inside a message). From a consistent
//! network the crate derives, per message, the member list of a C structure
//! overlaying the message buffer and, per signal, the container-sized steps
//! needed to read or write its value.
//!
//! ## Features
//!
//! - **Modelling**: Build networks with identifier, overlap, alignment and
//!   publisher/subscriber checks enforced at every mutation
//! - **Layout**: Derive canonical or bitfield message structures with
//!   reserved fillers covering every unused bit
//! - **Access recipes**: Compute masks and shifts per native container,
//!   bounded by the target compiler's widest integer
//! - **C rendering**: Emit packed unions and access macros
//! - **Interchange**: Load networks from rows, JSON or DBC files
//!
//! Signals are little-endian (Intel byte order); bit 0 of byte 0 is the least
//! significant bit of the message.
//!
//! ## Quick Start
//!
//! ```
//! use can_comgen::{Context, Message, Network, Signal};
//! use can_comgen::codegen::render_read;
//!
//! let mut network = Network::new("Body");
//! network.add_message(Message::new("DOORS", 0x120, 8)).unwrap();
//! network.add_signal(Signal::new("LockReq", 2)).unwrap();
//! network.add_signal_to_message("DOORS", "LockReq", 5, 2).unwrap();
//!
//! let ctx = Context::default();
//! let read = network.get_signal_abstract_read("LockReq", &ctx).unwrap();
//! assert_eq!(render_read(&read, "msg_buffer").unwrap(), "(((msg_buffer[5]) >> 2u) & 0x03u)");
//!
//! let mut buffer = [0u8; 8];
//! let write = network.get_signal_abstract_write("LockReq", &ctx).unwrap();
//! write.insert(&mut buffer, 3).unwrap();
//! assert_eq!(read.extract(&buffer).unwrap(), 3);
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`model`] | Network entities and their invariants |
//! | [`bits`] | Masks, container widths and C literals |
//! | [`fragment`] | Splitting bit ranges into container-sized fragments |
//! | [`structure`] | Per-message structure members |
//! | [`access`] | Per-signal read and write recipes |
//! | [`codegen`] | C rendering of structures and recipes |
//! | [`rows`] | Loading networks from tabular rows |
//! | [`report`] | JSON interchange of networks and layouts |
//! | `dbc` | DBC import (feature `dbc`) |
//! | [`config`] | Compiler profile and naming options |
//! | [`diagnostics`] | Severity-counted run diagnostics |
//! | [`error`] | Error types and [`Result`] alias |
//!
//! ## Error Handling
//!
//! Model mutators return [`Result<T>`] and leave the network untouched on
//! error. Loaders and builders never stop at the first problem: they report
//! each [`Error`] into the [`Context`]'s [`Diagnostics`] at the error's
//! severity and carry on with the remaining entities.

pub mod access;
pub mod bits;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod fragment;
pub mod model;
pub mod report;
pub mod rows;
pub mod structure;

mod context;

#[cfg(feature = "dbc")]
pub mod dbc;

// Re-export commonly used types at the crate root
pub use access::{AccessDirection, PieceAccess, SignalAccess};
pub use config::{CompilerProfile, GenConfig};
pub use context::Context;
pub use diagnostics::{Diagnostic, Diagnostics, Severity, SeverityCounts};
pub use error::{Error, Result};
pub use fragment::Fragments;
pub use model::{DataKind, Direction, EnumType, Layout, Message, Network, Node, Signal, TxType};
pub use report::LayoutReport;
pub use rows::NetworkRows;
pub use structure::{MessageStructure, SignalStructure};
