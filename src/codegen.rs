//! C rendering of message structures and signal access recipes.
//!
//! The renderers turn the derived layout objects into C99 text: a packed
//! `typedef union` per message and read/write expressions per signal. The
//! generated code indexes a `uint8_t` message buffer and reads wider
//! containers through pointer casts, so it assumes a little-endian target
//! tolerating unaligned access.

use core::fmt::Write as _;

use crate::access::{AccessDirection, SignalAccess};
use crate::bits::{base_container_width, c_uint_type, hex_literal, shift_literal};
use crate::context::Context;
use crate::error::{Error, Result};
use crate::model::{DataKind, Network};
use crate::structure::{MessageStructure, unique_fragment_name};

/// Name of the message buffer argument in generated code.
pub const BUFFER_ARG: &str = "msg_buffer";

/// Name of the value argument of write macros.
pub const DATA_ARG: &str = "data";

/// Attribute packing the generated structures.
pub const PACK_ATTRIBUTE: &str = "__attribute__((packed))";

fn c_type(width: u32) -> Result<&'static str> {
    c_uint_type(width).ok_or_else(|| Error::Range {
        name: format!("{width}-bit container"),
        reason: "no native C type of that width".into(),
    })
}

fn container_ref(buffer: &str, width: u32, byte_offset: u32) -> Result<String> {
    Ok(if width > 8 {
        format!("*({}*)&{buffer}[{byte_offset}]", c_type(width)?)
    } else {
        format!("{buffer}[{byte_offset}]")
    })
}

fn first_byte(access: &SignalAccess) -> Result<u32> {
    access
        .pieces
        .first()
        .map(|p| p.byte_offset)
        .ok_or_else(|| Error::InvalidDefinition(format!(
            r#"access recipe of signal "{}" has no pieces"#,
            access.signal_name
        )))
}

/// Render a read recipe as a C expression over `buffer`.
///
/// ```
/// use can_comgen::{CompilerProfile, Signal};
/// use can_comgen::access::build_read;
/// use can_comgen::codegen::render_read;
///
/// let recipe = build_read(&Signal::new("Mode", 2), 5, 2, &CompilerProfile::default()).unwrap();
/// assert_eq!(render_read(&recipe, "msg_buffer").unwrap(), "(((msg_buffer[5]) >> 2u) & 0x03u)");
/// ```
pub fn render_read(access: &SignalAccess, buffer: &str) -> Result<String> {
    if access.direction != AccessDirection::Read {
        return Err(Error::InvalidDefinition(format!(
            r#"write recipe of signal "{}" rendered as a read"#,
            access.signal_name
        )));
    }
    if access.data_kind == DataKind::Array {
        return Ok(format!("(&{buffer}[{}])", first_byte(access)?));
    }

    let mut parts = Vec::with_capacity(access.pieces.len());
    for piece in &access.pieces {
        let mut expr = container_ref(buffer, piece.container_width, piece.byte_offset)?;
        if let Some(mask) = piece.inner_mask {
            expr = format!("({expr}) & {}", hex_literal(mask.into(), None)?);
        }
        if let Some(shift) = piece.inner_shift {
            expr = format!("({expr}) >> {}", shift_literal(shift));
        }
        if let Some(mask) = piece.outer_mask {
            expr = format!("({expr}) & {}", hex_literal(mask.into(), None)?);
        }
        if access.base_width > 8 {
            expr = format!("({})({expr})", c_type(access.base_width)?);
        }
        if let Some(shift) = piece.outer_shift {
            expr = format!("{expr} << {}", shift_literal(shift));
        }
        parts.push(expr);
    }

    Ok(match parts.as_slice() {
        [single] => format!("({single})"),
        _ => {
            let joined: Vec<String> = parts.iter().map(|p| format!("({p})")).collect();
            format!("({})", joined.join(" | "))
        }
    })
}

/// Render a write recipe as C statements storing `data` into `buffer`.
///
/// ```
/// use can_comgen::{CompilerProfile, Signal};
/// use can_comgen::access::build_write;
/// use can_comgen::codegen::render_write;
///
/// let recipe = build_write(&Signal::new("Mode", 2), 5, 2, &CompilerProfile::default()).unwrap();
/// assert_eq!(
///     render_write(&recipe, "msg_buffer", "data").unwrap(),
///     "msg_buffer[5] = (msg_buffer[5] & 0xf3u) | ((data << 2u) & 0x0cu);"
/// );
/// ```
pub fn render_write(access: &SignalAccess, buffer: &str, data: &str) -> Result<String> {
    if access.direction != AccessDirection::Write {
        return Err(Error::InvalidDefinition(format!(
            r#"read recipe of signal "{}" rendered as a write"#,
            access.signal_name
        )));
    }
    if access.data_kind == DataKind::Array {
        return Ok(format!(
            "memcpy(&{buffer}[{}], &{data}, {}u);",
            first_byte(access)?,
            access.length / 8
        ));
    }

    let mut statements = Vec::with_capacity(access.pieces.len());
    for (index, piece) in access.pieces.iter().enumerate() {
        let target = container_ref(buffer, piece.container_width, piece.byte_offset)?;
        let mut value = match piece.inner_shift {
            None => data.to_string(),
            Some(shift) if index == 0 => format!("{data} << {}", shift_literal(shift)),
            Some(shift) => format!("{data} >> {}", shift_literal(shift)),
        };
        if let Some(mask) = piece.outer_mask {
            value = format!("({value}) & {}", hex_literal(mask.into(), None)?);
        }
        let statement = match piece.inner_mask {
            Some(mask) => format!(
                "{target} = ({target} & {}) | ({value});",
                hex_literal(mask.into(), Some(piece.container_width))?
            ),
            None => format!("{target} = ({value});"),
        };
        statements.push(statement);
    }
    Ok(statements.join(" "))
}

/// Render a message structure as a packed `typedef union` named `S_<message>`
/// whose byte array is sized by `len_expr`.
pub fn render_message_struct(
    structure: &MessageStructure,
    len_expr: &str,
    ctx: &Context,
) -> Result<String> {
    let mut out = String::new();
    let _ = writeln!(out, "typedef union{{\n\tstruct {PACK_ATTRIBUTE}{{");

    if let Some(base) = structure.base_width {
        let ty = c_type(base)?;
        for member in &structure.signals {
            let _ = writeln!(out, "\t\t{ty} {} : {};", member.fragment_name, member.size_bits);
        }
    } else {
        let taken: Vec<&str> = structure
            .signals
            .iter()
            .filter_map(|m| m.signal_name.as_deref())
            .collect();
        for member in &structure.signals {
            if member.is_array {
                let _ = writeln!(
                    out,
                    "\t\tuint8_t {}[{}];",
                    member.fragment_name,
                    member.size_bits / 8
                );
            } else if c_uint_type(member.size_bits).is_some() {
                let _ = writeln!(out, "\t\t{} {};", c_type(member.size_bits)?, member.fragment_name);
            } else {
                for (index, width) in halving_containers(member.size_bits).into_iter().enumerate() {
                    let name = unique_fragment_name(ctx, &taken, &member.fragment_name, index);
                    let _ = writeln!(out, "\t\t{} {name};", c_type(width)?);
                }
            }
        }
    }

    let _ = writeln!(out, "\t}} s;");
    let _ = writeln!(out, "\tuint8_t all[{len_expr}];");
    let _ = write!(out, "}}S_{};", structure.name);
    Ok(out)
}

/// Native containers covering a byte-multiple member that has no native
/// type of its own, largest first (24 bits become 16 + 8).
pub fn halving_containers(size_bits: u32) -> Vec<u32> {
    let mut widths = Vec::new();
    let Some(mut container) = base_container_width(size_bits) else {
        return widths;
    };
    let mut remaining = size_bits;
    while container >= 8 && remaining > 0 {
        if container > remaining {
            container /= 2;
        }
        remaining = remaining.saturating_sub(container);
        widths.push(container);
        if remaining > 0 && container > remaining {
            match base_container_width(remaining) {
                Some(w) => container = w,
                None => break,
            }
        }
    }
    widths
}

/// Render a complete C header for a network: message length constants,
/// enumerated types, message structures and per-signal access macros.
///
/// `tag` is inserted after the `CAN_` prefix of every generated name so that
/// several networks can share a translation unit. Signals whose recipes
/// cannot be built are reported and skipped.
pub fn render_header(network: &Network, ctx: &Context, tag: &str) -> String {
    let tag = if tag.is_empty() {
        String::new()
    } else {
        format!("{tag}_")
    };
    let guard = format!("COMGEN_CAN_{tag}{}_H", network.name.to_ascii_uppercase());
    let structures = network.get_messages_structures(ctx);

    let mut out = String::new();
    let _ = writeln!(out, "/* Access code for CAN network \"{}\". */", network.name);
    let _ = writeln!(out, "#ifndef {guard}\n#define {guard}\n");
    let _ = writeln!(out, "#include <stdint.h>\n#include <string.h>\n");

    for message in network.messages() {
        let _ = writeln!(out, "#define kCAN_{tag}msgLen_{} {}u", message.name, message.len);
    }

    for enum_type in network.enum_types() {
        let symbols: Vec<String> = enum_type
            .resolved_values()
            .into_iter()
            .map(|(symbol, value)| format!("\tkCAN_{tag}{symbol} = {value}"))
            .collect();
        let _ = writeln!(
            out,
            "\ntypedef enum{{\n{}\n}}t_{};",
            symbols.join(",\n"),
            enum_type.name
        );
    }

    for structure in &structures {
        let _ = writeln!(
            out,
            "\n/* Structure for network \"{}\" message \"{}\". */",
            network.name, structure.name
        );
        let len_expr = format!("kCAN_{tag}msgLen_{}", structure.name);
        match ctx.check("codegen", render_message_struct(structure, &len_expr, ctx)) {
            Some(text) => {
                let _ = writeln!(out, "{text}");
            }
            None => continue,
        }

        let mut names: Vec<&str> = structure
            .signals
            .iter()
            .filter_map(|m| m.signal_name.as_deref())
            .collect();
        names.dedup();
        for name in names {
            render_signal_macros(&mut out, network, ctx, &tag, name);
        }
    }

    let _ = writeln!(out, "\n#endif /* {guard} */");
    ctx.diagnostics.info(
        "codegen",
        format!(
            "header for network \"{}\": {} message structure(s)",
            network.name,
            structures.len()
        ),
    );
    out
}

fn render_signal_macros(out: &mut String, network: &Network, ctx: &Context, tag: &str, name: &str) {
    let read = network
        .get_signal_abstract_read(name, ctx)
        .and_then(|a| ctx.check("codegen", render_read(&a, BUFFER_ARG)));
    let write = network
        .get_signal_abstract_write(name, ctx)
        .and_then(|a| ctx.check("codegen", render_write(&a, BUFFER_ARG, DATA_ARG)));

    let _ = writeln!(out, "\n/* Macros for reading signal \"{name}\". */");
    match read {
        Some(expr) => {
            let _ = writeln!(out, "#define CAN_{tag}extract_{name}({BUFFER_ARG}) {expr}");
            let _ = writeln!(
                out,
                "#define CAN_{tag}get_{name}({BUFFER_ARG}) (CAN_{tag}extract_{name}({BUFFER_ARG}.all))"
            );
        }
        None => {
            let _ = writeln!(out, "/* not generated, see diagnostics */");
        }
    }

    let _ = writeln!(out, "/* Macros for writing signal \"{name}\". */");
    match write {
        Some(stmt) => {
            let _ = writeln!(out, "#define CAN_{tag}write_{name}({BUFFER_ARG},{DATA_ARG}) {stmt}");
            let _ = writeln!(
                out,
                "#define CAN_{tag}update_{name}({BUFFER_ARG},{DATA_ARG}) CAN_{tag}write_{name}({BUFFER_ARG}.all,{DATA_ARG})"
            );
        }
        None => {
            let _ = writeln!(out, "/* not generated, see diagnostics */");
        }
    }
}
