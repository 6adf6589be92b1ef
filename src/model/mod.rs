//! Network entities: enumerated types, nodes, messages and signals.
//!
//! A [`Network`] owns every entity by name. Relations between them
//! (publisher, subscriptions, signal placement) are only established through
//! the mutators on [`Network`], which enforce the layout invariants at call
//! time and leave the network untouched when they return an error.

mod enum_type;
mod message;
mod network;
mod node;
mod signal;

pub use enum_type::EnumType;
pub use message::{EXTENDED_ID_MAX, MAX_MESSAGE_LEN, Message, STANDARD_ID_MAX, TxType};
pub use network::{Direction, Network};
pub use node::Node;
pub use signal::{DataKind, Layout, MAX_SIGNAL_LEN, Signal};

use crate::error::{Error, Result};

/// Check a name against C-language identifier syntax (`[A-Za-z_][A-Za-z0-9_]*`).
///
/// ```
/// use can_comgen::model::is_valid_identifier;
///
/// assert!(is_valid_identifier("_Speed2"));
/// assert!(!is_valid_identifier("2Speed"));
/// assert!(!is_valid_identifier("speed-fl"));
/// ```
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    }
}

pub(crate) fn check_identifier(kind: &'static str, name: &str) -> Result<()> {
    if is_valid_identifier(name) {
        Ok(())
    } else {
        Err(Error::InvalidIdentifier {
            kind,
            name: name.to_string(),
        })
    }
}

pub(crate) fn parse_integer(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };
    let value = match digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok()?,
        None => digits.parse::<i64>().ok()?,
    };
    Some(if negative { -value } else { value })
}

/// Parse a comma separated list of symbols with optional values in
/// parentheses, e.g. `"OFF (0), ON, ERROR (0x0F)"`.
///
/// Used for enumerated type definitions and for subscriber lists, where the
/// value is the subscription timeout. Symbols keep their declaration order.
///
/// ```
/// use can_comgen::model::parse_symbol_list;
///
/// let symbols = parse_symbol_list("OFF (0), ON, ERROR (0x0F)").unwrap();
/// assert_eq!(symbols[1], ("ON".to_string(), None));
/// assert_eq!(symbols[2], ("ERROR".to_string(), Some(15)));
/// ```
pub fn parse_symbol_list(definition: &str) -> Result<Vec<(String, Option<i64>)>> {
    let mut symbols: Vec<(String, Option<i64>)> = Vec::new();
    for entry in definition.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, value) = match entry.split_once('(') {
            Some((name, rest)) => {
                let inner = rest.trim_end().strip_suffix(')').ok_or_else(|| {
                    Error::InvalidDefinition(format!(r#"missing ")" in "{entry}""#))
                })?;
                let value = parse_integer(inner).ok_or_else(|| {
                    Error::InvalidDefinition(format!(r#"invalid value "{inner}" in "{entry}""#))
                })?;
                (name.trim(), Some(value))
            }
            None => (entry, None),
        };
        check_identifier("symbol", name)?;
        if symbols.iter().any(|(s, _)| s == name) {
            return Err(Error::Duplicate {
                kind: "symbol",
                name: name.to_string(),
            });
        }
        symbols.push((name.to_string(), value));
    }
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers() {
        assert!(is_valid_identifier("a"));
        assert!(is_valid_identifier("A_b_3"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("a b"));
        assert!(!is_valid_identifier("é"));
    }

    #[test]
    fn symbol_lists() {
        let symbols = parse_symbol_list(" A(-2) ,B ,, C ( 0x10 )").unwrap();
        assert_eq!(
            symbols,
            vec![
                ("A".to_string(), Some(-2)),
                ("B".to_string(), None),
                ("C".to_string(), Some(16)),
            ]
        );
        assert!(parse_symbol_list("").unwrap().is_empty());
    }

    #[test]
    fn malformed_symbol_lists() {
        assert!(matches!(
            parse_symbol_list("A (1"),
            Err(Error::InvalidDefinition(_))
        ));
        assert!(matches!(
            parse_symbol_list("A (x)"),
            Err(Error::InvalidDefinition(_))
        ));
        assert!(matches!(
            parse_symbol_list("1A"),
            Err(Error::InvalidIdentifier { .. })
        ));
        assert!(matches!(
            parse_symbol_list("A, A (2)"),
            Err(Error::Duplicate { .. })
        ));
    }
}
