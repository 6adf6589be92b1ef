use std::collections::BTreeMap;

use super::{check_identifier, parse_symbol_list};
use crate::error::{Error, Result};

/// Enumerated data type usable by signals.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumType {
    pub name: String,
    /// Symbols in declaration order with their explicit value, if any.
    pub symbols: Vec<(String, Option<i64>)>,
    pub description: Option<String>,
}

impl EnumType {
    pub fn new(name: impl Into<String>, symbols: Vec<(String, Option<i64>)>) -> Self {
        Self {
            name: name.into(),
            symbols,
            description: None,
        }
    }

    /// Build a type from a definition string such as `"OFF (0), ON, ERROR (7)"`.
    pub fn parse(name: impl Into<String>, definition: &str) -> Result<Self> {
        Ok(Self::new(name, parse_symbol_list(definition)?))
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Symbols with their effective values.
    ///
    /// Symbols without an explicit value take the value following the
    /// previous symbol, the first one starting at 0.
    ///
    /// ```
    /// use can_comgen::EnumType;
    ///
    /// let t = EnumType::parse("Gear", "P, R, N (4), D").unwrap();
    /// let values: Vec<i64> = t.resolved_values().into_iter().map(|(_, v)| v).collect();
    /// assert_eq!(values, [0, 1, 4, 5]);
    /// ```
    pub fn resolved_values(&self) -> Vec<(String, i64)> {
        let mut next = 0i64;
        self.symbols
            .iter()
            .map(|(symbol, explicit)| {
                let value = explicit.unwrap_or(next);
                next = value.saturating_add(1);
                (symbol.clone(), value)
            })
            .collect()
    }

    /// Value of a symbol, if the type defines it.
    pub fn value_of(&self, symbol: &str) -> Option<i64> {
        self.resolved_values()
            .into_iter()
            .find_map(|(s, v)| (s == symbol).then_some(v))
    }

    /// Resolved values shared by more than one symbol.
    pub fn duplicate_values(&self) -> Vec<(i64, Vec<String>)> {
        let mut by_value: BTreeMap<i64, Vec<String>> = BTreeMap::new();
        for (symbol, value) in self.resolved_values() {
            by_value.entry(value).or_default().push(symbol);
        }
        by_value
            .into_iter()
            .filter(|(_, symbols)| symbols.len() > 1)
            .collect()
    }

    /// Syntax checks done when the type joins a network.
    pub(crate) fn validate(&self) -> Result<()> {
        check_identifier("enumerated type", &self.name)?;
        if self.symbols.is_empty() {
            return Err(Error::InvalidDefinition(format!(
                r#"enumerated type "{}" has no symbols"#,
                self.name
            )));
        }
        for (index, (symbol, _)) in self.symbols.iter().enumerate() {
            check_identifier("symbol", symbol)?;
            if self.symbols[..index].iter().any(|(s, _)| s == symbol) {
                return Err(Error::Duplicate {
                    kind: "symbol",
                    name: format!("{}::{symbol}", self.name),
                });
            }
        }
        Ok(())
    }
}
