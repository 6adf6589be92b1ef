//! Code generation configuration.
//!
//! Every recognised option is a typed field; [`CompilerProfile::validate`] and
//! [`GenConfig::validate`] run once when a configuration is loaded so that
//! later stages never have to second-guess it.

use crate::error::{Error, Result};
use crate::model::is_valid_identifier;

/// Smallest integer container the generated code ever uses.
pub const MIN_CONTAINER_WIDTH: u32 = 8;

/// Widest integer container supported by any target.
pub const MAX_CONTAINER_WIDTH: u32 = 64;

/// Target compiler capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompilerProfile {
    /// Widest native unsigned integer, in bits (8, 16, 32 or 64).
    pub max_int_width: u32,
}

impl Default for CompilerProfile {
    fn default() -> Self {
        Self {
            max_int_width: MAX_CONTAINER_WIDTH,
        }
    }
}

impl CompilerProfile {
    pub fn new(max_int_width: u32) -> Result<Self> {
        let profile = Self { max_int_width };
        profile.validate()?;
        Ok(profile)
    }

    pub fn validate(&self) -> Result<()> {
        let w = self.max_int_width;
        if !w.is_power_of_two() || !(MIN_CONTAINER_WIDTH..=MAX_CONTAINER_WIDTH).contains(&w) {
            return Err(Error::Range {
                name: "max_int_width".into(),
                reason: format!("{w} is not one of 8, 16, 32 or 64"),
            });
        }
        Ok(())
    }

    /// The minimum container width, fixed at one byte.
    pub fn min_container_width(&self) -> u32 {
        MIN_CONTAINER_WIDTH
    }
}

/// Naming options for generated structure members.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GenConfig {
    /// Prefixes tried, in order, for the index part of fragment names.
    /// The first entry is the default one.
    pub part_prefixes: Vec<String>,
    /// Prefix used once every entry of `part_prefixes` collides. It is meant
    /// to break compilation so that a human renames the fragment.
    pub disruptive_prefix: String,
    /// Base name of synthesized filler fields (`<reserved_name>_<n>`).
    pub reserved_name: String,
}

impl Default for GenConfig {
    fn default() -> Self {
        Self {
            part_prefixes: vec!["".into(), "part_".into(), "ele_".into()],
            disruptive_prefix: "#".into(),
            reserved_name: "reserved".into(),
        }
    }
}

impl GenConfig {
    pub fn validate(&self) -> Result<()> {
        if self.part_prefixes.is_empty() {
            return Err(Error::InvalidDefinition(
                "at least one fragment part prefix is required".into(),
            ));
        }
        for prefix in &self.part_prefixes {
            // A prefix follows "<signal>_", so it only needs to be identifier-safe.
            if !prefix.is_empty() && !is_valid_identifier(&format!("_{prefix}")) {
                return Err(Error::InvalidDefinition(format!(
                    "fragment part prefix \"{prefix}\" is not identifier-safe"
                )));
            }
        }
        if self.disruptive_prefix.is_empty() {
            return Err(Error::InvalidDefinition(
                "disruptive prefix must not be empty".into(),
            ));
        }
        if !is_valid_identifier(&self.reserved_name) {
            return Err(Error::InvalidIdentifier {
                kind: "reserved field",
                name: self.reserved_name.clone(),
            });
        }
        Ok(())
    }

    /// Load and validate a configuration from JSON.
    #[cfg(feature = "serde_json")]
    pub fn from_json(json: &str) -> Result<Self> {
        let config: GenConfig = serde_json::from_str(json)
            .map_err(|e| Error::Json(format!("configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }
}
