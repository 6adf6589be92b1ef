use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// Largest classic CAN payload, in bytes.
pub const MAX_MESSAGE_LEN: u32 = 8;

/// Highest 11-bit identifier.
pub const STANDARD_ID_MAX: u32 = 0x7FF;

/// Highest 29-bit identifier.
pub const EXTENDED_ID_MAX: u32 = 0x1FFF_FFFF;

/// Transmission type of a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TxType {
    /// Sent on event
    #[default]
    Spontaneous,
    /// Sent every period
    Cyclic,
    /// Sent every period and on event
    CyclicSpontaneous,
    /// Cyclic while active: sent on event, then repeated a bounded number of times
    Baf,
}

impl TxType {
    /// Name used in network definitions.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Spontaneous => "spontan",
            TxType::Cyclic => "cyclic",
            TxType::CyclicSpontaneous => "cyclic_spontan",
            TxType::Baf => "BAF",
        }
    }

    /// Whether a period is needed to schedule the message.
    pub fn is_periodic(&self) -> bool {
        !matches!(self, TxType::Spontaneous)
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spontan" | "spontaneous" => Ok(TxType::Spontaneous),
            "cyclic" => Ok(TxType::Cyclic),
            "cyclic_spontan" | "cyclic_spontaneous" => Ok(TxType::CyclicSpontaneous),
            "baf" => Ok(TxType::Baf),
            _ => Err(Error::InvalidDefinition(format!(
                r#"unknown transmission type "{s}", expected spontan, cyclic, cyclic_spontan or BAF"#
            ))),
        }
    }
}

/// A CAN message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Message {
    pub name: String,
    /// Identifier, without any extended-frame flag bit.
    pub id: u32,
    /// Payload length in bytes (1..=8)
    pub len: u32,
    /// 29-bit identifier
    pub extended: bool,
    pub tx_type: TxType,
    /// Transmission period in milliseconds
    pub period_ms: Option<u32>,
    /// Repetitions of a BAF message once triggered
    pub baf_repeats: Option<u32>,
    pub description: Option<String>,
    pub(crate) publisher: Option<String>,
}

impl Message {
    pub fn new(name: impl Into<String>, id: u32, len: u32) -> Self {
        Self {
            name: name.into(),
            id,
            len,
            extended: false,
            tx_type: TxType::Spontaneous,
            period_ms: None,
            baf_repeats: None,
            description: None,
            publisher: None,
        }
    }

    /// Mark the identifier as 29-bit.
    pub fn extended(mut self) -> Self {
        self.extended = true;
        self
    }

    pub fn with_tx(mut self, tx_type: TxType, period_ms: Option<u32>) -> Self {
        self.tx_type = tx_type;
        self.period_ms = period_ms;
        self
    }

    pub fn with_baf_repeats(mut self, repeats: u32) -> Self {
        self.baf_repeats = Some(repeats);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Name of the publishing node.
    pub fn publisher(&self) -> Option<&str> {
        self.publisher.as_deref()
    }

    /// Payload length in bits.
    #[inline]
    pub fn bit_len(&self) -> u32 {
        self.len.saturating_mul(8)
    }

    /// The identifier as an `embedded_can` id.
    ///
    /// Returns `None` when the id does not fit the 11-bit (or 29-bit) space.
    #[cfg(feature = "can")]
    pub fn can_id(&self) -> Option<embedded_can::Id> {
        if self.extended {
            embedded_can::ExtendedId::new(self.id).map(embedded_can::Id::Extended)
        } else {
            u16::try_from(self.id)
                .ok()
                .and_then(embedded_can::StandardId::new)
                .map(embedded_can::Id::Standard)
        }
    }

    /// Checks done on a message before it joins a network.
    pub(crate) fn validate(&self) -> Result<()> {
        if !(1..=MAX_MESSAGE_LEN).contains(&self.len) {
            return Err(Error::Range {
                name: self.name.clone(),
                reason: format!("length {} is outside 1..={MAX_MESSAGE_LEN} bytes", self.len),
            });
        }
        let max_id = if self.extended {
            EXTENDED_ID_MAX
        } else {
            STANDARD_ID_MAX
        };
        if self.id > max_id {
            return Err(Error::Range {
                name: self.name.clone(),
                reason: format!("id {:#x} exceeds {max_id:#x}", self.id),
            });
        }
        if self.tx_type.is_periodic() && self.period_ms.is_none_or(|p| p == 0) {
            return Err(Error::InvalidDefinition(format!(
                r#"message "{}" of type {} needs a non-zero period"#,
                self.name, self.tx_type
            )));
        }
        if self.tx_type == TxType::Baf && self.baf_repeats.is_none() {
            return Err(Error::InvalidDefinition(format!(
                r#"BAF message "{}" needs a repetition count"#,
                self.name
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tx_type_names() {
        assert_eq!("spontan".parse::<TxType>().unwrap(), TxType::Spontaneous);
        assert_eq!("Cyclic".parse::<TxType>().unwrap(), TxType::Cyclic);
        assert_eq!("cyclic_spontan".parse::<TxType>().unwrap(), TxType::CyclicSpontaneous);
        assert_eq!("BAF".parse::<TxType>().unwrap(), TxType::Baf);
        assert!("burst".parse::<TxType>().is_err());
        assert_eq!(TxType::CyclicSpontaneous.to_string(), "cyclic_spontan");
    }

    #[test]
    fn validation() {
        assert!(Message::new("M", 0x100, 8).validate().is_ok());
        assert!(Message::new("M", 0x100, 0).validate().is_err());
        assert!(Message::new("M", 0x100, 9).validate().is_err());
        assert!(Message::new("M", 0x800, 8).validate().is_err());
        assert!(Message::new("M", 0x800, 8).extended().validate().is_ok());
        assert!(Message::new("M", 0x100, 8).with_tx(TxType::Cyclic, None).validate().is_err());
        let baf = Message::new("M", 0x100, 8).with_tx(TxType::Baf, Some(100));
        assert!(baf.validate().is_err());
        assert!(baf.with_baf_repeats(3).validate().is_ok());
    }

    #[cfg(feature = "can")]
    #[test]
    fn can_ids() {
        let standard = Message::new("M", 0x123, 8);
        assert!(matches!(standard.can_id(), Some(embedded_can::Id::Standard(_))));

        let extended = Message::new("M", 0x1234_5678, 8).extended();
        match extended.can_id() {
            Some(embedded_can::Id::Extended(id)) => assert_eq!(id.as_raw(), 0x1234_5678),
            other => panic!("unexpected id {other:?}"),
        }

        assert!(Message::new("M", 0x800, 8).can_id().is_none());
    }
}
