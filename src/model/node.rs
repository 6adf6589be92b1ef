use std::collections::BTreeMap;

/// A bus participant.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub name: String,
    pub description: Option<String>,
    /// Subscribed message name to reception timeout in milliseconds.
    pub(crate) subscriptions: BTreeMap<String, Option<u32>>,
}

impl Node {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            subscriptions: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Subscribed messages with their timeouts, by message name.
    pub fn subscriptions(&self) -> impl Iterator<Item = (&str, Option<u32>)> {
        self.subscriptions.iter().map(|(m, t)| (m.as_str(), *t))
    }

    pub fn subscribes_to(&self, message: &str) -> bool {
        self.subscriptions.contains_key(message)
    }

    /// Timeout of a subscription; `None` when not subscribed.
    pub fn timeout_of(&self, message: &str) -> Option<Option<u32>> {
        self.subscriptions.get(message).copied()
    }
}
