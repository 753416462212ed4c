//! Configuration for the link orchestrator

use serde::Deserialize;

/// Parameter names that never become child fields.
pub const DEFAULT_RESERVED_PARAMS: [&str; 5] = ["limit", "skip", "sort", "id", "parentid"];

/// Configuration for the link orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Request parameters stripped from value payloads
    pub reserved_params: Vec<String>,
    /// Subscribe the originating channel to the parent before publishing
    pub subscribe_on_link: bool,
    /// Publish add events at all
    pub notify: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            reserved_params: DEFAULT_RESERVED_PARAMS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            subscribe_on_link: true,
            notify: true,
        }
    }
}

impl LinkConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from JSON; missing keys take their defaults.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn with_reserved_param(mut self, name: impl Into<String>) -> Self {
        let name = name.into();
        if !self.reserved_params.contains(&name) {
            self.reserved_params.push(name);
        }
        self
    }

    pub fn with_subscribe_on_link(mut self, enabled: bool) -> Self {
        self.subscribe_on_link = enabled;
        self
    }

    pub fn with_notify(mut self, enabled: bool) -> Self {
        self.notify = enabled;
        self
    }

    /// No subscriptions, no events.
    pub fn quiet() -> Self {
        Self {
            subscribe_on_link: false,
            notify: false,
            ..Self::default()
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved_params.iter().any(|p| p == name)
    }
}
