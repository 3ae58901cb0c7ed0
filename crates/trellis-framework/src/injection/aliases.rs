//! Well-known type-name to registry-identifier aliases.

use std::collections::HashMap;

/// Built-in aliases: commonly injected interface names and the registry
/// identifiers that provide them.
const BUILTIN: &[(&str, &str)] = &[
    ("ConsoleAdapterInterface", "ConsoleAdapter"),
    ("FilterPluginManager", "FilterManager"),
    ("HydratorPluginManager", "HydratorManager"),
    ("InputFilterPluginManager", "InputFilterManager"),
    ("LogFilterPluginManager", "LogFilterManager"),
    ("LogFormatterPluginManager", "LogFormatterManager"),
    ("LogProcessorPluginManager", "LogProcessorManager"),
    ("LogWriterPluginManager", "LogWriterManager"),
    ("SerializerAdapterPluginManager", "SerializerAdapterManager"),
    ("ValidatorPluginManager", "ValidatorManager"),
    ("PluginManager", "ControllerPluginManager"),
    ("Router", "Router"),
    ("RouteStack", "Router"),
];

/// Static mapping consulted when a parameter's type is not itself a registry
/// identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WellKnownAliases {
    aliases: HashMap<String, String>,
}

impl Default for WellKnownAliases {
    fn default() -> Self {
        Self::builtin()
    }
}

impl WellKnownAliases {
    /// The built-in table.
    pub fn builtin() -> Self {
        Self {
            aliases: BUILTIN
                .iter()
                .map(|(from, to)| (from.to_string(), to.to_string()))
                .collect(),
        }
    }

    /// An empty table.
    pub fn empty() -> Self {
        Self {
            aliases: HashMap::new(),
        }
    }

    /// Adds or overrides an alias.
    pub fn insert(&mut self, type_name: impl Into<String>, identifier: impl Into<String>) {
        self.aliases.insert(type_name.into(), identifier.into());
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, type_name: impl Into<String>, identifier: impl Into<String>) -> Self {
        self.insert(type_name, identifier);
        self
    }

    /// Returns the identifier aliased to `type_name`.
    pub fn get(&self, type_name: &str) -> Option<&str> {
        self.aliases.get(type_name).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for WellKnownAliases {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (from, to) in iter {
            self.insert(from, to);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_entries() {
        let aliases = WellKnownAliases::builtin();
        assert_eq!(aliases.get("ValidatorPluginManager"), Some("ValidatorManager"));
        assert_eq!(aliases.get("ConsoleAdapterInterface"), Some("ConsoleAdapter"));
        assert_eq!(aliases.get("SampleInterface"), None);
    }

    #[test]
    fn test_extend_overrides() {
        let mut aliases = WellKnownAliases::empty();
        aliases.extend([("Mailer", "mail.transport")]);
        aliases.extend([("Mailer", "mail.smtp")]);
        assert_eq!(aliases.get("Mailer"), Some("mail.smtp"));
        assert_eq!(aliases.len(), 1);
    }
}
