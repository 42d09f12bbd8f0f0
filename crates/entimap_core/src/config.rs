//! Mapper configuration.

use entimap_value::Namespace;
use serde::Deserialize;

/// Configuration for an [`crate::EntityMapper`].
///
/// Can be built in code or loaded from any serde format; missing keys take
/// their default values.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct MapperConfig {
    /// Project stamped on generated keys when the namespace names none.
    pub default_project: Option<String>,

    /// Whether a map entry that fails to deserialize is logged and dropped
    /// instead of failing the whole map.
    pub skip_invalid_map_entries: bool,

    /// Whether document properties without a matching field are ignored.
    /// When `false` they are reported as [`crate::MapperError::UnmappedProperty`].
    pub ignore_unknown_properties: bool,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            default_project: None,
            skip_invalid_map_entries: true,
            ignore_unknown_properties: true,
        }
    }
}

impl MapperConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the default project.
    #[must_use]
    pub fn default_project(mut self, project: impl Into<String>) -> Self {
        self.default_project = Some(project.into());
        self
    }

    /// Sets whether invalid map entries are skipped.
    #[must_use]
    pub const fn skip_invalid_map_entries(mut self, value: bool) -> Self {
        self.skip_invalid_map_entries = value;
        self
    }

    /// Returns `namespace` with the default project filled in when it names none.
    pub fn scope(&self, namespace: &Namespace) -> Namespace {
        let mut scoped = namespace.clone();
        if scoped.project.is_none() {
            scoped.project.clone_from(&self.default_project);
        }
        scoped
    }

    /// Sets whether unknown document properties are ignored.
    #[must_use]
    pub const fn ignore_unknown_properties(mut self, value: bool) -> Self {
        self.ignore_unknown_properties = value;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = MapperConfig::default();
        assert!(config.default_project.is_none());
        assert!(config.skip_invalid_map_entries);
        assert!(config.ignore_unknown_properties);
    }

    #[test]
    fn scope_applies_default_project() {
        let config = MapperConfig::new().default_project("acme");
        assert_eq!(config.scope(&Namespace::new("ns")).project.as_deref(), Some("acme"));
        assert_eq!(
            config
                .scope(&Namespace::new("ns").with_project("own"))
                .project
                .as_deref(),
            Some("own")
        );
        assert_eq!(MapperConfig::default().scope(&Namespace::new("ns")).project, None);
    }

    #[test]
    fn builder_pattern() {
        let config = MapperConfig::new()
            .default_project("acme")
            .skip_invalid_map_entries(false)
            .ignore_unknown_properties(false);

        assert_eq!(config.default_project.as_deref(), Some("acme"));
        assert!(!config.skip_invalid_map_entries);
        assert!(!config.ignore_unknown_properties);
    }

    #[test]
    fn loads_partial_json() {
        let config: MapperConfig =
            serde_json::from_str(r#"{ "default_project": "acme" }"#).unwrap();
        assert_eq!(config.default_project.as_deref(), Some("acme"));
        assert!(config.skip_invalid_map_entries);
    }
}
