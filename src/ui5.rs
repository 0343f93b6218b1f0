//! Typed editing of UI5 tooling configuration files (`ui5.yaml`,
//! `ui5-local.yaml`, `ui5-mock.yaml`).

use crate::error::{YamlError, YamlResult};
use crate::middleware::{CustomTask, Library, MiddlewareDescriptor};
use crate::mutation::NodeComment;
use crate::value::YamlValue;
use crate::yaml::{Yaml, YamlNode};
use crate::Indentation;
use serde::de::DeserializeOwned;
use std::fmt;
use std::str::FromStr;

/// The list sections of a UI5 configuration that generators append to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSection {
    /// `server.customMiddleware`
    CustomMiddleware,
    /// `framework.libraries`
    Libraries,
    /// `builder.customTasks`
    CustomTasks,
}

impl ConfigSection {
    /// The dotted path of the section inside the document.
    pub fn path(self) -> &'static str {
        match self {
            ConfigSection::CustomMiddleware => "server.customMiddleware",
            ConfigSection::Libraries => "framework.libraries",
            ConfigSection::CustomTasks => "builder.customTasks",
        }
    }
}

impl fmt::Display for ConfigSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// A UI5 configuration document.
///
/// Appending never removes or reorders existing entries and does not skip
/// entries that are already present: adding the same library twice lists it
/// twice.
#[derive(Debug, Clone)]
pub struct Ui5Config {
    yaml: Yaml,
    indentation: Indentation,
}

impl Default for Ui5Config {
    fn default() -> Self {
        Self::from_yaml(Yaml::new())
    }
}

impl Ui5Config {
    /// Parse configuration text.
    pub fn parse(text: &str) -> YamlResult<Self> {
        Ok(Self::from_yaml(text.parse()?))
    }

    /// Wrap an already parsed document.
    pub fn from_yaml(yaml: Yaml) -> Self {
        Self {
            yaml,
            indentation: Indentation::default(),
        }
    }

    /// Set the indentation for lines added by later edits.
    pub fn with_indentation(mut self, indentation: Indentation) -> Self {
        self.indentation = indentation;
        self
    }

    /// The underlying document.
    pub fn yaml(&self) -> &Yaml {
        &self.yaml
    }

    /// Unwrap the underlying document.
    pub fn into_yaml(self) -> Yaml {
        self.yaml
    }

    /// Append `values` to `section` in order, creating the section when
    /// missing. `comments` apply to each appended value. Either all values
    /// are appended or, on error, none.
    pub fn append(
        &mut self,
        section: ConfigSection,
        values: &[YamlValue],
        comments: &[NodeComment],
    ) -> YamlResult<()> {
        let mut staged = self.yaml.snapshot();
        for value in values {
            staged.append_to_with(section.path(), value, comments, self.indentation)?;
        }
        tracing::debug!(section = %section, count = values.len(), "appended entries");
        self.yaml = staged;
        Ok(())
    }

    /// Register custom middleware under `server.customMiddleware`.
    pub fn add_custom_middleware(
        &mut self,
        middlewares: &[MiddlewareDescriptor],
        comments: &[NodeComment],
    ) -> YamlResult<()> {
        let values = middlewares
            .iter()
            .map(MiddlewareDescriptor::to_value)
            .collect::<YamlResult<Vec<_>>>()?;
        self.append(ConfigSection::CustomMiddleware, &values, comments)
    }

    /// Add `{name: ...}` entries to `framework.libraries`.
    pub fn add_libraries<I, L>(&mut self, libraries: I) -> YamlResult<()>
    where
        I: IntoIterator<Item = L>,
        L: Into<Library>,
    {
        let values = libraries
            .into_iter()
            .map(|library| library.into().to_value())
            .collect::<YamlResult<Vec<_>>>()?;
        self.append(ConfigSection::Libraries, &values, &[])
    }

    /// Register custom build tasks under `builder.customTasks`.
    pub fn add_custom_tasks(&mut self, tasks: &[CustomTask], comments: &[NodeComment]) -> YamlResult<()> {
        let values = tasks
            .iter()
            .map(CustomTask::to_value)
            .collect::<YamlResult<Vec<_>>>()?;
        self.append(ConfigSection::CustomTasks, &values, comments)
    }

    fn section_items<T: DeserializeOwned>(&self, section: ConfigSection) -> YamlResult<Vec<T>> {
        let items = match self.yaml.get(section.path()) {
            None => return Ok(Vec::new()),
            Some(YamlNode::Sequence(sequence)) => sequence.items().collect::<Vec<_>>(),
            Some(_) => {
                return Err(YamlError::path_resolution(
                    section.path(),
                    "the section is not a sequence",
                ))
            }
        };
        items
            .iter()
            .map(|item| Ok(serde_json::from_value(item.to_value().to_json())?))
            .collect()
    }

    /// The entries of `server.customMiddleware`.
    pub fn custom_middleware(&self) -> YamlResult<Vec<MiddlewareDescriptor>> {
        self.section_items(ConfigSection::CustomMiddleware)
    }

    /// The first custom middleware called `name`.
    pub fn find_custom_middleware(&self, name: &str) -> YamlResult<Option<MiddlewareDescriptor>> {
        Ok(self
            .custom_middleware()?
            .into_iter()
            .find(|middleware| middleware.name == name))
    }

    /// The entries of `builder.customTasks`.
    pub fn custom_tasks(&self) -> YamlResult<Vec<CustomTask>> {
        self.section_items(ConfigSection::CustomTasks)
    }

    /// The entries of `framework.libraries`.
    pub fn libraries(&self) -> YamlResult<Vec<Library>> {
        self.section_items(ConfigSection::Libraries)
    }
}

impl FromStr for Ui5Config {
    type Err = YamlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Ui5Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.yaml)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::MiddlewarePosition;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const UI5_YAML: &str = "\
# yaml-language-server: $schema=https://sap.github.io/ui5-tooling/schema/ui5.yaml.json

specVersion: \"3.1\"
metadata:
  name: com.example.app
type: application
server:
  customMiddleware:
    - name: fiori-tools-proxy
      afterMiddleware: compression
      configuration:
        ignoreCertError: false # If set to true, certificate errors will be ignored
";

    fn appreload() -> MiddlewareDescriptor {
        MiddlewareDescriptor::new("fiori-tools-appreload")
            .after("compression")
            .with_configuration(json!({"port": 35729, "path": "webapp"}))
    }

    #[test]
    fn test_section_paths() {
        assert_eq!(ConfigSection::CustomMiddleware.path(), "server.customMiddleware");
        assert_eq!(ConfigSection::Libraries.to_string(), "framework.libraries");
        assert_eq!(ConfigSection::CustomTasks.path(), "builder.customTasks");
    }

    #[test]
    fn test_add_middleware_to_empty_file() {
        let mut config = Ui5Config::parse("#empty file").unwrap();
        config.add_custom_middleware(&[appreload()], &[]).unwrap();
        assert!(config.to_string().contains(
            "server:\n  customMiddleware:\n    - name: fiori-tools-appreload\n      \
             afterMiddleware: compression\n      configuration:\n        port: 35729\n        \
             path: webapp"
        ));
    }

    #[test]
    fn test_add_middleware_keeps_existing_text() {
        let mut config = Ui5Config::parse(UI5_YAML).unwrap();
        config.add_custom_middleware(&[appreload()], &[]).unwrap();
        let text = config.to_string();
        assert!(text.starts_with(UI5_YAML.trim_end()));
        assert_eq!(
            &text[UI5_YAML.trim_end().len()..],
            "\n    - name: fiori-tools-appreload\n      afterMiddleware: compression\n      \
             configuration:\n        port: 35729\n        path: webapp\n"
        );
    }

    #[test]
    fn test_middleware_order_is_kept() {
        let mut config = Ui5Config::parse(UI5_YAML).unwrap();
        let added = [
            MiddlewareDescriptor::new("a"),
            MiddlewareDescriptor::new("b").before("a"),
            MiddlewareDescriptor::new("c"),
        ];
        config.add_custom_middleware(&added, &[]).unwrap();
        let names: Vec<String> = config
            .custom_middleware()
            .unwrap()
            .into_iter()
            .map(|middleware| middleware.name)
            .collect();
        assert_eq!(names, vec!["fiori-tools-proxy", "a", "b", "c"]);
    }

    #[test]
    fn test_comments_apply_to_every_descriptor() {
        let mut config = Ui5Config::default();
        let comments = [NodeComment::new("", "added by generator")];
        config
            .add_custom_middleware(&[MiddlewareDescriptor::new("a"), MiddlewareDescriptor::new("b")], &comments)
            .unwrap();
        assert_eq!(
            config.to_string(),
            "server:\n  customMiddleware:\n    # added by generator\n    - name: a\n    \
             # added by generator\n    - name: b\n"
        );
    }

    #[test]
    fn test_failed_append_changes_nothing() {
        let mut config = Ui5Config::parse(UI5_YAML).unwrap();
        let comments = [NodeComment::new("configuration.port", "only on appreload")];
        let err = config
            .add_custom_middleware(&[appreload(), MiddlewareDescriptor::new("plain")], &comments)
            .unwrap_err();
        assert!(matches!(err, YamlError::PathResolution { .. }));
        assert_eq!(config.to_string(), UI5_YAML);
    }

    #[test]
    fn test_libraries_are_not_deduplicated() {
        let mut config = Ui5Config::default();
        config.add_libraries(["lib-a", "lib-a"]).unwrap();
        assert_eq!(
            config.to_string(),
            "framework:\n  libraries:\n    - name: lib-a\n    - name: lib-a\n"
        );
        assert_eq!(
            config.libraries().unwrap(),
            vec![Library::new("lib-a"), Library::new("lib-a")]
        );
    }

    #[test]
    fn test_add_custom_tasks() {
        let mut config = Ui5Config::parse("specVersion: '3.0'\nbuilder:\n  resources:\n    excludes: []\n").unwrap();
        config
            .add_custom_tasks(&[CustomTask::new("deploy-to-abap").after("generateCachebusterInfo")], &[])
            .unwrap();
        assert_eq!(
            config.to_string(),
            "specVersion: '3.0'\nbuilder:\n  resources:\n    excludes: []\n  customTasks:\n    \
             - name: deploy-to-abap\n      afterTask: generateCachebusterInfo\n"
        );
        assert_eq!(config.custom_tasks().unwrap().len(), 1);
    }

    #[test]
    fn test_find_custom_middleware() {
        let config = Ui5Config::parse(UI5_YAML).unwrap();
        let proxy = config.find_custom_middleware("fiori-tools-proxy").unwrap().unwrap();
        assert_eq!(
            proxy.position,
            Some(MiddlewarePosition::After("compression".to_string()))
        );
        assert_eq!(proxy.configuration, json!({"ignoreCertError": false}));
        assert!(config.find_custom_middleware("missing").unwrap().is_none());
    }

    #[test]
    fn test_section_must_be_a_sequence() {
        let config = Ui5Config::parse("framework:\n  libraries: sap.m\n").unwrap();
        assert!(matches!(
            config.libraries().unwrap_err(),
            YamlError::PathResolution { .. }
        ));
    }

    #[test]
    fn test_detected_indentation() {
        let mut config = Ui5Config::parse("server:\n    port: 8080\n")
            .unwrap()
            .with_indentation(Indentation::Detect);
        config.add_custom_middleware(&[MiddlewareDescriptor::new("x")], &[]).unwrap();
        assert_eq!(
            config.to_string(),
            "server:\n    port: 8080\n    customMiddleware:\n        - name: x\n"
        );
    }
}
