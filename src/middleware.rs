//! Descriptors for the entries generators add to UI5 configuration files.

use crate::error::{YamlError, YamlResult};
use crate::value::YamlValue;
use serde::{Deserialize, Serialize};

/// Serialize a descriptor into an owned YAML value, keeping field order.
pub(crate) fn to_yaml_value<T: Serialize>(descriptor: &T) -> YamlResult<YamlValue> {
    Ok(YamlValue::from(serde_json::to_value(descriptor)?))
}

/// Declares a named extension entry with an optional before/after hint, plus
/// the camelCase wire struct serde goes through. Setting both hints is
/// rejected on deserialization.
macro_rules! positioned_descriptor {
    (
        $(#[$position_meta:meta])*
        pub enum $position:ident;
        $(#[$meta:meta])*
        pub struct $name:ident via $raw:ident {
            noun: $noun:tt,
            before: $before:ident = $before_field:tt,
            after: $after:ident = $after_field:tt $(,)?
        }
    ) => {
        $(#[$position_meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub enum $position {
            #[doc = concat!("Run before the named ", $noun, " (`", $before_field, "`)")]
            Before(String),
            #[doc = concat!("Run after the named ", $noun, " (`", $after_field, "`)")]
            After(String),
        }

        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq)]
        pub struct $name {
            #[doc = concat!("Name the ", $noun, " is registered under")]
            pub name: String,
            /// Optional ordering hint
            pub position: Option<$position>,
            /// Extension specific settings; `null` leaves the field out
            pub configuration: serde_json::Value,
        }

        #[derive(Serialize, Deserialize)]
        struct $raw {
            name: String,
            #[serde(rename = $before_field, default, skip_serializing_if = "Option::is_none")]
            $before: Option<String>,
            #[serde(rename = $after_field, default, skip_serializing_if = "Option::is_none")]
            $after: Option<String>,
            #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
            configuration: serde_json::Value,
        }

        impl TryFrom<$raw> for $name {
            type Error = YamlError;

            fn try_from(raw: $raw) -> Result<Self, Self::Error> {
                let position = match (raw.$before, raw.$after) {
                    (Some(_), Some(_)) => {
                        return Err(YamlError::InvalidDescriptor(format!(
                            "{} '{}' sets both {} and {}",
                            $noun, raw.name, $before_field, $after_field
                        )))
                    }
                    (Some(target), None) => Some($position::Before(target)),
                    (None, Some(target)) => Some($position::After(target)),
                    (None, None) => None,
                };
                Ok(Self {
                    name: raw.name,
                    position,
                    configuration: raw.configuration,
                })
            }
        }

        impl From<$name> for $raw {
            fn from(descriptor: $name) -> Self {
                let ($before, $after) = match descriptor.position {
                    Some($position::Before(target)) => (Some(target), None),
                    Some($position::After(target)) => (None, Some(target)),
                    None => (None, None),
                };
                Self {
                    name: descriptor.name,
                    $before,
                    $after,
                    configuration: descriptor.configuration,
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                $raw::from(self.clone()).serialize(serializer)
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = $raw::deserialize(deserializer)?;
                Self::try_from(raw).map_err(serde::de::Error::custom)
            }
        }

        impl $name {
            #[doc = concat!("A ", $noun, " without ordering hint or configuration.")]
            pub fn new(name: impl Into<String>) -> Self {
                Self {
                    name: name.into(),
                    position: None,
                    configuration: serde_json::Value::Null,
                }
            }

            #[doc = concat!("Run after the named ", $noun, ".")]
            pub fn after(mut self, target: impl Into<String>) -> Self {
                self.position = Some($position::After(target.into()));
                self
            }

            #[doc = concat!("Run before the named ", $noun, ".")]
            pub fn before(mut self, target: impl Into<String>) -> Self {
                self.position = Some($position::Before(target.into()));
                self
            }

            /// Set the `configuration` block.
            pub fn with_configuration(mut self, configuration: serde_json::Value) -> Self {
                self.configuration = configuration;
                self
            }

            #[doc = concat!("The ", $noun, " as a YAML mapping, fields in UI5 order.")]
            pub fn to_value(&self) -> YamlResult<YamlValue> {
                to_yaml_value(self)
            }
        }
    };
}

positioned_descriptor! {
    /// Where a custom middleware runs relative to another middleware.
    pub enum MiddlewarePosition;

    /// An entry of `server.customMiddleware`.
    ///
    /// Serializes with the UI5 field names:
    ///
    /// ```yaml
    /// - name: fiori-tools-proxy
    ///   afterMiddleware: compression
    ///   configuration:
    ///     ignoreCertError: false
    /// ```
    pub struct MiddlewareDescriptor via RawMiddleware {
        noun: "middleware",
        before: before_middleware = "beforeMiddleware",
        after: after_middleware = "afterMiddleware",
    }
}

positioned_descriptor! {
    /// Where a custom task runs relative to another build task.
    pub enum TaskPosition;

    /// An entry of `builder.customTasks`.
    pub struct CustomTask via RawTask {
        noun: "task",
        before: before_task = "beforeTask",
        after: after_task = "afterTask",
    }
}

/// An entry of `framework.libraries`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Library {
    /// Library name, e.g. `sap.m`
    pub name: String,
    /// Whether the library may be missing at runtime
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional: Option<bool>,
}

impl Library {
    /// A required library.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            optional: None,
        }
    }

    /// The library as a YAML mapping.
    pub fn to_value(&self) -> YamlResult<YamlValue> {
        to_yaml_value(self)
    }
}

impl From<&str> for Library {
    fn from(name: &str) -> Self {
        Library::new(name)
    }
}

impl From<String> for Library {
    fn from(name: String) -> Self {
        Library::new(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_serializes_with_ui5_field_names() {
        let descriptor = MiddlewareDescriptor::new("fiori-tools-appreload")
            .after("compression")
            .with_configuration(json!({"port": 35729, "path": "webapp"}));
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "fiori-tools-appreload",
                "afterMiddleware": "compression",
                "configuration": {"port": 35729, "path": "webapp"}
            })
        );
    }

    #[test]
    fn test_field_order() {
        let descriptor = MiddlewareDescriptor::new("proxy")
            .before("csp")
            .with_configuration(json!({"b": 1, "a": 2}));
        let text = descriptor.to_value().unwrap().to_yaml_string(0);
        assert_eq!(text, "name: proxy\nbeforeMiddleware: csp\nconfiguration:\n  b: 1\n  a: 2");
    }

    #[test]
    fn test_null_configuration_is_omitted() {
        let value = serde_json::to_value(MiddlewareDescriptor::new("x")).unwrap();
        assert_eq!(value, json!({"name": "x"}));
    }

    #[test]
    fn test_deserialize() {
        let descriptor: MiddlewareDescriptor = serde_json::from_value(json!({
            "name": "fiori-tools-proxy",
            "beforeMiddleware": "csp"
        }))
        .unwrap();
        assert_eq!(
            descriptor.position,
            Some(MiddlewarePosition::Before("csp".to_string()))
        );
        assert!(descriptor.configuration.is_null());
    }

    #[test]
    fn test_both_hints_rejected() {
        let err = serde_json::from_value::<MiddlewareDescriptor>(json!({
            "name": "x",
            "beforeMiddleware": "a",
            "afterMiddleware": "b"
        }))
        .unwrap_err();
        assert!(err
            .to_string()
            .contains("middleware 'x' sets both beforeMiddleware and afterMiddleware"));
    }

    #[test]
    fn test_custom_task() {
        let task = CustomTask::new("ui5-task-zipper")
            .after("generateVersionInfo")
            .with_configuration(json!({"archiveName": "app"}));
        assert_eq!(
            serde_json::to_value(&task).unwrap(),
            json!({
                "name": "ui5-task-zipper",
                "afterTask": "generateVersionInfo",
                "configuration": {"archiveName": "app"}
            })
        );

        let err = serde_json::from_value::<CustomTask>(json!({
            "name": "t",
            "beforeTask": "a",
            "afterTask": "b"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("beforeTask and afterTask"));
    }

    #[test]
    fn test_task_uses_task_field_names() {
        let task = CustomTask::new("ui5-tooling-transpile-task").before("minify");
        let text = task.to_value().unwrap().to_yaml_string(0);
        assert_eq!(text, "name: ui5-tooling-transpile-task\nbeforeTask: minify");

        let back: CustomTask = serde_json::from_value(serde_json::to_value(&task).unwrap()).unwrap();
        assert_eq!(back, task);

        let err = serde_json::from_value::<CustomTask>(json!({
            "name": "t",
            "beforeTask": "a",
            "afterTask": "b"
        }))
        .unwrap_err();
        assert!(err.to_string().contains("task 't' sets both beforeTask and afterTask"));
    }

    #[test]
    fn test_library() {
        assert_eq!(
            serde_json::to_value(Library::from("sap.m")).unwrap(),
            json!({"name": "sap.m"})
        );
        let library: Library = serde_json::from_value(json!({"name": "sap.ui.comp", "optional": true})).unwrap();
        assert_eq!(library.optional, Some(true));
    }
}
