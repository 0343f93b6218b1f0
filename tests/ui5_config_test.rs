use pretty_assertions::assert_eq;
use serde_json::json;
use ui5_yaml_edit::{
    ConfigSection, CustomTask, Library, MiddlewareDescriptor, MiddlewarePosition, NodeComment,
    TaskPosition, Ui5Config, YamlError, YamlValue,
};

const UI5_MOCK_YAML: &str = "\
# yaml-language-server: $schema=https://sap.github.io/ui5-tooling/schema/ui5.yaml.json

specVersion: '4.0'
metadata:
  name: com.example.orders
type: application
server:
  customMiddleware:
  - name: fiori-tools-proxy
    afterMiddleware: compression
    configuration:
      ignoreCertError: false # If set to true, certificate errors will be ignored. E.g. self-signed certificates will be accepted
      ui5:
        path:
        - /resources
        - /test-resources
        url: https://ui5.sap.com
  - name: fiori-tools-appreload
    afterMiddleware: compression
    configuration:
      port: 35729
      path: webapp
      delay: 300
";

fn mockserver() -> MiddlewareDescriptor {
    MiddlewareDescriptor::new("sap-fe-mockserver")
        .before("csp")
        .with_configuration(json!({
            "mountPath": "/",
            "services": [{
                "urlPath": "/sap/opu/odata4/orders",
                "metadataPath": "./webapp/localService/metadata.xml",
                "generateMockData": true
            }],
            "annotations": []
        }))
}

#[test]
fn test_reload_middleware_in_empty_file() {
    let mut config = Ui5Config::parse("#empty file").unwrap();
    let appreload = MiddlewareDescriptor::new("fiori-tools-appreload")
        .after("compression")
        .with_configuration(json!({"port": 35729, "path": "webapp"}));
    config.add_custom_middleware(&[appreload], &[]).unwrap();

    assert!(config.to_string().contains(
        "server:\n  customMiddleware:\n    - name: fiori-tools-appreload\n      \
         afterMiddleware: compression\n      configuration:\n        port: 35729\n        \
         path: webapp"
    ));
}

#[test]
fn test_duplicate_libraries_are_kept() {
    let mut config = Ui5Config::default();
    config.add_libraries(["lib-a", "lib-a"]).unwrap();

    let libraries = config.libraries().unwrap();
    assert_eq!(libraries.len(), 2);
    assert!(libraries.iter().all(|library| library.name == "lib-a"));
}

#[test]
fn test_mockserver_appended_at_file_indentation() {
    let mut config = Ui5Config::parse(UI5_MOCK_YAML).unwrap();
    config.add_custom_middleware(&[mockserver()], &[]).unwrap();

    let expected = format!(
        "{}{}",
        UI5_MOCK_YAML,
        "  - name: sap-fe-mockserver
    beforeMiddleware: csp
    configuration:
      mountPath: /
      services:
        - urlPath: /sap/opu/odata4/orders
          metadataPath: ./webapp/localService/metadata.xml
          generateMockData: true
      annotations: []
"
    );
    assert_eq!(config.to_string(), expected);
}

#[test]
fn test_read_back_middleware() {
    let mut config = Ui5Config::parse(UI5_MOCK_YAML).unwrap();
    config.add_custom_middleware(&[mockserver()], &[]).unwrap();

    let middleware = config.custom_middleware().unwrap();
    let names: Vec<&str> = middleware.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["fiori-tools-proxy", "fiori-tools-appreload", "sap-fe-mockserver"]
    );
    assert_eq!(middleware[2], mockserver());
    assert_eq!(
        middleware[1].position,
        Some(MiddlewarePosition::After("compression".to_string()))
    );
    assert_eq!(
        middleware[1].configuration,
        json!({"port": 35729, "path": "webapp", "delay": 300})
    );
}

#[test]
fn test_comments_on_new_middleware() {
    let mut config = Ui5Config::default();
    let comments = [
        NodeComment::new("configuration.services[0].urlPath", "OData service"),
        NodeComment::new("configuration.annotations", "no local annotations"),
    ];
    config.add_custom_middleware(&[mockserver()], &comments).unwrap();

    assert_eq!(
        config.to_string(),
        "server:
  customMiddleware:
    - name: sap-fe-mockserver
      beforeMiddleware: csp
      configuration:
        mountPath: /
        services:
          # OData service
          - urlPath: /sap/opu/odata4/orders
            metadataPath: ./webapp/localService/metadata.xml
            generateMockData: true
        # no local annotations
        annotations: []
"
    );
}

#[test]
fn test_every_section_can_be_added() {
    let mut config = Ui5Config::parse("specVersion: '3.0'\n").unwrap();
    config
        .add_custom_tasks(
            &[CustomTask::new("ui5-tooling-transpile-task").after("replaceVersion")],
            &[],
        )
        .unwrap();
    config
        .add_libraries([Library {
            name: "sap.ushell".to_string(),
            optional: Some(true),
        }])
        .unwrap();
    config
        .add_custom_middleware(&[MiddlewareDescriptor::new("fiori-tools-preview")], &[])
        .unwrap();

    assert_eq!(
        config.to_string(),
        "specVersion: '3.0'
builder:
  customTasks:
    - name: ui5-tooling-transpile-task
      afterTask: replaceVersion
framework:
  libraries:
    - name: sap.ushell
      optional: true
server:
  customMiddleware:
    - name: fiori-tools-preview
"
    );

    let tasks = config.custom_tasks().unwrap();
    assert_eq!(
        tasks[0].position,
        Some(TaskPosition::After("replaceVersion".to_string()))
    );
    assert_eq!(config.libraries().unwrap()[0].optional, Some(true));
}

#[test]
fn test_generic_append() {
    let mut config = Ui5Config::default();
    config
        .append(
            ConfigSection::Libraries,
            &[
                YamlValue::from(json!({"name": "sap.m"})),
                YamlValue::from(json!({"name": "sap.f"})),
            ],
            &[],
        )
        .unwrap();
    let names: Vec<String> = config
        .libraries()
        .unwrap()
        .into_iter()
        .map(|library| library.name)
        .collect();
    assert_eq!(names, vec!["sap.m", "sap.f"]);
}

#[test]
fn test_section_colliding_with_scalar() {
    let input = "server: localhost\n";
    let mut config = Ui5Config::parse(input).unwrap();
    let err = config
        .add_custom_middleware(&[MiddlewareDescriptor::new("x")], &[])
        .unwrap_err();
    assert!(matches!(err, YamlError::PathResolution { .. }));
    assert_eq!(config.to_string(), input);
}

#[test]
fn test_descriptor_from_json() {
    let descriptor: MiddlewareDescriptor = serde_json::from_value(json!({
        "name": "fiori-tools-proxy",
        "beforeMiddleware": "csp",
        "configuration": {"backend": [{"path": "/sap", "url": "http://localhost:4004"}]}
    }))
    .unwrap();
    assert_eq!(
        descriptor.position,
        Some(MiddlewarePosition::Before("csp".to_string()))
    );

    let both = serde_json::from_value::<MiddlewareDescriptor>(json!({
        "name": "x",
        "beforeMiddleware": "a",
        "afterMiddleware": "b"
    }));
    assert!(both.is_err());
}

#[test]
fn test_clones_are_independent() {
    let original = Ui5Config::parse("specVersion: '3.0'\n").unwrap();
    let mut copy = original.clone();
    copy.add_libraries(["sap.m"]).unwrap();

    assert_eq!(original.to_string(), "specVersion: '3.0'\n");
    assert_eq!(
        copy.to_string(),
        "specVersion: '3.0'\nframework:\n  libraries:\n    - name: sap.m\n"
    );
}
