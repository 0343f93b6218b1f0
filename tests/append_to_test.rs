use pretty_assertions::assert_eq;
use serde_json::json;
use std::str::FromStr;
use ui5_yaml_edit::{Indentation, NodeComment, Yaml, YamlError, YamlValue};

fn proxy() -> YamlValue {
    YamlValue::from(json!({
        "name": "fiori-tools-proxy",
        "afterMiddleware": "compression",
        "configuration": {
            "ignoreCertError": false,
            "ui5": {
                "path": ["/resources", "/test-resources"],
                "url": "https://ui5.sap.com"
            }
        }
    }))
}

#[test]
fn test_nested_collections_are_written_in_block_style() {
    let mut yaml = Yaml::from_str("specVersion: \"3.1\"\n").unwrap();
    yaml.append_to("server.customMiddleware", &proxy(), &[]).unwrap();
    assert_eq!(
        yaml.to_string(),
        r#"specVersion: "3.1"
server:
  customMiddleware:
    - name: fiori-tools-proxy
      afterMiddleware: compression
      configuration:
        ignoreCertError: false
        ui5:
          path:
            - /resources
            - /test-resources
          url: https://ui5.sap.com
"#
    );
}

#[test]
fn test_comments_before_nested_nodes() {
    let mut yaml = Yaml::from_str("#empty file").unwrap();
    let comments = [
        NodeComment::new(
            "configuration.ignoreCertError",
            "If set to true, certificate errors will be ignored",
        ),
        NodeComment::new("configuration.ui5.path[1]", "test resources"),
    ];
    yaml.append_to("server.customMiddleware", &proxy(), &comments).unwrap();
    let text = yaml.to_string();
    assert!(text.contains(
        "      configuration:\n        \
         # If set to true, certificate errors will be ignored\n        \
         ignoreCertError: false\n"
    ));
    assert!(text.contains(
        "            - /resources\n            # test resources\n            - /test-resources\n"
    ));
}

#[test]
fn test_existing_text_is_untouched() {
    let input = "\
# global comment
server:
  # the dev proxy
  customMiddleware:
    - name: a # first one

    # keep this block

framework:
  name: SAPUI5
";
    let mut yaml = Yaml::from_str(input).unwrap();
    yaml.append_to(
        "server.customMiddleware",
        &YamlValue::from(json!({"name": "b"})),
        &[],
    )
    .unwrap();
    assert_eq!(
        yaml.to_string(),
        "\
# global comment
server:
  # the dev proxy
  customMiddleware:
    - name: a # first one
    - name: b

    # keep this block

framework:
  name: SAPUI5
"
    );
}

#[test]
fn test_repeated_appends_keep_order() {
    let mut yaml = Yaml::new();
    for name in ["one", "two", "three"] {
        yaml.append_to("list", &YamlValue::from(name), &[]).unwrap();
    }
    assert_eq!(yaml.to_string(), "list:\n  - one\n  - two\n  - three\n");

    let sequence = yaml.get("list").unwrap();
    let items: Vec<String> = sequence
        .as_sequence()
        .unwrap()
        .items()
        .map(|item| item.to_string())
        .collect();
    assert_eq!(items, vec!["one", "two", "three"]);
}

#[test]
fn test_strings_that_need_quotes() {
    let mut yaml = Yaml::new();
    let value = YamlValue::from(json!({
        "version": "1.0",
        "flag": "true",
        "empty": "",
        "note": "a: b"
    }));
    yaml.append_to("items", &value, &[]).unwrap();
    assert_eq!(
        yaml.to_string(),
        "items:\n  - version: '1.0'\n    flag: 'true'\n    empty: ''\n    note: 'a: b'\n"
    );
    let item = yaml.get("items[0]").unwrap();
    assert_eq!(item.to_value(), value);
}

#[test]
fn test_fixed_indentation_step() {
    let mut yaml = Yaml::from_str("a: 1\n").unwrap();
    yaml.append_to_with(
        "server.customMiddleware",
        &YamlValue::from(json!({"name": "x", "configuration": {"port": 1}})),
        &[],
        Indentation::Spaces(4),
    )
    .unwrap();
    assert_eq!(
        yaml.to_string(),
        "a: 1\nserver:\n    customMiddleware:\n        - name: x\n          configuration:\n              port: 1\n"
    );
}

#[test]
fn test_path_through_scalar_fails() {
    let input = "server:\n  customMiddleware: fiori-tools-proxy\n";
    let mut yaml = Yaml::from_str(input).unwrap();
    let err = yaml
        .append_to("server.customMiddleware", &YamlValue::from("x"), &[])
        .unwrap_err();
    assert!(matches!(err, YamlError::PathResolution { .. }));
    assert_eq!(yaml.to_string(), input);
}

#[test]
fn test_invalid_path_syntax() {
    let mut yaml = Yaml::new();
    for path in ["a..b", "a[", "a[x]"] {
        let err = yaml.append_to(path, &YamlValue::from("x"), &[]).unwrap_err();
        assert!(
            matches!(err, YamlError::PathResolution { .. }),
            "{} should be rejected",
            path
        );
    }
    assert_eq!(yaml.to_string(), "");
}

#[test]
fn test_comment_path_must_exist() {
    let mut yaml = Yaml::new();
    let err = yaml
        .append_to(
            "libs",
            &YamlValue::from(json!({"name": "sap.m"})),
            &[NodeComment::new("optional", "not set")],
        )
        .unwrap_err();
    match err {
        YamlError::PathResolution { path, .. } => assert_eq!(path, "optional"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(yaml.to_string(), "");
}

#[test]
fn test_append_to_later_document() {
    let yaml = Yaml::from_str("a: 1\n---\nb: 2\n").unwrap();
    let documents: Vec<_> = yaml.documents().collect();
    assert_eq!(documents.len(), 2);

    let mut second = documents[1].clone();
    second.append_to("libs", &YamlValue::from("x"), &[]).unwrap();
    assert_eq!(yaml.to_string(), "a: 1\n---\nb: 2\nlibs:\n  - x\n");
}
