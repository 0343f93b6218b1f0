use proptest::prelude::*;
use serde_json::{json, Value};
use std::str::FromStr;
use ui5_yaml_edit::{Library, Ui5Config, Yaml, YamlValue};

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-z][a-z0-9./-]{0,10}".prop_map(Value::from),
        "[a-z ]{1,8}".prop_map(Value::from),
        any::<i32>().prop_map(Value::from),
        any::<bool>().prop_map(Value::from),
    ]
}

fn json_value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z][a-zA-Z]{0,6}", inner, 1..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

proptest! {
    #[test]
    fn prop_appended_value_reads_back(value in json_value()) {
        let mut yaml = Yaml::new();
        yaml.append_to("server.customMiddleware", &YamlValue::from(value.clone()), &[]).unwrap();
        let text = yaml.to_string();

        let reparsed = Yaml::from_str(&text).unwrap();
        prop_assert_eq!(reparsed.to_string(), text);
        let item = reparsed.get("server.customMiddleware[0]").unwrap();
        prop_assert_eq!(item.to_value().to_json(), value);
    }

    #[test]
    fn prop_libraries_keep_order_and_duplicates(
        names in prop::collection::vec("[a-z]{1,6}(\\.[a-z]{1,6}){0,2}", 1..12)
    ) {
        let mut config = Ui5Config::default();
        config.add_libraries(names.iter().map(String::as_str)).unwrap();

        let read: Vec<String> = config
            .libraries()
            .unwrap()
            .into_iter()
            .map(|library: Library| library.name)
            .collect();
        prop_assert_eq!(read, names);
    }

    #[test]
    fn prop_append_keeps_existing_text(
        entries in prop::collection::btree_map("k[a-z]{0,6}", any::<i64>(), 1..8),
        comment in "[a-z ]{0,20}",
        value in json_value(),
    ) {
        let mut original = format!("# {}\n", comment);
        for (key, number) in &entries {
            original.push_str(&format!("{}: {}\n", key, number));
        }

        let mut yaml = Yaml::from_str(&original).unwrap();
        prop_assert_eq!(yaml.to_string(), original.clone());
        yaml.append_to("server.customMiddleware", &YamlValue::from(value), &[]).unwrap();

        let text = yaml.to_string();
        prop_assert!(text.starts_with(&original));
        let reparsed = Yaml::from_str(&text).unwrap();
        for (key, number) in &entries {
            prop_assert_eq!(reparsed.get(key).unwrap().to_string(), number.to_string());
        }
    }
}

#[test]
fn test_whitespace_strings_read_back() {
    let values = [
        json!({"a": [" "]}),
        json!(" lead"),
        json!("trail "),
        json!("\n"),
        json!("\n\n"),
        json!("kept\n\n"),
    ];
    for value in values {
        let mut yaml = Yaml::new();
        yaml.append_to("k", &YamlValue::from(value.clone()), &[]).unwrap();
        let text = yaml.to_string();

        let reparsed = Yaml::from_str(&text).unwrap();
        assert_eq!(reparsed.get("k[0]").unwrap().to_value().to_json(), value, "{:?}", text);
    }
}
