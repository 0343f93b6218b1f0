#![no_main]

use libfuzzer_sys::fuzz_target;
use ui5_yaml_edit::{Ui5Config, Yaml};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 100_000 {
        return;
    }
    let Ok(mut config) = Ui5Config::parse(text) else {
        return;
    };

    // A successful append must leave a document that parses again
    if config.add_libraries(["sap.m"]).is_ok() {
        let output = config.to_string();
        assert!(output.parse::<Yaml>().is_ok(), "unparsable output: {:?}", output);
    } else {
        assert_eq!(config.to_string(), text);
    }
});
