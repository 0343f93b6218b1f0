#![no_main]

use libfuzzer_sys::fuzz_target;
use ui5_yaml_edit::Parse;

fuzz_target!(|data: &[u8]| {
    if let Ok(yaml_str) = std::str::from_utf8(data) {
        // Skip extremely large inputs to avoid timeout
        if yaml_str.len() > 1_000_000 {
            return;
        }

        // Parsing never panics and never loses text, even with errors
        let parse = Parse::parse_yaml(yaml_str);
        assert_eq!(parse.tree().to_string(), yaml_str);
        let _ = parse.errors();
    }
});
