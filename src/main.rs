use std::path::Path;

use serde_json::json;
use ui5_yaml_edit::{add_middleware_config, FileSystem, MemFs, MiddlewareDescriptor, NodeComment};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "ui5.yaml".to_string());
    let path = Path::new(&path);
    let base_path = path.parent().unwrap_or_else(|| Path::new(""));
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ui5.yaml".to_string());

    let appreload = MiddlewareDescriptor::new("fiori-tools-appreload")
        .after("compression")
        .with_configuration(json!({"port": 35729, "path": "webapp"}));
    let comments = [NodeComment::new("configuration.port", "livereload port")];

    // Staged only; the file on disk is left as it is
    let mut fs = MemFs::with_disk();
    match add_middleware_config(&mut fs, base_path, &filename, &[appreload], &comments) {
        Ok(()) => match fs.read(&base_path.join(&filename)) {
            Ok(text) => print!("{}", text),
            Err(e) => eprintln!("Failed to read staged file: {}", e),
        },
        Err(e) => {
            eprintln!("Failed to update {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}
