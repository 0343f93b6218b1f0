//! Read-modify-stage updates of configuration files.

use crate::error::{YamlError, YamlResult};
use crate::fs::FileSystem;
use crate::middleware::{Library, MiddlewareDescriptor};
use crate::mutation::NodeComment;
use crate::ui5::Ui5Config;
use crate::Indentation;
use std::io;
use std::path::Path;

/// Read the configuration at `path`, apply `edit` and stage the result at
/// the same path.
///
/// New lines follow the indentation the file already uses. Nothing is staged
/// when reading, parsing or `edit` fails.
pub fn update_config<FS, F, R>(fs: &mut FS, path: &Path, edit: F) -> YamlResult<R>
where
    FS: FileSystem + ?Sized,
    F: FnOnce(&mut Ui5Config) -> YamlResult<R>,
{
    let text = fs.read(path).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => YamlError::FileNotFound(path.to_path_buf()),
        _ => YamlError::Io(err),
    })?;
    tracing::debug!(path = %path.display(), bytes = text.len(), "read configuration");

    let mut config = Ui5Config::parse(&text)?.with_indentation(Indentation::Detect);
    let result = edit(&mut config)?;

    fs.write(path, config.to_string())?;
    tracing::debug!(path = %path.display(), "staged configuration");
    Ok(result)
}

/// Register custom middleware in `base_path/filename`.
pub fn add_middleware_config<FS>(
    fs: &mut FS,
    base_path: impl AsRef<Path>,
    filename: &str,
    middlewares: &[MiddlewareDescriptor],
    comments: &[NodeComment],
) -> YamlResult<()>
where
    FS: FileSystem + ?Sized,
{
    let path = base_path.as_ref().join(filename);
    update_config(fs, &path, |config| {
        config.add_custom_middleware(middlewares, comments)
    })
}

/// Add framework libraries to `base_path/filename`.
pub fn add_libraries_config<FS>(
    fs: &mut FS,
    base_path: impl AsRef<Path>,
    filename: &str,
    libraries: &[Library],
) -> YamlResult<()>
where
    FS: FileSystem + ?Sized,
{
    let path = base_path.as_ref().join(filename);
    update_config(fs, &path, |config| config.add_libraries(libraries.iter().cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn seeded(path: &str, text: &str) -> MemFs {
        let mut fs = MemFs::new();
        fs.write(Path::new(path), text.to_string()).unwrap();
        fs
    }

    #[test]
    fn test_add_middleware_config() {
        let mut fs = seeded("app/ui5.yaml", "specVersion: '3.0'\n");
        let middleware = MiddlewareDescriptor::new("fiori-tools-preview")
            .after("fiori-tools-appreload")
            .with_configuration(json!({"component": "my.app"}));
        add_middleware_config(&mut fs, "app", "ui5.yaml", &[middleware], &[]).unwrap();
        assert_eq!(
            fs.read(Path::new("app/ui5.yaml")).unwrap(),
            "specVersion: '3.0'\nserver:\n  customMiddleware:\n    - name: fiori-tools-preview\n      \
             afterMiddleware: fiori-tools-appreload\n      configuration:\n        component: my.app\n"
        );
    }

    #[test]
    fn test_missing_file_stages_nothing() {
        let mut fs = MemFs::new();
        let err = add_middleware_config(
            &mut fs,
            "app",
            "ui5-local.yaml",
            &[MiddlewareDescriptor::new("x")],
            &[],
        )
        .unwrap_err();
        match err {
            YamlError::FileNotFound(path) => assert_eq!(path, Path::new("app/ui5-local.yaml")),
            other => panic!("expected FileNotFound, got {:?}", other),
        }
        assert_eq!(fs.staged_paths().count(), 0);
    }

    #[test]
    fn test_parse_error_leaves_file_alone() {
        let broken = "server: [unclosed\n";
        let mut fs = seeded("ui5.yaml", broken);
        let err = add_middleware_config(&mut fs, "", "ui5.yaml", &[MiddlewareDescriptor::new("x")], &[])
            .unwrap_err();
        assert!(matches!(err, YamlError::Parse(_)));
        assert_eq!(fs.read(Path::new("ui5.yaml")).unwrap(), broken);
    }

    #[test]
    fn test_add_libraries_config_uses_file_indentation() {
        let mut fs = seeded("ui5.yaml", "framework:\n    name: SAPUI5\n");
        add_libraries_config(&mut fs, "", "ui5.yaml", &[Library::new("sap.m"), Library::new("sap.m")]).unwrap();
        assert_eq!(
            fs.read(Path::new("ui5.yaml")).unwrap(),
            "framework:\n    name: SAPUI5\n    libraries:\n        - name: sap.m\n        - name: sap.m\n"
        );
    }

    #[test]
    fn test_update_config_returns_edit_result() {
        let mut fs = seeded("ui5.yaml", "server:\n  customMiddleware:\n    - name: a\n    - name: b\n");
        let count = update_config(&mut fs, Path::new("ui5.yaml"), |config| {
            Ok(config.custom_middleware()?.len())
        })
        .unwrap();
        assert_eq!(count, 2);
    }
}
