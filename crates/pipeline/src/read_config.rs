//! The `read_config` stage: turns a configuration into a fresh working record.

use std::path::{Component, Path, PathBuf};
use tracing::debug;

use genapi_core::config::{Config, Toggle};
use genapi_core::{ConfigRead, Error, Output, Result};

/// Request file used when `output.main` is not set.
pub const DEFAULT_MAIN: &str = "src/api/index.ts";

/// Seeds the record: normalized inputs, a `request` output and, unless
/// `output.type` is `false`, a `typings` output next to it.
pub fn read_config(config: Config) -> Result<ConfigRead> {
    let inputs = config.inputs()?;
    let main = PathBuf::from(config.output.main.as_deref().unwrap_or(DEFAULT_MAIN));

    let typings = match &config.output.typings {
        Some(Toggle::Flag(false)) => None,
        Some(Toggle::Value(path)) => Some(PathBuf::from(path)),
        Some(Toggle::Flag(true)) | None => Some(typings_path(&main)),
    };

    let mut outputs = vec![Output::new("request", &main)];
    if let Some(path) = typings {
        let import = typings_import(&main, &path)?;
        outputs.push(Output::new("typings", path).with_import(import));
    }

    debug!(
        main = %main.display(),
        outputs = outputs.len(),
        "Seeded working record."
    );
    Ok(ConfigRead::new(inputs, config, outputs))
}

/// `index.ts` -> `index.type.ts`; JavaScript mains get a declaration file.
pub fn typings_path(main: &Path) -> PathBuf {
    match main.extension().and_then(|ext| ext.to_str()) {
        Some("js" | "mjs" | "cjs") => main.with_extension("type.d.ts"),
        _ => main.with_extension("type.ts"),
    }
}

/// Specifier the request file at `main` uses to import `typings`.
///
/// The usual extension-less form is kept unless it would resolve to `main`
/// itself (`api.ts` next to `api.d.ts`), in which case a declaration file is
/// addressed as `./api.d`. Any other collision is a configuration error.
pub fn typings_import(main: &Path, typings: &Path) -> Result<String> {
    let request_dir = main.parent().unwrap_or_else(|| Path::new(""));
    let import = import_specifier(request_dir, typings);
    if import != import_specifier(request_dir, main) {
        return Ok(import);
    }

    let relative = relative_specifier(request_dir, typings);
    match relative.strip_suffix(".d.ts") {
        Some(stem) if relative_specifier(request_dir, main) != relative => Ok(format!("{stem}.d")),
        _ => Err(Error::Config(format!(
            "typings file {} cannot be imported from the request file {}",
            typings.display(),
            main.display()
        ))),
    }
}

/// Relative module specifier from `from_dir` to `target`, without the
/// TypeScript extension: `./index.type`, `../types/api`.
pub fn import_specifier(from_dir: &Path, target: &Path) -> String {
    let mut specifier = relative_specifier(from_dir, target);
    for ext in [".d.ts", ".ts", ".tsx", ".js"] {
        if let Some(stripped) = specifier.strip_suffix(ext) {
            let len = stripped.len();
            specifier.truncate(len);
            break;
        }
    }
    specifier
}

fn relative_specifier(from_dir: &Path, target: &Path) -> String {
    let from: Vec<Component<'_>> = from_dir
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let to: Vec<Component<'_>> = target
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    let shared = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = Vec::new();
    parts.extend(std::iter::repeat_n("..".to_string(), from.len() - shared));
    parts.extend(
        to[shared..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().into_owned()),
    );
    let specifier = parts.join("/");
    if specifier.starts_with("..") {
        specifier
    } else {
        format!("./{specifier}")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use genapi_core::config::{InputOption, OutputOptions};
    use genapi_core::{Inputs, OutputKind};

    fn config(output: OutputOptions) -> Config {
        Config {
            input: Some(InputOption::Uri("https://api.example.com/spec.json".into())),
            output,
            ..Config::default()
        }
    }

    #[test]
    fn test_defaults() {
        let record = read_config(config(OutputOptions::default())).unwrap();
        assert_eq!(
            record.inputs,
            Inputs::Uri("https://api.example.com/spec.json".into())
        );
        assert_eq!(record.outputs.len(), 2);
        assert_eq!(record.outputs[0].kind, OutputKind::Request);
        assert_eq!(record.outputs[0].path, PathBuf::from(DEFAULT_MAIN));
        assert_eq!(record.outputs[1].kind, OutputKind::Typings);
        assert_eq!(
            record.outputs[1].path,
            PathBuf::from("src/api/index.type.ts")
        );
        assert_eq!(record.outputs[1].import.as_deref(), Some("./index.type"));
        assert!(record.graphs.is_empty());
    }

    #[test]
    fn test_typings_can_be_moved_or_disabled() {
        let record = read_config(config(OutputOptions {
            main: Some("src/api/index.ts".into()),
            typings: Some(Toggle::Value("src/types/api.d.ts".into())),
        }))
        .unwrap();
        assert_eq!(record.outputs[1].import.as_deref(), Some("../types/api"));

        let record = read_config(config(OutputOptions {
            main: Some("api.ts".into()),
            typings: Some(Toggle::Flag(false)),
        }))
        .unwrap();
        assert_eq!(record.outputs.len(), 1);
        assert!(!record.has_typings_output());
    }

    #[test]
    fn test_declaration_file_sharing_the_request_stem() {
        let record = read_config(config(OutputOptions {
            main: Some("api.ts".into()),
            typings: Some(Toggle::Value("api.d.ts".into())),
        }))
        .unwrap();
        assert_eq!(record.outputs[1].import.as_deref(), Some("./api.d"));

        let record = read_config(config(OutputOptions {
            main: Some("src/api/index.ts".into()),
            typings: Some(Toggle::Value("src/api/index.d.ts".into())),
        }))
        .unwrap();
        assert_eq!(record.outputs[1].import.as_deref(), Some("./index.d"));
    }

    #[test]
    fn test_typings_colliding_with_request_file() {
        for typings in ["api.ts", "api.tsx"] {
            let err = read_config(config(OutputOptions {
                main: Some("api.ts".into()),
                typings: Some(Toggle::Value(typings.into())),
            }))
            .unwrap_err();
            assert!(matches!(err, Error::Config(_)), "{typings}: {err}");
        }
    }

    #[test]
    fn test_missing_input() {
        let err = read_config(Config::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_typings_path_for_javascript() {
        assert_eq!(
            typings_path(Path::new("lib/api.js")),
            PathBuf::from("lib/api.type.d.ts")
        );
        assert_eq!(
            import_specifier(Path::new("lib"), Path::new("lib/api.type.d.ts")),
            "./api.type"
        );
    }
}
