//! `genapi` command line: finds the configuration, resolves each pipeline and
//! runs it, one run per server entry.

use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use genapi_core::config::{InputOption, find_config, load_config};
use genapi_core::{Config, ConfigRead, DefineConfig, Error, Resolver, Result, run_define};

/// Environment variable holding the log level or a full filter spec.
pub const LOG_ENV: &str = "GENAPI_LOG";

/// Command-line arguments of `genapi`.
#[derive(Parser, Debug, Clone, Default)]
#[command(
    name = "genapi",
    version,
    about = "Generate typed API clients from Swagger / OpenAPI descriptions"
)]
pub struct Cli {
    /// Configuration file (TOML, JSON or YAML). Defaults to genapi.config.* in the working directory.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
    /// Pipeline name or manifest path; overrides the configuration.
    #[arg(long, short = 'p', value_name = "ID")]
    pub pipeline: Option<String>,
    /// API description URI or path; overrides the configuration.
    #[arg(long, short = 'i', value_name = "URI")]
    pub input: Option<String>,
    /// Primary output file; overrides the configuration.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<String>,
    /// Working directory to run in.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,
}

/// Parses `args`, runs every configured pipeline and returns the exit code.
pub fn run_cli(args: Vec<String>) -> i32 {
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            return code;
        }
    };
    init_tracing();

    if let Some(dir) = &cli.cwd
        && let Err(err) = std::env::set_current_dir(dir)
    {
        eprintln!("{}", Error::io(dir, err));
        return 1;
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to create tokio runtime: {err}");
            return 1;
        }
    };
    let resolver = match genapi_pipeline::resolver() {
        Ok(resolver) => resolver,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };
    runtime.block_on(run(&cli, resolver))
}

/// Runs the configuration `cli` describes against `resolver`.
pub async fn run(cli: &Cli, resolver: &Resolver) -> i32 {
    let define = match load_define(cli) {
        Ok(define) => define,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let mut failed = 0;
    for (index, result) in run_define(resolver, define).await.into_iter().enumerate() {
        match result {
            Ok(record) => report(&record),
            Err(err) => {
                error!(server = index, error = %err, "Pipeline run failed.");
                eprintln!("{err}");
                failed += 1;
            }
        }
    }
    i32::from(failed > 0)
}

fn report(record: &ConfigRead) {
    for output in &record.outputs {
        if output.code().is_some() {
            println!("{} {}", output.kind, output.path.display());
        }
    }
    info!(
        functions = record.graphs.functions.len(),
        outputs = record.outputs.len(),
        "Pipeline run finished."
    );
}

/// The configuration to run: the given or discovered file with command-line
/// overrides applied, or one built from the overrides alone.
pub fn load_define(cli: &Cli) -> Result<DefineConfig> {
    let path = match &cli.config {
        Some(path) => Some(path.clone()),
        None => std::env::current_dir()
            .ok()
            .and_then(|dir| find_config(&dir)),
    };

    let define = match path {
        Some(path) => {
            debug!(path = %path.display(), "Loading configuration.");
            load_config(&path)?
        }
        None if cli.input.is_some() => DefineConfig::Single(Config::default()),
        None => {
            return Err(Error::Config(format!(
                "no configuration file found and no --input given (looked for {})",
                genapi_core::config::CONFIG_FILE_NAMES.join(", ")
            )));
        }
    };
    apply_overrides(define, cli)
}

fn apply_overrides(define: DefineConfig, cli: &Cli) -> Result<DefineConfig> {
    match define {
        DefineConfig::Single(mut config) => {
            if let Some(input) = &cli.input {
                config.input = Some(InputOption::Uri(input.clone()));
            }
            if let Some(output) = &cli.output {
                config.output.main = Some(output.clone());
            }
            if let Some(pipeline) = &cli.pipeline {
                config.pipeline = Some(pipeline.clone());
            }
            Ok(DefineConfig::Single(config))
        }
        DefineConfig::Servers(mut servers) => {
            if cli.input.is_some() || cli.output.is_some() {
                return Err(Error::Config(
                    "--input and --output cannot be used with a multi-server configuration".into(),
                ));
            }
            if let Some(pipeline) = &cli.pipeline {
                servers.pipeline = Some(pipeline.clone());
                for server in &mut servers.servers {
                    server.pipeline = Some(pipeline.clone());
                }
            }
            Ok(DefineConfig::Servers(servers))
        }
    }
}

fn init_tracing() {
    // GENAPI_LOG is either a plain level ("debug") applied to the genapi crates
    // or a full filter spec like "genapi_core=trace,reqwest=debug".
    let filter = match std::env::var(LOG_ENV) {
        Ok(level) if is_plain_level(&level) => genapi_filter(&level),
        Ok(spec) => spec,
        Err(_) => genapi_filter("info"),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn genapi_filter(level: &str) -> String {
    ["genapi_cli", "genapi_core", "genapi_pipeline"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use genapi_core::Inputs;
    use serde_json::json;
    use std::sync::Arc;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("genapi").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_argument_errors_exit_with_two() {
        assert_eq!(run_cli(vec!["genapi".into(), "--no-such-flag".into()]), 2);
    }

    #[test]
    fn test_overrides_replace_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genapi.config.json");
        std::fs::write(
            &path,
            r#"{ "input": "a.json", "output": { "main": "a.ts" }, "pipeline": "swag-axios-ts" }"#,
        )
        .unwrap();
        let path = path.to_string_lossy().into_owned();

        let define = load_define(&cli(&[
            "--config", &path, "--input", "b.json", "--pipeline", "swag-fetch-ts",
        ]))
        .unwrap();
        let DefineConfig::Single(config) = define else {
            unreachable!("expected a single configuration");
        };
        assert_eq!(config.inputs().unwrap(), Inputs::Uri("b.json".into()));
        assert_eq!(config.output.main.as_deref(), Some("a.ts"));
        assert_eq!(config.pipeline_id(), "swag-fetch-ts");
    }

    #[test]
    fn test_servers_reject_input_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("servers.yaml");
        std::fs::write(&path, "servers:\n  - input: a.json\n  - input: b.json\n").unwrap();
        let path = path.to_string_lossy().into_owned();

        let err = load_define(&cli(&["--config", &path, "--input", "c.json"])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let define = load_define(&cli(&["--config", &path, "--pipeline", "local"])).unwrap();
        assert!(
            define
                .into_configs()
                .iter()
                .all(|config| config.pipeline_id() == "local")
        );
    }

    #[tokio::test]
    async fn test_run_generates_files_from_local_description() {
        let dir = tempfile::tempdir().unwrap();
        let spec = dir.path().join("spec.json");
        std::fs::write(
            &spec,
            json!({
                "openapi": "3.0.0",
                "paths": {
                    "/health": { "get": { "operationId": "health", "responses": { "204": {} } } }
                }
            })
            .to_string(),
        )
        .unwrap();
        let main = dir.path().join("client/index.ts");
        let resolver = Resolver::new(Arc::new(genapi_pipeline::builtin_registry().unwrap()))
            .with_cwd(dir.path());

        let args = cli(&[
            "--input",
            &spec.to_string_lossy(),
            "--output",
            &main.to_string_lossy(),
            "--config",
            &dir.path().join("missing.toml").to_string_lossy(),
        ]);
        // an explicit but missing configuration file is an error
        assert_eq!(run(&args, &resolver).await, 1);

        let args = Cli {
            config: None,
            ..args
        };
        assert_eq!(run(&args, &resolver).await, 0);
        assert!(main.exists());
        assert!(dir.path().join("client/index.type.ts").exists());
    }

    #[tokio::test]
    async fn test_unknown_pipeline_fails_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("genapi.config.toml");
        std::fs::write(&config, "input = \"spec.json\"\npipeline = \"does-not-exist\"\n").unwrap();
        let resolver = Resolver::new(Arc::new(genapi_pipeline::builtin_registry().unwrap()))
            .with_cwd(dir.path());

        let args = cli(&["--config", &config.to_string_lossy()]);
        assert_eq!(run(&args, &resolver).await, 1);
    }

    #[test]
    fn test_log_filter() {
        assert!(is_plain_level("DEBUG"));
        assert!(!is_plain_level("genapi_core=trace"));
        assert_eq!(
            genapi_filter("warn"),
            "genapi_cli=warn,genapi_core=warn,genapi_pipeline=warn"
        );
    }
}
