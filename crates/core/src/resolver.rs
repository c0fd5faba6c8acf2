//! Pipeline resolution.
//!
//! An identifier is tried against an ordered list of candidates and the first
//! one that yields a pipeline wins:
//!
//! 1. the published package `genapi-<identifier>` in the [`PipelineRegistry`];
//! 2. `<identifier>` as a file-system path to a pipeline manifest, taken as is
//!    when absolute and joined onto the resolver's working directory otherwise.
//!
//! Resolved pipelines are cached per identifier for the lifetime of the
//! resolver, so resolving the same identifier twice hands back the same
//! factory. Not-found results are not cached.

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

use crate::contract::{PipelineFactory, Stage, StagePipeline};
use crate::error::{Error, Result};
use crate::registry::{PipelineRegistry, package_name};

/// File names probed when a path candidate is a directory.
pub const MANIFEST_FILE_NAMES: &[&str] = &["pipeline.toml", "pipeline.json", "pipeline.yaml"];

/// One place a pipeline may be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// A published package name.
    Package(String),
    /// A manifest file or a directory containing one.
    Path(PathBuf),
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package(name) => write!(f, "package {name}"),
            Self::Path(path) => write!(f, "path {}", path.display()),
        }
    }
}

/// Locates and loads pipelines by identifier.
#[derive(Debug)]
pub struct Resolver {
    registry: Arc<PipelineRegistry>,
    cwd: PathBuf,
    cache: RwLock<HashMap<String, Arc<dyn PipelineFactory>>>,
}

impl Resolver {
    /// A resolver rooted at the process working directory.
    pub fn new(registry: Arc<PipelineRegistry>) -> Self {
        Self {
            registry,
            cwd: std::env::current_dir().unwrap_or_default(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolves relative path candidates against `cwd` instead.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = cwd.into();
        self
    }

    /// The registry consulted for package candidates.
    pub fn registry(&self) -> &PipelineRegistry {
        &self.registry
    }

    /// Candidates for `identifier`, in the order they are tried.
    pub fn candidates(&self, identifier: &str) -> Vec<Candidate> {
        if identifier.trim().is_empty() {
            return Vec::new();
        }
        vec![
            Candidate::Package(package_name(identifier)),
            Candidate::Path(self.cwd.join(identifier)),
        ]
    }

    /// Returns the pipeline for `identifier`, `None` when no candidate provides
    /// one, or an error when a candidate exists but is malformed.
    pub fn resolve(&self, identifier: &str) -> Result<Option<Arc<dyn PipelineFactory>>> {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(identifier)
            .cloned();
        if cached.is_some() {
            return Ok(cached);
        }

        for candidate in self.candidates(identifier) {
            debug!(identifier, %candidate, "Trying pipeline candidate.");
            let Some(factory) = self.load(&candidate)? else {
                continue;
            };
            debug!(identifier, %candidate, pipeline = factory.name(), "Resolved pipeline.");

            let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
            let cached = cache.entry(identifier.to_string()).or_insert(factory);
            return Ok(Some(Arc::clone(cached)));
        }

        debug!(identifier, "No candidate provided a pipeline.");
        Ok(None)
    }

    /// Like [`resolve`](Self::resolve), with absence turned into
    /// [`Error::PipelineNotFound`].
    pub fn require(&self, identifier: &str) -> Result<Arc<dyn PipelineFactory>> {
        self.resolve(identifier)?
            .ok_or_else(|| Error::PipelineNotFound(identifier.to_string()))
    }

    fn load(&self, candidate: &Candidate) -> Result<Option<Arc<dyn PipelineFactory>>> {
        match candidate {
            Candidate::Package(name) => Ok(self.registry.pipeline(name)),
            Candidate::Path(path) => {
                let Some(manifest_path) = locate_manifest(path) else {
                    return Ok(None);
                };
                let factory = self.load_manifest(&manifest_path)?;
                Ok(factory.map(|f| -> Arc<dyn PipelineFactory> { Arc::new(f) }))
            }
        }
    }

    fn load_manifest(&self, path: &Path) -> Result<Option<StagePipeline>> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(malformed(path, format!("unreadable: {err}"))),
        };

        let manifest = Manifest::parse(&contents, path)?;
        let name = manifest.name.clone().unwrap_or_else(|| {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("pipeline")
                .to_string()
        });

        let selections = manifest.selections();
        if selections.iter().all(|(_, selected)| selected.is_none()) {
            return Err(malformed(path, "manifest selects no stages".into()));
        }

        let mut pipeline = StagePipeline::new(name);
        for (stage, selected) in selections {
            let Some(selected) = selected else { continue };
            let handler = self.registry.stage(stage, selected).ok_or_else(|| {
                let known = self.registry.stage_names(stage).join(", ");
                malformed(
                    path,
                    format!("unknown {stage} stage `{selected}` (known: {known})"),
                )
            })?;
            pipeline = pipeline
                .with_stage(stage, handler.clone())
                .map_err(|err| malformed(path, err.to_string()))?;
        }

        debug!(
            path = %path.display(),
            pipeline = pipeline.name(),
            stages = ?pipeline.provided_stages(),
            "Loaded pipeline manifest."
        );
        Ok(Some(pipeline))
    }
}

fn malformed(path: &Path, reason: String) -> Error {
    Error::MalformedPipeline {
        path: path.to_path_buf(),
        reason,
    }
}

fn locate_manifest(path: &Path) -> Option<PathBuf> {
    if path.is_dir() {
        return MANIFEST_FILE_NAMES
            .iter()
            .map(|name| path.join(name))
            .find(|candidate| candidate.is_file());
    }
    path.is_file().then(|| path.to_path_buf())
}

/// Stage selections read from a manifest file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Manifest {
    name: Option<String>,
    #[serde(alias = "readConfig")]
    read_config: Option<String>,
    original: Option<String>,
    parser: Option<String>,
    compiler: Option<String>,
    generate: Option<String>,
    dest: Option<String>,
}

impl Manifest {
    /// Parses a manifest; a `default` table takes precedence over the top level.
    fn parse(contents: &str, path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let value: Value = match extension.as_str() {
            "toml" => toml::from_str(contents).map_err(|err| malformed(path, err.to_string()))?,
            "json" => {
                serde_json::from_str(contents).map_err(|err| malformed(path, err.to_string()))?
            }
            "yaml" | "yml" => {
                serde_yaml::from_str(contents).map_err(|err| malformed(path, err.to_string()))?
            }
            other => {
                return Err(malformed(
                    path,
                    format!("unsupported manifest format `{other}`"),
                ));
            }
        };

        let body = match value {
            Value::Object(mut map) => match map.remove("default") {
                Some(default @ Value::Object(_)) => default,
                Some(_) | None => Value::Object(map),
            },
            _ => return Err(malformed(path, "manifest is not a table".into())),
        };

        serde_json::from_value(body).map_err(|err| malformed(path, err.to_string()))
    }

    fn selections(&self) -> [(Stage, Option<&str>); 6] {
        [
            (Stage::ReadConfig, self.read_config.as_deref()),
            (Stage::Original, self.original.as_deref()),
            (Stage::Parser, self.parser.as_deref()),
            (Stage::Compiler, self.compiler.as_deref()),
            (Stage::Generate, self.generate.as_deref()),
            (Stage::Dest, self.dest.as_deref()),
        ]
    }
}
