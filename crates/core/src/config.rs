//! User-facing configuration: where the API description comes from, where the
//! generated files go, and the metadata that shapes the generated code.
//!
//! Configuration files may be TOML, JSON or YAML. Field names follow the
//! camelCase spelling used by the JavaScript ecosystem this tool generates for
//! (`baseURL`, `responseType`, `paramsPartial`).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};

/// Pipeline used when a configuration does not name one.
pub const DEFAULT_PIPELINE: &str = "swag-axios-ts";

/// File names probed, in order, when no configuration path is given.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    "genapi.config.toml",
    "genapi.config.json",
    "genapi.config.yaml",
    "genapi.config.yml",
];

/// Where the API description comes from. Exactly one form is ever populated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Inputs {
    /// A URI (or a plain file path) pointing at the description document.
    Uri(String),
    /// A structured payload, inline or by path.
    Json(JsonSource),
}

/// A structured payload given either as a path or inline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum JsonSource {
    /// Path to a JSON or YAML document.
    Path(String),
    /// The document itself.
    Inline(Map<String, Value>),
}

/// The `input` field as written in a configuration file: a bare string is a URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum InputOption {
    /// `input = "..."`
    Uri(String),
    /// `input = { uri = "..." }` or `input = { json = ... }`
    Described(Inputs),
}

impl InputOption {
    /// Normalizes the shorthand into an [`Inputs`] descriptor.
    pub fn to_inputs(&self) -> Inputs {
        match self {
            Self::Uri(uri) => Inputs::Uri(uri.clone()),
            Self::Described(inputs) => inputs.clone(),
        }
    }
}

/// A string value that can also be switched off with `false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Toggle {
    /// An explicit value.
    Value(String),
    /// `true` keeps the default, `false` switches the feature off.
    Flag(bool),
}

impl Toggle {
    /// The configured string, if any.
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::Value(value) => Some(value),
            Self::Flag(_) => None,
        }
    }

    /// True only for an explicit `false`.
    pub fn is_disabled(&self) -> bool {
        matches!(self, Self::Flag(false))
    }
}

/// Output file preferences.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct OutputOptions {
    /// Primary (request) file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    /// Separate typings file, or `false` to keep types out of a separate file.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub typings: Option<Toggle>,
}

/// Import statement overrides for generated files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOverrides {
    /// Module the HTTP client is imported from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http: Option<String>,
    /// Module the request file imports its types from.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub typings: Option<String>,
}

/// How response bodies are typed.
///
/// `generic` wraps each operation's return type; `{__type__}` is replaced by the
/// inferred response type (e.g. `Promise<AxiosResponse<{__type__}>>`).
/// `infer` is a conditional type applied to the response envelope
/// (e.g. `T extends { data?: infer V } ? V : void`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseType {
    /// Shorthand for `{ infer = "..." }`.
    Infer(String),
    /// Both parts spelled out.
    Detailed {
        /// Return type wrapper.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        generic: Option<String>,
        /// Body conversion.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        infer: Option<String>,
    },
}

impl ResponseType {
    /// The return type wrapper, if configured.
    pub fn generic(&self) -> Option<&str> {
        match self {
            Self::Infer(_) => None,
            Self::Detailed { generic, .. } => generic.as_deref(),
        }
    }

    /// The body conversion, if configured.
    pub fn infer(&self) -> Option<&str> {
        match self {
            Self::Infer(infer) => Some(infer),
            Self::Detailed { infer, .. } => infer.as_deref(),
        }
    }
}

/// Descriptive metadata shared by single and multi-server configurations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    /// Base URL override; `false` omits the base URL variable entirely.
    #[serde(rename = "baseURL", default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<Toggle>,
    /// Import overrides.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<ImportOverrides>,
    /// Response typing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_type: Option<ResponseType>,
    /// Marks every parameter optional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params_partial: Option<bool>,
}

impl Meta {
    /// Field-wise merge where `self` wins and `shared` fills the gaps.
    pub fn or(&self, shared: &Self) -> Self {
        Self {
            base_url: self.base_url.clone().or_else(|| shared.base_url.clone()),
            import: self.import.clone().or_else(|| shared.import.clone()),
            response_type: self
                .response_type
                .clone()
                .or_else(|| shared.response_type.clone()),
            params_partial: self.params_partial.or(shared.params_partial),
        }
    }
}

/// A single pipeline configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// The API description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputOption>,
    /// Output files.
    #[serde(default)]
    pub output: OutputOptions,
    /// Code shaping options.
    #[serde(flatten)]
    pub meta: Meta,
    /// Pipeline identifier: a short name (`swag-axios-ts`) or a path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
}

impl Config {
    /// The pipeline identifier, falling back to [`DEFAULT_PIPELINE`].
    pub fn pipeline_id(&self) -> &str {
        self.pipeline.as_deref().unwrap_or(DEFAULT_PIPELINE)
    }

    /// The normalized input descriptor.
    pub fn inputs(&self) -> Result<Inputs> {
        self.input
            .as_ref()
            .map(InputOption::to_inputs)
            .ok_or_else(|| Error::Config("missing `input`".into()))
    }
}

/// Multi-server form: shared fields plus one complete configuration per server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigServers {
    /// Metadata inherited by every server.
    #[serde(flatten)]
    pub meta: Meta,
    /// Pipeline inherited by every server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pipeline: Option<String>,
    /// One configuration per run.
    pub servers: Vec<Config>,
}

/// Anything a configuration file may contain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefineConfig {
    /// Several runs sharing defaults.
    Servers(ConfigServers),
    /// One run.
    Single(Config),
}

impl DefineConfig {
    /// Expands into one configuration per independent run, in server order.
    ///
    /// Server entries inherit the shared `pipeline` and metadata they leave unset.
    pub fn into_configs(self) -> Vec<Config> {
        match self {
            Self::Single(config) => vec![config],
            Self::Servers(servers) => servers
                .servers
                .into_iter()
                .map(|server| Config {
                    meta: server.meta.or(&servers.meta),
                    pipeline: server.pipeline.or_else(|| servers.pipeline.clone()),
                    ..server
                })
                .collect(),
        }
    }
}

impl From<Config> for DefineConfig {
    fn from(config: Config) -> Self {
        Self::Single(config)
    }
}

/// Finds the first known configuration file in `dir`.
pub fn find_config(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.is_file())
}

/// Reads a configuration file, choosing the format from its extension.
pub fn load_config(path: &Path) -> Result<DefineConfig> {
    let contents = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
    debug!(path = %path.display(), bytes = contents.len(), "Read configuration file.");
    parse_config(&contents, path)
}

fn parse_config(contents: &str, path: &Path) -> Result<DefineConfig> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    match extension.as_str() {
        "toml" => toml::from_str(contents).map_err(|err| Error::Config(err.to_string())),
        "yaml" | "yml" => {
            serde_yaml::from_str(contents).map_err(|err| Error::Config(err.to_string()))
        }
        "json" => serde_json::from_str(contents).map_err(|err| Error::Config(err.to_string())),
        other => Err(Error::Config(format!(
            "unsupported configuration format `{other}` for {}",
            path.display()
        ))),
    }
}
