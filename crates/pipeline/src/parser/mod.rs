//! Swagger 2.0 / OpenAPI 3.x parser.
//!
//! Reads the raw description stored on the record by the `original` stage and
//! fills the graph: header comments, client imports, the `baseURL` variable,
//! one declaration per named schema and one function per operation. Schema
//! keys and paths are visited in sorted order so output is deterministic.

mod operation;
pub mod schema;

use std::collections::HashSet;
use tracing::debug;

use genapi_core::config::{Config, Toggle};
use genapi_core::graph::{
    Graph, StatementImported, StatementResponse, StatementVariable, VariableFlag,
};
use genapi_core::{ConfigRead, Error, Result};

use crate::openapi::{ApiDocument, Info};
use crate::utils::quote;
use operation::{OperationContext, build_function, ensure_unique};
use schema::{Declaration, declare};

/// Name of the helper type that unwraps the response envelope.
pub const RESPONSE_TYPE_NAME: &str = "InferResponse";

/// HTTP client the generated request functions call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpClient {
    /// `axios`, imported as `http`.
    Axios,
    /// The global `fetch`, or a default export of `import.http`.
    Fetch,
}

impl HttpClient {
    /// Type of the trailing per-call options parameter.
    pub fn config_type(self) -> &'static str {
        match self {
            Self::Axios => "AxiosRequestConfig",
            Self::Fetch => "RequestInit",
        }
    }

    /// Return type wrapper when the configuration does not set one.
    pub fn default_generic(self) -> &'static str {
        match self {
            Self::Axios => "Promise<AxiosResponse<{__type__}>>",
            Self::Fetch => "Promise<{__type__}>",
        }
    }

    fn imports(self, http_module: Option<&str>) -> Vec<StatementImported> {
        match self {
            Self::Axios => vec![
                StatementImported {
                    type_only: true,
                    ..StatementImported::named(
                        vec!["AxiosRequestConfig".into(), "AxiosResponse".into()],
                        "axios",
                    )
                },
                StatementImported::default_import("http", http_module.unwrap_or("axios")),
            ],
            Self::Fetch => http_module
                .map(|module| vec![StatementImported::default_import("fetch", module)])
                .unwrap_or_default(),
        }
    }
}

/// Code-shaping settings drawn from the configuration.
#[derive(Debug, Clone)]
pub(crate) struct Options {
    pub client: HttpClient,
    /// `None` when the base URL variable is switched off.
    pub base_url: Option<String>,
    pub params_partial: bool,
    pub generic: String,
    pub infer: Option<String>,
    pub http_module: Option<String>,
}

impl Options {
    fn new(config: &Config, document: &ApiDocument, client: HttpClient) -> Self {
        let meta = &config.meta;
        let base_url = match &meta.base_url {
            Some(Toggle::Value(url)) => Some(url.clone()),
            Some(Toggle::Flag(false)) => None,
            Some(Toggle::Flag(true)) | None => Some(document.server_url().unwrap_or_default()),
        };
        let response_type = meta.response_type.as_ref();
        Self {
            client,
            base_url,
            params_partial: meta.params_partial.unwrap_or(false),
            generic: response_type
                .and_then(|rt| rt.generic())
                .unwrap_or_else(|| client.default_generic())
                .to_string(),
            infer: response_type.and_then(|rt| rt.infer()).map(str::to_string),
            http_module: meta.import.as_ref().and_then(|import| import.http.clone()),
        }
    }
}

/// The `parser` stage: populates `record.graphs` from `record.source`.
pub fn parse(mut record: ConfigRead, client: HttpClient) -> Result<ConfigRead> {
    let source = record.source.as_ref().ok_or_else(|| {
        Error::Parse("no API description was loaded before parsing".into())
    })?;
    let document = ApiDocument::from_value(source).map_err(Error::Parse)?;
    let options = Options::new(&record.config, &document, client);

    let mut graph = Graph::new();
    graph.comments = info_comments(&document.info);
    graph.imports = client.imports(options.http_module.as_deref());
    if let Some(url) = &options.base_url {
        graph.variables.push(StatementVariable {
            flag: VariableFlag::Const,
            name: "baseURL".into(),
            value: Some(quote(url)),
            export: true,
        });
    }
    graph.response = StatementResponse {
        type_name: RESPONSE_TYPE_NAME.into(),
        generic: Some(options.generic.clone()),
        infer: options.infer.clone(),
    };

    for (name, schema) in document.schemas() {
        match declare(name, schema) {
            Declaration::Interface(interface) => graph.interfaces.push(interface),
            Declaration::Alias(alias) => graph.typings.push(alias),
        }
    }

    let mut names = HashSet::new();
    for (path, item) in &document.paths {
        for (method, operation) in item.operations() {
            let ctx = OperationContext {
                document: &document,
                path,
                method,
                item,
                operation,
            };
            let function = build_function(&ctx, &options, &graph.response)?;
            ensure_unique(&mut names, &function)?;
            graph.functions.push(function);
        }
    }

    debug!(
        functions = graph.functions.len(),
        interfaces = graph.interfaces.len(),
        typings = graph.typings.len(),
        "Parsed API description."
    );
    record.graphs = graph;
    Ok(record)
}

fn info_comments(info: &Info) -> Vec<String> {
    let mut comments = Vec::new();
    if let Some(title) = &info.title {
        comments.push(format!("@title {title}"));
    }
    if let Some(version) = &info.version {
        comments.push(format!("@version {version}"));
    }
    if let Some(description) = &info.description {
        comments.extend(description.lines().map(str::to_string));
    }
    comments
}
