//! The working record threaded through every stage of one pipeline run.

use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::ast::TsModule;
use crate::config::{Config, Inputs};
use crate::graph::Graph;

/// Kind tag of an output descriptor. Unknown tags are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OutputKind {
    /// The request functions.
    Request,
    /// Type declarations only.
    Typings,
    /// A tag no built-in synthesizer knows.
    Other(String),
}

impl OutputKind {
    /// The tag as written in configuration and logs.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Request => "request",
            Self::Typings => "typings",
            Self::Other(tag) => tag,
        }
    }
}

impl From<&str> for OutputKind {
    fn from(tag: &str) -> Self {
        match tag {
            "request" => Self::Request,
            "typings" => Self::Typings,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compilation result attached to an output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AstSlot {
    /// Compilation has not run for this output.
    #[default]
    Pending,
    /// Tree built for a request output.
    Request(TsModule),
    /// Tree built for a typings output.
    Typings(TsModule),
    /// Compilation ran but no synthesizer handles this kind.
    Unhandled,
}

impl AstSlot {
    /// The syntax tree, if one was synthesized.
    pub fn module(&self) -> Option<&TsModule> {
        match self {
            Self::Request(module) | Self::Typings(module) => Some(module),
            Self::Pending | Self::Unhandled => None,
        }
    }
}

/// One requested generation target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    /// What this output is.
    pub kind: OutputKind,
    /// Directory the output lives in.
    pub root: PathBuf,
    /// Destination file.
    pub path: PathBuf,
    /// Import specifier other outputs use to reach this one.
    pub import: Option<String>,
    ast: AstSlot,
    code: Option<String>,
}

impl Output {
    /// Creates a descriptor for `path`; `root` is its parent directory.
    pub fn new(kind: impl Into<OutputKind>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();
        Self {
            kind: kind.into(),
            root,
            path,
            import: None,
            ast: AstSlot::Pending,
            code: None,
        }
    }

    /// Sets the import specifier.
    pub fn with_import(mut self, import: impl Into<String>) -> Self {
        self.import = Some(import.into());
        self
    }

    /// The compilation result, including the pending and unhandled states.
    pub fn ast_slot(&self) -> &AstSlot {
        &self.ast
    }

    /// The synthesized tree; `None` before compilation and for unhandled kinds.
    pub fn ast(&self) -> Option<&TsModule> {
        self.ast.module()
    }

    /// Replaces the AST slot. Any previously rendered text is dropped because it
    /// no longer matches the tree.
    pub fn set_ast(&mut self, ast: AstSlot) {
        self.ast = ast;
        self.code = None;
    }

    /// The rendered text, once `generate` has run.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Renders the AST into the text slot. Returns `false`, leaving the text
    /// slot empty, when there is no AST to render.
    pub fn render_with(&mut self, render: impl FnOnce(&TsModule) -> String) -> bool {
        match self.ast.module() {
            Some(module) => {
                self.code = Some(render(module));
                true
            }
            None => false,
        }
    }
}

impl From<String> for OutputKind {
    fn from(tag: String) -> Self {
        Self::from(tag.as_str())
    }
}

/// State carried from `read_config` to `dest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRead {
    /// Where the API description comes from.
    pub inputs: Inputs,
    /// The configuration the record was seeded from.
    pub config: Config,
    /// The language-neutral graph built by the parser.
    pub graphs: Graph,
    /// Generation targets, in configuration order.
    pub outputs: Vec<Output>,
    /// Raw description payload, once fetched.
    pub source: Option<Value>,
}

impl ConfigRead {
    /// A fresh record with an empty graph and no source.
    pub fn new(inputs: Inputs, config: Config, outputs: Vec<Output>) -> Self {
        Self {
            inputs,
            config,
            graphs: Graph::new(),
            outputs,
            source: None,
        }
    }

    /// First output of the given kind.
    pub fn output(&self, kind: &OutputKind) -> Option<&Output> {
        self.outputs.iter().find(|output| &output.kind == kind)
    }

    /// True when the request file has a separate typings file next to it.
    pub fn has_typings_output(&self) -> bool {
        self.output(&OutputKind::Typings).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_kind_tags() {
        assert_eq!(OutputKind::from("request"), OutputKind::Request);
        assert_eq!(OutputKind::from("typings"), OutputKind::Typings);
        let other = OutputKind::from("graphql-operation");
        assert_eq!(other, OutputKind::Other("graphql-operation".into()));
        assert_eq!(other.to_string(), "graphql-operation");
    }

    #[test]
    fn test_output_root_is_parent_dir() {
        let output = Output::new("request", "/tmp/project/src/api/index.ts");
        assert_eq!(output.root, PathBuf::from("/tmp/project/src/api"));
        assert!(output.ast().is_none());
        assert!(output.code().is_none());
    }

    #[test]
    fn test_render_requires_ast() {
        let mut output = Output::new("request", "api.ts");
        assert!(!output.render_with(|_| "never".into()));
        assert!(output.code().is_none());

        output.set_ast(AstSlot::Unhandled);
        assert!(!output.render_with(|_| "never".into()));

        output.set_ast(AstSlot::Request(TsModule::default()));
        assert!(output.render_with(|_| "// ok\n".into()));
        assert_eq!(output.code(), Some("// ok\n"));

        output.set_ast(AstSlot::Request(TsModule::default()));
        assert!(output.code().is_none());
    }
}
