//! The graph: the parser's sole output and the compiler's sole input.
//!
//! Every sequence keeps its insertion order, which is the emission order of
//! the generated file. Nothing here deduplicates entries; a parser that needs
//! unique names has to take care of that itself.

use serde::{Deserialize, Serialize};

/// Intermediate representation of an API description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Graph {
    /// Free-floating comments emitted at the top of the request file.
    pub comments: Vec<String>,
    /// One function per API operation.
    pub functions: Vec<StatementFunction>,
    /// Import statements of the request file.
    pub imports: Vec<StatementImported>,
    /// Module-level variables such as `baseURL`.
    pub variables: Vec<StatementVariable>,
    /// Type aliases.
    pub typings: Vec<StatementTypeAlias>,
    /// Object type declarations.
    pub interfaces: Vec<StatementInterface>,
    /// The common response envelope.
    pub response: StatementResponse,
}

impl Graph {
    /// An empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the parser has not contributed anything yet.
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
            && self.functions.is_empty()
            && self.imports.is_empty()
            && self.variables.is_empty()
            && self.typings.is_empty()
            && self.interfaces.is_empty()
    }

    /// Names of every declared type, aliases first, in emission order.
    pub fn type_names(&self) -> Vec<&str> {
        self.typings
            .iter()
            .map(|alias| alias.name.as_str())
            .chain(self.interfaces.iter().map(|iface| iface.name.as_str()))
            .collect()
    }
}

/// A parameter or property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementField {
    /// Parameter or property name.
    pub name: String,
    /// TypeScript type expression; `None` leaves the field untyped.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ty: Option<String>,
    /// Absent fields are optional.
    #[serde(default)]
    pub required: bool,
    /// Description lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<String>,
}

impl StatementField {
    /// A required field of type `ty`.
    pub fn required(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty.into()),
            required: true,
            description: Vec::new(),
        }
    }

    /// An optional field of type `ty`.
    pub fn optional(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(name, ty)
        }
    }

    /// Appends a description line.
    pub fn with_description(mut self, line: impl Into<String>) -> Self {
        self.description.push(line.into());
        self
    }
}

/// A request-calling function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementFunction {
    /// Function name, unique within the graph.
    pub name: String,
    /// Doc lines from the operation summary and description.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<String>,
    /// Parameters in call order.
    #[serde(default)]
    pub parameters: Vec<StatementField>,
    /// Return type expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    /// Body lines, emitted verbatim.
    #[serde(default)]
    pub body: Vec<String>,
    /// Declared `async`.
    #[serde(default, rename = "async")]
    pub is_async: bool,
}

/// An import statement.
///
/// `import <name> from "<value>"`, `import { <names> } from "<value>"`, or with
/// `namespace`, `import * as <name> from "<value>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementImported {
    /// Default or namespace binding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Module specifier.
    pub value: String,
    /// Named bindings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub names: Vec<String>,
    /// `name` is a namespace binding.
    #[serde(default)]
    pub namespace: bool,
    /// `import type`.
    #[serde(default, rename = "type")]
    pub type_only: bool,
}

impl StatementImported {
    /// `import name from "value"`.
    pub fn default_import(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            value: value.into(),
            ..Self::default()
        }
    }

    /// `import { a, b } from "value"`.
    pub fn named(names: Vec<String>, value: impl Into<String>) -> Self {
        Self {
            names,
            value: value.into(),
            ..Self::default()
        }
    }
}

/// Declaration keyword of a variable statement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableFlag {
    /// `const`
    #[default]
    Const,
    /// `let`
    Let,
    /// `var`
    Var,
}

/// A module-level variable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementVariable {
    /// Declaration keyword.
    #[serde(default)]
    pub flag: VariableFlag,
    /// Variable name.
    pub name: String,
    /// Initializer expression, emitted verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Exported from the module.
    #[serde(default)]
    pub export: bool,
}

/// `type Name = value`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementTypeAlias {
    /// Alias name.
    pub name: String,
    /// Aliased type expression.
    pub value: String,
    /// Exported from the module.
    #[serde(default)]
    pub export: bool,
    /// Description lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<String>,
}

/// `interface Name { ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementInterface {
    /// Interface name.
    pub name: String,
    /// Members in declaration order.
    #[serde(default)]
    pub properties: Vec<StatementField>,
    /// Exported from the module.
    #[serde(default)]
    pub export: bool,
    /// Description lines.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<String>,
}

/// Response envelope shared by every generated function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementResponse {
    /// Name of the helper type that unwraps the envelope.
    #[serde(rename = "type")]
    pub type_name: String,
    /// Wrapper around each return type; `{__type__}` marks the slot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generic: Option<String>,
    /// Conditional type used to unwrap the envelope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infer: Option<String>,
}

impl StatementResponse {
    /// Placeholder replaced by the concrete response type inside `generic`.
    pub const TYPE_SLOT: &'static str = "{__type__}";

    /// The response body type for schema type `ty`: `ty` itself, or
    /// `<type_name><ty>` when `infer` converts the body.
    pub fn body_type(&self, ty: &str) -> String {
        match &self.infer {
            Some(_) => format!("{}<{ty}>", self.type_name),
            None => ty.to_string(),
        }
    }

    /// The function return type for schema type `ty`: [`body_type`](Self::body_type)
    /// placed into `generic`, or the body type alone.
    pub fn wrap(&self, ty: &str) -> String {
        let body = self.body_type(ty);
        match &self.generic {
            Some(generic) => generic.replace(Self::TYPE_SLOT, &body),
            None => body,
        }
    }
}
