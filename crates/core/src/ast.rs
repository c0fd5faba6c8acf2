//! TypeScript syntax tree produced by synthesizers.
//!
//! This is the structure a renderer turns into source text. Type expressions
//! coming from the graph are already TypeScript, so anything that is not a
//! primitive is carried as a reference string rather than re-parsed.

/// TypeScript primitive types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TsPrimitive {
    /// `string`
    String,
    /// `number`
    Number,
    /// `boolean`
    Boolean,
    /// `null`
    Null,
    /// `void`
    Void,
    /// `any`
    Any,
    /// `unknown`
    Unknown,
}

impl TsPrimitive {
    /// Keyword spelling of the primitive.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Void => "void",
            Self::Any => "any",
            Self::Unknown => "unknown",
        }
    }

    fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "null" => Self::Null,
            "void" => Self::Void,
            "any" => Self::Any,
            "unknown" => Self::Unknown,
            _ => return None,
        })
    }
}

/// A type in annotation position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsType {
    /// A keyword type.
    Primitive(TsPrimitive),
    /// Any other type expression: `User`, `Promise<User[]>`, `{ id: number }`.
    Ref(String),
}

impl TsType {
    /// Classifies a graph type expression; a missing type becomes `unknown`.
    pub fn from_expr(expr: Option<&str>) -> Self {
        match expr.map(str::trim) {
            None | Some("") => Self::Primitive(TsPrimitive::Unknown),
            Some(expr) => TsPrimitive::from_keyword(expr)
                .map_or_else(|| Self::Ref(expr.to_string()), Self::Primitive),
        }
    }
}

/// Object property or interface member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsProp {
    /// Property key, quoted by the renderer when needed.
    pub name: String,
    /// Property type.
    pub ty: TsType,
    /// Rendered with `?`.
    pub optional: bool,
    /// JSDoc lines.
    pub docs: Vec<String>,
}

/// Import item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportItem {
    /// Exported name.
    pub name: String,
    /// Local name, when different.
    pub alias: Option<String>,
}

/// Import statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsImport {
    /// `import Default from ...`
    pub default: Option<String>,
    /// `import * as Namespace from ...`
    pub namespace: Option<String>,
    /// `import { a, b as c } from ...`
    pub items: Vec<ImportItem>,
    /// Module path
    pub from: String,
    /// Whether this is a type-only import
    pub type_only: bool,
}

/// Variable declaration kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarKind {
    /// `const`
    Const,
    /// `let`
    Let,
    /// `var`
    Var,
}

/// Module-level variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsVariable {
    /// Declaration keyword.
    pub kind: VarKind,
    /// Variable name.
    pub name: String,
    /// Initializer expression.
    pub init: Option<String>,
    /// Prefixed with `export`.
    pub is_export: bool,
}

/// Type definition kind
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDefKind {
    /// interface Foo { ... }
    Interface {
        /// Members in declaration order.
        properties: Vec<TsProp>,
    },
    /// type Foo = ...
    TypeAlias {
        /// The aliased type.
        ty: TsType,
    },
}

/// Type definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsTypeDef {
    /// Type name, possibly with type parameters.
    pub name: String,
    /// Interface or alias.
    pub kind: TypeDefKind,
    /// JSDoc lines.
    pub docs: Vec<String>,
    /// Prefixed with `export`.
    pub is_export: bool,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsParam {
    /// Parameter name.
    pub name: String,
    /// Annotation, if any.
    pub ty: Option<TsType>,
    /// Rendered with `?`.
    pub optional: bool,
}

/// Function definition. Body lines are emitted verbatim, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TsFunction {
    /// Function name.
    pub name: String,
    /// JSDoc lines.
    pub docs: Vec<String>,
    /// Parameters in order.
    pub params: Vec<TsParam>,
    /// Return annotation, if any.
    pub return_type: Option<TsType>,
    /// Statements, without indentation.
    pub body: Vec<String>,
    /// Declared `async`.
    pub is_async: bool,
    /// Prefixed with `export`.
    pub is_export: bool,
}

/// Complete TypeScript module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TsModule {
    /// Leading line comments.
    pub header: Vec<String>,
    /// Import statements.
    pub imports: Vec<TsImport>,
    /// Module-level variables.
    pub variables: Vec<TsVariable>,
    /// Interfaces and aliases.
    pub types: Vec<TsTypeDef>,
    /// Functions.
    pub functions: Vec<TsFunction>,
}

impl TsModule {
    /// True when rendering would produce no statements.
    pub fn is_empty(&self) -> bool {
        self.imports.is_empty()
            && self.variables.is_empty()
            && self.types.is_empty()
            && self.functions.is_empty()
    }
}
