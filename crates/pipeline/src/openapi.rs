//! Swagger 2.0 and OpenAPI 3.x document structs for serde deserialization.
//!
//! Only the parts that shape generated request functions and type
//! declarations are modelled; everything else is ignored on input.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Root of a Swagger 2.0 or OpenAPI 3.x document.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDocument {
    /// `"2.0"` for Swagger documents.
    pub swagger: Option<String>,
    /// `"3.0.x"` / `"3.1.x"` for OpenAPI documents.
    pub openapi: Option<String>,
    /// Title, description and version.
    #[serde(default)]
    pub info: Info,
    /// Swagger 2.0 host, without scheme.
    pub host: Option<String>,
    /// Swagger 2.0 path prefix.
    pub base_path: Option<String>,
    /// Swagger 2.0 transfer protocols; the first one builds the server URL.
    #[serde(default)]
    pub schemes: Vec<String>,
    /// OpenAPI 3.x servers; the first one is the base URL.
    #[serde(default)]
    pub servers: Vec<Server>,
    /// Operations keyed by path template.
    #[serde(default)]
    pub paths: BTreeMap<String, PathItem>,
    /// Swagger 2.0 schemas.
    #[serde(default)]
    pub definitions: BTreeMap<String, Schema>,
    /// Swagger 2.0 shared parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    /// OpenAPI 3.x reusable components.
    pub components: Option<Components>,
}

/// Document metadata, rendered into the header comment.
#[derive(Debug, Default, Deserialize)]
pub struct Info {
    /// API title.
    pub title: Option<String>,
    /// API description.
    pub description: Option<String>,
    /// API version.
    pub version: Option<String>,
}

/// An OpenAPI 3.x server entry.
#[derive(Debug, Deserialize)]
pub struct Server {
    /// Base URL of the server.
    pub url: String,
}

/// OpenAPI 3.x reusable components.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Components {
    /// Named schemas.
    #[serde(default)]
    pub schemas: BTreeMap<String, Schema>,
    /// Shared parameters.
    #[serde(default)]
    pub parameters: BTreeMap<String, Parameter>,
    /// Shared request bodies.
    #[serde(default)]
    pub request_bodies: BTreeMap<String, RequestBody>,
}

/// A path item containing operations for different HTTP methods.
#[derive(Debug, Default, Deserialize)]
pub struct PathItem {
    /// `GET` operation.
    pub get: Option<Operation>,
    /// `PUT` operation.
    pub put: Option<Operation>,
    /// `POST` operation.
    pub post: Option<Operation>,
    /// `DELETE` operation.
    pub delete: Option<Operation>,
    /// `OPTIONS` operation.
    pub options: Option<Operation>,
    /// `HEAD` operation.
    pub head: Option<Operation>,
    /// `PATCH` operation.
    pub patch: Option<Operation>,
    /// Path-level parameters shared by all operations.
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,
}

impl PathItem {
    /// Operations in a fixed method order.
    pub fn operations(&self) -> impl Iterator<Item = (&'static str, &Operation)> {
        [
            ("get", self.get.as_ref()),
            ("post", self.post.as_ref()),
            ("put", self.put.as_ref()),
            ("patch", self.patch.as_ref()),
            ("delete", self.delete.as_ref()),
            ("head", self.head.as_ref()),
            ("options", self.options.as_ref()),
        ]
        .into_iter()
        .filter_map(|(method, op)| op.map(|op| (method, op)))
    }
}

/// An API operation (endpoint).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    /// Preferred name of the generated function.
    pub operation_id: Option<String>,
    /// One-line summary for the doc comment.
    pub summary: Option<String>,
    /// Longer description for the doc comment.
    pub description: Option<String>,
    /// Marks the function `@deprecated`.
    #[serde(default)]
    pub deprecated: bool,
    /// Operation parameters, merged over the path-level ones.
    #[serde(default)]
    pub parameters: Vec<ParameterOrRef>,
    /// OpenAPI 3.x request body.
    pub request_body: Option<RequestBodyOrRef>,
    /// Responses keyed by status code or `default`.
    #[serde(default)]
    pub responses: BTreeMap<String, Response>,
}

/// A parameter, inline or by reference.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    /// A `$ref` to a shared parameter.
    Ref {
        /// The reference path.
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    /// A parameter declared in place.
    Inline(Parameter),
}

/// A parameter (path, query, header, cookie, body or formData).
#[derive(Debug, Clone, Deserialize)]
pub struct Parameter {
    /// Parameter name as sent on the wire.
    pub name: String,
    /// `path`, `query`, `header`, `cookie`, `body` or `formData`.
    #[serde(rename = "in")]
    pub location: String,
    /// Whether the parameter must be given.
    #[serde(default)]
    pub required: bool,
    /// Text for the doc comment.
    pub description: Option<String>,
    /// OpenAPI 3.x and Swagger 2.0 `in: body`.
    pub schema: Option<Schema>,
    /// Swagger 2.0 non-body parameters carry their type inline.
    #[serde(rename = "type")]
    pub param_type: Option<SchemaType>,
    /// Swagger 2.0 inline format.
    pub format: Option<String>,
    /// Swagger 2.0 inline array item schema.
    pub items: Option<Box<Schema>>,
    /// Swagger 2.0 inline allowed values.
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,
}

impl Parameter {
    /// The schema describing the parameter's value, whichever form it was given in.
    pub fn value_schema(&self) -> Schema {
        if let Some(schema) = &self.schema {
            return schema.clone();
        }
        Schema {
            schema_type: self.param_type.clone(),
            format: self.format.clone(),
            items: self.items.clone(),
            enum_values: self.enum_values.clone(),
            ..Schema::default()
        }
    }
}

/// A request body, inline or by reference.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RequestBodyOrRef {
    /// A `$ref` to a shared request body.
    Ref {
        /// The reference path.
        #[serde(rename = "$ref")]
        ref_path: String,
    },
    /// A request body declared in place.
    Inline(RequestBody),
}

/// An OpenAPI 3.x request body definition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RequestBody {
    /// Whether the body must be given.
    #[serde(default)]
    pub required: bool,
    /// Text for the doc comment.
    pub description: Option<String>,
    /// Body schema by media type.
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

/// A response definition.
#[derive(Debug, Default, Deserialize)]
pub struct Response {
    /// Text of the response.
    pub description: Option<String>,
    /// Swagger 2.0 response schema.
    pub schema: Option<Schema>,
    /// OpenAPI 3.x response content by media type.
    #[serde(default)]
    pub content: BTreeMap<String, MediaType>,
}

/// Media type content (e.g., application/json).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaType {
    /// Schema of the payload.
    pub schema: Option<Schema>,
}

/// JSON Schema subset used by both document versions.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    /// `type`, a single name or a list of names.
    #[serde(rename = "type")]
    pub schema_type: Option<SchemaType>,

    /// `$ref` to a named schema.
    #[serde(rename = "$ref")]
    pub ref_path: Option<String>,

    /// Object properties.
    pub properties: Option<BTreeMap<String, Schema>>,

    /// Names of the properties that must be present.
    #[serde(default)]
    pub required: Vec<String>,

    /// Array item schema.
    pub items: Option<Box<Schema>>,

    /// Allowed values.
    #[serde(rename = "enum")]
    pub enum_values: Option<Vec<Value>>,

    /// Union members.
    pub any_of: Option<Vec<Schema>>,
    /// Exclusive union members.
    pub one_of: Option<Vec<Schema>>,
    /// Intersection members.
    pub all_of: Option<Vec<Schema>>,

    /// Value schema of a map-like object.
    pub additional_properties: Option<AdditionalProperties>,

    /// Format hint such as `int64` or `binary`.
    pub format: Option<String>,

    /// Text for the doc comment.
    pub description: Option<String>,

    /// Single allowed value.
    #[serde(rename = "const")]
    pub const_value: Option<Value>,

    /// OpenAPI 3.0 nullable flag (3.1 uses type arrays instead).
    pub nullable: Option<bool>,
}

/// Schema type can be a single type or an array of types (for nullable).
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SchemaType {
    /// One type name.
    Single(String),
    /// Several type names, usually including `null`.
    Multiple(Vec<String>),
}

/// Additional properties can be a boolean or a schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    /// `true` allows any value, `false` none.
    Bool(bool),
    /// Values must match the schema.
    Schema(Box<Schema>),
}

impl ApiDocument {
    /// Deserializes a document from an already-loaded JSON value.
    pub fn from_value(value: &Value) -> Result<Self, String> {
        let document = Self::deserialize(value).map_err(|e| e.to_string())?;
        if document.swagger.is_none() && document.openapi.is_none() {
            return Err("document declares neither a `swagger` nor an `openapi` version".into());
        }
        Ok(document)
    }

    /// All named schemas, Swagger definitions first.
    pub fn schemas(&self) -> impl Iterator<Item = (&String, &Schema)> {
        self.definitions.iter().chain(
            self.components
                .iter()
                .flat_map(|components| components.schemas.iter()),
        )
    }

    /// Follows a `#/parameters/..` or `#/components/parameters/..` reference.
    pub fn parameter(&self, reference: &str) -> Option<&Parameter> {
        if let Some(name) = reference.strip_prefix("#/parameters/") {
            return self.parameters.get(name);
        }
        let name = reference.strip_prefix("#/components/parameters/")?;
        self.components.as_ref()?.parameters.get(name)
    }

    /// Follows a `#/components/requestBodies/..` reference.
    pub fn request_body(&self, reference: &str) -> Option<&RequestBody> {
        let name = reference.strip_prefix("#/components/requestBodies/")?;
        self.components.as_ref()?.request_bodies.get(name)
    }

    /// The server URL the document declares, if any.
    pub fn server_url(&self) -> Option<String> {
        if let Some(server) = self.servers.first() {
            return Some(server.url.trim_end_matches('/').to_string());
        }
        let base_path = self.base_path.as_deref().unwrap_or_default();
        let base_path = base_path.trim_end_matches('/');
        match &self.host {
            Some(host) => {
                let scheme = self.schemes.first().map_or("https", String::as_str);
                Some(format!("{scheme}://{host}{base_path}"))
            }
            None if !base_path.is_empty() => Some(base_path.to_string()),
            None => None,
        }
    }
}

impl Schema {
    /// Check if this schema is nullable (contains null in anyOf, type array, or nullable flag).
    pub fn is_nullable(&self) -> bool {
        if self.nullable == Some(true) {
            return true;
        }
        if let Some(SchemaType::Multiple(types)) = &self.schema_type
            && types.iter().any(|t| t == "null")
        {
            return true;
        }
        false
    }
}
