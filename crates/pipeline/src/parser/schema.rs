//! Schema to TypeScript type expression conversion.

use serde_json::Value;
use std::fmt;

use genapi_core::graph::{StatementField, StatementInterface, StatementTypeAlias};

use crate::openapi::{AdditionalProperties, Schema, SchemaType};
use crate::utils::{quote, quote_if_needed, sanitize_type_name};

/// A TypeScript type expression, rendered with [`fmt::Display`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    /// `string`, `number`, `boolean`, `null`, `unknown`, `void`, `Blob`.
    Keyword(&'static str),
    /// Literal type: `'sold'`, `42`, `true`.
    Literal(String),
    /// `T[]`
    Array(Box<TypeExpr>),
    /// `A | B`
    Union(Vec<TypeExpr>),
    /// `A & B`
    Intersection(Vec<TypeExpr>),
    /// Inline object type.
    Object(Vec<Prop>),
    /// `Record<string, V>`
    Record(Box<TypeExpr>),
    /// A named type.
    Ref(String),
}

/// Object member inside an inline object type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prop {
    /// Member key.
    pub name: String,
    /// Member type.
    pub ty: TypeExpr,
    /// Rendered with `?`.
    pub optional: bool,
}

impl TypeExpr {
    /// `unknown`
    pub const UNKNOWN: Self = Self::Keyword("unknown");
    /// `void`
    pub const VOID: Self = Self::Keyword("void");
    /// `FormData`
    pub const FORM_DATA: Self = Self::Keyword("FormData");

    fn nullable(self) -> Self {
        match self {
            Self::Union(mut types) => {
                types.push(Self::Keyword("null"));
                Self::Union(types)
            }
            other => Self::Union(vec![other, Self::Keyword("null")]),
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(keyword) => f.write_str(keyword),
            Self::Literal(literal) => f.write_str(literal),
            Self::Array(inner) => {
                // Wrap complex types in parentheses
                if matches!(**inner, Self::Union(_) | Self::Intersection(_)) {
                    write!(f, "({inner})[]")
                } else {
                    write!(f, "{inner}[]")
                }
            }
            Self::Union(types) => join(f, types, " | ", |_| false),
            Self::Intersection(types) => join(f, types, " & ", |t| matches!(t, Self::Union(_))),
            Self::Object(props) if props.is_empty() => f.write_str("{}"),
            Self::Object(props) => {
                f.write_str("{ ")?;
                for (i, prop) in props.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    let opt = if prop.optional { "?" } else { "" };
                    write!(f, "{}{opt}: {}", quote_if_needed(&prop.name), prop.ty)?;
                }
                f.write_str(" }")
            }
            Self::Record(value) => write!(f, "Record<string, {value}>"),
            Self::Ref(name) => f.write_str(name),
        }
    }
}

fn join(
    f: &mut fmt::Formatter<'_>,
    types: &[TypeExpr],
    separator: &str,
    parenthesize: impl Fn(&TypeExpr) -> bool,
) -> fmt::Result {
    if types.is_empty() {
        return f.write_str("unknown");
    }
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(separator)?;
        }
        if parenthesize(ty) {
            write!(f, "({ty})")?;
        } else {
            write!(f, "{ty}")?;
        }
    }
    Ok(())
}

/// Type name a `$ref` points at.
pub fn ref_to_type_name(ref_path: &str) -> String {
    let name = ref_path.rsplit('/').next().unwrap_or(ref_path);
    sanitize_type_name(name)
}

/// Convert a Schema to a type expression.
pub fn schema_to_type(schema: &Schema) -> TypeExpr {
    let ty = schema_to_type_inner(schema);
    if schema.nullable == Some(true) {
        ty.nullable()
    } else {
        ty
    }
}

fn schema_to_type_inner(schema: &Schema) -> TypeExpr {
    if let Some(ref_path) = &schema.ref_path {
        return TypeExpr::Ref(ref_to_type_name(ref_path));
    }

    if let Some(value) = &schema.const_value {
        return literal(value);
    }

    if let Some(all_of) = &schema.all_of {
        return collapse(all_of.iter().map(schema_to_type).collect(), TypeExpr::Intersection);
    }

    if let Some(variants) = schema.any_of.as_ref().or(schema.one_of.as_ref()) {
        return collapse(variants.iter().map(schema_to_type).collect(), TypeExpr::Union);
    }

    if let Some(values) = &schema.enum_values {
        return collapse(values.iter().map(literal).collect(), TypeExpr::Union);
    }

    match &schema.schema_type {
        Some(SchemaType::Single(t)) => single_type(t, schema),
        Some(SchemaType::Multiple(types)) => {
            let mut variants: Vec<_> = types
                .iter()
                .filter(|t| *t != "null")
                .map(|t| single_type(t, schema))
                .collect();
            if schema.is_nullable() {
                variants.push(TypeExpr::Keyword("null"));
            }
            collapse(variants, TypeExpr::Union)
        }
        None if schema.properties.is_some() || schema.additional_properties.is_some() => {
            object_type(schema)
        }
        None => TypeExpr::UNKNOWN,
    }
}

fn collapse(mut types: Vec<TypeExpr>, combine: fn(Vec<TypeExpr>) -> TypeExpr) -> TypeExpr {
    match types.len() {
        0 => TypeExpr::UNKNOWN,
        1 => types.pop().unwrap_or(TypeExpr::UNKNOWN),
        _ => combine(types),
    }
}

fn single_type(schema_type: &str, schema: &Schema) -> TypeExpr {
    match schema_type {
        "string" if matches!(schema.format.as_deref(), Some("binary")) => TypeExpr::Keyword("Blob"),
        "string" => TypeExpr::Keyword("string"),
        "number" | "integer" => TypeExpr::Keyword("number"),
        "boolean" => TypeExpr::Keyword("boolean"),
        "null" => TypeExpr::Keyword("null"),
        "file" => TypeExpr::Keyword("Blob"),
        "array" => {
            let item = schema.items.as_deref().map_or(TypeExpr::UNKNOWN, schema_to_type);
            TypeExpr::Array(Box::new(item))
        }
        "object" => object_type(schema),
        _ => TypeExpr::UNKNOWN,
    }
}

fn object_type(schema: &Schema) -> TypeExpr {
    let props = schema.properties.as_ref().map(|properties| {
        properties
            .iter()
            .map(|(name, prop)| Prop {
                name: name.clone(),
                ty: schema_to_type(prop),
                optional: !schema.required.contains(name),
            })
            .collect::<Vec<_>>()
    });

    let additional = match &schema.additional_properties {
        Some(AdditionalProperties::Bool(true)) => Some(TypeExpr::Record(Box::new(TypeExpr::UNKNOWN))),
        Some(AdditionalProperties::Schema(value)) => {
            Some(TypeExpr::Record(Box::new(schema_to_type(value))))
        }
        Some(AdditionalProperties::Bool(false)) | None => None,
    };

    match (props, additional) {
        (Some(props), Some(record)) => TypeExpr::Intersection(vec![TypeExpr::Object(props), record]),
        (Some(props), None) => TypeExpr::Object(props),
        (None, Some(record)) => record,
        (None, None) => TypeExpr::Record(Box::new(TypeExpr::UNKNOWN)),
    }
}

fn literal(value: &Value) -> TypeExpr {
    match value {
        Value::Null => TypeExpr::Keyword("null"),
        Value::Bool(b) => TypeExpr::Literal(b.to_string()),
        Value::Number(n) => TypeExpr::Literal(n.to_string()),
        Value::String(s) => TypeExpr::Literal(quote(s)),
        Value::Array(_) | Value::Object(_) => TypeExpr::UNKNOWN,
    }
}

/// A named schema as a graph declaration: plain objects become interfaces,
/// everything else a type alias.
#[derive(Debug)]
pub enum Declaration {
    /// `interface Name { ... }`
    Interface(StatementInterface),
    /// `type Name = ...`
    Alias(StatementTypeAlias),
}

/// Declares the schema registered under `name`.
pub fn declare(name: &str, schema: &Schema) -> Declaration {
    let name = sanitize_type_name(name);
    let description = schema
        .description
        .as_deref()
        .map(|text| text.lines().map(str::to_string).collect())
        .unwrap_or_default();

    let is_plain_object = schema.ref_path.is_none()
        && schema.all_of.is_none()
        && schema.any_of.is_none()
        && schema.one_of.is_none()
        && schema.enum_values.is_none()
        && schema.additional_properties.is_none()
        && schema.nullable != Some(true);

    match &schema.properties {
        Some(properties) if is_plain_object => {
            let properties = properties
                .iter()
                .map(|(prop_name, prop)| {
                    let field = StatementField {
                        name: prop_name.clone(),
                        ty: Some(schema_to_type(prop).to_string()),
                        required: schema.required.contains(prop_name),
                        description: Vec::new(),
                    };
                    match &prop.description {
                        Some(text) => text.lines().fold(field, |field, line| field.with_description(line)),
                        None => field,
                    }
                })
                .collect();
            Declaration::Interface(StatementInterface {
                name,
                properties,
                export: true,
                description,
            })
        }
        _ => Declaration::Alias(StatementTypeAlias {
            name,
            value: schema_to_type(schema).to_string(),
            export: true,
            description,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema(value: Value) -> Schema {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_primitives_and_refs() {
        assert_eq!(schema_to_type(&schema(json!({ "type": "integer" }))).to_string(), "number");
        assert_eq!(
            schema_to_type(&schema(json!({ "$ref": "#/definitions/Pet" }))).to_string(),
            "Pet"
        );
        assert_eq!(
            schema_to_type(&schema(json!({ "$ref": "#/components/schemas/pet-tag" }))).to_string(),
            "PetTag"
        );
        assert_eq!(
            schema_to_type(&schema(json!({ "type": "string", "format": "binary" }))).to_string(),
            "Blob"
        );
    }

    #[test]
    fn test_enum_and_nullable() {
        let status = schema(json!({ "type": "string", "enum": ["available", "sold"] }));
        assert_eq!(schema_to_type(&status).to_string(), "'available' | 'sold'");

        let nullable = schema(json!({ "type": "string", "nullable": true }));
        assert_eq!(schema_to_type(&nullable).to_string(), "string | null");

        let multi = schema(json!({ "type": ["integer", "null"] }));
        assert_eq!(schema_to_type(&multi).to_string(), "number | null");
    }

    #[test]
    fn test_arrays_and_objects() {
        let tags = schema(json!({
            "type": "array",
            "items": { "anyOf": [{ "type": "string" }, { "type": "number" }] }
        }));
        assert_eq!(schema_to_type(&tags).to_string(), "(string | number)[]");

        let object = schema(json!({
            "type": "object",
            "required": ["id"],
            "properties": { "id": { "type": "integer" }, "display-name": { "type": "string" } }
        }));
        assert_eq!(
            schema_to_type(&object).to_string(),
            "{ 'display-name'?: string; id: number }"
        );

        let map = schema(json!({ "type": "object", "additionalProperties": { "type": "integer" } }));
        assert_eq!(schema_to_type(&map).to_string(), "Record<string, number>");
    }

    #[test]
    fn test_declarations() {
        let Declaration::Interface(user) = declare(
            "user",
            &schema(json!({
                "type": "object",
                "description": "A user.",
                "required": ["id"],
                "properties": {
                    "id": { "type": "integer", "description": "Primary key." },
                    "tags": { "type": "array", "items": { "type": "string" } }
                }
            })),
        ) else {
            unreachable!("plain objects become interfaces");
        };
        assert_eq!(user.name, "User");
        assert_eq!(user.description, vec!["A user.".to_string()]);
        assert_eq!(user.properties[0].description, vec!["Primary key.".to_string()]);
        assert!(user.properties[0].required);
        assert_eq!(user.properties[1].ty.as_deref(), Some("string[]"));
        assert!(!user.properties[1].required);

        let Declaration::Alias(status) = declare("Status", &schema(json!({ "enum": [1, 2] }))) else {
            unreachable!("enums become aliases");
        };
        assert_eq!(status.value, "1 | 2");
    }
}
