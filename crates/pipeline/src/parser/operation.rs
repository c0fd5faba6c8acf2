//! One request function per API operation.

use std::collections::HashSet;
use tracing::debug;

use genapi_core::graph::{StatementField, StatementFunction, StatementResponse};
use genapi_core::{Error, Result};

use super::schema::{Prop, TypeExpr, schema_to_type};
use super::{HttpClient, Options};
use crate::openapi::{
    ApiDocument, MediaType, Operation, Parameter, ParameterOrRef, PathItem, RequestBodyOrRef,
};
use crate::utils::{quote, quote_if_needed, sanitize_identifier};

const JSON_MEDIA_TYPES: &[&str] = &["application/json", "*/*", "text/json"];
const FORM_MEDIA_TYPES: &[&str] = &["multipart/form-data", "application/x-www-form-urlencoded"];

/// Everything needed to turn one operation into a function.
pub(super) struct OperationContext<'a> {
    pub document: &'a ApiDocument,
    pub path: &'a str,
    pub method: &'static str,
    pub item: &'a PathItem,
    pub operation: &'a Operation,
}

/// The request payload of an operation.
enum Body {
    Json(TypeExpr, bool),
    Form(bool),
}

/// Get operation name: the sanitized operationId, or method plus path segments.
pub(super) fn operation_name(path: &str, method: &str, op: &Operation) -> String {
    if let Some(id) = op.operation_id.as_deref().filter(|id| !id.trim().is_empty()) {
        return sanitize_identifier(id);
    }
    let segments: Vec<&str> = path
        .split('/')
        .map(|segment| segment.trim_matches(|c| c == '{' || c == '}'))
        .filter(|segment| !segment.is_empty())
        .collect();
    sanitize_identifier(&format!("{method} {}", segments.join(" ")))
}

pub(super) fn build_function(
    ctx: &OperationContext<'_>,
    options: &Options,
    response: &StatementResponse,
) -> Result<StatementFunction> {
    let name = operation_name(ctx.path, ctx.method, ctx.operation);
    let parameters = merged_parameters(ctx)?;

    let mut path_fields = Vec::new();
    let mut query_props = Vec::new();
    let mut form_required = None;
    let mut body = None;

    for param in &parameters {
        match param.location.as_str() {
            "path" => {
                let field = StatementField {
                    name: sanitize_identifier(&param.name),
                    ty: Some(schema_to_type(&param.value_schema()).to_string()),
                    required: true,
                    description: describe(param.description.as_deref()),
                };
                path_fields.push((param.name.clone(), field));
            }
            "query" => query_props.push(Prop {
                name: param.name.clone(),
                ty: schema_to_type(&param.value_schema()),
                optional: !param.required,
            }),
            "body" => {
                body = Some(Body::Json(
                    schema_to_type(&param.value_schema()),
                    param.required,
                ));
            }
            "formData" => {
                form_required = Some(form_required.unwrap_or(false) || param.required);
            }
            other => {
                debug!(operation = %name, parameter = %param.name, location = other, "Skipping parameter.");
            }
        }
    }

    // Placeholders the document forgot to declare still need an argument.
    for placeholder in placeholders(ctx.path) {
        if !path_fields.iter().any(|(original, _)| *original == placeholder) {
            let field = StatementField::required(sanitize_identifier(&placeholder), "string");
            path_fields.push((placeholder, field));
        }
    }

    if body.is_none() {
        body = match (form_required, &ctx.operation.request_body) {
            (Some(required), _) => Some(Body::Form(required)),
            (None, Some(request_body)) => request_body_type(ctx.document, request_body)?,
            (None, None) => None,
        };
    }

    let has_query = !query_props.is_empty();
    let mut fields: Vec<StatementField> =
        path_fields.iter().map(|(_, field)| field.clone()).collect();
    if has_query {
        let required = query_props.iter().any(|prop| !prop.optional);
        fields.push(StatementField {
            name: "query".into(),
            ty: Some(TypeExpr::Object(query_props).to_string()),
            required,
            description: Vec::new(),
        });
    }
    let body_kind = body.as_ref().map(|body| match body {
        Body::Json(..) => BodyKind::Json,
        Body::Form(_) => BodyKind::Form,
    });
    if let Some(body) = body {
        let (ty, required) = match body {
            Body::Json(ty, required) => (ty, required),
            Body::Form(required) => (TypeExpr::FORM_DATA, required),
        };
        fields.push(StatementField {
            name: "body".into(),
            ty: Some(ty.to_string()),
            required,
            description: Vec::new(),
        });
    }

    if options.params_partial {
        for field in &mut fields {
            field.required = false;
        }
    }
    // A required parameter cannot follow an optional one.
    fields.sort_by_key(|field| !field.required);
    fields.push(StatementField::optional("config", options.client.config_type()));

    let response_expr = response_type(ctx.operation);
    let response_type = response_expr.to_string();
    let body_type = response.body_type(&response_type);
    let request = Request {
        method: ctx.method,
        url: url_template(ctx.path, &path_fields),
        has_query,
        body: body_kind,
        response_type: &body_type,
        returns_body: response_expr != TypeExpr::VOID,
        has_base_url: options.base_url.is_some(),
    };
    let body = match options.client {
        HttpClient::Axios => request.axios_body(),
        HttpClient::Fetch => request.fetch_body(),
    };

    Ok(StatementFunction {
        name,
        description: function_docs(ctx),
        parameters: fields,
        return_type: Some(response.wrap(&response_type)),
        body,
        is_async: options.client == HttpClient::Fetch,
    })
}

/// Path-level parameters overridden by operation-level ones with the same name
/// and location.
fn merged_parameters(ctx: &OperationContext<'_>) -> Result<Vec<Parameter>> {
    let mut merged: Vec<Parameter> = Vec::new();
    for param in ctx.item.parameters.iter().chain(&ctx.operation.parameters) {
        let param = match param {
            ParameterOrRef::Inline(param) => param.clone(),
            ParameterOrRef::Ref { ref_path } => ctx
                .document
                .parameter(ref_path)
                .cloned()
                .ok_or_else(|| Error::Parse(format!("unresolved parameter reference `{ref_path}`")))?,
        };
        match merged
            .iter_mut()
            .find(|existing| existing.name == param.name && existing.location == param.location)
        {
            Some(existing) => *existing = param,
            None => merged.push(param),
        }
    }
    Ok(merged)
}

fn request_body_type(document: &ApiDocument, body: &RequestBodyOrRef) -> Result<Option<Body>> {
    let body = match body {
        RequestBodyOrRef::Inline(body) => body,
        RequestBodyOrRef::Ref { ref_path } => document.request_body(ref_path).ok_or_else(|| {
            Error::Parse(format!("unresolved request body reference `{ref_path}`"))
        })?,
    };

    if FORM_MEDIA_TYPES.iter().any(|ty| body.content.contains_key(*ty))
        && !JSON_MEDIA_TYPES.iter().any(|ty| body.content.contains_key(*ty))
    {
        return Ok(Some(Body::Form(body.required)));
    }
    let ty = preferred_media(&body.content)
        .and_then(|media| media.schema.as_ref())
        .map_or(TypeExpr::UNKNOWN, schema_to_type);
    Ok(Some(Body::Json(ty, body.required)))
}

fn preferred_media(
    content: &std::collections::BTreeMap<String, MediaType>,
) -> Option<&MediaType> {
    JSON_MEDIA_TYPES
        .iter()
        .find_map(|ty| content.get(*ty))
        .or_else(|| content.values().find(|media| media.schema.is_some()))
}

/// Type of the success response: `200`, then `201`, then any other `2xx`,
/// then `default`.
fn response_type(op: &Operation) -> TypeExpr {
    let success = op
        .responses
        .get("200")
        .or_else(|| op.responses.get("201"))
        .or_else(|| {
            op.responses
                .iter()
                .find(|(code, _)| code.starts_with('2'))
                .map(|(_, response)| response)
        })
        .or_else(|| op.responses.get("default"));

    let Some(response) = success else {
        return TypeExpr::VOID;
    };
    if let Some(schema) = &response.schema {
        return schema_to_type(schema);
    }
    preferred_media(&response.content)
        .and_then(|media| media.schema.as_ref())
        .map_or(TypeExpr::VOID, schema_to_type)
}

fn placeholders(path: &str) -> Vec<String> {
    path.split('{')
        .skip(1)
        .filter_map(|rest| rest.split_once('}').map(|(name, _)| name.to_string()))
        .collect()
}

/// `/users/{user-id}` becomes `` `/users/${userId}` ``.
fn url_template(path: &str, path_fields: &[(String, StatementField)]) -> String {
    let mut url = path.replace('`', "\\`");
    for (original, field) in path_fields {
        url = url.replace(&format!("{{{original}}}"), &format!("${{{}}}", field.name));
    }
    url
}

fn describe(text: Option<&str>) -> Vec<String> {
    text.map(|text| text.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

fn function_docs(ctx: &OperationContext<'_>) -> Vec<String> {
    let op = ctx.operation;
    let mut docs = Vec::new();
    if let Some(summary) = &op.summary {
        docs.push(format!("@summary {summary}"));
    }
    docs.extend(describe(op.description.as_deref()));
    docs.push(format!("@method {}", ctx.method));
    docs.push(format!("@path {}", ctx.path));
    if op.deprecated {
        docs.push("@deprecated".into());
    }
    docs
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

/// The pieces a request body is assembled from.
struct Request<'a> {
    method: &'static str,
    url: String,
    has_query: bool,
    body: Option<BodyKind>,
    response_type: &'a str,
    returns_body: bool,
    has_base_url: bool,
}

impl Request<'_> {
    fn axios_body(&self) -> Vec<String> {
        let mut options = Vec::new();
        if self.has_base_url {
            options.push("baseURL".to_string());
        }
        options.push("url".into());
        options.push(format!(
            "method: {}",
            quote(&self.method.to_ascii_uppercase())
        ));
        if self.has_query {
            options.push("params: query".into());
        }
        if self.body.is_some() {
            options.push("data: body".into());
        }
        options.push("...config".into());

        vec![
            format!("const url = `{}`", self.url),
            format!(
                "return http.request<{}>({{ {} }})",
                self.response_type,
                options.join(", ")
            ),
        ]
    }

    fn fetch_body(&self) -> Vec<String> {
        let mut lines = Vec::new();
        let prefix = if self.has_base_url { "${baseURL}" } else { "" };
        if self.has_query {
            lines.push(
                "const search = new URLSearchParams((query ?? {}) as Record<string, string>).toString()"
                    .into(),
            );
            lines.push(format!(
                "const url = `{prefix}{}${{search ? `?${{search}}` : ''}}`",
                self.url
            ));
        } else {
            lines.push(format!("const url = `{prefix}{}`", self.url));
        }

        let mut init = vec![format!(
            "method: {}",
            quote(&self.method.to_ascii_uppercase())
        )];
        match self.body {
            Some(BodyKind::Json) => {
                init.push(format!(
                    "headers: {{ {}: {} }}",
                    quote_if_needed("Content-Type"),
                    quote("application/json")
                ));
                init.push("body: JSON.stringify(body)".into());
            }
            Some(BodyKind::Form) => init.push("body".into()),
            None => {}
        }
        init.push("...config".into());

        lines.push(format!(
            "const response = await fetch(url, {{ {} }})",
            init.join(", ")
        ));
        if self.returns_body {
            lines.push("return response.json()".into());
        }
        lines
    }
}

/// Names already taken by earlier operations.
pub(super) fn ensure_unique(names: &mut HashSet<String>, function: &StatementFunction) -> Result<()> {
    if names.insert(function.name.clone()) {
        Ok(())
    } else {
        Err(Error::Parse(format!(
            "duplicate operation name `{}`; each operation must have a unique identifier",
            function.name
        )))
    }
}
