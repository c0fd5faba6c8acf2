//! Request and typings synthesizers: graph statements to TypeScript syntax.

use std::sync::Arc;

use genapi_core::ast::{
    ImportItem, TsFunction, TsImport, TsModule, TsParam, TsProp, TsType, TsTypeDef, TsVariable,
    TypeDefKind, VarKind,
};
use genapi_core::graph::{
    Graph, StatementField, StatementFunction, StatementImported, StatementInterface,
    StatementTypeAlias, StatementVariable, VariableFlag,
};
use genapi_core::{ConfigRead, Dispatcher, Output, OutputKind, Result, Synthesizer};

/// Dispatcher wired with the request and typings synthesizers.
pub fn dispatcher() -> Dispatcher {
    Dispatcher::new(Arc::new(RequestSynthesizer), Arc::new(TypingsSynthesizer))
}

/// The request file: client imports, variables and one function per operation.
///
/// Types come from the typings output when the record has one; otherwise they
/// are declared inline.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestSynthesizer;

impl Synthesizer for RequestSynthesizer {
    fn synthesize(&self, record: &ConfigRead, _output: &Output) -> Result<TsModule> {
        let graph = &record.graphs;
        let mut imports: Vec<TsImport> = graph.imports.iter().map(import).collect();
        let mut types = Vec::new();

        match record.output(&OutputKind::Typings) {
            Some(typings) => {
                let names = imported_type_names(graph);
                let from = record
                    .config
                    .meta
                    .import
                    .as_ref()
                    .and_then(|import| import.typings.clone())
                    .or_else(|| typings.import.clone());
                if let (false, Some(from)) = (names.is_empty(), from) {
                    imports.push(TsImport {
                        default: None,
                        namespace: None,
                        items: names
                            .into_iter()
                            .map(|name| ImportItem { name, alias: None })
                            .collect(),
                        from,
                        type_only: true,
                    });
                }
            }
            None => types = type_defs(graph),
        }

        Ok(TsModule {
            header: graph.comments.clone(),
            imports,
            variables: graph.variables.iter().map(variable).collect(),
            types,
            functions: graph.functions.iter().map(function).collect(),
        })
    }
}

/// The typings file: every alias and interface, plus the response helper.
#[derive(Debug, Clone, Copy, Default)]
pub struct TypingsSynthesizer;

impl Synthesizer for TypingsSynthesizer {
    fn synthesize(&self, record: &ConfigRead, _output: &Output) -> Result<TsModule> {
        Ok(TsModule {
            header: record.graphs.comments.clone(),
            types: type_defs(&record.graphs),
            ..TsModule::default()
        })
    }
}

fn imported_type_names(graph: &Graph) -> Vec<String> {
    let mut names: Vec<String> = graph.type_names().into_iter().map(str::to_string).collect();
    if graph.response.infer.is_some() {
        names.push(graph.response.type_name.clone());
    }
    names
}

fn type_defs(graph: &Graph) -> Vec<TsTypeDef> {
    let mut defs: Vec<TsTypeDef> = graph
        .typings
        .iter()
        .map(alias)
        .chain(graph.interfaces.iter().map(interface))
        .collect();
    if let Some(infer) = &graph.response.infer {
        defs.push(TsTypeDef {
            name: format!("{}<T>", graph.response.type_name),
            kind: TypeDefKind::TypeAlias {
                ty: TsType::Ref(infer.clone()),
            },
            docs: Vec::new(),
            is_export: true,
        });
    }
    defs
}

fn import(statement: &StatementImported) -> TsImport {
    let (default, namespace) = match (&statement.name, statement.namespace) {
        (Some(name), true) => (None, Some(name.clone())),
        (name, false) => (name.clone(), None),
        (None, true) => (None, None),
    };
    TsImport {
        default,
        namespace,
        items: statement
            .names
            .iter()
            .map(|name| ImportItem {
                name: name.clone(),
                alias: None,
            })
            .collect(),
        from: statement.value.clone(),
        type_only: statement.type_only,
    }
}

fn variable(statement: &StatementVariable) -> TsVariable {
    TsVariable {
        kind: match statement.flag {
            VariableFlag::Const => VarKind::Const,
            VariableFlag::Let => VarKind::Let,
            VariableFlag::Var => VarKind::Var,
        },
        name: statement.name.clone(),
        init: statement.value.clone(),
        is_export: statement.export,
    }
}

fn alias(statement: &StatementTypeAlias) -> TsTypeDef {
    TsTypeDef {
        name: statement.name.clone(),
        kind: TypeDefKind::TypeAlias {
            ty: TsType::from_expr(Some(&statement.value)),
        },
        docs: statement.description.clone(),
        is_export: statement.export,
    }
}

fn interface(statement: &StatementInterface) -> TsTypeDef {
    TsTypeDef {
        name: statement.name.clone(),
        kind: TypeDefKind::Interface {
            properties: statement.properties.iter().map(prop).collect(),
        },
        docs: statement.description.clone(),
        is_export: statement.export,
    }
}

fn prop(field: &StatementField) -> TsProp {
    TsProp {
        name: field.name.clone(),
        ty: TsType::from_expr(field.ty.as_deref()),
        optional: !field.required,
        docs: field.description.clone(),
    }
}

fn function(statement: &StatementFunction) -> TsFunction {
    let mut docs = statement.description.clone();
    for field in &statement.parameters {
        if let Some((first, rest)) = field.description.split_first() {
            docs.push(format!("@param {} {first}", field.name));
            docs.extend(rest.iter().cloned());
        }
    }
    TsFunction {
        name: statement.name.clone(),
        docs,
        params: statement
            .parameters
            .iter()
            .map(|field| TsParam {
                name: field.name.clone(),
                ty: field.ty.as_deref().map(|ty| TsType::from_expr(Some(ty))),
                optional: !field.required,
            })
            .collect(),
        return_type: statement
            .return_type
            .as_deref()
            .map(|ty| TsType::from_expr(Some(ty))),
        body: statement.body.clone(),
        is_async: statement.is_async,
        is_export: true,
    }
}
