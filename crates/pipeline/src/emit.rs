//! TypeScript code emission via the Emit trait.
//!
//! Each syntax node renders itself; [`TsModule`] stitches the pieces together
//! in header, imports, variables, types, functions order.

use genapi_core::ast::{
    ImportItem, TsFunction, TsImport, TsModule, TsParam, TsPrimitive, TsProp, TsType, TsTypeDef,
    TsVariable, TypeDefKind, VarKind,
};

use crate::utils::{quote, quote_if_needed};

/// Trait for emitting TypeScript code from AST nodes.
pub trait Emit {
    /// Convert the AST node to its TypeScript string representation.
    fn emit(&self) -> String;
}

/// JSDoc block at `indent`, or nothing for empty docs.
fn emit_docs(docs: &[String], indent: &str) -> String {
    if docs.is_empty() {
        return String::new();
    }
    let mut output = format!("{indent}/**\n");
    for line in docs {
        let line = line.replace("*/", "*\\/");
        if line.is_empty() {
            output.push_str(&format!("{indent} *\n"));
        } else {
            output.push_str(&format!("{indent} * {line}\n"));
        }
    }
    output.push_str(&format!("{indent} */\n"));
    output
}

fn export_keyword(is_export: bool) -> &'static str {
    if is_export { "export " } else { "" }
}

impl Emit for TsPrimitive {
    fn emit(&self) -> String {
        self.as_str().to_string()
    }
}

impl Emit for TsType {
    fn emit(&self) -> String {
        match self {
            TsType::Primitive(p) => p.emit(),
            TsType::Ref(expr) => expr.clone(),
        }
    }
}

impl Emit for TsProp {
    fn emit(&self) -> String {
        let key = quote_if_needed(&self.name);
        let opt = if self.optional { "?" } else { "" };
        format!("{key}{opt}: {}", self.ty.emit())
    }
}

impl Emit for TsTypeDef {
    fn emit(&self) -> String {
        let mut output = emit_docs(&self.docs, "");
        let export = export_keyword(self.is_export);
        match &self.kind {
            TypeDefKind::Interface { properties } => {
                output.push_str(&format!("{export}interface {} {{\n", self.name));
                for prop in properties {
                    output.push_str(&emit_docs(&prop.docs, "  "));
                    output.push_str(&format!("  {};\n", prop.emit()));
                }
                output.push_str("}\n");
            }
            TypeDefKind::TypeAlias { ty } => {
                output.push_str(&format!("{export}type {} = {};\n", self.name, ty.emit()));
            }
        }
        output
    }
}

impl Emit for TsParam {
    fn emit(&self) -> String {
        let opt = if self.optional { "?" } else { "" };
        match &self.ty {
            Some(ty) => format!("{}{opt}: {}", self.name, ty.emit()),
            None => format!("{}{opt}", self.name),
        }
    }
}

impl Emit for VarKind {
    fn emit(&self) -> String {
        match self {
            VarKind::Const => "const".to_string(),
            VarKind::Let => "let".to_string(),
            VarKind::Var => "var".to_string(),
        }
    }
}

impl Emit for TsVariable {
    fn emit(&self) -> String {
        let export = export_keyword(self.is_export);
        match &self.init {
            Some(init) => format!("{export}{} {} = {init};\n", self.kind.emit(), self.name),
            None => format!("{export}{} {};\n", self.kind.emit(), self.name),
        }
    }
}

impl Emit for TsFunction {
    fn emit(&self) -> String {
        let mut output = emit_docs(&self.docs, "");
        let params = self
            .params
            .iter()
            .map(Emit::emit)
            .collect::<Vec<_>>()
            .join(", ");
        let return_type = self
            .return_type
            .as_ref()
            .map(|t| format!(": {}", t.emit()))
            .unwrap_or_default();
        let async_str = if self.is_async { "async " } else { "" };

        output.push_str(&format!(
            "{}{async_str}function {}({params}){return_type}",
            export_keyword(self.is_export),
            self.name
        ));
        if self.body.is_empty() {
            output.push_str(" {}\n");
        } else {
            output.push_str(" {\n");
            for line in &self.body {
                // Multi-line body entries keep their own relative indentation.
                for inner in line.lines() {
                    if inner.is_empty() {
                        output.push('\n');
                    } else {
                        output.push_str(&format!("  {inner}\n"));
                    }
                }
            }
            output.push_str("}\n");
        }
        output
    }
}

impl Emit for ImportItem {
    fn emit(&self) -> String {
        match &self.alias {
            Some(alias) => format!("{} as {}", self.name, alias),
            None => self.name.clone(),
        }
    }
}

impl Emit for TsImport {
    fn emit(&self) -> String {
        let type_keyword = if self.type_only { "type " } else { "" };
        let mut clauses = Vec::new();
        if let Some(default) = &self.default {
            clauses.push(default.clone());
        }
        if let Some(namespace) = &self.namespace {
            clauses.push(format!("* as {namespace}"));
        }
        if !self.items.is_empty() {
            let items = self
                .items
                .iter()
                .map(Emit::emit)
                .collect::<Vec<_>>()
                .join(", ");
            clauses.push(format!("{{ {items} }}"));
        }

        let from = quote(&self.from);
        if clauses.is_empty() {
            format!("import {from};\n")
        } else {
            format!("import {type_keyword}{} from {from};\n", clauses.join(", "))
        }
    }
}

impl Emit for TsModule {
    fn emit(&self) -> String {
        let mut output = String::new();

        for line in &self.header {
            if line.is_empty() {
                output.push_str("//\n");
            } else {
                output.push_str(&format!("// {line}\n"));
            }
        }
        if !self.header.is_empty() {
            output.push('\n');
        }

        for import in &self.imports {
            output.push_str(&import.emit());
        }
        if !self.imports.is_empty() {
            output.push('\n');
        }

        for variable in &self.variables {
            output.push_str(&variable.emit());
        }
        if !self.variables.is_empty() {
            output.push('\n');
        }

        for type_def in &self.types {
            output.push_str(&type_def.emit());
            output.push('\n');
        }

        for func in &self.functions {
            output.push_str(&func.emit());
            output.push('\n');
        }

        // Exactly one trailing newline.
        let trimmed = output.trim_end_matches('\n').len();
        output.truncate(trimmed);
        output.push('\n');
        output
    }
}
