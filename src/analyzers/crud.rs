//! Lifecycle callbacks of legacy `*pluginsdk.Resource` constructors.

use crate::parser::ast::{CompositeLit, Element, Expr, FuncDecl, Stmt, TypeExpr};
use crate::parser::visit;
use crate::parser::PackageSource;
use crate::types::{LegacyDataSourceMethods, LegacyResourceCrudMethods};

pub const DEFAULT_RESOURCE_CONFIG_TYPES: [&str; 2] = ["pluginsdk.Resource", "schema.Resource"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

/// `X`, `XContext`, `XFunc` and `XWithoutTimeout` all name the same operation.
fn operation_for(field: &str) -> Option<Operation> {
    let op = match field {
        "Create" | "CreateContext" | "CreateFunc" | "CreateWithoutTimeout" => Operation::Create,
        "Read" | "ReadContext" | "ReadFunc" | "ReadWithoutTimeout" => Operation::Read,
        "Update" | "UpdateContext" | "UpdateFunc" | "UpdateWithoutTimeout" => Operation::Update,
        "Delete" | "DeleteContext" | "DeleteFunc" | "DeleteWithoutTimeout" => Operation::Delete,
        _ => return None,
    };
    Some(op)
}

/// `fn` or `pkg.fn`, keeping only the trailing name.
fn callback_name(value: &Expr) -> Option<&str> {
    match value {
        Expr::Ident(name) => Some(name),
        Expr::Qualified { name, .. } => Some(name),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct CrudResolver {
    accepted_types: Vec<String>,
}

impl Default for CrudResolver {
    fn default() -> Self {
        Self::new(DEFAULT_RESOURCE_CONFIG_TYPES.iter().map(|s| s.to_string()))
    }
}

impl CrudResolver {
    /// `accepted_types` are two-part names such as `pluginsdk.Resource`.
    pub fn new<I, S>(accepted_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted_types: accepted_types.into_iter().map(Into::into).collect(),
        }
    }

    /// The single declared result type, if it is a pointer to an accepted config type.
    fn config_type<'d>(&self, decl: &'d FuncDecl) -> Option<&'d TypeExpr> {
        let [result] = decl.results.as_slice() else {
            return None;
        };
        let pointee = result.pointee()?;
        let name = pointee.qualified_name()?;
        self.accepted_types
            .iter()
            .any(|accepted| *accepted == name)
            .then_some(pointee)
    }

    /// Callbacks set on the configuration literal returned by `function`.
    ///
    /// `None` when the package has no such function or it does not return an
    /// accepted configuration type. Missing operations stay empty.
    pub fn resolve(&self, source: &PackageSource, function: &str) -> Option<LegacyResourceCrudMethods> {
        let decl = source.functions().find(|f| f.name == function)?;
        let config_type = self.config_type(decl)?;

        let mut methods = LegacyResourceCrudMethods::default();

        // Direct `return &T{...}` first, then `x = &T{...}` anywhere in the body.
        for expr in visit::returned_exprs(decl) {
            if let Some(lit) = address_of_literal(expr, config_type) {
                read_callbacks(lit, &mut methods);
            }
        }
        visit::walk_stmts(&decl.body, &mut |stmt| {
            if let Stmt::Assign { values, .. } = stmt {
                for value in values {
                    if let Some(lit) = address_of_literal(value, config_type) {
                        read_callbacks(lit, &mut methods);
                    }
                }
            }
        });

        Some(methods)
    }

    /// Legacy data sources share the constructor shape but only carry Read.
    pub fn resolve_data_source(&self, source: &PackageSource, function: &str) -> Option<LegacyDataSourceMethods> {
        self.resolve(source, function).map(LegacyDataSourceMethods::from)
    }
}

fn address_of_literal<'e>(expr: &'e Expr, config_type: &TypeExpr) -> Option<&'e CompositeLit> {
    let Expr::AddressOf(inner) = expr else {
        return None;
    };
    let lit = inner.as_composite()?;
    (lit.ty.as_ref() == Some(config_type)).then_some(lit)
}

fn read_callbacks(lit: &CompositeLit, methods: &mut LegacyResourceCrudMethods) {
    for element in &lit.elements {
        let Element::Keyed { key, value } = element else {
            continue;
        };
        let (Some(op), Some(callback)) = (key.as_ident().and_then(operation_for), callback_name(value)) else {
            continue;
        };
        let slot = match op {
            Operation::Create => &mut methods.create_method,
            Operation::Read => &mut methods.read_method,
            Operation::Update => &mut methods.update_method,
            Operation::Delete => &mut methods.delete_method,
        };
        *slot = callback.to_string();
    }
}
