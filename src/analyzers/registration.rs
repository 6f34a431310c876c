//! Recognizers for the five registration shapes.
//!
//! Each one looks at every declaration in a file carrying the target name,
//! whatever its receiver, and reads the literal it returns. A file without
//! the declaration yields an empty result.

use std::collections::BTreeMap;

use crate::parser::ast::{CompositeLit, Element, Expr, SourceUnit, TypeExpr};
use crate::parser::visit;
use crate::types::RegistrationShape;

/// Returned literals of every declaration named `method`, in file order.
fn returned_literals<'a>(unit: &'a SourceUnit, method: &'a str) -> Vec<&'a CompositeLit> {
    unit.declarations_named(method)
        .flat_map(visit::returned_values)
        .filter_map(Expr::as_composite)
        .collect()
}

/// `map[string]*T{"x_name": resourceName(), ...}` → `{"x_name": "resourceName"}`.
///
/// Keys must be string literals and values must be calls to a plain
/// identifier; other pairs are skipped. The last duplicate key wins.
pub fn extract_table(unit: &SourceUnit, method: &str) -> BTreeMap<String, String> {
    let mut table = BTreeMap::new();
    for lit in returned_literals(unit, method) {
        for element in &lit.elements {
            if let Element::Keyed {
                key: Expr::Str(key),
                value: Expr::Call { callee, .. },
            } = element
            {
                if let Some(function) = callee.as_ident() {
                    table.insert(key.clone(), function.to_string());
                }
            }
        }
    }
    table
}

/// `[]sdk.Resource{FooResource{}, BarResource{}}` → `["FooResource", "BarResource"]`.
pub fn extract_struct_list(unit: &SourceUnit, method: &str) -> Vec<String> {
    let mut names = Vec::new();
    for lit in returned_literals(unit, method) {
        for element in &lit.elements {
            if let Element::Value(Expr::Composite(CompositeLit {
                ty: Some(TypeExpr::Named(name)),
                ..
            })) = element
            {
                names.push(name.clone());
            }
        }
    }
    names
}

/// `[]func() ephemeral.EphemeralResource{NewFoo, NewBar}` → `["NewFoo", "NewBar"]`.
pub fn extract_function_list(unit: &SourceUnit, method: &str) -> Vec<String> {
    let mut names = Vec::new();
    for lit in returned_literals(unit, method) {
        for element in &lit.elements {
            if let Element::Value(Expr::Ident(name)) = element {
                names.push(name.clone());
            }
        }
    }
    names
}

/// What one file contributes, before package-level merging.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileFindings {
    pub supported_resources: BTreeMap<String, String>,
    pub supported_data_sources: BTreeMap<String, String>,
    pub resources: Vec<String>,
    pub data_sources: Vec<String>,
    pub ephemeral_resources: Vec<String>,
}

impl FileFindings {
    pub fn is_empty(&self) -> bool {
        self.supported_resources.is_empty()
            && self.supported_data_sources.is_empty()
            && self.resources.is_empty()
            && self.data_sources.is_empty()
            && self.ephemeral_resources.is_empty()
    }
}

/// Run all five recognizers over one file.
pub fn recognize(unit: &SourceUnit) -> FileFindings {
    let mut findings = FileFindings::default();
    for shape in RegistrationShape::ALL {
        let method = shape.method_name();
        match shape {
            RegistrationShape::SupportedResources => {
                findings.supported_resources = extract_table(unit, method)
            }
            RegistrationShape::SupportedDataSources => {
                findings.supported_data_sources = extract_table(unit, method)
            }
            RegistrationShape::Resources => findings.resources = extract_struct_list(unit, method),
            RegistrationShape::DataSources => {
                findings.data_sources = extract_struct_list(unit, method)
            }
            RegistrationShape::EphemeralResources => {
                findings.ephemeral_resources = extract_function_list(unit, method)
            }
        }
    }
    findings
}
