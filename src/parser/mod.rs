//! Source loading and the lowered syntax tree the analyzers consume.

pub mod ast;
pub mod go;
pub mod visit;

use std::path::PathBuf;

use crate::types::Result;
pub use ast::{CompositeLit, Element, Expr, FuncDecl, Receiver, SourceUnit, Stmt, TypeExpr};
pub use go::{parse_source, GoParser, GoSyntaxProvider};

/// A package directory queued for scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageDir {
    /// Directory name, used as the service name.
    pub service_name: String,
    pub path: PathBuf,
    /// Import path recorded as the entity namespace.
    pub import_path: String,
}

/// Every parsed file of one package, in provider order.
#[derive(Debug, Clone, Default)]
pub struct PackageSource {
    pub service_name: String,
    pub import_path: String,
    pub units: Vec<SourceUnit>,
}

impl PackageSource {
    /// Receiver-less functions across all files.
    pub fn functions(&self) -> impl Iterator<Item = &FuncDecl> {
        self.units.iter().flat_map(SourceUnit::functions)
    }

    /// All declarations, methods included.
    pub fn declarations(&self) -> impl Iterator<Item = &FuncDecl> {
        self.units.iter().flat_map(|u| u.decls.iter())
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Turns a package directory into lowered syntax trees.
///
/// Implementations are shared across scan workers.
pub trait SyntaxProvider: Send + Sync {
    fn load_package(&self, dir: &PackageDir) -> Result<PackageSource>;
}
