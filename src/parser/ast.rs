//! Lowered Go syntax.
//!
//! The recognizers never look at tree-sitter nodes. The provider lowers each
//! file into this closed set of node kinds, keeping only what the registration
//! shapes need: declarations, returns, assignments, composite literals, calls,
//! identifiers and qualified identifiers. Everything else becomes `Other`.

use std::path::PathBuf;

/// A type reference as written in a signature or literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(String),
    Qualified { package: String, name: String },
    Pointer(Box<TypeExpr>),
    Other,
}

impl TypeExpr {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn qualified(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Qualified {
            package: package.into(),
            name: name.into(),
        }
    }

    /// Identifier of the underlying named type, ignoring any pointer.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Qualified { name, .. } => Some(name),
            Self::Pointer(inner) => inner.base_name(),
            Self::Other => None,
        }
    }

    /// `pkg.Name` for qualified types, the bare name otherwise.
    pub fn qualified_name(&self) -> Option<String> {
        match self {
            Self::Named(name) => Some(name.clone()),
            Self::Qualified { package, name } => Some(format!("{}.{}", package, name)),
            Self::Pointer(_) | Self::Other => None,
        }
    }

    pub fn pointee(&self) -> Option<&TypeExpr> {
        match self {
            Self::Pointer(inner) => Some(inner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Ident(String),
    /// `pkg.Name` where the operand is a bare identifier.
    Qualified { qualifier: String, name: String },
    /// Field access on anything that is not a bare identifier, e.g. `a.b.c`.
    Selector { operand: Box<Expr>, field: String },
    /// String literal with quotes already stripped.
    Str(String),
    Call { callee: Box<Expr>, args: Vec<Expr> },
    Composite(CompositeLit),
    AddressOf(Box<Expr>),
    Other,
}

impl Expr {
    pub fn ident(name: impl Into<String>) -> Self {
        Self::Ident(name.into())
    }

    pub fn as_ident(&self) -> Option<&str> {
        match self {
            Self::Ident(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_composite(&self) -> Option<&CompositeLit> {
        match self {
            Self::Composite(lit) => Some(lit),
            _ => None,
        }
    }

    /// The trailing field name of `x.Field`, for both selector forms.
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Self::Qualified { name, .. } => Some(name),
            Self::Selector { field, .. } => Some(field),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeLit {
    pub ty: Option<TypeExpr>,
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Element {
    Keyed { key: Expr, value: Expr },
    Value(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stmt {
    Return(Vec<Expr>),
    /// `=`, `:=` and `var x = ...`, with targets and values paired by position.
    Assign { targets: Vec<Expr>, values: Vec<Expr> },
    /// Statements of a compound statement body (if/for/switch/block).
    Nested(Vec<Stmt>),
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receiver {
    pub name: Option<String>,
    pub type_name: String,
    pub pointer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuncDecl {
    pub name: String,
    pub receiver: Option<Receiver>,
    pub results: Vec<TypeExpr>,
    pub body: Vec<Stmt>,
}

impl FuncDecl {
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }

    /// True for methods on `type_name`, whether the receiver is `T` or `*T`.
    pub fn has_receiver_type(&self, type_name: &str) -> bool {
        self.receiver
            .as_ref()
            .map(|r| r.type_name == type_name)
            .unwrap_or(false)
    }
}

/// One parsed source file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceUnit {
    pub path: PathBuf,
    pub package_name: String,
    pub decls: Vec<FuncDecl>,
}

impl SourceUnit {
    pub fn declarations_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FuncDecl> + 'a {
        self.decls.iter().filter(move |d| d.name == name)
    }

    /// Receiver-less functions declared in this file.
    pub fn functions(&self) -> impl Iterator<Item = &FuncDecl> {
        self.decls.iter().filter(|d| !d.is_method())
    }
}
