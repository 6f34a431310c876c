//! tree-sitter based Go front end.
//!
//! Parses one file with `tree-sitter-go` and lowers the concrete syntax tree
//! into [`SourceUnit`]. Only function and method declarations survive; the
//! statements inside them keep returns, assignments and compound-statement
//! bodies, everything else is `Stmt::Other`.

use std::fs;
use std::path::Path;
use tracing::{debug, warn};
use tree_sitter::{Node, Parser};
use walkdir::WalkDir;

use super::ast::{CompositeLit, Element, Expr, FuncDecl, Receiver, SourceUnit, Stmt, TypeExpr};
use super::{PackageDir, PackageSource, SyntaxProvider};
use crate::types::{IndexError, Result};

/// A reusable tree-sitter parser configured for Go.
pub struct GoParser {
    parser: Parser,
}

impl GoParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(tree_sitter_go::language())
            .map_err(|e| IndexError::Language(e.to_string()))?;
        Ok(Self { parser })
    }

    pub fn parse(&mut self, path: &Path, source: &str) -> Result<SourceUnit> {
        let tree = self.parser.parse(source, None).ok_or_else(|| IndexError::Parse {
            path: path.to_path_buf(),
            message: "parser produced no tree".to_string(),
        })?;

        let root = tree.root_node();
        if root.has_error() {
            warn!("Syntax errors in {}, indexing what parsed", path.display());
        }

        let lowerer = Lowerer {
            src: source.as_bytes(),
        };
        Ok(lowerer.source_unit(path, root))
    }
}

/// Parse and lower a single Go file.
pub fn parse_source(path: &Path, source: &str) -> Result<SourceUnit> {
    GoParser::new()?.parse(path, source)
}

/// Loads every `.go` file directly inside a package directory.
#[derive(Debug, Clone, Default)]
pub struct GoSyntaxProvider {
    include_test_files: bool,
}

impl GoSyntaxProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_test_files(mut self, include: bool) -> Self {
        self.include_test_files = include;
        self
    }

    fn wants(&self, path: &Path) -> bool {
        let name = match path.file_name().and_then(|n| n.to_str()) {
            Some(name) => name,
            None => return false,
        };
        name.ends_with(".go") && (self.include_test_files || !name.ends_with("_test.go"))
    }
}

impl SyntaxProvider for GoSyntaxProvider {
    fn load_package(&self, dir: &PackageDir) -> Result<PackageSource> {
        let mut parser = GoParser::new()?;
        let mut units = Vec::new();

        let walker = WalkDir::new(&dir.path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(dir.path.as_path()).to_path_buf();
                match e.into_io_error() {
                    Some(source) => IndexError::io(path, source),
                    None => IndexError::store(path, "filesystem loop"),
                }
            })?;

            if !entry.file_type().is_file() || !self.wants(entry.path()) {
                continue;
            }

            let source = fs::read_to_string(entry.path()).map_err(|e| IndexError::io(entry.path(), e))?;
            units.push(parser.parse(entry.path(), &source)?);
        }

        debug!("Loaded {} Go files from {}", units.len(), dir.path.display());

        Ok(PackageSource {
            service_name: dir.service_name.clone(),
            import_path: dir.import_path.clone(),
            units,
        })
    }
}

struct Lowerer<'s> {
    src: &'s [u8],
}

impl<'s> Lowerer<'s> {
    fn text(&self, node: Node) -> &'s str {
        node.utf8_text(self.src).unwrap_or_default()
    }

    fn source_unit(&self, path: &Path, root: Node) -> SourceUnit {
        let mut unit = SourceUnit {
            path: path.to_path_buf(),
            ..SourceUnit::default()
        };

        for child in named(root) {
            match child.kind() {
                "package_clause" => {
                    if let Some(ident) = named(child).first() {
                        unit.package_name = self.text(*ident).to_string();
                    }
                }
                "function_declaration" | "method_declaration" => {
                    if let Some(decl) = self.func_decl(child) {
                        unit.decls.push(decl);
                    }
                }
                _ => {}
            }
        }

        unit
    }

    fn func_decl(&self, node: Node) -> Option<FuncDecl> {
        let name = self.text(node.child_by_field_name("name")?).to_string();
        let receiver = node
            .child_by_field_name("receiver")
            .and_then(|r| self.receiver(r));
        let results = node
            .child_by_field_name("result")
            .map(|r| self.results(r))
            .unwrap_or_default();
        let body = node
            .child_by_field_name("body")
            .map(|b| self.block(b))
            .unwrap_or_default();

        Some(FuncDecl {
            name,
            receiver,
            results,
            body,
        })
    }

    fn receiver(&self, params: Node) -> Option<Receiver> {
        let decl = named(params)
            .into_iter()
            .find(|n| n.kind() == "parameter_declaration")?;
        let ty = self.type_expr(decl.child_by_field_name("type")?);
        let type_name = ty.base_name()?.to_string();

        Some(Receiver {
            name: decl.child_by_field_name("name").map(|n| self.text(n).to_string()),
            type_name,
            pointer: ty.pointee().is_some(),
        })
    }

    /// One entry per declared result, so `(a, b int)` counts twice.
    fn results(&self, node: Node) -> Vec<TypeExpr> {
        if node.kind() != "parameter_list" {
            return vec![self.type_expr(node)];
        }

        let mut results = Vec::new();
        for decl in named(node) {
            let ty = match decl.child_by_field_name("type") {
                Some(ty) => self.type_expr(ty),
                None => continue,
            };
            let mut cursor = decl.walk();
            let names = decl.children_by_field_name("name", &mut cursor).count().max(1);
            results.extend(std::iter::repeat(ty).take(names));
        }
        results
    }

    fn type_expr(&self, node: Node) -> TypeExpr {
        match node.kind() {
            "type_identifier" => TypeExpr::named(self.text(node)),
            "qualified_type" => match (
                node.child_by_field_name("package"),
                node.child_by_field_name("name"),
            ) {
                (Some(package), Some(name)) => TypeExpr::qualified(self.text(package), self.text(name)),
                _ => TypeExpr::Other,
            },
            "pointer_type" => match named(node).first() {
                Some(inner) => TypeExpr::Pointer(Box::new(self.type_expr(*inner))),
                None => TypeExpr::Other,
            },
            "generic_type" => node
                .child_by_field_name("type")
                .map(|t| self.type_expr(t))
                .unwrap_or(TypeExpr::Other),
            "parenthesized_type" => named(node)
                .first()
                .map(|t| self.type_expr(*t))
                .unwrap_or(TypeExpr::Other),
            _ => TypeExpr::Other,
        }
    }

    /// Statements of a block, whether or not the grammar wraps them in a
    /// `statement_list`.
    fn block(&self, node: Node) -> Vec<Stmt> {
        named(node)
            .into_iter()
            .flat_map(|child| match child.kind() {
                "statement_list" => self.block(child),
                _ => vec![self.stmt(child)],
            })
            .collect()
    }

    fn stmt(&self, node: Node) -> Stmt {
        match node.kind() {
            "return_statement" => self.with_closures(
                node,
                Stmt::Return(
                    named(node)
                        .into_iter()
                        .flat_map(|child| self.expr_list(child))
                        .collect(),
                ),
            ),
            "short_var_declaration" | "assignment_statement" => {
                let targets = node
                    .child_by_field_name("left")
                    .map(|n| self.expr_list(n))
                    .unwrap_or_default();
                let values = node
                    .child_by_field_name("right")
                    .map(|n| self.expr_list(n))
                    .unwrap_or_default();
                self.with_closures(node, Stmt::Assign { targets, values })
            }
            "var_declaration" => self.with_closures(node, Stmt::Nested(self.var_specs(node))),
            "expression_statement" | "go_statement" | "defer_statement" => {
                self.with_closures(node, Stmt::Other)
            }
            "block" | "statement_list" => Stmt::Nested(self.block(node)),
            "if_statement" => {
                let mut inner = Vec::new();
                for field in ["initializer", "consequence", "alternative"] {
                    if let Some(child) = node.child_by_field_name(field) {
                        inner.push(self.stmt(child));
                    }
                }
                Stmt::Nested(inner)
            }
            "for_statement" => Stmt::Nested(
                node.child_by_field_name("body")
                    .map(|b| self.block(b))
                    .unwrap_or_default(),
            ),
            "expression_switch_statement" | "type_switch_statement" | "select_statement" => {
                let mut inner = Vec::new();
                for case in named(node) {
                    if matches!(
                        case.kind(),
                        "expression_case" | "default_case" | "type_case" | "communication_case"
                    ) {
                        inner.extend(self.block(case));
                    }
                }
                Stmt::Nested(inner)
            }
            "labeled_statement" => named(node)
                .last()
                .map(|s| self.stmt(*s))
                .unwrap_or(Stmt::Other),
            _ => Stmt::Other,
        }
    }

    /// Pairs `stmt` with the bodies of any function literals inside `node`.
    fn with_closures(&self, node: Node, stmt: Stmt) -> Stmt {
        let bodies = self.closure_bodies(node);
        if bodies.is_empty() {
            return stmt;
        }
        let mut nested = vec![stmt];
        nested.extend(bodies);
        Stmt::Nested(nested)
    }

    fn closure_bodies(&self, node: Node) -> Vec<Stmt> {
        let mut bodies = Vec::new();
        for child in named(node) {
            if child.kind() != "func_literal" {
                bodies.extend(self.closure_bodies(child));
                continue;
            }
            if let Some(body) = child.child_by_field_name("body") {
                bodies.push(Stmt::Nested(self.block(body)));
            }
        }
        bodies
    }

    fn var_specs(&self, node: Node) -> Vec<Stmt> {
        let mut stmts = Vec::new();
        for child in named(node) {
            match child.kind() {
                "var_spec" => {
                    let mut cursor = child.walk();
                    let targets = child
                        .children_by_field_name("name", &mut cursor)
                        .map(|n| Expr::ident(self.text(n)))
                        .collect();
                    let values = child
                        .child_by_field_name("value")
                        .map(|v| self.expr_list(v))
                        .unwrap_or_default();
                    stmts.push(Stmt::Assign { targets, values });
                }
                "var_spec_list" => stmts.extend(self.var_specs(child)),
                _ => {}
            }
        }
        stmts
    }

    fn expr_list(&self, node: Node) -> Vec<Expr> {
        match node.kind() {
            "expression_list" => named(node).into_iter().map(|n| self.expr(n)).collect(),
            _ => vec![self.expr(node)],
        }
    }

    fn expr(&self, node: Node) -> Expr {
        match node.kind() {
            "identifier" | "field_identifier" | "type_identifier" | "package_identifier" => {
                Expr::ident(self.text(node))
            }
            "selector_expression" => {
                let field = match node.child_by_field_name("field") {
                    Some(field) => self.text(field).to_string(),
                    None => return Expr::Other,
                };
                match node.child_by_field_name("operand") {
                    Some(operand) if operand.kind() == "identifier" => Expr::Qualified {
                        qualifier: self.text(operand).to_string(),
                        name: field,
                    },
                    Some(operand) => Expr::Selector {
                        operand: Box::new(self.expr(operand)),
                        field,
                    },
                    None => Expr::Other,
                }
            }
            "interpreted_string_literal" => Expr::Str(unquote(self.text(node))),
            "raw_string_literal" => Expr::Str(self.text(node).trim_matches('`').to_string()),
            "call_expression" => {
                let callee = match node.child_by_field_name("function") {
                    Some(f) => self.expr(f),
                    None => return Expr::Other,
                };
                let args = node
                    .child_by_field_name("arguments")
                    .map(|a| named(a).into_iter().map(|n| self.expr(n)).collect())
                    .unwrap_or_default();
                Expr::Call {
                    callee: Box::new(callee),
                    args,
                }
            }
            "composite_literal" => {
                let ty = node.child_by_field_name("type").map(|t| self.type_expr(t));
                let elements = node
                    .child_by_field_name("body")
                    .map(|b| self.elements(b))
                    .unwrap_or_default();
                Expr::Composite(CompositeLit { ty, elements })
            }
            // Elided element type inside an outer literal.
            "literal_value" => Expr::Composite(CompositeLit {
                ty: None,
                elements: self.elements(node),
            }),
            "unary_expression" => {
                let is_address = node
                    .child_by_field_name("operator")
                    .map(|op| self.text(op) == "&")
                    .unwrap_or(false);
                match node.child_by_field_name("operand") {
                    Some(operand) if is_address => Expr::AddressOf(Box::new(self.expr(operand))),
                    _ => Expr::Other,
                }
            }
            "parenthesized_expression" | "element" | "literal_element" => named(node)
                .first()
                .map(|n| self.expr(*n))
                .unwrap_or(Expr::Other),
            _ => Expr::Other,
        }
    }

    fn elements(&self, body: Node) -> Vec<Element> {
        named(body)
            .into_iter()
            .map(|child| {
                if child.kind() != "keyed_element" {
                    return Element::Value(self.expr(child));
                }
                let parts = named(child);
                let key = child.child_by_field_name("key").or_else(|| parts.first().copied());
                let value = child.child_by_field_name("value").or_else(|| parts.get(1).copied());
                match (key, value) {
                    (Some(key), Some(value)) => Element::Keyed {
                        key: self.expr(key),
                        value: self.expr(value),
                    },
                    _ => Element::Value(Expr::Other),
                }
            })
            .collect()
    }
}

/// Named children without comments.
fn named(node: Node) -> Vec<Node> {
    let mut cursor = node.walk();
    let children = node
        .named_children(&mut cursor)
        .filter(|n| n.kind() != "comment")
        .collect();
    children
}

/// Decode a Go interpreted string literal.
///
/// `\x` and octal escapes are raw bytes, so the result is assembled as bytes
/// and decoded lossily. Malformed escapes are kept as written.
fn unquote(literal: &str) -> String {
    let inner = literal
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(literal);

    let mut out: Vec<u8> = Vec::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            push_char(&mut out, c);
            continue;
        }
        let Some(escape) = chars.next() else {
            out.push(b'\\');
            break;
        };
        match escape {
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0b),
            '\\' | '\'' | '"' => push_char(&mut out, escape),
            'x' | 'u' | 'U' | '0'..='7' => match numeric_escape(escape, &chars) {
                Some((width, decoded)) => {
                    chars.nth(width - 1);
                    match decoded {
                        Decoded::Byte(byte) => out.push(byte),
                        Decoded::Char(c) => push_char(&mut out, c),
                    }
                }
                None => {
                    out.push(b'\\');
                    push_char(&mut out, escape);
                }
            },
            other => {
                out.push(b'\\');
                push_char(&mut out, other);
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn push_char(out: &mut Vec<u8>, c: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
}

enum Decoded {
    Byte(u8),
    Char(char),
}

/// Width and value of the digits after `\x`, `\u`, `\U` or an octal lead
/// digit, checked against Go's ranges. Nothing is consumed.
fn numeric_escape(escape: char, chars: &std::str::Chars) -> Option<(usize, Decoded)> {
    match escape {
        'x' => peek_digits(chars, 2, 16)
            .and_then(|v| u8::try_from(v).ok())
            .map(|b| (2, Decoded::Byte(b))),
        'u' => peek_digits(chars, 4, 16)
            .and_then(char::from_u32)
            .map(|c| (4, Decoded::Char(c))),
        'U' => peek_digits(chars, 8, 16)
            .and_then(char::from_u32)
            .map(|c| (8, Decoded::Char(c))),
        _ => {
            let high = escape.to_digit(8)?;
            let low = peek_digits(chars, 2, 8)?;
            u8::try_from(high * 64 + low).ok().map(|b| (2, Decoded::Byte(b)))
        }
    }
}

/// The next `count` characters read as digits in `radix`, without consuming them.
fn peek_digits(chars: &std::str::Chars, count: usize, radix: u32) -> Option<u32> {
    let digits = chars.as_str().get(..count)?;
    if !digits.chars().all(|d| d.is_digit(radix)) {
        return None;
    }
    u32::from_str_radix(digits, radix).ok()
}
