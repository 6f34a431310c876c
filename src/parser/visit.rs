//! Traversal helpers shared by the recognizers.

use super::ast::{Expr, FuncDecl, Stmt};

/// Visit every statement of `body`, descending into nested blocks.
pub fn walk_stmts<'a, F>(body: &'a [Stmt], visit: &mut F)
where
    F: FnMut(&'a Stmt),
{
    for stmt in body {
        visit(stmt);
        if let Stmt::Nested(inner) = stmt {
            walk_stmts(inner, visit);
        }
    }
}

/// Every expression appearing in a `return` anywhere in the body.
pub fn returned_exprs(decl: &FuncDecl) -> Vec<&Expr> {
    let mut exprs = Vec::new();
    walk_stmts(&decl.body, &mut |stmt| {
        if let Stmt::Return(results) = stmt {
            exprs.extend(results.iter());
        }
    });
    exprs
}

/// Every `(target, value)` pair assigned in the body, paired by position.
pub fn assignments(decl: &FuncDecl) -> Vec<(&Expr, &Expr)> {
    let mut pairs = Vec::new();
    walk_stmts(&decl.body, &mut |stmt| {
        if let Stmt::Assign { targets, values } = stmt {
            pairs.extend(targets.iter().zip(values.iter()));
        }
    });
    pairs
}

/// Values assigned to the local `name`, in statement order.
pub fn values_assigned_to<'a>(decl: &'a FuncDecl, name: &str) -> Vec<&'a Expr> {
    assignments(decl)
        .into_iter()
        .filter(|(target, _)| target.as_ident() == Some(name))
        .map(|(_, value)| value)
        .collect()
}

/// What the function hands back: returned expressions, with a returned bare
/// identifier replaced by the values assigned to it in the same body.
pub fn returned_values(decl: &FuncDecl) -> Vec<&Expr> {
    let mut values = Vec::new();
    for expr in returned_exprs(decl) {
        match expr {
            Expr::Ident(name) => values.extend(values_assigned_to(decl, name)),
            other => values.push(other),
        }
    }
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::CompositeLit;

    fn lit() -> Expr {
        Expr::Composite(CompositeLit {
            ty: None,
            elements: Vec::new(),
        })
    }

    fn decl(body: Vec<Stmt>) -> FuncDecl {
        FuncDecl {
            name: "Resources".to_string(),
            receiver: None,
            results: Vec::new(),
            body,
        }
    }

    #[test]
    fn test_returned_values_follow_identifier() {
        let d = decl(vec![
            Stmt::Assign {
                targets: vec![Expr::ident("other"), Expr::ident("resources")],
                values: vec![Expr::Other, lit()],
            },
            Stmt::Return(vec![Expr::ident("resources")]),
        ]);

        let values = returned_values(&d);
        assert_eq!(values.len(), 1);
        assert!(values[0].as_composite().is_some());
    }

    #[test]
    fn test_returns_inside_nested_blocks() {
        let d = decl(vec![
            Stmt::Nested(vec![Stmt::Return(vec![Expr::ident("nil")])]),
            Stmt::Return(vec![lit()]),
        ]);

        assert_eq!(returned_exprs(&d).len(), 2);
        // `nil` has no assignment, so only the literal survives.
        assert_eq!(returned_values(&d).len(), 1);
    }
}
