//! Lowering
//!
//! This module is responsible for lowering the concrete tree down to the abstract tree
//! ([ast]). The main interface is the [lower] function.
//!
//! Lowering cannot fail: whatever the parser accepted has an abstract counterpart.

use tracing::{debug, warn};

use crate::{ast, cst, NodeId, NodeIdCounter, Span};

/// Name of the function that infix `+` is desugared into
pub const ADD_FUNCTION: &str = "add";

/// Turn the concrete tree into the abstract tree
pub fn lower(file: &cst::SourceFile) -> ast::SourceFile {
    let mut lowerer = Lowerer::default();
    lowerer.lower_source_file(file)
}

/// The main state during lowering
///
/// This state keeps track of which node ids are still fresh.
#[derive(Debug, Default)]
struct Lowerer {
    ids: NodeIdCounter,
}

impl Lowerer {
    fn lower_source_file(&mut self, file: &cst::SourceFile) -> ast::SourceFile {
        let mut opens = Vec::new();
        let mut functions = Vec::new();

        // attributes wait here for the declaration they belong to
        let mut pending: Vec<(ast::Ident, Span)> = Vec::new();

        for item in &file.items {
            match item {
                cst::ModuleItem::Attribute(attribute) => pending.push((
                    attribute.name.text.clone(),
                    attribute.at.span.join(attribute.name.span),
                )),
                cst::ModuleItem::Open(open) => {
                    let attributes = pending.drain(..).map(|(name, _)| name).collect();
                    opens.push(ast::OpenDecl {
                        id: self.fresh_id(),
                        module: open.module.text.clone(),
                        attributes,
                        span: open.open_kw.span.join(open.module.span),
                    });
                }
                cst::ModuleItem::Func(func) => {
                    let attributes = pending.drain(..).map(|(name, _)| name).collect();
                    functions.push(self.lower_function(func, attributes));
                }
                cst::ModuleItem::Skipped(_) => {}
            }
        }

        for (name, span) in pending {
            warn!("Dropping attribute @{name} at {span}, it is not followed by a declaration");
        }

        debug!(
            "Lowered {} opens and {} functions",
            opens.len(),
            functions.len()
        );
        ast::SourceFile { opens, functions }
    }

    fn lower_function(&mut self, func: &cst::FuncDecl, attributes: Vec<ast::Ident>) -> ast::FuncDecl {
        let id = self.fresh_id();

        let params = func
            .signature
            .params
            .iter()
            .map(|param| ast::FuncParam {
                id: self.fresh_id(),
                name: param.name.text.clone(),
                ty: param.ty.as_ref().map(|ann| self.lower_expr(&ann.ty)),
                span: param.name.span,
            })
            .collect();

        let ret = func
            .signature
            .ret
            .as_ref()
            .map(|ann| self.lower_expr(&ann.ty));
        let body = self.lower_expr(&func.body);

        ast::FuncDecl {
            id,
            name: func.name.text.clone(),
            attributes,
            params,
            ret,
            body,
            name_span: func.name.span,
            span: func.func_kw.span.join(func.body.span()),
        }
    }

    fn lower_expr(&mut self, expr: &cst::Expr) -> ast::Expr {
        let kind = match expr {
            cst::Expr::Ident(token) => ast::ExprKind::Ident(token.text.clone()),
            cst::Expr::Literal(token) => ast::ExprKind::Literal(token.text.clone()),

            // the parentheses only ever mattered to the parser
            cst::Expr::Grouped(grouped) => return self.lower_expr(&grouped.inner),

            cst::Expr::Call(call) => ast::ExprKind::Call {
                callee: Box::new(self.lower_expr(&call.callee)),
                args: call.args.iter().map(|arg| self.lower_expr(&arg.expr)).collect(),
            },
            cst::Expr::Add(add) => {
                let callee = ast::Expr {
                    id: self.fresh_id(),
                    kind: ast::ExprKind::Ident(ADD_FUNCTION.to_string()),
                    span: add.op.span,
                };
                ast::ExprKind::Call {
                    callee: Box::new(callee),
                    args: vec![self.lower_expr(&add.lhs), self.lower_expr(&add.rhs)],
                }
            }
            cst::Expr::Block(block) => {
                ast::ExprKind::Block(block.items.iter().map(|item| self.lower_stmt(item)).collect())
            }
        };

        ast::Expr {
            id: self.fresh_id(),
            kind,
            span: expr.span(),
        }
    }

    fn lower_stmt(&mut self, item: &cst::BlockItem) -> ast::Stmt {
        let kind = match item {
            cst::BlockItem::Let(stmt) => ast::StmtKind::Let(ast::LetStmt {
                name: stmt.name.text.clone(),
                ty: stmt.ty.as_ref().map(|ann| self.lower_expr(&ann.ty)),
                init: self.lower_expr(&stmt.init),
            }),
            cst::BlockItem::Return(stmt) => ast::StmtKind::Return(self.lower_expr(&stmt.value)),
            cst::BlockItem::Expr(stmt) => ast::StmtKind::Expr(self.lower_expr(&stmt.expr)),
        };

        ast::Stmt {
            id: self.fresh_id(),
            kind,
            span: item.span(),
        }
    }

    fn fresh_id(&mut self) -> NodeId {
        self.ids.fresh()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::ast::{ExprKind, StmtKind};
    use crate::parse;

    fn lower_source(src: &str) -> ast::SourceFile {
        lower(&parse(src).unwrap())
    }

    fn callee_name(expr: &ast::Expr) -> &str {
        let ExprKind::Call { callee, .. } = &expr.kind else {
            panic!("expected a call, got {expr:?}");
        };
        let ExprKind::Ident(name) = &callee.kind else {
            panic!("expected a named callee");
        };
        name
    }

    #[test]
    fn add_becomes_call() {
        let file = lower_source("func f() 1 + 2");
        let body = &file.functions[0].body;
        assert_eq!(callee_name(body), ADD_FUNCTION);

        let ExprKind::Call { args, .. } = &body.kind else {
            unreachable!()
        };
        assert_eq!(args[0].kind, ExprKind::Literal(String::from("1")));
        assert_eq!(args[1].kind, ExprKind::Literal(String::from("2")));
    }

    #[test]
    fn groupings_are_elided() {
        let file = lower_source("func f() ((x))");
        assert_eq!(file.functions[0].body.kind, ExprKind::Ident(String::from("x")));
    }

    #[test]
    fn nested_addition_keeps_grouping_order() {
        let file = lower_source("func f() a + (b + c)");
        let body = &file.functions[0].body;
        let ExprKind::Call { args, .. } = &body.kind else {
            panic!("expected a call");
        };
        assert_eq!(args[0].kind, ExprKind::Ident(String::from("a")));
        assert_eq!(callee_name(&args[1]), ADD_FUNCTION);
    }

    #[test]
    fn items_are_split_in_order() {
        let file = lower_source("open a func f() 1 open b func g() 2");
        let opens: Vec<_> = file.opens.iter().map(|o| o.module.as_str()).collect();
        let funcs: Vec<_> = file.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(opens, vec!["a", "b"]);
        assert_eq!(funcs, vec!["f", "g"]);
    }

    #[test]
    fn attributes_attach_to_next_declaration() {
        let file = lower_source("@vertex @inline func f() 1 func g() 2 @dangling");
        assert_eq!(file.functions[0].attributes, vec!["vertex", "inline"]);
        assert!(file.functions[1].attributes.is_empty());
    }

    #[test]
    fn block_statements() {
        let file = lower_source("func f() { let x: int = 1; x; return x; }");
        let ExprKind::Block(stmts) = &file.functions[0].body.kind else {
            panic!("expected a block");
        };

        let StmtKind::Let(stmt) = &stmts[0].kind else {
            panic!("expected a let");
        };
        assert_eq!(stmt.name, "x");
        assert!(stmt.ty.is_some());
        assert!(matches!(stmts[1].kind, StmtKind::Expr(_)));
        assert!(matches!(stmts[2].kind, StmtKind::Return(_)));
    }

    #[test]
    fn node_ids_are_unique() {
        fn collect(expr: &ast::Expr, ids: &mut Vec<NodeId>) {
            ids.push(expr.id);
            match &expr.kind {
                ExprKind::Ident(_) | ExprKind::Literal(_) => {}
                ExprKind::Call { callee, args } => {
                    collect(callee, ids);
                    args.iter().for_each(|arg| collect(arg, ids));
                }
                ExprKind::Block(stmts) => {
                    for stmt in stmts {
                        ids.push(stmt.id);
                        match &stmt.kind {
                            StmtKind::Let(stmt) => {
                                stmt.ty.iter().for_each(|ty| collect(ty, ids));
                                collect(&stmt.init, ids);
                            }
                            StmtKind::Return(expr) | StmtKind::Expr(expr) => collect(expr, ids),
                        }
                    }
                }
            }
        }

        let file = lower_source("func f(a: int): int { let b = a + 1; return f(b + a); }");
        let func = &file.functions[0];
        let mut ids = vec![func.id];
        for param in &func.params {
            ids.push(param.id);
            param.ty.iter().for_each(|ty| collect(ty, &mut ids));
        }
        func.ret.iter().for_each(|ret| collect(ret, &mut ids));
        collect(&func.body, &mut ids);

        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), ids.len());
    }
}
