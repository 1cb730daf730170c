//! Code generation
//!
//! This module turns a resolved and type checked [ast::SourceFile] into C-like source text.
//! The main interface is [emit].
//!
//! Every function that is called somewhere gets a forward declaration at the top, in
//! the order the calls are first emitted, so definitions can come in source order.

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::resolving::{Resolution, SigId, Symbol};
use crate::type_checking::TypeTable;
use crate::types::{PrimTag, Type};
use crate::{ast, Span};

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum CodegenError {
    #[error("The type {ty} is unsupported by the target")]
    UnsupportedType {
        ty: Type,

        #[label("has type {ty}")]
        span: Span,
    },

    /// The checker already rejects such callees with `NotCallable`, so this only fires
    /// for trees that changed after type checking
    #[error("Only calls of a function by its name can be emitted")]
    NotNormalForm {
        #[label("callee")]
        span: Span,
    },

    #[error("A block can only be emitted as a function body")]
    #[diagnostic(help("Bind the value with `let` in the function body instead"))]
    BlockInExpression {
        #[label]
        span: Span,
    },

    #[error("Missing type information")]
    Untyped {
        #[label]
        span: Span,
    },
}

type Result<T> = std::result::Result<T, CodegenError>;

/// Emit target text for a checked source file
pub fn emit(file: &ast::SourceFile, resolution: &Resolution, types: &TypeTable) -> Result<String> {
    let mut emitter = Emitter {
        resolution,
        types,
        callees: Vec::new(),
    };

    let mut definitions = Vec::with_capacity(file.functions.len());
    for func in &file.functions {
        definitions.push(emitter.emit_function(func)?);
    }

    let mut lines = emitter.forward_declarations()?;
    lines.extend(definitions);

    let mut output = lines.join("\n");
    output.push('\n');
    Ok(output)
}

/// Name of a primitive in the target language
fn target_type(ty: &Type, span: Span) -> Result<&'static str> {
    match ty.primitive() {
        Some(PrimTag::Int) => Ok("int"),
        Some(PrimTag::Uint) => Ok("unsigned int"),
        Some(PrimTag::Float) => Ok("float"),
        Some(PrimTag::Unit) => Ok("void"),
        Some(PrimTag::Float3) | None => Err(CodegenError::UnsupportedType {
            ty: ty.clone(),
            span,
        }),
    }
}

struct Emitter<'a> {
    resolution: &'a Resolution,
    types: &'a TypeTable,

    /// Called functions, first call first, each name once
    callees: Vec<(String, SigId, Span)>,
}

impl Emitter<'_> {
    fn emit_function(&mut self, func: &ast::FuncDecl) -> Result<String> {
        let untyped = || CodegenError::Untyped {
            span: func.name_span,
        };

        let (resolution, types) = (self.resolution, self.types);
        let sig = resolution.function(func.id).ok_or_else(untyped)?;
        let ret = types.return_type(sig).ok_or_else(untyped)?;
        let ret_name = target_type(ret, func.name_span)?;

        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            let ty = resolution
                .annotation(param.id)
                .ok_or(CodegenError::Untyped { span: param.span })?;
            params.push(format!("{} {}", target_type(ty, param.span)?, param.name));
        }

        let body = match &func.body.kind {
            ast::ExprKind::Block(stmts) => {
                let mut items = Vec::with_capacity(stmts.len());
                for stmt in stmts {
                    items.push(self.emit_stmt(stmt)?);
                }
                items.join(" ")
            }
            _ => {
                let value = self.emit_expr(&func.body)?;
                if ret.primitive() == Some(PrimTag::Unit) {
                    format!("{value};")
                } else {
                    format!("{ret_name} ret = {value}; return ret;")
                }
            }
        };

        Ok(format!(
            "{ret_name} {}({}) {{ {body} }}",
            func.name,
            params.join(", ")
        ))
    }

    fn emit_stmt(&mut self, stmt: &ast::Stmt) -> Result<String> {
        match &stmt.kind {
            ast::StmtKind::Let(binding) => {
                let types = self.types;
                let ty = types
                    .binding(stmt.id)
                    .ok_or(CodegenError::Untyped { span: stmt.span })?;
                // `void x = ...` has no meaning in the target
                if ty.primitive() == Some(PrimTag::Unit) {
                    return Err(CodegenError::UnsupportedType {
                        ty: ty.clone(),
                        span: stmt.span,
                    });
                }
                Ok(format!(
                    "{} {} = {};",
                    target_type(ty, stmt.span)?,
                    binding.name,
                    self.emit_expr(&binding.init)?
                ))
            }
            ast::StmtKind::Return(value) => Ok(format!("return {};", self.emit_expr(value)?)),
            ast::StmtKind::Expr(expr) => Ok(format!("{};", self.emit_expr(expr)?)),
        }
    }

    fn emit_expr(&mut self, expr: &ast::Expr) -> Result<String> {
        match &expr.kind {
            ast::ExprKind::Ident(name) => Ok(name.clone()),
            ast::ExprKind::Literal(text) => Ok(text.clone()),
            ast::ExprKind::Call { callee, args } => {
                let ast::ExprKind::Ident(name) = &callee.kind else {
                    return Err(CodegenError::NotNormalForm { span: callee.span });
                };
                let Some(&Symbol::Function(sig)) = self.resolution.binding(callee.id) else {
                    return Err(CodegenError::NotNormalForm { span: callee.span });
                };
                self.register(name, sig, callee.span);

                let mut emitted = Vec::with_capacity(args.len());
                for arg in args {
                    emitted.push(self.emit_expr(arg)?);
                }
                Ok(format!("{name}({})", emitted.join(", ")))
            }
            ast::ExprKind::Block(_) => Err(CodegenError::BlockInExpression { span: expr.span }),
        }
    }

    fn register(&mut self, name: &str, sig: SigId, span: Span) {
        if self.callees.iter().any(|(known, _, _)| known == name) {
            return;
        }
        debug!("Registering forward declaration of {name}");
        self.callees.push((name.to_string(), sig, span));
    }

    fn forward_declarations(&self) -> Result<Vec<String>> {
        self.callees
            .iter()
            .map(|(name, sig_id, span)| {
                let untyped = || CodegenError::Untyped { span: *span };

                let sig = self.resolution.signature(*sig_id).ok_or_else(untyped)?;
                let ret = self.types.return_type(*sig_id).ok_or_else(untyped)?;

                let params = sig
                    .params
                    .iter()
                    .map(|ty| target_type(ty, *span))
                    .collect::<Result<Vec<_>>>()?;

                Ok(format!(
                    "{} {name}({});",
                    target_type(ret, *span)?,
                    params.join(", ")
                ))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolving::{resolve, ModuleRegistry};
    use crate::type_checking::type_check;
    use crate::{lower, parse};

    fn emit_source(src: &str) -> Result<String> {
        let file = lower(&parse(src).unwrap());
        let resolution = resolve(&file, &ModuleRegistry::with_std()).unwrap();
        let types = type_check(&file, &resolution).unwrap();
        emit(&file, &resolution, &types)
    }

    #[test]
    fn expression_body() {
        assert_eq!(
            emit_source("open std func one(): int 1").unwrap(),
            "int one() { int ret = 1; return ret; }\n"
        );
    }

    #[test]
    fn block_body() {
        assert_eq!(
            emit_source("open std func f(x: int, y: float): int { let z: float = y; return x; }")
                .unwrap(),
            "int f(int x, float y) { float z = y; return x; }\n"
        );
    }

    #[test]
    fn empty_block_is_void() {
        assert_eq!(emit_source("func f() { }").unwrap(), "void f() {  }\n");
    }

    #[test]
    fn unit_expression_body() {
        assert_eq!(
            emit_source("func g() { } func f() g()").unwrap(),
            "void g();\nvoid g() {  }\nvoid f() { g(); }\n"
        );
    }

    #[test]
    fn forward_declarations_are_deduplicated() {
        let out = emit_source(
            "open std func f(a: int): int { let b = a + a; return b + inc(b); } func inc(x: int): int x + 1",
        )
        .unwrap();
        assert_eq!(
            out,
            "int add(int, int);\n\
             int inc(int);\n\
             int f(int a) { int b = add(a, a); return add(b, inc(b)); }\n\
             int inc(int x) { int ret = add(x, 1); return ret; }\n"
        );
    }

    #[test]
    fn uint_params() {
        assert_eq!(
            emit_source("open std func f(a: uint) addu(a, 1)").unwrap(),
            "int addu(unsigned int, int);\nint f(unsigned int a) { int ret = addu(a, 1); return ret; }\n"
        );
    }

    #[test]
    fn float3_is_unsupported() {
        let err = emit_source("open std func f(v: float3): float3 v").unwrap_err();
        assert!(matches!(err, CodegenError::UnsupportedType { .. }));
    }

    #[test]
    fn unit_let_is_unsupported() {
        let err = emit_source("func g() { } func f() { let x = g(); return 1; }").unwrap_err();
        assert!(matches!(
            err,
            CodegenError::UnsupportedType { ty, .. } if ty == Type::UNIT
        ));
    }

    #[test]
    fn callee_must_be_a_name() {
        let mut file = lower(&parse("open std func f(): int add(1, 2)").unwrap());
        let resolution = resolve(&file, &ModuleRegistry::with_std()).unwrap();
        let types = type_check(&file, &resolution).unwrap();

        let ast::ExprKind::Call { callee, .. } = &mut file.functions[0].body.kind else {
            panic!("expected a call");
        };
        callee.kind = ast::ExprKind::Literal(String::from("1"));

        let err = emit(&file, &resolution, &types).unwrap_err();
        assert!(matches!(err, CodegenError::NotNormalForm { .. }));
    }

    #[test]
    fn block_in_argument() {
        let err = emit_source("open std func f() add({ return 1; }, 2)").unwrap_err();
        assert!(matches!(err, CodegenError::BlockInExpression { .. }));
    }
}
