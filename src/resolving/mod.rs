//! Name resolution
//!
//! This module binds every name occurrence of an [ast::SourceFile] to its declaration.
//! The main interface is [resolve], which produces a [Resolution] side table.
//!
//! Scopes form chains from the innermost binding out to the opened modules:
//! - each `open` chains the exports of a module, the last one opened being nearest
//! - the file scope holds all function signatures, so functions may be used before
//!   they are declared
//! - each function body gets a scope for its parameters
//! - each `let` starts a new scope that is visible to the rest of its block

use std::collections::HashMap;

use miette::Diagnostic;
use thiserror::Error;
use tracing::{debug, trace};

use crate::types::Type;
use crate::{ast, NodeId, Span};

mod modules;
mod scope;

pub use modules::{std_module, Export, ExportedFunction, FuncSpec, Module, ModuleRegistry, ModuleSpec};
pub use scope::{ScopeArena, ScopeId, SigId, Symbol};

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum ResolveError {
    #[error("Cannot find module `{module}`")]
    UnknownModule {
        module: String,

        #[label("opened here")]
        span: Span,
    },

    #[error("Unknown name `{name}`")]
    UnknownName {
        name: String,

        #[label("not found in any enclosing scope")]
        span: Span,
    },

    #[error("The name `{name}` is already defined in this scope")]
    NameConflict {
        name: String,

        #[label("defined again here")]
        span: Span,
    },

    #[error("`{name}` is not a type")]
    NotAType {
        name: String,

        #[label("used as a type here")]
        span: Span,
    },

    #[error("The parameter `{name}` has no type")]
    #[diagnostic(help("Annotate it like `{name}: int`"))]
    MissingType {
        name: String,

        #[label]
        span: Span,
    },

    #[error("Module `{module}` exports `{name}` more than once")]
    DuplicateExport { module: String, name: String },

    #[error("Module `{module}` uses the type `{name}` without exporting it")]
    UnknownExportType { module: String, name: String },
}

type Result<T> = std::result::Result<T, ResolveError>;

/// Signature of a function that can be called
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionSig {
    pub name: String,
    pub params: Vec<Type>,

    /// Absent if the return type has to be inferred from the body
    pub ret: Option<Type>,

    /// The declaring function, absent for module exports
    pub decl: Option<NodeId>,
}

/// Everything name resolution found out about a source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    /// Identifier expressions to what they refer to
    bindings: HashMap<NodeId, Symbol>,

    /// Declared types of parameters and annotated let statements
    annotations: HashMap<NodeId, Type>,

    /// Function declarations to their signature
    functions: HashMap<NodeId, SigId>,

    signatures: Vec<FunctionSig>,
}

impl Resolution {
    pub fn binding(&self, expr: NodeId) -> Option<&Symbol> {
        self.bindings.get(&expr)
    }

    pub fn annotation(&self, node: NodeId) -> Option<&Type> {
        self.annotations.get(&node)
    }

    pub fn function(&self, decl: NodeId) -> Option<SigId> {
        self.functions.get(&decl).copied()
    }

    pub fn signature(&self, sig: SigId) -> Option<&FunctionSig> {
        self.signatures.get(sig.0)
    }

    fn add_signature(&mut self, sig: FunctionSig) -> SigId {
        self.signatures.push(sig);
        SigId(self.signatures.len() - 1)
    }
}

/// Bind all names in `file` against the modules in `modules`
pub fn resolve(file: &ast::SourceFile, modules: &ModuleRegistry) -> Result<Resolution> {
    let mut resolver = Resolver {
        modules,
        scopes: ScopeArena::default(),
        resolution: Resolution::default(),
    };
    resolver.resolve_source_file(file)?;
    Ok(resolver.resolution)
}

struct Resolver<'a> {
    modules: &'a ModuleRegistry,
    scopes: ScopeArena,
    resolution: Resolution,
}

impl Resolver<'_> {
    fn resolve_source_file(&mut self, file: &ast::SourceFile) -> Result<()> {
        let mut imports = None;
        for open in &file.opens {
            imports = Some(self.open_module(open, imports)?);
        }

        let file_scope = self.scopes.push(imports);

        // signatures first, so that bodies can refer to any function
        let mut sigs = Vec::with_capacity(file.functions.len());
        for func in &file.functions {
            sigs.push(self.resolve_signature(func, file_scope)?);
        }
        for (func, sig) in file.functions.iter().zip(sigs) {
            if !self.scopes.insert(file_scope, &func.name, Symbol::Function(sig)) {
                return Err(ResolveError::NameConflict {
                    name: func.name.clone(),
                    span: func.name_span,
                });
            }
        }
        trace!("File scope:\n{}", self.scopes.dump(file_scope));

        for func in &file.functions {
            self.resolve_function_body(func, file_scope)?;
        }

        Ok(())
    }

    /// Chain a fresh scope with the module's exports under `parent`
    fn open_module(&mut self, open: &ast::OpenDecl, parent: Option<ScopeId>) -> Result<ScopeId> {
        let modules = self.modules;
        let module = modules
            .get(&open.module)
            .ok_or_else(|| ResolveError::UnknownModule {
                module: open.module.clone(),
                span: open.span,
            })?;
        debug!("Opening module {}", module.name());

        let scope = self.scopes.push(parent);
        for (name, export) in module.exports() {
            let symbol = match export {
                Export::Type(ty) => Symbol::Type(ty.clone()),
                Export::Function(func) => Symbol::Function(self.resolution.add_signature(FunctionSig {
                    name: func.name.clone(),
                    params: func.params.clone(),
                    ret: Some(func.ret.clone()),
                    decl: None,
                })),
            };
            // exports were checked for duplicates on registration
            self.scopes.insert(scope, name, symbol);
        }

        Ok(scope)
    }

    fn resolve_signature(&mut self, func: &ast::FuncDecl, scope: ScopeId) -> Result<SigId> {
        debug!("Resolving signature of function {}", func.name);

        let mut params = Vec::with_capacity(func.params.len());
        for param in &func.params {
            let Some(ty) = &param.ty else {
                return Err(ResolveError::MissingType {
                    name: param.name.clone(),
                    span: param.span,
                });
            };
            let ty = self.resolve_type(ty, scope)?;
            self.resolution.annotations.insert(param.id, ty.clone());
            params.push(ty);
        }

        let ret = match &func.ret {
            Some(ret) => Some(self.resolve_type(ret, scope)?),
            None => None,
        };

        let sig = self.resolution.add_signature(FunctionSig {
            name: func.name.clone(),
            params,
            ret,
            decl: Some(func.id),
        });
        self.resolution.functions.insert(func.id, sig);
        Ok(sig)
    }

    fn resolve_function_body(&mut self, func: &ast::FuncDecl, file_scope: ScopeId) -> Result<()> {
        debug!("Resolving body of function {}", func.name);

        let scope = self.scopes.push(Some(file_scope));
        for param in &func.params {
            if !self.scopes.insert(scope, &param.name, Symbol::Param(param.id)) {
                return Err(ResolveError::NameConflict {
                    name: param.name.clone(),
                    span: param.span,
                });
            }
        }
        trace!("Function scope:\n{}", self.scopes.dump(scope));

        self.resolve_expr(&func.body, scope)
    }

    /// Resolve an expression in type position
    fn resolve_type(&mut self, expr: &ast::Expr, scope: ScopeId) -> Result<Type> {
        let ast::ExprKind::Ident(name) = &expr.kind else {
            return Err(ResolveError::NotAType {
                name: describe(expr),
                span: expr.span,
            });
        };

        match self.scopes.lookup(scope, name) {
            Some(Symbol::Type(ty)) => {
                let ty = ty.clone();
                self.resolution.bindings.insert(expr.id, Symbol::Type(ty.clone()));
                Ok(ty)
            }
            Some(_) => Err(ResolveError::NotAType {
                name: name.clone(),
                span: expr.span,
            }),
            None => Err(ResolveError::UnknownName {
                name: name.clone(),
                span: expr.span,
            }),
        }
    }

    fn resolve_expr(&mut self, expr: &ast::Expr, scope: ScopeId) -> Result<()> {
        match &expr.kind {
            ast::ExprKind::Ident(name) => {
                let symbol = self
                    .scopes
                    .lookup(scope, name)
                    .cloned()
                    .ok_or_else(|| ResolveError::UnknownName {
                        name: name.clone(),
                        span: expr.span,
                    })?;
                trace!("{name} at {} refers to {symbol}", expr.span);
                self.resolution.bindings.insert(expr.id, symbol);
                Ok(())
            }
            ast::ExprKind::Literal(_) => Ok(()),
            ast::ExprKind::Call { callee, args } => {
                self.resolve_expr(callee, scope)?;
                for arg in args {
                    self.resolve_expr(arg, scope)?;
                }
                Ok(())
            }
            ast::ExprKind::Block(stmts) => self.resolve_block(stmts, scope),
        }
    }

    fn resolve_block(&mut self, stmts: &[ast::Stmt], scope: ScopeId) -> Result<()> {
        let mut current = scope;
        for stmt in stmts {
            match &stmt.kind {
                ast::StmtKind::Let(binding) => {
                    debug!("Resolving let {}", binding.name);

                    if let Some(ty) = &binding.ty {
                        let ty = self.resolve_type(ty, current)?;
                        self.resolution.annotations.insert(stmt.id, ty);
                    }
                    // the binding is not yet visible to its own initializer
                    self.resolve_expr(&binding.init, current)?;

                    current = self.scopes.push(Some(current));
                    self.scopes.insert(current, &binding.name, Symbol::Let(stmt.id));
                }
                ast::StmtKind::Return(expr) | ast::StmtKind::Expr(expr) => {
                    self.resolve_expr(expr, current)?;
                }
            }
        }
        Ok(())
    }
}

/// Short description of an expression that was expected to name a type
fn describe(expr: &ast::Expr) -> String {
    match &expr.kind {
        ast::ExprKind::Ident(name) | ast::ExprKind::Literal(name) => name.clone(),
        ast::ExprKind::Call { .. } => String::from("a call"),
        ast::ExprKind::Block(_) => String::from("a block"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExprKind, StmtKind};
    use crate::{lower, parse};

    fn lower_source(src: &str) -> ast::SourceFile {
        lower(&parse(src).unwrap())
    }

    fn resolve_source(src: &str) -> Result<(ast::SourceFile, Resolution)> {
        let file = lower_source(src);
        let resolution = resolve(&file, &ModuleRegistry::with_std())?;
        Ok((file, resolution))
    }

    fn block(func: &ast::FuncDecl) -> &[ast::Stmt] {
        let ExprKind::Block(stmts) = &func.body.kind else {
            panic!("expected a block body");
        };
        stmts
    }

    #[test]
    fn shadowing_let() {
        let (file, resolution) =
            resolve_source("func f() { let x = 1; let x = 2; return x; }").unwrap();
        let stmts = block(&file.functions[0]);

        let StmtKind::Return(ret) = &stmts[2].kind else {
            panic!("expected a return");
        };
        assert_eq!(resolution.binding(ret.id), Some(&Symbol::Let(stmts[1].id)));
    }

    #[test]
    fn let_initializer_sees_previous_binding() {
        let (file, resolution) =
            resolve_source("open std func f(x: int): int { let x = x; return x; }").unwrap();
        let func = &file.functions[0];
        let stmts = block(func);

        let StmtKind::Let(binding) = &stmts[0].kind else {
            panic!("expected a let");
        };
        assert_eq!(
            resolution.binding(binding.init.id),
            Some(&Symbol::Param(func.params[0].id))
        );
    }

    #[test]
    fn let_is_not_visible_before() {
        let err = resolve_source("func f() { let y = x; let x = 1; return y; }").unwrap_err();
        assert!(matches!(err, ResolveError::UnknownName { name, .. } if name == "x"));
    }

    #[test]
    fn duplicate_params_conflict() {
        let err = resolve_source("open std func f(x: int, x: int): int x").unwrap_err();
        assert!(matches!(err, ResolveError::NameConflict { name, .. } if name == "x"));
    }

    #[test]
    fn duplicate_functions_conflict() {
        let err = resolve_source("func f() 1 func f() 2").unwrap_err();
        assert!(matches!(err, ResolveError::NameConflict { name, .. } if name == "f"));
    }

    #[test]
    fn forward_reference() {
        let (file, resolution) = resolve_source("func a() b() func b() 1").unwrap();
        let ExprKind::Call { callee, .. } = &file.functions[0].body.kind else {
            panic!("expected a call");
        };
        let Some(Symbol::Function(sig)) = resolution.binding(callee.id) else {
            panic!("callee should be a function");
        };
        assert_eq!(resolution.signature(*sig).unwrap().decl, Some(file.functions[1].id));
        assert_eq!(resolution.function(file.functions[1].id), Some(*sig));
    }

    #[test]
    fn unknown_name_anywhere() {
        for src in [
            "func f() nope",
            "func f() { return f(nope); }",
            "func f() { let a = 1; nope; return a; }",
        ] {
            let err = resolve_source(src).unwrap_err();
            assert!(
                matches!(&err, ResolveError::UnknownName { name, .. } if name == "nope"),
                "{src}: {err:?}"
            );
        }
    }

    #[test]
    fn unknown_module() {
        let err = resolve_source("open nowhere").unwrap_err();
        assert!(matches!(err, ResolveError::UnknownModule { module, .. } if module == "nowhere"));
    }

    #[test]
    fn types_need_open() {
        let err = resolve_source("func f(x: int) x").unwrap_err();
        assert!(matches!(err, ResolveError::UnknownName { name, .. } if name == "int"));
    }

    #[test]
    fn functions_are_not_types() {
        let err = resolve_source("open std func f(x: add) x").unwrap_err();
        assert!(matches!(err, ResolveError::NotAType { name, .. } if name == "add"));

        let err = resolve_source("open std func f(x: 1) x").unwrap_err();
        assert!(matches!(err, ResolveError::NotAType { .. }));
    }

    #[test]
    fn missing_param_type() {
        let err = resolve_source("func f(x) x").unwrap_err();
        assert!(matches!(err, ResolveError::MissingType { name, .. } if name == "x"));
    }

    #[test]
    fn later_open_is_nearer() {
        let mut modules = ModuleRegistry::with_std();
        modules
            .register(ModuleSpec {
                name: String::from("wide"),
                types: vec![(String::from("int"), Type::FLOAT)],
                functions: vec![],
            })
            .unwrap();

        let file = lower_source("open std open wide func f(x: int) x");
        let resolution = resolve(&file, &modules).unwrap();
        let param = &file.functions[0].params[0];
        assert_eq!(
            resolution.annotation(param.id),
            Some(&Type::alias("int", Type::FLOAT))
        );
    }

    #[test]
    fn plus_resolves_to_std_add() {
        let (file, resolution) = resolve_source("open std func f(a: int, b: int): int a + b").unwrap();
        let ExprKind::Call { callee, .. } = &file.functions[0].body.kind else {
            panic!("expected a call");
        };
        let Some(Symbol::Function(sig)) = resolution.binding(callee.id) else {
            panic!("callee should be a function");
        };
        let sig = resolution.signature(*sig).unwrap();
        assert_eq!(sig.name, "add");
        assert_eq!(sig.decl, None);
    }
}
