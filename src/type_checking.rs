//! Type checking
//!
//! This module assigns a type to every expression of a resolved [ast::SourceFile]. The
//! main interface is [type_check], which produces a [TypeTable] side table.
//!
//! Types are compared structurally, see [Type::structurally_eq]. Functions without a
//! declared return type get it inferred from their body, on demand when they are called
//! before their own turn.

use std::collections::HashMap;

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::resolving::{Resolution, SigId, Symbol};
use crate::types::Type;
use crate::{ast, NodeId, Span};

#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum TypeCheckError {
    #[error("The literal `{text}` is neither an integer nor a float")]
    InvalidLiteral {
        text: String,

        #[label]
        span: Span,
    },

    #[error("Mismatched types: expected {expected}, found {found}")]
    Mismatch {
        expected: Type,
        found: Type,

        #[label("this is {found}")]
        span: Span,
    },

    #[error("`{name}` takes {expected} arguments but {found} were given")]
    ArityMismatch {
        name: String,
        expected: usize,
        found: usize,

        #[label]
        span: Span,
    },

    #[error("This expression is not a function")]
    NotCallable {
        #[label("called here")]
        span: Span,
    },

    #[error("This return disagrees with the first return of the block: expected {first}, found {found}")]
    ReturnMismatch {
        first: Type,
        found: Type,

        #[label("returns {found}")]
        span: Span,

        #[label("first return is {first}")]
        first_span: Span,
    },

    #[error("`{name}` cannot be used as a value")]
    NotAValue {
        name: String,

        #[label]
        span: Span,
    },

    #[error("Cannot infer the return type of `{name}`, it depends on itself")]
    #[diagnostic(help("Declare the return type like `func {name}(): int`"))]
    RecursiveInference {
        name: String,

        #[label("needed here")]
        span: Span,
    },

    #[error("Found no declaration for this expression")]
    Unresolved {
        #[label]
        span: Span,
    },
}

type Result<T> = std::result::Result<T, TypeCheckError>;

/// Type of an expression
#[derive(Debug, Clone, PartialEq)]
pub enum ExprType {
    Value(Type),

    /// A reference to a function, only good as a callee
    Function(SigId),
}

/// Everything type checking found out about a source file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeTable {
    exprs: HashMap<NodeId, ExprType>,

    /// Types of let bindings, by statement
    lets: HashMap<NodeId, Type>,

    /// Return types of all checked functions and all called functions
    returns: HashMap<SigId, Type>,
}

impl TypeTable {
    pub fn expr(&self, id: NodeId) -> Option<&ExprType> {
        self.exprs.get(&id)
    }

    /// Type of an expression that denotes a value
    pub fn value(&self, id: NodeId) -> Option<&Type> {
        match self.exprs.get(&id) {
            Some(ExprType::Value(ty)) => Some(ty),
            _ => None,
        }
    }

    pub fn binding(&self, stmt: NodeId) -> Option<&Type> {
        self.lets.get(&stmt)
    }

    pub fn return_type(&self, sig: SigId) -> Option<&Type> {
        self.returns.get(&sig)
    }
}

/// Type check a resolved source file
pub fn type_check(file: &ast::SourceFile, resolution: &Resolution) -> Result<TypeTable> {
    let mut checker = TypeChecker {
        resolution,
        functions: file.functions.iter().map(|func| (func.id, func)).collect(),
        states: HashMap::new(),
        table: TypeTable::default(),
    };

    for func in &file.functions {
        checker.check_function(func, func.name_span)?;
    }

    Ok(checker.table)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    InProgress,
    Done,
}

struct TypeChecker<'a> {
    resolution: &'a Resolution,
    functions: HashMap<NodeId, &'a ast::FuncDecl>,
    states: HashMap<SigId, State>,
    table: TypeTable,
}

impl<'a> TypeChecker<'a> {
    /// Check a function once and return its return type
    ///
    /// `use_span` is where the function is needed, for reporting inference cycles.
    fn check_function(&mut self, func: &'a ast::FuncDecl, use_span: Span) -> Result<Type> {
        let sig_id = self
            .resolution
            .function(func.id)
            .ok_or(TypeCheckError::Unresolved {
                span: func.name_span,
            })?;

        match self.states.get(&sig_id) {
            Some(State::Done) => {
                return self
                    .table
                    .return_type(sig_id)
                    .cloned()
                    .ok_or(TypeCheckError::Unresolved {
                        span: func.name_span,
                    })
            }
            Some(State::InProgress) => {
                return Err(TypeCheckError::RecursiveInference {
                    name: func.name.clone(),
                    span: use_span,
                })
            }
            None => {}
        }

        debug!("Checking function {}", func.name);
        self.states.insert(sig_id, State::InProgress);

        let body = self.value_type(&func.body)?;
        let declared = self
            .resolution
            .signature(sig_id)
            .and_then(|sig| sig.ret.clone());

        let ret = match declared {
            Some(declared) => {
                if !body.structurally_eq(&declared) {
                    return Err(TypeCheckError::Mismatch {
                        expected: declared,
                        found: body,
                        span: func.body.span,
                    });
                }
                declared
            }
            None => {
                debug!("Inferred return type {} for {}", body, func.name);
                body
            }
        };

        self.table.returns.insert(sig_id, ret.clone());
        self.states.insert(sig_id, State::Done);
        Ok(ret)
    }

    /// Type of an expression that has to denote a value
    fn value_type(&mut self, expr: &'a ast::Expr) -> Result<Type> {
        match self.expr_type(expr)? {
            ExprType::Value(ty) => Ok(ty),
            ExprType::Function(sig) => Err(TypeCheckError::NotAValue {
                name: self
                    .resolution
                    .signature(sig)
                    .map(|sig| sig.name.clone())
                    .unwrap_or_default(),
                span: expr.span,
            }),
        }
    }

    fn expr_type(&mut self, expr: &'a ast::Expr) -> Result<ExprType> {
        let ty = match &expr.kind {
            ast::ExprKind::Ident(name) => self.ident_type(expr, name)?,
            ast::ExprKind::Literal(text) => ExprType::Value(literal_type(text, expr.span)?),
            ast::ExprKind::Call { callee, args } => ExprType::Value(self.call_type(callee, args, expr.span)?),
            ast::ExprKind::Block(stmts) => ExprType::Value(self.block_type(stmts)?),
        };

        self.table.exprs.insert(expr.id, ty.clone());
        Ok(ty)
    }

    fn ident_type(&self, expr: &ast::Expr, name: &str) -> Result<ExprType> {
        let unresolved = || TypeCheckError::Unresolved { span: expr.span };

        match self.resolution.binding(expr.id).ok_or_else(unresolved)? {
            Symbol::Param(param) => self
                .resolution
                .annotation(*param)
                .cloned()
                .map(ExprType::Value)
                .ok_or_else(unresolved),
            Symbol::Let(stmt) => self
                .table
                .binding(*stmt)
                .cloned()
                .map(ExprType::Value)
                .ok_or_else(unresolved),
            Symbol::Function(sig) => Ok(ExprType::Function(*sig)),
            Symbol::Type(_) => Err(TypeCheckError::NotAValue {
                name: name.to_string(),
                span: expr.span,
            }),
        }
    }

    fn call_type(&mut self, callee: &'a ast::Expr, args: &'a [ast::Expr], span: Span) -> Result<Type> {
        let ExprType::Function(sig_id) = self.expr_type(callee)? else {
            return Err(TypeCheckError::NotCallable { span: callee.span });
        };
        let resolution = self.resolution;
        let sig = resolution
            .signature(sig_id)
            .ok_or(TypeCheckError::Unresolved { span: callee.span })?;

        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            arg_types.push(self.value_type(arg)?);
        }

        if arg_types.len() != sig.params.len() {
            return Err(TypeCheckError::ArityMismatch {
                name: sig.name.clone(),
                expected: sig.params.len(),
                found: arg_types.len(),
                span,
            });
        }

        for ((arg, found), expected) in args.iter().zip(arg_types).zip(&sig.params) {
            if !found.structurally_eq(expected) {
                return Err(TypeCheckError::Mismatch {
                    expected: expected.clone(),
                    found,
                    span: arg.span,
                });
            }
        }

        let ret = match (&sig.ret, sig.decl) {
            (Some(ret), _) => ret.clone(),
            (None, Some(decl)) => {
                let func = *self
                    .functions
                    .get(&decl)
                    .ok_or(TypeCheckError::Unresolved { span: callee.span })?;
                self.check_function(func, span)?
            }
            (None, None) => return Err(TypeCheckError::Unresolved { span: callee.span }),
        };

        self.table.returns.entry(sig_id).or_insert_with(|| ret.clone());
        Ok(ret)
    }

    /// The first `return` decides the type of a block, the others must agree with it
    fn block_type(&mut self, stmts: &'a [ast::Stmt]) -> Result<Type> {
        let mut first: Option<(Type, Span)> = None;

        for stmt in stmts {
            match &stmt.kind {
                ast::StmtKind::Let(binding) => {
                    let ty = self.value_type(&binding.init)?;
                    if let Some(declared) = self.resolution.annotation(stmt.id) {
                        if !ty.structurally_eq(declared) {
                            return Err(TypeCheckError::Mismatch {
                                expected: declared.clone(),
                                found: ty,
                                span: binding.init.span,
                            });
                        }
                    }
                    self.table.lets.insert(stmt.id, ty);
                }
                ast::StmtKind::Return(value) => {
                    let ty = self.value_type(value)?;
                    let Some((first_ty, first_span)) = first.clone() else {
                        first = Some((ty, stmt.span));
                        continue;
                    };
                    if !ty.structurally_eq(&first_ty) {
                        return Err(TypeCheckError::ReturnMismatch {
                            first: first_ty,
                            found: ty,
                            span: stmt.span,
                            first_span,
                        });
                    }
                }
                ast::StmtKind::Expr(expr) => {
                    self.expr_type(expr)?;
                }
            }
        }

        Ok(first.map(|(ty, _)| ty).unwrap_or(Type::UNIT))
    }
}

/// Classify a literal by its text
fn literal_type(text: &str, span: Span) -> Result<Type> {
    if is_integer(text) {
        Ok(Type::INT)
    } else if text.parse::<f64>().is_ok() {
        Ok(Type::FLOAT)
    } else {
        Err(TypeCheckError::InvalidLiteral {
            text: text.to_string(),
            span,
        })
    }
}

fn is_integer(text: &str) -> bool {
    let (digits, radix) = if let Some(digits) = text.strip_prefix("0b") {
        (digits, 2)
    } else if let Some(digits) = text.strip_prefix("0x") {
        (digits, 16)
    } else {
        (text, 10)
    };
    !digits.is_empty()
        && digits.chars().all(|c| match radix {
            16 => matches!(c, '0'..='9' | 'a'..='f'),
            _ => c.is_digit(radix),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolving::{resolve, ModuleRegistry};
    use crate::types::PrimTag;
    use crate::{lower, parse};

    fn check(src: &str) -> Result<(ast::SourceFile, Resolution, TypeTable)> {
        let file = lower(&parse(src).unwrap());
        let resolution = resolve(&file, &ModuleRegistry::with_std()).unwrap();
        let table = type_check(&file, &resolution)?;
        Ok((file, resolution, table))
    }

    fn body_type(src: &str) -> Type {
        let (file, _, table) = check(src).unwrap();
        let func = file.functions.last().unwrap();
        table.value(func.body.id).unwrap().clone()
    }

    #[test]
    fn literals() {
        assert_eq!(body_type("func f() 42"), Type::INT);
        assert_eq!(body_type("func f() 0x1f"), Type::INT);
        assert_eq!(body_type("func f() 0b1010"), Type::INT);
        assert_eq!(body_type("func f() 1.5"), Type::FLOAT);
        assert_eq!(body_type("func f() 2e3"), Type::FLOAT);
        assert_eq!(body_type("func f() 99999999999999999999999"), Type::INT);
    }

    #[test]
    fn invalid_literals() {
        for src in ["func f() 1e", "func f() 0b", "func f() 0x", "func f() 0xFF"] {
            assert!(
                matches!(check(src), Err(TypeCheckError::InvalidLiteral { .. })),
                "{src}"
            );
        }
    }

    #[test]
    fn shadowed_let_takes_latest_type() {
        let src = "func f() { let x = 1; let x = 2.5; return x; }";
        assert_eq!(body_type(src), Type::FLOAT);

        let src = "func f() { let x = 1; let x = 2; return x; }";
        assert_eq!(body_type(src), Type::INT);
    }

    #[test]
    fn let_annotation_must_match() {
        assert!(check("open std func f() { let x: int = 1; return x; }").is_ok());

        let err = check("open std func f() { let x: float = 1; return x; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::Mismatch { .. }));
    }

    #[test]
    fn first_return_decides() {
        let err = check("func f() { return 1; return 1.5; }").unwrap_err();
        assert!(matches!(
            err,
            TypeCheckError::ReturnMismatch { first, found, .. }
                if first == Type::INT && found == Type::FLOAT
        ));

        assert_eq!(body_type("func f() { return 1; return 2; }"), Type::INT);
    }

    #[test]
    fn block_without_return_is_unit() {
        assert_eq!(body_type("func f() { 1; }"), Type::UNIT);
        assert_eq!(body_type("func f() { }"), Type::UNIT);

        let err = check("open std func f(): int { 1; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::Mismatch { found, .. } if found == Type::UNIT));
    }

    #[test]
    fn calls() {
        let two_ints = "open std func g(a: int, b: int): float 1.5 ";

        let (file, _, table) = check(&format!("{two_ints} func f() g(1, 2)")).unwrap();
        let body = table.value(file.functions[1].body.id).unwrap();
        assert!(body.structurally_eq(&Type::FLOAT));

        let err = check(&format!("{two_ints} func f() g(1)")).unwrap_err();
        assert!(matches!(
            err,
            TypeCheckError::ArityMismatch {
                expected: 2,
                found: 1,
                ..
            }
        ));

        let err = check(&format!("{two_ints} func f() g(1, 2.0)")).unwrap_err();
        assert!(matches!(err, TypeCheckError::Mismatch { found, .. } if found == Type::FLOAT));
    }

    #[test]
    fn plus_uses_std_add() {
        let (file, _, table) = check("open std func f(a: int): int a + 1").unwrap();
        let body = table.value(file.functions[0].body.id).unwrap();
        assert_eq!(body.primitive(), Some(PrimTag::Int));

        let err = check("open std func f(a: float) a + 1").unwrap_err();
        assert!(matches!(err, TypeCheckError::Mismatch { .. }));
    }

    #[test]
    fn uint_is_not_int() {
        let err = check("open std func f(a: int, b: int) addu(a, b)").unwrap_err();
        assert!(matches!(err, TypeCheckError::Mismatch { .. }));
        assert!(check("open std func f(a: uint, b: int) addu(a, b)").is_ok());
    }

    #[test]
    fn not_callable() {
        let err = check("open std func f(a: int) a(1)").unwrap_err();
        assert!(matches!(err, TypeCheckError::NotCallable { .. }));

        let err = check("func f() 1(2)").unwrap_err();
        assert!(matches!(err, TypeCheckError::NotCallable { .. }));
    }

    #[test]
    fn not_a_value() {
        let err = check("open std func f() int").unwrap_err();
        assert!(matches!(err, TypeCheckError::NotAValue { name, .. } if name == "int"));

        let err = check("open std func f() { let g = add; return g; }").unwrap_err();
        assert!(matches!(err, TypeCheckError::NotAValue { name, .. } if name == "add"));
    }

    #[test]
    fn inferred_return_on_demand() {
        let (file, resolution, table) = check("func a() b() func b() 2.5").unwrap();
        let sig = resolution.function(file.functions[1].id).unwrap();
        assert_eq!(table.return_type(sig), Some(&Type::FLOAT));
        assert_eq!(table.value(file.functions[0].body.id), Some(&Type::FLOAT));
    }

    #[test]
    fn recursive_inference() {
        let err = check("func a() b() func b() a()").unwrap_err();
        assert!(matches!(err, TypeCheckError::RecursiveInference { .. }));

        // a declared return type breaks the cycle
        assert!(check("open std func a(): int b() func b() a()").is_ok());
    }

    #[test]
    fn idempotent() {
        let (file, resolution, first) =
            check("open std func f(x: int): int { let y = x + 1; return g(y); } func g(z: int) z")
                .unwrap();
        let second = type_check(&file, &resolution).unwrap();
        assert_eq!(first, second);
    }
}
