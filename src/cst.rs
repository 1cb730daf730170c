//! Concrete syntax tree
//!
//! The concrete tree mirrors the grammar exactly and keeps every token, trivia included.
//! Reconstructing a node yields its source slice byte-for-byte, see [Reconstruct].

use crate::parsing::Token;
use crate::{Span, TreeNode};

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub items: Vec<ModuleItem>,
    pub eof: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModuleItem {
    Attribute(Attribute),
    Open(OpenDecl),
    Func(FuncDecl),

    /// A top-level token that does not start an item
    Skipped(Token),
}

/// `@name`
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub at: Token,
    pub name: Token,
}

/// `open module`
#[derive(Debug, Clone, PartialEq)]
pub struct OpenDecl {
    pub open_kw: Token,
    pub module: Token,
}

/// `func name(params): ret body`
#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub func_kw: Token,
    pub name: Token,
    pub signature: FuncSig,
    pub body: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncSig {
    pub lparen: Token,
    pub params: Vec<FuncParam>,
    pub rparen: Token,
    pub ret: Option<TypeAnnotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncParam {
    pub name: Token,
    pub ty: Option<TypeAnnotation>,
    pub comma: Option<Token>,
}

/// `: type`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAnnotation {
    pub colon: Token,
    pub ty: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Ident(Token),
    Literal(Token),
    Grouped(Box<GroupedExpr>),
    Call(Box<CallExpr>),
    Add(Box<AddExpr>),
    Block(Box<BlockExpr>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedExpr {
    pub lparen: Token,
    pub inner: Expr,
    pub rparen: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub callee: Expr,
    pub lparen: Token,
    pub args: Vec<CallArg>,
    pub rparen: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallArg {
    pub expr: Expr,
    pub comma: Option<Token>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AddExpr {
    pub lhs: Expr,
    pub op: Token,
    pub rhs: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BlockExpr {
    pub lbrace: Token,
    pub items: Vec<BlockItem>,
    pub rbrace: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlockItem {
    Let(LetStmt),
    Return(ReturnStmt),
    Expr(ExprStmt),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    pub let_kw: Token,
    pub name: Token,
    pub ty: Option<TypeAnnotation>,
    pub equal: Token,
    pub init: Expr,
    pub semicolon: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub return_kw: Token,
    pub value: Expr,
    pub semicolon: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprStmt {
    pub expr: Expr,
    pub semicolon: Token,
}

impl Expr {
    /// Source span without surrounding trivia
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(token) | Expr::Literal(token) => token.span,
            Expr::Grouped(grouped) => grouped.lparen.span.join(grouped.rparen.span),
            Expr::Call(call) => call.callee.span().join(call.rparen.span),
            Expr::Add(add) => add.lhs.span().join(add.rhs.span()),
            Expr::Block(block) => block.lbrace.span.join(block.rbrace.span),
        }
    }
}

impl BlockItem {
    pub fn span(&self) -> Span {
        match self {
            BlockItem::Let(stmt) => stmt.let_kw.span.join(stmt.semicolon.span),
            BlockItem::Return(stmt) => stmt.return_kw.span.join(stmt.semicolon.span),
            BlockItem::Expr(stmt) => stmt.expr.span().join(stmt.semicolon.span),
        }
    }
}

/// Lossless conversion back into source text
pub trait Reconstruct {
    fn reconstruct_into(&self, out: &mut String);

    fn reconstruct(&self) -> String {
        let mut out = String::new();
        self.reconstruct_into(&mut out);
        out
    }
}

impl Reconstruct for Token {
    fn reconstruct_into(&self, out: &mut String) {
        self.leading_trivia.reconstruct_into(out);
        out.push_str(&self.text);
        self.trailing_trivia.reconstruct_into(out);
    }
}

impl<T: Reconstruct> Reconstruct for Option<T> {
    fn reconstruct_into(&self, out: &mut String) {
        if let Some(inner) = self {
            inner.reconstruct_into(out);
        }
    }
}

impl<T: Reconstruct> Reconstruct for Vec<T> {
    fn reconstruct_into(&self, out: &mut String) {
        for item in self {
            item.reconstruct_into(out);
        }
    }
}

impl Reconstruct for SourceFile {
    fn reconstruct_into(&self, out: &mut String) {
        self.items.reconstruct_into(out);
        self.eof.reconstruct_into(out);
    }
}

impl Reconstruct for ModuleItem {
    fn reconstruct_into(&self, out: &mut String) {
        match self {
            ModuleItem::Attribute(attribute) => {
                attribute.at.reconstruct_into(out);
                attribute.name.reconstruct_into(out);
            }
            ModuleItem::Open(open) => {
                open.open_kw.reconstruct_into(out);
                open.module.reconstruct_into(out);
            }
            ModuleItem::Func(func) => func.reconstruct_into(out),
            ModuleItem::Skipped(token) => token.reconstruct_into(out),
        }
    }
}

impl Reconstruct for FuncDecl {
    fn reconstruct_into(&self, out: &mut String) {
        self.func_kw.reconstruct_into(out);
        self.name.reconstruct_into(out);

        let signature = &self.signature;
        signature.lparen.reconstruct_into(out);
        signature.params.reconstruct_into(out);
        signature.rparen.reconstruct_into(out);
        signature.ret.reconstruct_into(out);

        self.body.reconstruct_into(out);
    }
}

impl Reconstruct for FuncParam {
    fn reconstruct_into(&self, out: &mut String) {
        self.name.reconstruct_into(out);
        self.ty.reconstruct_into(out);
        self.comma.reconstruct_into(out);
    }
}

impl Reconstruct for TypeAnnotation {
    fn reconstruct_into(&self, out: &mut String) {
        self.colon.reconstruct_into(out);
        self.ty.reconstruct_into(out);
    }
}

impl Reconstruct for Expr {
    fn reconstruct_into(&self, out: &mut String) {
        match self {
            Expr::Ident(token) | Expr::Literal(token) => token.reconstruct_into(out),
            Expr::Grouped(grouped) => {
                grouped.lparen.reconstruct_into(out);
                grouped.inner.reconstruct_into(out);
                grouped.rparen.reconstruct_into(out);
            }
            Expr::Call(call) => {
                call.callee.reconstruct_into(out);
                call.lparen.reconstruct_into(out);
                for arg in &call.args {
                    arg.expr.reconstruct_into(out);
                    arg.comma.reconstruct_into(out);
                }
                call.rparen.reconstruct_into(out);
            }
            Expr::Add(add) => {
                add.lhs.reconstruct_into(out);
                add.op.reconstruct_into(out);
                add.rhs.reconstruct_into(out);
            }
            Expr::Block(block) => {
                block.lbrace.reconstruct_into(out);
                block.items.reconstruct_into(out);
                block.rbrace.reconstruct_into(out);
            }
        }
    }
}

impl Reconstruct for BlockItem {
    fn reconstruct_into(&self, out: &mut String) {
        match self {
            BlockItem::Let(stmt) => {
                stmt.let_kw.reconstruct_into(out);
                stmt.name.reconstruct_into(out);
                stmt.ty.reconstruct_into(out);
                stmt.equal.reconstruct_into(out);
                stmt.init.reconstruct_into(out);
                stmt.semicolon.reconstruct_into(out);
            }
            BlockItem::Return(stmt) => {
                stmt.return_kw.reconstruct_into(out);
                stmt.value.reconstruct_into(out);
                stmt.semicolon.reconstruct_into(out);
            }
            BlockItem::Expr(stmt) => {
                stmt.expr.reconstruct_into(out);
                stmt.semicolon.reconstruct_into(out);
            }
        }
    }
}

impl SourceFile {
    pub fn dump_tree(&self) -> TreeNode {
        let items = self
            .items
            .iter()
            .map(|item| match item {
                ModuleItem::Attribute(attribute) => {
                    TreeNode::leaf(format!("Attribute <name = {}>", attribute.name.text))
                }
                ModuleItem::Open(open) => {
                    TreeNode::leaf(format!("OpenDecl <path = {}>", open.module.text))
                }
                ModuleItem::Func(func) => func.dump_tree(),
                ModuleItem::Skipped(token) => {
                    TreeNode::leaf(format!("Skipped <{}:{} {:?}>", token.line, token.column, token.text))
                }
            })
            .collect();
        TreeNode::new(format!("SourceFile [{} items]", self.items.len()), items)
    }
}

impl FuncDecl {
    fn dump_tree(&self) -> TreeNode {
        let params = self
            .signature
            .params
            .iter()
            .map(|param| {
                let children = param.ty.iter().map(|ann| ann.ty.dump_tree()).collect();
                TreeNode::new(format!("FuncParam <name = {}>", param.name.text), children)
            })
            .collect();

        let mut sig_children = vec![TreeNode::new(
            format!("FuncParams [{} params]", self.signature.params.len()),
            params,
        )];
        if let Some(ret) = &self.signature.ret {
            sig_children.push(TreeNode::new("FuncRet", vec![ret.ty.dump_tree()]));
        }

        TreeNode::new(
            format!("FuncDecl <name = {}>", self.name.text),
            vec![TreeNode::new("FuncSig", sig_children), self.body.dump_tree()],
        )
    }
}

impl Expr {
    fn dump_tree(&self) -> TreeNode {
        match self {
            Expr::Ident(token) => TreeNode::leaf(format!("IdentExpr <name = {}>", token.text)),
            Expr::Literal(token) => TreeNode::leaf(format!("LitExpr <value = {}>", token.text)),
            Expr::Grouped(grouped) => TreeNode::new("GroupedExpr", vec![grouped.inner.dump_tree()]),
            Expr::Call(call) => {
                let mut children = vec![call.callee.dump_tree()];
                children.extend(call.args.iter().map(|arg| arg.expr.dump_tree()));
                TreeNode::new(format!("CallExpr [{} args]", call.args.len()), children)
            }
            Expr::Add(add) => TreeNode::new("AddExpr", vec![add.lhs.dump_tree(), add.rhs.dump_tree()]),
            Expr::Block(block) => {
                let items = block.items.iter().map(BlockItem::dump_tree).collect();
                TreeNode::new(format!("BlockExpr [{} items]", block.items.len()), items)
            }
        }
    }
}

impl BlockItem {
    fn dump_tree(&self) -> TreeNode {
        match self {
            BlockItem::Let(stmt) => {
                let mut children = Vec::new();
                if let Some(ann) = &stmt.ty {
                    children.push(ann.ty.dump_tree());
                }
                children.push(stmt.init.dump_tree());
                TreeNode::new(format!("LetStmt <name = {}>", stmt.name.text), children)
            }
            BlockItem::Return(stmt) => TreeNode::new("RetStmt", vec![stmt.value.dump_tree()]),
            BlockItem::Expr(stmt) => TreeNode::new("ExprStmt", vec![stmt.expr.dump_tree()]),
        }
    }
}
