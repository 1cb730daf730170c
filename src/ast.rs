//! Abstract syntax tree
//!
//! The abstract tree drops punctuation and trivia, desugars `+` into calls and elides
//! groupings. Each node carries a [NodeId] so that later passes can attach their results
//! in side tables instead of mutating the tree.

use crate::{NodeId, Span, TreeNode};

pub type Ident = String;

#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub opens: Vec<OpenDecl>,
    pub functions: Vec<FuncDecl>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpenDecl {
    pub id: NodeId,
    pub module: Ident,
    pub attributes: Vec<Ident>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub id: NodeId,
    pub name: Ident,
    pub attributes: Vec<Ident>,
    pub params: Vec<FuncParam>,

    /// Declared return type, inferred from the body when absent
    pub ret: Option<Expr>,
    pub body: Expr,

    pub name_span: Span,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncParam {
    pub id: NodeId,
    pub name: Ident,
    pub ty: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(Ident),

    /// Literal text as written, classified by the type checker
    Literal(String),

    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },

    Block(Vec<Stmt>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    Let(LetStmt),
    Return(Expr),
    Expr(Expr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LetStmt {
    pub name: Ident,
    pub ty: Option<Expr>,
    pub init: Expr,
}

impl SourceFile {
    pub fn dump_tree(&self) -> TreeNode {
        let opens = self
            .opens
            .iter()
            .map(|open| TreeNode::leaf(format!("OpenDecl {} <module = {}>", open.id, open.module)));
        let functions = self.functions.iter().map(FuncDecl::dump_tree);

        TreeNode::new(
            format!(
                "SourceFile [{} opens, {} functions]",
                self.opens.len(),
                self.functions.len()
            ),
            opens.chain(functions).collect(),
        )
    }
}

impl FuncDecl {
    fn dump_tree(&self) -> TreeNode {
        let mut children: Vec<_> = self
            .params
            .iter()
            .map(|param| {
                let ty = param.ty.iter().map(Expr::dump_tree).collect();
                TreeNode::new(format!("FuncParam {} <name = {}>", param.id, param.name), ty)
            })
            .collect();
        if let Some(ret) = &self.ret {
            children.push(TreeNode::new("Returns", vec![ret.dump_tree()]));
        }
        children.push(self.body.dump_tree());

        let mut label = format!("FuncDecl {} <name = {}>", self.id, self.name);
        if !self.attributes.is_empty() {
            label.push_str(&format!(" @{}", self.attributes.join(" @")));
        }
        TreeNode::new(label, children)
    }
}

impl Expr {
    fn dump_tree(&self) -> TreeNode {
        match &self.kind {
            ExprKind::Ident(name) => TreeNode::leaf(format!("Ident {} <{name}>", self.id)),
            ExprKind::Literal(text) => TreeNode::leaf(format!("Literal {} <{text}>", self.id)),
            ExprKind::Call { callee, args } => {
                let mut children = vec![callee.dump_tree()];
                children.extend(args.iter().map(Expr::dump_tree));
                TreeNode::new(format!("Call {} [{} args]", self.id, args.len()), children)
            }
            ExprKind::Block(stmts) => TreeNode::new(
                format!("Block {} [{} items]", self.id, stmts.len()),
                stmts.iter().map(Stmt::dump_tree).collect(),
            ),
        }
    }
}

impl Stmt {
    fn dump_tree(&self) -> TreeNode {
        match &self.kind {
            StmtKind::Let(stmt) => {
                let mut children: Vec<_> = stmt.ty.iter().map(Expr::dump_tree).collect();
                children.push(stmt.init.dump_tree());
                TreeNode::new(format!("Let {} <name = {}>", self.id, stmt.name), children)
            }
            StmtKind::Return(value) => {
                TreeNode::new(format!("Return {}", self.id), vec![value.dump_tree()])
            }
            StmtKind::Expr(expr) => TreeNode::new(format!("ExprStmt {}", self.id), vec![expr.dump_tree()]),
        }
    }
}
