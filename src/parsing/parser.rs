use tracing::warn;

use super::token::{Keyword, Token, TokenKind};
use super::ParsingError;
use crate::cst::*;

type Result<T> = std::result::Result<T, ParsingError>;

/// Binding power of an infix `+`
const ADD_POWER: i8 = 1;

/// Binding power of a `(` in infix position, i.e. a call
const CALL_POWER: i8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Add,
    Call,
}

impl Operator {
    fn binding_power(self) -> i8 {
        match self {
            Operator::Add => ADD_POWER,
            Operator::Call => CALL_POWER,
        }
    }
}

/// Recursive descent parser with precedence climbing for expressions
///
/// A required token that is absent is replaced by an empty synthetic token and
/// recorded in `errors`, so parsing always runs to the end of the input unless an
/// expression cannot be started at all.
pub struct Parser {
    /// Remaining tokens in reverse order, without the end of file token
    tokens: Vec<Token>,
    eof: Token,
    errors: Vec<ParsingError>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        let eof = match tokens.pop() {
            Some(token) if token.kind == TokenKind::EndOfFile => token,
            Some(token) => {
                let eof = Token::new(
                    TokenKind::EndOfFile,
                    String::new(),
                    crate::Span::marker(token.span.end),
                    token.line,
                    token.column,
                );
                tokens.push(token);
                eof
            }
            None => Token::new(TokenKind::EndOfFile, String::new(), Default::default(), 1, 1),
        };
        tokens.reverse();

        Self {
            tokens,
            eof,
            errors: Vec::new(),
        }
    }

    /// Parse a whole source file, returning the tree and every recorded error
    pub fn parse(mut self) -> (Option<SourceFile>, Vec<ParsingError>) {
        match self.module_items() {
            Ok(items) => {
                let file = SourceFile {
                    items,
                    eof: self.eof,
                };
                (Some(file), self.errors)
            }
            Err(fatal) => {
                self.errors.push(fatal);
                (None, self.errors)
            }
        }
    }

    fn peek(&self) -> &Token {
        self.tokens.last().unwrap_or(&self.eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        !self.is_at_end() && self.peek().kind == kind
    }

    fn is_at_end(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Take the next token only if it has the given kind
    fn eat_optional(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            self.tokens.pop()
        } else {
            None
        }
    }

    /// Take the next token, which is expected to have the given kind
    fn eat(&mut self, kind: TokenKind) -> Token {
        if let Some(token) = self.eat_optional(kind) {
            return token;
        }

        let found = self.peek();
        let missing = Token::missing(kind, found);
        let error = ParsingError::MissingToken {
            expected: kind,
            found: found.kind,
            line: found.line,
            column: found.column,
            span: missing.span,
        };
        self.errors.push(error);
        missing
    }

    fn module_items(&mut self) -> Result<Vec<ModuleItem>> {
        let mut items = Vec::new();

        while let Some(token) = self.tokens.last() {
            let (kind, keyword) = (token.kind, token.keyword);
            let item = match (kind, keyword) {
                (TokenKind::At, _) => ModuleItem::Attribute(self.attribute()),
                (TokenKind::Identifier, Some(Keyword::Open)) => ModuleItem::Open(self.open_decl()),
                (TokenKind::Identifier, Some(Keyword::Func)) => ModuleItem::Func(self.func_decl()?),
                _ => {
                    let token = self.eat(kind);
                    warn!(
                        "Skipping unexpected top-level {} {:?} at {}:{}",
                        token.kind, token.text, token.line, token.column
                    );
                    ModuleItem::Skipped(token)
                }
            };
            items.push(item);
        }

        Ok(items)
    }

    fn attribute(&mut self) -> Attribute {
        let at = self.eat(TokenKind::At);
        let name = self.eat(TokenKind::Identifier);
        Attribute { at, name }
    }

    fn open_decl(&mut self) -> OpenDecl {
        let open_kw = self.eat(TokenKind::Identifier);
        let module = self.eat(TokenKind::Identifier);
        OpenDecl { open_kw, module }
    }

    fn func_decl(&mut self) -> Result<FuncDecl> {
        let func_kw = self.eat(TokenKind::Identifier);
        let name = self.eat(TokenKind::Identifier);
        let signature = self.func_sig()?;
        let body = self.expr(0)?;
        Ok(FuncDecl {
            func_kw,
            name,
            signature,
            body,
        })
    }

    fn func_sig(&mut self) -> Result<FuncSig> {
        let lparen = self.eat(TokenKind::LeftParen);

        let mut params = Vec::new();
        while self.at(TokenKind::Identifier) {
            params.push(self.func_param()?);
        }

        let rparen = self.eat(TokenKind::RightParen);
        let ret = self.type_annotation()?;

        Ok(FuncSig {
            lparen,
            params,
            rparen,
            ret,
        })
    }

    fn func_param(&mut self) -> Result<FuncParam> {
        let name = self.eat(TokenKind::Identifier);
        let ty = self.type_annotation()?;
        let comma = self.eat_optional(TokenKind::Comma);
        Ok(FuncParam { name, ty, comma })
    }

    fn type_annotation(&mut self) -> Result<Option<TypeAnnotation>> {
        let Some(colon) = self.eat_optional(TokenKind::Colon) else {
            return Ok(None);
        };
        let ty = self.expr(0)?;
        Ok(Some(TypeAnnotation { colon, ty }))
    }

    /// Parse an expression whose operators bind at least as tight as `min_power`
    fn expr(&mut self, min_power: i8) -> Result<Expr> {
        let mut lhs = self.prefix()?;

        while let Some(op) = self.peek_operator() {
            if op.binding_power() < min_power {
                break;
            }
            lhs = self.infix(op, lhs)?;
        }

        Ok(lhs)
    }

    fn peek_operator(&self) -> Option<Operator> {
        if self.is_at_end() {
            return None;
        }

        let token = self.peek();
        match token.kind {
            TokenKind::Identifier if token.text == "+" => Some(Operator::Add),
            TokenKind::LeftParen => Some(Operator::Call),
            _ => None,
        }
    }

    fn prefix(&mut self) -> Result<Expr> {
        let kind = self.peek().kind;
        match kind {
            TokenKind::Identifier => Ok(Expr::Ident(self.eat(TokenKind::Identifier))),
            TokenKind::IntegerLiteral | TokenKind::FloatLiteral => Ok(Expr::Literal(self.eat(kind))),
            TokenKind::LeftParen => {
                let lparen = self.eat(TokenKind::LeftParen);
                let inner = self.expr(0)?;
                let rparen = self.eat(TokenKind::RightParen);
                Ok(Expr::Grouped(Box::new(GroupedExpr {
                    lparen,
                    inner,
                    rparen,
                })))
            }
            TokenKind::LeftBrace => Ok(Expr::Block(Box::new(self.block()?))),
            _ => {
                let token = self.peek();
                Err(ParsingError::ExpectedExpression {
                    found: kind,
                    line: token.line,
                    column: token.column,
                    span: token.span,
                })
            }
        }
    }

    fn infix(&mut self, op: Operator, lhs: Expr) -> Result<Expr> {
        match op {
            Operator::Add => {
                let op = self.eat(TokenKind::Identifier);
                let rhs = self.expr(ADD_POWER + 1)?;
                Ok(Expr::Add(Box::new(AddExpr { lhs, op, rhs })))
            }
            Operator::Call => {
                let lparen = self.eat(TokenKind::LeftParen);

                let mut args = Vec::new();
                while !self.is_at_end() && !self.at(TokenKind::RightParen) {
                    let expr = self.expr(0)?;
                    let comma = self.eat_optional(TokenKind::Comma);
                    args.push(CallArg { expr, comma });
                }

                let rparen = self.eat(TokenKind::RightParen);
                Ok(Expr::Call(Box::new(CallExpr {
                    callee: lhs,
                    lparen,
                    args,
                    rparen,
                })))
            }
        }
    }

    fn block(&mut self) -> Result<BlockExpr> {
        let lbrace = self.eat(TokenKind::LeftBrace);

        let mut items = Vec::new();
        while !self.is_at_end() && !self.at(TokenKind::RightBrace) {
            items.push(self.block_item()?);
        }

        let rbrace = self.eat(TokenKind::RightBrace);
        Ok(BlockExpr {
            lbrace,
            items,
            rbrace,
        })
    }

    fn block_item(&mut self) -> Result<BlockItem> {
        let token = self.peek();
        if token.is_keyword(Keyword::Let) {
            self.let_stmt().map(BlockItem::Let)
        } else if token.is_keyword(Keyword::Return) {
            self.return_stmt().map(BlockItem::Return)
        } else {
            self.expr_stmt().map(BlockItem::Expr)
        }
    }

    fn let_stmt(&mut self) -> Result<LetStmt> {
        let let_kw = self.eat(TokenKind::Identifier);
        let name = self.eat(TokenKind::Identifier);
        let ty = self.type_annotation()?;
        let equal = self.eat(TokenKind::Equal);
        let init = self.expr(0)?;
        let semicolon = self.eat(TokenKind::Semicolon);
        Ok(LetStmt {
            let_kw,
            name,
            ty,
            equal,
            init,
            semicolon,
        })
    }

    fn return_stmt(&mut self) -> Result<ReturnStmt> {
        let return_kw = self.eat(TokenKind::Identifier);
        let value = self.expr(0)?;
        let semicolon = self.eat(TokenKind::Semicolon);
        Ok(ReturnStmt {
            return_kw,
            value,
            semicolon,
        })
    }

    fn expr_stmt(&mut self) -> Result<ExprStmt> {
        let expr = self.expr(0)?;
        let semicolon = self.eat(TokenKind::Semicolon);
        Ok(ExprStmt { expr, semicolon })
    }
}
