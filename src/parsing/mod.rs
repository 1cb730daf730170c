//! Parsing
//!
//! This module is responsible for turning the source code from its string form into a
//! [cst::SourceFile]. The main interface is [parse].
//!
//! Internally, parsing works in two phases:
//! - the [lexer] scans the source text into tokens and folds trivia into them
//! - the [parser] builds the concrete tree from these tokens
//!
//! The raw character scanner is built with the [chumsky] crate.

use miette::Diagnostic;
use thiserror::Error;
use tracing::debug;

use crate::{cst, Span};

mod lexer;
mod parser;
mod token;

pub use lexer::lex;
pub use token::{Keyword, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ParsingError {
    #[error("Expected {expected} at {line}:{column}, found {found}")]
    MissingToken {
        expected: TokenKind,
        found: TokenKind,
        line: usize,
        column: usize,

        #[label("expected {expected} here")]
        span: Span,
    },

    #[error("Expected an expression at {line}:{column}, found {found}")]
    #[diagnostic(help("Expressions start with a name, a literal, `(` or `{{`"))]
    ExpectedExpression {
        found: TokenKind,
        line: usize,
        column: usize,

        #[label("here")]
        span: Span,
    },
}

/// Parse spargel source code into a concrete tree
///
/// Parsing fails if any required token was missing, even though the parser itself
/// carries on past such a point.
pub fn parse(source: &str) -> Result<cst::SourceFile, Vec<ParsingError>> {
    let tokens = lex(source);
    let (file, errors) = parser::Parser::new(tokens).parse();

    match file {
        Some(file) if errors.is_empty() => {
            debug!("Parsed {} top-level items", file.items.len());
            Ok(file)
        }
        _ => Err(errors),
    }
}

/// Parse without rejecting inserted tokens
///
/// The returned tree is only absent if an expression could not be started.
pub fn parse_lenient(source: &str) -> (Option<cst::SourceFile>, Vec<ParsingError>) {
    parser::Parser::new(lex(source)).parse()
}
