use std::fmt;

use crate::Span;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Unknown,
    EndOfFile,

    Newline,
    Whitespace,
    LineComment,

    Identifier,

    IntegerLiteral,
    FloatLiteral,

    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,

    Equal,
    Semicolon,
    Comma,
    Colon,
    Period,
    At,
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Newline | TokenKind::Whitespace | TokenKind::LineComment
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            TokenKind::Unknown => "unknown character",
            TokenKind::EndOfFile => "end of file",
            TokenKind::Newline => "newline",
            TokenKind::Whitespace => "whitespace",
            TokenKind::LineComment => "comment",
            TokenKind::Identifier => "identifier",
            TokenKind::IntegerLiteral => "integer literal",
            TokenKind::FloatLiteral => "float literal",
            TokenKind::LeftParen => "`(`",
            TokenKind::RightParen => "`)`",
            TokenKind::LeftBrace => "`{`",
            TokenKind::RightBrace => "`}`",
            TokenKind::Equal => "`=`",
            TokenKind::Semicolon => "`;`",
            TokenKind::Comma => "`,`",
            TokenKind::Colon => "`:`",
            TokenKind::Period => "`.`",
            TokenKind::At => "`@`",
        };
        f.write_str(text)
    }
}

/// Reserved words
///
/// An identifier matching one of these still has kind [TokenKind::Identifier];
/// the keyword is only recorded as a candidate for the parser to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Open,
    Func,
    Impl,
    Loop,
    Break,
    Continue,
    Return,
    Let,
}

impl Keyword {
    pub fn from_text(text: &str) -> Option<Self> {
        match text {
            "open" => Some(Self::Open),
            "func" => Some(Self::Func),
            "impl" => Some(Self::Impl),
            "loop" => Some(Self::Loop),
            "break" => Some(Self::Break),
            "continue" => Some(Self::Continue),
            "return" => Some(Self::Return),
            "let" => Some(Self::Let),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,

    /// 1-based
    pub line: usize,
    /// 1-based, counted in characters
    pub column: usize,

    pub leading_trivia: Vec<Token>,
    pub trailing_trivia: Vec<Token>,

    pub keyword: Option<Keyword>,

    /// Set for placeholders the parser inserts for missing tokens
    pub synthetic: bool,
}

impl Token {
    pub fn new(kind: TokenKind, text: String, span: Span, line: usize, column: usize) -> Self {
        Self {
            kind,
            text,
            span,
            line,
            column,
            leading_trivia: Vec::new(),
            trailing_trivia: Vec::new(),
            keyword: None,
            synthetic: false,
        }
    }

    /// An empty stand-in for a token that should have been at `at`
    pub fn missing(kind: TokenKind, at: &Token) -> Self {
        Self {
            synthetic: true,
            ..Self::new(kind, String::new(), Span::marker(at.span.start), at.line, at.column)
        }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Identifier && self.keyword == Some(keyword)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} {:?} {:?}",
            self.line, self.column, self.kind, self.text
        )?;
        if let Some(keyword) = self.keyword {
            write!(f, " [{keyword:?}]")?;
        }
        if !self.leading_trivia.is_empty() || !self.trailing_trivia.is_empty() {
            write!(
                f,
                " (trivia {}/{})",
                self.leading_trivia.len(),
                self.trailing_trivia.len()
            )?;
        }
        Ok(())
    }
}
