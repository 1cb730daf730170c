use chumsky::prelude::*;
use tracing::debug;

use super::token::{Keyword, Token, TokenKind};
use crate::Span;

type RawToken = (TokenKind, String);

/// Turn source text into tokens
///
/// The resulting stream always ends with exactly one [TokenKind::EndOfFile] token and
/// contains no trivia tokens: those are folded into the neighbouring tokens.
pub fn lex(source: &str) -> Vec<Token> {
    let raw = match scanner().parse(source) {
        Ok(raw) => raw,
        Err(_) => unreachable!("the scanner accepts every character"),
    };

    let tokens = locate(raw, source.len());
    let mut tokens = fold_trivia(tokens);
    tag_keywords(&mut tokens);

    debug!("Lexed {} tokens", tokens.len());
    tokens
}

fn digit(radix: u32) -> impl Parser<char, char, Error = Simple<char>> + Clone {
    filter(move |c: &char| c.is_digit(radix))
}

/// Hex digits are lowercase only, `0xFF` is `0x` followed by the identifier `FF`
fn hex_digit() -> impl Parser<char, char, Error = Simple<char>> + Clone {
    filter(|c: &char| matches!(c, '0'..='9' | 'a'..='f'))
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || "~!$%^&*-+|<>?/_".contains(c)
}

fn is_ident_continue(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}

fn prefixed(prefix: &str, rest: Vec<char>) -> String {
    let mut text = String::from(prefix);
    text.extend(rest);
    text
}

/// Scan the raw token stream, trivia included
fn scanner() -> impl Parser<char, Vec<RawToken>, Error = Simple<char>> {
    let newline = just('\n').to((TokenKind::Newline, String::from("\n")));

    let whitespace = filter(|c: &char| matches!(c, ' ' | '\t' | '\r'))
        .repeated()
        .at_least(1)
        .collect::<String>()
        .map(|text| (TokenKind::Whitespace, text));

    let comment = just("//")
        .ignore_then(filter(|c: &char| *c != '\n').repeated())
        .map(|body| (TokenKind::LineComment, prefixed("//", body)));

    let punctuation = one_of("(){}=;,:.@").map(|c: char| {
        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '=' => TokenKind::Equal,
            ';' => TokenKind::Semicolon,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Period,
            '@' => TokenKind::At,
            _ => unreachable!(),
        };
        (kind, c.to_string())
    });

    let binary = just("0b")
        .ignore_then(digit(2).repeated())
        .map(|digits| (TokenKind::IntegerLiteral, prefixed("0b", digits)));

    let hexadecimal = just("0x")
        .ignore_then(hex_digit().repeated())
        .map(|digits| (TokenKind::IntegerLiteral, prefixed("0x", digits)));

    let fraction = just('.')
        .ignore_then(digit(10).repeated())
        .map(|digits| prefixed(".", digits));

    let exponent = just('e')
        .ignore_then(one_of("+-").or_not())
        .then(digit(10).repeated())
        .map(|(sign, digits): (Option<char>, Vec<char>)| {
            let mut text = String::from("e");
            text.extend(sign);
            text.extend(digits);
            text
        });

    let decimal = digit(10)
        .repeated()
        .at_least(1)
        .collect::<String>()
        .then(fraction.or_not())
        .then(exponent.or_not())
        .map(
            |((integral, fraction), exponent): ((String, Option<String>), Option<String>)| {
                let kind = if fraction.is_some() || exponent.is_some() {
                    TokenKind::FloatLiteral
                } else {
                    TokenKind::IntegerLiteral
                };
                let mut text = integral;
                text.extend(fraction);
                text.extend(exponent);
                (kind, text)
            },
        );

    // a slash continues an identifier unless it starts a comment
    let slash = just('/').then_ignore(none_of("/").rewind().ignored().or(end()));

    let identifier = filter(|c: &char| is_ident_start(*c))
        .then(
            filter(|c: &char| *c != '/' && is_ident_continue(*c))
                .or(slash)
                .repeated(),
        )
        .map(|(first, rest): (char, Vec<char>)| {
            let mut text = String::new();
            text.push(first);
            text.extend(rest);
            (TokenKind::Identifier, text)
        });

    let unknown = any().map(|c: char| (TokenKind::Unknown, c.to_string()));

    choice((
        newline,
        whitespace,
        comment,
        punctuation,
        binary,
        hexadecimal,
        decimal,
        identifier,
        unknown,
    ))
    .repeated()
    .then_ignore(end())
}

/// Attach byte spans and line/column positions, then append the end of file token
fn locate(raw: Vec<RawToken>, source_len: usize) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(raw.len() + 1);
    let mut offset = 0;
    let mut line = 1;
    let mut column = 1;

    for (kind, text) in raw {
        let span = Span::new(offset, offset + text.len());
        offset = span.end;

        let (start_line, start_column) = (line, column);
        for c in text.chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        tokens.push(Token::new(kind, text, span, start_line, start_column));
    }

    debug_assert_eq!(offset, source_len);
    tokens.push(Token::new(
        TokenKind::EndOfFile,
        String::new(),
        Span::marker(offset),
        line,
        column,
    ));
    tokens
}

/// Move trivia tokens into the leading or trailing trivia of real tokens
///
/// Trivia directly after a token on the same line is trailing trivia of that
/// token; everything from the first newline on leads the next real token.
fn fold_trivia(tokens: Vec<Token>) -> Vec<Token> {
    let mut result: Vec<Token> = Vec::new();
    let mut leading = Vec::new();
    let mut collecting_trailing = false;

    for token in tokens {
        if !token.kind.is_trivia() {
            let mut token = token;
            token.leading_trivia = std::mem::take(&mut leading);
            result.push(token);
            collecting_trailing = true;
            continue;
        }

        if token.kind == TokenKind::Newline {
            collecting_trailing = false;
        }

        match result.last_mut() {
            Some(previous) if collecting_trailing => previous.trailing_trivia.push(token),
            _ => leading.push(token),
        }
    }

    result
}

fn tag_keywords(tokens: &mut [Token]) {
    for token in tokens
        .iter_mut()
        .filter(|token| token.kind == TokenKind::Identifier)
    {
        token.keyword = Keyword::from_text(&token.text);
    }
}
