//! S-expression front end.
//!
//! Builds the same [`Tree`] model as the binary decoder from text, so parsed trees and
//! decoded trees can be handed to the same consumers.
//!
//! Syntax:
//! - lists: `( item* )`; the whole input must be exactly one list, nested at most
//!   [`MAX_DEPTH`] levels deep;
//! - integers: unsigned decimal digits (no sign, no fraction);
//! - symbols: start with an ASCII letter or one of `!@#$%^&*-=|~+`, continue over letters,
//!   digits and `!@#$%^&*-=|~+:<>?.,/`;
//! - strings: raw characters between double quotes; there are no escape sequences;
//! - whitespace: space, tab, CR, LF, vertical tab and bell; `;` starts a comment running to the
//!   end of the line.
//!
//! Lexing runs over the whole source with chumsky. Parsing is a recursive descent over the
//! token stream with one token of lookahead and a push-back stack. Nodes are linked exactly as
//! the decoder links them: a string becomes a string entity followed by one integer entity per
//! code point.
//!
//! ```
//! use anserial::parser::parse;
//!
//! let tree = parse("(a 1 \"x\") ; trailing comment").unwrap();
//! let root = tree.root().unwrap();
//! assert_eq!(root.children().len(), 3);
//! assert_eq!(root.get_by_index(2).unwrap().as_string().unwrap(), "x");
//! ```
use std::fmt;
use std::io::Read;

use chumsky::prelude::*;
use log::debug;

use crate::entity::{Entity, EntityType};
use crate::node::NodeId;
use crate::serializer::{CONTAINER_PAYLOAD, STRING_PAYLOAD};
use crate::tree::{MAX_DEPTH, Tree};
use crate::utils::{Error, Result};

pub type Spanned<T> = (T, SimpleSpan);

const SYMBOL_START: &str = "!@#$%^&*-=|~+";
const SYMBOL_CONTINUE: &str = "!@#$%^&*-=|~+:<>?.,/";
const WHITESPACE: &str = " \t\r\n\u{0b}\u{07}";

/// Kinds of tokens, used in syntax error messages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    OpenParen,
    CloseParen,
    List,
    Symbol,
    Integer,
    String,
    EndOfFile,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::OpenParen => write!(f, "`(`"),
            TokenKind::CloseParen => write!(f, "`)`"),
            TokenKind::List => write!(f, "list"),
            TokenKind::Symbol => write!(f, "symbol"),
            TokenKind::Integer => write!(f, "integer"),
            TokenKind::String => write!(f, "string"),
            TokenKind::EndOfFile => write!(f, "end of file"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token<'src> {
    OpenParen,
    CloseParen,
    Symbol(&'src str),
    Integer(u32),
    String(&'src str),
    EndOfFile,
}

impl Token<'_> {
    fn kind(&self) -> TokenKind {
        match self {
            Token::OpenParen => TokenKind::OpenParen,
            Token::CloseParen => TokenKind::CloseParen,
            Token::Symbol(_) => TokenKind::Symbol,
            Token::Integer(_) => TokenKind::Integer,
            Token::String(_) => TokenKind::String,
            Token::EndOfFile => TokenKind::EndOfFile,
        }
    }
}

impl fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Symbol(s) => write!(f, "symbol `{s}`"),
            Token::Integer(i) => write!(f, "integer `{i}`"),
            Token::String(s) => write!(f, "string \"{s}\""),
            other => write!(f, "{}", other.kind()),
        }
    }
}

// ---------------- Lexer ----------------

fn lexer<'src>()
-> impl Parser<'src, &'src str, Vec<Spanned<Token<'src>>>, extra::Err<Rich<'src, char>>> {
    let integer = text::digits(10)
        .at_least(1)
        .to_slice()
        .try_map(|digits: &str, span| {
            digits.parse::<u32>().map(Token::Integer).map_err(|_| {
                Rich::custom(
                    span,
                    format!("integer literal `{digits}` does not fit in 32 bits"),
                )
            })
        });

    let symbol = any()
        .filter(|c: &char| c.is_ascii_alphabetic() || SYMBOL_START.contains(*c))
        .then(
            any()
                .filter(|c: &char| c.is_ascii_alphanumeric() || SYMBOL_CONTINUE.contains(*c))
                .repeated(),
        )
        .to_slice()
        .map(Token::Symbol);

    let string = just('"')
        .ignore_then(none_of("\"").repeated().to_slice())
        .then_ignore(just('"'))
        .map(Token::String);

    let token = choice((
        just('(').to(Token::OpenParen),
        just(')').to(Token::CloseParen),
        string,
        integer,
        symbol,
    ));

    let whitespace = one_of(WHITESPACE).ignored();
    let comment = just(';')
        .then(any().and_is(just('\n').not()).repeated())
        .ignored();
    let skip = whitespace.or(comment).repeated();

    skip.clone()
        .ignore_then(
            token
                .map_with(|tok, e| (tok, e.span()))
                .then_ignore(skip)
                .repeated()
                .collect(),
        )
        .then_ignore(end())
}

// ---------------- Recursive descent over tokens ----------------

/// One parse over one source text. Consumed by [`SexpParser::parse`]; a failed parse cannot
/// be resumed.
pub struct SexpParser<'src> {
    source: &'src str,
    tokens: std::vec::IntoIter<Spanned<Token<'src>>>,
    pushed_back: Vec<Spanned<Token<'src>>>,
    tree: Tree,
}

impl<'src> SexpParser<'src> {
    /// Tokenize `source`. Characters that start no token are reported here.
    pub fn new(source: &'src str) -> Result<Self> {
        let (tokens, errors) = lexer().parse(source).into_output_errors();

        if let Some(error) = errors.into_iter().next() {
            let span = *error.span();
            return Err(syntax_error(source, span, format!("lexing error: {error}")));
        }

        Ok(Self {
            source,
            tokens: tokens.unwrap_or_default().into_iter(),
            pushed_back: Vec::new(),
            tree: Tree::new(),
        })
    }

    /// Parse the top-level list and return the tree holding it as entity 0.
    pub fn parse(mut self) -> Result<Tree> {
        if !self.accept(TokenKind::OpenParen) {
            let (token, span) = self.next_token();
            return Err(syntax_error(
                self.source,
                span,
                format!("expected {}, found {token}", TokenKind::List),
            ));
        }
        self.parse_list(None, 1)?;
        self.expect(TokenKind::EndOfFile)?;
        Ok(self.tree)
    }

    fn next_token(&mut self) -> Spanned<Token<'src>> {
        if let Some(token) = self.pushed_back.pop() {
            return token;
        }
        self.tokens.next().unwrap_or_else(|| {
            let end = self.source.len();
            (Token::EndOfFile, SimpleSpan::from(end..end))
        })
    }

    fn push_token(&mut self, token: Spanned<Token<'src>>) {
        self.pushed_back.push(token);
    }

    fn peek_token(&mut self) -> &Spanned<Token<'src>> {
        let token = self.next_token();
        self.push_token(token);
        &self.pushed_back[self.pushed_back.len() - 1]
    }

    fn accept(&mut self, kind: TokenKind) -> bool {
        self.peek_token().0.kind() == kind
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Spanned<Token<'src>>> {
        let (token, span) = self.next_token();
        if token.kind() == kind {
            Ok((token, span))
        } else {
            Err(syntax_error(
                self.source,
                span,
                format!("expected {kind}, found {token}"),
            ))
        }
    }

    fn parse_list(&mut self, parent: Option<NodeId>, depth: usize) -> Result<NodeId> {
        let (_, open) = self.expect(TokenKind::OpenParen)?;
        if depth > MAX_DEPTH {
            return Err(syntax_error(
                self.source,
                open,
                format!("lists nested deeper than {MAX_DEPTH} levels"),
            ));
        }

        // The top-level list is its own parent, like the root of a binary stream.
        let parent = parent.map_or(self.tree.len() as u32, NodeId::raw);
        let list = self.push(EntityType::Container, parent, CONTAINER_PAYLOAD)?;

        loop {
            if self.accept(TokenKind::OpenParen) {
                self.parse_list(Some(list), depth + 1)?;
                continue;
            }

            let (token, span) = self.next_token();
            match token {
                Token::CloseParen => return Ok(list),
                Token::Symbol(name) => {
                    let hash = self.tree.symbols_mut().intern(name);
                    self.push(EntityType::Symbol, list.raw(), hash)?;
                }
                Token::Integer(value) => {
                    self.push(EntityType::Integer, list.raw(), value)?;
                }
                Token::String(text) => {
                    let string = self.push(EntityType::String, list.raw(), STRING_PAYLOAD)?;
                    for c in text.chars() {
                        self.push(EntityType::Integer, string.raw(), c as u32)?;
                    }
                }
                other => {
                    return Err(syntax_error(
                        self.source,
                        span,
                        format!("expected {}, found {other}", TokenKind::CloseParen),
                    ));
                }
            }
        }
    }

    fn push(&mut self, kind: EntityType, parent: u32, payload: u32) -> Result<NodeId> {
        self.tree.push(Entity::new(kind, parent, payload)?)
    }
}

fn syntax_error(source: &str, span: SimpleSpan, message: String) -> Error {
    let start = span.start.min(source.len());
    let line = 1 + source.as_bytes()[..start]
        .iter()
        .filter(|b| **b == b'\n')
        .count();

    debug!("Syntax error on line {line}: {message}");
    Error::Syntax {
        line,
        span: start..span.end.min(source.len()),
        message,
    }
}

/// Parse one s-expression into a fresh tree.
pub fn parse(source: &str) -> Result<Tree> {
    SexpParser::new(source)?.parse()
}

/// Read `reader` to its end and parse it.
pub fn parse_reader(mut reader: impl Read) -> Result<Tree> {
    let mut source = String::new();
    reader.read_to_string(&mut source)?;
    parse(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_numbers_count_newlines_before_the_error() {
        let err = parse("(a\n b\n ]\n)").unwrap_err();
        match err {
            Error::Syntax { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn nesting_is_bounded() {
        let nested = |depth: usize| "(\n".repeat(depth) + &")".repeat(depth);

        let tree = parse(&nested(MAX_DEPTH)).unwrap();
        assert_eq!(tree.len(), MAX_DEPTH);

        match parse(&nested(MAX_DEPTH + 1)).unwrap_err() {
            Error::Syntax { line, message, .. } => {
                assert_eq!(line, MAX_DEPTH + 1);
                assert!(message.contains("nested deeper"), "got {message}");
            }
            other => panic!("unexpected error {other}"),
        }

        assert!(parse(&nested(200_000)).unwrap_err().is_syntax());
    }

    #[test]
    fn push_back_keeps_token_order() {
        let mut parser = SexpParser::new("(x)").unwrap();
        assert!(parser.accept(TokenKind::OpenParen));
        assert!(parser.accept(TokenKind::OpenParen));
        assert_eq!(parser.next_token().0, Token::OpenParen);
        assert_eq!(parser.next_token().0, Token::Symbol("x"));
        assert_eq!(parser.next_token().0, Token::CloseParen);
        assert_eq!(parser.next_token().0, Token::EndOfFile);
    }
}
