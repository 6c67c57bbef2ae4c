//! Zero-copy Python lexer.
//!
//! Produces [`Token`] variants that borrow `&'src str` slices directly from
//! the source buffer, each tagged with its byte [`Span`].
//!
//! Handles:
//! - All keyword tokens
//! - INDENT / DEDENT via an indentation stack
//! - Implicit line continuation inside `(`, `[`, `{`
//! - Explicit line continuation via trailing `\`
//! - All string literal forms: single/triple-quoted, raw, bytes, f-strings
//! - Comments (skipped; they survive in the gaps between statement spans)
//! - Semicolons as statement separators
//!
//! Lexical errors (unterminated strings, unbalanced brackets, a dedent to a
//! column that was never opened, stray characters) are reported as a single
//! [`Token::Invalid`] after which the lexer only yields [`Token::Eof`].

use crate::location::{Offset, Span};
use thiserror::Error;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("unterminated triple-quoted string literal")]
    UnterminatedTripleString,
    #[error("unmatched '{0}'")]
    UnmatchedClose(char),
    #[error("closing parenthesis '{close}' does not match opening parenthesis '{open}'")]
    MismatchedClose { open: char, close: char },
    #[error("'{0}' was never closed")]
    Unclosed(char),
    #[error("unindent does not match any outer indentation level")]
    BadDedent,
    #[error("unexpected character after line continuation character")]
    BadContinuation,
    #[error("invalid character '{0}'")]
    UnexpectedChar(char),
}

// ── Token ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    // Literals
    Name(&'src str),
    /// Any numeric literal; the value is not needed.
    Number,
    /// A non-f-string literal: the raw source slice including prefix and quotes.
    Str(&'src str),
    /// An f-string: the raw source slice.
    FStr(&'src str),

    // Structural
    Newline,
    Indent,
    Dedent,

    // Operators / punctuation we need to distinguish
    Eq,        // =
    Walrus,    // :=
    Colon,     // :
    Comma,     // ,
    Dot,       // .
    Ellipsis,  // ...
    Semicolon, // ;
    Arrow,     // ->

    AugAssign, // +=  -=  *=  /=  //=  %=  **=  &=  |=  ^=  >>=  <<=  @=

    LParen,   // (
    RParen,   // )
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }

    /// Every other operator.
    Op,

    Star,    // *
    DblStar, // **
    At,      // @

    // Keywords
    KwFalse,
    KwNone,
    KwTrue,
    KwAnd,
    KwAs,
    KwAssert,
    KwAsync,
    KwAwait,
    KwBreak,
    KwClass,
    KwContinue,
    KwDef,
    KwDel,
    KwElif,
    KwElse,
    KwExcept,
    KwFinally,
    KwFor,
    KwFrom,
    KwGlobal,
    KwIf,
    KwImport,
    KwIn,
    KwIs,
    KwLambda,
    KwMatch, // soft keyword
    KwCase,  // soft keyword
    KwNonlocal,
    KwNot,
    KwOr,
    KwPass,
    KwRaise,
    KwReturn,
    KwTry,
    KwWhile,
    KwWith,
    KwYield,

    /// A lexical error.  Always the last real token of the stream.
    Invalid(LexError),

    Eof,
}

impl Token<'_> {
    /// Soft keywords and plain identifiers both act as names in expressions.
    pub fn name_text(&self) -> Option<&str> {
        match self {
            Token::Name(n) => Some(n),
            Token::KwMatch => Some("match"),
            Token::KwCase => Some("case"),
            _ => None,
        }
    }
}

// ── Spanned ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Spanned<'src> {
    pub token: Token<'src>,
    pub span: Span,
}

// ── Lexer ─────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct Lexer<'src> {
    src: &'src [u8],
    /// The same source as a `&str`, for UTF-8-safe slicing.
    src_str: &'src str,
    /// Current byte position.
    pos: usize,
    /// Indentation stack; always starts with [0].
    indent_stack: Vec<usize>,
    /// How many DEDENT tokens remain to be emitted.
    pending_dedents: usize,
    /// Whether the next logical line should trigger indent/dedent analysis.
    at_line_start: bool,
    /// Open brackets with their offsets.  Newlines are ignored while non-empty.
    brackets: Vec<(u8, usize)>,
    /// Set once an `Invalid` token has been produced.
    failed: bool,
    /// One-token lookahead buffer.
    peeked: Option<Spanned<'src>>,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src: src.as_bytes(),
            src_str: src,
            pos: 0,
            indent_stack: vec![0],
            pending_dedents: 0,
            at_line_start: true,
            brackets: Vec::new(),
            failed: false,
            peeked: None,
        }
    }

    // ── public interface ──────────────────────────────────────────────────────

    /// Return (but do not consume) the next token.
    pub fn peek(&mut self) -> &Token<'src> {
        &self.peek_spanned().token
    }

    /// Return (but do not consume) the next token's span.
    pub fn peek_span(&mut self) -> Span {
        self.peek_spanned().span
    }

    fn peek_spanned(&mut self) -> &Spanned<'src> {
        if self.peeked.is_none() {
            let t = self.next_inner();
            self.peeked = Some(t);
        }
        self.peeked
            .as_ref()
            .expect("peeked is always Some after the fill above")
    }

    /// Consume and return the next token with its span.
    pub fn consume(&mut self) -> Spanned<'src> {
        match self.peeked.take() {
            Some(t) => t,
            None => self.next_inner(),
        }
    }

    // ── internal tokenisation ────────────────────────────────────────────────

    fn at(&self, pos: usize, start: usize, token: Token<'src>) -> Spanned<'src> {
        Spanned {
            token,
            span: Span::new(start as Offset, pos as Offset),
        }
    }

    fn invalid(&mut self, start: usize, err: LexError) -> Spanned<'src> {
        self.failed = true;
        self.at(self.pos.max(start), start, Token::Invalid(err))
    }

    fn next_inner(&mut self) -> Spanned<'src> {
        if self.failed {
            return self.at(self.src.len(), self.src.len(), Token::Eof);
        }

        if self.pending_dedents > 0 {
            self.pending_dedents -= 1;
            return self.at(self.pos, self.pos, Token::Dedent);
        }

        loop {
            if self.at_line_start && self.brackets.is_empty() {
                self.at_line_start = false;
                if let Some(tok) = self.handle_indent() {
                    return tok;
                }
            }

            if self.pos >= self.src.len() {
                if let Some(&(open, at)) = self.brackets.last() {
                    return self.invalid(at, LexError::Unclosed(open as char));
                }
                // Flush remaining DEDENT tokens before EOF.
                if self.indent_stack.len() > 1 {
                    self.indent_stack.pop();
                    self.pending_dedents = self.indent_stack.len() - 1;
                    self.indent_stack.truncate(1);
                    return self.at(self.pos, self.pos, Token::Dedent);
                }
                return self.at(self.pos, self.pos, Token::Eof);
            }

            let start = self.pos;
            let b = self.src[self.pos];

            if b == b' ' || b == b'\t' || b == b'\r' || b == b'\x0c' {
                self.pos += 1;
                continue;
            }

            if b == b'\n' {
                self.pos += 1;
                if !self.brackets.is_empty() {
                    continue;
                }
                self.at_line_start = true;
                return self.at(self.pos, start, Token::Newline);
            }

            if b == b'\\' {
                self.pos += 1;
                if self.src.get(self.pos) == Some(&b'\r') {
                    self.pos += 1;
                }
                if self.src.get(self.pos) == Some(&b'\n') {
                    self.pos += 1;
                    continue;
                }
                return self.invalid(start, LexError::BadContinuation);
            }

            if b == b'#' {
                while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }

            if self.is_string_start() {
                return self.lex_string(start);
            }

            if b.is_ascii_digit()
                || (b == b'.'
                    && self
                        .src
                        .get(self.pos + 1)
                        .copied()
                        .is_some_and(|c| c.is_ascii_digit()))
            {
                self.lex_number();
                return self.at(self.pos, start, Token::Number);
            }

            if b.is_ascii_alphabetic() || b == b'_' || b >= 0x80 {
                return self.lex_name(start);
            }

            self.pos += 1;
            let tok = match b {
                b'(' | b'[' | b'{' => {
                    self.brackets.push((b, start));
                    match b {
                        b'(' => Token::LParen,
                        b'[' => Token::LBracket,
                        _ => Token::LBrace,
                    }
                }
                b')' | b']' | b'}' => {
                    let expected_open = match b {
                        b')' => b'(',
                        b']' => b'[',
                        _ => b'{',
                    };
                    match self.brackets.pop() {
                        None => return self.invalid(start, LexError::UnmatchedClose(b as char)),
                        Some((open, _)) if open != expected_open => {
                            return self.invalid(
                                start,
                                LexError::MismatchedClose {
                                    open: open as char,
                                    close: b as char,
                                },
                            );
                        }
                        Some(_) => {}
                    }
                    match b {
                        b')' => Token::RParen,
                        b']' => Token::RBracket,
                        _ => Token::RBrace,
                    }
                }
                b',' => Token::Comma,
                b';' => Token::Semicolon,
                b'@' => self.with_eq(Token::AugAssign, Token::At),
                b'=' => self.with_eq(Token::Op, Token::Eq),
                b':' => self.with_eq(Token::Walrus, Token::Colon),
                b'.' => {
                    if self.src.get(self.pos) == Some(&b'.')
                        && self.src.get(self.pos + 1) == Some(&b'.')
                    {
                        self.pos += 2;
                        Token::Ellipsis
                    } else {
                        Token::Dot
                    }
                }
                b'*' => {
                    if self.src.get(self.pos) == Some(&b'*') {
                        self.pos += 1;
                        self.with_eq(Token::AugAssign, Token::DblStar)
                    } else {
                        self.with_eq(Token::AugAssign, Token::Star)
                    }
                }
                b'+' | b'%' | b'^' | b'&' | b'|' => self.with_eq(Token::AugAssign, Token::Op),
                b'-' => {
                    if self.src.get(self.pos) == Some(&b'>') {
                        self.pos += 1;
                        Token::Arrow
                    } else {
                        self.with_eq(Token::AugAssign, Token::Op)
                    }
                }
                b'/' | b'<' | b'>' => {
                    if self.src.get(self.pos) == Some(&b) {
                        self.pos += 1;
                        self.with_eq(Token::AugAssign, Token::Op)
                    } else {
                        self.with_eq(Token::Op, Token::Op)
                    }
                }
                b'!' => {
                    if self.src.get(self.pos) == Some(&b'=') {
                        self.pos += 1;
                        Token::Op
                    } else {
                        return self.invalid(start, LexError::UnexpectedChar('!'));
                    }
                }
                b'~' => Token::Op,
                other => return self.invalid(start, LexError::UnexpectedChar(other as char)),
            };

            return self.at(self.pos, start, tok);
        }
    }

    /// Consume a trailing `=` if present and pick between the two tokens.
    fn with_eq(&mut self, with: Token<'src>, without: Token<'src>) -> Token<'src> {
        if self.src.get(self.pos) == Some(&b'=') {
            self.pos += 1;
            with
        } else {
            without
        }
    }

    // ── Indentation handling ──────────────────────────────────────────────────

    /// Scans leading whitespace of the next non-blank, non-comment line and
    /// emits INDENT/DEDENT/nothing.
    fn handle_indent(&mut self) -> Option<Spanned<'src>> {
        loop {
            let mut col = 0usize;
            while self.pos < self.src.len() {
                match self.src[self.pos] {
                    b' ' => col += 1,
                    b'\t' => col = (col + 8) & !7,
                    b'\x0c' => col = 0,
                    _ => break,
                }
                self.pos += 1;
            }

            if self.pos >= self.src.len() {
                return None;
            }
            match self.src[self.pos] {
                b'\n' => {
                    self.pos += 1;
                    continue;
                }
                b'\r' => {
                    self.pos += 1;
                    if self.src.get(self.pos) == Some(&b'\n') {
                        self.pos += 1;
                    }
                    continue;
                }
                b'#' => {
                    while self.pos < self.src.len() && self.src[self.pos] != b'\n' {
                        self.pos += 1;
                    }
                    continue;
                }
                _ => {}
            }

            let top = *self.indent_stack.last().unwrap_or(&0);
            if col > top {
                self.indent_stack.push(col);
                return Some(self.at(self.pos, self.pos, Token::Indent));
            }
            if col < top {
                let mut dedent_count = 0usize;
                while self.indent_stack.len() > 1
                    && self.indent_stack.last().is_some_and(|&level| level > col)
                {
                    self.indent_stack.pop();
                    dedent_count += 1;
                }
                if self.indent_stack.last() != Some(&col) {
                    let start = self.pos;
                    return Some(self.invalid(start, LexError::BadDedent));
                }
                self.pending_dedents = dedent_count - 1;
                return Some(self.at(self.pos, self.pos, Token::Dedent));
            }
            return None;
        }
    }

    // ── Identifier / keyword lexing ───────────────────────────────────────────

    fn lex_name(&mut self, start: usize) -> Spanned<'src> {
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            if b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80 {
                self.pos += 1;
            } else {
                break;
            }
        }
        // Runs of bytes >= 0x80 always end on a char boundary, so this slice
        // is valid UTF-8.
        let s = &self.src_str[start..self.pos];
        let tok = match s {
            "False" => Token::KwFalse,
            "None" => Token::KwNone,
            "True" => Token::KwTrue,
            "and" => Token::KwAnd,
            "as" => Token::KwAs,
            "assert" => Token::KwAssert,
            "async" => Token::KwAsync,
            "await" => Token::KwAwait,
            "break" => Token::KwBreak,
            "class" => Token::KwClass,
            "continue" => Token::KwContinue,
            "def" => Token::KwDef,
            "del" => Token::KwDel,
            "elif" => Token::KwElif,
            "else" => Token::KwElse,
            "except" => Token::KwExcept,
            "finally" => Token::KwFinally,
            "for" => Token::KwFor,
            "from" => Token::KwFrom,
            "global" => Token::KwGlobal,
            "if" => Token::KwIf,
            "import" => Token::KwImport,
            "in" => Token::KwIn,
            "is" => Token::KwIs,
            "lambda" => Token::KwLambda,
            "match" => Token::KwMatch,
            "case" => Token::KwCase,
            "nonlocal" => Token::KwNonlocal,
            "not" => Token::KwNot,
            "or" => Token::KwOr,
            "pass" => Token::KwPass,
            "raise" => Token::KwRaise,
            "return" => Token::KwReturn,
            "try" => Token::KwTry,
            "while" => Token::KwWhile,
            "with" => Token::KwWith,
            "yield" => Token::KwYield,
            other => Token::Name(other),
        };
        self.at(self.pos, start, tok)
    }

    // ── Number lexing ─────────────────────────────────────────────────────────

    fn lex_number(&mut self) {
        while self.pos < self.src.len() {
            let b = self.src[self.pos];
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' {
                self.pos += 1;
            } else if (b == b'+' || b == b'-')
                && self.pos > 0
                && (self.src[self.pos - 1] == b'e' || self.src[self.pos - 1] == b'E')
            {
                // Exponent sign in a float literal.
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    // ── String literals ───────────────────────────────────────────────────────

    fn is_string_start(&self) -> bool {
        let b = self.src[self.pos];
        match b {
            b'"' | b'\'' => true,
            b'r' | b'R' | b'b' | b'B' | b'u' | b'U' | b'f' | b'F' => {
                let next = self.src.get(self.pos + 1).copied().unwrap_or(0);
                match next {
                    b'"' | b'\'' => true,
                    b'r' | b'R' | b'b' | b'B' | b'f' | b'F' => {
                        let nn = self.src.get(self.pos + 2).copied().unwrap_or(0);
                        nn == b'"' || nn == b'\''
                    }
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn lex_string(&mut self, start: usize) -> Spanned<'src> {
        let mut is_fstring = false;
        while let Some(&c) = self.src.get(self.pos) {
            match c {
                b'f' | b'F' => is_fstring = true,
                b'r' | b'R' | b'b' | b'B' | b'u' | b'U' => {}
                _ => break,
            }
            self.pos += 1;
        }

        let q = self.src[self.pos];
        let triple =
            self.src.get(self.pos + 1) == Some(&q) && self.src.get(self.pos + 2) == Some(&q);
        self.pos += if triple { 3 } else { 1 };

        loop {
            let Some(&b) = self.src.get(self.pos) else {
                self.pos = self.src.len();
                let err = if triple {
                    LexError::UnterminatedTripleString
                } else {
                    LexError::UnterminatedString
                };
                return self.invalid(start, err);
            };
            if b == b'\\' {
                self.pos = (self.pos + 2).min(self.src.len());
                continue;
            }
            if triple {
                if b == q
                    && self.src.get(self.pos + 1) == Some(&q)
                    && self.src.get(self.pos + 2) == Some(&q)
                {
                    self.pos += 3;
                    break;
                }
            } else if b == q {
                self.pos += 1;
                break;
            } else if b == b'\n' {
                return self.invalid(start, LexError::UnterminatedString);
            }
            self.pos += 1;
        }

        let raw = &self.src_str[start..self.pos];
        let tok = if is_fstring {
            Token::FStr(raw)
        } else {
            Token::Str(raw)
        };
        self.at(self.pos, start, tok)
    }
}

// ── String value extraction ───────────────────────────────────────────────────

/// Extract the decoded value of a plain string literal.
///
/// Handles single/double quotes, triple quotes, the `r`/`b`/`u` prefixes and
/// the common escapes.  Returns `None` for f-strings.
pub fn extract_str_value(raw: &str) -> Option<String> {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'r' | b'R' | b'b' | b'B' | b'u' | b'U' => i += 1,
            b'f' | b'F' => return None,
            _ => break,
        }
    }

    let q = *bytes.get(i)?;
    if q != b'"' && q != b'\'' {
        return None;
    }
    let triple = bytes.get(i + 1) == Some(&q) && bytes.get(i + 2) == Some(&q);
    let delim = if triple { 3 } else { 1 };
    let start = i + delim;
    let end = bytes.len().checked_sub(delim)?;
    if end < start {
        return None;
    }

    let content = &raw[start..end];
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(e @ ('\\' | '\'' | '"')) => out.push(e),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    Some(out)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
