//! Recursive-descent Python statement parser.
//!
//! Produces a [`Module`] from a source string using the zero-copy [`Lexer`].
//! Statements are parsed structurally (definitions, compound statements and
//! their clauses, imports).  Expressions are checked against the grammar in
//! the `expr` submodule but leave no nodes behind; headers record only the
//! few names and strings the transforms need.
//!
//! Unlike a linter's parser this one is strict: the first syntax error aborts
//! the parse with a [`ParseError`], because rewriting a file we could not
//! understand would produce garbage.

use crate::location::{LineCol, Offset, Span, indent_before, line_col};
use crate::syntax::lexer::{Lexer, Spanned, Token, extract_str_value};
use crate::syntax::tree::{
    ClassDef, Clause, Compound, Decorator, DecoratorShape, FuncDef, ImportAlias, Module, Origin,
    Stmt, StmtKind, Suite,
};
use thiserror::Error;

mod expr;

use expr::is_identifier;

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {}, column {})", at.line, at.col)]
pub struct ParseError {
    pub message: String,
    pub at: LineCol,
}

type PResult<T> = Result<T, ParseError>;

// ── Public entry point ────────────────────────────────────────────────────────

/// Parse a Python source string into a [`Module`].
pub fn parse(src: &str) -> Result<Module<'_>, ParseError> {
    let mut p = Parser::new(src);
    let body = p.parse_module()?;
    Ok(Module { source: src, body })
}

// ── Parser ────────────────────────────────────────────────────────────────────

/// Names and string literals seen in a compound statement header.
#[derive(Default)]
struct Header<'src> {
    names: Vec<&'src str>,
    strings: Vec<String>,
}

struct Parser<'src> {
    lex: Lexer<'src>,
    src: &'src str,
    /// End offset of the last significant (non-layout) token consumed.
    last_end: Offset,
    /// Tokens consumed while a [`Parser::record`] call is active.
    recording: Option<Vec<Spanned<'src>>>,
}

impl<'src> Parser<'src> {
    fn new(src: &'src str) -> Self {
        Self {
            lex: Lexer::new(src),
            src,
            last_end: 0,
            recording: None,
        }
    }

    // ── Module / blocks ───────────────────────────────────────────────────────

    fn parse_module(&mut self) -> PResult<Vec<Stmt<'src>>> {
        let mut stmts = Vec::new();
        loop {
            self.skip_newlines()?;
            match self.peek() {
                Token::Eof => break,
                Token::Indent | Token::Dedent => return Err(self.syntax_error("unexpected indent")),
                _ => self.parse_stmt_line(&mut stmts)?,
            }
        }
        Ok(stmts)
    }

    /// Parse `:` followed by either an inline simple-statement list or an
    /// indented block.  `what` names the statement for error messages.
    fn parse_suite(&mut self, what: &str) -> PResult<Suite<'src>> {
        self.expect(Token::Colon, "expected ':'")?;
        match self.peek() {
            Token::Newline => {}
            Token::Eof | Token::Dedent => {
                return Err(self.syntax_error(&format!("expected an indented block after {what}")));
            }
            Token::At
            | Token::KwDef
            | Token::KwClass
            | Token::KwIf
            | Token::KwFor
            | Token::KwWhile
            | Token::KwWith
            | Token::KwTry
            | Token::KwAsync => return Err(self.syntax_error("invalid syntax")),
            _ => {
                let mut body = Vec::new();
                self.parse_simple_line(&mut body)?;
                return Ok(Suite::Inline(body));
            }
        }
        self.bump()?; // NEWLINE
        if !matches!(self.peek(), Token::Indent) {
            return Err(self.syntax_error(&format!("expected an indented block after {what}")));
        }
        self.bump()?; // INDENT
        let first = self.lex.peek_span().start as usize;
        let indent = indent_before(self.src, first);

        let mut body = Vec::new();
        loop {
            self.skip_newlines()?;
            match self.peek() {
                Token::Dedent => {
                    self.bump()?;
                    break;
                }
                Token::Eof => break,
                Token::Indent => return Err(self.syntax_error("unexpected indent")),
                _ => self.parse_stmt_line(&mut body)?,
            }
        }
        Ok(Suite::Block { indent, body })
    }

    // ── Statement dispatch ────────────────────────────────────────────────────

    /// Parse one logical line: a compound statement, or one or more
    /// `;`-separated simple statements.
    fn parse_stmt_line(&mut self, out: &mut Vec<Stmt<'src>>) -> PResult<()> {
        let start = self.lex.peek_span().start;
        match self.peek().clone() {
            Token::At => out.push(self.parse_decorated(start)?),
            Token::KwDef => out.push(self.parse_funcdef(start, Vec::new())?),
            Token::KwClass => out.push(self.parse_classdef(start, Vec::new())?),
            Token::KwAsync => {
                self.bump()?;
                match self.peek() {
                    Token::KwDef => out.push(self.parse_funcdef(start, Vec::new())?),
                    Token::KwFor | Token::KwWith => out.push(self.parse_compound(start)?),
                    _ => return Err(self.syntax_error("invalid syntax")),
                }
            }
            Token::KwIf | Token::KwFor | Token::KwWhile | Token::KwWith | Token::KwTry => {
                out.push(self.parse_compound(start)?);
            }
            Token::KwMatch | Token::KwCase if self.soft_keyword_opens_block() => {
                out.push(self.parse_soft_block(start)?);
            }
            Token::KwElif | Token::KwElse | Token::KwExcept | Token::KwFinally => {
                return Err(self.syntax_error("invalid syntax"));
            }
            _ => self.parse_simple_line(out)?,
        }
        Ok(())
    }

    // ── Simple statements ─────────────────────────────────────────────────────

    fn parse_simple_line(&mut self, out: &mut Vec<Stmt<'src>>) -> PResult<()> {
        loop {
            let stmt = self.parse_simple()?;
            out.push(stmt);
            if !self.eat_semicolon()? {
                break;
            }
        }
        self.end_line()
    }

    fn parse_simple(&mut self) -> PResult<Stmt<'src>> {
        let start = self.lex.peek_span().start;
        let kind = match self.peek().clone() {
            Token::KwImport => self.parse_import()?,
            Token::KwFrom => self.parse_from_import()?,
            Token::Semicolon | Token::Newline | Token::Eof | Token::Dedent => {
                return Err(self.syntax_error("invalid syntax"));
            }
            Token::KwPass | Token::KwBreak | Token::KwContinue => {
                self.bump()?;
                StmtKind::Simple
            }
            Token::KwReturn => {
                self.bump()?;
                if self.starts_expression() {
                    self.star_expressions()?;
                }
                StmtKind::Simple
            }
            Token::KwRaise => {
                self.bump()?;
                if self.starts_expression() {
                    self.expression()?;
                    if matches!(self.peek(), Token::KwFrom) {
                        self.bump()?;
                        self.expression()?;
                    }
                }
                StmtKind::Simple
            }
            Token::KwGlobal | Token::KwNonlocal => {
                self.bump()?;
                loop {
                    self.expect_name("expected name")?;
                    if !matches!(self.peek(), Token::Comma) {
                        break;
                    }
                    self.bump()?;
                }
                StmtKind::Simple
            }
            Token::KwDel => {
                self.bump()?;
                self.target_list()?;
                StmtKind::Simple
            }
            Token::KwAssert => {
                self.bump()?;
                self.expression()?;
                if matches!(self.peek(), Token::Comma) {
                    self.bump()?;
                    self.expression()?;
                }
                StmtKind::Simple
            }
            Token::Name("type") if self.second_token_is_name() => {
                self.parse_type_alias()?;
                StmtKind::Simple
            }
            Token::Str(_) => {
                let (kind, tokens) = self.record(Self::parse_expression_stmt)?;
                if tokens.iter().all(|t| matches!(t.token, Token::Str(_))) {
                    StmtKind::Docstring
                } else {
                    kind
                }
            }
            _ => self.parse_expression_stmt()?,
        };
        Ok(Stmt {
            origin: Origin::Source(Span::new(start, self.last_end)),
            kind,
        })
    }

    /// Expression statements and assignments.  An assignment reports the
    /// plain names it binds.
    fn parse_expression_stmt(&mut self) -> PResult<StmtKind<'src>> {
        let first = self.parse_assigned_value()?;
        match self.peek() {
            Token::Eq => {
                let mut names = self.bound_names(&first);
                while matches!(self.peek(), Token::Eq) {
                    self.bump()?;
                    let value = self.parse_assigned_value()?;
                    if matches!(self.peek(), Token::Eq) {
                        names.extend(self.bound_names(&value));
                    }
                }
                Ok(StmtKind::Assign(names))
            }
            Token::AugAssign => {
                if first.len() != 1 {
                    return Err(self.syntax_error("illegal expression for augmented assignment"));
                }
                self.bump()?;
                self.parse_assigned_value()?;
                Ok(StmtKind::Simple)
            }
            Token::Colon => {
                if first.len() != 1 {
                    return Err(self.syntax_error("only single target can be annotated"));
                }
                self.bump()?;
                self.expression()?;
                if !matches!(self.peek(), Token::Eq) {
                    return Ok(StmtKind::Simple);
                }
                self.bump()?;
                self.parse_assigned_value()?;
                Ok(StmtKind::Assign(self.bound_names(&first)))
            }
            _ => Ok(StmtKind::Simple),
        }
    }

    /// The right-hand side of `=`: a yield expression or an expression list.
    fn parse_assigned_value(&mut self) -> PResult<Vec<Span>> {
        if matches!(self.peek(), Token::KwYield) {
            self.yield_expr()?;
            return Ok(Vec::new());
        }
        self.star_expressions()
    }

    fn bound_names(&self, targets: &[Span]) -> Vec<&'src str> {
        targets
            .iter()
            .map(|span| span.text(self.src).trim_start_matches('*').trim())
            .filter(|text| is_identifier(text))
            .collect()
    }

    /// `type Name[T] = value`
    fn parse_type_alias(&mut self) -> PResult<()> {
        self.bump()?; // `type`
        self.expect_name("expected type alias name")?;
        if matches!(self.peek(), Token::LBracket) {
            self.type_params()?;
        }
        self.expect(Token::Eq, "expected '='")?;
        self.expression()
    }

    fn parse_import(&mut self) -> PResult<StmtKind<'src>> {
        self.bump()?; // `import`
        let mut names = Vec::new();
        loop {
            let name = self.parse_dotted_name()?;
            let asname = self.parse_optional_asname()?;
            names.push(ImportAlias { name, asname });
            if !matches!(self.peek(), Token::Comma) {
                break;
            }
            self.bump()?;
        }
        Ok(StmtKind::Import(names))
    }

    fn parse_from_import(&mut self) -> PResult<StmtKind<'src>> {
        self.bump()?; // `from`
        let mut level = 0u32;
        while matches!(self.peek(), Token::Dot | Token::Ellipsis) {
            level += if matches!(self.bump()?.token, Token::Ellipsis) {
                3
            } else {
                1
            };
        }
        let module = if self.peek().name_text().is_some() {
            Some(self.parse_dotted_name()?)
        } else {
            None
        };
        if module.is_none() && level == 0 {
            return Err(self.syntax_error("invalid syntax"));
        }
        self.expect(Token::KwImport, "expected 'import'")?;

        if matches!(self.peek(), Token::Star) {
            self.bump()?;
            return Ok(StmtKind::ImportFrom {
                module,
                names: Vec::new(),
                level,
            });
        }

        let parens = matches!(self.peek(), Token::LParen);
        if parens {
            self.bump()?;
        }
        let mut names = Vec::new();
        loop {
            if parens && matches!(self.peek(), Token::RParen) && !names.is_empty() {
                break;
            }
            let name = self.expect_name("expected name to import")?;
            let asname = self.parse_optional_asname()?;
            names.push(ImportAlias { name, asname });
            if !matches!(self.peek(), Token::Comma) {
                break;
            }
            self.bump()?;
        }
        if parens {
            self.expect(Token::RParen, "expected ')'")?;
        }
        Ok(StmtKind::ImportFrom {
            module,
            names,
            level,
        })
    }

    fn parse_optional_asname(&mut self) -> PResult<Option<&'src str>> {
        if matches!(self.peek(), Token::KwAs) {
            self.bump()?;
            Ok(Some(self.expect_name("expected name after 'as'")?))
        } else {
            Ok(None)
        }
    }

    // ── Definitions ───────────────────────────────────────────────────────────

    fn parse_decorated(&mut self, start: Offset) -> PResult<Stmt<'src>> {
        let mut decorators = Vec::new();
        while matches!(self.peek(), Token::At) {
            decorators.push(self.parse_decorator()?);
            self.skip_newlines()?;
        }
        let def_start = self.lex.peek_span().start;
        let stmt = match self.peek() {
            Token::KwDef => self.parse_funcdef(def_start, decorators)?,
            Token::KwAsync => {
                self.bump()?;
                if !matches!(self.peek(), Token::KwDef) {
                    return Err(self.syntax_error("invalid syntax"));
                }
                self.parse_funcdef(def_start, decorators)?
            }
            Token::KwClass => self.parse_classdef(def_start, decorators)?,
            _ => return Err(self.syntax_error("expected 'def' or 'class' after decorator")),
        };
        Ok(Stmt {
            origin: Origin::Source(Span::new(start, self.last_end)),
            kind: stmt.kind,
        })
    }

    /// `@expr NEWLINE`
    fn parse_decorator(&mut self) -> PResult<Decorator<'src>> {
        let at = self.bump()?.span;
        let ((), tokens) = self.record(Self::named_expression)?;
        self.end_line()?;
        Ok(Decorator {
            origin: Origin::Source(Span::new(at.start, self.last_end)),
            shape: decorator_shape(self.src, &tokens),
        })
    }

    /// `def` has been peeked; `start` is the offset of `def` or of a
    /// preceding `async`.
    fn parse_funcdef(
        &mut self,
        start: Offset,
        decorators: Vec<Decorator<'src>>,
    ) -> PResult<Stmt<'src>> {
        self.bump()?; // `def`
        let name = self.expect_name("expected function name")?;
        if matches!(self.peek(), Token::LBracket) {
            self.type_params()?;
        }
        self.expect(Token::LParen, "expected '('")?;
        self.parameters(Token::RParen, true)?;
        self.expect(Token::RParen, "expected ')'")?;
        if matches!(self.peek(), Token::Arrow) {
            self.bump()?;
            self.expression()?;
        }
        let body = self.parse_suite("function definition")?;
        Ok(Stmt {
            origin: Origin::Source(Span::new(start, self.last_end)),
            kind: StmtKind::FunctionDef(Box::new(FuncDef {
                name,
                decorators,
                indent: indent_before(self.src, start as usize),
                def_offset: start,
                body,
            })),
        })
    }

    fn parse_classdef(
        &mut self,
        start: Offset,
        decorators: Vec<Decorator<'src>>,
    ) -> PResult<Stmt<'src>> {
        self.bump()?; // `class`
        let name = self.expect_name("expected class name")?;
        if matches!(self.peek(), Token::LBracket) {
            self.type_params()?;
        }
        if matches!(self.peek(), Token::LParen) {
            self.bump()?;
            self.call_arguments()?;
            self.expect(Token::RParen, "expected ')'")?;
        }
        let body = self.parse_suite("class definition")?;
        Ok(Stmt {
            origin: Origin::Source(Span::new(start, self.last_end)),
            kind: StmtKind::ClassDef(Box::new(ClassDef {
                name,
                decorators,
                indent: indent_before(self.src, start as usize),
                class_offset: start,
                body,
            })),
        })
    }

    // ── Compound statements ───────────────────────────────────────────────────

    /// `if`/`for`/`while`/`with`/`try`, optionally after a consumed `async`.
    fn parse_compound(&mut self, start: Offset) -> PResult<Stmt<'src>> {
        let mut clauses = vec![self.parse_clause()?];
        while let Some(next) = self.peek_keyword() {
            let first = clauses[0].keyword;
            let last = clauses[clauses.len() - 1].keyword;
            if !continues_with(first, last, next) {
                break;
            }
            clauses.push(self.parse_clause()?);
        }
        if clauses[0].keyword == "try"
            && !clauses
                .iter()
                .any(|c| c.keyword == "except" || c.keyword == "finally")
        {
            return Err(self.syntax_error("expected 'except' or 'finally' block"));
        }
        Ok(Stmt {
            origin: Origin::Source(Span::new(start, self.last_end)),
            kind: StmtKind::Compound(Box::new(Compound { clauses })),
        })
    }

    fn parse_clause(&mut self) -> PResult<Clause<'src>> {
        let keyword = self.bump()?.span.text(self.src);
        let ((), tokens) = self.record(|p| match keyword {
            "if" | "elif" | "while" => p.named_expression(),
            "for" => {
                p.target_list()?;
                p.expect(Token::KwIn, "expected 'in'")?;
                p.star_expressions().map(drop)
            }
            "with" => p.with_items(),
            "except" => p.except_header(),
            _ => Ok(()),
        })?;
        let header = self.header_of(&tokens);
        let body = self.parse_suite(&format!("'{keyword}' statement"))?;
        Ok(Clause {
            keyword,
            names: header.names,
            strings: header.strings,
            body,
        })
    }

    /// `match subject:` or `case pattern [if guard]:`.  Patterns are only
    /// scanned up to their `:`.
    fn parse_soft_block(&mut self, start: Offset) -> PResult<Stmt<'src>> {
        let keyword = self.bump()?.span.text(self.src);
        let ((), tokens) = self.record(|p| {
            if keyword == "match" {
                p.star_named_expressions()
            } else {
                p.skip_pattern()
            }
        })?;
        let header = self.header_of(&tokens);
        let body = self.parse_suite(&format!("'{keyword}' statement"))?;
        Ok(Stmt {
            origin: Origin::Source(Span::new(start, self.last_end)),
            kind: StmtKind::Compound(Box::new(Compound {
                clauses: vec![Clause {
                    keyword,
                    names: header.names,
                    strings: header.strings,
                    body,
                }],
            })),
        })
    }

    /// Consume a `case` pattern up to (not including) its `:`.
    fn skip_pattern(&mut self) -> PResult<()> {
        let mut depth = 0u32;
        let mut lambdas = 0u32;
        loop {
            match self.peek() {
                Token::Colon if depth == 0 => {
                    if lambdas == 0 {
                        return Ok(());
                    }
                    lambdas -= 1;
                }
                Token::Newline | Token::Semicolon | Token::Eof | Token::Dedent => {
                    return Err(self.syntax_error("expected ':'"));
                }
                Token::KwLambda if depth == 0 => lambdas += 1,
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.bump()?;
        }
    }

    /// `match` and `case` are soft keywords: they open a block only when
    /// followed by something other than an operator and the line reaches a
    /// `:` at bracket depth 0.
    fn soft_keyword_opens_block(&self) -> bool {
        let mut ahead = self.lex.clone();
        ahead.consume();
        if matches!(
            ahead.peek(),
            Token::Eq
                | Token::Walrus
                | Token::AugAssign
                | Token::Colon
                | Token::Dot
                | Token::Comma
                | Token::Newline
                | Token::Semicolon
                | Token::Eof
                | Token::Dedent
        ) {
            return false;
        }
        let mut depth = 0u32;
        let mut lambdas = 0u32;
        loop {
            match ahead.consume().token {
                Token::Colon if depth == 0 => {
                    if lambdas == 0 {
                        return true;
                    }
                    lambdas -= 1;
                }
                Token::Eq if depth == 0 => return false,
                Token::Newline
                | Token::Semicolon
                | Token::Eof
                | Token::Dedent
                | Token::Invalid(_) => return false,
                Token::KwLambda if depth == 0 => lambdas += 1,
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }

    fn second_token_is_name(&self) -> bool {
        let mut ahead = self.lex.clone();
        ahead.consume();
        ahead.peek().name_text().is_some()
    }

    /// Names and plain string literals among recorded header tokens.
    fn header_of(&self, tokens: &[Spanned<'src>]) -> Header<'src> {
        let mut header = Header::default();
        for t in tokens {
            match &t.token {
                Token::Str(raw) => {
                    if let Some(value) = extract_str_value(raw) {
                        header.strings.push(value);
                    }
                }
                tok if tok.name_text().is_some() => header.names.push(t.span.text(self.src)),
                _ => {}
            }
        }
        header
    }

    // ── Token helpers ─────────────────────────────────────────────────────────

    fn peek(&mut self) -> &Token<'src> {
        self.lex.peek()
    }

    /// The next token as keyword text, when it is a clause keyword.
    fn peek_keyword(&mut self) -> Option<&'static str> {
        match self.peek() {
            Token::KwElif => Some("elif"),
            Token::KwElse => Some("else"),
            Token::KwExcept => Some("except"),
            Token::KwFinally => Some("finally"),
            _ => None,
        }
    }

    /// Consume the next token, turning lexical errors into [`ParseError`]s.
    fn bump(&mut self) -> PResult<Spanned<'src>> {
        let t = self.lex.consume();
        match &t.token {
            Token::Invalid(err) => return Err(self.error_at(t.span.start, err.to_string())),
            Token::Newline | Token::Indent | Token::Dedent | Token::Eof => {}
            _ => {
                self.last_end = t.span.end;
                if let Some(tokens) = &mut self.recording {
                    tokens.push(t.clone());
                }
            }
        }
        Ok(t)
    }

    /// Run `rule` and return what it produced together with the tokens it
    /// consumed.  Recordings nest: an outer recording sees the same tokens.
    fn record<T>(
        &mut self,
        rule: impl FnOnce(&mut Self) -> PResult<T>,
    ) -> PResult<(T, Vec<Spanned<'src>>)> {
        let outer = self.recording.replace(Vec::new());
        let result = rule(self);
        let tokens = std::mem::replace(&mut self.recording, outer).unwrap_or_default();
        if let Some(outer) = &mut self.recording {
            outer.extend(tokens.iter().cloned());
        }
        Ok((result?, tokens))
    }

    fn expect(&mut self, expected: Token<'src>, message: &str) -> PResult<Spanned<'src>> {
        if *self.peek() == expected {
            self.bump()
        } else {
            Err(self.syntax_error(message))
        }
    }

    fn expect_name(&mut self, message: &str) -> PResult<&'src str> {
        if self.peek().name_text().is_some() {
            Ok(self.bump()?.span.text(self.src))
        } else {
            Err(self.syntax_error(message))
        }
    }

    fn parse_dotted_name(&mut self) -> PResult<&'src str> {
        let start = self.lex.peek_span().start;
        self.expect_name("expected module name")?;
        while matches!(self.peek(), Token::Dot) {
            self.bump()?;
            self.expect_name("expected name after '.'")?;
        }
        Ok(Span::new(start, self.last_end).text(self.src))
    }

    fn skip_newlines(&mut self) -> PResult<()> {
        while matches!(self.peek(), Token::Newline) {
            self.bump()?;
        }
        Ok(())
    }

    /// After a simple statement: consume `;` and report whether another
    /// statement follows on the same line.
    fn eat_semicolon(&mut self) -> PResult<bool> {
        if !matches!(self.peek(), Token::Semicolon) {
            return Ok(false);
        }
        self.bump()?;
        Ok(!matches!(
            self.peek(),
            Token::Newline | Token::Eof | Token::Dedent
        ))
    }

    fn end_line(&mut self) -> PResult<()> {
        match self.peek() {
            Token::Newline => {
                self.bump()?;
                Ok(())
            }
            Token::Eof | Token::Dedent => Ok(()),
            _ => Err(self.syntax_error("invalid syntax")),
        }
    }

    fn error_at(&self, offset: Offset, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            at: line_col(offset as usize, self.src),
        }
    }

    /// Error at the next token.  A pending lexical error takes precedence,
    /// since it explains why the grammar failed.
    fn syntax_error(&mut self, message: &str) -> ParseError {
        let t = self.lex.consume();
        match t.token {
            Token::Invalid(err) => self.error_at(t.span.start, err.to_string()),
            _ => self.error_at(t.span.start, message),
        }
    }
}

/// Whether a compound statement opened by `first`, whose latest clause is
/// `last`, can take a `next` clause.
fn continues_with(first: &str, last: &str, next: &str) -> bool {
    matches!(
        (first, last, next),
        ("if", "if" | "elif", "elif" | "else")
            | ("for" | "while", "for" | "while", "else")
            | ("try", "try" | "except", "except" | "finally")
            | ("try", "except", "else")
            | ("try", "else", "finally")
    )
}

// ── Decorator shapes ──────────────────────────────────────────────────────────

/// Classify a decorator expression from its tokens (the `@` excluded).
fn decorator_shape<'src>(src: &'src str, tokens: &[Spanned<'src>]) -> DecoratorShape<'src> {
    // Longest prefix of the form `name (. name)*`.
    let mut dotted_len = 0;
    for (i, t) in tokens.iter().enumerate() {
        let want_name = i % 2 == 0;
        let ok = if want_name {
            t.token.name_text().is_some()
        } else {
            t.token == Token::Dot
        };
        if !ok {
            break;
        }
        dotted_len = i + 1;
    }
    // A dotted name must end on a name.
    if dotted_len % 2 == 0 {
        dotted_len = dotted_len.saturating_sub(1);
    }
    if dotted_len == 0 {
        return DecoratorShape::Other;
    }
    let name = Span::new(tokens[0].span.start, tokens[dotted_len - 1].span.end).text(src);
    if dotted_len == tokens.len() {
        return DecoratorShape::Name(name);
    }

    // `name(...)`: the parenthesis opened right after the name must close
    // on the last token.
    if tokens[dotted_len].token != Token::LParen {
        return DecoratorShape::Other;
    }
    let mut depth = 0u32;
    for (i, t) in tokens.iter().enumerate().skip(dotted_len) {
        match t.token {
            Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
            Token::RParen | Token::RBracket | Token::RBrace => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return if i == tokens.len() - 1 {
                        DecoratorShape::Call(name)
                    } else {
                        DecoratorShape::Other
                    };
                }
            }
            _ => {}
        }
    }
    DecoratorShape::Other
}

// ── Tests ─────────────────────────────────────────────────────────────────────
