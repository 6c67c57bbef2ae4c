//! Expression grammar.
//!
//! Expressions are checked, not built: each rule consumes its tokens and
//! fails at the first token that cannot continue the expression.  Binary
//! operators all take the same operands, so precedence is not modelled.

use super::{PResult, Parser};
use crate::location::Span;
use crate::syntax::lexer::Token;

impl<'src> Parser<'src> {
    // ── Lists ─────────────────────────────────────────────────────────────────

    /// `a`, `a, *b`, `a, b,` as found on either side of `=`.  Returns the
    /// span of each item.
    pub(super) fn star_expressions(&mut self) -> PResult<Vec<Span>> {
        let mut items = Vec::new();
        loop {
            let start = self.lex.peek_span().start;
            if matches!(self.peek(), Token::Star) {
                self.bump()?;
                self.comparison()?;
            } else {
                self.expression()?;
            }
            items.push(Span::new(start, self.last_end));
            if !matches!(self.peek(), Token::Comma) {
                return Ok(items);
            }
            self.bump()?;
            if !self.starts_expression() {
                return Ok(items);
            }
        }
    }

    /// Like [`Self::star_expressions`], but items may be `name := value`.
    pub(super) fn star_named_expressions(&mut self) -> PResult<()> {
        loop {
            self.star_named_item()?;
            if !matches!(self.peek(), Token::Comma) {
                return Ok(());
            }
            self.bump()?;
            if !self.starts_expression() {
                return Ok(());
            }
        }
    }

    fn star_named_item(&mut self) -> PResult<()> {
        if matches!(self.peek(), Token::Star) {
            self.bump()?;
            return self.comparison();
        }
        self.named_expression()
    }

    /// Assignment targets for `for`, `del`, `with ... as` and comprehensions.
    pub(super) fn target_list(&mut self) -> PResult<()> {
        loop {
            if matches!(self.peek(), Token::Star) {
                self.bump()?;
            }
            self.primary()?;
            if !matches!(self.peek(), Token::Comma) {
                return Ok(());
            }
            self.bump()?;
            if !self.starts_expression() {
                return Ok(());
            }
        }
    }

    // ── Expressions ───────────────────────────────────────────────────────────

    pub(super) fn named_expression(&mut self) -> PResult<()> {
        let start = self.lex.peek_span().start;
        self.expression()?;
        if matches!(self.peek(), Token::Walrus) {
            if !is_identifier(Span::new(start, self.last_end).text(self.src)) {
                return Err(self.syntax_error("cannot use assignment expressions with expression"));
            }
            self.bump()?;
            self.expression()?;
        }
        Ok(())
    }

    pub(super) fn expression(&mut self) -> PResult<()> {
        if matches!(self.peek(), Token::KwLambda) {
            return self.lambda();
        }
        self.disjunction()?;
        if matches!(self.peek(), Token::KwIf) {
            self.bump()?;
            self.disjunction()?;
            self.expect(Token::KwElse, "expected 'else' after 'if' expression")?;
            self.expression()?;
        }
        Ok(())
    }

    fn lambda(&mut self) -> PResult<()> {
        self.bump()?; // `lambda`
        self.parameters(Token::Colon, false)?;
        self.expect(Token::Colon, "expected ':'")?;
        self.expression()
    }

    fn disjunction(&mut self) -> PResult<()> {
        self.inversion()?;
        while matches!(self.peek(), Token::KwAnd | Token::KwOr) {
            self.bump()?;
            self.inversion()?;
        }
        Ok(())
    }

    fn inversion(&mut self) -> PResult<()> {
        while matches!(self.peek(), Token::KwNot) {
            self.bump()?;
        }
        self.comparison()
    }

    /// Operands joined by arithmetic, bitwise and comparison operators.
    fn comparison(&mut self) -> PResult<()> {
        self.factor()?;
        loop {
            match self.peek().clone() {
                Token::Star | Token::DblStar | Token::At | Token::KwIn => {
                    self.bump()?;
                }
                Token::Op if self.peek_text() != "~" => {
                    self.bump()?;
                }
                Token::KwIs => {
                    self.bump()?;
                    if matches!(self.peek(), Token::KwNot) {
                        self.bump()?;
                    }
                }
                Token::KwNot => {
                    self.bump()?;
                    self.expect(Token::KwIn, "expected 'in' after 'not'")?;
                }
                _ => return Ok(()),
            }
            self.factor()?;
        }
    }

    /// Unary operators, `await`, then a primary.
    fn factor(&mut self) -> PResult<()> {
        while matches!(self.peek(), Token::Op) && matches!(self.peek_text(), "+" | "-" | "~") {
            self.bump()?;
        }
        if matches!(self.peek(), Token::KwAwait) {
            self.bump()?;
        }
        self.primary()
    }

    /// An atom followed by attribute access, calls and subscripts.
    fn primary(&mut self) -> PResult<()> {
        self.atom()?;
        loop {
            match self.peek() {
                Token::Dot => {
                    self.bump()?;
                    self.expect_name("expected attribute name")?;
                }
                Token::LParen => {
                    self.bump()?;
                    self.call_arguments()?;
                    self.expect(Token::RParen, "expected ')'")?;
                }
                Token::LBracket => {
                    self.bump()?;
                    self.subscript()?;
                    self.expect(Token::RBracket, "expected ']'")?;
                }
                _ => return Ok(()),
            }
        }
    }

    fn atom(&mut self) -> PResult<()> {
        match self.peek().clone() {
            Token::Str(_) | Token::FStr(_) => {
                // Adjacent literals concatenate.
                while matches!(self.peek(), Token::Str(_) | Token::FStr(_)) {
                    self.bump()?;
                }
            }
            Token::Number | Token::Ellipsis | Token::KwTrue | Token::KwFalse | Token::KwNone => {
                self.bump()?;
            }
            tok if tok.name_text().is_some() => {
                self.bump()?;
            }
            Token::LParen => {
                self.bump()?;
                match self.peek() {
                    Token::RParen => {}
                    Token::KwYield => self.yield_expr()?,
                    _ => self.sequence_body(Token::RParen)?,
                }
                self.expect(Token::RParen, "expected ')'")?;
            }
            Token::LBracket => {
                self.bump()?;
                if !matches!(self.peek(), Token::RBracket) {
                    self.sequence_body(Token::RBracket)?;
                }
                self.expect(Token::RBracket, "expected ']'")?;
            }
            Token::LBrace => {
                self.bump()?;
                if !matches!(self.peek(), Token::RBrace) {
                    self.brace_body()?;
                }
                self.expect(Token::RBrace, "expected '}'")?;
            }
            _ => return Err(self.syntax_error("invalid syntax")),
        }
        Ok(())
    }

    /// Contents of a tuple, list or generator: a comprehension or a
    /// comma-separated list.
    fn sequence_body(&mut self, close: Token<'src>) -> PResult<()> {
        self.star_named_item()?;
        if self.comprehension_follows() {
            return self.comprehension();
        }
        self.rest_of_list(&close, Self::star_named_item)
    }

    fn brace_body(&mut self) -> PResult<()> {
        let is_dict = match self.peek() {
            Token::DblStar => {
                self.bump()?;
                self.comparison()?;
                true
            }
            Token::Star => {
                self.star_named_item()?;
                false
            }
            _ => {
                self.named_expression()?;
                if matches!(self.peek(), Token::Colon) {
                    self.bump()?;
                    self.expression()?;
                    true
                } else {
                    false
                }
            }
        };
        if self.comprehension_follows() {
            return self.comprehension();
        }
        if is_dict {
            self.rest_of_list(&Token::RBrace, Self::dict_item)
        } else {
            self.rest_of_list(&Token::RBrace, Self::star_named_item)
        }
    }

    fn dict_item(&mut self) -> PResult<()> {
        if matches!(self.peek(), Token::DblStar) {
            self.bump()?;
            return self.comparison();
        }
        self.expression()?;
        self.expect(Token::Colon, "expected ':'")?;
        self.expression()
    }

    /// `, item` repeated, with an optional trailing comma before `close`.
    fn rest_of_list(
        &mut self,
        close: &Token<'src>,
        mut item: impl FnMut(&mut Self) -> PResult<()>,
    ) -> PResult<()> {
        while matches!(self.peek(), Token::Comma) {
            self.bump()?;
            if self.peek() == close {
                break;
            }
            item(self)?;
        }
        Ok(())
    }

    fn comprehension_follows(&mut self) -> bool {
        matches!(self.peek(), Token::KwFor | Token::KwAsync)
    }

    /// One or more `[async] for targets in iterable [if cond]...` clauses.
    fn comprehension(&mut self) -> PResult<()> {
        while self.comprehension_follows() {
            if matches!(self.peek(), Token::KwAsync) {
                self.bump()?;
            }
            self.expect(Token::KwFor, "expected 'for'")?;
            self.target_list()?;
            self.expect(Token::KwIn, "expected 'in'")?;
            self.disjunction()?;
            while matches!(self.peek(), Token::KwIf) {
                self.bump()?;
                self.disjunction()?;
            }
        }
        Ok(())
    }

    /// Call arguments up to (not including) the closing `)`.
    pub(super) fn call_arguments(&mut self) -> PResult<()> {
        let mut first = true;
        while !matches!(self.peek(), Token::RParen) {
            match self.peek() {
                Token::Star | Token::DblStar => {
                    self.bump()?;
                    self.expression()?;
                }
                _ => {
                    let start = self.lex.peek_span().start;
                    self.named_expression()?;
                    if matches!(self.peek(), Token::Eq) {
                        if !is_identifier(Span::new(start, self.last_end).text(self.src)) {
                            return Err(self.syntax_error("expression cannot contain assignment"));
                        }
                        self.bump()?;
                        self.expression()?;
                    } else if first && self.comprehension_follows() {
                        // A bare generator is only allowed as the sole argument.
                        return self.comprehension();
                    }
                }
            }
            first = false;
            if !matches!(self.peek(), Token::Comma) {
                break;
            }
            self.bump()?;
        }
        Ok(())
    }

    fn subscript(&mut self) -> PResult<()> {
        loop {
            self.slice_item()?;
            if !matches!(self.peek(), Token::Comma) {
                return Ok(());
            }
            self.bump()?;
            if matches!(self.peek(), Token::RBracket) {
                return Ok(());
            }
        }
    }

    /// `x`, `*xs`, or `lower:upper:step` with every part optional.
    fn slice_item(&mut self) -> PResult<()> {
        if matches!(self.peek(), Token::Star) {
            self.bump()?;
            return self.comparison();
        }
        if !matches!(self.peek(), Token::Colon) {
            self.named_expression()?;
        }
        for _ in 0..2 {
            if !matches!(self.peek(), Token::Colon) {
                break;
            }
            self.bump()?;
            if self.starts_expression() {
                self.expression()?;
            }
        }
        Ok(())
    }

    pub(super) fn yield_expr(&mut self) -> PResult<()> {
        self.bump()?; // `yield`
        if matches!(self.peek(), Token::KwFrom) {
            self.bump()?;
            return self.expression();
        }
        if self.starts_expression() {
            self.star_expressions()?;
        }
        Ok(())
    }

    // ── Parameters ────────────────────────────────────────────────────────────

    /// A `def` (annotated) or `lambda` parameter list, up to `close`.
    pub(super) fn parameters(&mut self, close: Token<'src>, annotated: bool) -> PResult<()> {
        while *self.peek() != close {
            match self.peek().clone() {
                Token::Op if self.peek_text() == "/" => {
                    self.bump()?;
                }
                Token::Star => {
                    self.bump()?;
                    if self.peek().name_text().is_some() {
                        self.parameter(annotated, false)?;
                    }
                }
                Token::DblStar => {
                    self.bump()?;
                    self.parameter(annotated, false)?;
                }
                _ => self.parameter(annotated, true)?,
            }
            if !matches!(self.peek(), Token::Comma) {
                break;
            }
            self.bump()?;
        }
        Ok(())
    }

    fn parameter(&mut self, annotated: bool, default: bool) -> PResult<()> {
        self.expect_name("expected parameter name")?;
        if annotated && matches!(self.peek(), Token::Colon) {
            self.bump()?;
            // `*args: *Ts`
            if matches!(self.peek(), Token::Star) {
                self.bump()?;
            }
            self.expression()?;
        }
        if default && matches!(self.peek(), Token::Eq) {
            self.bump()?;
            self.expression()?;
        }
        Ok(())
    }

    /// `[T, *Ts, **P, U: int = str]` after a `def`, `class` or `type` name.
    pub(super) fn type_params(&mut self) -> PResult<()> {
        self.bump()?; // `[`
        loop {
            if matches!(self.peek(), Token::Star | Token::DblStar) {
                self.bump()?;
            }
            self.expect_name("expected type parameter name")?;
            if matches!(self.peek(), Token::Colon) {
                self.bump()?;
                self.expression()?;
            }
            if matches!(self.peek(), Token::Eq) {
                self.bump()?;
                if matches!(self.peek(), Token::Star) {
                    self.bump()?;
                }
                self.expression()?;
            }
            if !matches!(self.peek(), Token::Comma) {
                break;
            }
            self.bump()?;
            if matches!(self.peek(), Token::RBracket) {
                break;
            }
        }
        self.expect(Token::RBracket, "expected ']'")?;
        Ok(())
    }

    // ── Clause headers ────────────────────────────────────────────────────────

    /// `with a as b, c:` or the parenthesized `with (a as b, c):`.
    pub(super) fn with_items(&mut self) -> PResult<()> {
        let parenthesized =
            matches!(self.peek(), Token::LParen) && self.parenthesized_with_items();
        if parenthesized {
            self.bump()?;
        }
        loop {
            self.expression()?;
            if matches!(self.peek(), Token::KwAs) {
                self.bump()?;
                if matches!(self.peek(), Token::Star) {
                    return Err(self.syntax_error("invalid syntax"));
                }
                self.primary()?;
            }
            if !matches!(self.peek(), Token::Comma) {
                break;
            }
            self.bump()?;
            if parenthesized && matches!(self.peek(), Token::RParen) {
                break;
            }
        }
        if parenthesized {
            self.expect(Token::RParen, "expected ')'")?;
        }
        Ok(())
    }

    /// `except`, `except E`, `except (A, B) as e`, `except* E`.
    pub(super) fn except_header(&mut self) -> PResult<()> {
        if matches!(self.peek(), Token::Star) {
            self.bump()?;
        }
        if !self.starts_expression() {
            return Ok(());
        }
        self.expression()?;
        while matches!(self.peek(), Token::Comma) {
            self.bump()?;
            self.expression()?;
        }
        if matches!(self.peek(), Token::KwAs) {
            self.bump()?;
            self.expect_name("expected name after 'as'")?;
        }
        Ok(())
    }

    /// Whether the `(` at the next token opens a list of with-items: the
    /// group holds an `as` or a comma at its top level and is directly
    /// followed by `:`.
    fn parenthesized_with_items(&self) -> bool {
        let mut ahead = self.lex.clone();
        let mut depth = 0u32;
        let mut items = false;
        loop {
            match ahead.consume().token {
                Token::LParen | Token::LBracket | Token::LBrace => depth += 1,
                Token::RParen | Token::RBracket | Token::RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return items && matches!(ahead.peek(), Token::Colon);
                    }
                }
                Token::KwAs | Token::Comma if depth == 1 => items = true,
                Token::Eof | Token::Invalid(_) => return false,
                _ => {}
            }
        }
    }

    // ── Helpers ───────────────────────────────────────────────────────────────

    /// Whether the next token can begin an expression.
    pub(super) fn starts_expression(&mut self) -> bool {
        match self.peek().clone() {
            Token::Number
            | Token::Str(_)
            | Token::FStr(_)
            | Token::Ellipsis
            | Token::LParen
            | Token::LBracket
            | Token::LBrace
            | Token::KwTrue
            | Token::KwFalse
            | Token::KwNone
            | Token::KwNot
            | Token::KwLambda
            | Token::KwAwait
            | Token::Star => true,
            Token::Op => matches!(self.peek_text(), "+" | "-" | "~"),
            tok => tok.name_text().is_some(),
        }
    }

    /// Source text of the next token.
    fn peek_text(&mut self) -> &'src str {
        self.lex.peek_span().text(self.src)
    }
}

/// Whether `text` is a single identifier.
pub(super) fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c == '_' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c.is_alphanumeric())
}
