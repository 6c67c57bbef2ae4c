//! Serialise a [`Module`] back to source text.
//!
//! The printer walks the tree with a cursor into the original source.  The
//! text between two source nodes (whitespace, comments, blank lines, the
//! header of a `def`) is copied through unchanged; inserted nodes are written
//! at the cursor with the indentation of their enclosing block and the line
//! ending of the source.  A tree with no inserted nodes therefore prints back
//! exactly as it was read.

use crate::location::line_ending;
use crate::syntax::tree::{Decorator, Module, Origin, Stmt, StmtKind, Suite};

/// Render `module` as source text.
pub fn unparse(module: &Module<'_>) -> String {
    let mut p = Printer {
        src: module.source,
        out: String::with_capacity(module.source.len() + 64),
        cursor: 0,
        newline: line_ending(module.source),
    };
    p.print_body(&module.body, "", module.source.len());
    p.flush_to(module.source.len());
    p.out
}

struct Printer<'src> {
    src: &'src str,
    out: String,
    /// Everything in `src` before this offset has been written.
    cursor: usize,
    newline: &'static str,
}

impl<'src> Printer<'src> {
    fn flush_to(&mut self, pos: usize) {
        if pos > self.cursor {
            self.out.push_str(&self.src[self.cursor..pos]);
            self.cursor = pos;
        }
    }

    /// End of the physical line containing `pos`, newline included.
    fn line_end(&self, pos: usize) -> usize {
        self.src[pos..]
            .find('\n')
            .map_or(self.src.len(), |i| pos + i + 1)
    }

    /// Print a statement list.  `append_at` is where statements inserted
    /// after the last source statement go.
    fn print_body(&mut self, stmts: &[Stmt<'_>], indent: &str, append_at: usize) {
        for (i, stmt) in stmts.iter().enumerate() {
            match &stmt.origin {
                Origin::Source(span) => {
                    self.flush_to(span.start as usize);
                    self.print_stmt(stmt);
                    self.flush_to(span.end as usize);
                }
                Origin::Inserted(text) => {
                    let next = stmts[i + 1..].iter().find_map(|s| s.origin.span());
                    match next {
                        // Before the next source statement: the cursor sits
                        // just after that statement's indentation.
                        Some(span) => {
                            self.flush_to(span.start as usize);
                            self.write_lines(text, indent, false);
                            self.out.push_str(indent);
                        }
                        None => {
                            self.flush_to(append_at);
                            if !self.out.is_empty() && !self.out.ends_with('\n') {
                                self.out.push_str(self.newline);
                            }
                            self.write_lines(text, indent, true);
                        }
                    }
                }
            }
        }
    }

    /// Write `text` line by line, each followed by a line ending.  The first
    /// line is indented only when `indent_first` is set.
    fn write_lines(&mut self, text: &str, indent: &str, indent_first: bool) {
        for (n, line) in text.lines().enumerate() {
            if (n > 0 || indent_first) && !line.is_empty() {
                self.out.push_str(indent);
            }
            self.out.push_str(line);
            self.out.push_str(self.newline);
        }
    }

    fn print_stmt(&mut self, stmt: &Stmt<'_>) {
        match &stmt.kind {
            StmtKind::FunctionDef(func) => {
                self.print_decorators(&func.decorators, func.def_offset as usize, func.indent);
                self.print_suite(&func.body);
            }
            StmtKind::ClassDef(class) => {
                self.print_decorators(&class.decorators, class.class_offset as usize, class.indent);
                self.print_suite(&class.body);
            }
            StmtKind::Compound(compound) => {
                for clause in &compound.clauses {
                    self.print_suite(&clause.body);
                }
            }
            StmtKind::Import(_)
            | StmtKind::ImportFrom { .. }
            | StmtKind::Docstring
            | StmtKind::Assign(_)
            | StmtKind::Simple => {}
        }
    }

    /// Print decorators up to the `def`/`class` keyword at `anchor`.
    /// Inserted decorators land directly above the next source decorator,
    /// or above the definition line.
    fn print_decorators(&mut self, decorators: &[Decorator<'_>], anchor: usize, indent: &str) {
        let mut pending: Vec<&str> = Vec::new();
        for dec in decorators {
            match &dec.origin {
                Origin::Source(span) => {
                    self.flush_to(span.start as usize);
                    self.write_decorators(&mut pending, indent);
                }
                Origin::Inserted(text) => pending.push(text.as_ref()),
            }
        }
        self.flush_to(anchor);
        self.write_decorators(&mut pending, indent);
    }

    fn write_decorators(&mut self, pending: &mut Vec<&str>, indent: &str) {
        for text in pending.drain(..) {
            self.out.push('@');
            self.out.push_str(text);
            self.out.push_str(self.newline);
            self.out.push_str(indent);
        }
    }

    fn print_suite(&mut self, suite: &Suite<'_>) {
        match suite {
            Suite::Inline(body) => {
                let append_at = self.append_point(body);
                self.print_body(body, "", append_at);
            }
            Suite::Block { indent, body } => {
                let append_at = self.append_point(body);
                self.print_body(body, indent, append_at);
            }
        }
    }

    /// Statements appended to a nested block go after the physical line of
    /// its last source statement.
    fn append_point(&self, body: &[Stmt<'_>]) -> usize {
        body.iter()
            .rev()
            .find_map(|s| s.origin.span())
            .map_or(self.cursor, |span| self.line_end(span.end as usize))
    }
}
