//! Statement-level syntax tree.
//!
//! - Zero-copy: identifiers borrow `&'src str` slices from the source buffer.
//! - Span-preserving: every node parsed from source keeps its byte [`Span`],
//!   so the printer can reproduce untouched code (comments, blank lines and
//!   formatting included) byte for byte.
//! - Editable: transforms add nodes with [`Origin::Inserted`], which carry
//!   their own text instead of a span.
//!
//! Expressions are not modelled as trees.  Only the shapes the transforms
//! inspect are kept: decorator shape, the names and string literals in a
//! clause header, and import aliases.

use crate::location::Span;
use std::borrow::Cow;

/// Where a node's text comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum Origin<'src> {
    /// Parsed from the source; the span covers the first to the last token.
    Source(Span),
    /// Added by a transform.  For statements this is the full statement
    /// text (possibly several lines, unindented); for decorators it is the
    /// expression after `@`.
    Inserted(Cow<'src, str>),
}

impl Origin<'_> {
    pub fn span(&self) -> Option<Span> {
        match self {
            Origin::Source(span) => Some(*span),
            Origin::Inserted(_) => None,
        }
    }
}

// ── Module ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Module<'src> {
    pub source: &'src str,
    pub body: Vec<Stmt<'src>>,
}

impl<'src> Module<'src> {
    /// The text of a top-level statement, trimmed.
    pub fn stmt_text<'a>(&'a self, stmt: &'a Stmt<'src>) -> &'a str {
        match &stmt.origin {
            Origin::Source(span) => span.text(self.source).trim(),
            Origin::Inserted(text) => text.trim(),
        }
    }

    /// Whether a top-level statement binds `name`: a `def`, a `class`, an
    /// import or an assignment.  Star imports and bindings nested in
    /// compound statements are not seen.
    pub fn binds(&self, name: &str) -> bool {
        self.body.iter().any(|s| match &s.kind {
            StmtKind::FunctionDef(f) => f.name == name,
            StmtKind::ClassDef(c) => c.name == name,
            // `import a.b` binds `a`.
            StmtKind::Import(aliases) => aliases.iter().any(|a| {
                a.asname
                    .unwrap_or_else(|| a.name.split_once('.').map_or(a.name, |(head, _)| head))
                    == name
            }),
            StmtKind::ImportFrom { names, .. } => {
                names.iter().any(|a| a.asname.unwrap_or(a.name) == name)
            }
            StmtKind::Assign(targets) => targets.contains(&name),
            StmtKind::Compound(_) | StmtKind::Docstring | StmtKind::Simple => false,
        })
    }
}

// ── Statements ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Stmt<'src> {
    pub origin: Origin<'src>,
    pub kind: StmtKind<'src>,
}

impl<'src> Stmt<'src> {
    /// A statement added by a transform, rendered verbatim.
    pub fn inserted(text: impl Into<Cow<'src, str>>, kind: StmtKind<'src>) -> Self {
        Self {
            origin: Origin::Inserted(text.into()),
            kind,
        }
    }
}

#[derive(Debug, Clone)]
pub enum StmtKind<'src> {
    /// `import a, b.c, d as e`
    Import(Vec<ImportAlias<'src>>),
    /// `from .pkg import x, y as z`
    ImportFrom {
        /// `None` for a bare relative `from . import x`.
        module: Option<&'src str>,
        /// Empty for a star import.
        names: Vec<ImportAlias<'src>>,
        level: u32,
    },
    FunctionDef(Box<FuncDef<'src>>),
    ClassDef(Box<ClassDef<'src>>),
    /// `if`/`for`/`while`/`with`/`try`/`match` (and `case` inside a match).
    Compound(Box<Compound<'src>>),
    /// A bare string literal statement (docstring position matters).
    Docstring,
    /// `a = b = value`, `x, *rest = value` or `n: int = 0`, with the plain
    /// names bound by its targets.
    Assign(Vec<&'src str>),
    /// Any other simple statement.
    Simple,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportAlias<'src> {
    pub name: &'src str,
    pub asname: Option<&'src str>,
}

// ── Definitions ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FuncDef<'src> {
    pub name: &'src str,
    /// Decorators in application order (top to bottom).
    pub decorators: Vec<Decorator<'src>>,
    /// Whitespace before the `def` line's first token.
    pub indent: &'src str,
    /// Offset of the `def` (or `async`) keyword.
    pub def_offset: u32,
    pub body: Suite<'src>,
}

#[derive(Debug, Clone)]
pub struct ClassDef<'src> {
    pub name: &'src str,
    pub decorators: Vec<Decorator<'src>>,
    pub indent: &'src str,
    pub class_offset: u32,
    pub body: Suite<'src>,
}

#[derive(Debug, Clone)]
pub struct Decorator<'src> {
    pub origin: Origin<'src>,
    pub shape: DecoratorShape<'src>,
}

impl<'src> Decorator<'src> {
    /// A decorator naming `name`, added by a transform.
    pub fn inserted(name: &'src str) -> Self {
        Self {
            origin: Origin::Inserted(Cow::Borrowed(name)),
            shape: DecoratorShape::Name(name),
        }
    }

    /// Whether this decorator is `@name` or `@name(...)`.
    pub fn is_named(&self, name: &str) -> bool {
        match self.shape {
            DecoratorShape::Name(n) | DecoratorShape::Call(n) => n == name,
            DecoratorShape::Other => false,
        }
    }
}

/// Top-level shape of a decorator expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoratorShape<'src> {
    /// `@name` or `@pkg.name` (the full dotted text).
    Name(&'src str),
    /// `@name(...)` or `@pkg.name(...)`.
    Call(&'src str),
    /// Anything more complex, e.g. `@registry["x"]`.
    Other,
}

// ── Compound statements ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Compound<'src> {
    /// Clauses in order, e.g. `if` / `elif` / `else`.
    pub clauses: Vec<Clause<'src>>,
}

#[derive(Debug, Clone)]
pub struct Clause<'src> {
    /// Leading keyword: `if`, `elif`, `else`, `for`, `while`, `with`, `try`,
    /// `except`, `finally`, `match` or `case`.
    pub keyword: &'src str,
    /// Identifiers appearing in the header (between keyword and `:`).
    pub names: Vec<&'src str>,
    /// Decoded plain string literals appearing in the header.
    pub strings: Vec<String>,
    pub body: Suite<'src>,
}

/// The body of a compound statement or definition.
#[derive(Debug, Clone)]
pub enum Suite<'src> {
    /// Simple statements on the header line: `def f(x): return x`.
    Inline(Vec<Stmt<'src>>),
    /// An indented block.
    Block {
        indent: &'src str,
        body: Vec<Stmt<'src>>,
    },
}

impl<'src> Suite<'src> {
    pub fn body(&self) -> &[Stmt<'src>] {
        match self {
            Suite::Inline(body) | Suite::Block { body, .. } => body,
        }
    }

    pub fn body_mut(&mut self) -> &mut Vec<Stmt<'src>> {
        match self {
            Suite::Inline(body) | Suite::Block { body, .. } => body,
        }
    }
}

// ── Mutable walk ──────────────────────────────────────────────────────────────

/// Visits every function definition in a statement list, nested ones included.
pub trait FunctionVisitor<'src> {
    fn visit_function(&mut self, func: &mut FuncDef<'src>);
}

/// Walk `stmts` depth-first, calling the visitor on each function before its
/// body is walked.
pub fn walk_functions<'src, V: FunctionVisitor<'src> + ?Sized>(
    stmts: &mut [Stmt<'src>],
    visitor: &mut V,
) {
    for stmt in stmts {
        match &mut stmt.kind {
            StmtKind::FunctionDef(func) => {
                visitor.visit_function(func);
                walk_functions(func.body.body_mut(), visitor);
            }
            StmtKind::ClassDef(class) => walk_functions(class.body.body_mut(), visitor),
            StmtKind::Compound(compound) => {
                for clause in &mut compound.clauses {
                    walk_functions(clause.body.body_mut(), visitor);
                }
            }
            StmtKind::Import(_)
            | StmtKind::ImportFrom { .. }
            | StmtKind::Docstring
            | StmtKind::Assign(_)
            | StmtKind::Simple => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decorator_is_named() {
        let plain = Decorator::inserted("njit");
        assert!(plain.is_named("njit"));
        assert!(!plain.is_named("jit"));

        let call = Decorator {
            origin: Origin::Source(Span::new(0, 20)),
            shape: DecoratorShape::Call("lru_cache"),
        };
        assert!(call.is_named("lru_cache"));

        let other = Decorator {
            origin: Origin::Source(Span::new(0, 5)),
            shape: DecoratorShape::Other,
        };
        assert!(!other.is_named("lru_cache"));
    }

    #[test]
    fn test_binds() {
        let module = crate::syntax::parse(
            "import os.path\nimport numpy as np\nfrom app import run as main_entry, cli\n\
             class Config: pass\ndef helper(): pass\nlimit, *rest = 1, 2\nif x:\n    nested = 1\n",
        )
        .unwrap();
        for name in ["os", "np", "main_entry", "cli", "Config", "helper", "limit", "rest"] {
            assert!(module.binds(name), "{name}");
        }
        for name in ["path", "numpy", "run", "x", "nested"] {
            assert!(!module.binds(name), "{name}");
        }
    }

    #[test]
    fn test_origin_span() {
        assert_eq!(Origin::Source(Span::new(1, 2)).span(), Some(Span::new(1, 2)));
        assert_eq!(Origin::Inserted(Cow::Borrowed("x")).span(), None);
    }
}
