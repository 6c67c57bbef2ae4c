use crate::location::LineCol;
use crate::syntax::tree::{Module, Stmt, StmtKind};
use crate::syntax::{ParseError, parse};
use std::borrow::Cow;

/// Make sure `import` (e.g. `"from numba import njit"`) is present at module
/// scope, inserting it when missing.  Returns whether it was inserted.
///
/// Matching is exact text: an existing top-level statement must read the
/// same as `import` (surrounding whitespace ignored).  `import numpy` does not
/// satisfy `import numpy as np`, and neither does an import nested inside a
/// function or a `try` block.
///
/// The new statement goes first, after the module docstring and any
/// `from __future__` imports, which must stay at the top of the file.
pub fn ensure_import<'src>(module: &mut Module<'src>, import: &'src str) -> Result<bool, ParseError> {
    let wanted = import.trim();
    if module.body.iter().any(|s| module.stmt_text(s) == wanted) {
        tracing::debug!(import = wanted, "import already present");
        return Ok(false);
    }

    let kind = parse_single_import(wanted)?;
    let at = insertion_index(&module.body);
    tracing::debug!(import = wanted, index = at, "inserting import");
    module
        .body
        .insert(at, Stmt::inserted(Cow::Borrowed(wanted), kind));
    Ok(true)
}

fn parse_single_import(text: &str) -> Result<StmtKind<'_>, ParseError> {
    let mut parsed = parse(text)?;
    match parsed.body.pop() {
        Some(stmt)
            if parsed.body.is_empty()
                && matches!(stmt.kind, StmtKind::Import(_) | StmtKind::ImportFrom { .. }) =>
        {
            Ok(stmt.kind)
        }
        _ => Err(ParseError {
            message: format!("`{text}` is not a single import statement"),
            at: LineCol { line: 1, col: 1 },
        }),
    }
}

fn insertion_index(body: &[Stmt<'_>]) -> usize {
    let mut at = 0;
    if matches!(body.first().map(|s| &s.kind), Some(StmtKind::Docstring)) {
        at = 1;
    }
    while let Some(StmtKind::ImportFrom {
        module: Some("__future__"),
        level: 0,
        ..
    }) = body.get(at).map(|s| &s.kind)
    {
        at += 1;
    }
    at
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::unparse;

    fn ensured(src: &str, import: &str) -> (String, bool) {
        let mut module = parse(src).unwrap();
        let added = ensure_import(&mut module, import).unwrap();
        (unparse(&module), added)
    }

    #[test]
    fn test_inserted_at_top() {
        let (out, added) = ensured("def f(x): return x+1\n", "from numba import njit");
        assert!(added);
        assert_eq!(out, "from numba import njit\ndef f(x): return x+1\n");
    }

    #[test]
    fn test_existing_import_is_kept() {
        let src = "import os\nfrom numba import njit\n";
        let (out, added) = ensured(src, "from numba import njit");
        assert!(!added);
        assert_eq!(out, src);
    }

    #[test]
    fn test_idempotent() {
        let mut module = parse("x = 1\n").unwrap();
        assert!(ensure_import(&mut module, "import numpy as np").unwrap());
        let once = unparse(&module);
        assert!(!ensure_import(&mut module, "import numpy as np").unwrap());
        assert_eq!(unparse(&module), once);
        assert_eq!(module.body.len(), 2);
    }

    #[test]
    fn test_alias_is_not_recognised() {
        let (out, added) = ensured("import numpy\n", "import numpy as np");
        assert!(added);
        assert_eq!(out, "import numpy as np\nimport numpy\n");
    }

    #[test]
    fn test_nested_import_is_not_recognised() {
        let src = "def f():\n    from functools import lru_cache\n";
        let (_, added) = ensured(src, "from functools import lru_cache");
        assert!(added);
    }

    #[test]
    fn test_after_docstring_and_future_imports() {
        let src = "#!/usr/bin/env python3\n\"\"\"Doc.\"\"\"\nfrom __future__ import annotations\n\nx = 1\n";
        let (out, _) = ensured(src, "import numpy as np");
        assert_eq!(
            out,
            "#!/usr/bin/env python3\n\"\"\"Doc.\"\"\"\nfrom __future__ import annotations\n\nimport numpy as np\nx = 1\n"
        );
    }

    #[test]
    fn test_empty_module() {
        let (out, added) = ensured("", "import numpy as np");
        assert!(added);
        assert_eq!(out, "import numpy as np\n");
    }

    #[test]
    fn test_rejects_non_import_text() {
        let mut module = parse("x = 1\n").unwrap();
        let err = ensure_import(&mut module, "print('hi')").unwrap_err();
        assert!(err.message.contains("not a single import statement"));
    }
}
