use crate::syntax::tree::{Clause, Compound, Module, Stmt, StmtKind, Suite};
use serde::Serialize;

const STUB_MAIN: &str = "\ndef main():\n    # Main function of the program\n    pass";

const GUARD: &str = "\nif __name__ == '__main__':\n    import multiprocessing\n    p = multiprocessing.Process(target=main)\n    p.start()\n    p.join()";

/// What [`ensure_entry_point_guard`] did to the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum GuardOutcome {
    AlreadyPresent,
    /// A guard was appended; `stub_main` is set when a placeholder `main`
    /// had to be defined for it to call.
    Added { stub_main: bool },
}

/// Whether the module has a top-level `if __name__ == "__main__":` block.
/// Either operand order and either quote style count.
pub fn has_entry_point_guard(module: &Module<'_>) -> bool {
    module.body.iter().any(|stmt| match &stmt.kind {
        StmtKind::Compound(compound) => compound.clauses.first().is_some_and(|c| {
            c.keyword == "if"
                && c.names.contains(&"__name__")
                && c.strings.iter().any(|s| s == "__main__")
        }),
        _ => false,
    })
}

/// Append an entry-point guard that runs `main` in a child process, unless
/// the module already has one.
pub fn ensure_entry_point_guard(module: &mut Module<'_>) -> GuardOutcome {
    if has_entry_point_guard(module) {
        tracing::debug!("entry-point guard already present");
        return GuardOutcome::AlreadyPresent;
    }

    let stub_main = !module.binds("main");
    if stub_main {
        tracing::debug!("nothing binds `main` at module level, adding a stub");
        module.body.push(Stmt::inserted(STUB_MAIN, StmtKind::Simple));
    }

    let guard = Compound {
        clauses: vec![Clause {
            keyword: "if",
            names: vec!["__name__"],
            strings: vec!["__main__".to_string()],
            body: Suite::Block {
                indent: "    ",
                body: Vec::new(),
            },
        }],
    };
    module
        .body
        .push(Stmt::inserted(GUARD, StmtKind::Compound(Box::new(guard))));
    GuardOutcome::Added { stub_main }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::{parse, unparse};

    fn guarded(src: &str) -> (String, GuardOutcome) {
        let mut module = parse(src).unwrap();
        let outcome = ensure_entry_point_guard(&mut module);
        (unparse(&module), outcome)
    }

    #[test]
    fn test_detects_guard() {
        for src in [
            "if __name__ == '__main__':\n    main()\n",
            "if __name__ == \"__main__\":\n    main()\n",
            "if \"__main__\" == __name__:\n    main()\n",
        ] {
            assert!(has_entry_point_guard(&parse(src).unwrap()), "{src}");
        }
    }

    #[test]
    fn test_nested_guard_does_not_count() {
        let src = "def f():\n    if __name__ == '__main__':\n        pass\n";
        assert!(!has_entry_point_guard(&parse(src).unwrap()));
    }

    #[test]
    fn test_elif_guard_does_not_count() {
        let src = "if x:\n    pass\nelif __name__ == '__main__':\n    pass\n";
        assert!(!has_entry_point_guard(&parse(src).unwrap()));
    }

    #[test]
    fn test_existing_guard_left_alone() {
        let src = "def main():\n    pass\n\nif __name__ == '__main__':\n    main()\n";
        let (out, outcome) = guarded(src);
        assert_eq!(outcome, GuardOutcome::AlreadyPresent);
        assert_eq!(out, src);
    }

    #[test]
    fn test_guard_appended_after_existing_main() {
        let (out, outcome) = guarded("def main():\n    print('hi')\n");
        assert_eq!(outcome, GuardOutcome::Added { stub_main: false });
        assert_eq!(
            out,
            "def main():\n    print('hi')\n\n\
             if __name__ == '__main__':\n    import multiprocessing\n    \
             p = multiprocessing.Process(target=main)\n    p.start()\n    p.join()\n"
        );
    }

    #[test]
    fn test_stub_main_added_when_missing() {
        let (out, outcome) = guarded("x = 1\n");
        assert_eq!(outcome, GuardOutcome::Added { stub_main: true });
        assert!(out.starts_with("x = 1\n\ndef main():\n    # Main function of the program\n    pass\n\nif __name__"));
    }

    #[test]
    fn test_imported_main_is_kept() {
        for src in [
            "from app import main\n",
            "from app.cli import run as main\n",
            "import main\n",
        ] {
            let (out, outcome) = guarded(src);
            assert_eq!(outcome, GuardOutcome::Added { stub_main: false }, "{src}");
            assert!(!out.contains("def main():"), "{src}");
            assert!(out.starts_with(src));
        }
    }

    #[test]
    fn test_assigned_main_is_kept() {
        for src in [
            "main = build_app().run\n",
            "main: Callable[[], None] = lambda: None\n",
            "main, other = pick()\n",
        ] {
            let (out, outcome) = guarded(src);
            assert_eq!(outcome, GuardOutcome::Added { stub_main: false }, "{src}");
            assert!(!out.contains("def main():"), "{src}");
        }
    }

    #[test]
    fn test_aliased_import_does_not_bind_main() {
        let (_, outcome) = guarded("from app import main as entry\n");
        assert_eq!(outcome, GuardOutcome::Added { stub_main: true });
    }

    #[test]
    fn test_nested_main_does_not_count() {
        let (_, outcome) = guarded("class App:\n    def main(self):\n        pass\n");
        assert_eq!(outcome, GuardOutcome::Added { stub_main: true });
    }

    #[test]
    fn test_second_application_is_noop() {
        let mut module = parse("x = 1\n").unwrap();
        ensure_entry_point_guard(&mut module);
        let once = unparse(&module);
        assert_eq!(ensure_entry_point_guard(&mut module), GuardOutcome::AlreadyPresent);
        assert_eq!(unparse(&module), once);
    }
}
